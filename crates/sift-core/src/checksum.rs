//! Stable identity digests for incoming events.
//!
//! The checksum is the dedup key component alongside
//! `(message_type, name, project)`: two events that describe the same
//! underlying problem must digest identically even when their volatile
//! fields (timestamp, url column, request-specific query strings) differ.
//!
//! Identity input, tab-joined and newline-terminated for unambiguous
//! field boundaries:
//!
//! ```text
//! {level_code}\t{class_name}\t{identity_body}\n
//! ```
//!
//! The identity body is the last [`TRACEBACK_TAIL_LINES`] lines of the
//! traceback when one is present (frame addresses and app prologues churn;
//! the innermost frames are the stable part), otherwise the message with
//! URL query strings stripped. The digest is BLAKE3, lowercase hex.
//!
//! Pure functions; no I/O, no shared state.

use crate::model::EventAttributes;

/// Number of trailing traceback lines that enter the identity body.
pub const TRACEBACK_TAIL_LINES: usize = 3;

/// Compute the stable identity checksum for an event.
///
/// Deterministic over the identity-relevant attributes only: `level`,
/// `class_name`, and the identity body. Timestamps, urls, sites, loggers,
/// and structured data never affect the result.
#[must_use]
pub fn compute_checksum(attrs: &EventAttributes) -> String {
    let body = identity_body(attrs);
    let input = format!(
        "{}\t{}\t{}\n",
        attrs.level.code(),
        attrs.class_name.as_deref().unwrap_or(""),
        body,
    );
    blake3::hash(input.as_bytes()).to_hex().to_string()
}

/// The free-text portion of the identity input.
fn identity_body(attrs: &EventAttributes) -> String {
    attrs.traceback.as_deref().map_or_else(
        || strip_query_strings(&attrs.message),
        |tb| traceback_tail(tb, TRACEBACK_TAIL_LINES),
    )
}

/// Keep only the last `n` lines of a traceback.
fn traceback_tail(traceback: &str, n: usize) -> String {
    let lines: Vec<&str> = traceback.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

/// Strip query strings from URL-like tokens in a message.
///
/// A token is URL-like when it contains a scheme separator (`://`).
/// Everything from the first `?` onward is dropped from such tokens;
/// non-URL tokens pass through untouched, so a literal question mark in
/// prose still counts toward identity.
#[must_use]
pub fn strip_query_strings(message: &str) -> String {
    if !message.contains("://") {
        return message.to_string();
    }

    let mut out = String::with_capacity(message.len());
    let mut first = true;
    for token in message.split(' ') {
        if !first {
            out.push(' ');
        }
        first = false;
        if token.contains("://") {
            out.push_str(token.split('?').next().unwrap_or(token));
        } else {
            out.push_str(token);
        }
    }
    out
}
