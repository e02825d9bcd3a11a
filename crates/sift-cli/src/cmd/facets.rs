use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::Path;

use crate::output::{CliError, OutputMode, render, render_error};
use sift_core::facet::{self, FacetKey, FacetValue};
use sift_core::ErrorCode;

#[derive(Args, Debug)]
pub struct FacetsArgs {
    /// Facet key to list (project, logger, test_result, site).
    /// Omit to list every tracked facet.
    pub key: Option<String>,

    /// Only show values containing this text.
    #[arg(long, requires = "key")]
    pub search: Option<String>,
}

#[derive(Serialize)]
struct FacetListing {
    key: String,
    values: Vec<FacetValue>,
}

/// Execute `sift facets`: inspect the registered values that drive
/// filter choices. Values come from the facet index, never from a scan
/// of the event log.
///
/// # Errors
///
/// Returns an error on storage failures. An unknown facet key renders a
/// structured `E2004` error and exits non-zero.
pub fn run_facets(args: &FacetsArgs, root: &Path, mode: OutputMode) -> Result<()> {
    let (_config, conn) = super::open_project(root, mode)?;

    let keys: Vec<FacetKey> = match &args.key {
        Some(raw) => match raw.parse::<FacetKey>() {
            Ok(key) => vec![key],
            Err(error) => {
                render_error(
                    mode,
                    &CliError::from_code(ErrorCode::UnknownFacetKey, error.to_string()),
                )?;
                std::process::exit(1);
            }
        },
        None => FacetKey::ALL.to_vec(),
    };

    let mut listings = Vec::new();
    for key in keys {
        let values = match &args.search {
            Some(text) => facet::search(&conn, key, text)?,
            None => facet::list(&conn, key)?,
        };
        listings.push(FacetListing {
            key: key.to_string(),
            values,
        });
    }

    render(mode, &listings, |listings, w| {
        for listing in listings {
            writeln!(w, "{}:", listing.key)?;
            if listing.values.is_empty() {
                writeln!(w, "  (none)")?;
            }
            for value in &listing.values {
                if value.label == value.value {
                    writeln!(w, "  {}", value.value)?;
                } else {
                    writeln!(w, "  {}  ({})", value.value, value.label)?;
                }
            }
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_core::filter::Filter;

    #[test]
    fn facet_keys_line_up_with_filter_params() {
        let filter_params: Vec<&str> = [
            Filter::Project(None),
            Filter::Logger(None),
            Filter::TestResult(None),
            Filter::Site(None),
        ]
        .iter()
        .map(Filter::query_param)
        .collect();
        for key in FacetKey::ALL {
            assert!(
                filter_params.contains(&key.as_str()),
                "facet key {key} has no matching filter"
            );
        }
    }
}
