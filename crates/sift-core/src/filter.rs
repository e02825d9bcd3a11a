//! Read-side filter layer.
//!
//! Each filter is one variant of the closed [`Filter`] enum and carries
//! the same capability surface: extract its value from a request-like
//! query-param map, render available choices, contribute a query
//! predicate, and (the one mutating exception) `process` an
//! about-to-be-ingested record to inject a default attribute.
//!
//! Predicate semantics: a set filter without a message-type affinity
//! contributes `column = value`; a set filter *with* an affinity
//! contributes `(column = value OR message_type <> affinity)` so a
//! log-only filter never hides test rows (and vice versa); an unset
//! filter is unconditionally true. Predicates combine with AND.
//!
//! The message-type filter is the composite: it nests child filters per
//! branch (log reveals logger/level, test reveals test result). When a
//! type is selected only that branch's children contribute; otherwise
//! every branch's set children contribute, each carrying its own escape
//! hatch. The tree is exactly two levels deep.

use rusqlite::Connection;
use rusqlite::types::ToSql;
use std::collections::BTreeMap;

use crate::config::StoreConfig;
use crate::db::query::escape_like;
use crate::error::ValidationError;
use crate::facet::{self, FacetKey};
use crate::model::{EventAttributes, LogLevel, MessageType, Status, TestResult};

/// Request-like input: the query parameters of a dashboard request.
pub type QueryParams = BTreeMap<String, String>;

/// Query-param key carrying the free-text query.
pub const TEXT_QUERY_PARAM: &str = "query";

/// One `(value, label)` pair for a filter choice widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

impl Choice {
    fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// A SQL predicate fragment plus its bound parameters.
///
/// Fragments use unnumbered `?` placeholders so they compose: `and`
/// concatenates clauses and appends parameters in order. The always-true
/// predicate is the empty clause.
pub struct Predicate {
    clause: String,
    params: Vec<Box<dyn ToSql>>,
}

impl Predicate {
    /// The unconditionally true predicate.
    #[must_use]
    pub const fn always() -> Self {
        Self {
            clause: String::new(),
            params: Vec::new(),
        }
    }

    #[must_use]
    pub fn new(clause: impl Into<String>, params: Vec<Box<dyn ToSql>>) -> Self {
        Self {
            clause: clause.into(),
            params,
        }
    }

    #[must_use]
    pub fn is_always(&self) -> bool {
        self.clause.is_empty()
    }

    /// Combine two predicates with logical AND.
    #[must_use]
    pub fn and(mut self, other: Self) -> Self {
        if other.is_always() {
            return self;
        }
        if self.is_always() {
            return other;
        }
        self.clause = format!("({}) AND ({})", self.clause, other.clause);
        self.params.extend(other.params);
        self
    }

    /// The raw clause fragment (empty when always-true).
    #[must_use]
    pub fn clause(&self) -> &str {
        &self.clause
    }

    /// A ` WHERE ...` suffix ready to splice into a SELECT, or the empty
    /// string when the predicate is always-true.
    #[must_use]
    pub fn where_clause(&self) -> String {
        if self.is_always() {
            String::new()
        } else {
            format!(" WHERE {}", self.clause)
        }
    }

    /// Bound parameters in placeholder order.
    #[must_use]
    pub fn params(&self) -> &[Box<dyn ToSql>] {
        &self.params
    }
}

impl std::fmt::Debug for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predicate")
            .field("clause", &self.clause)
            .field("params", &self.params.len())
            .finish()
    }
}

/// The closed set of dashboard filters.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Composite filter over the message type, nesting per-branch child
    /// filters. At most two levels deep by construction.
    MessageType {
        value: Option<MessageType>,
        branches: Vec<(MessageType, Vec<Filter>)>,
    },
    Status(Option<Status>),
    Logger(Option<String>),
    Level(Option<LogLevel>),
    TestResult(Option<TestResult>),
    Site(Option<String>),
    Project(Option<i64>),
}

impl Filter {
    /// The query-param name this filter reads its value from.
    #[must_use]
    pub const fn query_param(&self) -> &'static str {
        match self {
            Self::MessageType { .. } => "message_type",
            Self::Status(_) => "status",
            Self::Logger(_) => "logger",
            Self::Level(_) => "level",
            Self::TestResult(_) => "test_result",
            Self::Site(_) => "site",
            Self::Project(_) => "project",
        }
    }

    /// Human label for the filter widget.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::MessageType { .. } => "Message Type",
            Self::Status(_) => "Status",
            Self::Logger(_) => "Logger",
            Self::Level(_) => "Level",
            Self::TestResult(_) => "Test Result",
            Self::Site(_) => "Site",
            Self::Project(_) => "Project",
        }
    }

    /// The message type this filter is scoped to, if any.
    ///
    /// Scoped filters get the escape-hatch disjunct in their predicate:
    /// rows of *other* message types always match.
    #[must_use]
    pub const fn affinity(&self) -> Option<MessageType> {
        match self {
            Self::Logger(_) | Self::Level(_) => Some(MessageType::Log),
            Self::TestResult(_) => Some(MessageType::Test),
            _ => None,
        }
    }

    /// The filter's current value, rendered as query-param text.
    #[must_use]
    pub fn value(&self) -> Option<String> {
        match self {
            Self::MessageType { value, .. } => value.map(|v| v.to_string()),
            Self::Status(value) => value.map(|v| v.to_string()),
            Self::Logger(value) | Self::Site(value) => value.clone(),
            Self::Level(value) => value.map(|v| v.to_string()),
            Self::TestResult(value) => value.map(|v| v.to_string()),
            Self::Project(value) => value.map(|v| v.to_string()),
        }
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.value().is_some()
    }

    /// Available choices for this filter's widget.
    ///
    /// Enum-backed filters use static tables; value-bearing filters read
    /// the facet index (never the raw event log).
    ///
    /// # Errors
    ///
    /// Returns an error if a facet index query fails.
    pub fn choices(&self, conn: &Connection) -> anyhow::Result<Vec<Choice>> {
        let choices = match self {
            Self::MessageType { .. } => vec![
                Choice::new("log", "Log"),
                Choice::new("test", "Test"),
            ],
            Self::Status(_) => vec![
                Choice::new("unresolved", "Unresolved"),
                Choice::new("resolved", "Resolved"),
            ],
            Self::Level(_) => [
                LogLevel::Debug,
                LogLevel::Info,
                LogLevel::Warning,
                LogLevel::Error,
                LogLevel::Critical,
            ]
            .iter()
            .map(|level| Choice::new(level.as_str(), capitalize(level.as_str())))
            .collect(),
            Self::TestResult(_) => [TestResult::Passed, TestResult::Failed, TestResult::Errored]
                .iter()
                .map(|result| Choice::new(result.as_str(), capitalize(result.as_str())))
                .collect(),
            Self::Logger(_) => facet_choices(conn, FacetKey::Logger)?,
            Self::Site(_) => facet_choices(conn, FacetKey::Site)?,
            Self::Project(_) => facet_choices(conn, FacetKey::Project)?,
        };
        Ok(choices)
    }

    /// Contribute this filter's predicate fragment.
    #[must_use]
    pub fn predicate(&self) -> Predicate {
        match self {
            Self::MessageType { value, branches } => match value {
                Some(message_type) => {
                    let own = Predicate::new(
                        "message_type = ?",
                        vec![Box::new(message_type.code())],
                    );
                    branches
                        .iter()
                        .filter(|(branch, _)| branch == message_type)
                        .flat_map(|(_, children)| children.iter())
                        .fold(own, |acc, child| acc.and(child.predicate()))
                }
                // No type selected: every branch's set children still
                // contribute; their escape-hatch predicates keep rows of
                // other kinds visible.
                None => branches
                    .iter()
                    .flat_map(|(_, children)| children.iter())
                    .fold(Predicate::always(), |acc, child| acc.and(child.predicate())),
            },
            Self::Status(value) => {
                value.map_or_else(Predicate::always, |status| {
                    Predicate::new("status = ?", vec![Box::new(status.code())])
                })
            }
            Self::Logger(value) => value.as_ref().map_or_else(Predicate::always, |logger| {
                self.scoped("logger = ?", Box::new(logger.clone()))
            }),
            Self::Level(value) => value.map_or_else(Predicate::always, |level| {
                self.scoped("level = ?", Box::new(level.code()))
            }),
            Self::TestResult(value) => value.map_or_else(Predicate::always, |result| {
                self.scoped("test_result = ?", Box::new(result.code()))
            }),
            // Site lives on event rows, not on the group snapshot; the
            // predicate goes through the occurrence log.
            Self::Site(value) => value.as_ref().map_or_else(Predicate::always, |site| {
                Predicate::new(
                    "group_id IN (SELECT group_id FROM events WHERE site = ?)",
                    vec![Box::new(site.clone())],
                )
            }),
            Self::Project(value) => value.map_or_else(Predicate::always, |project| {
                Predicate::new("project_id = ?", vec![Box::new(project)])
            }),
        }
    }

    /// Wrap an equality clause with the message-type escape hatch when
    /// this filter declares an affinity.
    fn scoped(&self, clause: &str, param: Box<dyn ToSql>) -> Predicate {
        match self.affinity() {
            None => Predicate::new(clause, vec![param]),
            Some(affinity) => Predicate::new(
                format!("({clause} OR message_type <> ?)"),
                vec![param, Box::new(affinity.code())],
            ),
        }
    }

    /// Inject default attributes into an about-to-be-ingested record.
    ///
    /// The one capability allowed to mutate anything: the site filter
    /// fills in the configured default site when the event arrives
    /// without one. All other variants are no-ops.
    pub fn process(&self, config: &StoreConfig, attrs: &mut EventAttributes) {
        match self {
            Self::Site(_) => {
                if attrs.site.is_none() {
                    attrs.site.clone_from(&config.site);
                }
            }
            Self::MessageType { branches, .. } => {
                for (_, children) in branches {
                    for child in children {
                        child.process(config, attrs);
                    }
                }
            }
            _ => {}
        }
    }
}

/// The standard dashboard filter tree plus the free-text query.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSet {
    filters: Vec<Filter>,
    text_query: Option<String>,
}

impl FilterSet {
    /// The standard filter tree with nothing set: the message-type
    /// composite (log -> logger/level, test -> test result) plus status,
    /// site, and project.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            filters: vec![
                Filter::MessageType {
                    value: None,
                    branches: vec![
                        (
                            MessageType::Log,
                            vec![Filter::Logger(None), Filter::Level(None)],
                        ),
                        (MessageType::Test, vec![Filter::TestResult(None)]),
                    ],
                },
                Filter::Status(None),
                Filter::Site(None),
                Filter::Project(None),
            ],
            text_query: None,
        }
    }

    /// Build the standard tree with values extracted from query params.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for any unparseable filter value;
    /// predicate construction never silently drops a bad selection.
    pub fn from_query(params: &QueryParams) -> Result<Self, ValidationError> {
        let message_type = parse_param::<MessageType>(params, "message_type")?;
        let filters = vec![
            Filter::MessageType {
                value: message_type,
                branches: vec![
                    (
                        MessageType::Log,
                        vec![
                            Filter::Logger(params.get("logger").cloned()),
                            Filter::Level(parse_param::<LogLevel>(params, "level")?),
                        ],
                    ),
                    (
                        MessageType::Test,
                        vec![Filter::TestResult(parse_param::<TestResult>(
                            params,
                            "test_result",
                        )?)],
                    ),
                ],
            },
            Filter::Status(parse_param::<Status>(params, "status")?),
            Filter::Site(params.get("site").cloned()),
            Filter::Project(parse_project(params)?),
        ];

        Ok(Self {
            filters,
            text_query: params
                .get(TEXT_QUERY_PARAM)
                .filter(|q| !q.trim().is_empty())
                .cloned(),
        })
    }

    /// The top-level filters in display order.
    #[must_use]
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// The free-text query, if one was given.
    #[must_use]
    pub fn text_query(&self) -> Option<&str> {
        self.text_query.as_deref()
    }

    /// Fold every active filter (and the free-text query) into a single
    /// AND-combined predicate over group rows.
    #[must_use]
    pub fn predicate(&self) -> Predicate {
        let combined = self
            .filters
            .iter()
            .fold(Predicate::always(), |acc, filter| {
                acc.and(filter.predicate())
            });

        match &self.text_query {
            None => combined,
            Some(query) => {
                let pattern = format!("%{}%", escape_like(query));
                combined.and(Predicate::new(
                    "(name LIKE ? ESCAPE '\\' OR message LIKE ? ESCAPE '\\')",
                    vec![Box::new(pattern.clone()), Box::new(pattern)],
                ))
            }
        }
    }

    /// Run every filter's `process` hook over an event mapping.
    pub fn process(&self, config: &StoreConfig, attrs: &mut EventAttributes) {
        for filter in &self.filters {
            filter.process(config, attrs);
        }
    }
}

fn parse_param<T>(params: &QueryParams, key: &'static str) -> Result<Option<T>, ValidationError>
where
    T: std::str::FromStr,
{
    params
        .get(key)
        .map(|raw| {
            raw.parse::<T>().map_err(|_| ValidationError {
                field: key,
                reason: "has an unrecognized value",
            })
        })
        .transpose()
}

fn parse_project(params: &QueryParams) -> Result<Option<i64>, ValidationError> {
    params
        .get("project")
        .map(|raw| {
            raw.parse::<i64>().map_err(|_| ValidationError {
                field: "project",
                reason: "must be an integer id",
            })
        })
        .transpose()
}

fn facet_choices(conn: &Connection, key: FacetKey) -> anyhow::Result<Vec<Choice>> {
    Ok(facet::list(conn, key)?
        .into_iter()
        .map(|fv| Choice {
            value: fv.value,
            label: fv.label,
        })
        .collect())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().collect::<String>() + chars.as_str()
    })
}
