//! Translation of [`GraphError`]s into problem details.
//!
//! A [`ProblemMapper`] holds `(Matcher, Handler)` entries. Every entry whose
//! matcher accepts the error is a candidate; the most specific one wins and
//! registration order breaks ties between equally specific entries.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use super::errors::{ErrorCategory, ErrorKind, GraphError};

/// Selects the errors an entry applies to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Matcher {
    Kind(ErrorKind),
    Category(ErrorCategory),
    Any,
}

impl Matcher {
    #[must_use]
    pub fn matches(self, error: &GraphError) -> bool {
        match self {
            Self::Kind(kind) => error.kind() == kind,
            Self::Category(category) => error.category() == category,
            Self::Any => true,
        }
    }

    #[must_use]
    pub fn specificity(self) -> u8 {
        match self {
            Self::Kind(_) => 2,
            Self::Category(_) => 1,
            Self::Any => 0,
        }
    }
}

/// Status and human readable detail chosen by a handler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub status: u16,
    pub detail: String,
}

pub type Handler = Arc<dyn Fn(&GraphError) -> Resolution + Send + Sync>;

/// RFC 7807 problem detail together with the legacy error attributes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProblemDetail {
    #[serde(rename = "type")]
    pub kind: String,
    pub status: u16,
    pub title: String,
    pub detail: String,
    pub instance: String,
    pub error: String,
    pub message: String,
    pub path: String,
    pub timestamp: String,
}

#[derive(Clone)]
pub struct ProblemMapper {
    entries: Vec<(Matcher, Handler)>,
}

impl ProblemMapper {
    /// A mapper without entries; unmatched errors resolve to 500.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn register(mut self, matcher: Matcher, handler: Handler) -> Self {
        self.entries.push((matcher, handler));
        self
    }

    /// Registers a handler answering `status` with the error message as
    /// detail.
    #[must_use]
    pub fn register_status(self, matcher: Matcher, status: u16) -> Self {
        self.register(
            matcher,
            Arc::new(move |error: &GraphError| Resolution {
                status,
                detail: error.to_string(),
            }),
        )
    }

    /// The most specific entry matching `error`, first registered on ties.
    fn handler_for(&self, error: &GraphError) -> Option<&Handler> {
        let mut best: Option<&(Matcher, Handler)> = None;
        for entry in &self.entries {
            if !entry.0.matches(error) {
                continue;
            }
            if best.map_or(true, |(matcher, _)| entry.0.specificity() > matcher.specificity()) {
                best = Some(entry);
            }
        }
        best.map(|(_, handler)| handler)
    }

    #[must_use]
    pub fn resolve(&self, error: &GraphError, instance: &str) -> ProblemDetail {
        self.resolve_at(error, instance, Utc::now())
    }

    #[must_use]
    pub fn resolve_at(
        &self,
        error: &GraphError,
        instance: &str,
        timestamp: DateTime<Utc>,
    ) -> ProblemDetail {
        let resolution = self.handler_for(error).map_or_else(
            || Resolution {
                status: 500,
                detail: error.to_string(),
            },
            |handler| handler(error),
        );
        if resolution.status >= 500 {
            tracing::error!(?error, status = resolution.status, instance, "graph operation failed");
        } else {
            tracing::debug!(?error, status = resolution.status, instance, "graph operation rejected");
        }

        let title = reason_phrase(resolution.status).to_string();
        ProblemDetail {
            kind: "about:blank".to_string(),
            status: resolution.status,
            error: title.clone(),
            title,
            message: resolution.detail.clone(),
            detail: resolution.detail,
            path: instance.to_string(),
            instance: instance.to_string(),
            timestamp: timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

impl std::fmt::Debug for ProblemMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(matcher, _)| matcher))
            .finish()
    }
}

/// Category statuses plus the kinds whose status differs from their category.
impl Default for ProblemMapper {
    fn default() -> Self {
        Self::empty()
            .register_status(Matcher::Any, 500)
            .register_status(Matcher::Category(ErrorCategory::NotFound), 404)
            .register_status(Matcher::Category(ErrorCategory::Validation), 400)
            .register_status(Matcher::Category(ErrorCategory::Conflict), 409)
            .register_status(Matcher::Category(ErrorCategory::ForbiddenOperation), 403)
            .register_status(Matcher::Category(ErrorCategory::Authorization), 403)
            .register_status(Matcher::Category(ErrorCategory::Internal), 500)
            .register_status(Matcher::Kind(ErrorKind::UnmodifiableStatement), 403)
            .register_status(Matcher::Kind(ErrorKind::TraversalTimeout), 503)
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        409 => "Conflict",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown Status",
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::graph::value_objects::{StatementId, ThingId};

    fn id(value: &str) -> ThingId {
        ThingId::new(value).expect("valid id")
    }

    #[test]
    fn category_statuses() {
        let mapper = ProblemMapper::default();
        let cases = [
            (GraphError::ResourceNotFound { id: id("R1") }, 404),
            (GraphError::ReservedClass { id: id("List") }, 400),
            (GraphError::ClassAlreadyExists { id: id("C1") }, 409),
            (GraphError::ResourceUsedInStatement { id: id("R1") }, 403),
        ];
        for (error, status) in cases {
            assert_eq!(mapper.resolve(&error, "/api/things").status, status, "{error}");
        }
    }

    #[test]
    fn kind_override_beats_category() {
        let error = GraphError::TraversalTimeout {
            root: id("R1"),
            timeout_ms: 10,
        };
        let problem = ProblemMapper::default().resolve(&error, "/api/statements/R1/bundle");
        assert_eq!(problem.status, 503);
        insta::assert_snapshot!(problem.title, @"Service Unavailable");
    }

    #[test]
    fn registration_order_breaks_ties() {
        let mapper = ProblemMapper::empty()
            .register_status(Matcher::Category(ErrorCategory::NotFound), 404)
            .register_status(Matcher::Category(ErrorCategory::NotFound), 410);
        let problem = mapper.resolve(&GraphError::ListNotFound { id: id("R9") }, "/lists/R9");
        assert_eq!(problem.status, 404);
    }

    #[test]
    fn unmatched_errors_are_internal() {
        let problem = ProblemMapper::empty().resolve(
            &GraphError::StatementNotFound {
                id: StatementId::new("S1").unwrap(),
            },
            "/api/statements/S1",
        );
        assert_eq!(problem.status, 500);
    }

    #[test]
    fn legacy_fields_mirror_problem_fields() {
        let at = Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap();
        let problem = ProblemMapper::default().resolve_at(
            &GraphError::ClassNotFound { id: id("C7") },
            "/api/classes/C7",
            at,
        );
        assert_eq!(problem.error, problem.title);
        assert_eq!(problem.message, problem.detail);
        assert_eq!(problem.path, problem.instance);
        insta::assert_snapshot!(problem.detail, @"class `C7` not found");
        insta::assert_snapshot!(problem.timestamp, @"2024-02-03T04:05:06.000Z");

        let json = serde_json::to_value(&problem).unwrap();
        assert_eq!(json["type"], "about:blank");
        assert_eq!(json["status"], 404);
    }
}
