//! Configuration loaded from YAML.
//!
//! Every field carries a default, so an empty document yields a working
//! in-memory graph:
//!
//! ```yaml
//! logger:
//!   level: debug
//!   format: json
//! graph:
//!   backend: in_memory
//!   cache:
//!     enabled: true
//!     max_capacity: 10000
//!     time_to_live_secs: 300
//!   identifiers:
//!     resource_prefix: R
//!   queries:
//!     traversal_timeout_ms: 30000
//! ```

use std::{fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{logger::LoggerConfig, Error, Result};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logger: LoggerConfig,
    pub graph: GraphSettings,
}

impl Config {
    /// Parses configuration from YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Reads and parses a YAML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| Error::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }
}

/// Settings of the knowledge-graph core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSettings {
    pub backend: GraphBackend,
    pub cache: CacheSettings,
    pub identifiers: IdentifierSettings,
    pub queries: QuerySettings,
}

/// Storage backends available to the graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphBackend {
    #[default]
    InMemory,
}

/// Entity cache settings.
///
/// Caches are process local. With several processes writing to one store,
/// each one can serve stale entries written by the others until they expire;
/// disable the cache or set a short `time_to_live_secs` in that setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    /// Maximum number of entries held by each cache.
    pub max_capacity: u64,
    pub time_to_live_secs: Option<u64>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_capacity: 10_000,
            time_to_live_secs: None,
        }
    }
}

impl CacheSettings {
    #[must_use]
    pub fn time_to_live(&self) -> Option<Duration> {
        self.time_to_live_secs.map(Duration::from_secs)
    }
}

/// Prefixes used when generating identifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentifierSettings {
    pub resource_prefix: String,
    pub literal_prefix: String,
    pub predicate_prefix: String,
    pub class_prefix: String,
    pub statement_prefix: String,
}

impl Default for IdentifierSettings {
    fn default() -> Self {
        Self {
            resource_prefix: "R".to_string(),
            literal_prefix: "L".to_string(),
            predicate_prefix: "P".to_string(),
            class_prefix: "C".to_string(),
            statement_prefix: "S".to_string(),
        }
    }
}

/// Limits applied to graph queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    /// Upper bound for a single traversal (bundles, recursive counts,
    /// contributor and timeline lookups).
    pub traversal_timeout_ms: u64,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            traversal_timeout_ms: 30_000,
        }
    }
}

impl QuerySettings {
    #[must_use]
    pub fn traversal_timeout(&self) -> Duration {
        Duration::from_millis(self.traversal_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::{Format, LogLevel};

    #[test]
    fn empty_document_uses_defaults() {
        let config = Config::from_yaml_str("").expect("defaults");
        assert_eq!(config.graph.backend, GraphBackend::InMemory);
        assert!(config.graph.cache.enabled);
        assert_eq!(config.graph.cache.max_capacity, 10_000);
        assert_eq!(config.graph.identifiers.statement_prefix, "S");
        assert_eq!(config.graph.queries.traversal_timeout_ms, 30_000);
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let config = Config::from_yaml_str(
            r"
logger:
  level: debug
  format: json
graph:
  cache:
    enabled: false
    time_to_live_secs: 60
  identifiers:
    resource_prefix: Res
",
        )
        .expect("valid yaml");

        assert_eq!(config.logger.level, LogLevel::Debug);
        assert_eq!(config.logger.format, Format::Json);
        assert!(!config.graph.cache.enabled);
        assert_eq!(
            config.graph.cache.time_to_live(),
            Some(Duration::from_secs(60))
        );
        assert_eq!(config.graph.identifiers.resource_prefix, "Res");
        assert_eq!(config.graph.identifiers.literal_prefix, "L");
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let err = Config::from_yaml_str("graph:\n  backend: neo4j\n").expect_err("invalid");
        assert!(matches!(err, Error::YAML(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Config::from_file("/definitely/not/here.yaml").expect_err("missing");
        assert!(matches!(err, Error::ConfigIo { path, .. } if path.ends_with("here.yaml")));
    }
}
