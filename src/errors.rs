//! Crate level error type.

use std::path::PathBuf;

use crate::graph::errors::GraphError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("failed to read configuration `{path}`: {source}")]
    ConfigIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    YAML(#[from] serde_yaml::Error),

    #[error(transparent)]
    LoggerFilter(#[from] tracing_subscriber::filter::ParseError),

    #[error("{0}")]
    Message(String),
}

impl Error {
    pub fn string(message: &str) -> Self {
        Self::Message(message.to_string())
    }

    /// Returns the domain error when this is one.
    #[must_use]
    pub fn as_graph(&self) -> Option<&GraphError> {
        match self {
            Self::Graph(err) => Some(err),
            _ => None,
        }
    }
}
