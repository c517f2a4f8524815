#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
//! # orkg-graph
//!
//! Core of a research knowledge graph: typed things (resources, literals,
//! predicates and classes), subject/predicate/object statements, a
//! single-inheritance class hierarchy and bounded subgraph ("bundle")
//! traversal.
//!
//! The crate is split along the usual hexagonal lines. [`graph`] holds the
//! domain model, the repository ports, an in-memory adapter, the caching
//! decorators and the domain services that act as the only write path.
//! [`config`] and [`logger`] carry the ambient setup.
//!
//! ```no_run
//! use orkg_graph::{config::Config, graph::GraphService, logger};
//!
//! # fn main() -> orkg_graph::Result<()> {
//! let config = Config::from_yaml_str("graph:\n  cache:\n    max_capacity: 500\n")?;
//! logger::init(&config.logger)?;
//! let graph = GraphService::from_config(&config.graph);
//! # let _ = graph;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod errors;
pub mod graph;
pub mod logger;

pub use errors::Error;

/// Result carrying the crate [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;
