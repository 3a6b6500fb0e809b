//! Miga - semantic intent routing and pipeline orchestration for a bakery
//! assistant.
//!
//! This library exposes the core components (catalog, semantic index,
//! router, function graph, pipeline) for integration tests and embedding
//! in other applications.

pub mod catalog;
pub mod compose;
pub mod config;
pub mod embedding;
pub mod error;
pub mod executor;
pub mod graph;
pub mod handlers;
pub mod index;
pub mod inventory;
pub mod persistence;
pub mod pipeline;
pub mod router;
pub mod state;

// Re-export key types for convenience
pub use catalog::{Catalog, FunctionDefinition};
pub use config::Config;
pub use embedding::Embedder;
pub use error::{AppError, Result};
pub use graph::{FunctionGraph, FunctionId};
pub use pipeline::{ChatOutcome, Pipeline};
pub use router::{route, RouteResult};
pub use state::AppState;
