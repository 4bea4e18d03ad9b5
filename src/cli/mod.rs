//! CLI support for fql
//!
//! Provides programmatic access to the fql commands so other tools can embed
//! them without going through the binary.

mod check;

pub use check::{Command, CommandOptions, execute};

use std::io;

use thiserror::Error;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    /// Definition could not be loaded
    #[error("{0}")]
    Definition(#[from] crate::DefinitionError),
    /// Rendering or decomposition failed
    #[error("Query error: {0}")]
    Query(#[from] crate::QueryError),
    /// JSON output could not be produced
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// No input provided
    #[error("No input provided. Pass a definition file or pipe JSON to stdin.")]
    NoInput,
}
