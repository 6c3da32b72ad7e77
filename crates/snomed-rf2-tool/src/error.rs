//! Error type for the release tool.

use snomed_graph::GraphError;
use thiserror::Error;

/// Errors raised by the release tool.
#[derive(Error, Debug)]
pub enum ToolError {
    /// Invalid or missing setting.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure inside the terminology graph.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Malformed configuration file.
    #[error("Invalid configuration file: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error reading the configuration file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;
