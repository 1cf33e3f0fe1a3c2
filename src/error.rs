//! Error types for graph loading and construction.
//!
//! Library code returns [`Error`] through the crate-wide [`Result`] alias;
//! the CLI and HTTP layers wrap these in `anyhow` with call-site context.

use thiserror::Error;

/// Errors raised while reading or building a road-network graph.
#[derive(Error, Debug)]
pub enum Error {
    /// A graph document could not be read from disk.
    #[error("failed to read graph document: {0}")]
    Io(#[from] std::io::Error),

    /// A graph document did not parse as the expected JSON shape.
    #[error("malformed graph document: {0}")]
    MalformedDocument(#[from] serde_json::Error),

    /// A node carried a NaN or infinite coordinate.
    #[error("node {node} has a non-finite coordinate")]
    NonFiniteCoordinate {
        /// Identifier of the offending node record.
        node: i64,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
