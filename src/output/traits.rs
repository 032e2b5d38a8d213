//! Output sink traits and types
//!
//! This module defines the trait interface for persisting the product URLs
//! found for each seed domain.

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Receives the final product URLs of a crawl
///
/// Called once per seed domain after its crawl finished.
pub trait ResultSink: Send + Sync {
    /// Persists `urls` for `domain`
    fn write_results(&self, domain: &str, urls: &[String]) -> OutputResult<()>;

    /// Returns the name of this sink
    fn name(&self) -> &str;
}
