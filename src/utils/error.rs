use std::io;

use thiserror::Error;

/// Result type for engine operations
pub type TocResult<T> = Result<T, TocError>;

/// Error types for table of contents operations
#[derive(Debug, Error)]
pub enum TocError {
    /// IO error wrapper
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Settings store read or write failure
    #[error("Settings store error: {0}")]
    Store(String),

    /// Message channel failure (no live listener, closed page, dropped reply)
    #[error("Message error: {0}")]
    Message(String),

    /// Page snapshot could not be loaded or is inconsistent
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// Stale node handle or missing element in the host document
    #[error("Document error: {0}")]
    Document(String),

    /// Serialization error
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
