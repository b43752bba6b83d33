//! Error types for the edit engine

use thiserror::Error;

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Main error type for the edit engine
///
/// Store and coordinator failures are surfaced to the caller without
/// internal retries; a persistence failure leaves the in-memory state at
/// the previous durable state.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Writing a durable JSON index failed
    #[error("persistence failed: {message}")]
    Persistence { message: String },

    /// Reading a target file from disk failed
    #[error("failed to read '{path}': {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Writing a target file to disk failed
    #[error("failed to write '{path}': {source}")]
    FileWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A requested entity (session, snapshot, tool message) does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Chat transcript errors (bad index, malformed message content)
    #[error("session error: {0}")]
    Session(String),

    /// Generic IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// Create a persistence error
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    /// Create a file-read error
    pub fn file_read(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Create a file-write error
    pub fn file_write(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }

    /// Create a not-found error
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Create a session error
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session(message.into())
    }
}
