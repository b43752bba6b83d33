//! Error types for tool operations

use crate::error::EngineError;
use thiserror::Error;

/// Errors a tool execution can surface.
///
/// Each variant maps to a stable kind tag (see [`ToolError::kind`]) that
/// travels in the failure envelope so the model and the UI can react
/// programmatically. Match failures and range errors are recoverable: the
/// model re-issues a corrected call.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// `old_string` is absent from the composed view
    #[error("{0}")]
    NoMatch(String),

    /// `old_string` occurs more than once in the composed view
    #[error("{0}")]
    AmbiguousMatch(String),

    /// Reading the target file or directory failed
    #[error("{0}")]
    FileUnreadable(String),

    /// Whole-file read requested on a file over the line limit
    #[error("{0}")]
    FileTooLarge(String),

    /// Read offset beyond the end of the file
    #[error("{0}")]
    OutOfRange(String),

    /// Writing a durable index failed; staged state is unchanged
    #[error("Persistence failed: {0}")]
    PersistenceFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Tool execution timed out")]
    Timeout,

    #[error("Tool execution cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ToolError {
    /// Stable kind tag carried in the failure envelope
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::InvalidArguments(_) => "invalid-arguments",
            ToolError::NoMatch(_) => "no-match",
            ToolError::AmbiguousMatch(_) => "ambiguous-match",
            ToolError::FileUnreadable(_) => "file-unreadable",
            ToolError::FileTooLarge(_) => "file-too-large",
            ToolError::OutOfRange(_) => "out-of-range",
            ToolError::PersistenceFailed(_) => "persistence-failed",
            ToolError::NotFound(_) => "not-found",
            ToolError::ExecutionFailed(_) => "execution-failed",
            ToolError::Timeout => "timeout",
            ToolError::Cancelled => "cancelled",
            ToolError::Io(_) => "io",
            ToolError::Json(_) => "json",
        }
    }

    /// Whether the model can recover by re-issuing a corrected call
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ToolError::InvalidArguments(_)
                | ToolError::NoMatch(_)
                | ToolError::AmbiguousMatch(_)
                | ToolError::FileTooLarge(_)
                | ToolError::OutOfRange(_)
        )
    }
}

impl From<EngineError> for ToolError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Persistence { message } => ToolError::PersistenceFailed(message),
            EngineError::NotFound(what) => ToolError::NotFound(what),
            other => ToolError::ExecutionFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tags_are_stable() {
        assert_eq!(ToolError::NoMatch("x".into()).kind(), "no-match");
        assert_eq!(ToolError::AmbiguousMatch("x".into()).kind(), "ambiguous-match");
        assert_eq!(ToolError::FileTooLarge("x".into()).kind(), "file-too-large");
        assert_eq!(ToolError::OutOfRange("x".into()).kind(), "out-of-range");
    }

    #[test]
    fn engine_errors_map_to_taxonomy() {
        let err: ToolError = EngineError::persistence("disk full").into();
        assert_eq!(err.kind(), "persistence-failed");

        let err: ToolError = EngineError::not_found("session x").into();
        assert_eq!(err.kind(), "not-found");
    }

    #[test]
    fn match_failures_are_recoverable() {
        assert!(ToolError::NoMatch("x".into()).is_recoverable());
        assert!(!ToolError::PersistenceFailed("x".into()).is_recoverable());
    }
}
