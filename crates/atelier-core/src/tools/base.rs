//! Core Tool trait definitions

use super::error::ToolError;
use super::types::{ToolCall, ToolResult, ToolSchema};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Base trait for all tools
///
/// Tools are capabilities the LLM can invoke through the executor. Each
/// tool has a schema for the model, optional validation, and async
/// execution logic.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The tool's unique name (e.g. "file_operation")
    fn name(&self) -> &str;

    /// The tool's description for LLM understanding
    fn description(&self) -> &str;

    /// The tool's JSON schema for input parameters
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with the given arguments
    async fn execute(&self, call: &ToolCall) -> Result<ToolResult, ToolError>;

    /// Validate the tool call arguments before execution.
    /// Default implementation accepts all arguments.
    fn validate(&self, _call: &ToolCall) -> Result<(), ToolError> {
        Ok(())
    }

    /// Maximum execution time in seconds, if the tool wants one
    fn max_execution_time(&self) -> Option<u64> {
        None
    }

    /// Whether this tool can be called in parallel with other tools
    fn supports_parallel_execution(&self) -> bool {
        true
    }

    /// Whether this tool only reads data without side effects
    fn is_read_only(&self) -> bool {
        false
    }

    /// Execute with validation, timing and error conversion.
    ///
    /// Always returns a `ToolResult`; a `ToolError` becomes a failure
    /// envelope carrying the error's kind tag in metadata.
    async fn execute_with_timing(&self, call: &ToolCall) -> ToolResult {
        let start_time = Instant::now();

        if let Err(err) = self.validate(call) {
            return ToolResult::error(&call.id, self.name(), err.to_string())
                .with_metadata("error_kind", err.kind())
                .with_execution_time(start_time.elapsed().as_millis() as u64);
        }

        match self.execute(call).await {
            Ok(mut result) => {
                result.execution_time_ms = Some(start_time.elapsed().as_millis() as u64);
                result
            }
            Err(err) => ToolResult::error(&call.id, self.name(), err.to_string())
                .with_metadata("error_kind", err.kind())
                .with_execution_time(start_time.elapsed().as_millis() as u64),
        }
    }
}

/// Helper trait for tools that touch the file system.
///
/// File paths in tool calls are host-absolute; relative paths are resolved
/// against the tool's working directory.
pub trait FileSystemTool: Tool {
    /// The working directory relative paths resolve against
    fn working_directory(&self) -> &Path;

    /// Resolve a path argument to an absolute path
    fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_directory().join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo the message argument"
        }

        fn schema(&self) -> ToolSchema {
            ToolSchema::new(self.name(), self.description(), vec![])
        }

        async fn execute(&self, call: &ToolCall) -> Result<ToolResult, ToolError> {
            let message = call.require_string("message")?;
            Ok(ToolResult::success(&call.id, self.name(), message))
        }

        fn validate(&self, call: &ToolCall) -> Result<(), ToolError> {
            call.require_string("message").map(|_| ())
        }
    }

    impl FileSystemTool for EchoTool {
        fn working_directory(&self) -> &Path {
            Path::new("/workdir")
        }
    }

    #[tokio::test]
    async fn timing_wrapper_converts_errors() {
        let tool = EchoTool;
        let call = ToolCall::new("t1", "echo", HashMap::new());

        let result = tool.execute_with_timing(&call).await;
        assert!(!result.success);
        assert_eq!(result.metadata["error_kind"], "invalid-arguments");
        assert!(result.execution_time_ms.is_some());
    }

    #[tokio::test]
    async fn timing_wrapper_passes_success_through() {
        let tool = EchoTool;
        let mut arguments = HashMap::new();
        arguments.insert("message".to_string(), serde_json::json!("hi"));
        let call = ToolCall::new("t1", "echo", arguments);

        let result = tool.execute_with_timing(&call).await;
        assert!(result.success);
        assert_eq!(result.output.as_deref(), Some("hi"));
    }

    #[test]
    fn path_resolution() {
        let tool = EchoTool;
        assert_eq!(tool.resolve_path("/etc/hosts"), PathBuf::from("/etc/hosts"));
        assert_eq!(
            tool.resolve_path("src/main.rs"),
            PathBuf::from("/workdir/src/main.rs")
        );
    }
}
