//! Tool execution engine
//!
//! Dispatches tool calls arriving from an LLM stream handler. Calls within
//! one stream run strictly sequentially, so call N+1 observes the staged
//! effects of call N. A client "stop" cancels further dispatch without
//! disturbing edits already staged.

use super::base::Tool;
use super::error::ToolError;
use super::types::{ToolCall, ToolResult, ToolSchema};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Tool executor that manages and executes tools
pub struct ToolExecutor {
    tools: HashMap<String, Arc<dyn Tool>>,
    max_execution_time: Duration,
    cancellation: CancellationToken,
}

impl ToolExecutor {
    /// Create a new tool executor with a 5-minute default timeout
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            max_execution_time: Duration::from_secs(300),
            cancellation: CancellationToken::new(),
        }
    }

    /// Create a tool executor with a custom default timeout
    pub fn with_max_execution_time(max_execution_time: Duration) -> Self {
        Self {
            max_execution_time,
            ..Self::new()
        }
    }

    /// Use the given token for stream cancellation
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// The token a client "stop" signal cancels
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Register a tool
    pub fn register_tool(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a tool by name
    pub fn get_tool(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Check if a tool is registered
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Get all registered tool names
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// Get tool schemas for all registered tools
    pub fn get_tool_schemas(&self) -> Vec<ToolSchema> {
        self.tools.values().map(|tool| tool.schema()).collect()
    }

    /// Execute a single tool call
    pub async fn execute_tool(&self, call: &ToolCall) -> ToolResult {
        if self.cancellation.is_cancelled() {
            return cancelled_result(call);
        }

        let tool = match self.tools.get(&call.name) {
            Some(tool) => tool,
            None => {
                warn!(tool = %call.name, "unknown tool requested");
                return ToolResult::error(
                    &call.id,
                    &call.name,
                    format!("Tool '{}' not found", call.name),
                )
                .with_metadata("error_kind", ToolError::NotFound(call.name.clone()).kind());
            }
        };

        let execution_timeout = tool
            .max_execution_time()
            .map(Duration::from_secs)
            .unwrap_or(self.max_execution_time);

        match timeout(execution_timeout, tool.execute_with_timing(call)).await {
            Ok(result) => result,
            Err(_) => ToolResult::error(
                &call.id,
                &call.name,
                format!("Tool execution timed out after {:?}", execution_timeout),
            )
            .with_metadata("error_kind", ToolError::Timeout.kind()),
        }
    }

    /// Execute tool calls from one stream, strictly in order.
    ///
    /// When the stream is cancelled mid-batch, the remaining calls are
    /// answered with cancellation envelopes instead of being dispatched;
    /// edits already staged by earlier calls stay pending.
    pub async fn execute_tools(&self, calls: &[ToolCall]) -> Vec<ToolResult> {
        let mut results = Vec::with_capacity(calls.len());

        for (i, call) in calls.iter().enumerate() {
            if self.cancellation.is_cancelled() {
                debug!(remaining = calls.len() - i, "stream cancelled, skipping dispatch");
                results.extend(calls[i..].iter().map(cancelled_result));
                break;
            }
            results.push(self.execute_tool(call).await);
        }

        results
    }
}

impl Default for ToolExecutor {
    fn default() -> Self {
        Self::new()
    }
}

fn cancelled_result(call: &ToolCall) -> ToolResult {
    ToolResult::error(&call.id, &call.name, ToolError::Cancelled.to_string())
        .with_metadata("error_kind", ToolError::Cancelled.kind())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct CountingTool {
        executed: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl Tool for CountingTool {
        fn name(&self) -> &str {
            "counter"
        }

        fn description(&self) -> &str {
            "Counts executions"
        }

        fn schema(&self) -> ToolSchema {
            ToolSchema::new(self.name(), self.description(), vec![])
        }

        async fn execute(&self, call: &ToolCall) -> Result<ToolResult, ToolError> {
            let n = self
                .executed
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(ToolResult::success(&call.id, self.name(), n.to_string()))
        }
    }

    fn call(id: &str) -> ToolCall {
        ToolCall::new(id, "counter", HashMap::new())
    }

    #[tokio::test]
    async fn dispatches_in_order() {
        let mut executor = ToolExecutor::new();
        executor.register_tool(Arc::new(CountingTool {
            executed: Default::default(),
        }));

        let results = executor.execute_tools(&[call("t1"), call("t2")]).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].output.as_deref(), Some("0"));
        assert_eq!(results[1].output.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn unknown_tool_yields_error_envelope() {
        let executor = ToolExecutor::new();
        let result = executor.execute_tool(&call("t1")).await;
        assert!(!result.success);
        assert_eq!(result.metadata["error_kind"], "not-found");
    }

    #[tokio::test]
    async fn cancellation_stops_dispatch() {
        let token = CancellationToken::new();
        let mut executor = ToolExecutor::new().with_cancellation(token.clone());
        executor.register_tool(Arc::new(CountingTool {
            executed: Default::default(),
        }));

        token.cancel();
        let results = executor.execute_tools(&[call("t1"), call("t2")]).await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| !r.success));
        assert!(results
            .iter()
            .all(|r| r.metadata["error_kind"] == "cancelled"));
    }
}
