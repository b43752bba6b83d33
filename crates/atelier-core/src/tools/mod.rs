//! Tool framework
//!
//! The abstractions the `file_operation` tool (and any future tool) plugs
//! into:
//!
//! - [`Tool`] - trait every tool implements
//! - [`FileSystemTool`] - helper trait for path resolution
//! - [`ToolCall`] / [`ToolResult`] - invocation and envelope types
//! - [`ToolError`] - error taxonomy surfaced to the LLM
//! - [`ToolExecutor`] - registry dispatching calls from a stream handler

pub mod base;
pub mod error;
pub mod executor;
pub mod types;

pub use base::{FileSystemTool, Tool};
pub use error::ToolError;
pub use executor::ToolExecutor;
pub use types::{ToolCall, ToolParameter, ToolResult, ToolSchema};
