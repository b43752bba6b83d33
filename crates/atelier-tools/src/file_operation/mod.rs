//! Unified file operation tool
//!
//! The one function surfaced to the LLM. Every call carries a `type`
//! discriminator; `edit` and `write` stage changes (nothing touches disk
//! until the user accepts the batch), `read` answers with the speculative
//! view, and `list`/`grep`/`find` are plain read-only lookups.

mod diff;
mod edit;
mod find;
mod grep;
mod list;
mod read;
mod write;

pub use diff::{change_set, line_change_counts, ChangeOp};

use async_trait::async_trait;
use atelier_core::tools::{FileSystemTool, Tool, ToolCall, ToolError, ToolParameter, ToolResult, ToolSchema};
use atelier_core::EditEngine;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::instrument;

/// Hard cap on lines returned by a single read
pub const MAX_READ_LINES: usize = 1000;
/// Hard cap on directory entries returned by list
pub const MAX_LIST_ENTRIES: usize = 100;
/// Hard cap on grep matches before truncation
pub const MAX_GREP_MATCHES: usize = 50;
/// Hard cap on find results before truncation
pub const MAX_FIND_RESULTS: usize = 100;

/// Arguments of a `file_operation` call
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileOperationArgs {
    /// Operation discriminator: read, write, edit, list, grep, find
    #[serde(rename = "type", default)]
    pub op: String,
    #[serde(default)]
    pub server_id: String,
    /// File path for read/write/edit, directory path for list/grep/find
    #[serde(default)]
    pub file_path: String,

    /// write: full file content
    #[serde(default)]
    pub content: String,

    /// edit: exact text to replace / replacement text
    #[serde(default)]
    pub old_string: String,
    #[serde(default)]
    pub new_string: String,

    /// grep: search text, regex switch, include globs
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub is_regex: bool,
    #[serde(default)]
    pub includes: Vec<String>,

    /// find: filename glob, depth limit, excluded names
    #[serde(default)]
    pub pattern: String,
    #[serde(default)]
    pub max_depth: usize,
    #[serde(default)]
    pub excludes: Vec<String>,

    /// read: 1-based start line and line count
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub limit: usize,
}

/// The unified file tool, backed by the speculative-edit engine
pub struct FileOperationTool {
    engine: Arc<EditEngine>,
    working_directory: PathBuf,
}

impl FileOperationTool {
    /// Create the tool over an engine handle, resolving relative paths
    /// against the current directory
    pub fn new(engine: Arc<EditEngine>) -> Self {
        Self {
            engine,
            working_directory: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Create the tool with a specific working directory
    pub fn with_working_directory<P: Into<PathBuf>>(engine: Arc<EditEngine>, working_dir: P) -> Self {
        Self {
            engine,
            working_directory: working_dir.into(),
        }
    }

    pub(crate) fn engine(&self) -> &EditEngine {
        &self.engine
    }

    /// Resolve the path argument and return it together with the string
    /// key the pending log and snapshot store file entries use
    pub(crate) fn key_path(&self, raw: &str) -> (PathBuf, String) {
        let path = self.resolve_path(raw);
        let key = path.to_string_lossy().to_string();
        (path, key)
    }

    fn parse_args(call: &ToolCall) -> Result<FileOperationArgs, ToolError> {
        let value = serde_json::to_value(&call.arguments)?;
        serde_json::from_value(value)
            .map_err(|e| ToolError::InvalidArguments(format!("Malformed arguments: {}", e)))
    }
}

#[async_trait]
impl Tool for FileOperationTool {
    fn name(&self) -> &str {
        "file_operation"
    }

    fn description(&self) -> &str {
        "Unified file operation tool: read, write, edit, list directories, search \
         content and find files, selected via the `type` parameter. Edits are exact \
         string replacements staged for user confirmation; subsequent reads observe \
         the staged content."
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            self.name(),
            self.description(),
            vec![
                ToolParameter::string(
                    "type",
                    "Operation type: read (file content), write (create or overwrite), \
                     edit (exact string replacement), list (directory contents), \
                     grep (content search), find (filename search)",
                )
                .with_enum_values(&["read", "write", "edit", "list", "grep", "find"]),
                ToolParameter::string("server_id", "Server id (local or a remote server id)"),
                ToolParameter::string(
                    "file_path",
                    "Absolute path of the file (read/write/edit) or directory (list/grep/find)",
                ),
                ToolParameter::string("content", "write only: the complete file content")
                    .optional(),
                ToolParameter::string(
                    "old_string",
                    "edit only: exact text to replace, including whitespace and \
                     indentation; must match a single location in the file",
                )
                .optional(),
                ToolParameter::string(
                    "new_string",
                    "edit only: replacement text, with correct indentation",
                )
                .optional(),
                ToolParameter::string("query", "grep only: search text or regular expression")
                    .optional(),
                ToolParameter::boolean("is_regex", "grep only: treat query as a regex")
                    .optional()
                    .with_default(serde_json::Value::Bool(false)),
                ToolParameter::string_array(
                    "includes",
                    "grep only: filename globs to search, e.g. [\"*.py\", \"*.js\"]",
                )
                .optional(),
                ToolParameter::string(
                    "pattern",
                    "find only: filename glob, e.g. \"*.config.js\"",
                )
                .optional(),
                ToolParameter::integer("max_depth", "find only: maximum search depth").optional(),
                ToolParameter::string_array(
                    "excludes",
                    "find only: directory names to skip, e.g. [\"node_modules\", \".git\"]",
                )
                .optional(),
                ToolParameter::integer("offset", "read only: 1-based start line").optional(),
                ToolParameter::integer("limit", "read only: number of lines, up to 1000")
                    .optional(),
            ],
        )
    }

    #[instrument(skip(self, call), fields(call_id = %call.id))]
    async fn execute(&self, call: &ToolCall) -> Result<ToolResult, ToolError> {
        let args = Self::parse_args(call)?;
        let conversation_id = call.conversation_id.clone().unwrap_or_default();

        let envelope = match args.op.as_str() {
            "read" => read::read_file(self, &args, &conversation_id).await?,
            "write" => write::preview_write(self, &args).await?,
            "edit" => edit::stage_edit(self, &args, &conversation_id, &call.id).await?,
            "list" => list::list_dir(self, &args).await?,
            "grep" => grep::search_content(self, &args)?,
            "find" => find::find_by_name(self, &args)?,
            other => {
                return Err(ToolError::InvalidArguments(format!(
                    "Unknown operation type: '{}'",
                    other
                )));
            }
        };

        let mut result = ToolResult::success(&call.id, self.name(), envelope.to_string());
        for key in ["status", "file_path", "tool_call_id", "is_pending"] {
            if let Some(value) = envelope.get(key) {
                result = result.with_metadata(key, value.clone());
            }
        }
        Ok(result)
    }

    fn validate(&self, call: &ToolCall) -> Result<(), ToolError> {
        let args = Self::parse_args(call)?;
        match args.op.as_str() {
            "read" | "write" | "list" => {
                if args.file_path.is_empty() {
                    return Err(ToolError::InvalidArguments(
                        "Missing 'file_path' parameter".to_string(),
                    ));
                }
            }
            "edit" => {
                if args.file_path.is_empty() {
                    return Err(ToolError::InvalidArguments(
                        "Missing 'file_path' parameter".to_string(),
                    ));
                }
                if args.old_string.is_empty() {
                    return Err(ToolError::InvalidArguments(
                        "Missing 'old_string' parameter".to_string(),
                    ));
                }
            }
            "grep" => {
                if args.query.is_empty() {
                    return Err(ToolError::InvalidArguments(
                        "Missing 'query' parameter".to_string(),
                    ));
                }
            }
            "find" => {
                if args.pattern.is_empty() {
                    return Err(ToolError::InvalidArguments(
                        "Missing 'pattern' parameter".to_string(),
                    ));
                }
            }
            "" => {
                return Err(ToolError::InvalidArguments(
                    "Missing 'type' parameter".to_string(),
                ));
            }
            other => {
                return Err(ToolError::InvalidArguments(format!(
                    "Unknown operation type: '{}'",
                    other
                )));
            }
        }
        Ok(())
    }

    fn max_execution_time(&self) -> Option<u64> {
        Some(60)
    }

    fn supports_parallel_execution(&self) -> bool {
        // staged edits and the reads that observe them must serialize
        false
    }
}

impl FileSystemTool for FileOperationTool {
    fn working_directory(&self) -> &std::path::Path {
        &self.working_directory
    }
}
