//! Speculative file read

use super::{FileOperationArgs, FileOperationTool, MAX_READ_LINES};
use atelier_core::tools::ToolError;
use atelier_core::view::compose;
use serde_json::{json, Value};
use tokio::fs;
use tracing::debug;

/// Read a file through the conversation's speculative view, with optional
/// 1-based line-range selection.
pub(crate) async fn read_file(
    tool: &FileOperationTool,
    args: &FileOperationArgs,
    conversation_id: &str,
) -> Result<Value, ToolError> {
    let (path, key) = tool.key_path(&args.file_path);

    let disk_content = fs::read_to_string(&path).await.map_err(|e| {
        ToolError::FileUnreadable(format!("Failed to read file '{}': {}", args.file_path, e))
    })?;

    let turns = tool.engine().pending().get_turns(conversation_id);
    let full_content = compose(&disk_content, &turns, &key);
    let is_pending = full_content != disk_content;

    let lines: Vec<&str> = full_content.lines().collect();
    let total_lines = lines.len();

    let (content, start_line, end_line) = if args.offset > 0 || args.limit > 0 {
        let start_line = args.offset.max(1);
        if start_line > total_lines {
            return Err(ToolError::OutOfRange(format!(
                "Start line {} is beyond the end of the file ({} lines)",
                start_line, total_lines
            )));
        }

        let mut limit = args.limit;
        if limit == 0 || limit > MAX_READ_LINES {
            limit = MAX_READ_LINES;
        }
        let end_line = (start_line + limit - 1).min(total_lines);
        let content = lines[start_line - 1..end_line].join("\n");
        debug!(start_line, end_line, "read line range");
        (content, start_line, end_line)
    } else {
        if total_lines > MAX_READ_LINES {
            return Err(ToolError::FileTooLarge(format!(
                "File too large ({} lines), over the {}-line limit. Use offset and limit \
                 to read a range, e.g. offset: 1, limit: 500 for the first 500 lines.",
                total_lines, MAX_READ_LINES
            )));
        }
        (full_content, 1, total_lines)
    };

    Ok(json!({
        "success": true,
        "type": "read",
        "server_id": args.server_id,
        "file_path": key,
        "content": content,
        "size": content.len(),
        "is_pending": is_pending,
        "total_lines": total_lines,
        "start_line": start_line,
        "end_line": end_line,
    }))
}
