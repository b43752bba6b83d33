//! Write preview
//!
//! The write operation is advisory only: it reports what would be written
//! and waits for user confirmation in the client. Nothing is staged and
//! nothing reaches disk through this path.

use super::{FileOperationArgs, FileOperationTool};
use atelier_core::tools::ToolError;
use serde_json::{json, Value};
use tokio::fs;

pub(crate) async fn preview_write(
    tool: &FileOperationTool,
    args: &FileOperationArgs,
) -> Result<Value, ToolError> {
    let (path, key) = tool.key_path(&args.file_path);
    let file_exists = fs::try_exists(&path).await.unwrap_or(false);
    let total_lines = args.content.split('\n').count();

    Ok(json!({
        "success": true,
        "status": "pending",
        "type": "write",
        "server_id": args.server_id,
        "file_path": key,
        "file_exists": file_exists,
        "total_lines": total_lines,
        "message": format!("Awaiting confirmation: {} ({} lines)", key, total_lines),
    }))
}
