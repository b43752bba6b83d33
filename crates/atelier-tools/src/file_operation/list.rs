//! Directory listing

use super::{FileOperationArgs, FileOperationTool, MAX_LIST_ENTRIES};
use atelier_core::tools::ToolError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::fs;

#[derive(Debug, Serialize)]
struct ListEntry {
    name: String,
    is_dir: bool,
    size: u64,
    mtime: String,
}

pub(crate) async fn list_dir(
    tool: &FileOperationTool,
    args: &FileOperationArgs,
) -> Result<Value, ToolError> {
    let (path, key) = tool.key_path(&args.file_path);

    let mut entries = fs::read_dir(&path).await.map_err(|e| {
        ToolError::FileUnreadable(format!("Failed to read directory '{}': {}", args.file_path, e))
    })?;

    let mut files: Vec<ListEntry> = Vec::new();
    let mut total = 0usize;

    while let Some(entry) = entries.next_entry().await.map_err(ToolError::Io)? {
        total += 1;
        if files.len() >= MAX_LIST_ENTRIES {
            continue;
        }

        let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
        let (size, mtime) = match entry.metadata().await {
            Ok(meta) => {
                let mtime = meta
                    .modified()
                    .ok()
                    .map(|t| DateTime::<Utc>::from(t).format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_default();
                (meta.len(), mtime)
            }
            Err(_) => (0, String::new()),
        };

        files.push(ListEntry {
            name: entry.file_name().to_string_lossy().to_string(),
            is_dir,
            size,
            mtime,
        });
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));
    let truncated = total > MAX_LIST_ENTRIES;

    Ok(json!({
        "success": true,
        "type": "list",
        "server_id": args.server_id,
        "path": key,
        "count": files.len(),
        "total": total,
        "files": files,
        "truncated": truncated,
    }))
}
