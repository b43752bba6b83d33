//! Filename search

use super::{FileOperationArgs, FileOperationTool, MAX_FIND_RESULTS};
use atelier_core::tools::ToolError;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashSet;
use walkdir::WalkDir;

#[derive(Debug, Serialize)]
struct FoundEntry {
    path: String,
    is_dir: bool,
    size: u64,
}

/// Find files and directories under `file_path` whose name matches the
/// glob pattern, skipping excluded directory names.
pub(crate) fn find_by_name(
    tool: &FileOperationTool,
    args: &FileOperationArgs,
) -> Result<Value, ToolError> {
    let (root, key) = tool.key_path(&args.file_path);

    let pattern = glob::Pattern::new(&args.pattern)
        .map_err(|e| ToolError::InvalidArguments(format!("Invalid pattern '{}': {}", args.pattern, e)))?;
    let excludes: HashSet<&str> = args.excludes.iter().map(String::as_str).collect();

    let mut walker = WalkDir::new(&root);
    if args.max_depth > 0 {
        walker = walker.max_depth(args.max_depth);
    }

    let mut results: Vec<FoundEntry> = Vec::new();
    let mut it = walker.into_iter();
    while let Some(entry) = it.next() {
        let Ok(entry) = entry else {
            continue;
        };

        let name = entry.file_name().to_string_lossy().to_string();
        if excludes.contains(name.as_str()) {
            if entry.file_type().is_dir() {
                it.skip_current_dir();
            }
            continue;
        }

        if pattern.matches(&name) {
            results.push(FoundEntry {
                path: entry.path().display().to_string(),
                is_dir: entry.file_type().is_dir(),
                size: entry.metadata().map(|m| m.len()).unwrap_or(0),
            });
            if results.len() >= MAX_FIND_RESULTS {
                break;
            }
        }
    }

    let truncated = results.len() >= MAX_FIND_RESULTS;

    Ok(json!({
        "success": true,
        "type": "find",
        "server_id": args.server_id,
        "pattern": args.pattern,
        "path": key,
        "count": results.len(),
        "results": results,
        "truncated": truncated,
    }))
}
