//! Content search

use super::{FileOperationArgs, FileOperationTool, MAX_GREP_MATCHES};
use atelier_core::tools::ToolError;
use regex::Regex;
use serde::Serialize;
use serde_json::{json, Value};
use walkdir::WalkDir;

#[derive(Debug, Serialize)]
struct GrepMatch {
    file_path: String,
    /// 1-based line number
    line: usize,
    content: String,
}

/// Search file contents under `file_path` for a substring or regex,
/// optionally restricted to filenames matching the include globs.
pub(crate) fn search_content(
    tool: &FileOperationTool,
    args: &FileOperationArgs,
) -> Result<Value, ToolError> {
    let (root, key) = tool.key_path(&args.file_path);

    let regex = if args.is_regex {
        Some(
            Regex::new(&args.query)
                .map_err(|e| ToolError::InvalidArguments(format!("Invalid regex: {}", e)))?,
        )
    } else {
        None
    };

    let include_patterns: Vec<glob::Pattern> = args
        .includes
        .iter()
        .filter_map(|p| glob::Pattern::new(p).ok())
        .collect();

    let mut matches: Vec<GrepMatch> = Vec::new();
    let mut file_count = 0usize;

    'walk: for entry in WalkDir::new(&root).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();

        if !include_patterns.is_empty() {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if !include_patterns.iter().any(|p| p.matches(name)) {
                continue;
            }
        }

        // unreadable and binary files are silently skipped
        let Ok(content) = std::fs::read_to_string(path) else {
            continue;
        };

        let mut has_match = false;
        for (idx, line) in content.lines().enumerate() {
            let hit = match &regex {
                Some(re) => re.is_match(line),
                None => line.contains(&args.query),
            };
            if hit {
                matches.push(GrepMatch {
                    file_path: path.display().to_string(),
                    line: idx + 1,
                    content: line.trim().to_string(),
                });
                has_match = true;
                if matches.len() >= MAX_GREP_MATCHES {
                    file_count += 1;
                    break 'walk;
                }
            }
        }
        if has_match {
            file_count += 1;
        }
    }

    let truncated = matches.len() >= MAX_GREP_MATCHES;

    Ok(json!({
        "success": true,
        "type": "grep",
        "server_id": args.server_id,
        "query": args.query,
        "path": key,
        "is_regex": args.is_regex,
        "file_count": file_count,
        "match_count": matches.len(),
        "matches": matches,
        "truncated": truncated,
    }))
}
