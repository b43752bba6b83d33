//! Staged string-replacement edit

use super::diff::{change_set, line_change_counts};
use super::{FileOperationArgs, FileOperationTool};
use atelier_core::pending::EditOperation;
use atelier_core::tools::ToolError;
use atelier_core::view::{compose, replace_first};
use serde_json::{json, Value};
use tokio::fs;
use tracing::{debug, warn};

/// Validate an edit against the conversation's speculative view and stage
/// it in the pending log. Disk is never touched here.
pub(crate) async fn stage_edit(
    tool: &FileOperationTool,
    args: &FileOperationArgs,
    conversation_id: &str,
    tool_call_id: &str,
) -> Result<Value, ToolError> {
    if args.old_string.is_empty() {
        return Err(ToolError::InvalidArguments(
            "old_string cannot be empty".to_string(),
        ));
    }
    if args.old_string == args.new_string {
        return Err(ToolError::InvalidArguments(
            "No changes to make: old_string and new_string are exactly the same".to_string(),
        ));
    }

    // edits recorded mid-stream attach to the turn the latest user message
    // opened; a conversation with no transcript yet lands on turn 0
    let turn_index = match tool.engine().transcript().user_message_count(conversation_id) {
        Ok(count) => count.saturating_sub(1),
        Err(e) => {
            warn!(conversation = conversation_id, error = %e, "session lookup failed, using turn 0");
            0
        }
    };

    let (path, key) = tool.key_path(&args.file_path);
    let disk_content = fs::read_to_string(&path).await.map_err(|e| {
        ToolError::FileUnreadable(format!("Failed to read file '{}': {}", args.file_path, e))
    })?;

    let turns = tool.engine().pending().get_turns(conversation_id);
    let base_content = compose(&disk_content, &turns, &key);

    if !base_content.contains(&args.old_string) {
        return Err(ToolError::NoMatch(
            "The string to replace was not found in the file. Make sure old_string \
             matches exactly, including whitespace, indentation and line breaks; \
             read the file first and copy the exact content."
                .to_string(),
        ));
    }

    let occurrences = base_content.matches(&args.old_string).count();
    if occurrences > 1 {
        return Err(ToolError::AmbiguousMatch(format!(
            "Found {} occurrences of old_string; provide a longer old_string with \
             more surrounding context to make the match unique.",
            occurrences
        )));
    }

    let new_content = replace_first(&base_content, &args.old_string, &args.new_string);
    let (lines_deleted, lines_added) = line_change_counts(&base_content, &new_content);

    tool.engine().pending().add_edit(
        conversation_id,
        &key,
        turn_index,
        EditOperation {
            tool_call_id: tool_call_id.to_string(),
            old_string: args.old_string.clone(),
            new_string: args.new_string.clone(),
        },
    )?;

    // cumulative per-line change set from disk to the staged result, for
    // the confirmation UI
    let operations = change_set(&disk_content, &new_content);

    debug!(
        conversation = conversation_id,
        turn = turn_index,
        file = %key,
        lines_deleted,
        lines_added,
        "staged edit"
    );

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| key.clone());

    // the staged content is not echoed back: the next read surfaces it
    // through the composed view, keeping the message history small
    Ok(json!({
        "success": true,
        "status": "pending",
        "type": "edit",
        "server_id": args.server_id,
        "file_path": key,
        "operations": operations,
        "tool_call_id": tool_call_id,
        "lines_deleted": lines_deleted,
        "lines_added": lines_added,
        "summary": format!(
            "Awaiting confirmation: {} (-{} lines, +{} lines)",
            file_name, lines_deleted, lines_added
        ),
    }))
}
