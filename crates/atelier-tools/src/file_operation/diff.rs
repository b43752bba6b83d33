//! Line-level change computation
//!
//! Deliberately not a real diff: the per-edit counts trim the matching
//! line prefix and suffix, and the change set walks both sides collecting
//! contiguous blocks of differing lines. Good enough for the confirmation
//! UI; no invariant depends on it.

use serde::Serialize;

/// One contiguous block of changed lines
#[derive(Debug, Clone, Serialize)]
pub struct ChangeOp {
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// 1-based first changed line
    pub start_line: usize,
    pub end_line: usize,
    pub old_text: String,
    pub new_text: String,
}

/// Lines deleted and added by one edit, computed by trimming the common
/// line prefix and suffix between the old and new content.
pub fn line_change_counts(old_content: &str, new_content: &str) -> (usize, usize) {
    let old_lines: Vec<&str> = old_content.split('\n').collect();
    let new_lines: Vec<&str> = new_content.split('\n').collect();

    let mut first_diff = 0;
    while first_diff < old_lines.len()
        && first_diff < new_lines.len()
        && old_lines[first_diff] == new_lines[first_diff]
    {
        first_diff += 1;
    }

    let mut last_old = old_lines.len() as i64 - 1;
    let mut last_new = new_lines.len() as i64 - 1;
    while last_old >= first_diff as i64
        && last_new >= first_diff as i64
        && old_lines[last_old as usize] == new_lines[last_new as usize]
    {
        last_old -= 1;
        last_new -= 1;
    }

    let deleted = (last_old - first_diff as i64 + 1).max(0) as usize;
    let added = (last_new - first_diff as i64 + 1).max(0) as usize;
    (deleted, added)
}

/// Contiguous blocks of differing lines between two versions of a file,
/// for the client to render as a replace preview.
pub fn change_set(old_content: &str, new_content: &str) -> Vec<ChangeOp> {
    let old_lines: Vec<&str> = old_content.split('\n').collect();
    let new_lines: Vec<&str> = new_content.split('\n').collect();
    let max_lines = old_lines.len().max(new_lines.len());

    let mut operations = Vec::new();
    let mut i = 0;

    while i < max_lines {
        while i < old_lines.len() && i < new_lines.len() && old_lines[i] == new_lines[i] {
            i += 1;
        }
        if i >= max_lines {
            break;
        }

        let start_line = i + 1;
        let mut old_block: Vec<&str> = Vec::new();
        let mut new_block: Vec<&str> = Vec::new();

        while i < old_lines.len() && i < new_lines.len() && old_lines[i] != new_lines[i] {
            old_block.push(old_lines[i]);
            new_block.push(new_lines[i]);
            i += 1;
        }

        // a pure insertion or deletion only shows up at the tail, where
        // one side has run out of lines
        if i >= old_lines.len() || i >= new_lines.len() {
            while i < old_lines.len() {
                old_block.push(old_lines[i]);
                i += 1;
            }
            while i < new_lines.len() {
                new_block.push(new_lines[i]);
                i += 1;
            }
        }

        if !old_block.is_empty() || !new_block.is_empty() {
            operations.push(ChangeOp {
                kind: "replace",
                start_line,
                end_line: (start_line + old_block.len()).saturating_sub(1),
                old_text: old_block.join("\n"),
                new_text: new_block.join("\n"),
            });
        }
    }

    operations
}
