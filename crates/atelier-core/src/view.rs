//! Speculative view composition
//!
//! Pure functions that layer a conversation's staged edits over a file's
//! on-disk bytes. No state, no IO: callers read the disk and the pending
//! log themselves and hand both in.

use crate::pending::TurnEdits;

/// Replace the first occurrence of `old` in `content` with `new`.
///
/// Returns the content unchanged when `old` is absent.
pub fn replace_first(content: &str, old: &str, new: &str) -> String {
    content.replacen(old, new, 1)
}

/// Compose the speculative view of `file_path`.
///
/// Folds the turns in `turn_index` order and each turn's edits for this
/// file in insertion order, starting from `disk_content`, applying each as
/// a first-occurrence substring replacement. An edit whose `old_string` is
/// absent at replay time is skipped: it was recorded against a state a
/// later edit has since rewritten, and the staging-time uniqueness check
/// already guards against genuine conflicts.
///
/// Content is treated as UTF-8 text; line endings pass through verbatim.
pub fn compose(disk_content: &str, turns: &[TurnEdits], file_path: &str) -> String {
    let mut content = disk_content.to_string();
    for turn in turns {
        if let Some(edits) = turn.file_edits.get(file_path) {
            for edit in edits {
                content = replace_first(&content, &edit.old_string, &edit.new_string);
            }
        }
    }
    content
}
