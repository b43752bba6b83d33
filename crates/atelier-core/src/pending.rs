//! Pending edit log
//!
//! Staged string-replacement edits, grouped per conversation, per turn and
//! per file. Nothing here ever touches the target files: an edit lives in
//! this log from the moment the `edit` tool call succeeds until the batch
//! is accepted (folded into disk) or rejected (discarded).
//!
//! The log is a process-wide singleton constructed once at the application
//! root and shared via `Arc`. Every mutation clones the in-memory map,
//! applies the change, persists the whole JSON index atomically and only
//! then swaps the new map in, so a failed persist leaves memory consistent
//! with the previous durable state.

use crate::error::{EngineError, EngineResult};
use crate::fsio::write_file_atomic;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use tracing::{debug, warn};

const INDEX_FILE: &str = "pending_states.json";

/// A single staged string-replacement edit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditOperation {
    /// LLM-issued id uniquely naming this operation
    pub tool_call_id: String,
    /// Exact text to replace (first occurrence)
    pub old_string: String,
    /// Replacement text
    pub new_string: String,
}

/// All edits staged during one conversation turn
///
/// Insertion order within a file's edit list is semantic: edits replay
/// sequentially when the view is composed and when the batch is applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnEdits {
    /// 0-based count of user messages preceding this assistant turn
    pub turn_index: usize,
    pub timestamp: DateTime<Utc>,
    /// File path -> ordered edits against that file
    pub file_edits: BTreeMap<String, Vec<EditOperation>>,
}

/// The staged batch for one conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationPending {
    pub conversation_id: String,
    /// Turns, strictly increasing by `turn_index`
    pub turns: Vec<TurnEdits>,
    pub updated_at: DateTime<Utc>,
}

type StateMap = BTreeMap<String, ConversationPending>;

/// Durable log of staged edits, keyed by conversation
pub struct PendingEditLog {
    states: RwLock<StateMap>,
    data_dir: PathBuf,
}

impl PendingEditLog {
    /// Open (or create) the log rooted at `data_dir`.
    ///
    /// A missing index file is treated as an empty log; a corrupt one is
    /// surfaced as a persistence error.
    pub fn new(data_dir: impl Into<PathBuf>) -> EngineResult<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;

        let index_path = data_dir.join(INDEX_FILE);
        let states = match std::fs::read_to_string(&index_path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                EngineError::persistence(format!("corrupt pending index {}: {}", index_path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StateMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            states: RwLock::new(states),
            data_dir,
        })
    }

    /// Append an edit to the turn with the given index, creating the turn
    /// record if absent. Turns stay strictly increasing by `turn_index`.
    pub fn add_edit(
        &self,
        conversation_id: &str,
        file_path: &str,
        turn_index: usize,
        edit: EditOperation,
    ) -> EngineResult<()> {
        self.mutate(|states| {
            let conv = states
                .entry(conversation_id.to_string())
                .or_insert_with(|| ConversationPending {
                    conversation_id: conversation_id.to_string(),
                    turns: Vec::new(),
                    updated_at: Utc::now(),
                });

            if conv.turns.iter().all(|t| t.turn_index != turn_index) {
                let pos = conv
                    .turns
                    .iter()
                    .position(|t| t.turn_index > turn_index)
                    .unwrap_or(conv.turns.len());
                conv.turns.insert(
                    pos,
                    TurnEdits {
                        turn_index,
                        timestamp: Utc::now(),
                        file_edits: BTreeMap::new(),
                    },
                );
            }

            if let Some(turn) = conv.turns.iter_mut().find(|t| t.turn_index == turn_index) {
                turn.file_edits
                    .entry(file_path.to_string())
                    .or_default()
                    .push(edit);
                debug!(
                    conversation = conversation_id,
                    turn = turn_index,
                    file = file_path,
                    edits = turn.file_edits[file_path].len(),
                    "staged edit"
                );
            }
            conv.updated_at = Utc::now();
        })
    }

    /// Stable read snapshot of a conversation's turns
    pub fn get_turns(&self, conversation_id: &str) -> Vec<TurnEdits> {
        self.states
            .read()
            .get(conversation_id)
            .map(|c| c.turns.clone())
            .unwrap_or_default()
    }

    /// Every file touched by any staged turn of the conversation
    pub fn get_all_pending_files(&self, conversation_id: &str) -> BTreeSet<String> {
        let guard = self.states.read();
        let mut files = BTreeSet::new();
        if let Some(conv) = guard.get(conversation_id) {
            for turn in &conv.turns {
                files.extend(turn.file_edits.keys().cloned());
            }
        }
        files
    }

    /// Locate a staged edit by its tool-call id, returning the turn it
    /// belongs to. Pending state is canonically keyed by
    /// `(turn_index, tool_call_id)`.
    pub fn find_by_tool_call_id(
        &self,
        conversation_id: &str,
        tool_call_id: &str,
    ) -> Option<(usize, EditOperation)> {
        let guard = self.states.read();
        let conv = guard.get(conversation_id)?;
        for turn in &conv.turns {
            for edits in turn.file_edits.values() {
                if let Some(edit) = edits.iter().find(|e| e.tool_call_id == tool_call_id) {
                    return Some((turn.turn_index, edit.clone()));
                }
            }
        }
        None
    }

    /// Drop every turn with `turn_index >= from_turn_index`. Idempotent;
    /// a missing conversation is a no-op.
    pub fn remove_turns_from(
        &self,
        conversation_id: &str,
        from_turn_index: usize,
    ) -> EngineResult<()> {
        if !self.states.read().contains_key(conversation_id) {
            return Ok(());
        }
        self.mutate(|states| {
            if let Some(conv) = states.get_mut(conversation_id) {
                let before = conv.turns.len();
                conv.turns.retain(|t| t.turn_index < from_turn_index);
                conv.updated_at = Utc::now();
                debug!(
                    conversation = conversation_id,
                    from = from_turn_index,
                    removed = before - conv.turns.len(),
                    remaining = conv.turns.len(),
                    "truncated staged turns"
                );
            }
        })
    }

    /// Drop the conversation's entire staged batch. Idempotent.
    pub fn remove_conversation(&self, conversation_id: &str) -> EngineResult<()> {
        if !self.states.read().contains_key(conversation_id) {
            return Ok(());
        }
        self.mutate(|states| {
            states.remove(conversation_id);
            debug!(conversation = conversation_id, "cleared staged batch");
        })
    }

    fn mutate<F>(&self, f: F) -> EngineResult<()>
    where
        F: FnOnce(&mut StateMap),
    {
        let mut guard = self.states.write();
        let mut next = guard.clone();
        f(&mut next);
        self.persist(&next)?;
        *guard = next;
        Ok(())
    }

    fn persist(&self, states: &StateMap) -> EngineResult<()> {
        let json = serde_json::to_string_pretty(states)
            .map_err(|e| EngineError::persistence(format!("serialize pending index: {}", e)))?;
        write_file_atomic(&self.data_dir.join(INDEX_FILE), &json).map_err(|e| {
            warn!(error = %e, "pending index write failed, keeping previous state");
            EngineError::persistence(format!("write pending index: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn edit(id: &str) -> EditOperation {
        EditOperation {
            tool_call_id: id.to_string(),
            old_string: "old".to_string(),
            new_string: "new".to_string(),
        }
    }

    #[test]
    fn add_and_get_turns() {
        let dir = TempDir::new().unwrap();
        let log = PendingEditLog::new(dir.path()).unwrap();

        log.add_edit("conv", "/tmp/a.txt", 0, edit("t1")).unwrap();
        log.add_edit("conv", "/tmp/a.txt", 0, edit("t2")).unwrap();

        let turns = log.get_turns("conv");
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].turn_index, 0);
        assert_eq!(turns[0].file_edits["/tmp/a.txt"].len(), 2);
        assert_eq!(turns[0].file_edits["/tmp/a.txt"][0].tool_call_id, "t1");
    }

    #[test]
    fn turns_stay_strictly_increasing() {
        let dir = TempDir::new().unwrap();
        let log = PendingEditLog::new(dir.path()).unwrap();

        log.add_edit("conv", "/tmp/a.txt", 2, edit("t3")).unwrap();
        log.add_edit("conv", "/tmp/a.txt", 0, edit("t1")).unwrap();
        log.add_edit("conv", "/tmp/a.txt", 1, edit("t2")).unwrap();

        let indices: Vec<usize> = log.get_turns("conv").iter().map(|t| t.turn_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn pending_files_union_across_turns() {
        let dir = TempDir::new().unwrap();
        let log = PendingEditLog::new(dir.path()).unwrap();

        log.add_edit("conv", "/tmp/a.txt", 0, edit("t1")).unwrap();
        log.add_edit("conv", "/tmp/b.txt", 1, edit("t2")).unwrap();
        log.add_edit("conv", "/tmp/a.txt", 1, edit("t3")).unwrap();

        let files = log.get_all_pending_files("conv");
        assert_eq!(files.len(), 2);
        assert!(files.contains("/tmp/a.txt"));
        assert!(files.contains("/tmp/b.txt"));
    }

    #[test]
    fn remove_turns_from_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let log = PendingEditLog::new(dir.path()).unwrap();

        log.add_edit("conv", "/tmp/a.txt", 0, edit("t1")).unwrap();
        log.add_edit("conv", "/tmp/a.txt", 1, edit("t2")).unwrap();
        log.add_edit("conv", "/tmp/a.txt", 2, edit("t3")).unwrap();

        log.remove_turns_from("conv", 1).unwrap();
        let turns = log.get_turns("conv");
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].turn_index, 0);

        log.remove_turns_from("conv", 1).unwrap();
        assert_eq!(log.get_turns("conv").len(), 1);
        log.remove_turns_from("missing", 0).unwrap();
    }

    #[test]
    fn remove_conversation_drops_everything() {
        let dir = TempDir::new().unwrap();
        let log = PendingEditLog::new(dir.path()).unwrap();

        log.add_edit("conv", "/tmp/a.txt", 0, edit("t1")).unwrap();
        log.remove_conversation("conv").unwrap();

        assert!(log.get_turns("conv").is_empty());
        assert!(log.get_all_pending_files("conv").is_empty());
        log.remove_conversation("conv").unwrap();
    }

    #[test]
    fn find_by_tool_call_id_returns_turn() {
        let dir = TempDir::new().unwrap();
        let log = PendingEditLog::new(dir.path()).unwrap();

        log.add_edit("conv", "/tmp/a.txt", 0, edit("t1")).unwrap();
        log.add_edit("conv", "/tmp/b.txt", 3, edit("t2")).unwrap();

        let (turn, op) = log.find_by_tool_call_id("conv", "t2").unwrap();
        assert_eq!(turn, 3);
        assert_eq!(op.tool_call_id, "t2");
        assert!(log.find_by_tool_call_id("conv", "t9").is_none());
    }

    #[test]
    fn survives_reload() {
        let dir = TempDir::new().unwrap();
        {
            let log = PendingEditLog::new(dir.path()).unwrap();
            log.add_edit("conv", "/tmp/a.txt", 0, edit("t1")).unwrap();
        }

        let reloaded = PendingEditLog::new(dir.path()).unwrap();
        let turns = reloaded.get_turns("conv");
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].file_edits["/tmp/a.txt"][0].tool_call_id, "t1");
    }
}
