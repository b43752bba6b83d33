//! Batch commit and discard
//!
//! Accept-all folds a conversation's staged turns into the real files,
//! capturing a pre-turn snapshot of every touched file before each turn's
//! edits apply and a post-batch baseline after the last. Reject-all throws
//! the staged batch away without touching disk. Both finish by flipping
//! the transcript status of every tool call in the batch.
//!
//! Ordering is load-bearing: snapshot before apply within each turn, one
//! disk write per file after all turns fold, statuses only after disk is
//! durable, log clear last. A mid-flight failure leaves the snapshots
//! already persisted standing as valid restore points; re-running accept
//! reuses them (snapshot insert upserts on equal turn index).

use crate::error::{EngineError, EngineResult};
use crate::fsio::write_file_atomic;
use crate::history::SnapshotStore;
use crate::pending::{PendingEditLog, TurnEdits};
use crate::transcript::{ToolMessageStatus, TranscriptStore};
use crate::view::replace_first;
use std::path::Path;
use tracing::{debug, info, warn};

/// Drives accept-all and reject-all for a conversation's staged batch
pub struct EditBatchCoordinator<'a> {
    pending: &'a PendingEditLog,
    history: &'a SnapshotStore,
    transcript: &'a TranscriptStore,
}

impl<'a> EditBatchCoordinator<'a> {
    pub fn new(
        pending: &'a PendingEditLog,
        history: &'a SnapshotStore,
        transcript: &'a TranscriptStore,
    ) -> Self {
        Self {
            pending,
            history,
            transcript,
        }
    }

    /// Commit every staged edit of the conversation to disk.
    pub fn accept_all(&self, conversation_id: &str) -> EngineResult<()> {
        let turns = self.pending.get_turns(conversation_id);
        let Some(last_turn) = turns.last() else {
            debug!(conversation = conversation_id, "accept-all with no staged edits");
            return Ok(());
        };
        let last_turn_index = last_turn.turn_index;

        let files = self.pending.get_all_pending_files(conversation_id);
        let tool_call_ids = collect_tool_call_ids(&turns);
        info!(
            conversation = conversation_id,
            turns = turns.len(),
            files = files.len(),
            tool_calls = tool_call_ids.len(),
            "accepting staged batch"
        );

        for file_path in &files {
            let final_content = self.accept_file_edits(conversation_id, file_path, &turns)?;
            // post-batch baseline: the restore point for revoking later turns
            self.history.add_snapshot(
                conversation_id,
                file_path,
                last_turn_index + 1,
                &final_content,
            )?;
        }

        for tool_call_id in &tool_call_ids {
            if let Err(e) = self
                .transcript
                .set_tool_status(tool_call_id, ToolMessageStatus::Accepted)
            {
                warn!(tool_call_id = %tool_call_id, error = %e, "failed to mark tool message accepted");
            }
        }

        self.pending.remove_conversation(conversation_id)?;
        Ok(())
    }

    /// Fold one file's staged turns onto its disk bytes, snapshotting the
    /// pre-turn state before each turn applies, then write the result back
    /// with an atomic replace. Returns the final content.
    fn accept_file_edits(
        &self,
        conversation_id: &str,
        file_path: &str,
        turns: &[TurnEdits],
    ) -> EngineResult<String> {
        let mut state = std::fs::read_to_string(file_path)
            .map_err(|e| EngineError::file_read(file_path, e))?;

        for turn in turns {
            let Some(edits) = turn.file_edits.get(file_path) else {
                continue;
            };

            self.history
                .add_snapshot(conversation_id, file_path, turn.turn_index, &state)?;
            for edit in edits {
                state = replace_first(&state, &edit.old_string, &edit.new_string);
            }
            debug!(
                conversation = conversation_id,
                file = file_path,
                turn = turn.turn_index,
                edits = edits.len(),
                bytes = state.len(),
                "folded turn"
            );
        }

        write_file_atomic(Path::new(file_path), &state)?;
        info!(file = file_path, bytes = state.len(), "wrote accepted content");
        Ok(state)
    }

    /// Discard every staged edit of the conversation. Disk is untouched.
    pub fn reject_all(&self, conversation_id: &str) -> EngineResult<()> {
        let turns = self.pending.get_turns(conversation_id);
        let Some(first_turn) = turns.first() else {
            debug!(conversation = conversation_id, "reject-all with no staged edits");
            return Ok(());
        };
        let first_turn_index = first_turn.turn_index;
        let tool_call_ids = collect_tool_call_ids(&turns);

        info!(
            conversation = conversation_id,
            turns = turns.len(),
            tool_calls = tool_call_ids.len(),
            "rejecting staged batch"
        );

        // snapshots only exist for committed batches; wipe any leftover from
        // an accept that failed partway for these turns
        self.history
            .remove_snapshots_after(conversation_id, first_turn_index as i64 - 1)?;

        for tool_call_id in &tool_call_ids {
            if let Err(e) = self
                .transcript
                .set_tool_status(tool_call_id, ToolMessageStatus::Rejected)
            {
                warn!(tool_call_id = %tool_call_id, error = %e, "failed to mark tool message rejected");
            }
        }

        self.pending.remove_conversation(conversation_id)?;
        Ok(())
    }
}

fn collect_tool_call_ids(turns: &[TurnEdits]) -> Vec<String> {
    let mut ids = Vec::new();
    for turn in turns {
        for edits in turn.file_edits.values() {
            ids.extend(edits.iter().map(|e| e.tool_call_id.clone()));
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pending::EditOperation;
    use crate::transcript::ChatMessage;
    use serde_json::json;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        root: std::path::PathBuf,
        pending: PendingEditLog,
        history: SnapshotStore,
        transcript: TranscriptStore,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_path_buf();
        Fixture {
            pending: PendingEditLog::new(root.join(".pending_states")).unwrap(),
            history: SnapshotStore::new(root.join(".file_history")).unwrap(),
            transcript: TranscriptStore::new(root.join("sessions")).unwrap(),
            _dir: dir,
            root,
        }
    }

    fn stage(f: &Fixture, conversation: &str, file: &str, turn: usize, id: &str, old: &str, new: &str) {
        f.pending
            .add_edit(
                conversation,
                file,
                turn,
                EditOperation {
                    tool_call_id: id.to_string(),
                    old_string: old.to_string(),
                    new_string: new.to_string(),
                },
            )
            .unwrap();
    }

    fn tool_message(file: &str, id: &str) -> ChatMessage {
        ChatMessage::tool(
            json!({ "success": true, "status": "pending", "type": "edit", "file_path": file })
                .to_string(),
            id,
        )
    }

    #[test]
    fn accept_folds_turns_and_snapshots() {
        let f = fixture();
        let file = f.root.join("c.txt");
        let file_key = file.to_string_lossy().to_string();
        std::fs::write(&file, "A\nB\nC\n").unwrap();

        let session = f.transcript.create_session("demo").unwrap();
        f.transcript
            .append_message(&session.id, ChatMessage::user("go"))
            .unwrap();
        f.transcript
            .append_message(&session.id, tool_message(&file_key, "t1"))
            .unwrap();
        f.transcript
            .append_message(&session.id, tool_message(&file_key, "t2"))
            .unwrap();

        stage(&f, &session.id, &file_key, 0, "t1", "A", "X");
        stage(&f, &session.id, &file_key, 0, "t2", "B", "Y");

        let coordinator = EditBatchCoordinator::new(&f.pending, &f.history, &f.transcript);
        coordinator.accept_all(&session.id).unwrap();

        assert_eq!(std::fs::read_to_string(&file).unwrap(), "X\nY\nC\n");
        assert_eq!(
            f.history.get_snapshot(&session.id, &file_key, 0).unwrap().content,
            "A\nB\nC\n"
        );
        assert_eq!(
            f.history.get_snapshot(&session.id, &file_key, 1).unwrap().content,
            "X\nY\nC\n"
        );
        assert!(f.pending.get_turns(&session.id).is_empty());

        let session = f.transcript.get_session(&session.id).unwrap();
        for msg in &session.messages[1..] {
            let content: serde_json::Value = serde_json::from_str(&msg.content).unwrap();
            assert_eq!(content["status"], "accepted");
        }
    }

    #[test]
    fn accept_with_empty_log_is_noop() {
        let f = fixture();
        let coordinator = EditBatchCoordinator::new(&f.pending, &f.history, &f.transcript);
        coordinator.accept_all("conv").unwrap();
    }

    #[test]
    fn reject_leaves_disk_untouched() {
        let f = fixture();
        let file = f.root.join("a.txt");
        let file_key = file.to_string_lossy().to_string();
        std::fs::write(&file, "hello world\n").unwrap();

        let session = f.transcript.create_session("demo").unwrap();
        f.transcript
            .append_message(&session.id, ChatMessage::user("go"))
            .unwrap();
        f.transcript
            .append_message(&session.id, tool_message(&file_key, "t1"))
            .unwrap();

        stage(&f, &session.id, &file_key, 0, "t1", "world", "rust");

        let coordinator = EditBatchCoordinator::new(&f.pending, &f.history, &f.transcript);
        coordinator.reject_all(&session.id).unwrap();

        assert_eq!(std::fs::read_to_string(&file).unwrap(), "hello world\n");
        assert!(f.pending.get_turns(&session.id).is_empty());
        assert!(f.history.get_snapshot(&session.id, &file_key, 0).is_none());

        let session = f.transcript.get_session(&session.id).unwrap();
        let content: serde_json::Value =
            serde_json::from_str(&session.messages[1].content).unwrap();
        assert_eq!(content["status"], "rejected");
    }

    #[test]
    fn accept_spanning_multiple_turns() {
        let f = fixture();
        let file = f.root.join("d.txt");
        let file_key = file.to_string_lossy().to_string();
        std::fs::write(&file, "v0").unwrap();

        let session = f.transcript.create_session("demo").unwrap();
        stage(&f, &session.id, &file_key, 0, "t1", "v0", "v1");
        stage(&f, &session.id, &file_key, 1, "t2", "v1", "v2");

        let coordinator = EditBatchCoordinator::new(&f.pending, &f.history, &f.transcript);
        coordinator.accept_all(&session.id).unwrap();

        assert_eq!(std::fs::read_to_string(&file).unwrap(), "v2");
        assert_eq!(
            f.history.get_snapshot(&session.id, &file_key, 0).unwrap().content,
            "v0"
        );
        assert_eq!(
            f.history.get_snapshot(&session.id, &file_key, 1).unwrap().content,
            "v1"
        );
        assert_eq!(
            f.history.get_snapshot(&session.id, &file_key, 2).unwrap().content,
            "v2"
        );
    }

    #[test]
    fn accept_fails_cleanly_on_missing_file() {
        let f = fixture();
        let missing = f.root.join("gone.txt").to_string_lossy().to_string();

        let session = f.transcript.create_session("demo").unwrap();
        stage(&f, &session.id, &missing, 0, "t1", "a", "b");

        let coordinator = EditBatchCoordinator::new(&f.pending, &f.history, &f.transcript);
        assert!(coordinator.accept_all(&session.id).is_err());
        // the staged batch survives for a retry
        assert_eq!(f.pending.get_turns(&session.id).len(), 1);
    }
}
