//! Message revocation
//!
//! Revoking the transcript at message index N rolls the engine back to the
//! state before that message was sent: staged turns at or after N's turn
//! are discarded, snapshots at or after it are removed, the transcript is
//! truncated, and every file with a snapshot exactly at the boundary turn
//! is restored from it. Accept-all always snapshots both pre-turn and
//! post-batch, so the boundary snapshot is exactly the required restore
//! point.

use crate::error::{EngineError, EngineResult};
use crate::fsio::write_file_atomic;
use crate::history::SnapshotStore;
use crate::pending::PendingEditLog;
use crate::transcript::{MessageRole, TranscriptStore};
use std::path::Path;
use tracing::{info, warn};

/// Drives transcript revocation with snapshot restore
pub struct RevocationCoordinator<'a> {
    pending: &'a PendingEditLog,
    history: &'a SnapshotStore,
    transcript: &'a TranscriptStore,
}

impl<'a> RevocationCoordinator<'a> {
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

    /// Revoke message `message_index` and everything after it.
    pub fn revoke_from(&self, conversation_id: &str, message_index: usize) -> EngineResult<()> {
        let session = self.transcript.get_session(conversation_id)?;
        if message_index >= session.messages.len() {
            return Err(EngineError::session(format!(
                "message index {} out of range ({} messages)",
                message_index,
                session.messages.len()
            )));
        }

        let turn_index = session.messages[..message_index]
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .count();

        info!(
            conversation = conversation_id,
            message_index, turn_index, "revoking messages"
        );

        self.pending.remove_turns_from(conversation_id, turn_index)?;
        let restored = self
            .history
            .remove_snapshots_from(conversation_id, turn_index)?;
        self.transcript
            .truncate_messages(conversation_id, message_index)?;

        for (file_path, content) in &restored {
            write_file_atomic(Path::new(file_path), content)?;
            info!(file = %file_path, turn = turn_index, bytes = content.len(), "restored file from snapshot");
        }
        if restored.is_empty() {
            warn!(
                conversation = conversation_id,
                turn = turn_index,
                "no snapshot at boundary turn, disk left as-is"
            );
        }

        Ok(())
    }
}
