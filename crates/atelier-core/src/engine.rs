//! Engine root handle
//!
//! The application root constructs one [`EditEngine`] and passes it (via
//! `Arc`) into whatever hosts the LLM stream: it owns the three durable
//! stores and fronts the batch and revocation coordinators. No global
//! state; handlers get the handle through dependency injection.

use crate::batch::EditBatchCoordinator;
use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::history::SnapshotStore;
use crate::pending::PendingEditLog;
use crate::revoke::RevocationCoordinator;
use crate::transcript::TranscriptStore;
use std::sync::Arc;

/// Owns the speculative-edit engine's durable state
pub struct EditEngine {
    config: EngineConfig,
    pending: Arc<PendingEditLog>,
    history: Arc<SnapshotStore>,
    transcript: Arc<TranscriptStore>,
}

impl EditEngine {
    /// Open (or create) the engine's stores under the configured data root
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        let pending = Arc::new(PendingEditLog::new(config.pending_dir())?);
        let history = Arc::new(SnapshotStore::new(config.history_dir())?);
        let transcript = Arc::new(TranscriptStore::new(config.sessions_dir())?);
        Ok(Self {
            config,
            pending,
            history,
            transcript,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn pending(&self) -> &Arc<PendingEditLog> {
        &self.pending
    }

    pub fn history(&self) -> &Arc<SnapshotStore> {
        &self.history
    }

    pub fn transcript(&self) -> &Arc<TranscriptStore> {
        &self.transcript
    }

    /// Commit the conversation's staged batch to disk
    pub fn accept_all(&self, conversation_id: &str) -> EngineResult<()> {
        EditBatchCoordinator::new(&self.pending, &self.history, &self.transcript)
            .accept_all(conversation_id)
    }

    /// Discard the conversation's staged batch; disk untouched
    pub fn reject_all(&self, conversation_id: &str) -> EngineResult<()> {
        EditBatchCoordinator::new(&self.pending, &self.history, &self.transcript)
            .reject_all(conversation_id)
    }

    /// Revoke transcript messages from `message_index` on, restoring files
    /// from the boundary snapshots
    pub fn revoke_from(&self, conversation_id: &str, message_index: usize) -> EngineResult<()> {
        RevocationCoordinator::new(&self.pending, &self.history, &self.transcript)
            .revoke_from(conversation_id, message_index)
    }

    /// Delete a conversation and every trace of it in the engine
    pub fn delete_conversation(&self, conversation_id: &str) -> EngineResult<()> {
        self.transcript.delete_session(conversation_id)?;
        self.pending.remove_conversation(conversation_id)?;
        self.history.remove_conversation(conversation_id)
    }

    /// Clear a conversation's messages along with its staged edits and
    /// snapshots, keeping the session itself
    pub fn clear_conversation(&self, conversation_id: &str) -> EngineResult<()> {
        self.transcript.clear_messages(conversation_id)?;
        self.pending.remove_conversation(conversation_id)?;
        self.history.remove_conversation(conversation_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pending::EditOperation;
    use tempfile::TempDir;

    #[test]
    fn delete_purges_all_stores() {
        let dir = TempDir::new().unwrap();
        let engine = EditEngine::new(EngineConfig::new(dir.path())).unwrap();

        let session = engine.transcript().create_session("demo").unwrap();
        engine
            .pending()
            .add_edit(
                &session.id,
                "/tmp/a.txt",
                0,
                EditOperation {
                    tool_call_id: "t1".to_string(),
                    old_string: "a".to_string(),
                    new_string: "b".to_string(),
                },
            )
            .unwrap();
        engine
            .history()
            .add_snapshot(&session.id, "/tmp/a.txt", 0, "a")
            .unwrap();

        engine.delete_conversation(&session.id).unwrap();

        assert!(engine.transcript().get_session(&session.id).is_err());
        assert!(engine.pending().get_turns(&session.id).is_empty());
        assert!(engine
            .history()
            .get_snapshot(&session.id, "/tmp/a.txt", 0)
            .is_none());
    }
}
