//! File snapshot store
//!
//! Full-text snapshots of files at turn boundaries, keyed per conversation,
//! per file and per turn. A snapshot at turn `k` holds the file's content
//! immediately before turn `k`'s edits were applied, which makes it exactly
//! the restore point for revoking the user message that opened turn `k`.
//!
//! Snapshots are only written when a batch is accepted (plus the post-batch
//! baseline at `last_turn + 1`), so a rejected batch leaves no trace here.
//! Same singleton/locking/persistence discipline as the pending log.

use crate::error::{EngineError, EngineResult};
use crate::fsio::write_file_atomic;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, warn};

const INDEX_FILE: &str = "history_index.json";

/// Full file content at one turn boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub turn_index: usize,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Snapshot list for one file, strictly increasing by `turn_index`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileSnapshots {
    pub snapshots: Vec<Snapshot>,
}

/// All snapshotted files of one conversation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationHistory {
    pub files: BTreeMap<String, FileSnapshots>,
}

type HistoryMap = BTreeMap<String, ConversationHistory>;

/// Durable store of per-turn file snapshots, keyed by conversation
pub struct SnapshotStore {
    histories: RwLock<HistoryMap>,
    data_dir: PathBuf,
}

impl SnapshotStore {
    /// Open (or create) the store rooted at `data_dir`
    pub fn new(data_dir: impl Into<PathBuf>) -> EngineResult<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;

        let index_path = data_dir.join(INDEX_FILE);
        let histories = match std::fs::read_to_string(&index_path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                EngineError::persistence(format!("corrupt history index {}: {}", index_path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HistoryMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            histories: RwLock::new(histories),
            data_dir,
        })
    }

    /// Insert a snapshot, keeping the file's list strictly increasing by
    /// `turn_index`. An existing snapshot at the same turn is replaced, so
    /// re-running an accept over overlapping turns is idempotent.
    pub fn add_snapshot(
        &self,
        conversation_id: &str,
        file_path: &str,
        turn_index: usize,
        content: &str,
    ) -> EngineResult<()> {
        self.mutate(|histories| {
            let file = histories
                .entry(conversation_id.to_string())
                .or_default()
                .files
                .entry(file_path.to_string())
                .or_default();

            let snapshot = Snapshot {
                turn_index,
                content: content.to_string(),
                timestamp: Utc::now(),
            };

            match file
                .snapshots
                .binary_search_by_key(&turn_index, |s| s.turn_index)
            {
                Ok(pos) => file.snapshots[pos] = snapshot,
                Err(pos) => file.snapshots.insert(pos, snapshot),
            }
            debug!(
                conversation = conversation_id,
                file = file_path,
                turn = turn_index,
                bytes = content.len(),
                "stored snapshot"
            );
        })
    }

    /// Fetch the snapshot of a file at exactly `turn_index`, if stored
    pub fn get_snapshot(
        &self,
        conversation_id: &str,
        file_path: &str,
        turn_index: usize,
    ) -> Option<Snapshot> {
        self.histories
            .read()
            .get(conversation_id)?
            .files
            .get(file_path)?
            .snapshots
            .iter()
            .find(|s| s.turn_index == turn_index)
            .cloned()
    }

    /// Remove every snapshot with `turn_index >= from_turn_index`.
    ///
    /// For each affected file that has a snapshot at exactly
    /// `from_turn_index`, the returned map carries that content - the
    /// restore-to point for a revocation. Files with no snapshot at the
    /// boundary are dropped silently (nothing to restore).
    pub fn remove_snapshots_from(
        &self,
        conversation_id: &str,
        from_turn_index: usize,
    ) -> EngineResult<BTreeMap<String, String>> {
        let mut restored = BTreeMap::new();
        {
            let guard = self.histories.read();
            if let Some(conv) = guard.get(conversation_id) {
                for (path, file) in &conv.files {
                    if let Some(s) = file
                        .snapshots
                        .iter()
                        .find(|s| s.turn_index == from_turn_index)
                    {
                        restored.insert(path.clone(), s.content.clone());
                    }
                }
            } else {
                return Ok(restored);
            }
        }

        self.mutate(|histories| {
            if let Some(conv) = histories.get_mut(conversation_id) {
                for file in conv.files.values_mut() {
                    file.snapshots.retain(|s| s.turn_index < from_turn_index);
                }
                conv.files.retain(|_, f| !f.snapshots.is_empty());
                if conv.files.is_empty() {
                    histories.remove(conversation_id);
                }
            }
            debug!(
                conversation = conversation_id,
                from = from_turn_index,
                restorable = restored.len(),
                "truncated snapshots"
            );
        })?;

        Ok(restored)
    }

    /// Keep snapshots with `turn_index <= initial_turn_index`, drop the
    /// rest. `initial_turn_index` may be negative to drop every snapshot
    /// of the conversation.
    pub fn remove_snapshots_after(
        &self,
        conversation_id: &str,
        initial_turn_index: i64,
    ) -> EngineResult<()> {
        if !self.histories.read().contains_key(conversation_id) {
            return Ok(());
        }
        self.mutate(|histories| {
            if let Some(conv) = histories.get_mut(conversation_id) {
                for file in conv.files.values_mut() {
                    file.snapshots
                        .retain(|s| (s.turn_index as i64) <= initial_turn_index);
                }
                conv.files.retain(|_, f| !f.snapshots.is_empty());
                if conv.files.is_empty() {
                    histories.remove(conversation_id);
                }
            }
        })
    }

    /// Drop every snapshot of the conversation. Idempotent.
    pub fn remove_conversation(&self, conversation_id: &str) -> EngineResult<()> {
        if !self.histories.read().contains_key(conversation_id) {
            return Ok(());
        }
        self.mutate(|histories| {
            histories.remove(conversation_id);
            debug!(conversation = conversation_id, "cleared snapshot history");
        })
    }

    fn mutate<F>(&self, f: F) -> EngineResult<()>
    where
        F: FnOnce(&mut HistoryMap),
    {
        let mut guard = self.histories.write();
        let mut next = guard.clone();
        f(&mut next);
        self.persist(&next)?;
        *guard = next;
        Ok(())
    }

    fn persist(&self, histories: &HistoryMap) -> EngineResult<()> {
        let json = serde_json::to_string_pretty(histories)
            .map_err(|e| EngineError::persistence(format!("serialize history index: {}", e)))?;
        write_file_atomic(&self.data_dir.join(INDEX_FILE), &json).map_err(|e| {
            warn!(error = %e, "history index write failed, keeping previous state");
            EngineError::persistence(format!("write history index: {}", e))
        })
    }
}
