//! Engine configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the edit engine's durable state.
///
/// All three stores live under `data_root`:
///
/// - `.pending_states/pending_states.json` - staged edits per conversation
/// - `.file_history/history_index.json` - per-turn file snapshots
/// - `sessions/<conversation_id>.json` - chat transcripts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Root directory for all durable engine state
    pub data_root: PathBuf,
}

impl EngineConfig {
    /// Create a configuration rooted at the given directory
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
        }
    }

    /// Directory holding the pending-edit index
    pub fn pending_dir(&self) -> PathBuf {
        self.data_root.join(".pending_states")
    }

    /// Directory holding the snapshot index
    pub fn history_dir(&self) -> PathBuf {
        self.data_root.join(".file_history")
    }

    /// Directory holding chat session files
    pub fn sessions_dir(&self) -> PathBuf {
        self.data_root.join("sessions")
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_root: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

impl AsRef<Path> for EngineConfig {
    fn as_ref(&self) -> &Path {
        &self.data_root
    }
}
