//! Chat transcript storage
//!
//! One JSON file per conversation under `sessions/`, with an in-memory
//! cache in front. The engine itself needs three things from here: the
//! user-message count (to compute turn indices), message truncation (for
//! revocation) and the `set_tool_status` hook the batch coordinator drives
//! when a staged batch is accepted or rejected.
//!
//! A per-conversation write lock serialises append, status update, clear,
//! truncate and delete for the same conversation; different conversations
//! proceed independently.

use crate::error::{EngineError, EngineResult};
use crate::fsio::write_file_atomic;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Message author role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

/// Status of a tool message carrying a staged edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolMessageStatus {
    Pending,
    Accepted,
    Rejected,
}

impl fmt::Display for ToolMessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolMessageStatus::Pending => write!(f, "pending"),
            ToolMessageStatus::Accepted => write!(f, "accepted"),
            ToolMessageStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// A single transcript message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    /// Tool calls issued by an assistant message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<serde_json::Value>>,
    /// Tool-call id a tool message answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Tool result message; `content` is the tool's JSON envelope
    pub fn tool(content: impl Into<String>, tool_call_id: impl Into<String>) -> Self {
        let mut msg = Self::new(MessageRole::Tool, content);
        msg.tool_call_id = Some(tool_call_id.into());
        msg
    }

    fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach the tool calls issued by an assistant message
    pub fn with_tool_calls(mut self, tool_calls: Vec<serde_json::Value>) -> Self {
        self.tool_calls = Some(tool_calls);
        self
    }
}

/// A chat conversation with its full message list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    /// Count of user-role messages in the transcript
    pub fn user_message_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .count()
    }
}

/// Durable store of chat transcripts, one JSON file per conversation
pub struct TranscriptStore {
    sessions: DashMap<String, ChatSession>,
    write_locks: DashMap<String, Arc<Mutex<()>>>,
    data_dir: PathBuf,
}

impl TranscriptStore {
    /// Open (or create) the store rooted at `data_dir`. Sessions are
    /// loaded lazily, one file at a time.
    pub fn new(data_dir: impl Into<PathBuf>) -> EngineResult<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        Ok(Self {
            sessions: DashMap::new(),
            write_locks: DashMap::new(),
            data_dir,
        })
    }

    /// Create a new conversation and persist it
    pub fn create_session(&self, title: impl Into<String>) -> EngineResult<ChatSession> {
        let now = Utc::now();
        let session = ChatSession {
            id: Uuid::new_v4().simple().to_string(),
            title: title.into(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        let lock = self.conversation_lock(&session.id);
        let _guard = lock.lock();
        self.save(&session)?;
        self.sessions.insert(session.id.clone(), session.clone());
        info!(conversation = %session.id, "created session");
        Ok(session)
    }

    /// Fetch a conversation, cache-first
    pub fn get_session(&self, conversation_id: &str) -> EngineResult<ChatSession> {
        let session = self.load(conversation_id)?;
        self.sessions
            .insert(conversation_id.to_string(), session.clone());
        Ok(session)
    }

    /// List all conversations, metadata only, most recently updated first
    pub fn list_sessions(&self) -> EngineResult<Vec<ChatSession>> {
        let mut sessions = Vec::new();
        for id in self.known_session_ids()? {
            match self.load(&id) {
                Ok(mut session) => {
                    session.messages = Vec::new();
                    sessions.push(session);
                }
                Err(e) => warn!(conversation = %id, error = %e, "skipping unreadable session"),
            }
        }
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sessions)
    }

    /// Append a message to the conversation
    pub fn append_message(&self, conversation_id: &str, message: ChatMessage) -> EngineResult<()> {
        self.with_session_mut(conversation_id, |session| {
            session.messages.push(message);
            Ok(())
        })
    }

    /// Count of user-role messages in the conversation
    pub fn user_message_count(&self, conversation_id: &str) -> EngineResult<usize> {
        Ok(self.load(conversation_id)?.user_message_count())
    }

    /// Truncate the transcript to its first `message_index` messages
    pub fn truncate_messages(
        &self,
        conversation_id: &str,
        message_index: usize,
    ) -> EngineResult<()> {
        self.with_session_mut(conversation_id, |session| {
            if message_index >= session.messages.len() {
                return Err(EngineError::session(format!(
                    "message index {} out of range ({} messages)",
                    message_index,
                    session.messages.len()
                )));
            }
            session.messages.truncate(message_index);
            Ok(())
        })
    }

    /// Remove every message, keeping the conversation itself
    pub fn clear_messages(&self, conversation_id: &str) -> EngineResult<()> {
        self.with_session_mut(conversation_id, |session| {
            session.messages.clear();
            Ok(())
        })
    }

    /// Delete the conversation and its file. Idempotent.
    pub fn delete_session(&self, conversation_id: &str) -> EngineResult<()> {
        let lock = self.conversation_lock(conversation_id);
        let _guard = lock.lock();
        self.sessions.remove(conversation_id);
        match std::fs::remove_file(self.session_path(conversation_id)) {
            Ok(()) => {
                info!(conversation = conversation_id, "deleted session");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Update the status recorded inside a tool message's JSON content.
    ///
    /// The tool message is located by `tool_call_id`, cached conversations
    /// first, then the remaining session files on disk. Its content is a
    /// JSON envelope; `status` and `updated_at` are rewritten in place.
    pub fn set_tool_status(
        &self,
        tool_call_id: &str,
        status: ToolMessageStatus,
    ) -> EngineResult<()> {
        for id in self.known_session_ids()? {
            match self.try_update_tool_status(&id, tool_call_id, status) {
                Ok(true) => {
                    debug!(conversation = %id, tool_call_id, status = %status, "updated tool message");
                    return Ok(());
                }
                Ok(false) => {}
                Err(e) => warn!(conversation = %id, error = %e, "skipping session during status update"),
            }
        }
        Err(EngineError::not_found(format!(
            "tool message for tool_call_id {}",
            tool_call_id
        )))
    }

    fn try_update_tool_status(
        &self,
        conversation_id: &str,
        tool_call_id: &str,
        status: ToolMessageStatus,
    ) -> EngineResult<bool> {
        let lock = self.conversation_lock(conversation_id);
        let _guard = lock.lock();
        let mut session = self.load(conversation_id)?;

        let Some(message) = session.messages.iter_mut().find(|m| {
            m.role == MessageRole::Tool && m.tool_call_id.as_deref() == Some(tool_call_id)
        }) else {
            return Ok(false);
        };

        let mut content: serde_json::Value = match serde_json::from_str(&message.content) {
            Ok(serde_json::Value::Object(map)) => serde_json::Value::Object(map),
            // non-envelope tool content (plain text) is not ours to touch
            _ => return Ok(false),
        };
        content["status"] = json!(status.to_string());
        content["updated_at"] = json!(Utc::now().to_rfc3339());
        message.content = serde_json::to_string(&content)?;

        session.updated_at = Utc::now();
        self.save(&session)?;
        self.sessions.insert(conversation_id.to_string(), session);
        Ok(true)
    }

    fn with_session_mut<F, R>(&self, conversation_id: &str, f: F) -> EngineResult<R>
    where
        F: FnOnce(&mut ChatSession) -> EngineResult<R>,
    {
        let lock = self.conversation_lock(conversation_id);
        let _guard = lock.lock();
        let mut session = self.load(conversation_id)?;
        let out = f(&mut session)?;
        session.updated_at = Utc::now();
        self.save(&session)?;
        self.sessions.insert(conversation_id.to_string(), session);
        Ok(out)
    }

    fn load(&self, conversation_id: &str) -> EngineResult<ChatSession> {
        if let Some(cached) = self.sessions.get(conversation_id) {
            return Ok(cached.clone());
        }
        let path = self.session_path(conversation_id);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(EngineError::not_found(format!("session {}", conversation_id)));
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&raw)
            .map_err(|e| EngineError::session(format!("corrupt session {}: {}", conversation_id, e)))
    }

    fn save(&self, session: &ChatSession) -> EngineResult<()> {
        let json = serde_json::to_string_pretty(session)?;
        write_file_atomic(&self.session_path(&session.id), &json)
    }

    fn session_path(&self, conversation_id: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", conversation_id))
    }

    fn conversation_lock(&self, conversation_id: &str) -> Arc<Mutex<()>> {
        self.write_locks
            .entry(conversation_id.to_string())
            .or_default()
            .clone()
    }

    /// Cached conversation ids first, then any session files on disk not
    /// yet cached.
    fn known_session_ids(&self) -> EngineResult<Vec<String>> {
        let mut ids: Vec<String> = self.sessions.iter().map(|e| e.key().clone()).collect();
        for entry in std::fs::read_dir(&self.data_dir)? {
            let path = entry?.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                if let Some(stem) = path.file_stem() {
                    let id = stem.to_string_lossy().to_string();
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
            }
        }
        Ok(ids)
    }
}
