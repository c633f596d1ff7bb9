//! Session records.

use crate::ChatMessage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-conversation history and narrative bookkeeping.
///
/// Sessions are owned by the session store; callers receive clones and route
/// every mutation back through the store.
///
/// # Examples
///
/// ```
/// use taleweaver_core::Session;
///
/// let session = Session::new("abc");
/// assert_eq!(session.id, "abc");
/// assert!(session.messages.is_empty());
/// assert!(session.state.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Opaque unique id
    pub id: String,
    /// Append-only conversation history, replayed on every generation call
    pub messages: Vec<ChatMessage>,
    /// Narrative state keyed by name
    pub state: HashMap<String, serde_json::Value>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last mutation time
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create an empty session with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            messages: Vec::new(),
            state: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Wipe history and state, keeping the id and creation time.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.state.clear();
        self.touch();
    }

    /// Record a mutation.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Whether a system message has been recorded.
    pub fn has_system_message(&self) -> bool {
        self.messages
            .iter()
            .any(|m| m.role == crate::Role::System)
    }
}
