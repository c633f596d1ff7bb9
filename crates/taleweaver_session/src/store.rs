use serde::{Serialize, de::DeserializeOwned};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use taleweaver_core::{ChatMessage, Session};
use taleweaver_error::{JsonError, SessionError, SessionErrorKind, TaleweaverResult};
use tracing::{debug, instrument};

/// Registry of sessions keyed by id.
///
/// Every operation is synchronous and takes the lock only for its own
/// duration; a read-modify-write spanning several calls is not atomic unless
/// the caller serializes access to the session.
///
/// # Examples
///
/// ```
/// use taleweaver_core::ChatMessage;
/// use taleweaver_session::SessionStore;
///
/// let store = SessionStore::new();
/// let session = store.create(None).unwrap();
/// store.add_message(&session.id, ChatMessage::user("hello")).unwrap();
///
/// let messages = store.messages(&session.id).unwrap();
/// assert_eq!(messages.len(), 1);
/// assert_eq!(messages[0].content, "hello");
/// ```
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> TaleweaverResult<RwLockReadGuard<'_, HashMap<String, Session>>> {
        self.sessions
            .read()
            .map_err(|_| SessionError::new(SessionErrorKind::Poisoned).into())
    }

    fn write(&self) -> TaleweaverResult<RwLockWriteGuard<'_, HashMap<String, Session>>> {
        self.sessions
            .write()
            .map_err(|_| SessionError::new(SessionErrorKind::Poisoned).into())
    }

    fn with_session<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Session) -> T,
    ) -> TaleweaverResult<T> {
        let mut sessions = self.write()?;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| SessionError::new(SessionErrorKind::NotFound(id.to_string())))?;
        let result = f(session);
        session.touch();
        Ok(result)
    }

    /// Create a fresh, empty session.
    ///
    /// Uses `id` when given (replacing any session already stored under it),
    /// otherwise generates a random one.
    #[instrument(skip(self))]
    pub fn create(&self, id: Option<&str>) -> TaleweaverResult<Session> {
        let id = id
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let session = Session::new(id.clone());
        let replaced = self.write()?.insert(id.clone(), session.clone()).is_some();
        debug!(session_id = %id, replaced, "Created session");
        Ok(session)
    }

    /// Reuse the session named by `id`, creating it when absent or unknown.
    ///
    /// Returns the resolved id.
    pub fn resolve(&self, id: Option<&str>) -> TaleweaverResult<String> {
        match id {
            Some(id) if self.contains(id)? => Ok(id.to_string()),
            other => Ok(self.create(other)?.id),
        }
    }

    /// Snapshot of a session.
    pub fn get(&self, id: &str) -> TaleweaverResult<Option<Session>> {
        Ok(self.read()?.get(id).cloned())
    }

    /// Whether a session exists.
    pub fn contains(&self, id: &str) -> TaleweaverResult<bool> {
        Ok(self.read()?.contains_key(id))
    }

    /// Wipe messages and state, keeping the id.
    #[instrument(skip(self))]
    pub fn clear(&self, id: &str) -> TaleweaverResult<()> {
        self.with_session(id, Session::clear)?;
        debug!(session_id = %id, "Cleared session");
        Ok(())
    }

    /// Remove a session entirely. Returns whether it existed.
    #[instrument(skip(self))]
    pub fn delete(&self, id: &str) -> TaleweaverResult<bool> {
        let existed = self.write()?.remove(id).is_some();
        debug!(session_id = %id, existed, "Deleted session");
        Ok(existed)
    }

    /// Append one message to the history.
    pub fn add_message(&self, id: &str, message: ChatMessage) -> TaleweaverResult<()> {
        self.with_session(id, |s| s.messages.push(message))
    }

    /// Append several messages in order, under one lock.
    pub fn add_messages(
        &self,
        id: &str,
        messages: impl IntoIterator<Item = ChatMessage>,
    ) -> TaleweaverResult<()> {
        self.with_session(id, |s| s.messages.extend(messages))
    }

    /// The full history, in order.
    pub fn messages(&self, id: &str) -> TaleweaverResult<Vec<ChatMessage>> {
        self.read()?
            .get(id)
            .map(|s| s.messages.clone())
            .ok_or_else(|| SessionError::new(SessionErrorKind::NotFound(id.to_string())).into())
    }

    /// Set one state key.
    pub fn set_state(&self, id: &str, key: &str, value: serde_json::Value) -> TaleweaverResult<()> {
        self.with_session(id, |s| {
            s.state.insert(key.to_string(), value);
        })
    }

    /// Read one state key.
    pub fn get_state(&self, id: &str, key: &str) -> TaleweaverResult<Option<serde_json::Value>> {
        self.read()?
            .get(id)
            .map(|s| s.state.get(key).cloned())
            .ok_or_else(|| SessionError::new(SessionErrorKind::NotFound(id.to_string())).into())
    }

    /// Serialize `value` into one state key.
    pub fn set_state_as<T: Serialize>(&self, id: &str, key: &str, value: &T) -> TaleweaverResult<()> {
        let value = serde_json::to_value(value).map_err(|e| JsonError::new(e.to_string()))?;
        self.set_state(id, key, value)
    }

    /// Read one state key as `T`. A missing key is `None`.
    ///
    /// # Errors
    ///
    /// Returns a JSON error if the stored value does not deserialize as `T`.
    pub fn get_state_as<T: DeserializeOwned>(&self, id: &str, key: &str) -> TaleweaverResult<Option<T>> {
        match self.get_state(id, key)? {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| JsonError::new(format!("state key '{}': {}", key, e)).into()),
        }
    }

    /// All session ids, in no particular order.
    pub fn list(&self) -> TaleweaverResult<Vec<String>> {
        Ok(self.read()?.keys().cloned().collect())
    }

    /// Number of sessions.
    pub fn len(&self) -> usize {
        self.read().map(|s| s.len()).unwrap_or_default()
    }

    /// True when no sessions exist.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use taleweaver_error::TaleweaverErrorKind;

    #[test]
    fn test_create_with_explicit_id() {
        let store = SessionStore::new();
        let session = store.create(Some("abc")).unwrap();
        assert_eq!(session.id, "abc");
        assert!(store.contains("abc").unwrap());
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let store = SessionStore::new();
        let a = store.create(None).unwrap();
        let b = store.create(None).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_resolve_reuses_or_creates() {
        let store = SessionStore::new();
        store.create(Some("known")).unwrap();
        store.add_message("known", ChatMessage::user("kept")).unwrap();

        assert_eq!(store.resolve(Some("known")).unwrap(), "known");
        assert_eq!(store.messages("known").unwrap().len(), 1);

        assert_eq!(store.resolve(Some("fresh")).unwrap(), "fresh");
        assert!(store.contains("fresh").unwrap());

        let generated = store.resolve(None).unwrap();
        assert!(store.contains(&generated).unwrap());
    }

    #[test]
    fn test_clear_keeps_id() {
        let store = SessionStore::new();
        store.create(Some("s")).unwrap();
        store.add_message("s", ChatMessage::user("x")).unwrap();
        store.set_state("s", "k", json!(1)).unwrap();

        store.clear("s").unwrap();

        let session = store.get("s").unwrap().unwrap();
        assert!(session.messages.is_empty());
        assert!(session.state.is_empty());
    }

    #[test]
    fn test_mutating_unknown_session_is_not_found() {
        let store = SessionStore::new();
        let err = store.add_message("ghost", ChatMessage::user("x")).unwrap_err();
        match err.kind() {
            TaleweaverErrorKind::Session(e) => {
                assert_eq!(e.kind, SessionErrorKind::NotFound("ghost".to_string()))
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_typed_state_round_trip() {
        let store = SessionStore::new();
        store.create(Some("s")).unwrap();
        store
            .set_state_as("s", "milestones", &vec!["a", "b"])
            .unwrap();
        let milestones: Option<Vec<String>> = store.get_state_as("s", "milestones").unwrap();
        assert_eq!(milestones, Some(vec!["a".to_string(), "b".to_string()]));

        let missing: Option<String> = store.get_state_as("s", "nope").unwrap();
        assert_eq!(missing, None);

        let wrong: TaleweaverResult<Option<u32>> = store.get_state_as("s", "milestones");
        assert!(wrong.is_err());
    }
}
