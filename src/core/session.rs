//! Chat sessions and the manager that owns them.
//!
//! The [`SessionManager`] is the single owner of the session collection and
//! the active-session pointer. Two invariants hold across every operation:
//! the collection is never empty, and the active id always resolves to a
//! member of the collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name given to sessions before their first user message earns them a title.
pub const DEFAULT_SESSION_NAME: &str = "New Chat";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }

    pub fn is_user(self) -> bool {
        self == Role::User
    }
}

impl AsRef<str> for Role {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<&str> for Role {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(Role::User),
            "model" => Ok(Role::Model),
            _ => Err(format!("invalid message role: {value}")),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_string()
    }
}

/// A grounding citation attached to a model message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub uri: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Source>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::User,
            text: text.into(),
            timestamp: Utc::now(),
            sources: Vec::new(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::Model,
            text: text.into(),
            timestamp: Utc::now(),
            sources: Vec::new(),
        }
    }

    fn model_with_id(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Model,
            text: text.into(),
            timestamp: Utc::now(),
            sources: Vec::new(),
        }
    }

    /// Append sources the message does not already cite, keyed by uri.
    fn merge_sources(&mut self, incoming: &[Source]) {
        for source in incoming {
            if !self.sources.iter().any(|s| s.uri == source.uri) {
                self.sources.push(source.clone());
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub name: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
}

impl ChatSession {
    pub fn fresh() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: DEFAULT_SESSION_NAME.to_string(),
            messages: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Outcome of [`SessionManager::append_user_turn`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendedTurn {
    pub message_id: String,
    /// True when the appended message is the session's first, which is what
    /// triggers asynchronous title generation.
    pub first_turn: bool,
}

#[derive(Debug, Clone)]
pub struct SessionManager {
    sessions: Vec<ChatSession>,
    active_id: String,
}

impl SessionManager {
    pub fn new() -> Self {
        let session = ChatSession::fresh();
        let active_id = session.id.clone();
        Self {
            sessions: vec![session],
            active_id,
        }
    }

    /// Rebuild from persisted state, normalizing whatever was stored: an
    /// empty collection gets one fresh session, and a stale active id falls
    /// back to the first session.
    pub fn from_parts(sessions: Vec<ChatSession>, active_id: Option<String>) -> Self {
        let mut manager = Self {
            sessions,
            active_id: String::new(),
        };
        if manager.sessions.is_empty() {
            manager.sessions.push(ChatSession::fresh());
        }
        manager.active_id = match active_id {
            Some(id) if manager.sessions.iter().any(|s| s.id == id) => id,
            _ => manager.sessions[0].id.clone(),
        };
        manager
    }

    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    pub fn active_id(&self) -> &str {
        &self.active_id
    }

    pub fn active(&self) -> &ChatSession {
        self.sessions
            .iter()
            .find(|s| s.id == self.active_id)
            .unwrap_or(&self.sessions[0])
    }

    pub fn get(&self, id: &str) -> Option<&ChatSession> {
        self.sessions.iter().find(|s| s.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut ChatSession> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    /// Create a fresh empty session, append it, and make it active.
    pub fn create_session(&mut self) -> String {
        let session = ChatSession::fresh();
        let id = session.id.clone();
        self.sessions.push(session);
        self.active_id = id.clone();
        id
    }

    /// Activate `id` if it is a member of the collection; unknown ids leave
    /// the pointer untouched.
    pub fn switch_session(&mut self, id: &str) {
        if self.sessions.iter().any(|s| s.id == id) {
            self.active_id = id.to_string();
        }
    }

    /// Remove the session with `id`. An emptied collection is reseeded with
    /// one fresh session; deleting the active session activates the first
    /// remaining one (collection order, not recency).
    pub fn delete_session(&mut self, id: &str) {
        self.sessions.retain(|s| s.id != id);
        if self.sessions.is_empty() {
            let session = ChatSession::fresh();
            self.active_id = session.id.clone();
            self.sessions.push(session);
        } else if self.active_id == id {
            self.active_id = self.sessions[0].id.clone();
        }
    }

    /// Discard every session, replacing the collection with one fresh active
    /// session.
    pub fn clear_all(&mut self) {
        let session = ChatSession::fresh();
        self.active_id = session.id.clone();
        self.sessions = vec![session];
    }

    /// Append a user-role message to `session_id`.
    pub fn append_user_turn(&mut self, session_id: &str, text: &str) -> Option<AppendedTurn> {
        let session = self.get_mut(session_id)?;
        let first_turn = session.messages.is_empty();
        let message = Message::user(text);
        let message_id = message.id.clone();
        session.messages.push(message);
        Some(AppendedTurn {
            message_id,
            first_turn,
        })
    }

    /// Apply one streamed fragment to `session_id`. When `message_id` is not
    /// yet present a model message seeded with the cumulative text is
    /// appended; otherwise the existing message's text is replaced with the
    /// cumulative text. Sources merge into the existing list, deduplicated by
    /// uri, so the transcript always reflects the latest cumulative state and
    /// replays cannot duplicate anything.
    pub fn apply_model_fragment(
        &mut self,
        session_id: &str,
        message_id: &str,
        cumulative_text: &str,
        sources: &[Source],
    ) {
        let Some(session) = self.get_mut(session_id) else {
            return;
        };
        match session.messages.iter_mut().find(|m| m.id == message_id) {
            Some(message) => {
                message.text = cumulative_text.to_string();
                message.merge_sources(sources);
            }
            None => {
                let mut message = Message::model_with_id(message_id, cumulative_text);
                message.merge_sources(sources);
                session.messages.push(message);
            }
        }
    }

    /// Append a standalone model-role message, used for the fixed apology
    /// when a stream fails.
    pub fn append_model_notice(&mut self, session_id: &str, text: &str) {
        if let Some(session) = self.get_mut(session_id) {
            session.messages.push(Message::model(text));
        }
    }

    /// Write only the session's display name. Safe to race with fragment
    /// application since messages are untouched.
    pub fn rename_session(&mut self, session_id: &str, name: &str) {
        if let Some(session) = self.get_mut(session_id) {
            session.name = name.to_string();
        }
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(uri: &str, title: &str) -> Source {
        Source {
            uri: uri.to_string(),
            title: title.to_string(),
        }
    }

    #[test]
    fn new_manager_starts_with_one_active_session() {
        let manager = SessionManager::new();
        assert_eq!(manager.sessions().len(), 1);
        assert_eq!(manager.active().id, manager.active_id());
        assert_eq!(manager.active().name, DEFAULT_SESSION_NAME);
        assert!(manager.active().is_empty());
    }

    #[test]
    fn collection_is_never_empty_and_active_always_resolves() {
        let mut manager = SessionManager::new();
        let first = manager.active_id().to_string();
        let second = manager.create_session();
        manager.delete_session(&second);
        manager.delete_session(&first);
        manager.clear_all();
        let survivor = manager.active_id().to_string();
        manager.delete_session(&survivor);

        assert_eq!(manager.sessions().len(), 1);
        assert!(manager.sessions().iter().any(|s| s.id == manager.active_id()));
    }

    #[test]
    fn create_session_appends_and_activates() {
        let mut manager = SessionManager::new();
        let first = manager.active_id().to_string();
        let second = manager.create_session();

        assert_eq!(manager.sessions().len(), 2);
        assert_eq!(manager.active_id(), second);
        assert_eq!(manager.sessions()[0].id, first);
        assert_eq!(manager.sessions()[1].id, second);
    }

    #[test]
    fn deleting_active_session_activates_first_remaining() {
        let mut manager = SessionManager::new();
        let first = manager.active_id().to_string();
        let second = manager.create_session();
        let third = manager.create_session();
        assert_eq!(manager.active_id(), third);

        manager.delete_session(&third);
        assert_eq!(manager.active_id(), first);
        assert_eq!(manager.sessions().len(), 2);

        // Deleting a non-active session leaves the pointer unchanged.
        manager.delete_session(&second);
        assert_eq!(manager.active_id(), first);
    }

    #[test]
    fn deleting_last_session_synthesizes_a_fresh_one() {
        let mut manager = SessionManager::new();
        let only = manager.active_id().to_string();
        manager.delete_session(&only);

        assert_eq!(manager.sessions().len(), 1);
        assert_ne!(manager.active_id(), only);
        assert!(manager.active().is_empty());
        assert_eq!(manager.active().name, DEFAULT_SESSION_NAME);
    }

    #[test]
    fn clear_all_replaces_everything_with_one_fresh_session() {
        let mut manager = SessionManager::new();
        manager.create_session();
        manager.create_session();
        let before: Vec<String> = manager.sessions().iter().map(|s| s.id.clone()).collect();

        manager.clear_all();

        assert_eq!(manager.sessions().len(), 1);
        assert!(!before.contains(&manager.active_id().to_string()));
    }

    #[test]
    fn switch_session_ignores_unknown_ids() {
        let mut manager = SessionManager::new();
        let first = manager.active_id().to_string();
        let second = manager.create_session();

        manager.switch_session(&first);
        assert_eq!(manager.active_id(), first);

        manager.switch_session("no-such-session");
        assert_eq!(manager.active_id(), first);

        manager.switch_session(&second);
        assert_eq!(manager.active_id(), second);
    }

    #[test]
    fn from_parts_reseeds_empty_collection() {
        let manager = SessionManager::from_parts(Vec::new(), Some("stale".to_string()));
        assert_eq!(manager.sessions().len(), 1);
        assert_eq!(manager.active_id(), manager.sessions()[0].id);
    }

    #[test]
    fn from_parts_falls_back_to_first_session_on_stale_active_id() {
        let a = ChatSession::fresh();
        let b = ChatSession::fresh();
        let first_id = a.id.clone();
        let b_id = b.id.clone();

        let manager = SessionManager::from_parts(vec![a, b], Some("stale".to_string()));
        assert_eq!(manager.active_id(), first_id);

        let a2 = ChatSession::fresh();
        let b2 = ChatSession {
            id: b_id.clone(),
            ..ChatSession::fresh()
        };
        let manager = SessionManager::from_parts(vec![a2, b2], Some(b_id.clone()));
        assert_eq!(manager.active_id(), b_id);
    }

    #[test]
    fn append_user_turn_reports_first_message() {
        let mut manager = SessionManager::new();
        let id = manager.active_id().to_string();

        let first = manager.append_user_turn(&id, "Hello").expect("session exists");
        assert!(first.first_turn);

        let second = manager.append_user_turn(&id, "Again").expect("session exists");
        assert!(!second.first_turn);
        assert_ne!(first.message_id, second.message_id);

        let messages = &manager.active().messages;
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().all(|m| m.role == Role::User));
        assert!(manager.append_user_turn("missing", "x").is_none());
    }

    #[test]
    fn fragment_creates_then_updates_a_single_model_message() {
        let mut manager = SessionManager::new();
        let session_id = manager.active_id().to_string();

        manager.apply_model_fragment(&session_id, "m1", "Hi", &[]);
        manager.apply_model_fragment(&session_id, "m1", "Hi there", &[]);

        let messages = &manager.active().messages;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "Hi there");
        assert_eq!(messages[0].role, Role::Model);
    }

    #[test]
    fn replaying_cumulative_fragments_is_idempotent() {
        let mut manager = SessionManager::new();
        let session_id = manager.active_id().to_string();
        let citations = [source("https://a.example", "A")];

        for _ in 0..2 {
            manager.apply_model_fragment(&session_id, "m1", "Hi", &citations);
            manager.apply_model_fragment(&session_id, "m1", "Hi there", &citations);
        }

        let messages = &manager.active().messages;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "Hi there");
        assert_eq!(messages[0].sources.len(), 1);
    }

    #[test]
    fn sources_merge_without_duplicate_uris() {
        let mut manager = SessionManager::new();
        let session_id = manager.active_id().to_string();

        manager.apply_model_fragment(
            &session_id,
            "m1",
            "text",
            &[source("https://a.example", "A"), source("https://b.example", "B")],
        );
        manager.apply_model_fragment(
            &session_id,
            "m1",
            "text more",
            &[
                source("https://b.example", "B again"),
                source("https://c.example", "C"),
            ],
        );

        let sources = &manager.active().messages[0].sources;
        let uris: Vec<&str> = sources.iter().map(|s| s.uri.as_str()).collect();
        assert_eq!(
            uris,
            vec!["https://a.example", "https://b.example", "https://c.example"]
        );
        // First title wins for a repeated uri.
        assert_eq!(sources[1].title, "B");
    }

    #[test]
    fn fragments_address_their_originating_session() {
        let mut manager = SessionManager::new();
        let origin = manager.active_id().to_string();
        let other = manager.create_session();
        assert_eq!(manager.active_id(), other);

        // The visible session changed but the fragment still lands on the
        // session that started the stream.
        manager.apply_model_fragment(&origin, "m1", "background reply", &[]);

        assert!(manager.active().is_empty());
        assert_eq!(manager.get(&origin).unwrap().messages.len(), 1);
    }

    #[test]
    fn rename_touches_only_the_name() {
        let mut manager = SessionManager::new();
        let id = manager.active_id().to_string();
        manager.append_user_turn(&id, "Hello").expect("session exists");

        manager.rename_session(&id, "Greetings");

        assert_eq!(manager.active().name, "Greetings");
        assert_eq!(manager.active().messages.len(), 1);

        manager.rename_session("missing", "nope");
        assert_eq!(manager.active().name, "Greetings");
    }

    #[test]
    fn model_notice_appends_a_model_message() {
        let mut manager = SessionManager::new();
        let id = manager.active_id().to_string();
        manager.append_model_notice(&id, "apology");

        let messages = &manager.active().messages;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::Model);
        assert_eq!(messages[0].text, "apology");
    }

    #[test]
    fn sessions_round_trip_through_json() {
        let mut manager = SessionManager::new();
        let id = manager.active_id().to_string();
        manager.append_user_turn(&id, "Hello").expect("session exists");
        manager.apply_model_fragment(&id, "m1", "Hi", &[source("https://a.example", "A")]);

        let encoded = serde_json::to_string(manager.sessions()).expect("serialize");
        let decoded: Vec<ChatSession> = serde_json::from_str(&encoded).expect("deserialize");

        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].messages.len(), 2);
        assert_eq!(decoded[0].messages[1].sources[0].title, "A");

        // A user message without sources omits the field entirely.
        let user_json = serde_json::to_value(&manager.active().messages[0]).expect("to_value");
        assert!(user_json.get("sources").is_none());
        assert_eq!(user_json.get("role").and_then(|v| v.as_str()), Some("user"));
    }
}
