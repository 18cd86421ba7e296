//! Orchestration between the UI, the session manager, and the background
//! API tasks. The controller owns no state of its own; it borrows the app
//! for the duration of one keypress or one drained event.

use crate::api::GenerateContentRequest;
use crate::core::app::App;
use crate::core::chat_stream::{ChatEvent, ChatStreamService, StreamParams, TitleParams};
use crate::core::persona;
use crate::core::wellbeing::Mood;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Shown in place of a reply when the request fails.
const CONNECTION_APOLOGY: &str =
    "Sorry, I'm having trouble connecting right now. Please check your API Key and try again later.";

/// Refusal notice for actions that would overlap the in-flight reply.
const STILL_REPLYING_NOTICE: &str = "Still replying. Press Esc to stop the current reply first.";

pub struct ConversationController<'a> {
    app: &'a mut App,
    service: &'a ChatStreamService,
}

impl<'a> ConversationController<'a> {
    pub fn new(app: &'a mut App, service: &'a ChatStreamService) -> Self {
        Self { app, service }
    }

    /// Append `text` as the user's turn in the active session and start
    /// streaming the reply. One reply at a time per session: a second send
    /// while one is running is refused with a status notice.
    pub fn send_user_text(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }

        let session_id = self.app.sessions.active_id().to_string();
        if self.app.is_streaming(&session_id) {
            self.app.set_status(STILL_REPLYING_NOTICE);
            return false;
        }

        let Some(turn) = self.app.sessions.append_user_turn(&session_id, text) else {
            return false;
        };
        self.app.persist_sessions();
        self.app.scroll_offset = 0;
        self.app.clear_status();

        let instruction = persona::system_instruction(
            self.app.prefs.age_group.as_str(),
            &self.app.prefs.bot_name,
        );
        let request = match self.app.sessions.get(&session_id) {
            Some(session) => GenerateContentRequest::chat(
                &session.messages,
                &instruction,
                self.app.config.web_search_enabled(),
            ),
            None => return false,
        };

        let stream_id = self.app.allocate_stream_id();
        let cancel_token = CancellationToken::new();
        self.app
            .register_send(session_id.clone(), stream_id, cancel_token.clone());

        self.service.spawn_stream(StreamParams {
            client: self.app.client.clone(),
            base_url: self.app.config.effective_base_url().to_string(),
            api_key: self.app.api_key.clone(),
            model: self.app.config.effective_model().to_string(),
            request,
            session_id: session_id.clone(),
            cancel_token,
            stream_id,
        });

        if turn.first_turn {
            self.service.spawn_title(TitleParams {
                client: self.app.client.clone(),
                base_url: self.app.config.effective_base_url().to_string(),
                api_key: self.app.api_key.clone(),
                model: self.app.config.effective_model().to_string(),
                first_message: text.to_string(),
                session_id,
                stream_id,
            });
        }
        true
    }

    /// Record a mood entry, then tell the companion about it through the
    /// normal send path so it can respond. While a reply is streaming the
    /// whole operation is refused: the entry and its chat message land
    /// together or not at all.
    pub fn log_mood(&mut self, mood: Mood, note: &str) -> bool {
        let session_id = self.app.sessions.active_id().to_string();
        if self.app.is_streaming(&session_id) {
            self.app.set_status(STILL_REPLYING_NOTICE);
            return false;
        }
        let chat_text = self.app.log_mood_entry(mood, note);
        self.send_user_text(&chat_text)
    }

    /// Apply one event drained from the service channel. Events carry the
    /// stream id they were sent under; anything that does not match the
    /// session's current in-flight record is stale and dropped. Titles are
    /// the exception: they rename the session whenever they arrive.
    pub fn apply_event(&mut self, event: ChatEvent, stream_id: u64) {
        match event {
            ChatEvent::Fragment {
                session_id,
                delta,
                sources,
            } => {
                let Some(send) = self.app.in_flight_for_mut(&session_id) else {
                    tracing::debug!(%session_id, "dropping fragment for finished stream");
                    return;
                };
                if send.stream_id != stream_id {
                    tracing::debug!(%session_id, stream_id, "dropping fragment from stale stream");
                    return;
                }
                send.cumulative.push_str(&delta);
                let message_id = send
                    .message_id
                    .get_or_insert_with(|| Uuid::new_v4().to_string())
                    .clone();
                let cumulative = send.cumulative.clone();
                self.app.sessions.apply_model_fragment(
                    &session_id,
                    &message_id,
                    &cumulative,
                    &sources,
                );
            }
            ChatEvent::Completed { session_id } => {
                if self.app.finish_send(&session_id, stream_id).is_none() {
                    return;
                }
                self.app.persist_sessions();
            }
            ChatEvent::Failed { session_id, detail } => {
                tracing::error!(%session_id, %detail, "chat request failed");
                if self.app.finish_send(&session_id, stream_id).is_none() {
                    return;
                }
                // Whatever partial reply already landed stays; the apology
                // is its own message.
                self.app
                    .sessions
                    .append_model_notice(&session_id, CONNECTION_APOLOGY);
                self.app.persist_sessions();
                if let Some(line) = detail.lines().next() {
                    self.app.set_status(line.to_string());
                }
            }
            ChatEvent::TitleReady { session_id, title } => {
                self.app.sessions.rename_session(&session_id, &title);
                self.app.persist_sessions();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::core::session::Role;
    use crate::core::store::Store;
    use tempfile::TempDir;

    fn test_app() -> (TempDir, App) {
        let dir = TempDir::new().expect("temp dir");
        let store = Store::at(dir.path());
        store.save_bot_name("Echo").expect("seed bot name");
        let config = Config {
            base_url: Some("http://127.0.0.1:9".to_string()),
            ..Config::default()
        };
        let app = App::new(config, store, "test-key".to_string());
        (dir, app)
    }

    fn fragment(session_id: &str, delta: &str) -> ChatEvent {
        ChatEvent::Fragment {
            session_id: session_id.to_string(),
            delta: delta.to_string(),
            sources: Vec::new(),
        }
    }

    #[test]
    fn fragments_accumulate_into_one_message() {
        let (_dir, mut app) = test_app();
        let (service, _rx) = ChatStreamService::new();
        let session_id = app.sessions.active_id().to_string();
        app.sessions
            .append_user_turn(&session_id, "Hello")
            .expect("session exists");
        app.register_send(session_id.clone(), 1, CancellationToken::new());

        let mut controller = ConversationController::new(&mut app, &service);
        controller.apply_event(fragment(&session_id, "Hi"), 1);
        controller.apply_event(fragment(&session_id, " there"), 1);
        controller.apply_event(
            ChatEvent::Completed {
                session_id: session_id.clone(),
            },
            1,
        );

        let session = app.sessions.active();
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[1].role, Role::Model);
        assert_eq!(session.messages[1].text, "Hi there");
        assert!(!app.is_streaming(&session_id));
    }

    #[test]
    fn stale_fragments_are_dropped() {
        let (_dir, mut app) = test_app();
        let (service, _rx) = ChatStreamService::new();
        let session_id = app.sessions.active_id().to_string();
        app.register_send(session_id.clone(), 2, CancellationToken::new());

        let mut controller = ConversationController::new(&mut app, &service);
        controller.apply_event(fragment(&session_id, "old reply"), 1);

        assert!(app.sessions.active().messages.is_empty());
        assert!(app.is_streaming(&session_id));
    }

    #[test]
    fn fragments_for_unknown_streams_are_dropped() {
        let (_dir, mut app) = test_app();
        let (service, _rx) = ChatStreamService::new();
        let session_id = app.sessions.active_id().to_string();

        let mut controller = ConversationController::new(&mut app, &service);
        controller.apply_event(fragment(&session_id, "late text"), 7);

        assert!(app.sessions.active().messages.is_empty());
    }

    #[test]
    fn failure_before_any_fragment_appends_the_apology() {
        let (_dir, mut app) = test_app();
        let (service, _rx) = ChatStreamService::new();
        let session_id = app.sessions.active_id().to_string();
        app.sessions
            .append_user_turn(&session_id, "Hello")
            .expect("session exists");
        app.register_send(session_id.clone(), 1, CancellationToken::new());

        let mut controller = ConversationController::new(&mut app, &service);
        controller.apply_event(
            ChatEvent::Failed {
                session_id: session_id.clone(),
                detail: "API Error: quota exceeded\nmore detail".to_string(),
            },
            1,
        );

        let session = app.sessions.active();
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[1].role, Role::Model);
        assert_eq!(session.messages[1].text, CONNECTION_APOLOGY);
        assert!(!app.is_streaming(&session_id));
        assert_eq!(app.status.as_deref(), Some("API Error: quota exceeded"));
    }

    #[test]
    fn failure_mid_stream_keeps_the_partial_and_appends_the_apology() {
        let (_dir, mut app) = test_app();
        let (service, _rx) = ChatStreamService::new();
        let session_id = app.sessions.active_id().to_string();
        app.sessions
            .append_user_turn(&session_id, "Hello")
            .expect("session exists");
        app.register_send(session_id.clone(), 1, CancellationToken::new());

        let mut controller = ConversationController::new(&mut app, &service);
        controller.apply_event(fragment(&session_id, "Hi th"), 1);
        controller.apply_event(
            ChatEvent::Failed {
                session_id: session_id.clone(),
                detail: "API Error: connection reset".to_string(),
            },
            1,
        );

        let session = app.sessions.active();
        assert_eq!(session.messages.len(), 3);
        assert_eq!(session.messages[1].text, "Hi th");
        assert_eq!(session.messages[2].text, CONNECTION_APOLOGY);
        assert!(!app.is_streaming(&session_id));
    }

    #[test]
    fn titles_apply_even_after_the_stream_finished() {
        let (_dir, mut app) = test_app();
        let (service, _rx) = ChatStreamService::new();
        let session_id = app.sessions.active_id().to_string();

        let mut controller = ConversationController::new(&mut app, &service);
        controller.apply_event(
            ChatEvent::TitleReady {
                session_id: session_id.clone(),
                title: "Evening Check-in".to_string(),
            },
            42,
        );

        assert_eq!(app.sessions.active().name, "Evening Check-in");
    }

    #[tokio::test]
    async fn send_appends_the_user_turn_and_registers_the_stream() {
        let (_dir, mut app) = test_app();
        let (service, _rx) = ChatStreamService::new();

        let mut controller = ConversationController::new(&mut app, &service);
        assert!(controller.send_user_text("  Hello  "));

        let session = app.sessions.active();
        assert_eq!(session.messages.len(), 1);
        assert_eq!(session.messages[0].role, Role::User);
        assert_eq!(session.messages[0].text, "Hello");
        let session_id = session.id.clone();
        assert!(app.is_streaming(&session_id));
    }

    #[tokio::test]
    async fn second_send_is_refused_while_streaming() {
        let (_dir, mut app) = test_app();
        let (service, _rx) = ChatStreamService::new();

        let mut controller = ConversationController::new(&mut app, &service);
        assert!(controller.send_user_text("first"));
        assert!(!controller.send_user_text("second"));

        let session = app.sessions.active();
        assert_eq!(session.messages.len(), 1);
        assert_eq!(session.messages[0].text, "first");
        assert!(app.status.as_deref().unwrap_or("").contains("Still replying"));
    }

    #[tokio::test]
    async fn blank_input_is_not_sent() {
        let (_dir, mut app) = test_app();
        let (service, _rx) = ChatStreamService::new();

        let mut controller = ConversationController::new(&mut app, &service);
        assert!(!controller.send_user_text("   \n  "));
        assert!(app.sessions.active().messages.is_empty());
    }

    #[tokio::test]
    async fn logging_a_mood_records_it_and_sends_one_message() {
        let (_dir, mut app) = test_app();
        let (service, _rx) = ChatStreamService::new();

        let mut controller = ConversationController::new(&mut app, &service);
        assert!(controller.log_mood(Mood::Calm, "tea helped"));

        assert_eq!(app.wellbeing.moods().len(), 1);
        assert_eq!(app.wellbeing.moods()[0].mood, Mood::Calm);

        let session = app.sessions.active();
        assert_eq!(session.messages.len(), 1);
        assert_eq!(
            session.messages[0].text,
            "I just logged my mood as calm. My thoughts: \"tea helped\""
        );
    }

    #[test]
    fn mood_logging_is_refused_while_a_reply_streams() {
        let (_dir, mut app) = test_app();
        let (service, _rx) = ChatStreamService::new();
        let session_id = app.sessions.active_id().to_string();
        app.register_send(session_id.clone(), 1, CancellationToken::new());

        let mut controller = ConversationController::new(&mut app, &service);
        assert!(!controller.log_mood(Mood::Sad, "rough day"));

        assert!(app.wellbeing.moods().is_empty());
        assert!(app.sessions.active().messages.is_empty());
        assert!(app.status.as_deref().unwrap_or("").contains("Still replying"));
        assert!(app.is_streaming(&session_id));
    }
}
