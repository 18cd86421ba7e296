//! Central application state: everything the renderer draws and the key
//! handlers mutate lives here, together with the persistence hooks that keep
//! the store in sync.

use crate::core::config::Config;
use crate::core::preferences::{AgeGroup, Preferences};
use crate::core::session::SessionManager;
use crate::core::store::{Store, StoreError};
use crate::core::wellbeing::{JournalEntry, Mood, WellbeingLog};
use crate::ui::theme::{parse_color, Theme};
use ratatui::style::Style;
use tokio_util::sync::CancellationToken;
use tui_textarea::TextArea;

const INPUT_PLACEHOLDER: &str = "Type your message...";
const MOOD_NOTE_PLACEHOLDER: &str = "What's on your mind?";

/// Which full-screen view has the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// First-run bot naming screen.
    Welcome,
    Chat,
    Sessions,
    MoodPicker,
    /// Optional note for the mood picked in the previous step.
    MoodNote(Mood),
    Journal,
    JournalEditor,
    Help,
}

/// A chat request currently running in the background.
pub struct InFlightSend {
    pub session_id: String,
    pub stream_id: u64,
    /// Set once the first fragment arrives and a reply message exists.
    pub message_id: Option<String>,
    /// Cumulative reply text rebuilt from the fragments seen so far.
    pub cumulative: String,
    pub cancel_token: CancellationToken,
}

pub struct JournalEditorState {
    pub id: Option<String>,
    pub title: TextArea<'static>,
    pub content: TextArea<'static>,
    pub editing_title: bool,
}

pub struct App {
    pub config: Config,
    pub store: Store,
    pub sessions: SessionManager,
    pub wellbeing: WellbeingLog,
    pub prefs: Preferences,
    pub theme: Theme,

    pub view: View,
    pub input: TextArea<'static>,
    pub status: Option<String>,
    pub scroll_offset: u16,
    pub welcome_cursor: usize,
    pub session_cursor: usize,
    pub mood_cursor: usize,
    pub journal_cursor: usize,
    pub mood_note: TextArea<'static>,
    pub journal_editor: Option<JournalEditorState>,
    pub exit_requested: bool,

    pub api_key: String,
    pub client: reqwest::Client,
    in_flight: Vec<InFlightSend>,
    next_stream_id: u64,
}

impl App {
    pub fn new(config: Config, store: Store, api_key: String) -> Self {
        let sessions =
            SessionManager::from_parts(store.load_sessions(), store.load_active_session());
        let wellbeing = store.load_wellbeing();
        let prefs = store.load_preferences();
        let theme = Theme::for_preferences(&prefs);
        let view = if store.has_bot_name() {
            View::Chat
        } else {
            View::Welcome
        };

        Self {
            config,
            store,
            sessions,
            wellbeing,
            prefs,
            theme,
            view,
            input: placeholder_textarea(INPUT_PLACEHOLDER),
            status: None,
            scroll_offset: 0,
            welcome_cursor: 0,
            session_cursor: 0,
            mood_cursor: 0,
            journal_cursor: 0,
            mood_note: placeholder_textarea(MOOD_NOTE_PLACEHOLDER),
            journal_editor: None,
            exit_requested: false,
            api_key,
            client: reqwest::Client::new(),
            in_flight: Vec::new(),
            next_stream_id: 0,
        }
    }

    pub fn set_status<S: Into<String>>(&mut self, status: S) {
        self.status = Some(status.into());
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    pub fn clear_input(&mut self) {
        self.input = placeholder_textarea(INPUT_PLACEHOLDER);
    }

    pub fn clear_mood_note(&mut self) {
        self.mood_note = placeholder_textarea(MOOD_NOTE_PLACEHOLDER);
    }

    // --- Background sends ---

    pub fn allocate_stream_id(&mut self) -> u64 {
        self.next_stream_id += 1;
        self.next_stream_id
    }

    pub fn register_send(
        &mut self,
        session_id: String,
        stream_id: u64,
        cancel_token: CancellationToken,
    ) {
        self.in_flight.push(InFlightSend {
            session_id,
            stream_id,
            message_id: None,
            cumulative: String::new(),
            cancel_token,
        });
    }

    pub fn is_streaming(&self, session_id: &str) -> bool {
        self.in_flight_for(session_id).is_some()
    }

    pub fn in_flight_for(&self, session_id: &str) -> Option<&InFlightSend> {
        self.in_flight.iter().find(|s| s.session_id == session_id)
    }

    pub fn in_flight_for_mut(&mut self, session_id: &str) -> Option<&mut InFlightSend> {
        self.in_flight
            .iter_mut()
            .find(|s| s.session_id == session_id)
    }

    /// Remove the in-flight record for a finished stream. Returns `None` when
    /// the ids no longer match, i.e. the event was stale.
    pub fn finish_send(&mut self, session_id: &str, stream_id: u64) -> Option<InFlightSend> {
        let index = self
            .in_flight
            .iter()
            .position(|s| s.session_id == session_id && s.stream_id == stream_id)?;
        Some(self.in_flight.remove(index))
    }

    pub fn cancel_send(&mut self, session_id: &str) -> bool {
        let Some(index) = self
            .in_flight
            .iter()
            .position(|s| s.session_id == session_id)
        else {
            return false;
        };
        let send = self.in_flight.remove(index);
        send.cancel_token.cancel();
        true
    }

    pub fn cancel_all_sends(&mut self) {
        for send in self.in_flight.drain(..) {
            send.cancel_token.cancel();
        }
    }

    // --- Persisted mutations ---

    pub fn persist_sessions(&mut self) {
        if let Err(err) = self.store.save_sessions(self.sessions.sessions()) {
            self.report_store_error(err);
        }
    }

    pub fn persist_active_session(&mut self) {
        let active_id = self.sessions.active_id().to_string();
        if let Err(err) = self.store.save_active_session(&active_id) {
            self.report_store_error(err);
        }
    }

    pub fn create_session(&mut self) -> String {
        let id = self.sessions.create_session();
        self.persist_sessions();
        self.persist_active_session();
        self.scroll_offset = 0;
        id
    }

    pub fn switch_session(&mut self, id: &str) {
        self.sessions.switch_session(id);
        self.persist_active_session();
        self.scroll_offset = 0;
    }

    pub fn delete_session(&mut self, id: &str) {
        self.cancel_send(id);
        self.sessions.delete_session(id);
        self.persist_sessions();
        self.persist_active_session();
        self.scroll_offset = 0;
    }

    pub fn clear_all_sessions(&mut self) {
        self.cancel_all_sends();
        self.sessions.clear_all();
        self.persist_sessions();
        self.persist_active_session();
        self.scroll_offset = 0;
    }

    pub fn set_theme(&mut self, name: &str) -> bool {
        if crate::ui::builtin_themes::find_builtin_theme(name).is_none() {
            return false;
        }
        self.prefs.theme = name.to_ascii_lowercase();
        if let Err(err) = self.store.save_theme(&self.prefs.theme) {
            self.report_store_error(err);
        }
        self.rebuild_theme();
        true
    }

    pub fn set_custom_background(&mut self, spec: Option<&str>) -> bool {
        if let Some(spec) = spec {
            if parse_color(spec).is_none() {
                return false;
            }
            self.prefs.custom_background = Some(spec.to_string());
        } else {
            self.prefs.custom_background = None;
        }
        if let Err(err) = self
            .store
            .save_custom_background(self.prefs.custom_background.as_deref())
        {
            self.report_store_error(err);
        }
        self.rebuild_theme();
        true
    }

    pub fn set_bot_name(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        self.prefs.bot_name = name.to_string();
        if let Err(err) = self.store.save_bot_name(name) {
            self.report_store_error(err);
        }
        true
    }

    pub fn set_age_group(&mut self, group: AgeGroup) {
        self.prefs.age_group = group;
        if let Err(err) = self.store.save_age_group(group) {
            self.report_store_error(err);
        }
    }

    /// Record a mood and persist it. Returns the chat message announcing it.
    pub fn log_mood_entry(&mut self, mood: Mood, note: &str) -> String {
        let chat_text = self.wellbeing.log_mood(mood, note);
        if let Err(err) = self.store.save_moods(self.wellbeing.moods()) {
            self.report_store_error(err);
        }
        chat_text
    }

    pub fn save_journal_entry(&mut self, id: Option<&str>, title: &str, content: &str) -> bool {
        if !self.wellbeing.save_journal_entry(id, title, content) {
            return false;
        }
        if let Err(err) = self.store.save_journal(self.wellbeing.journal()) {
            self.report_store_error(err);
        }
        true
    }

    pub fn delete_journal_entry(&mut self, id: &str) {
        self.wellbeing.delete_journal_entry(id);
        if let Err(err) = self.store.save_journal(self.wellbeing.journal()) {
            self.report_store_error(err);
        }
    }

    // --- View state ---

    pub fn open_journal_editor(&mut self, id: Option<&str>) {
        let entry = id.and_then(|id| self.wellbeing.journal_entry(id));
        let mut state = match entry {
            Some(JournalEntry {
                id, title, content, ..
            }) => JournalEditorState {
                id: Some(id.clone()),
                title: textarea_with(title),
                content: textarea_with(content),
                editing_title: true,
            },
            None => JournalEditorState {
                id: None,
                title: plain_textarea(),
                content: plain_textarea(),
                editing_title: true,
            },
        };
        state.title.set_placeholder_text("Journal Title");
        state.content.set_placeholder_text("Write your thoughts here...");
        self.journal_editor = Some(state);
        self.view = View::JournalEditor;
    }

    pub fn close_journal_editor(&mut self) {
        self.journal_editor = None;
        self.view = View::Journal;
    }

    fn rebuild_theme(&mut self) {
        self.theme = Theme::for_preferences(&self.prefs);
    }

    fn report_store_error(&mut self, err: StoreError) {
        tracing::error!(error = %err, "store write failed");
        self.status = Some(err.to_string());
    }
}

fn plain_textarea() -> TextArea<'static> {
    let mut textarea = TextArea::default();
    textarea.set_cursor_line_style(Style::default());
    textarea
}

fn placeholder_textarea(placeholder: &str) -> TextArea<'static> {
    let mut textarea = plain_textarea();
    textarea.set_placeholder_text(placeholder);
    textarea
}

fn textarea_with(content: &str) -> TextArea<'static> {
    let mut textarea = if content.is_empty() {
        TextArea::default()
    } else {
        TextArea::from(content.lines())
    };
    textarea.set_cursor_line_style(Style::default());
    textarea
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_app() -> (TempDir, App) {
        let dir = TempDir::new().expect("temp dir");
        let store = Store::at(dir.path());
        store.save_bot_name("Echo").expect("seed bot name");
        let app = App::new(Config::default(), store, "key".to_string());
        (dir, app)
    }

    #[test]
    fn first_run_opens_the_welcome_view() {
        let dir = TempDir::new().expect("temp dir");
        let app = App::new(Config::default(), Store::at(dir.path()), "key".to_string());
        assert_eq!(app.view, View::Welcome);

        let (_dir, named) = test_app();
        assert_eq!(named.view, View::Chat);
    }

    #[test]
    fn stream_ids_are_unique_and_increasing() {
        let (_dir, mut app) = test_app();
        let a = app.allocate_stream_id();
        let b = app.allocate_stream_id();
        assert!(b > a);
    }

    #[test]
    fn finish_send_requires_matching_ids() {
        let (_dir, mut app) = test_app();
        let id = app.sessions.active_id().to_string();
        let stream_id = app.allocate_stream_id();
        app.register_send(id.clone(), stream_id, CancellationToken::new());

        assert!(app.is_streaming(&id));
        assert!(app.finish_send(&id, stream_id + 1).is_none());
        assert!(app.finish_send(&id, stream_id).is_some());
        assert!(!app.is_streaming(&id));
    }

    #[test]
    fn cancel_send_cancels_the_token() {
        let (_dir, mut app) = test_app();
        let id = app.sessions.active_id().to_string();
        let token = CancellationToken::new();
        let stream_id = app.allocate_stream_id();
        app.register_send(id.clone(), stream_id, token.clone());

        assert!(app.cancel_send(&id));
        assert!(token.is_cancelled());
        assert!(!app.is_streaming(&id));
        assert!(!app.cancel_send(&id));
    }

    #[test]
    fn deleting_a_session_cancels_its_stream() {
        let (_dir, mut app) = test_app();
        let id = app.sessions.active_id().to_string();
        let token = CancellationToken::new();
        let stream_id = app.allocate_stream_id();
        app.register_send(id.clone(), stream_id, token.clone());

        app.delete_session(&id);
        assert!(token.is_cancelled());
        assert!(!app.is_streaming(&id));
        // The manager reseeded itself with a fresh session.
        assert_ne!(app.sessions.active_id(), id);
    }

    #[test]
    fn mutations_survive_a_reload() {
        let dir = TempDir::new().expect("temp dir");
        {
            let store = Store::at(dir.path());
            let mut app = App::new(Config::default(), store, "key".to_string());
            assert!(app.set_bot_name("Healio"));
            assert!(app.set_theme("sunset"));
            app.set_age_group(AgeGroup::Child);
            assert!(app.set_custom_background(Some("#112233")));
        }

        let reloaded = App::new(Config::default(), Store::at(dir.path()), "key".to_string());
        assert_eq!(reloaded.prefs.bot_name, "Healio");
        assert_eq!(reloaded.prefs.theme, "sunset");
        assert_eq!(reloaded.prefs.age_group, AgeGroup::Child);
        assert_eq!(reloaded.prefs.custom_background.as_deref(), Some("#112233"));
        assert_eq!(reloaded.theme.id, "sunset");
        assert_eq!(reloaded.view, View::Chat);
    }

    #[test]
    fn invalid_theme_and_background_are_rejected() {
        let (_dir, mut app) = test_app();
        assert!(!app.set_theme("dracula"));
        assert_eq!(app.prefs.theme, "light");
        assert!(!app.set_custom_background(Some("#12345g")));
        assert!(app.prefs.custom_background.is_none());
        assert!(!app.set_bot_name("   "));
    }

    #[test]
    fn journal_editor_prefills_existing_entries() {
        let (_dir, mut app) = test_app();
        assert!(app.save_journal_entry(None, "Gratitude", "Tea.\nSunshine."));
        let entry_id = app.wellbeing.journal()[0].id.clone();

        app.open_journal_editor(Some(&entry_id));
        let editor = app.journal_editor.as_ref().expect("editor state");
        assert_eq!(editor.id.as_deref(), Some(entry_id.as_str()));
        assert_eq!(editor.title.lines(), ["Gratitude"]);
        assert_eq!(editor.content.lines(), ["Tea.", "Sunshine."]);
        assert_eq!(app.view, View::JournalEditor);

        app.close_journal_editor();
        assert!(app.journal_editor.is_none());
        assert_eq!(app.view, View::Journal);
    }
}
