//! Main event loop: draws frames, applies streaming events from the
//! background service, and routes key input to whichever view is open.

use crate::commands::{process_input, CommandResult};
use crate::core::app::{App, View};
use crate::core::chat_stream::ChatStreamService;
use crate::core::config::Config;
use crate::core::conversation::ConversationController;
use crate::core::preferences::BOT_NAME_SUGGESTIONS;
use crate::core::store::Store;
use crate::core::wellbeing::Mood;
use crate::ui::renderer::ui;
use ratatui::crossterm::{
    event::{
        self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::layout::Margin;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::error::Error;
use std::io;
use std::time::Duration;
use tui_textarea::Input as TAInput;

pub async fn run_chat(config: Config, store: Store, api_key: String) -> Result<(), Box<dyn Error>> {
    let mut app = App::new(config, store, api_key);
    let (service, mut rx) = ChatStreamService::new();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    loop {
        if app.exit_requested {
            break;
        }
        terminal.draw(|f| ui(f, &mut app))?;

        // Drain all pending stream events, then redraw before reading keys.
        let mut received_any = false;
        while let Ok((stream_event, stream_id)) = rx.try_recv() {
            ConversationController::new(&mut app, &service).apply_event(stream_event, stream_id);
            received_any = true;
        }
        if received_any {
            continue;
        }

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if key.code == KeyCode::Char('c')
                        && key.modifiers.contains(KeyModifiers::CONTROL)
                    {
                        app.cancel_all_sends();
                        break;
                    }
                    handle_key(&mut app, &service, key);
                }
                Event::Paste(text) => paste_into_view(&mut app, &text),
                _ => {}
            }
        }
    }

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;
    Ok(())
}

fn handle_key(app: &mut App, service: &ChatStreamService, key: KeyEvent) {
    match app.view {
        View::Welcome => handle_welcome_key(app, key),
        View::Chat => handle_chat_key(app, service, key),
        View::Sessions => handle_sessions_key(app, key),
        View::MoodPicker => handle_mood_picker_key(app, key),
        View::MoodNote(mood) => handle_mood_note_key(app, service, key, mood),
        View::Journal => handle_journal_key(app, key),
        View::JournalEditor => handle_journal_editor_key(app, key),
        View::Help => app.view = View::Chat,
    }
}

fn handle_welcome_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Up => app.welcome_cursor = app.welcome_cursor.saturating_sub(1),
        KeyCode::Down => {
            app.welcome_cursor = (app.welcome_cursor + 1).min(BOT_NAME_SUGGESTIONS.len() - 1);
        }
        KeyCode::Enter => {
            let typed = app.input.lines().join(" ");
            let typed = typed.trim();
            let name = if typed.is_empty() {
                BOT_NAME_SUGGESTIONS[app.welcome_cursor.min(BOT_NAME_SUGGESTIONS.len() - 1)]
                    .to_string()
            } else {
                typed.to_string()
            };
            if app.set_bot_name(&name) {
                app.clear_input();
                app.view = View::Chat;
            }
        }
        _ => {
            app.input.input(TAInput::from(key));
        }
    }
}

fn handle_chat_key(app: &mut App, service: &ChatStreamService, key: KeyEvent) {
    match key.code {
        KeyCode::Enter if key.modifiers.contains(KeyModifiers::ALT) => {
            app.input.insert_str("\n");
        }
        KeyCode::Enter => {
            let text = app.input.lines().join("\n");
            match process_input(app, &text) {
                CommandResult::Continue => app.clear_input(),
                CommandResult::ProcessAsMessage(message) => {
                    let sent = ConversationController::new(app, service).send_user_text(&message);
                    if sent {
                        app.clear_input();
                    }
                }
                CommandResult::Quit => {
                    app.cancel_all_sends();
                    app.exit_requested = true;
                }
            }
        }
        KeyCode::Esc => {
            let active_id = app.sessions.active().id.clone();
            if app.cancel_send(&active_id) {
                app.set_status("Reply cancelled.");
            } else {
                app.clear_status();
            }
        }
        KeyCode::PageUp => app.scroll_offset = app.scroll_offset.saturating_add(5),
        KeyCode::PageDown => app.scroll_offset = app.scroll_offset.saturating_sub(5),
        _ => {
            app.input.input(TAInput::from(key));
        }
    }
}

fn handle_sessions_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Up => app.session_cursor = app.session_cursor.saturating_sub(1),
        KeyCode::Down => {
            let last = app.sessions.sessions().len().saturating_sub(1);
            app.session_cursor = (app.session_cursor + 1).min(last);
        }
        KeyCode::Enter => {
            if let Some(session) = app.sessions.sessions().get(app.session_cursor) {
                let id = session.id.clone();
                app.switch_session(&id);
            }
            app.view = View::Chat;
        }
        KeyCode::Char('n') => {
            app.create_session();
            app.set_status("Started a new chat.");
            app.view = View::Chat;
        }
        KeyCode::Char('d') => {
            if let Some(session) = app.sessions.sessions().get(app.session_cursor) {
                let id = session.id.clone();
                app.delete_session(&id);
                app.set_status("Chat deleted.");
            }
            let last = app.sessions.sessions().len().saturating_sub(1);
            app.session_cursor = app.session_cursor.min(last);
        }
        KeyCode::Esc => app.view = View::Chat,
        _ => {}
    }
}

fn handle_mood_picker_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Up => app.mood_cursor = app.mood_cursor.saturating_sub(1),
        KeyCode::Down => app.mood_cursor = (app.mood_cursor + 1).min(Mood::ALL.len() - 1),
        KeyCode::Enter => {
            let mood = Mood::ALL[app.mood_cursor.min(Mood::ALL.len() - 1)];
            app.clear_mood_note();
            app.view = View::MoodNote(mood);
        }
        KeyCode::Esc => app.view = View::Chat,
        _ => {}
    }
}

fn handle_mood_note_key(app: &mut App, service: &ChatStreamService, key: KeyEvent, mood: Mood) {
    match key.code {
        KeyCode::Enter => {
            let note = app.mood_note.lines().join("\n");
            let logged = ConversationController::new(app, service).log_mood(mood, note.trim());
            if logged {
                app.clear_mood_note();
                app.view = View::Chat;
            }
        }
        KeyCode::Esc => {
            app.clear_mood_note();
            app.view = View::MoodPicker;
        }
        _ => {
            app.mood_note.input(TAInput::from(key));
        }
    }
}

fn handle_journal_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Up => app.journal_cursor = app.journal_cursor.saturating_sub(1),
        KeyCode::Down => {
            let last = app.wellbeing.journal().len().saturating_sub(1);
            app.journal_cursor = (app.journal_cursor + 1).min(last);
        }
        KeyCode::Char('n') => app.open_journal_editor(None),
        KeyCode::Enter => {
            if let Some(entry) = app.wellbeing.journal().get(app.journal_cursor) {
                let id = entry.id.clone();
                app.open_journal_editor(Some(&id));
            }
        }
        KeyCode::Char('d') => {
            if let Some(entry) = app.wellbeing.journal().get(app.journal_cursor) {
                let id = entry.id.clone();
                app.delete_journal_entry(&id);
            }
            let last = app.wellbeing.journal().len().saturating_sub(1);
            app.journal_cursor = app.journal_cursor.min(last);
        }
        KeyCode::Esc => app.view = View::Chat,
        _ => {}
    }
}

fn handle_journal_editor_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Tab => {
            if let Some(editor) = app.journal_editor.as_mut() {
                editor.editing_title = !editor.editing_title;
            }
        }
        KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let Some(editor) = app.journal_editor.as_ref() else {
                return;
            };
            let id = editor.id.clone();
            let title = editor.title.lines().join(" ");
            let content = editor.content.lines().join("\n");
            if app.save_journal_entry(id.as_deref(), title.trim(), &content) {
                app.close_journal_editor();
                app.set_status("Journal entry saved.");
            } else {
                app.set_status("A title is required.");
            }
        }
        KeyCode::Enter => {
            if let Some(editor) = app.journal_editor.as_mut() {
                if editor.editing_title {
                    editor.editing_title = false;
                } else {
                    editor.content.input(TAInput::from(key));
                }
            }
        }
        KeyCode::Esc => app.close_journal_editor(),
        _ => {
            if let Some(editor) = app.journal_editor.as_mut() {
                let target = if editor.editing_title {
                    &mut editor.title
                } else {
                    &mut editor.content
                };
                target.input(TAInput::from(key));
            }
        }
    }
}

fn paste_into_view(app: &mut App, text: &str) {
    match app.view {
        View::Welcome | View::Chat => {
            app.input.insert_str(text);
        }
        View::MoodNote(_) => {
            app.mood_note.insert_str(text);
        }
        View::JournalEditor => {
            if let Some(editor) = app.journal_editor.as_mut() {
                let target = if editor.editing_title {
                    &mut editor.title
                } else {
                    &mut editor.content
                };
                target.insert_str(text);
            }
        }
        _ => {}
    }
}

/// Full-screen notice shown instead of the chat when startup configuration
/// is unusable. Any key dismisses it.
pub fn run_config_error_screen(detail: &str) -> Result<(), Box<dyn Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    loop {
        terminal.draw(|f| {
            let lines = vec![
                Line::from(Span::styled(
                    "Configuration Error",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                )),
                Line::default(),
                Line::from(detail.to_string()),
                Line::default(),
                Line::from(
                    "Set the GEMINI_API_KEY environment variable to your Google AI Studio \
                     key and restart.",
                ),
                Line::default(),
                Line::from(Span::styled(
                    "Press any key to exit.",
                    Style::default().add_modifier(Modifier::DIM),
                )),
            ];
            f.render_widget(
                Paragraph::new(lines).wrap(Wrap { trim: false }),
                f.area().inner(Margin::new(2, 1)),
            );
        })?;
        if event::poll(Duration::from_millis(200))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    break;
                }
            }
        }
    }

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
