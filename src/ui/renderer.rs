//! Frame rendering for every view. The transcript is wrapped by hand so the
//! scroll position can be derived from real line counts instead of the
//! widget's internal wrapping.

use crate::commands::all_commands;
use crate::core::app::{App, View};
use crate::core::preferences::BOT_NAME_SUGGESTIONS;
use crate::core::session::{Message, Role};
use crate::core::wellbeing::Mood;
use chrono::Local;
use ratatui::layout::{Constraint, Direction, Layout, Margin, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};
use ratatui::Frame;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub fn ui(f: &mut Frame, app: &mut App) {
    let area = f.area();
    f.render_widget(
        Block::default().style(Style::default().bg(app.theme.background_color)),
        area,
    );

    match app.view {
        View::Welcome => draw_welcome(f, app, area),
        View::Chat => draw_chat(f, app, area),
        View::Sessions => {
            draw_chat(f, app, area);
            draw_session_picker(f, app, area);
        }
        View::MoodPicker => {
            draw_chat(f, app, area);
            draw_mood_picker(f, app, area);
        }
        View::MoodNote(mood) => {
            draw_chat(f, app, area);
            draw_mood_note(f, app, area, mood);
        }
        View::Journal => draw_journal(f, app, area),
        View::JournalEditor => draw_journal_editor(f, app, area),
        View::Help => {
            draw_chat(f, app, area);
            draw_help(f, app, area);
        }
    }
}

fn draw_chat(f: &mut Frame, app: &mut App, area: Rect) {
    let input_height = (app.input.lines().len().clamp(1, 6) as u16) + 2;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(input_height),
        ])
        .split(area);

    draw_chat_header(f, app, chunks[0]);
    draw_transcript(f, app, chunks[1]);
    let notice = app.status.as_deref().unwrap_or("/help for commands");
    let line = Line::from(Span::styled(notice.to_string(), app.theme.muted_style));
    f.render_widget(Paragraph::new(line), chunks[2].inner(Margin::new(1, 0)));

    app.input.set_style(app.theme.text_style);
    app.input.set_placeholder_style(app.theme.muted_style);
    app.input.set_cursor_style(app.theme.input_cursor_style);
    app.input.set_block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(app.theme.input_border_style)
            .style(Style::default().bg(app.theme.surface_color)),
    );
    f.render_widget(&app.input, chunks[3]);
}

fn draw_chat_header(f: &mut Frame, app: &App, area: Rect) {
    let session = app.sessions.active();
    let header = Line::from(vec![
        Span::styled(app.prefs.bot_name.clone(), app.theme.accent_style),
        Span::styled(
            format!("  {}", session.name),
            app.theme.text_style,
        ),
        Span::styled(
            format!("  [{}]", app.config.effective_model()),
            app.theme.muted_style,
        ),
    ]);
    f.render_widget(Paragraph::new(header), area.inner(Margin::new(1, 0)));
}

fn draw_transcript(f: &mut Frame, app: &mut App, area: Rect) {
    let inner = area.inner(Margin::new(1, 0));
    let width = inner.width.max(1) as usize;

    let lines = transcript_lines(app, width);
    let height = inner.height as usize;
    let max_scroll = lines.len().saturating_sub(height);
    if (app.scroll_offset as usize) > max_scroll {
        app.scroll_offset = max_scroll as u16;
    }
    let from_top = (max_scroll - app.scroll_offset as usize).min(u16::MAX as usize) as u16;

    f.render_widget(Paragraph::new(lines).scroll((from_top, 0)), inner);
}

fn transcript_lines(app: &App, width: usize) -> Vec<Line<'static>> {
    let session = app.sessions.active();
    let theme = &app.theme;

    if session.messages.is_empty() && !app.is_streaming(&session.id) {
        let mut lines = vec![
            Line::default(),
            Line::from(Span::styled(
                format!("Hello! I'm {}.", app.prefs.bot_name),
                theme.accent_style,
            )),
            Line::default(),
        ];
        for text in wrap_text(
            "How are you feeling today? You can talk to me about anything, \
             log your mood with /mood, or ask for a personalized activity \
             suggestion with /suggest.",
            width,
        ) {
            lines.push(Line::from(Span::styled(text, theme.text_style)));
        }
        lines.push(Line::default());
        for text in wrap_text(
            "This is a safe and private space for you. Feel free to share \
             your thoughts, explore your feelings, or just chat about your \
             day. I'm here to listen without judgment.",
            width,
        ) {
            lines.push(Line::from(Span::styled(text, theme.muted_style)));
        }
        return lines;
    }

    let mut lines = Vec::new();
    for message in &session.messages {
        lines.push(message_label(app, message));
        let bubble = match message.role {
            Role::User => theme.user_bubble_style,
            Role::Model => theme.model_bubble_style,
        };
        for text in wrap_text(&message.text, width) {
            lines.push(Line::from(Span::styled(text, bubble)));
        }
        for (index, source) in message.sources.iter().enumerate() {
            let entry = format!("  {}. {} ({})", index + 1, source.title, source.uri);
            for text in wrap_text(&entry, width) {
                lines.push(Line::from(Span::styled(text, theme.muted_style)));
            }
        }
        lines.push(Line::default());
    }

    if app.is_streaming(&session.id) {
        lines.push(Line::from(Span::styled(
            format!("{} is typing...", app.prefs.bot_name),
            theme.muted_style.add_modifier(Modifier::ITALIC),
        )));
    }
    lines
}

fn message_label(app: &App, message: &Message) -> Line<'static> {
    let name = match message.role {
        Role::User => "You".to_string(),
        Role::Model => app.prefs.bot_name.clone(),
    };
    let stamp = message
        .timestamp
        .with_timezone(&Local)
        .format("%H:%M")
        .to_string();
    Line::from(vec![
        Span::styled(name, app.theme.accent_style),
        Span::styled(format!("  {stamp}"), app.theme.muted_style),
    ])
}

fn draw_welcome(f: &mut Frame, app: &mut App, area: Rect) {
    let panel = centered_rect(70, 80, area);
    f.render_widget(Clear, panel);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.input_border_style)
        .title(Span::styled("Welcome!", app.theme.accent_style))
        .style(Style::default().bg(app.theme.surface_color));
    let body = block.inner(panel);
    f.render_widget(block, panel);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .split(body.inner(Margin::new(1, 0)));

    let mut intro = Vec::new();
    for text in wrap_text(
        "I'm your personal AI mental health companion. To get started, \
         please give me a name.",
        chunks[0].width.max(1) as usize,
    ) {
        intro.push(Line::from(Span::styled(text, app.theme.text_style)));
    }
    f.render_widget(Paragraph::new(intro), chunks[0]);

    let items: Vec<ListItem> = BOT_NAME_SUGGESTIONS
        .iter()
        .map(|name| ListItem::new(Line::from(Span::styled(name.to_string(), app.theme.text_style))))
        .collect();
    let list = List::new(items).highlight_style(app.theme.selection_style);
    let mut state = ListState::default();
    state.select(Some(app.welcome_cursor.min(BOT_NAME_SUGGESTIONS.len() - 1)));
    f.render_stateful_widget(list, chunks[1], &mut state);

    f.render_widget(
        Paragraph::new(Line::from(Span::styled(
            "Or type a name and press Enter:",
            app.theme.muted_style,
        ))),
        chunks[2],
    );

    // The label above the box already says what to type.
    app.input.set_placeholder_text("");
    app.input.set_style(app.theme.text_style);
    app.input.set_cursor_style(app.theme.input_cursor_style);
    app.input.set_block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(app.theme.input_border_style),
    );
    f.render_widget(&app.input, chunks[3]);
}

fn draw_session_picker(f: &mut Frame, app: &App, area: Rect) {
    let panel = centered_rect(70, 60, area);
    f.render_widget(Clear, panel);
    let block = overlay_block(app, "Chats");
    let body = block.inner(panel);
    f.render_widget(block, panel);

    let chunks = split_list_and_hint(body);
    let items: Vec<ListItem> = app
        .sessions
        .sessions()
        .iter()
        .map(|session| {
            let stamp = session
                .created_at
                .with_timezone(&Local)
                .format("%b %d")
                .to_string();
            let label = format!(
                "{}  ({} messages, {})",
                session.name,
                session.messages.len(),
                stamp
            );
            ListItem::new(Line::from(Span::styled(label, app.theme.text_style)))
        })
        .collect();
    let count = items.len();
    let list = List::new(items).highlight_style(app.theme.selection_style);
    let mut state = ListState::default();
    state.select(Some(app.session_cursor.min(count.saturating_sub(1))));
    f.render_stateful_widget(list, chunks[0], &mut state);

    draw_hint(f, app, chunks[1], "Enter switch | n new | d delete | Esc close");
}

fn draw_mood_picker(f: &mut Frame, app: &App, area: Rect) {
    let panel = centered_rect(50, 50, area);
    f.render_widget(Clear, panel);
    let block = overlay_block(app, "How are you feeling?");
    let body = block.inner(panel);
    f.render_widget(block, panel);

    let chunks = split_list_and_hint(body);
    let items: Vec<ListItem> = Mood::ALL
        .iter()
        .map(|mood| {
            let label = format!("{}  {}", mood.emoji(), mood.label());
            ListItem::new(Line::from(Span::styled(label, app.theme.text_style)))
        })
        .collect();
    let list = List::new(items).highlight_style(app.theme.selection_style);
    let mut state = ListState::default();
    state.select(Some(app.mood_cursor.min(Mood::ALL.len() - 1)));
    f.render_stateful_widget(list, chunks[0], &mut state);

    draw_hint(f, app, chunks[1], "Enter pick | Esc close");
}

fn draw_mood_note(f: &mut Frame, app: &mut App, area: Rect, mood: Mood) {
    let panel = centered_rect(60, 30, area);
    f.render_widget(Clear, panel);
    let title = format!("Feeling {} {}", mood.label().to_lowercase(), mood.emoji());
    let block = overlay_block(app, &title);
    let body = block.inner(panel);
    f.render_widget(block, panel);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(body.inner(Margin::new(1, 0)));

    f.render_widget(
        Paragraph::new(Line::from(Span::styled(
            "Add a note if you like:",
            app.theme.text_style,
        ))),
        chunks[0],
    );

    app.mood_note.set_style(app.theme.text_style);
    app.mood_note.set_placeholder_style(app.theme.muted_style);
    app.mood_note.set_cursor_style(app.theme.input_cursor_style);
    app.mood_note.set_block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(app.theme.input_border_style),
    );
    f.render_widget(&app.mood_note, chunks[1]);

    let hint = app.status.as_deref().unwrap_or("Enter log | Esc back");
    draw_hint(f, app, chunks[2], hint);
}

fn draw_journal(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    f.render_widget(
        Paragraph::new(Line::from(Span::styled("Journal", app.theme.accent_style))),
        chunks[0].inner(Margin::new(1, 0)),
    );

    let entries = app.wellbeing.journal();
    if entries.is_empty() {
        f.render_widget(
            Paragraph::new(Line::from(Span::styled(
                "No journal entries yet. Press n to write one.",
                app.theme.muted_style,
            ))),
            chunks[1].inner(Margin::new(1, 1)),
        );
    } else {
        let items: Vec<ListItem> = entries
            .iter()
            .map(|entry| {
                let stamp = entry
                    .timestamp
                    .with_timezone(&Local)
                    .format("%b %d, %H:%M")
                    .to_string();
                ListItem::new(Line::from(vec![
                    Span::styled(entry.title.clone(), app.theme.text_style),
                    Span::styled(format!("  {stamp}"), app.theme.muted_style),
                ]))
            })
            .collect();
        let list = List::new(items).highlight_style(app.theme.selection_style);
        let mut state = ListState::default();
        state.select(Some(app.journal_cursor.min(entries.len() - 1)));
        f.render_stateful_widget(list, chunks[1].inner(Margin::new(1, 0)), &mut state);
    }

    let hint = app
        .status
        .as_deref()
        .unwrap_or("n new | Enter open | d delete | Esc back");
    draw_hint(f, app, chunks[2].inner(Margin::new(1, 0)), hint);
}

fn draw_journal_editor(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

    let theme = app.theme.clone();
    let Some(editor) = app.journal_editor.as_mut() else {
        return;
    };

    let focused = theme.accent_style;
    let blurred = theme.input_border_style;

    editor.title.set_style(theme.text_style);
    editor.title.set_placeholder_style(theme.muted_style);
    editor.title.set_cursor_style(if editor.editing_title {
        theme.input_cursor_style
    } else {
        Style::default()
    });
    editor.title.set_block(
        Block::default()
            .borders(Borders::ALL)
            .title("Title")
            .border_style(if editor.editing_title { focused } else { blurred }),
    );
    f.render_widget(&editor.title, chunks[0]);

    editor.content.set_style(theme.text_style);
    editor.content.set_placeholder_style(theme.muted_style);
    editor.content.set_cursor_style(if editor.editing_title {
        Style::default()
    } else {
        theme.input_cursor_style
    });
    editor.content.set_block(
        Block::default()
            .borders(Borders::ALL)
            .title("Entry")
            .border_style(if editor.editing_title { blurred } else { focused }),
    );
    f.render_widget(&editor.content, chunks[1]);

    let hint = app
        .status
        .as_deref()
        .unwrap_or("Tab switch field | Ctrl+S save | Esc cancel");
    draw_hint(f, app, chunks[2].inner(Margin::new(1, 0)), hint);
}

fn draw_help(f: &mut Frame, app: &App, area: Rect) {
    let panel = centered_rect(70, 80, area);
    f.render_widget(Clear, panel);
    let block = overlay_block(app, "Help");
    let body = block.inner(panel);
    f.render_widget(block, panel);

    let mut lines = Vec::new();
    for command in all_commands() {
        lines.push(Line::from(vec![
            Span::styled(format!("/{:<12}", command.name), app.theme.accent_style),
            Span::styled(command.help.to_string(), app.theme.text_style),
        ]));
    }
    lines.push(Line::default());
    for hint in [
        "Enter sends, Alt+Enter inserts a newline.",
        "Esc stops the reply that is being written.",
        "PageUp and PageDown scroll the conversation.",
        "Ctrl+C quits.",
    ] {
        lines.push(Line::from(Span::styled(hint, app.theme.muted_style)));
    }

    f.render_widget(Paragraph::new(lines), body.inner(Margin::new(1, 0)));
}

fn overlay_block<'a>(app: &App, title: &'a str) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.input_border_style)
        .title(Span::styled(title, app.theme.accent_style))
        .style(Style::default().bg(app.theme.surface_color))
}

fn split_list_and_hint(body: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(body.inner(Margin::new(1, 0)))
}

fn draw_hint(f: &mut Frame, app: &App, area: Rect, hint: &str) {
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(
            hint.to_string(),
            app.theme.muted_style,
        ))),
        area,
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);
    horizontal[1]
}

/// Word-wrap `text` to `width` terminal columns. Words wider than a full
/// line are split mid-word; embedded newlines are kept.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    for raw_line in text.split('\n') {
        let mut current = String::new();
        let mut current_width = 0usize;
        for word in raw_line.split(' ') {
            let word_width = word.width();
            if current_width > 0 {
                if current_width + 1 + word_width <= width {
                    current.push(' ');
                    current_width += 1;
                } else {
                    lines.push(std::mem::take(&mut current));
                    current_width = 0;
                }
            }
            if word_width <= width {
                current.push_str(word);
                current_width += word_width;
            } else {
                push_split_word(word, width, &mut lines, &mut current, &mut current_width);
            }
        }
        lines.push(current);
    }
    lines
}

fn push_split_word(
    word: &str,
    width: usize,
    lines: &mut Vec<String>,
    current: &mut String,
    current_width: &mut usize,
) {
    for ch in word.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if *current_width + ch_width > width && *current_width > 0 {
            lines.push(std::mem::take(current));
            *current_width = 0;
        }
        current.push(ch);
        *current_width += ch_width;
    }
}
