mod registry;

pub use registry::{all_commands, CommandInvocation};

use crate::core::app::{App, View};
use crate::core::preferences::{AgeGroup, BOT_NAME_SUGGESTIONS};
use crate::ui::builtin_themes::load_builtin_themes;

pub enum CommandResult {
    Continue,
    ProcessAsMessage(String),
    Quit,
}

/// Sent on the user's behalf by `/suggest`.
pub const ACTIVITY_PROMPT: &str = "I'm looking for something to do right now. Based on our recent conversation and how I might be feeling, could you suggest a personalized activity for me?";

pub fn process_input(app: &mut App, input: &str) -> CommandResult {
    let trimmed = input.trim();

    if !trimmed.starts_with('/') {
        return CommandResult::ProcessAsMessage(input.to_string());
    }

    let mut parts = trimmed[1..].splitn(2, ' ');
    let command_name = match parts.next() {
        Some(name) if !name.is_empty() => name,
        _ => return CommandResult::ProcessAsMessage(input.to_string()),
    };
    let args = parts.next().unwrap_or("").trim();

    if let Some(command) = registry::find_command(command_name) {
        (command.handler)(app, CommandInvocation { args })
    } else {
        app.set_status(format!(
            "Unknown command: /{command_name}. Type /help for a list."
        ));
        CommandResult::Continue
    }
}

pub(super) fn handle_help(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    app.view = View::Help;
    CommandResult::Continue
}

pub(super) fn handle_new(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    app.create_session();
    app.view = View::Chat;
    app.set_status("Started a new chat.");
    CommandResult::Continue
}

pub(super) fn handle_sessions(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    let active_id = app.sessions.active_id().to_string();
    app.session_cursor = app
        .sessions
        .sessions()
        .iter()
        .position(|s| s.id == active_id)
        .unwrap_or(0);
    app.view = View::Sessions;
    CommandResult::Continue
}

pub(super) fn handle_delete(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    let active_id = app.sessions.active_id().to_string();
    app.delete_session(&active_id);
    app.set_status("Chat deleted.");
    CommandResult::Continue
}

pub(super) fn handle_clear(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    app.clear_all_sessions();
    app.set_status("All chats cleared.");
    CommandResult::Continue
}

pub(super) fn handle_mood(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    app.mood_cursor = 0;
    app.view = View::MoodPicker;
    CommandResult::Continue
}

pub(super) fn handle_journal(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    app.journal_cursor = 0;
    app.view = View::Journal;
    CommandResult::Continue
}

pub(super) fn handle_suggest(_app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    CommandResult::ProcessAsMessage(ACTIVITY_PROMPT.to_string())
}

pub(super) fn handle_theme(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        let names: Vec<String> = load_builtin_themes().into_iter().map(|t| t.id).collect();
        app.set_status(format!(
            "Usage: /theme <name>. Available: {}",
            names.join(", ")
        ));
        return CommandResult::Continue;
    }

    if app.set_theme(invocation.args) {
        app.set_status(format!("Theme set: {}", invocation.args.to_ascii_lowercase()));
    } else {
        app.set_status(format!("Unknown theme: {}", invocation.args));
    }
    CommandResult::Continue
}

pub(super) fn handle_background(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        app.set_status("Usage: /background <color> or /background clear");
        return CommandResult::Continue;
    }

    if invocation.args.eq_ignore_ascii_case("clear") {
        app.set_custom_background(None);
        app.set_status("Custom background cleared.");
    } else if app.set_custom_background(Some(invocation.args)) {
        app.set_status(format!("Background set: {}", invocation.args));
    } else {
        app.set_status(format!(
            "Could not parse color: {}. Try #rrggbb, rgb(r,g,b), or a color name.",
            invocation.args
        ));
    }
    CommandResult::Continue
}

pub(super) fn handle_botname(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        app.set_status(format!(
            "Usage: /botname <name>. Suggestions: {}",
            BOT_NAME_SUGGESTIONS.join(", ")
        ));
        return CommandResult::Continue;
    }

    if app.set_bot_name(invocation.args) {
        app.set_status(format!("Your companion is now called {}.", app.prefs.bot_name));
    }
    CommandResult::Continue
}

pub(super) fn handle_agegroup(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        let options: Vec<&str> = AgeGroup::ALL.iter().map(|g| g.as_str()).collect();
        app.set_status(format!(
            "Usage: /agegroup <{}>. Current: {}",
            options.join("|"),
            app.prefs.age_group.label()
        ));
        return CommandResult::Continue;
    }

    match AgeGroup::parse(invocation.args) {
        Some(group) => {
            app.set_age_group(group);
            app.set_status(format!("Age group set: {}", group.label()));
        }
        None => {
            app.set_status(format!("Unknown age group: {}", invocation.args));
        }
    }
    CommandResult::Continue
}

pub(super) fn handle_quit(_app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    CommandResult::Quit
}
