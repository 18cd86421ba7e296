use super::CommandResult;
use crate::core::app::App;

pub type CommandHandler = fn(&mut App, CommandInvocation<'_>) -> CommandResult;

pub struct Command {
    pub name: &'static str,
    pub help: &'static str,
    pub handler: CommandHandler,
}

#[derive(Clone, Copy)]
pub struct CommandInvocation<'a> {
    pub args: &'a str,
}

pub fn all_commands() -> &'static [Command] {
    COMMANDS
}

pub fn find_command(name: &str) -> Option<&'static Command> {
    all_commands()
        .iter()
        .find(|command| command.name.eq_ignore_ascii_case(name))
}

const COMMANDS: &[Command] = &[
    Command {
        name: "help",
        help: "Show available commands and keys.",
        handler: super::handle_help,
    },
    Command {
        name: "new",
        help: "Start a new chat session.",
        handler: super::handle_new,
    },
    Command {
        name: "sessions",
        help: "Open the session picker.",
        handler: super::handle_sessions,
    },
    Command {
        name: "delete",
        help: "Delete the current chat session.",
        handler: super::handle_delete,
    },
    Command {
        name: "clear",
        help: "Delete every chat session.",
        handler: super::handle_clear,
    },
    Command {
        name: "mood",
        help: "Log how you are feeling right now.",
        handler: super::handle_mood,
    },
    Command {
        name: "journal",
        help: "Open your journal.",
        handler: super::handle_journal,
    },
    Command {
        name: "suggest",
        help: "Ask for a personalized activity suggestion.",
        handler: super::handle_suggest,
    },
    Command {
        name: "theme",
        help: "Switch the color theme.",
        handler: super::handle_theme,
    },
    Command {
        name: "background",
        help: "Override the background color, or clear the override.",
        handler: super::handle_background,
    },
    Command {
        name: "botname",
        help: "Rename your companion.",
        handler: super::handle_botname,
    },
    Command {
        name: "agegroup",
        help: "Tune the companion's persona to an age group.",
        handler: super::handle_agegroup,
    },
    Command {
        name: "quit",
        help: "Exit the app.",
        handler: super::handle_quit,
    },
];
