//! Confidant is a terminal-first wellness companion backed by the Gemini API.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns runtime state: chat sessions, wellbeing data, preferences,
//!   the persistent store, and streaming orchestration.
//! - [`ui`] renders the terminal interface and runs the interactive event loop
//!   that drives user input and display updates.
//! - [`commands`] implements slash-command parsing and command execution used
//!   by the chat loop.
//! - [`api`] defines the Gemini request/response payloads used by the
//!   streaming client and title generation.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which initializes and dispatches into
//! [`core::app`] and [`ui::chat_loop`] for interactive sessions.

pub mod api;
pub mod cli;
pub mod commands;
pub mod core;
pub mod ui;
pub mod utils;
