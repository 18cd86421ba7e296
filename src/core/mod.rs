//! Core application state and orchestration.

pub mod app;
pub mod chat_stream;
pub mod config;
pub mod conversation;
pub mod persona;
pub mod preferences;
pub mod session;
pub mod store;
pub mod title;
pub mod wellbeing;
