//! File-backed store for chat history and companion preferences.
//!
//! Every piece of state lives in its own small file under the platform data
//! directory (e.g. `~/.local/share/confidant` on Linux). Reads are forgiving:
//! a missing or unreadable entry yields the default so the app always starts.
//! Writes go through a temp file in the same directory and are persisted
//! atomically, so a crash mid-write never truncates history.

use crate::core::config::path_display;
use crate::core::preferences::{AgeGroup, Preferences};
use crate::core::session::ChatSession;
use crate::core::wellbeing::{JournalEntry, MoodEntry, WellbeingLog};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const SESSIONS_FILE: &str = "sessions.json";
const ACTIVE_SESSION_FILE: &str = "active-session.txt";
const BOT_NAME_FILE: &str = "bot-name.txt";
const THEME_FILE: &str = "theme.txt";
const CUSTOM_BACKGROUND_FILE: &str = "custom-background.txt";
const AGE_GROUP_FILE: &str = "age-group.txt";
const MOOD_HISTORY_FILE: &str = "mood-history.json";
const JOURNAL_ENTRIES_FILE: &str = "journal-entries.json";
const LOG_FILE: &str = "confidant.log";

/// Errors that can occur when writing store entries to disk.
///
/// Reads never produce these: a load that fails falls back to the default
/// value instead, so stale or corrupt state cannot keep the app from starting.
#[derive(Debug)]
pub enum StoreError {
    /// The platform data directory could not be determined.
    Resolve,

    /// Failed to create the data directory.
    Create {
        /// Directory that could not be created.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to write a store entry to disk.
    Write {
        /// Path to the entry that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to serialize a store entry as JSON.
    Serialize {
        /// Path to the entry being written.
        path: PathBuf,
        /// The JSON serialization error.
        source: serde_json::Error,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Resolve => {
                write!(f, "Could not determine a data directory for this platform")
            }
            StoreError::Create { path, source } => {
                write!(
                    f,
                    "Failed to create data directory {}: {}",
                    path_display(path),
                    source
                )
            }
            StoreError::Write { path, source } => {
                write!(f, "Failed to write {}: {}", path_display(path), source)
            }
            StoreError::Serialize { path, source } => {
                write!(f, "Failed to encode {}: {}", path_display(path), source)
            }
        }
    }
}

impl StdError for StoreError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            StoreError::Resolve => None,
            StoreError::Create { source, .. } => Some(source),
            StoreError::Write { source, .. } => Some(source),
            StoreError::Serialize { source, .. } => Some(source),
        }
    }
}

/// Handle on the on-disk state directory.
pub struct Store {
    dir: PathBuf,
}

impl Store {
    /// Open the store in the platform data directory, creating it if needed.
    pub fn open() -> Result<Self, StoreError> {
        let proj_dirs =
            ProjectDirs::from("org", "permacommons", "confidant").ok_or(StoreError::Resolve)?;
        let dir = proj_dirs.data_dir().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Create {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// Open the store rooted at an explicit directory.
    pub fn at<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the debug log goes when logging is enabled.
    pub fn log_path(&self) -> PathBuf {
        self.dir.join(LOG_FILE)
    }

    pub fn load_sessions(&self) -> Vec<ChatSession> {
        self.load_json(SESSIONS_FILE)
    }

    pub fn save_sessions(&self, sessions: &[ChatSession]) -> Result<(), StoreError> {
        self.write_json(SESSIONS_FILE, &sessions)
    }

    pub fn load_active_session(&self) -> Option<String> {
        self.read_text(ACTIVE_SESSION_FILE)
    }

    pub fn save_active_session(&self, id: &str) -> Result<(), StoreError> {
        self.write_text(ACTIVE_SESSION_FILE, id)
    }

    /// Assemble preferences from their individual entries.
    ///
    /// An age group entry that no longer parses is treated as unset rather
    /// than discarded silently.
    pub fn load_preferences(&self) -> Preferences {
        let mut prefs = Preferences::default();
        if let Some(name) = self.read_text(BOT_NAME_FILE) {
            prefs.bot_name = name;
        }
        if let Some(theme) = self.read_text(THEME_FILE) {
            prefs.theme = theme;
        }
        prefs.custom_background = self.read_text(CUSTOM_BACKGROUND_FILE);
        if let Some(raw) = self.read_text(AGE_GROUP_FILE) {
            match AgeGroup::parse(&raw) {
                Some(group) => prefs.age_group = group,
                None => {
                    tracing::warn!(value = %raw, "ignoring unrecognized age group entry");
                }
            }
        }
        prefs
    }

    /// Whether a bot name was ever chosen. Drives the first-run naming
    /// screen, which the bare preference default cannot.
    pub fn has_bot_name(&self) -> bool {
        self.read_text(BOT_NAME_FILE).is_some()
    }

    pub fn save_bot_name(&self, name: &str) -> Result<(), StoreError> {
        self.write_text(BOT_NAME_FILE, name)
    }

    pub fn save_theme(&self, theme: &str) -> Result<(), StoreError> {
        self.write_text(THEME_FILE, theme)
    }

    /// `None` clears the override so the theme background shows through again.
    pub fn save_custom_background(&self, background: Option<&str>) -> Result<(), StoreError> {
        match background {
            Some(spec) => self.write_text(CUSTOM_BACKGROUND_FILE, spec),
            None => self.remove_entry(CUSTOM_BACKGROUND_FILE),
        }
    }

    pub fn save_age_group(&self, group: AgeGroup) -> Result<(), StoreError> {
        self.write_text(AGE_GROUP_FILE, group.as_str())
    }

    pub fn load_wellbeing(&self) -> WellbeingLog {
        WellbeingLog::from_parts(
            self.load_json(MOOD_HISTORY_FILE),
            self.load_json(JOURNAL_ENTRIES_FILE),
        )
    }

    pub fn save_moods(&self, moods: &[MoodEntry]) -> Result<(), StoreError> {
        self.write_json(MOOD_HISTORY_FILE, &moods)
    }

    pub fn save_journal(&self, entries: &[JournalEntry]) -> Result<(), StoreError> {
        self.write_json(JOURNAL_ENTRIES_FILE, &entries)
    }

    fn entry_path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    fn read_text(&self, name: &str) -> Option<String> {
        let path = self.entry_path(name);
        if !path.exists() {
            return None;
        }
        match fs::read_to_string(&path) {
            Ok(contents) => {
                let trimmed = contents.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            Err(err) => {
                tracing::warn!(path = %path_display(&path), error = %err, "failed to read store entry");
                None
            }
        }
    }

    fn load_json<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        let path = self.entry_path(name);
        if !path.exists() {
            return T::default();
        }
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) => {
                tracing::warn!(path = %path_display(&path), error = %err, "failed to read store entry");
                return T::default();
            }
        };
        match serde_json::from_str(&contents) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(path = %path_display(&path), error = %err, "failed to parse store entry");
                T::default()
            }
        }
    }

    fn write_text(&self, name: &str, value: &str) -> Result<(), StoreError> {
        self.write_entry(name, value.as_bytes())
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<(), StoreError> {
        let contents =
            serde_json::to_string_pretty(value).map_err(|source| StoreError::Serialize {
                path: self.entry_path(name),
                source,
            })?;
        self.write_entry(name, contents.as_bytes())
    }

    fn write_entry(&self, name: &str, contents: &[u8]) -> Result<(), StoreError> {
        let path = self.entry_path(name);
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Create {
            path: self.dir.clone(),
            source,
        })?;

        let write_err = |source: std::io::Error| StoreError::Write {
            path: path.clone(),
            source,
        };

        let mut temp_file = NamedTempFile::new_in(&self.dir).map_err(write_err)?;
        temp_file.write_all(contents).map_err(write_err)?;
        temp_file.as_file_mut().sync_all().map_err(write_err)?;
        temp_file.persist(&path).map_err(|err| write_err(err.error))?;
        Ok(())
    }

    fn remove_entry(&self, name: &str) -> Result<(), StoreError> {
        let path = self.entry_path(name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Write { path, source }),
        }
    }
}
