//! Mood log and journal, independent of chat sessions.
//!
//! Both collections are newest-first. Logging a mood yields the synthetic
//! chat text the controller routes through the ordinary send pipeline, so a
//! logged mood always provokes a model response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Mood {
    Happy,
    Excited,
    Calm,
    Sad,
    Anxious,
}

impl Mood {
    /// Picker display order.
    pub const ALL: [Mood; 5] = [
        Mood::Happy,
        Mood::Excited,
        Mood::Calm,
        Mood::Sad,
        Mood::Anxious,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Excited => "excited",
            Mood::Calm => "calm",
            Mood::Sad => "sad",
            Mood::Anxious => "anxious",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mood::Happy => "Happy",
            Mood::Excited => "Excited",
            Mood::Calm => "Calm",
            Mood::Sad => "Sad",
            Mood::Anxious => "Anxious",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Mood::Happy => "😊",
            Mood::Excited => "🤩",
            Mood::Calm => "😌",
            Mood::Sad => "😢",
            Mood::Anxious => "😟",
        }
    }
}

impl TryFrom<&str> for Mood {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "happy" => Ok(Mood::Happy),
            "excited" => Ok(Mood::Excited),
            "calm" => Ok(Mood::Calm),
            "sad" => Ok(Mood::Sad),
            "anxious" => Ok(Mood::Anxious),
            _ => Err(format!("invalid mood: {value}")),
        }
    }
}

impl TryFrom<String> for Mood {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<Mood> for String {
    fn from(value: Mood) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodEntry {
    pub id: String,
    pub mood: Mood,
    #[serde(default)]
    pub note: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: String,
    pub title: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct WellbeingLog {
    moods: Vec<MoodEntry>,
    journal: Vec<JournalEntry>,
}

impl WellbeingLog {
    pub fn from_parts(moods: Vec<MoodEntry>, journal: Vec<JournalEntry>) -> Self {
        Self { moods, journal }
    }

    /// Newest first.
    pub fn moods(&self) -> &[MoodEntry] {
        &self.moods
    }

    /// Newest first, except that edits update entries in place.
    pub fn journal(&self) -> &[JournalEntry] {
        &self.journal
    }

    pub fn journal_entry(&self, id: &str) -> Option<&JournalEntry> {
        self.journal.iter().find(|e| e.id == id)
    }

    /// Prepend a mood entry and return the first-person chat text describing
    /// it.
    pub fn log_mood(&mut self, mood: Mood, note: &str) -> String {
        self.moods.insert(
            0,
            MoodEntry {
                id: Uuid::new_v4().to_string(),
                mood,
                note: note.to_string(),
                timestamp: Utc::now(),
            },
        );
        mood_chat_text(mood, note)
    }

    /// Save a journal entry. A title that is empty after trimming is a no-op
    /// and returns false. A matching `id` updates title, content, and
    /// timestamp in place; otherwise a fresh entry is prepended.
    pub fn save_journal_entry(&mut self, id: Option<&str>, title: &str, content: &str) -> bool {
        if title.trim().is_empty() {
            return false;
        }
        if let Some(existing) = id.and_then(|id| self.journal.iter_mut().find(|e| e.id == id)) {
            existing.title = title.to_string();
            existing.content = content.to_string();
            existing.timestamp = Utc::now();
            return true;
        }
        self.journal.insert(
            0,
            JournalEntry {
                id: Uuid::new_v4().to_string(),
                title: title.to_string(),
                content: content.to_string(),
                timestamp: Utc::now(),
            },
        );
        true
    }

    /// Remove by id; unknown ids are a quiet no-op.
    pub fn delete_journal_entry(&mut self, id: &str) {
        self.journal.retain(|e| e.id != id);
    }
}

fn mood_chat_text(mood: Mood, note: &str) -> String {
    if note.trim().is_empty() {
        format!("I just logged my mood as {}.", mood.as_str())
    } else {
        format!(
            "I just logged my mood as {}. My thoughts: \"{}\"",
            mood.as_str(),
            note
        )
    }
}
