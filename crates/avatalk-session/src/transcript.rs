//! Rendered chat log.

use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptEntry {
    pub id: Uuid,
    pub speaker: Speaker,
    pub text: String,
    /// Placeholder shown while waiting for the first reply fragment.
    pub thinking: bool,
}

/// What the user sees, as opposed to the history sent to the model.
///
/// Notices and failed turns appear here but never in the history.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn push(&mut self, speaker: Speaker, text: impl Into<String>, thinking: bool) -> TranscriptEntry {
        let entry = TranscriptEntry {
            id: Uuid::new_v4(),
            speaker,
            text: text.into(),
            thinking,
        };
        self.entries.push(entry.clone());
        entry
    }

    /// Replaces an entry's text and clears its thinking flag.
    pub fn update(&mut self, id: Uuid, text: impl Into<String>) -> Option<TranscriptEntry> {
        let entry = self.entries.iter_mut().find(|e| e.id == id)?;
        entry.text = text.into();
        entry.thinking = false;
        Some(entry.clone())
    }

    pub fn get(&self, id: Uuid) -> Option<&TranscriptEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }
}
