//! Mood journal with trend data and cached model insights

use crate::client::{ModelClient, ModelRequest, RetryPolicy};
use crate::store::{namespaces, JournalEntry, StateStore};
use crate::{Result, SolaceError};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

const INSIGHTS_INSTRUCTION: &str =
    "You are an empathetic, professional wellbeing analyst.";

/// Entries needed before an analysis is meaningful
const MIN_ENTRIES_FOR_ANALYSIS: usize = 3;

pub struct MoodJournal {
    store: Arc<StateStore>,
    entries: Vec<JournalEntry>,
    insights: Option<String>,
}

impl MoodJournal {
    /// Load the persisted journal and the cached insights text
    pub fn load(store: Arc<StateStore>) -> Self {
        let entries = store
            .read::<Vec<JournalEntry>>(namespaces::JOURNAL)
            .unwrap_or_else(|e| {
                warn!("could not load journal: {}", e);
                None
            })
            .unwrap_or_default();
        let insights = store
            .read::<String>(namespaces::INSIGHTS)
            .unwrap_or_default();
        Self {
            store,
            entries,
            insights,
        }
    }

    /// Most-recent-first entries
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Append a new entry; the note must not be blank
    pub fn add(&mut self, mood: impl Into<String>, note: impl Into<String>) -> Result<&JournalEntry> {
        let note = note.into();
        if note.trim().is_empty() {
            return Err(SolaceError::ValidationError(
                "journal note is empty".to_string(),
            ));
        }

        self.entries.insert(0, JournalEntry::new(mood, note));
        self.store.write(namespaces::JOURNAL, &self.entries)?;
        Ok(&self.entries[0])
    }

    /// Remove an entry by id; unknown ids are a no-op
    pub fn delete(&mut self, id: Uuid) -> Result<bool> {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        if self.entries.len() == before {
            return Ok(false);
        }
        self.store.write(namespaces::JOURNAL, &self.entries)?;
        Ok(true)
    }

    /// Chronological (oldest first) mood scores for trend charting
    pub fn trend(&self) -> Vec<(DateTime<Utc>, u8)> {
        let mut points: Vec<(DateTime<Utc>, u8)> = self
            .entries
            .iter()
            .map(|e| (e.date, mood_score(&e.mood)))
            .collect();
        points.sort_by_key(|(date, _)| *date);
        points
    }

    /// Ask the model for high-level insights across all entries and cache
    /// the result. Requires a few entries to be worth the call.
    pub fn analyze(&mut self, model: &dyn ModelClient, retry: &RetryPolicy) -> Result<&str> {
        if self.entries.len() < MIN_ENTRIES_FOR_ANALYSIS {
            return Err(SolaceError::ValidationError(format!(
                "at least {} entries are needed for insights",
                MIN_ENTRIES_FOR_ANALYSIS
            )));
        }

        let notes: Vec<&str> = self.entries.iter().map(|e| e.note.as_str()).collect();
        let prompt = format!(
            "Analyze these journal entries and provide high-level emotional insights. \
             What triggers do you see? What growth is happening? \
             Be empathetic and professional. Entries: {}",
            serde_json::to_string(&notes).unwrap_or_default()
        );
        let mut request = ModelRequest::new(prompt, INSIGHTS_INSTRUCTION);
        request.deep_reasoning = true;

        let response = retry.run(|| model.generate(&request))?;
        self.store.write(namespaces::INSIGHTS, &response.text)?;
        self.insights = Some(response.text);
        Ok(self.insights.as_deref().unwrap_or_default())
    }

    /// Insights text from the last successful analysis, if any
    pub fn cached_insights(&self) -> Option<&str> {
        self.insights.as_deref()
    }
}

/// Map a mood marker to a 1-5 trend score; unknown moods chart as neutral
pub fn mood_score(mood: &str) -> u8 {
    match mood {
        "😊" => 5,
        "😐" => 3,
        "😔" => 2,
        "😴" => 2,
        "😫" => 1,
        "😡" => 1,
        _ => 3,
    }
}
