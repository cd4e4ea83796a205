use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The person using the companion; feeds the system-instruction identity block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub handle: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub age_range: Option<String>,
    #[serde(default)]
    pub stress_focus: Vec<String>,
    pub join_date: DateTime<Utc>,
    #[serde(default)]
    pub sessions_count: u32,
    #[serde(default)]
    pub streak_days: u32,
    #[serde(default)]
    pub exercises_completed: u32,
}

impl UserProfile {
    pub fn new(
        display_name: impl Into<String>,
        handle: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            display_name: display_name.into(),
            handle: handle.into(),
            bio: None,
            age_range: None,
            stress_focus: Vec::new(),
            join_date: Utc::now(),
            sessions_count: 0,
            streak_days: 0,
            exercises_completed: 0,
        }
    }
}

/// Visual theme choice, persisted on every change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Midnight,
    Dawn,
    Forest,
}

/// One mood journal entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub mood: String,
    pub note: String,
    #[serde(default)]
    pub insights: Option<String>,
}

impl JournalEntry {
    pub fn new(mood: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            date: Utc::now(),
            mood: mood.into(),
            note: note.into(),
            insights: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_serde_round_trip() {
        let profile = UserProfile::new("Ada", "ada", "ada@example.com");
        let json = serde_json::to_string(&profile).unwrap();
        let back: UserProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(back.display_name, "Ada");
        assert_eq!(back.handle, "ada");
    }

    #[test]
    fn test_theme_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Theme::Midnight).unwrap(), "\"midnight\"");
        let theme: Theme = serde_json::from_str("\"forest\"").unwrap();
        assert_eq!(theme, Theme::Forest);
    }
}
