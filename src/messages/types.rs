use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self::new(Role::Model, content)
    }
}

/// Self-reported distress severity, set once per working session at triage.
///
/// Stages 1-3 are selectable; stage 4 only shows up in escalation language
/// inside the system instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum IntensityStage {
    Stage1,
    Stage2,
    Stage3,
    Stage4,
}

impl IntensityStage {
    /// Stages offered by the triage prompt
    pub const SELECTABLE: [IntensityStage; 3] = [
        IntensityStage::Stage1,
        IntensityStage::Stage2,
        IntensityStage::Stage3,
    ];

    pub fn level(self) -> u8 {
        match self {
            IntensityStage::Stage1 => 1,
            IntensityStage::Stage2 => 2,
            IntensityStage::Stage3 => 3,
            IntensityStage::Stage4 => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            IntensityStage::Stage1 => "Manageable",
            IntensityStage::Stage2 => "Moderate",
            IntensityStage::Stage3 => "Heavy",
            IntensityStage::Stage4 => "Crisis",
        }
    }
}

impl From<IntensityStage> for u8 {
    fn from(stage: IntensityStage) -> u8 {
        stage.level()
    }
}

impl TryFrom<u8> for IntensityStage {
    type Error = String;

    fn try_from(level: u8) -> std::result::Result<Self, Self::Error> {
        match level {
            1 => Ok(IntensityStage::Stage1),
            2 => Ok(IntensityStage::Stage2),
            3 => Ok(IntensityStage::Stage3),
            4 => Ok(IntensityStage::Stage4),
            other => Err(format!("intensity stage out of range: {}", other)),
        }
    }
}

/// An archived conversation snapshot with a generated summary.
///
/// Immutable after creation except for deletion from the archive list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TherapySession {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub messages: Vec<Message>,
    pub intensity: Option<IntensityStage>,
    pub summary: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        let msg = Message::user("hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "hello");

        let msg = Message::model("hi there");
        assert_eq!(msg.role, Role::Model);
    }

    #[test]
    fn test_stage_levels_round_trip() {
        for level in 1u8..=4 {
            let stage = IntensityStage::try_from(level).unwrap();
            assert_eq!(stage.level(), level);
        }
        assert!(IntensityStage::try_from(0).is_err());
        assert!(IntensityStage::try_from(5).is_err());
    }

    #[test]
    fn test_selectable_stages_exclude_crisis() {
        assert!(!IntensityStage::SELECTABLE.contains(&IntensityStage::Stage4));
        assert_eq!(IntensityStage::SELECTABLE.len(), 3);
    }

    #[test]
    fn test_stage_serializes_as_number() {
        let json = serde_json::to_string(&IntensityStage::Stage2).unwrap();
        assert_eq!(json, "2");
        let stage: IntensityStage = serde_json::from_str("3").unwrap();
        assert_eq!(stage, IntensityStage::Stage3);
    }
}
