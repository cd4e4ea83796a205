//! Archived conversation records
//!
//! Snapshots the working transcript into an immutable record with a model
//! written summary, most recent first. Archiving never loses the
//! transcript: a failed summary falls back to a fixed placeholder.

use super::controller::ConversationController;
use crate::client::{ModelClient, ModelRequest, RetryPolicy};
use crate::messages::TherapySession;
use crate::store::{namespaces, StateStore};
use crate::{Result, SolaceError};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub const SUMMARY_INSTRUCTION: &str = "You are a concise medical scribe.";
pub const FALLBACK_SUMMARY: &str = "Session completed.";

/// Opening prompt of the fresh session that replaces an archived one
pub const ARCHIVED_OPENING: &str = "Session saved. How are you feeling now?";

pub struct SessionArchive {
    store: Arc<StateStore>,
    sessions: Vec<TherapySession>,
}

impl SessionArchive {
    /// Load the persisted archive; an unreadable or missing record starts empty
    pub fn load(store: Arc<StateStore>) -> Self {
        let sessions = store
            .read::<Vec<TherapySession>>(namespaces::SESSIONS)
            .unwrap_or_else(|e| {
                warn!("could not load session archive: {}", e);
                None
            })
            .unwrap_or_default();
        Self { store, sessions }
    }

    /// Most-recent-first list of archived sessions
    pub fn sessions(&self) -> &[TherapySession] {
        &self.sessions
    }

    pub fn get(&self, id: Uuid) -> Option<&TherapySession> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Snapshot the working transcript into a new archived record and reset
    /// the controller to a fresh triage state.
    ///
    /// Requires at least one real exchange beyond the opening prompt. The
    /// summary request may fail; the record is still created with the
    /// fallback text.
    pub fn archive(
        &mut self,
        controller: &mut ConversationController,
        model: &dyn ModelClient,
        retry: &RetryPolicy,
    ) -> Result<TherapySession> {
        if !controller.transcript().has_exchange() {
            return Err(SolaceError::ValidationError(
                "nothing to archive yet".to_string(),
            ));
        }

        let messages = controller.transcript().snapshot();
        let summary = match retry.run(|| model.generate(&summary_request(&messages))) {
            Ok(response) => response.text,
            Err(e) => {
                warn!("summary request failed, using fallback: {}", e);
                FALLBACK_SUMMARY.to_string()
            }
        };

        let session = TherapySession {
            id: Uuid::new_v4(),
            date: Utc::now(),
            messages,
            intensity: controller.intensity(),
            summary,
        };

        self.sessions.insert(0, session.clone());
        if let Err(e) = self.store.write(namespaces::SESSIONS, &self.sessions) {
            // Keep the working transcript intact when persistence fails
            self.sessions.remove(0);
            return Err(e);
        }

        controller.reset(ARCHIVED_OPENING);
        info!(id = %session.id, "session archived");
        Ok(session)
    }

    /// Remove a record by id; deleting an unknown id is a no-op.
    ///
    /// Returns whether anything was removed so viewers can clear a stale
    /// selection.
    pub fn delete(&mut self, id: Uuid) -> Result<bool> {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != id);
        if self.sessions.len() == before {
            return Ok(false);
        }
        self.store.write(namespaces::SESSIONS, &self.sessions)?;
        Ok(true)
    }
}

fn summary_request(messages: &[crate::messages::Message]) -> ModelRequest {
    let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
    let prompt = format!(
        "Summarize this therapeutic session in 1-2 sentences. \
         Focus on the core concern and the progress made. Messages: {}",
        serde_json::to_string(&contents).unwrap_or_default()
    );
    ModelRequest::new(prompt, SUMMARY_INSTRUCTION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ModelResponse, RetryPolicy};
    use crate::messages::IntensityStage;
    use crate::session::controller::UserIdentity;
    use parking_lot::Mutex;
    use tempfile::tempdir;

    struct ScriptedModel {
        replies: Mutex<Vec<crate::Result<ModelResponse>>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<crate::Result<ModelResponse>>) -> Self {
            Self {
                replies: Mutex::new(replies),
            }
        }

        fn text(text: &str) -> crate::Result<ModelResponse> {
            Ok(ModelResponse {
                text: text.to_string(),
                citations: Vec::new(),
            })
        }

        fn failure() -> crate::Result<ModelResponse> {
            Err(SolaceError::RequestFailure("down".to_string()))
        }
    }

    impl ModelClient for ScriptedModel {
        fn generate(&self, _request: &ModelRequest) -> crate::Result<ModelResponse> {
            let mut replies = self.replies.lock();
            if replies.is_empty() {
                Self::text("ok")
            } else {
                replies.remove(0)
            }
        }

        fn generate_image(&self, _prompt: &str) -> crate::Result<Vec<u8>> {
            Err(SolaceError::RequestFailure("unsupported".to_string()))
        }

        fn generate_speech(&self, _text: &str) -> crate::Result<Vec<u8>> {
            Err(SolaceError::RequestFailure("unsupported".to_string()))
        }
    }

    fn chatting_controller(model: &dyn ModelClient) -> ConversationController {
        let mut ctl = ConversationController::new(UserIdentity::new("Ada", "ada"));
        let turn = ctl.triage(IntensityStage::Stage2).unwrap();
        let response = model.generate(&turn.request).unwrap();
        ctl.complete_turn(&turn, response);
        ctl
    }

    #[test]
    fn test_archive_snapshots_resets_and_persists() {
        let dir = tempdir().unwrap();
        let store = Arc::new(StateStore::open(dir.path()).unwrap());
        let model = ScriptedModel::new(vec![
            ScriptedModel::text("I'm with you."),
            ScriptedModel::text("Worked through a stressful week."),
        ]);

        let mut ctl = chatting_controller(&model);
        let expected_messages = ctl.transcript().snapshot();

        let mut archive = SessionArchive::load(Arc::clone(&store));
        let session = archive
            .archive(&mut ctl, &model, &RetryPolicy::none())
            .unwrap();

        assert_eq!(session.summary, "Worked through a stressful week.");
        assert_eq!(session.intensity, Some(IntensityStage::Stage2));
        assert_eq!(session.messages.len(), expected_messages.len());
        assert_eq!(archive.sessions().len(), 1);

        // Working session reset to a fresh triage transcript
        assert_eq!(ctl.transcript().len(), 1);
        assert!(ctl.intensity().is_none());
        assert_eq!(ctl.transcript().opening().content, ARCHIVED_OPENING);

        // Reload from disk sees the same record
        let reloaded = SessionArchive::load(store);
        assert_eq!(reloaded.sessions().len(), 1);
        assert_eq!(reloaded.sessions()[0].id, session.id);
    }

    #[test]
    fn test_archive_survives_summary_failure() {
        let dir = tempdir().unwrap();
        let store = Arc::new(StateStore::open(dir.path()).unwrap());
        let model = ScriptedModel::new(vec![
            ScriptedModel::text("I'm with you."),
            ScriptedModel::failure(),
        ]);

        let mut ctl = chatting_controller(&model);
        let expected = ctl.transcript().snapshot();

        let mut archive = SessionArchive::load(store);
        let session = archive
            .archive(&mut ctl, &model, &RetryPolicy::none())
            .unwrap();

        assert_eq!(session.summary, FALLBACK_SUMMARY);
        assert_eq!(session.messages.len(), expected.len());
        assert_eq!(ctl.transcript().len(), 1);
    }

    #[test]
    fn test_archive_requires_an_exchange() {
        let dir = tempdir().unwrap();
        let store = Arc::new(StateStore::open(dir.path()).unwrap());
        let model = ScriptedModel::new(Vec::new());

        let mut ctl = ConversationController::new(UserIdentity::new("Ada", "ada"));
        let mut archive = SessionArchive::load(store);

        let result = archive.archive(&mut ctl, &model, &RetryPolicy::none());
        assert!(matches!(result, Err(SolaceError::ValidationError(_))));
        assert!(archive.sessions().is_empty());
    }

    #[test]
    fn test_newest_sessions_come_first() {
        let dir = tempdir().unwrap();
        let store = Arc::new(StateStore::open(dir.path()).unwrap());
        let model = ScriptedModel::new(vec![
            ScriptedModel::text("a"),
            ScriptedModel::text("first summary"),
            ScriptedModel::text("b"),
            ScriptedModel::text("second summary"),
        ]);

        let mut archive = SessionArchive::load(store);

        let mut ctl = chatting_controller(&model);
        archive.archive(&mut ctl, &model, &RetryPolicy::none()).unwrap();

        let turn = ctl.triage(IntensityStage::Stage1).unwrap();
        let response = model.generate(&turn.request).unwrap();
        ctl.complete_turn(&turn, response);
        archive.archive(&mut ctl, &model, &RetryPolicy::none()).unwrap();

        assert_eq!(archive.sessions().len(), 2);
        assert_eq!(archive.sessions()[0].summary, "second summary");
        assert_eq!(archive.sessions()[1].summary, "first summary");
    }

    #[test]
    fn test_delete_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = Arc::new(StateStore::open(dir.path()).unwrap());
        let model = ScriptedModel::new(vec![
            ScriptedModel::text("a"),
            ScriptedModel::text("summary"),
        ]);

        let mut ctl = chatting_controller(&model);
        let mut archive = SessionArchive::load(store);
        let session = archive
            .archive(&mut ctl, &model, &RetryPolicy::none())
            .unwrap();

        assert!(archive.delete(session.id).unwrap());
        assert!(!archive.delete(session.id).unwrap());
        assert!(archive.sessions().is_empty());

        // Unknown id is a no-op too
        assert!(!archive.delete(Uuid::new_v4()).unwrap());
    }
}
