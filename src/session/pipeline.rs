//! Channel-based front end for the conversation
//!
//! Runs the controller and the archive on a worker thread so callers never
//! block on remote calls. Commands go in, events come out; the busy flag on
//! the handle enforces single-flight rejection at the entry point.

use super::archive::SessionArchive;
use super::controller::ConversationController;
use crate::client::{ModelClient, RetryPolicy};
use crate::messages::{IntensityStage, Message, TherapySession};
use crate::{Result, SolaceError};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub enum ChatCommand {
    /// Select a severity stage and submit it as the first turn
    Triage(IntensityStage),

    /// Submit one free-text turn
    Submit(String),

    SetDeepReasoning(bool),
    SetWebGrounding(bool),

    /// Snapshot the transcript into the archive and reset
    Archive,

    /// Remove an archived session
    DeleteSession(Uuid),

    Shutdown,
}

#[derive(Debug, Clone)]
pub enum ChatEvent {
    /// A submission was accepted; carries the appended user message
    TurnStarted { message: Message },

    /// The model replied
    TurnComplete { message: Message },

    /// Retries exhausted; carries the appended fallback model message
    TurnFailed { message: Message, error: String },

    /// A command was rejected before any transcript change
    Rejected { reason: String },

    Archived { session: TherapySession },
    ArchiveFailed { error: String },

    /// `removed` is false when the id was already gone
    SessionDeleted { id: Uuid, removed: bool },

    Shutdown,
}

/// Handle for driving the pipeline from the UI thread
#[derive(Clone)]
pub struct ChatHandle {
    command_tx: Sender<ChatCommand>,
    event_rx: Receiver<ChatEvent>,
    busy: Arc<AtomicBool>,
}

impl ChatHandle {
    /// Submit a free-text turn. Rejected while another model-bound command
    /// is outstanding; the rejected text never reaches the transcript.
    pub fn submit(&self, text: impl Into<String>) -> Result<()> {
        self.dispatch(ChatCommand::Submit(text.into()))
    }

    /// Select the triage stage, starting the conversation
    pub fn triage(&self, stage: IntensityStage) -> Result<()> {
        self.dispatch(ChatCommand::Triage(stage))
    }

    /// Archive the current transcript
    pub fn archive(&self) -> Result<()> {
        self.dispatch(ChatCommand::Archive)
    }

    fn dispatch(&self, command: ChatCommand) -> Result<()> {
        if self.busy.swap(true, Ordering::SeqCst) {
            return Err(SolaceError::ValidationError(
                "a submission is already in flight".to_string(),
            ));
        }
        self.send(command).inspect_err(|_| {
            self.busy.store(false, Ordering::SeqCst);
        })
    }

    pub fn set_deep_reasoning(&self, on: bool) -> Result<()> {
        self.send(ChatCommand::SetDeepReasoning(on))
    }

    pub fn set_web_grounding(&self, on: bool) -> Result<()> {
        self.send(ChatCommand::SetWebGrounding(on))
    }

    pub fn delete_session(&self, id: Uuid) -> Result<()> {
        self.send(ChatCommand::DeleteSession(id))
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(ChatCommand::Shutdown)
    }

    fn send(&self, command: ChatCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|e| SolaceError::ChannelError(format!("failed to send command: {}", e)))
    }

    pub fn try_recv_event(&self) -> Option<ChatEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Block until the next event; used by line-oriented front ends
    pub fn recv_event(&self) -> Result<ChatEvent> {
        self.event_rx
            .recv()
            .map_err(|e| SolaceError::ChannelError(format!("event channel closed: {}", e)))
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }
}

pub struct ChatPipeline {
    controller: ConversationController,
    archive: SessionArchive,
    model: Arc<dyn ModelClient>,
    retry: RetryPolicy,
    command_rx: Receiver<ChatCommand>,
    event_tx: Sender<ChatEvent>,
    busy: Arc<AtomicBool>,
}

impl ChatPipeline {
    pub fn new(
        controller: ConversationController,
        archive: SessionArchive,
        model: Arc<dyn ModelClient>,
        retry: RetryPolicy,
    ) -> (Self, ChatHandle) {
        let (command_tx, command_rx) = bounded(100);
        let (event_tx, event_rx) = bounded(100);
        let busy = Arc::new(AtomicBool::new(false));

        let handle = ChatHandle {
            command_tx,
            event_rx,
            busy: Arc::clone(&busy),
        };

        let pipeline = Self {
            controller,
            archive,
            model,
            retry,
            command_rx,
            event_tx,
            busy,
        };

        (pipeline, handle)
    }

    /// Start the worker thread; consumes the pipeline
    pub fn start(mut self) -> JoinHandle<()> {
        std::thread::spawn(move || {
            info!("chat pipeline worker started");

            loop {
                match self.command_rx.recv() {
                    Ok(ChatCommand::Triage(stage)) => {
                        let pending = self.controller.triage(stage);
                        self.run_turn(pending);
                    }
                    Ok(ChatCommand::Submit(text)) => {
                        let pending = self.controller.begin_turn(&text);
                        self.run_turn(pending);
                    }
                    Ok(ChatCommand::SetDeepReasoning(on)) => {
                        self.controller.set_deep_reasoning(on);
                    }
                    Ok(ChatCommand::SetWebGrounding(on)) => {
                        self.controller.set_web_grounding(on);
                    }
                    Ok(ChatCommand::Archive) => {
                        let event = match self.archive.archive(
                            &mut self.controller,
                            self.model.as_ref(),
                            &self.retry,
                        ) {
                            Ok(session) => ChatEvent::Archived { session },
                            Err(e) => {
                                warn!("archive failed: {}", e);
                                ChatEvent::ArchiveFailed {
                                    error: e.user_message(),
                                }
                            }
                        };
                        self.busy.store(false, Ordering::SeqCst);
                        let _ = self.event_tx.send(event);
                    }
                    Ok(ChatCommand::DeleteSession(id)) => {
                        let event = match self.archive.delete(id) {
                            Ok(removed) => ChatEvent::SessionDeleted { id, removed },
                            Err(e) => ChatEvent::ArchiveFailed {
                                error: e.user_message(),
                            },
                        };
                        let _ = self.event_tx.send(event);
                    }
                    Ok(ChatCommand::Shutdown) => {
                        info!("chat pipeline worker shutting down");
                        let _ = self.event_tx.send(ChatEvent::Shutdown);
                        break;
                    }
                    Err(e) => {
                        warn!("command channel closed: {}", e);
                        break;
                    }
                }
            }

            info!("chat pipeline worker stopped");
        })
    }

    fn run_turn(
        &mut self,
        pending: Result<super::controller::PendingTurn>,
    ) {
        let pending = match pending {
            Ok(pending) => pending,
            Err(e) => {
                self.busy.store(false, Ordering::SeqCst);
                let _ = self.event_tx.send(ChatEvent::Rejected {
                    reason: e.to_string(),
                });
                return;
            }
        };

        let _ = self.event_tx.send(ChatEvent::TurnStarted {
            message: self.controller.transcript().last().clone(),
        });

        debug!("dispatching turn to remote model");
        let outcome = self.retry.run(|| self.model.generate(&pending.request));

        let event = match outcome {
            Ok(response) => ChatEvent::TurnComplete {
                message: self.controller.complete_turn(&pending, response),
            },
            Err(e) => {
                warn!("turn failed after retries: {}", e);
                ChatEvent::TurnFailed {
                    message: self.controller.fail_turn(&pending),
                    error: e.user_message(),
                }
            }
        };
        self.busy.store(false, Ordering::SeqCst);
        let _ = self.event_tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ModelRequest, ModelResponse};
    use crate::session::controller::UserIdentity;
    use crate::store::StateStore;
    use std::time::Duration;
    use tempfile::tempdir;

    /// Replies after a fixed delay so in-flight windows can be observed
    struct SlowModel {
        delay: Duration,
    }

    impl ModelClient for SlowModel {
        fn generate(&self, request: &ModelRequest) -> Result<ModelResponse> {
            std::thread::sleep(self.delay);
            Ok(ModelResponse {
                text: format!("echo: {}", request.prompt),
                citations: Vec::new(),
            })
        }

        fn generate_image(&self, _prompt: &str) -> Result<Vec<u8>> {
            Err(SolaceError::RequestFailure("unsupported".to_string()))
        }

        fn generate_speech(&self, _text: &str) -> Result<Vec<u8>> {
            Err(SolaceError::RequestFailure("unsupported".to_string()))
        }
    }

    fn spawn_pipeline(delay: Duration) -> (ChatHandle, JoinHandle<()>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let store = Arc::new(StateStore::open(dir.path()).unwrap());
        let controller = ConversationController::new(UserIdentity::new("Ada", "ada"));
        let archive = SessionArchive::load(store);
        let model: Arc<dyn ModelClient> = Arc::new(SlowModel { delay });

        let (pipeline, handle) =
            ChatPipeline::new(controller, archive, model, RetryPolicy::none());
        let worker = pipeline.start();
        (handle, worker, dir)
    }

    fn wait_for_turn_complete(handle: &ChatHandle) -> Message {
        loop {
            match handle.recv_event().unwrap() {
                ChatEvent::TurnComplete { message } => return message,
                ChatEvent::TurnFailed { error, .. } => panic!("turn failed: {}", error),
                _ => {}
            }
        }
    }

    #[test]
    fn test_triage_then_submit_round_trip() {
        let (handle, worker, _dir) = spawn_pipeline(Duration::from_millis(1));

        handle.triage(IntensityStage::Stage1).unwrap();
        let reply = wait_for_turn_complete(&handle);
        assert_eq!(reply.content, "echo: Manageable");

        handle.submit("rough day").unwrap();
        let reply = wait_for_turn_complete(&handle);
        assert_eq!(reply.content, "echo: rough day");

        handle.shutdown().unwrap();
        worker.join().unwrap();
    }

    #[test]
    fn test_second_submission_rejected_while_in_flight() {
        let (handle, worker, _dir) = spawn_pipeline(Duration::from_millis(200));

        handle.triage(IntensityStage::Stage1).unwrap();
        wait_for_turn_complete(&handle);

        handle.submit("a").unwrap();
        let second = handle.submit("b");
        assert!(matches!(second, Err(SolaceError::ValidationError(_))));

        // Exactly one accepted submission reaches the transcript
        let reply = wait_for_turn_complete(&handle);
        assert_eq!(reply.content, "echo: a");
        assert!(!handle.is_busy());

        // And the next submission is accepted again
        handle.submit("b").unwrap();
        let reply = wait_for_turn_complete(&handle);
        assert_eq!(reply.content, "echo: b");

        handle.shutdown().unwrap();
        worker.join().unwrap();
    }

    #[test]
    fn test_mode_toggles_do_not_emit_turns() {
        let (handle, worker, _dir) = spawn_pipeline(Duration::from_millis(1));

        handle.set_deep_reasoning(true).unwrap();
        handle.set_web_grounding(true).unwrap();
        handle.shutdown().unwrap();

        let mut saw_turn = false;
        while let Ok(event) = handle.recv_event() {
            match event {
                ChatEvent::Shutdown => break,
                ChatEvent::TurnStarted { .. } | ChatEvent::TurnComplete { .. } => {
                    saw_turn = true;
                }
                _ => {}
            }
        }
        assert!(!saw_turn);
        worker.join().unwrap();
    }

    #[test]
    fn test_archive_before_exchange_reports_failure() {
        let (handle, worker, _dir) = spawn_pipeline(Duration::from_millis(1));

        handle.archive().unwrap();
        loop {
            match handle.recv_event().unwrap() {
                ChatEvent::ArchiveFailed { .. } => break,
                ChatEvent::Archived { .. } => panic!("archived an empty session"),
                _ => {}
            }
        }

        handle.shutdown().unwrap();
        worker.join().unwrap();
    }
}
