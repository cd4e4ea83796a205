//! Turn-taking state for one working conversation
//!
//! Owns the transcript, the one-way triage transition, the mode flags and
//! the single-flight guard. Remote I/O stays outside; callers get a
//! `PendingTurn` request, run it, and hand the outcome back.

use crate::client::{Citation, ModelRequest, ModelResponse};
use crate::messages::{IntensityStage, Message, Transcript};
use crate::{Result, SolaceError};
use tracing::debug;

const BASE_INSTRUCTION: &str = "\
You are Solace, a psychological first-aid companion providing immediate emotional support, grounding, and clarity.
Your role is to stabilize the person emotionally. You provide first aid for the mind.
You act with radical empathy, using CBT and grounding techniques.
If you notice high distress (Stage 4), escalate immediately.
You are equipped with calming visual generation and interactive exercises.";

/// Appended as a model turn when a submission fails past its retries
pub const FALLBACK_REPLY: &str = "I couldn't process that — try again.";

/// Who the companion is talking to
#[derive(Debug, Clone)]
pub struct UserIdentity {
    pub display_name: String,
    pub handle: String,
}

impl UserIdentity {
    pub fn new(display_name: impl Into<String>, handle: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            handle: handle.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    AwaitingTriage,
    Chatting,
}

/// A submission that has been accepted and awaits its remote result
#[derive(Debug)]
pub struct PendingTurn {
    pub request: ModelRequest,
    grounded: bool,
}

pub struct ConversationController {
    identity: UserIdentity,
    state: ConversationState,
    transcript: Transcript,
    intensity: Option<IntensityStage>,
    deep_reasoning: bool,
    web_grounding: bool,
    in_flight: bool,
}

impl ConversationController {
    pub fn new(identity: UserIdentity) -> Self {
        let opening = opening_prompt(&identity.display_name);
        Self {
            identity,
            state: ConversationState::AwaitingTriage,
            transcript: Transcript::new(opening),
            intensity: None,
            deep_reasoning: false,
            web_grounding: false,
            in_flight: false,
        }
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    pub fn intensity(&self) -> Option<IntensityStage> {
        self.intensity
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn deep_reasoning(&self) -> bool {
        self.deep_reasoning
    }

    pub fn web_grounding(&self) -> bool {
        self.web_grounding
    }

    /// Flags only shape the next submission; the transcript is untouched
    pub fn set_deep_reasoning(&mut self, on: bool) {
        self.deep_reasoning = on;
    }

    pub fn set_web_grounding(&mut self, on: bool) {
        self.web_grounding = on;
    }

    /// System instruction for the next request: persona, identity, and the
    /// current intensity stage once triage completed.
    pub fn system_instruction(&self) -> String {
        build_system_instruction(&self.identity, self.intensity)
    }

    /// One-way transition out of triage.
    ///
    /// Records the selected stage, appends it as a synthetic user message
    /// and returns that label as the first real turn.
    pub fn triage(&mut self, stage: IntensityStage) -> Result<PendingTurn> {
        if self.state != ConversationState::AwaitingTriage {
            return Err(SolaceError::ValidationError(
                "triage already completed for this session".to_string(),
            ));
        }
        if !IntensityStage::SELECTABLE.contains(&stage) {
            return Err(SolaceError::ValidationError(format!(
                "stage {} is not selectable at triage",
                stage.level()
            )));
        }

        self.intensity = Some(stage);
        self.state = ConversationState::Chatting;
        debug!(stage = stage.level(), "triage completed");

        self.accept_turn(stage.label().to_string())
    }

    /// Accept a free-text submission.
    ///
    /// Rejected (never queued) while another turn is in flight, before
    /// triage, or when the trimmed text is empty.
    pub fn begin_turn(&mut self, text: &str) -> Result<PendingTurn> {
        if self.state != ConversationState::Chatting {
            return Err(SolaceError::ValidationError(
                "complete triage before sending messages".to_string(),
            ));
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(SolaceError::ValidationError(
                "message text is empty".to_string(),
            ));
        }
        self.accept_turn(text.to_string())
    }

    fn accept_turn(&mut self, content: String) -> Result<PendingTurn> {
        if self.in_flight {
            return Err(SolaceError::ValidationError(
                "a submission is already in flight".to_string(),
            ));
        }

        // Deep reasoning silently wins over web grounding
        let grounded = self.web_grounding && !self.deep_reasoning;

        let mut request = ModelRequest::new(content.clone(), self.system_instruction());
        request.deep_reasoning = self.deep_reasoning;
        request.web_grounding = grounded;

        self.transcript.push(Message::user(content));
        self.in_flight = true;

        Ok(PendingTurn { request, grounded })
    }

    /// Record a successful turn; appends the model message (suffixed with
    /// citations when the turn was grounded) and clears the flight guard.
    pub fn complete_turn(&mut self, turn: &PendingTurn, response: ModelResponse) -> Message {
        let mut content = response.text;
        if turn.grounded {
            if let Some(suffix) = format_citations(&response.citations) {
                content.push_str(&suffix);
            }
        }

        let message = Message::model(content);
        self.transcript.push(message.clone());
        self.in_flight = false;
        message
    }

    /// Record a failed turn; the user message stays and a visible fallback
    /// model turn is appended instead of silently dropping the exchange.
    pub fn fail_turn(&mut self, _turn: &PendingTurn) -> Message {
        let message = Message::model(FALLBACK_REPLY);
        self.transcript.push(message.clone());
        self.in_flight = false;
        message
    }

    /// Start a fresh working session with the given opening prompt
    pub fn reset(&mut self, opening_prompt: impl Into<String>) {
        self.transcript = Transcript::new(opening_prompt);
        self.state = ConversationState::AwaitingTriage;
        self.intensity = None;
        self.in_flight = false;
    }
}

/// Persona plus identity block, with the intensity line once triage completed
pub fn build_system_instruction(
    identity: &UserIdentity,
    intensity: Option<IntensityStage>,
) -> String {
    let mut instruction = format!(
        "{}\n\nUSER IDENTITY:\n- Name: {}\n- Handle: @{}\n",
        BASE_INSTRUCTION, identity.display_name, identity.handle
    );
    if let Some(stage) = intensity {
        instruction.push_str(&format!(
            "- Current Distress Intensity: Stage {}\n",
            stage.level()
        ));
    }
    instruction
}

/// Opening prompt for a brand new working session
pub fn opening_prompt(display_name: &str) -> String {
    let name = if display_name.trim().is_empty() {
        "there"
    } else {
        display_name
    };
    format!(
        "Hello {}. I'm here to listen. How intense is your distress right now?",
        name
    )
}

/// Render grounding citations as a markdown source list.
///
/// Entries without a URI are dropped; missing titles fall back to "Source".
/// Returns `None` when nothing usable remains.
pub fn format_citations(citations: &[Citation]) -> Option<String> {
    let links: String = citations
        .iter()
        .filter_map(|c| {
            let uri = c.uri.as_deref().filter(|u| !u.is_empty())?;
            let title = c.title.as_deref().filter(|t| !t.is_empty()).unwrap_or("Source");
            Some(format!("\n- [{}]({})", title, uri))
        })
        .collect();

    if links.is_empty() {
        None
    } else {
        Some(format!("\n\nSources:{}", links))
    }
}
