use super::types::{Message, Role};

/// The working conversation, owned exclusively by the active session.
///
/// Non-empty by construction: the first entry is always the opening prompt
/// spoken by the model.
#[derive(Debug, Clone)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new(opening_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::new(Role::Model, opening_prompt)],
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn opening(&self) -> &Message {
        &self.messages[0]
    }

    pub fn last(&self) -> &Message {
        self.messages.last().expect("transcript is non-empty")
    }

    /// Copy of the full message sequence, for archiving
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True once at least one real exchange happened beyond the opening prompt
    pub fn has_exchange(&self) -> bool {
        self.messages.len() >= 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opening_prompt_is_first_and_model() {
        let transcript = Transcript::new("Hello. How intense is your distress right now?");
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.opening().role, Role::Model);
        assert!(!transcript.has_exchange());
    }

    #[test]
    fn test_push_preserves_order() {
        let mut transcript = Transcript::new("opening");
        transcript.push(Message::user("first"));
        transcript.push(Message::model("second"));

        let contents: Vec<&str> = transcript
            .messages()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["opening", "first", "second"]);
        assert!(transcript.has_exchange());
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut transcript = Transcript::new("opening");
        transcript.push(Message::user("hi"));

        let snapshot = transcript.snapshot();
        transcript.push(Message::model("later"));

        assert_eq!(snapshot.len(), 2);
        assert_eq!(transcript.len(), 3);
    }
}
