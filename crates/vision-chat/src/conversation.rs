//! Conversation state: committed messages, the in-progress reply, and cycle phase.

use serde::{Deserialize, Serialize};
use vision_ai::Message;

/// Where the controller is within a send cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    /// Nothing sent yet, or the last cycle failed
    #[default]
    Idle,
    /// Request sent, no update decoded yet
    AwaitingResponse,
    /// At least one partial update received
    Streaming,
    /// Last cycle finished normally
    Complete,
}

impl CyclePhase {
    /// Whether a cycle is in flight
    pub fn is_busy(self) -> bool {
        matches!(self, CyclePhase::AwaitingResponse | CyclePhase::Streaming)
    }
}

/// Conversation state owned by the controller.
#[derive(Debug, Default)]
pub struct Conversation {
    /// Committed messages, oldest first
    pub messages: Vec<Message>,
    /// Text of the reply currently streaming in
    pub partial: Option<String>,
    /// Current cycle phase
    pub phase: CyclePhase,
    /// Last error
    pub error: Option<String>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_phases() {
        assert!(!CyclePhase::Idle.is_busy());
        assert!(CyclePhase::AwaitingResponse.is_busy());
        assert!(CyclePhase::Streaming.is_busy());
        assert!(!CyclePhase::Complete.is_busy());
    }

    #[test]
    fn test_new_conversation_is_idle_and_empty() {
        let conversation = Conversation::new();
        assert!(conversation.messages.is_empty());
        assert_eq!(conversation.phase, CyclePhase::Idle);
        assert!(conversation.partial.is_none());
    }
}
