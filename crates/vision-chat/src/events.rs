//! Controller event types

use serde::{Deserialize, Serialize};
use vision_ai::Message;

/// Events emitted while a send cycle runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// User message committed and request about to open
    CycleStart { message: Message },

    /// Accumulated reply text so far
    Partial { text: String },

    /// Backend is producing an image; `text` is the placeholder to show
    GeneratingImage { text: String },

    /// Assistant message committed
    MessageEnd { message: Message },

    /// The cycle failed
    Error { message: String },

    /// The cycle is over; `committed` is true if an assistant message was added
    CycleEnd { committed: bool },
}

impl ChatEvent {
    /// Check if this is the last event of a cycle
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChatEvent::CycleEnd { .. })
    }
}
