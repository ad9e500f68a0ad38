//! vision-chat: conversation controller for the vision chat client
//!
//! This crate owns the conversation history and pending image attachments,
//! and drives one streamed request/response cycle at a time against a
//! [`vision_ai::Backend`].

pub mod attachments;
pub mod controller;
pub mod conversation;
pub mod error;
pub mod events;

pub use attachments::{Attachment, PendingAttachments};
pub use controller::ChatController;
pub use conversation::{Conversation, CyclePhase};
pub use error::{Error, Result};
pub use events::ChatEvent;
