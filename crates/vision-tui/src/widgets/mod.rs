//! Custom widgets for the chat screen

pub mod attachment_bar;
pub mod input_box;
pub mod markdown;
pub mod message_list;
pub mod spinner;

pub use attachment_bar::AttachmentBar;
pub use input_box::InputBox;
pub use message_list::{ChatMessage, MessageList, MessageRole};
pub use spinner::Spinner;
