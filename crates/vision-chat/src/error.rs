//! Error types for vision-chat

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using vision-chat Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving a conversation
#[derive(Error, Debug)]
pub enum Error {
    /// An error from the transport layer
    #[error(transparent)]
    Ai(#[from] vision_ai::Error),

    /// Input was empty or whitespace only
    #[error("Message is empty")]
    EmptyMessage,

    /// A send cycle is already in flight
    #[error("A message is already being sent")]
    Busy,

    /// Reading an attachment failed
    #[error("Failed to read attachment {}: {source}", .path.display())]
    Attachment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File is not an image type the backend accepts
    #[error("Unsupported attachment type: {}", .0.display())]
    UnsupportedAttachment(PathBuf),
}

impl Error {
    /// Whether the error came from the transport and aborted a send cycle
    pub fn is_transport(&self) -> bool {
        match self {
            Error::Ai(e) => e.is_transport(),
            _ => false,
        }
    }
}
