//! Conversation controller driving one send cycle at a time

use std::path::Path;
use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::broadcast;
use vision_ai::{Backend, Message, StreamUpdate, stream::decode_stream};

use crate::{
    attachments::{Attachment, PendingAttachments},
    conversation::{Conversation, CyclePhase},
    error::{Error, Result},
    events::ChatEvent,
};

/// Owns the conversation and talks to the backend
pub struct ChatController {
    backend: Arc<dyn Backend>,
    conversation: Conversation,
    attachments: PendingAttachments,
    event_tx: broadcast::Sender<ChatEvent>,
}

impl ChatController {
    /// Create a controller with an empty conversation
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            backend,
            conversation: Conversation::new(),
            attachments: PendingAttachments::new(),
            event_tx,
        }
    }

    /// Subscribe to controller events
    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.event_tx.subscribe()
    }

    pub fn messages(&self) -> &[Message] {
        &self.conversation.messages
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn phase(&self) -> CyclePhase {
        self.conversation.phase
    }

    /// Whether a send cycle is in flight
    pub fn is_busy(&self) -> bool {
        self.conversation.phase.is_busy()
    }

    pub fn attachments(&self) -> &PendingAttachments {
        &self.attachments
    }

    /// Queue an attachment for the next message
    pub fn add_attachment(&mut self, attachment: Attachment) {
        self.attachments.push(attachment);
    }

    /// Read an image file and queue it. Returns the attachment's name.
    pub async fn attach_file(&mut self, path: impl AsRef<Path>) -> Result<String> {
        let attachment = Attachment::from_path(path).await?;
        let name = attachment.name.clone();
        self.attachments.push(attachment);
        Ok(name)
    }

    /// Send a user message and stream the reply.
    ///
    /// Returns the committed assistant message, or `None` when the backend
    /// finished without any text or closed the body before its `done` record.
    pub async fn send(&mut self, text: &str) -> Result<Option<Message>> {
        if text.trim().is_empty() {
            return Err(Error::EmptyMessage);
        }
        if self.is_busy() {
            return Err(Error::Busy);
        }

        let user_message = Message::user_with_images(text, self.attachments.take());
        self.conversation.messages.push(user_message.clone());
        self.conversation.partial = None;
        self.conversation.error = None;
        self.set_phase(CyclePhase::AwaitingResponse);
        self.emit(ChatEvent::CycleStart {
            message: user_message,
        });

        let result = self.run_cycle().await;

        let committed = match &result {
            Ok(reply) => reply.is_some(),
            Err(e) => {
                tracing::error!(error = %e, "Chat request failed");
                self.conversation.partial = None;
                self.conversation.error = Some(e.to_string());
                self.set_phase(CyclePhase::Idle);
                self.emit(ChatEvent::Error {
                    message: e.to_string(),
                });
                false
            }
        };

        self.emit(ChatEvent::CycleEnd { committed });
        result
    }

    async fn run_cycle(&mut self) -> Result<Option<Message>> {
        let body = self.backend.open(&self.conversation.messages).await?;
        let mut updates = decode_stream(body);

        while let Some(update) = updates.next().await {
            match update? {
                StreamUpdate::Partial { text } => {
                    self.set_phase(CyclePhase::Streaming);
                    self.conversation.partial = Some(text.clone());
                    self.emit(ChatEvent::Partial { text });
                }
                StreamUpdate::GeneratingImage { text } => {
                    self.set_phase(CyclePhase::Streaming);
                    self.conversation.partial = Some(text.clone());
                    self.emit(ChatEvent::GeneratingImage { text });
                }
                StreamUpdate::Done { text } => {
                    return Ok(self.commit(text));
                }
                StreamUpdate::Ended { text } => {
                    tracing::debug!(
                        discarded_len = text.len(),
                        "Body closed before done, reply not committed"
                    );
                    break;
                }
            }
        }

        self.conversation.partial = None;
        self.set_phase(CyclePhase::Complete);
        Ok(None)
    }

    fn commit(&mut self, text: String) -> Option<Message> {
        self.conversation.partial = None;

        let reply = if text.is_empty() {
            tracing::debug!("Reply finished without text, nothing committed");
            None
        } else {
            let message = Message::assistant(text);
            self.conversation.messages.push(message.clone());
            self.emit(ChatEvent::MessageEnd {
                message: message.clone(),
            });
            Some(message)
        };

        self.set_phase(CyclePhase::Complete);
        reply
    }

    fn set_phase(&mut self, phase: CyclePhase) {
        if self.conversation.phase != phase {
            tracing::debug!(from = ?self.conversation.phase, to = ?phase, "Cycle phase");
            self.conversation.phase = phase;
        }
    }

    fn emit(&self, event: ChatEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }
}
