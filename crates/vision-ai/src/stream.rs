//! Streaming event types and the line-oriented response decoder
//!
//! The backend answers `POST /chat` with a body of newline-delimited records:
//!
//! ```text
//! data: {"status": "streaming", "content": "Hel"}
//!
//! data: {"status": "streaming", "content": "lo"}
//!
//! data: {"status": "done"}
//! ```
//!
//! Only lines starting with [`DATA_PREFIX`] are relevant. [`StreamDecoder`]
//! turns raw byte chunks into [`StreamUpdate`]s, buffering partial lines
//! across reads.

use crate::error::Result;
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// Prefix marking a relevant record line
pub const DATA_PREFIX: &str = "data: ";

/// Placeholder shown while the backend generates an image
pub const GENERATING_IMAGE_TEXT: &str = "Generating image...";

/// A record payload as sent by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Partial text content
    Streaming {
        #[serde(default)]
        content: Option<String>,
    },
    /// Status marker, carries no content
    GeneratingImage,
    /// Final record
    Done {
        #[serde(default)]
        content: Option<String>,
    },
}

/// Updates emitted by the decoder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamUpdate {
    /// Full accumulated reply so far
    Partial { text: String },
    /// Backend is generating an image
    GeneratingImage { text: String },
    /// Terminal value of the reply, from a `done` record
    Done { text: String },
    /// Body closed before any `done` record; carries the accumulated text
    Ended { text: String },
}

impl StreamUpdate {
    /// Check if this is the last update of the stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamUpdate::Done { .. } | StreamUpdate::Ended { .. })
    }

    /// Text carried by the update
    pub fn text(&self) -> &str {
        match self {
            StreamUpdate::Partial { text }
            | StreamUpdate::GeneratingImage { text }
            | StreamUpdate::Done { text }
            | StreamUpdate::Ended { text } => text,
        }
    }
}

/// A stream of raw response body chunks
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// A stream of decoded updates
pub type UpdateStream = Pin<Box<dyn Stream<Item = Result<StreamUpdate>> + Send>>;

/// Incremental decoder for the `data: <json>` record stream
#[derive(Debug, Default)]
pub struct StreamDecoder {
    /// Bytes of the current, not yet terminated line
    buffer: BytesMut,
    /// Prefix of `buffer` already known to hold no newline
    scanned: usize,
    /// Concatenated `streaming` content seen so far
    accumulated: String,
    /// Set once a terminal update has been produced
    done: bool,
}

impl StreamDecoder {
    /// Create a new decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Concatenation of all `streaming` contents seen so far
    pub fn accumulated(&self) -> &str {
        &self.accumulated
    }

    /// Whether the terminal update has been produced
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed one chunk read from the response body.
    ///
    /// Returns the updates produced by every line completed by this chunk.
    /// Input after the terminal record is ignored.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamUpdate> {
        let mut updates = Vec::new();
        if self.done {
            return updates;
        }

        self.buffer.extend_from_slice(chunk);

        while let Some(offset) = self.buffer[self.scanned..]
            .iter()
            .position(|b| *b == b'\n')
        {
            let newline_pos = self.scanned + offset;
            let line = self.buffer.split_to(newline_pos + 1);
            self.scanned = 0;
            if let Some(update) = self.process_line(&line[..newline_pos]) {
                let terminal = update.is_terminal();
                updates.push(update);
                if terminal {
                    self.buffer.clear();
                    return updates;
                }
            }
        }
        self.scanned = self.buffer.len();

        updates
    }

    /// Flush the decoder once the body has ended.
    ///
    /// A trailing unterminated line is processed first. If no `done` record
    /// was seen, the stream closes with [`StreamUpdate::Ended`] carrying the
    /// accumulated text.
    pub fn finish(&mut self) -> Vec<StreamUpdate> {
        let mut updates = Vec::new();
        if self.done {
            return updates;
        }

        if !self.buffer.is_empty() {
            let line = self.buffer.split();
            self.scanned = 0;
            if let Some(update) = self.process_line(&line) {
                let terminal = update.is_terminal();
                updates.push(update);
                if terminal {
                    return updates;
                }
            }
        }

        tracing::warn!(
            accumulated_len = self.accumulated.len(),
            "Stream ended without a done record"
        );
        self.done = true;
        updates.push(StreamUpdate::Ended {
            text: self.accumulated.clone(),
        });
        updates
    }

    fn process_line(&mut self, raw: &[u8]) -> Option<StreamUpdate> {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);

        let line = match std::str::from_utf8(raw) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping non UTF-8 stream line");
                return None;
            }
        };

        let payload = line.strip_prefix(DATA_PREFIX)?;

        match serde_json::from_str::<StreamEvent>(payload) {
            Ok(event) => {
                tracing::debug!(?event, "Decoded stream record");
                self.apply(event)
            }
            Err(e) => {
                tracing::warn!(error = %e, payload, "Failed to parse stream record, skipping");
                None
            }
        }
    }

    fn apply(&mut self, event: StreamEvent) -> Option<StreamUpdate> {
        match event {
            StreamEvent::Streaming {
                content: Some(content),
            } if !content.is_empty() => {
                self.accumulated.push_str(&content);
                Some(StreamUpdate::Partial {
                    text: self.accumulated.clone(),
                })
            }
            StreamEvent::Streaming { .. } => None,
            StreamEvent::GeneratingImage => Some(StreamUpdate::GeneratingImage {
                text: GENERATING_IMAGE_TEXT.to_string(),
            }),
            StreamEvent::Done { content } => {
                self.done = true;
                let text = match content {
                    Some(content) if !content.is_empty() => content,
                    _ => self.accumulated.clone(),
                };
                Some(StreamUpdate::Done { text })
            }
        }
    }
}

/// Decode a response body into a stream of updates.
///
/// A read error is yielded once and ends the stream. Reading stops after the
/// terminal update.
pub fn decode_stream<S>(byte_stream: S) -> UpdateStream
where
    S: Stream<Item = Result<Bytes>> + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut decoder = StreamDecoder::new();
        let mut byte_stream = std::pin::pin!(byte_stream);

        while let Some(chunk) = byte_stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            for update in decoder.feed(&chunk) {
                yield Ok(update);
            }

            if decoder.is_done() {
                return;
            }
        }

        for update in decoder.finish() {
            yield Ok(update);
        }
    })
}

/// Decode a whole response body, calling `on_update` for every update.
///
/// Returns the terminal text, whether from a `done` record or the
/// accumulator at end of body.
pub async fn decode_all<S, F>(byte_stream: S, mut on_update: F) -> Result<String>
where
    S: Stream<Item = Result<Bytes>> + Send + 'static,
    F: FnMut(&StreamUpdate),
{
    let mut updates = decode_stream(byte_stream);
    let mut terminal = String::new();

    while let Some(update) = updates.next().await {
        let update = update?;
        on_update(&update);
        if let StreamUpdate::Done { text } | StreamUpdate::Ended { text } = update {
            terminal = text;
        }
    }

    Ok(terminal)
}
