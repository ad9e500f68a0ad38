//! vision-ai: wire contract for the vision chat backend
//!
//! This crate holds the message types exchanged with the backend, the
//! incremental decoder for its `data: <json>` response stream, and the HTTP
//! transport that opens one streamed request per user turn.

pub mod client;
pub mod error;
pub mod stream;
pub mod types;

pub use client::{Backend, DEFAULT_API_URL, HttpBackend};
pub use error::{Error, Result};
pub use stream::{ByteStream, StreamDecoder, StreamEvent, StreamUpdate, UpdateStream};
pub use types::*;
