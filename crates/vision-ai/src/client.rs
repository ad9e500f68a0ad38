//! HTTP transport for the chat backend

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{StatusCode, Url, header};

use crate::{
    error::{Error, Result},
    stream::ByteStream,
    types::{ChatRequest, Message},
};

/// Base URL used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Something that can open a streamed chat response
#[async_trait]
pub trait Backend: Send + Sync {
    /// Send the full conversation and return the raw response body
    async fn open(&self, messages: &[Message]) -> Result<ByteStream>;
}

/// Backend reached over HTTP at `<base_url>/chat`
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpBackend {
    /// Create a backend for the given base URL
    pub fn new(base_url: &str) -> Result<Self> {
        let endpoint = chat_endpoint(base_url)?;
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
        })
    }

    /// Full URL requests are posted to
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// Build `<base>/chat` from a base URL, tolerating trailing slashes
fn chat_endpoint(base_url: &str) -> Result<Url> {
    let trimmed = base_url.trim().trim_end_matches('/');
    let url = Url::parse(&format!("{}/chat", trimmed))
        .map_err(|e| Error::InvalidUrl(format!("{}: {}", base_url, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::InvalidUrl(format!(
            "{}: unsupported scheme '{}'",
            base_url, other
        ))),
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn open(&self, messages: &[Message]) -> Result<ByteStream> {
        tracing::debug!(
            endpoint = %self.endpoint,
            messages = messages.len(),
            "Opening chat stream"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(header::ACCEPT, "text/event-stream")
            .json(&ChatRequest { messages })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::status(status, body));
        }

        if status == StatusCode::NO_CONTENT || response.content_length() == Some(0) {
            return Err(Error::MissingBody);
        }

        Ok(Box::pin(response.bytes_stream().map(|chunk| chunk.map_err(Error::from))))
    }
}
