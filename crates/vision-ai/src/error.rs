//! Error types for vision-ai

use thiserror::Error;

/// Result type alias using vision-ai Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the chat backend
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed (connect, send, or body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Backend answered with a non-success status
    #[error("Backend returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// Successful response without a readable body
    #[error("Response has no readable body")]
    MissingBody,

    /// Backend base URL could not be parsed
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    /// Byte stream failed mid-response
    #[error("Stream error: {0}")]
    Stream(String),
}

impl Error {
    /// Create a status error from a status code and response body
    pub fn status(status: reqwest::StatusCode, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Whether this error aborts a send cycle at the transport level.
    ///
    /// Everything except a bad configuration and local JSON encoding
    /// problems counts as a transport failure.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Http(_) | Error::Status { .. } | Error::MissingBody | Error::Stream(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display_includes_code_and_body() {
        let e = Error::status(reqwest::StatusCode::INTERNAL_SERVER_ERROR, "boom");
        let msg = e.to_string();
        assert!(msg.contains("500"), "got: {}", msg);
        assert!(msg.contains("boom"), "got: {}", msg);
    }

    #[test]
    fn test_transport_classification() {
        assert!(Error::MissingBody.is_transport());
        assert!(Error::Stream("reset".into()).is_transport());
        assert!(Error::status(reqwest::StatusCode::BAD_GATEWAY, "").is_transport());
        assert!(!Error::InvalidUrl("nope".into()).is_transport());
    }

    #[test]
    fn test_json_error_is_not_transport() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(!Error::from(json_err).is_transport());
    }
}
