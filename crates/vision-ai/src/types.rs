//! Core types for the chat wire contract

use serde::{Deserialize, Serialize};

/// Message roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Base64-encoded image payload attached to a message.
///
/// The backend accepts either a single blob or an ordered list of blobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageData {
    Single(String),
    Multiple(Vec<String>),
}

impl ImageData {
    /// Number of images carried
    pub fn len(&self) -> usize {
        match self {
            ImageData::Single(_) => 1,
            ImageData::Multiple(blobs) => blobs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A single conversation turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<ImageData>,
}

impl Message {
    /// Create a user message with text only
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            image_data: None,
        }
    }

    /// Create a user message carrying images.
    ///
    /// An empty blob list produces a message without `image_data`.
    pub fn user_with_images(content: impl Into<String>, blobs: Vec<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            image_data: if blobs.is_empty() {
                None
            } else {
                Some(ImageData::Multiple(blobs))
            },
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            image_data: None,
        }
    }

    /// Number of attached images
    pub fn image_count(&self) -> usize {
        self.image_data.as_ref().map(ImageData::len).unwrap_or(0)
    }
}

/// Request body for `POST /chat`
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub messages: &'a [Message],
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_message_omits_image_data() {
        let msg = Message::user("hello");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value, json!({"role": "user", "content": "hello"}));
    }

    #[test]
    fn test_user_with_images_keeps_order() {
        let msg = Message::user_with_images("look", vec!["AAA".into(), "BBB".into()]);
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["image_data"], json!(["AAA", "BBB"]));
        assert_eq!(msg.image_count(), 2);
    }

    #[test]
    fn test_user_with_no_images_has_none() {
        let msg = Message::user_with_images("plain", vec![]);
        assert!(msg.image_data.is_none());
    }

    #[test]
    fn test_image_data_accepts_single_blob() {
        let msg: Message =
            serde_json::from_value(json!({"role": "user", "content": "x", "image_data": "QQ=="}))
                .unwrap();
        assert_eq!(msg.image_data, Some(ImageData::Single("QQ==".into())));
        assert_eq!(msg.image_count(), 1);
    }

    #[test]
    fn test_request_wraps_messages() {
        let messages = vec![Message::user("hi"), Message::assistant("hello")];
        let value = serde_json::to_value(ChatRequest {
            messages: &messages,
        })
        .unwrap();
        assert_eq!(value["messages"][1]["role"], "assistant");
        assert_eq!(value["messages"].as_array().unwrap().len(), 2);
    }
}
