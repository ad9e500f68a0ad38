//! Images queued for the next outgoing user message

use base64::{Engine as _, engine::general_purpose::STANDARD};
use std::path::Path;

use crate::error::{Error, Result};

/// File extensions accepted as image attachments
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// A single base64-encoded image awaiting send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Display name (usually the file name)
    pub name: String,
    /// Base64 payload, standard alphabet, no data-URL prefix
    pub data: String,
}

impl Attachment {
    /// Create an attachment from an already encoded blob
    pub fn new(name: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Encode raw image bytes
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(name, STANDARD.encode(bytes))
    }

    /// Read an image file and encode it
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !is_image_path(path) {
            return Err(Error::UnsupportedAttachment(path.to_path_buf()));
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| Error::Attachment {
                path: path.to_path_buf(),
                source,
            })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        tracing::debug!(name = %name, bytes = bytes.len(), "Loaded attachment");
        Ok(Self::from_bytes(name, &bytes))
    }
}

/// Whether the path has an accepted image extension
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Ordered set of attachments for the next user message
#[derive(Debug, Clone, Default)]
pub struct PendingAttachments {
    items: Vec<Attachment>,
}

impl PendingAttachments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an attachment at the end
    pub fn push(&mut self, attachment: Attachment) {
        self.items.push(attachment);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Display names in attachment order
    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(|a| a.name.as_str()).collect()
    }

    /// Drain the set, returning blobs in attachment order
    pub fn take(&mut self) -> Vec<String> {
        self.items.drain(..).map(|a| a.data).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_take_preserves_order_and_empties() {
        let mut pending = PendingAttachments::new();
        pending.push(Attachment::new("a.png", "AAA"));
        pending.push(Attachment::new("b.png", "BBB"));

        assert_eq!(pending.names(), vec!["a.png", "b.png"]);
        assert_eq!(pending.take(), vec!["AAA".to_string(), "BBB".to_string()]);
        assert!(pending.is_empty());
    }

    #[test]
    fn test_from_bytes_encodes_standard_base64() {
        let attachment = Attachment::from_bytes("x.png", b"hello");
        assert_eq!(attachment.data, "aGVsbG8=");
    }

    #[test]
    fn test_image_extension_check() {
        assert!(is_image_path(Path::new("cat.PNG")));
        assert!(is_image_path(Path::new("dir/photo.jpeg")));
        assert!(!is_image_path(Path::new("notes.txt")));
        assert!(!is_image_path(Path::new("no_extension")));
    }

    #[tokio::test]
    async fn test_from_path_reads_and_encodes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pixel.png");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&[0x89, b'P', b'N', b'G']).unwrap();

        let attachment = Attachment::from_path(&path).await.unwrap();
        assert_eq!(attachment.name, "pixel.png");
        assert_eq!(attachment.data, STANDARD.encode([0x89, b'P', b'N', b'G']));
    }

    #[tokio::test]
    async fn test_from_path_rejects_non_image() {
        let result = Attachment::from_path("README.md").await;
        assert!(matches!(result, Err(Error::UnsupportedAttachment(_))));
    }

    #[tokio::test]
    async fn test_from_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Attachment::from_path(dir.path().join("missing.jpg")).await;
        assert!(matches!(result, Err(Error::Attachment { .. })));
    }
}
