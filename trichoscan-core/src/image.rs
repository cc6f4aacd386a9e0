use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;

use crate::{InlinePart, TrichoscanError};

/// Owned image bytes paired with their declared media type.
///
/// No validation of content or size happens here; a corrupt or oversized
/// image is passed through and rejected, if at all, by the remote service.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageBlob {
    data: Bytes,
    mime_type: String,
}

impl ImageBlob {
    pub fn new(data: impl Into<Bytes>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Reads an image from disk, inferring the media type from the file
    /// extension.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, TrichoscanError> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        let mime_type = mime_for_extension(
            path.extension().and_then(|ext| ext.to_str()).unwrap_or(""),
        );
        Ok(Self::new(data, mime_type))
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Base64-encodes the image into the inline payload shape generation
    /// requests carry.
    pub fn to_inline_part(&self) -> InlinePart {
        InlinePart {
            mime_type: self.mime_type.clone(),
            data: STANDARD.encode(&self.data),
        }
    }
}

fn mime_for_extension(extension: &str) -> String {
    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
    .to_string()
}
