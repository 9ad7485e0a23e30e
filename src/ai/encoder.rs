//! File-to-payload encoding shared by every image upload.

use super::mime::detect_mime;
use crate::{Error, Result};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// MIME-tagged base64 encoding of a file's bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinaryPayload {
    pub mime_type: String,
    pub data: String,
}

impl BinaryPayload {
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    /// Split a `data:<mime>;base64,<payload>` URL into its two halves.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| Error::Decode("not a data URL".to_string()))?;
        let (header, data) = rest
            .split_once(',')
            .ok_or_else(|| Error::Decode("data URL has no payload".to_string()))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| Error::Decode("data URL is not base64 encoded".to_string()))?;
        if mime_type.is_empty() {
            return Err(Error::Decode("data URL has no MIME type".to_string()));
        }

        let payload = Self {
            mime_type: mime_type.to_string(),
            data: data.to_string(),
        };
        payload.decode()?;
        Ok(payload)
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// The original bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.data)
            .map_err(|e| Error::Decode(format!("invalid base64 payload: {}", e)))
    }
}

/// Read `path` once and encode it for a request body.
pub async fn encode_file(path: &Path) -> Result<BinaryPayload> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| Error::Decode(format!("{}: {}", path.display(), e)))?;

    let mime_type = detect_mime(&bytes, Some(path));
    tracing::debug!(
        "Encoded {} ({} bytes, {})",
        path.display(),
        bytes.len(),
        mime_type
    );

    Ok(BinaryPayload::from_bytes(&bytes, mime_type))
}
