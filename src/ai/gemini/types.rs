//! Shared Gemini payload types used across edit, analysis, and chat modules.

use crate::ai::BinaryPayload;
use serde::{Deserialize, Serialize};

/// Gemini content container used in both requests and responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn new(role: Option<&str>, parts: Vec<Part>) -> Self {
        Self {
            role: role.map(str::to_string),
            parts,
        }
    }
}

/// Untagged union of text and inline media content parts.
///
/// Variant order matters for `#[serde(untagged)]` decoding; parts we do not
/// model (function calls, code execution, ...) land in `Other`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        thought: Option<bool>,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: BinaryPayload,
    },
    Other(serde_json::Value),
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text {
            text: text.into(),
            thought: None,
        }
    }

    pub fn inline(payload: &BinaryPayload) -> Self {
        Part::InlineData {
            inline_data: payload.clone(),
        }
    }
}

/// Top-level `generateContent` response envelope, also used per stream chunk.
#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// Candidate completion item returned by Gemini.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

impl GenerateContentResponse {
    fn first_parts(&self) -> &[Part] {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| content.parts.as_slice())
            .unwrap_or_default()
    }

    /// First inline media part of the first candidate.
    pub fn first_inline_data(&self) -> Option<&BinaryPayload> {
        self.first_parts().iter().find_map(|p| match p {
            Part::InlineData { inline_data } => Some(inline_data),
            _ => None,
        })
    }

    /// All answer text of the first candidate, skipping thought summaries.
    pub fn text(&self) -> Option<String> {
        let texts: Vec<&str> = self
            .first_parts()
            .iter()
            .filter_map(|p| match p {
                Part::Text { text, thought } if *thought != Some(true) => Some(text.as_str()),
                _ => None,
            })
            .collect();

        if texts.is_empty() {
            None
        } else {
            Some(texts.concat())
        }
    }

    pub fn finish_reason(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(value: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_text_skips_thoughts_and_joins_parts() {
        let response = parse(serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "thinking...", "thought": true },
                        { "text": "A cat " },
                        { "text": "on a mat." }
                    ]
                }
            }]
        }));
        assert_eq!(response.text().as_deref(), Some("A cat on a mat."));
    }

    #[test]
    fn test_unknown_parts_do_not_break_parsing() {
        let response = parse(serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "executableCode": { "code": "print(1)" } },
                        { "inlineData": { "mimeType": "image/png", "data": "AAAA" } }
                    ]
                },
                "finishReason": "STOP"
            }]
        }));
        assert_eq!(response.first_inline_data().unwrap().mime_type, "image/png");
        assert_eq!(response.finish_reason(), Some("STOP"));
        assert!(response.text().is_none());
    }

    #[test]
    fn test_blocked_candidate_without_content() {
        let response = parse(serde_json::json!({
            "candidates": [{ "finishReason": "SAFETY" }]
        }));
        assert!(response.first_inline_data().is_none());
        assert!(response.text().is_none());
    }

    #[test]
    fn test_part_serialization_shape() {
        let json = serde_json::to_value(vec![
            Part::inline(&BinaryPayload::from_bytes(b"x", "image/png")),
            Part::text("hello"),
        ])
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                { "inlineData": { "mimeType": "image/png", "data": "eA==" } },
                { "text": "hello" }
            ])
        );
    }
}
