use super::client::GeminiHttpClient;
use super::types::{Content, GenerateContentResponse, Part};
use crate::ai::ImageEditService;
use crate::models::EditRequest;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct EditBody {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: EditGenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EditGenerationConfig {
    response_modalities: Vec<String>,
}

pub struct GeminiEditClient {
    http: GeminiHttpClient,
}

impl GeminiEditClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(
                api_key,
                model,
                Duration::from_secs(120),
                client,
            ),
        }
    }
}

super::impl_with_gemini_base_url!(GeminiEditClient);

#[async_trait]
impl ImageEditService for GeminiEditClient {
    async fn edit_image(&self, request: &EditRequest) -> Result<String> {
        tracing::debug!(
            "Editing {} image with {}: {}",
            request.image.mime_type,
            self.http.model(),
            request.instruction
        );

        let body = EditBody {
            contents: vec![Content::new(
                None,
                vec![
                    Part::inline(&request.image),
                    Part::text(request.instruction.as_str()),
                ],
            )],
            generation_config: EditGenerationConfig {
                response_modalities: vec!["IMAGE".to_string()],
            },
        };

        let response: GenerateContentResponse = self
            .http
            .generate_content(&body)
            .await
            .map_err(Error::into_generation)?;

        let edited = response.first_inline_data().ok_or_else(|| {
            tracing::warn!(
                "Gemini edit response had no image part (finish reason: {:?})",
                response.finish_reason()
            );
            Error::NoImageInResponse
        })?;

        Ok(edited.to_data_url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::gemini::test_support;
    use crate::ai::BinaryPayload;
    use wiremock::matchers::body_partial_json;
    use wiremock::{MockServer, ResponseTemplate};

    const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";

    fn make_client(server: &MockServer) -> GeminiEditClient {
        GeminiEditClient::new("key".to_string(), DEFAULT_MODEL.to_string())
            .with_base_url(server.uri())
    }

    fn source_image() -> BinaryPayload {
        BinaryPayload::from_bytes(&[0xFF, 0xD8, 0xFF, 0xE0], "image/jpeg")
    }

    #[tokio::test]
    async fn test_edit_sends_image_then_instruction() {
        let server = MockServer::start().await;
        let image = source_image();

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .and(body_partial_json(serde_json::json!({
                "contents": [{
                    "parts": [
                        { "inlineData": { "mimeType": "image/jpeg", "data": image.data } },
                        { "text": "Apply a cartoon style to this image." }
                    ]
                }],
                "generationConfig": { "responseModalities": ["IMAGE"] }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {
                        "parts": [
                            { "text": "Here you go" },
                            { "inlineData": { "mimeType": "image/png", "data": "iVBORw==" } }
                        ]
                    }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let url = make_client(&server)
            .edit_image(&EditRequest::new(
                image,
                "Apply a cartoon style to this image.",
            ))
            .await
            .unwrap();
        assert_eq!(url, "data:image/png;base64,iVBORw==");
    }

    #[tokio::test]
    async fn test_response_without_image_is_no_image_error() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": { "parts": [{ "text": "I cannot edit this image." }] }
                }]
            })))
            .mount(&server)
            .await;

        let err = make_client(&server)
            .edit_image(&EditRequest::new(source_image(), "Remove the tree"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoImageInResponse));
    }

    #[tokio::test]
    async fn test_empty_candidates_is_no_image_error() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "candidates": [] })),
            )
            .mount(&server)
            .await;

        let err = make_client(&server)
            .edit_image(&EditRequest::new(source_image(), "Remove the tree"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoImageInResponse));
    }

    #[tokio::test]
    async fn test_api_error_returns_generation_error() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&server)
            .await;

        let err = make_client(&server)
            .edit_image(&EditRequest::new(source_image(), "Remove the tree"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
    }
}
