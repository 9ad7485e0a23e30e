use super::client::GeminiHttpClient;
use crate::ai::{BinaryPayload, ImageGenerationService};
use crate::models::{AspectRatio, ImageGenerationRequest};
use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const OUTPUT_MIME_TYPE: &str = "image/png";

#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<PredictInstance>,
    parameters: PredictParameters,
}

#[derive(Debug, Serialize)]
struct PredictInstance {
    prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters {
    sample_count: u32,
    aspect_ratio: AspectRatio,
    output_options: OutputOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OutputOptions {
    mime_type: String,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
    rai_filtered_reason: Option<String>,
}

/// Imagen text-to-image client.
pub struct GeminiImageClient {
    http: GeminiHttpClient,
}

impl GeminiImageClient {
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

super::impl_with_gemini_base_url!(GeminiImageClient);

#[async_trait]
impl ImageGenerationService for GeminiImageClient {
    async fn generate_image(&self, request: &ImageGenerationRequest) -> Result<String> {
        let body = PredictRequest {
            instances: vec![PredictInstance {
                prompt: request.prompt.clone(),
            }],
            parameters: PredictParameters {
                sample_count: 1,
                aspect_ratio: request.aspect_ratio,
                output_options: OutputOptions {
                    mime_type: OUTPUT_MIME_TYPE.to_string(),
                },
            },
        };

        let response: PredictResponse = self
            .http
            .predict(&body)
            .await
            .map_err(Error::into_generation)?;

        let prediction = response.predictions.into_iter().next();
        let image = match prediction {
            Some(Prediction {
                bytes_base64_encoded: Some(data),
                mime_type,
                ..
            }) => BinaryPayload {
                mime_type: mime_type.unwrap_or_else(|| OUTPUT_MIME_TYPE.to_string()),
                data,
            },
            Some(Prediction {
                rai_filtered_reason: Some(reason),
                ..
            }) => {
                tracing::warn!("Imagen filtered the generated image: {}", reason);
                return Err(Error::NoImageInResponse);
            }
            _ => return Err(Error::NoImageInResponse),
        };

        tracing::debug!("Imagen returned image with mime_type: {}", image.mime_type);

        Ok(image.to_data_url())
    }
}
