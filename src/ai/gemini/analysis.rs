use super::client::GeminiHttpClient;
use super::types::{Content, GenerateContentResponse, Part};
use crate::ai::ImageAnalysisService;
use crate::error::ProviderFailure;
use crate::models::{AnalysisDepth, AnalysisRequest};
use crate::{prompts, Error, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// Reasoning budget granted to the deep model.
const DEEP_THINKING_BUDGET: u32 = 32768;

#[derive(Debug, Serialize)]
struct AnalysisBody {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<AnalysisGenerationConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisGenerationConfig {
    thinking_config: ThinkingConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

/// Describes images with either a fast model or a slower reasoning model.
pub struct GeminiAnalysisClient {
    quick: GeminiHttpClient,
    deep: GeminiHttpClient,
}

impl GeminiAnalysisClient {
    pub fn new(api_key: String, quick_model: String, deep_model: String) -> Self {
        Self::new_with_client(api_key, quick_model, deep_model, reqwest::Client::new())
    }

    pub fn new_with_client(
        api_key: String,
        quick_model: String,
        deep_model: String,
        client: reqwest::Client,
    ) -> Self {
        Self {
            quick: GeminiHttpClient::new_with_client(
                api_key.clone(),
                quick_model,
                Duration::from_secs(60),
                client.clone(),
            ),
            deep: GeminiHttpClient::new_with_client(
                api_key,
                deep_model,
                Duration::from_secs(300),
                client,
            ),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.quick = self.quick.with_base_url(base_url.clone());
        self.deep = self.deep.with_base_url(base_url);
        self
    }
}

#[async_trait]
impl ImageAnalysisService for GeminiAnalysisClient {
    async fn analyze_image(&self, request: &AnalysisRequest) -> Result<String> {
        let depth = request.depth;
        let (http, generation_config) = match depth {
            AnalysisDepth::Quick => (&self.quick, None),
            AnalysisDepth::Deep => (
                &self.deep,
                Some(AnalysisGenerationConfig {
                    thinking_config: ThinkingConfig {
                        thinking_budget: DEEP_THINKING_BUDGET,
                    },
                }),
            ),
        };

        tracing::debug!(
            "Analyzing {} image with {} ({:?})",
            request.image.mime_type,
            http.model(),
            depth
        );

        let body = AnalysisBody {
            contents: vec![Content::new(
                None,
                vec![
                    Part::inline(&request.image),
                    Part::text(prompts::ANALYSIS_USER),
                ],
            )],
            generation_config,
        };

        let response: GenerateContentResponse = http
            .generate_content(&body)
            .await
            .map_err(Error::into_analysis)?;

        response.text().ok_or_else(|| {
            Error::Analysis(ProviderFailure::new(
                None,
                format!(
                    "No text in Gemini analysis response (finish reason: {})",
                    response.finish_reason().unwrap_or("unknown")
                ),
            ))
        })
    }
}
