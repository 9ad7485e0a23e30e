use super::sse::SseDecoder;
use crate::error::ProviderFailure;
use crate::{Error, Result};
use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

pub(crate) const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Lightweight Gemini REST client shared by the edit/image/analysis/chat/video modules.
pub struct GeminiHttpClient {
    pub(crate) client: Client,
    pub(crate) api_key: String,
    model: String,
    pub(crate) base_url: String,
    timeout: Duration,
}

impl GeminiHttpClient {
    /// Construct a Gemini client.
    ///
    /// `model` should be the bare model ID (for example `gemini-2.5-flash`),
    /// not a `models/...`-prefixed path segment.
    pub fn new(api_key: String, model: String, timeout: Duration) -> Self {
        Self::new_with_client(api_key, model, timeout, Client::new())
    }

    pub fn new_with_client(
        api_key: String,
        model: String,
        timeout: Duration,
        client: Client,
    ) -> Self {
        let model = model.strip_prefix("models/").unwrap_or(&model).to_string();

        Self {
            client,
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Returns the configured model ID without the `models/` prefix.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn model_url(&self, method: &str) -> String {
        format!("{}/v1beta/models/{}:{}", self.base_url, self.model, method)
    }

    /// Turn a non-2xx response into a provider failure, preferring the API's own message.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let error_text = response.text().await?;
        tracing::error!("Gemini API error (status {}): {}", status, error_text);

        let message = serde_json::from_str::<ApiErrorEnvelope>(&error_text)
            .map(|envelope| envelope.error.message)
            .unwrap_or(error_text);

        Err(Error::Provider(ProviderFailure::new(
            Some(status.as_u16()),
            message,
        )))
    }

    async fn parse_body<Resp: DeserializeOwned>(response: reqwest::Response) -> Result<Resp> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse Gemini response: {}\nBody: {}", e, body);
            Error::Provider(ProviderFailure::new(
                None,
                format!("Failed to parse Gemini response: {}", e),
            ))
        })
    }

    async fn post_to_url<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        url: String,
        request: &Req,
    ) -> Result<Resp> {
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to Gemini: {}", e);
                e
            })?;

        let response = Self::check_status(response).await?;
        Self::parse_body(response).await
    }

    /// Calls Gemini's `generateContent` endpoint for edit/analysis requests.
    pub async fn generate_content<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        request: &Req,
    ) -> Result<Resp> {
        self.post_to_url(self.model_url("generateContent"), request)
            .await
    }

    /// Calls the Imagen `predict` endpoint.
    pub async fn predict<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        request: &Req,
    ) -> Result<Resp> {
        self.post_to_url(self.model_url("predict"), request).await
    }

    /// Starts a long-running operation (Veo) and returns the operation envelope.
    pub async fn predict_long_running<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        request: &Req,
    ) -> Result<Resp> {
        self.post_to_url(self.model_url("predictLongRunning"), request)
            .await
    }

    /// Fetches a long-running operation by its resource name.
    pub async fn get_operation<Resp: DeserializeOwned>(&self, name: &str) -> Result<Resp> {
        let url = format!("{}/v1beta/{}", self.base_url, name.trim_start_matches('/'));
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        Self::parse_body(response).await
    }

    /// True when `uri` points at the same scheme, host and port as the API.
    fn is_api_origin(&self, uri: &str) -> bool {
        match (reqwest::Url::parse(uri), reqwest::Url::parse(&self.base_url)) {
            (Ok(target), Ok(base)) => target.origin() == base.origin(),
            _ => false,
        }
    }

    /// Downloads a generated file, returning its bytes and reported content type.
    ///
    /// The API key is only attached when the file is served from the API origin.
    pub async fn download(&self, uri: &str) -> Result<(Vec<u8>, Option<String>)> {
        tracing::debug!("Downloading {}", uri);

        let mut request = self.client.get(uri).timeout(self.timeout);
        if self.is_api_origin(uri) {
            request = request.header("x-goog-api-key", &self.api_key);
        } else {
            tracing::warn!("Downloading {} without credentials (foreign origin)", uri);
        }
        let response = request.send().await?;

        let response = Self::check_status(response).await?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        let bytes = response.bytes().await?.to_vec();

        Ok((bytes, content_type))
    }

    /// Calls `streamGenerateContent` in SSE mode and yields each decoded chunk in order.
    pub async fn stream_generate_content<Req, Resp>(
        &self,
        request: &Req,
    ) -> Result<BoxStream<'static, Result<Resp>>>
    where
        Req: Serialize,
        Resp: DeserializeOwned + Send + 'static,
    {
        let url = format!("{}?alt=sse", self.model_url("streamGenerateContent"));
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to open Gemini stream: {}", e);
                e
            })?;

        let response = Self::check_status(response).await?;

        let state = (
            response.bytes_stream().boxed(),
            SseDecoder::default(),
            VecDeque::<String>::new(),
            false,
        );

        let chunks = stream::unfold(
            state,
            |(mut bytes, mut decoder, mut pending, mut exhausted)| async move {
                loop {
                    if let Some(event) = pending.pop_front() {
                        let item = serde_json::from_str::<Resp>(&event).map_err(|e| {
                            tracing::error!("Failed to parse Gemini stream chunk: {}\nChunk: {}", e, event);
                            Error::Provider(ProviderFailure::new(
                                None,
                                format!("Failed to parse Gemini stream chunk: {}", e),
                            ))
                        });
                        return Some((item, (bytes, decoder, pending, exhausted)));
                    }

                    if exhausted {
                        return None;
                    }

                    match bytes.next().await {
                        Some(Ok(chunk)) => pending.extend(decoder.push(&chunk)),
                        Some(Err(e)) => {
                            exhausted = true;
                            pending.clear();
                            return Some((Err(Error::Http(e)), (bytes, decoder, pending, exhausted)));
                        }
                        None => {
                            exhausted = true;
                            pending.extend(decoder.finish());
                        }
                    }
                }
            },
        );

        Ok(chunks.boxed())
    }
}
