//! Application wiring for the editor, generator, analyzer, and chat pages.

use crate::ai::{
    ChatService, GeminiAnalysisClient, GeminiChatClient, GeminiEditClient, GeminiImageClient,
    GeminiVideoClient, ImageAnalysisService, ImageEditService, ImageGenerationService, JobPoller,
    VideoGenerationService,
};
use crate::credentials::{CredentialContext, KeySelector};
use crate::models::Config;
use crate::pages::{AnalyzerPage, ChatPage, EditorPage, GeneratorPage};
use crate::Result;
use std::sync::Arc;
use tracing::info;

/// Shared services behind every page.
pub struct App {
    edit: Arc<dyn ImageEditService>,
    image_gen: Arc<dyn ImageGenerationService>,
    analysis: Arc<dyn ImageAnalysisService>,
    chat: Arc<dyn ChatService>,
    video: Arc<dyn VideoGenerationService>,
    poller: JobPoller,
    key_selector: Option<Arc<dyn KeySelector>>,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub edit: Arc<dyn ImageEditService>,
    pub image_gen: Arc<dyn ImageGenerationService>,
    pub analysis: Arc<dyn ImageAnalysisService>,
    pub chat: Arc<dyn ChatService>,
    pub video: Arc<dyn VideoGenerationService>,
}

impl App {
    /// Build an app from concrete service dependencies.
    ///
    /// This is primarily useful for integration tests and local harnesses that
    /// need to inject mocks.
    pub fn with_services(services: AppServices, poller: JobPoller) -> Self {
        Self {
            edit: services.edit,
            image_gen: services.image_gen,
            analysis: services.analysis,
            chat: services.chat,
            video: services.video,
            poller,
            key_selector: None,
        }
    }

    /// Use a host key-selection mechanism for video generation.
    pub fn with_key_selector(mut self, selector: Arc<dyn KeySelector>) -> Self {
        self.key_selector = Some(selector);
        self
    }

    /// Construct an app from environment configuration (`Config::from_env`).
    pub fn new() -> Result<Self> {
        let config = Config::from_env()?;
        Ok(Self::from_config(&config))
    }

    pub fn from_config(config: &Config) -> Self {
        // Reuse one HTTP connection pool across provider clients.
        let http_client = reqwest::Client::new();
        let api_key = config.api_key.clone();
        let base_url = config.base_url.clone();

        info!("Edit model: {}", config.edit_model);
        let edit = GeminiEditClient::new_with_client(
            api_key.clone(),
            config.edit_model.clone(),
            http_client.clone(),
        )
        .with_base_url(base_url.clone());

        info!("Image model: {}", config.image_model);
        let image_gen = GeminiImageClient::new_with_client(
            api_key.clone(),
            config.image_model.clone(),
            http_client.clone(),
        )
        .with_base_url(base_url.clone());

        info!(
            "Analysis models: {} (quick), {} (deep)",
            config.analysis_model, config.analysis_deep_model
        );
        let analysis = GeminiAnalysisClient::new_with_client(
            api_key.clone(),
            config.analysis_model.clone(),
            config.analysis_deep_model.clone(),
            http_client.clone(),
        )
        .with_base_url(base_url.clone());

        info!("Chat model: {}", config.chat_model);
        let chat = GeminiChatClient::new_with_client(
            api_key.clone(),
            config.chat_model.clone(),
            http_client.clone(),
        )
        .with_base_url(base_url.clone());

        info!("Video model: {}", config.video_model);
        let video =
            GeminiVideoClient::new_with_client(api_key, config.video_model.clone(), http_client)
                .with_base_url(base_url);

        Self::with_services(
            AppServices {
                edit: Arc::new(edit),
                image_gen: Arc::new(image_gen),
                analysis: Arc::new(analysis),
                chat: Arc::new(chat),
                video: Arc::new(video),
            },
            JobPoller::new(config.video_poll_interval, config.video_max_polls),
        )
    }

    pub fn editor_page(&self) -> EditorPage {
        EditorPage::new(self.edit.clone())
    }

    /// Opens the generator page, checking key availability once.
    pub async fn generator_page(&self) -> GeneratorPage {
        let credentials = match &self.key_selector {
            Some(selector) => CredentialContext::check(Some(selector.clone())).await,
            None => CredentialContext::assume_configured(),
        };
        GeneratorPage::new(
            self.image_gen.clone(),
            self.video.clone(),
            self.poller,
            credentials,
        )
    }

    pub fn analyzer_page(&self) -> AnalyzerPage {
        AnalyzerPage::new(self.analysis.clone())
    }

    pub fn chat_page(&self) -> ChatPage {
        ChatPage::new(self.chat.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AspectRatio, VideoAspectRatio, VideoResolution};
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: String) -> Config {
        Config {
            api_key: "test-key".to_string(),
            base_url,
            edit_model: "edit-model".to_string(),
            image_model: "image-model".to_string(),
            analysis_model: "quick-model".to_string(),
            analysis_deep_model: "deep-model".to_string(),
            chat_model: "chat-model".to_string(),
            video_model: "video-model".to_string(),
            video_poll_interval: Duration::from_millis(10),
            video_max_polls: 5,
        }
    }

    #[tokio::test]
    async fn test_from_config_routes_each_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/image-model:predict"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "predictions": [{"bytesBase64Encoded": "iVBORw0KGgo=", "mimeType": "image/png"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let app = App::from_config(&config(server.uri()));
        let mut page = app.generator_page().await;
        page.set_prompt("a lighthouse");
        page.set_aspect_ratio(AspectRatio::Portrait);

        let url = page.generate_image().await.unwrap();
        assert_eq!(url, "data:image/png;base64,iVBORw0KGgo=");
    }

    #[tokio::test]
    async fn test_from_config_video_flow_uses_configured_poller() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/video-model:predictLongRunning"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"name": "operations/op-1"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1beta/operations/op-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "operations/op-1",
                "done": true,
                "response": {"generateVideoResponse": {"generatedSamples": [
                    {"video": {"uri": format!("{}/files/video.mp4", server.uri())}}
                ]}}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/files/video.mp4"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "video/mp4")
                    .set_body_bytes(vec![1u8, 2, 3]),
            )
            .expect(1)
            .mount(&server)
            .await;

        let app = App::from_config(&config(server.uri()));
        let mut page = app.generator_page().await;
        page.set_prompt("waves");
        page.set_video_options(VideoAspectRatio::Landscape, VideoResolution::Hd);

        let video = page
            .generate_video(&tokio_util::sync::CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(video.bytes, vec![1, 2, 3]);
    }
}
