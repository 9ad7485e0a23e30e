use super::record;
use crate::ai::{
    encode_file, BinaryPayload, ImageGenerationService, JobPoller, VideoGenerationService,
};
use crate::credentials::CredentialContext;
use crate::history::{HistoryItem, ImageHistory};
use crate::models::{
    AspectRatio, GeneratedVideo, ImageGenerationRequest, VideoAspectRatio,
    VideoGenerationRequest, VideoResolution,
};
use crate::{Error, Result};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub const KEY_NOT_SELECTED: &str = "API Key not selected. Please select an API key to proceed.";
pub const KEY_INVALID: &str = "API Key is invalid. Please select a valid key.";

/// Text-to-image and text/image-to-video generation with a session history.
pub struct GeneratorPage {
    image_service: Arc<dyn ImageGenerationService>,
    video_service: Arc<dyn VideoGenerationService>,
    poller: JobPoller,
    credentials: CredentialContext,
    prompt: String,
    aspect_ratio: AspectRatio,
    video_aspect_ratio: VideoAspectRatio,
    video_resolution: VideoResolution,
    start_image: Option<BinaryPayload>,
    generated_image: Option<String>,
    generated_video: Option<GeneratedVideo>,
    history: ImageHistory,
    error: Option<String>,
}

impl GeneratorPage {
    pub fn new(
        image_service: Arc<dyn ImageGenerationService>,
        video_service: Arc<dyn VideoGenerationService>,
        poller: JobPoller,
        credentials: CredentialContext,
    ) -> Self {
        Self {
            image_service,
            video_service,
            poller,
            credentials,
            prompt: String::new(),
            aspect_ratio: AspectRatio::default(),
            video_aspect_ratio: VideoAspectRatio::default(),
            video_resolution: VideoResolution::default(),
            start_image: None,
            generated_image: None,
            generated_video: None,
            history: ImageHistory::new(),
            error: None,
        }
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: AspectRatio) {
        self.aspect_ratio = aspect_ratio;
    }

    pub fn set_video_options(&mut self, aspect_ratio: VideoAspectRatio, resolution: VideoResolution) {
        self.video_aspect_ratio = aspect_ratio;
        self.video_resolution = resolution;
    }

    pub fn set_start_image(&mut self, image: Option<BinaryPayload>) {
        self.start_image = image;
    }

    pub async fn upload_start_image(&mut self, path: &Path) -> Result<()> {
        let encoded = encode_file(path).await;
        let image = record(&mut self.error, encoded)?;
        self.start_image = Some(image);
        Ok(())
    }

    /// The prompt is sent and recorded exactly as entered; whitespace only
    /// matters for the emptiness check.
    pub async fn generate_image(&mut self) -> Result<String> {
        if self.prompt.trim().is_empty() {
            return record(
                &mut self.error,
                Err(Error::Validation("Please enter a prompt.".to_string())),
            );
        }

        self.error = None;
        self.generated_image = None;

        let request = ImageGenerationRequest::new(self.prompt.clone(), self.aspect_ratio);
        tracing::info!("Generating {} image", request.aspect_ratio);
        let result = self.image_service.generate_image(&request).await;
        let image_url = record(&mut self.error, result)?;

        self.history.push(HistoryItem::new(
            request.prompt,
            request.aspect_ratio,
            image_url.clone(),
        ));
        self.generated_image = Some(image_url.clone());
        Ok(image_url)
    }

    /// Submit a video job and wait for it, stopping early when `cancel` fires.
    ///
    /// A rejected key marks the credential context unusable and, when the
    /// host offers key selection, reopens it.
    pub async fn generate_video(&mut self, cancel: &CancellationToken) -> Result<GeneratedVideo> {
        if self.prompt.trim().is_empty() && self.start_image.is_none() {
            return record(
                &mut self.error,
                Err(Error::Validation(
                    "Please enter a prompt or upload a starting image.".to_string(),
                )),
            );
        }
        if !self.credentials.has_key() {
            return record(
                &mut self.error,
                Err(Error::Validation(KEY_NOT_SELECTED.to_string())),
            );
        }

        self.error = None;
        self.generated_video = None;

        let request = VideoGenerationRequest {
            prompt: self.prompt.clone(),
            aspect_ratio: self.video_aspect_ratio,
            resolution: self.video_resolution,
            start_image: self.start_image.clone(),
        };

        tracing::info!(
            "Generating {} {} video",
            request.resolution,
            request.aspect_ratio
        );
        match self.run_video_job(&request, cancel).await {
            Ok(video) => {
                self.generated_video = Some(video.clone());
                Ok(video)
            }
            Err(e) if e.is_credential_invalid() => {
                tracing::warn!("Video request rejected the API key: {}", e);
                self.error = Some(KEY_INVALID.to_string());
                self.credentials.invalidate();
                if self.credentials.has_selector() {
                    if let Err(select_err) = self.credentials.reselect().await {
                        tracing::warn!("Key selection failed: {}", select_err);
                    }
                }
                Err(e)
            }
            Err(e) => record(&mut self.error, Err(e)),
        }
    }

    async fn run_video_job(
        &self,
        request: &VideoGenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<GeneratedVideo> {
        let job = self.video_service.submit(request).await?;
        tracing::info!("Submitted video job {}", job.name);
        self.poller
            .run(self.video_service.as_ref(), job, cancel)
            .await
    }

    /// Re-ask the host for key selection after the user requests it.
    pub async fn select_key(&mut self) -> Result<()> {
        self.credentials.reselect().await
    }

    /// Restore a previous generation's prompt, aspect ratio and image.
    pub fn reuse_history_item(&mut self, id: Uuid) -> Result<()> {
        let item = self
            .history
            .get(id)
            .cloned()
            .ok_or_else(|| Error::Validation(format!("No history item with id {}", id)))?;

        self.prompt = item.prompt;
        self.aspect_ratio = item.aspect_ratio;
        self.generated_image = Some(item.image_url);
        self.error = None;
        Ok(())
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect_ratio
    }

    pub fn start_image(&self) -> Option<&BinaryPayload> {
        self.start_image.as_ref()
    }

    pub fn generated_image(&self) -> Option<&str> {
        self.generated_image.as_deref()
    }

    pub fn generated_video(&self) -> Option<&GeneratedVideo> {
        self.generated_video.as_ref()
    }

    pub fn history(&self) -> &ImageHistory {
        &self.history
    }

    pub fn credentials(&self) -> &CredentialContext {
        &self.credentials
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
