//! In-memory service doubles used by tests and local harnesses.

use super::{
    ChatService, FragmentStream, ImageAnalysisService, ImageEditService,
    ImageGenerationService, VideoGenerationService,
};
use crate::error::ProviderFailure;
use crate::models::{
    AnalysisDepth, AnalysisRequest, AspectRatio, ChatTurn, EditRequest, GeneratedVideo,
    ImageGenerationRequest, VideoGenerationRequest, VideoJob,
};
use crate::{Error, Result};
use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

const TINY_PNG_DATA_URL: &str = "data:image/png;base64,iVBORw0KGgo=";

#[derive(Clone, Default)]
pub struct MockEditClient {
    responses: Arc<Mutex<Vec<String>>>,
    instructions: Arc<Mutex<Vec<String>>>,
    missing_image: bool,
    failure: Option<ProviderFailure>,
}

impl MockEditClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(self, data_url: String) -> Self {
        self.responses.lock().unwrap().push(data_url);
        self
    }

    /// Behave like a provider that answered with text only.
    pub fn with_missing_image(mut self) -> Self {
        self.missing_image = true;
        self
    }

    pub fn with_failure(mut self, failure: ProviderFailure) -> Self {
        self.failure = Some(failure);
        self
    }

    pub fn instructions(&self) -> Vec<String> {
        self.instructions.lock().unwrap().clone()
    }

    pub fn get_call_count(&self) -> usize {
        self.instructions.lock().unwrap().len()
    }
}

#[async_trait]
impl ImageEditService for MockEditClient {
    async fn edit_image(&self, request: &EditRequest) -> Result<String> {
        let count = {
            let mut instructions = self.instructions.lock().unwrap();
            instructions.push(request.instruction.clone());
            instructions.len()
        };

        if let Some(failure) = &self.failure {
            return Err(Error::Generation(failure.clone()));
        }
        if self.missing_image {
            return Err(Error::NoImageInResponse);
        }

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(TINY_PNG_DATA_URL.to_string())
        } else {
            Ok(responses[(count - 1) % responses.len()].clone())
        }
    }
}

#[derive(Clone, Default)]
pub struct MockImageGenerationClient {
    image_responses: Arc<Mutex<Vec<String>>>,
    calls: Arc<Mutex<Vec<(String, AspectRatio)>>>,
    failure: Option<ProviderFailure>,
}

impl MockImageGenerationClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image_response(self, data_url: String) -> Self {
        self.image_responses.lock().unwrap().push(data_url);
        self
    }

    pub fn with_failure(mut self, failure: ProviderFailure) -> Self {
        self.failure = Some(failure);
        self
    }

    /// Prompts and aspect ratios received, oldest first.
    pub fn calls(&self) -> Vec<(String, AspectRatio)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn get_call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ImageGenerationService for MockImageGenerationClient {
    async fn generate_image(&self, request: &ImageGenerationRequest) -> Result<String> {
        let count = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((request.prompt.clone(), request.aspect_ratio));
            calls.len()
        };

        if let Some(failure) = &self.failure {
            return Err(Error::Generation(failure.clone()));
        }

        let responses = self.image_responses.lock().unwrap();
        if responses.is_empty() {
            Ok(TINY_PNG_DATA_URL.to_string())
        } else {
            Ok(responses[(count - 1) % responses.len()].clone())
        }
    }
}

#[derive(Clone, Default)]
pub struct MockAnalysisClient {
    response: Option<String>,
    depths: Arc<Mutex<Vec<AnalysisDepth>>>,
    failure: Option<ProviderFailure>,
}

impl MockAnalysisClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, text: String) -> Self {
        self.response = Some(text);
        self
    }

    pub fn with_failure(mut self, failure: ProviderFailure) -> Self {
        self.failure = Some(failure);
        self
    }

    pub fn depths(&self) -> Vec<AnalysisDepth> {
        self.depths.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageAnalysisService for MockAnalysisClient {
    async fn analyze_image(&self, request: &AnalysisRequest) -> Result<String> {
        let depth = request.depth;
        self.depths.lock().unwrap().push(depth);

        if let Some(failure) = &self.failure {
            return Err(Error::Analysis(failure.clone()));
        }

        Ok(self
            .response
            .clone()
            .unwrap_or_else(|| format!("A {} image ({:?} analysis)", request.image.mime_type, depth)))
    }
}

/// Scripted reply for [`MockChatClient`].
#[derive(Clone, Debug)]
struct ScriptedReply {
    fragments: Vec<String>,
    fails_after: bool,
}

#[derive(Clone, Default)]
pub struct MockChatClient {
    replies: Arc<Mutex<Vec<ScriptedReply>>>,
    histories: Arc<Mutex<Vec<Vec<ChatTurn>>>>,
    system_instructions: Arc<Mutex<Vec<String>>>,
    failure: Option<ProviderFailure>,
}

impl MockChatClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fragments(self, fragments: &[&str]) -> Self {
        self.push_reply(fragments, false)
    }

    /// Yields `fragments`, then ends the stream with an error.
    pub fn with_fragments_then_error(self, fragments: &[&str]) -> Self {
        self.push_reply(fragments, true)
    }

    pub fn with_failure(mut self, failure: ProviderFailure) -> Self {
        self.failure = Some(failure);
        self
    }

    fn push_reply(self, fragments: &[&str], fails_after: bool) -> Self {
        self.replies.lock().unwrap().push(ScriptedReply {
            fragments: fragments.iter().map(|f| f.to_string()).collect(),
            fails_after,
        });
        self
    }

    /// Context sent with each call, oldest call first.
    pub fn histories(&self) -> Vec<Vec<ChatTurn>> {
        self.histories.lock().unwrap().clone()
    }

    pub fn system_instructions(&self) -> Vec<String> {
        self.system_instructions.lock().unwrap().clone()
    }

    pub fn get_call_count(&self) -> usize {
        self.histories.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatService for MockChatClient {
    async fn stream_reply(
        &self,
        system_instruction: &str,
        history: &[ChatTurn],
    ) -> Result<FragmentStream> {
        let count = {
            let mut histories = self.histories.lock().unwrap();
            histories.push(history.to_vec());
            histories.len()
        };
        self.system_instructions
            .lock()
            .unwrap()
            .push(system_instruction.to_string());

        if let Some(failure) = &self.failure {
            return Err(Error::Chat(failure.clone()));
        }

        let reply = {
            let replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                let echo = history.last().map(|t| t.text.as_str()).unwrap_or_default();
                ScriptedReply {
                    fragments: vec![format!("You said: {}", echo)],
                    fails_after: false,
                }
            } else {
                replies[(count - 1) % replies.len()].clone()
            }
        };

        let mut items: Vec<Result<String>> = reply.fragments.into_iter().map(Ok).collect();
        if reply.fails_after {
            items.push(Err(Error::Chat(ProviderFailure::new(
                None,
                "stream interrupted",
            ))));
        }

        Ok(stream::iter(items).boxed())
    }
}

#[derive(Clone)]
pub struct MockVideoClient {
    pending_checks: u32,
    result_uri: Option<String>,
    video: Vec<u8>,
    submit_failure: Option<ProviderFailure>,
    submissions: Arc<Mutex<Vec<VideoGenerationRequest>>>,
    refresh_times: Arc<Mutex<Vec<Instant>>>,
    downloads: Arc<Mutex<Vec<String>>>,
}

impl Default for MockVideoClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockVideoClient {
    pub fn new() -> Self {
        Self {
            pending_checks: 0,
            result_uri: None,
            video: vec![0x00, 0x00, 0x00, 0x18, 0x66, 0x74, 0x79, 0x70],
            submit_failure: None,
            submissions: Arc::new(Mutex::new(Vec::new())),
            refresh_times: Arc::new(Mutex::new(Vec::new())),
            downloads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of status checks that report "still running" before "done".
    pub fn with_pending_checks(mut self, checks: u32) -> Self {
        self.pending_checks = checks;
        self
    }

    pub fn with_result_uri(mut self, uri: &str) -> Self {
        self.result_uri = Some(uri.to_string());
        self
    }

    pub fn with_submit_failure(mut self, failure: ProviderFailure) -> Self {
        self.submit_failure = Some(failure);
        self
    }

    pub fn video_bytes(&self) -> Vec<u8> {
        self.video.clone()
    }

    pub fn submissions(&self) -> Vec<VideoGenerationRequest> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn refresh_count(&self) -> usize {
        self.refresh_times.lock().unwrap().len()
    }

    pub fn refresh_times(&self) -> Vec<Instant> {
        self.refresh_times.lock().unwrap().clone()
    }

    pub fn download_count(&self) -> usize {
        self.downloads.lock().unwrap().len()
    }
}

#[async_trait]
impl VideoGenerationService for MockVideoClient {
    async fn submit(&self, request: &VideoGenerationRequest) -> Result<VideoJob> {
        self.submissions.lock().unwrap().push(request.clone());

        if let Some(failure) = &self.submit_failure {
            return Err(Error::Generation(failure.clone()));
        }
        Ok(VideoJob::running("operations/mock"))
    }

    async fn refresh(&self, job: &VideoJob) -> Result<VideoJob> {
        let checks = {
            let mut times = self.refresh_times.lock().unwrap();
            times.push(Instant::now());
            times.len() as u32
        };

        if checks <= self.pending_checks {
            Ok(VideoJob::running(job.name.clone()))
        } else {
            Ok(VideoJob::finished(job.name.clone(), self.result_uri.clone()))
        }
    }

    async fn download(&self, uri: &str) -> Result<GeneratedVideo> {
        self.downloads.lock().unwrap().push(uri.to_string());
        Ok(GeneratedVideo {
            bytes: self.video.clone(),
            mime_type: "video/mp4".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::BinaryPayload;
    use futures_util::TryStreamExt;

    #[tokio::test]
    async fn test_mock_edit_client_custom_responses() {
        let client = MockEditClient::new()
            .with_response("data:image/png;base64,AAAA".to_string())
            .with_response("data:image/png;base64,BBBB".to_string());
        let image = BinaryPayload::from_bytes(b"img", "image/png");

        assert_eq!(
            client.edit_image(&EditRequest::new(image.clone(), "one")).await.unwrap(),
            "data:image/png;base64,AAAA"
        );
        assert_eq!(
            client.edit_image(&EditRequest::new(image.clone(), "two")).await.unwrap(),
            "data:image/png;base64,BBBB"
        );
        // Should cycle back
        assert_eq!(
            client.edit_image(&EditRequest::new(image.clone(), "three")).await.unwrap(),
            "data:image/png;base64,AAAA"
        );
        assert_eq!(client.instructions(), vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_mock_chat_client_default_echo() {
        let client = MockChatClient::new();
        let stream = client
            .stream_reply("sys", &[ChatTurn::user("ping")])
            .await
            .unwrap();
        let fragments: Vec<String> = stream.try_collect().await.unwrap();
        assert_eq!(fragments, vec!["You said: ping"]);
    }

    #[tokio::test]
    async fn test_mock_video_client_reports_done_after_pending_checks() {
        let client = MockVideoClient::new()
            .with_pending_checks(1)
            .with_result_uri("uri");
        let job = VideoJob::running("op");

        assert!(!client.refresh(&job).await.unwrap().done);
        let done = client.refresh(&job).await.unwrap();
        assert!(done.done);
        assert_eq!(done.result_uri.as_deref(), Some("uri"));
    }
}
