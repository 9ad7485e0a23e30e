//! AI service integration for editing, generating, analyzing, and chatting
//!
//! Every capability is a small trait with one Gemini-backed implementation and
//! one in-memory mock, so page controllers can be exercised without a network.

pub mod encoder;
pub mod gemini;
pub mod mime;
pub mod mock;
pub mod poller;
pub mod session;

pub use encoder::{encode_file, BinaryPayload};
pub use gemini::{
    GeminiAnalysisClient, GeminiChatClient, GeminiEditClient, GeminiImageClient,
    GeminiVideoClient,
};
pub use mock::{
    MockAnalysisClient, MockChatClient, MockEditClient, MockImageGenerationClient,
    MockVideoClient,
};
pub use poller::JobPoller;
pub use session::{ChatReply, ChatSession};

use crate::models::{
    AnalysisRequest, ChatTurn, EditRequest, GeneratedVideo, ImageGenerationRequest,
    VideoGenerationRequest, VideoJob,
};
use crate::Result;
use async_trait::async_trait;
use futures_util::stream::BoxStream;

/// One-shot, ordered stream of reply fragments for a single chat turn.
pub type FragmentStream = BoxStream<'static, Result<String>>;

#[async_trait]
pub trait ImageEditService: Send + Sync {
    /// Returns the edited image as a data URL.
    async fn edit_image(&self, request: &EditRequest) -> Result<String>;
}

#[async_trait]
pub trait ImageGenerationService: Send + Sync {
    /// Returns the generated image as a data URL.
    async fn generate_image(&self, request: &ImageGenerationRequest) -> Result<String>;
}

#[async_trait]
pub trait ImageAnalysisService: Send + Sync {
    async fn analyze_image(&self, request: &AnalysisRequest) -> Result<String>;
}

#[async_trait]
pub trait ChatService: Send + Sync {
    /// Stream the model's reply to `history`, whose last turn is the new user message.
    async fn stream_reply(
        &self,
        system_instruction: &str,
        history: &[ChatTurn],
    ) -> Result<FragmentStream>;
}

#[async_trait]
pub trait VideoGenerationService: Send + Sync {
    async fn submit(&self, request: &VideoGenerationRequest) -> Result<VideoJob>;
    async fn refresh(&self, job: &VideoJob) -> Result<VideoJob>;
    async fn download(&self, uri: &str) -> Result<GeneratedVideo>;
}
