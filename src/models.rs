//! Data models and structures
//!
//! Defines the request/response shapes shared by the adapters, the page
//! controllers, and the runtime configuration.

use crate::ai::gemini::client::DEFAULT_BASE_URL;
use crate::ai::BinaryPayload;
use crate::{prompts, Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Output aspect ratios accepted by image generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "4:3")]
    Standard,
    #[serde(rename = "3:4")]
    Tall,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 5] = [
        AspectRatio::Square,
        AspectRatio::Landscape,
        AspectRatio::Portrait,
        AspectRatio::Standard,
        AspectRatio::Tall,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Standard => "4:3",
            AspectRatio::Tall => "3:4",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AspectRatio::Square => "Square (1:1)",
            AspectRatio::Landscape => "Landscape (16:9)",
            AspectRatio::Portrait => "Portrait (9:16)",
            AspectRatio::Standard => "Standard (4:3)",
            AspectRatio::Tall => "Tall (3:4)",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ratio| ratio.as_str() == s)
            .ok_or_else(|| {
                format!("Invalid aspect ratio '{}'. Expected one of 1:1, 16:9, 9:16, 4:3, 3:4", s)
            })
    }
}

/// Aspect ratios supported by video generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VideoAspectRatio {
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
}

impl VideoAspectRatio {
    pub const ALL: [VideoAspectRatio; 2] = [VideoAspectRatio::Landscape, VideoAspectRatio::Portrait];

    pub fn as_str(&self) -> &'static str {
        match self {
            VideoAspectRatio::Landscape => "16:9",
            VideoAspectRatio::Portrait => "9:16",
        }
    }
}

impl fmt::Display for VideoAspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VideoAspectRatio {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "16:9" => Ok(VideoAspectRatio::Landscape),
            "9:16" => Ok(VideoAspectRatio::Portrait),
            _ => Err(format!(
                "Invalid video aspect ratio '{}'. Expected 16:9 or 9:16",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VideoResolution {
    #[default]
    #[serde(rename = "720p")]
    Hd,
    #[serde(rename = "1080p")]
    FullHd,
}

impl VideoResolution {
    pub const ALL: [VideoResolution; 2] = [VideoResolution::Hd, VideoResolution::FullHd];

    pub fn as_str(&self) -> &'static str {
        match self {
            VideoResolution::Hd => "720p",
            VideoResolution::FullHd => "1080p",
        }
    }
}

impl fmt::Display for VideoResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VideoResolution {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "720p" => Ok(VideoResolution::Hd),
            "1080p" => Ok(VideoResolution::FullHd),
            _ => Err(format!(
                "Invalid resolution '{}'. Expected 720p or 1080p",
                s
            )),
        }
    }
}

/// Fast/shallow versus slow/deep image analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisDepth {
    #[default]
    Quick,
    Deep,
}

#[derive(Debug, Clone)]
pub struct EditRequest {
    pub image: BinaryPayload,
    pub instruction: String,
}

impl EditRequest {
    pub fn new(image: BinaryPayload, instruction: impl Into<String>) -> Self {
        Self {
            image,
            instruction: instruction.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImageGenerationRequest {
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
}

impl ImageGenerationRequest {
    pub fn new(prompt: impl Into<String>, aspect_ratio: AspectRatio) -> Self {
        Self {
            prompt: prompt.into(),
            aspect_ratio,
        }
    }
}

#[derive(Debug, Clone)]
pub struct VideoGenerationRequest {
    pub prompt: String,
    pub aspect_ratio: VideoAspectRatio,
    pub resolution: VideoResolution,
    pub start_image: Option<BinaryPayload>,
}

#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub image: BinaryPayload,
    pub depth: AnalysisDepth,
}

impl AnalysisRequest {
    pub fn new(image: BinaryPayload, depth: AnalysisDepth) -> Self {
        Self { image, depth }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Model => "model",
        }
    }
}

/// One turn of a conversation, in the order it was sent or received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
        }
    }
}

/// Handle to a long-running video generation operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoJob {
    pub name: String,
    pub done: bool,
    pub result_uri: Option<String>,
}

impl VideoJob {
    pub fn running(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            done: false,
            result_uri: None,
        }
    }

    pub fn finished(name: impl Into<String>, result_uri: Option<String>) -> Self {
        Self {
            name: name.into(),
            done: true,
            result_uri,
        }
    }
}

/// Video bytes fetched from a finished job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedVideo {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl GeneratedVideo {
    pub fn file_extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "video/webm" => "webm",
            "video/quicktime" => "mov",
            _ => "mp4",
        }
    }

    /// Write the video to `path`, making it playable from the local disk.
    pub async fn save(&self, path: &Path) -> Result<PathBuf> {
        tokio::fs::write(path, &self.bytes).await?;
        tracing::info!(
            "Saved video ({} bytes) to {}",
            self.bytes.len(),
            path.display()
        );
        Ok(path.to_path_buf())
    }
}

/// Quick editing tools offered next to the free-text prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditTool {
    RemoveBackground,
    ColorCorrect,
    RemoveObject(String),
    StyleFilter(String),
    TextPrompt(String),
}

impl EditTool {
    /// Resolve a tool id (as used by the UI) and its optional argument.
    pub fn from_id(id: &str, option: Option<&str>) -> Result<Self> {
        let option = option.unwrap_or_default().to_string();
        match id {
            "remove-bg" => Ok(EditTool::RemoveBackground),
            "color-correct" => Ok(EditTool::ColorCorrect),
            "remove-object" => Ok(EditTool::RemoveObject(option)),
            "style-filter" => Ok(EditTool::StyleFilter(option)),
            "text-prompt" => Ok(EditTool::TextPrompt(option)),
            _ => Err(Error::Validation(
                "Unknown editing tool selected.".to_string(),
            )),
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            EditTool::RemoveBackground => "remove-bg",
            EditTool::ColorCorrect => "color-correct",
            EditTool::RemoveObject(_) => "remove-object",
            EditTool::StyleFilter(_) => "style-filter",
            EditTool::TextPrompt(_) => "text-prompt",
        }
    }

    /// The natural-language instruction sent alongside the image.
    pub fn instruction(&self) -> Result<String> {
        let template = prompts::edit_template(self.id())
            .ok_or_else(|| Error::Validation("Unknown editing tool selected.".to_string()))?;

        match self {
            EditTool::RemoveBackground | EditTool::ColorCorrect => Ok(template.to_string()),
            EditTool::RemoveObject(object) => {
                if object.trim().is_empty() {
                    return Err(Error::Validation(
                        "Please describe the object you want to remove.".to_string(),
                    ));
                }
                Ok(prompts::render(template, &[("object", object)]))
            }
            EditTool::StyleFilter(style) => Ok(prompts::render(template, &[("style", style)])),
            EditTool::TextPrompt(text) => {
                if text.trim().is_empty() {
                    return Err(Error::Validation(
                        "Please enter a description of the edit you want to make.".to_string(),
                    ));
                }
                Ok(prompts::render(template, &[("text", text)]))
            }
        }
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub edit_model: String,
    pub image_model: String,
    pub analysis_model: String,
    pub analysis_deep_model: String,
    pub chat_model: String,
    pub video_model: String,
    pub video_poll_interval: Duration,
    pub video_max_polls: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .map_err(|_| Error::Config("GEMINI_API_KEY not set".to_string()))?;

        let video_poll_interval_secs: u64 = parse_env_or("VIDEO_POLL_INTERVAL_SECS", 5)?;
        let video_max_polls: u32 = parse_env_or("VIDEO_MAX_POLLS", 120)?;

        Ok(Self {
            api_key,
            base_url: env_or("GEMINI_BASE_URL", DEFAULT_BASE_URL),
            edit_model: env_or("EDIT_MODEL", "gemini-2.5-flash-image"),
            image_model: env_or("IMAGE_MODEL", "imagen-4.0-generate-001"),
            analysis_model: env_or("ANALYSIS_MODEL", "gemini-2.5-flash"),
            analysis_deep_model: env_or("ANALYSIS_DEEP_MODEL", "gemini-2.5-pro"),
            chat_model: env_or("CHAT_MODEL", "gemini-2.5-flash"),
            video_model: env_or("VIDEO_MODEL", "veo-3.1-fast-generate-preview"),
            video_poll_interval: Duration::from_secs(video_poll_interval_secs),
            video_max_polls,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{} must be a number, got '{}'", key, raw))),
        Err(_) => Ok(default),
    }
}
