//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Marker the provider returns when the selected API key does not resolve.
const CREDENTIAL_NOT_FOUND: &str = "Requested entity was not found.";

/// A provider call that completed at the transport level but was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    pub status: Option<u16>,
    pub message: String,
}

impl ProviderFailure {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// True when the provider says the credential is missing or invalid.
    ///
    /// Callers special-case this by asking the host to select a key again.
    pub fn is_credential_invalid(&self) -> bool {
        matches!(self.status, Some(401) | Some(403)) || self.message.contains(CREDENTIAL_NOT_FOUND)
    }
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (status {})", self.message, status),
            None => f.write_str(&self.message),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Could not read file: {0}")]
    Decode(String),

    #[error("No image data found in the AI response.")]
    NoImageInResponse,

    #[error("Video generation failed or returned no link.")]
    MissingResult,

    #[error("Generation failed: {0}")]
    Generation(ProviderFailure),

    #[error("Analysis failed: {0}")]
    Analysis(ProviderFailure),

    #[error("Chat failed: {0}")]
    Chat(ProviderFailure),

    #[error("Gemini API error: {0}")]
    Provider(ProviderFailure),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(String),

    #[error("Video job did not finish after {attempts} status checks ({elapsed:?})")]
    Timeout { attempts: u32, elapsed: Duration },

    #[error("Video generation was cancelled")]
    Cancelled,
}

impl Error {
    /// Re-labels a raw provider failure as a generation failure.
    ///
    /// Transport and decoding errors pass through unchanged.
    pub fn into_generation(self) -> Self {
        match self {
            Error::Provider(failure) => Error::Generation(failure),
            other => other,
        }
    }

    pub fn into_analysis(self) -> Self {
        match self {
            Error::Provider(failure) => Error::Analysis(failure),
            other => other,
        }
    }

    pub fn into_chat(self) -> Self {
        match self {
            Error::Provider(failure) => Error::Chat(failure),
            other => other,
        }
    }

    /// The provider failure behind this error, if it came from the provider.
    pub fn provider_failure(&self) -> Option<&ProviderFailure> {
        match self {
            Error::Generation(f) | Error::Analysis(f) | Error::Chat(f) | Error::Provider(f) => {
                Some(f)
            }
            _ => None,
        }
    }

    pub fn is_credential_invalid(&self) -> bool {
        self.provider_failure()
            .is_some_and(ProviderFailure::is_credential_invalid)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
