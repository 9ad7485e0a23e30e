pub mod analysis;
pub mod chat;
pub mod client;
pub mod edit;
pub mod image;
pub mod sse;
pub mod types;
pub mod video;

pub use analysis::GeminiAnalysisClient;
pub use chat::GeminiChatClient;
pub use client::GeminiHttpClient;
pub use edit::GeminiEditClient;
pub use image::GeminiImageClient;
pub use video::GeminiVideoClient;

/// Adds `with_base_url` to a client that wraps a single `http: GeminiHttpClient`.
macro_rules! impl_with_gemini_base_url {
    ($client:ty) => {
        impl $client {
            pub fn with_base_url(mut self, base_url: String) -> Self {
                self.http = self.http.with_base_url(base_url);
                self
            }
        }
    };
}
pub(crate) use impl_with_gemini_base_url;
