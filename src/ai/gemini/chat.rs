use super::client::GeminiHttpClient;
use super::types::{Content, GenerateContentResponse, Part};
use crate::ai::{ChatService, FragmentStream};
use crate::models::ChatTurn;
use crate::{Error, Result};
use async_trait::async_trait;
use futures_util::{future, StreamExt};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ChatRequest {
    system_instruction: Option<Content>,
    contents: Vec<Content>,
}

pub struct GeminiChatClient {
    http: GeminiHttpClient,
}

impl GeminiChatClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(
                api_key,
                model,
                Duration::from_secs(300),
                client,
            ),
        }
    }

    fn to_contents(history: &[ChatTurn]) -> Vec<Content> {
        history
            .iter()
            .map(|turn| Content::new(Some(turn.role.as_str()), vec![Part::text(turn.text.clone())]))
            .collect()
    }
}

super::impl_with_gemini_base_url!(GeminiChatClient);

#[async_trait]
impl ChatService for GeminiChatClient {
    async fn stream_reply(
        &self,
        system_instruction: &str,
        history: &[ChatTurn],
    ) -> Result<FragmentStream> {
        tracing::debug!(
            "Streaming chat reply from {} ({} turns of context)",
            self.http.model(),
            history.len()
        );

        let request = ChatRequest {
            system_instruction: Some(Content::new(None, vec![Part::text(system_instruction)])),
            contents: Self::to_contents(history),
        };

        let chunks = self
            .http
            .stream_generate_content::<_, GenerateContentResponse>(&request)
            .await
            .map_err(Error::into_chat)?;

        let fragments = chunks.filter_map(|chunk| {
            future::ready(match chunk {
                Ok(response) => response.text().map(Ok),
                Err(e) => Some(Err(e.into_chat())),
            })
        });

        Ok(fragments.boxed())
    }
}
