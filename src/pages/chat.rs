use crate::ai::{ChatService, ChatSession};
use crate::models::{ChatRole, ChatTurn};
use crate::Result;
use futures_util::StreamExt;
use std::sync::Arc;

pub const CHAT_FAILURE_REPLY: &str = "Sorry, something went wrong.";

/// Transcript shown to the user, backed by a [`ChatSession`].
///
/// The transcript also records failure notices, which never reach the
/// session's provider history.
pub struct ChatPage {
    session: ChatSession,
    messages: Vec<ChatTurn>,
}

impl ChatPage {
    pub fn new(service: Arc<dyn ChatService>) -> Self {
        Self::with_session(ChatSession::new(service))
    }

    pub fn with_session(session: ChatSession) -> Self {
        Self {
            session,
            messages: Vec::new(),
        }
    }

    /// Send `input` and grow the last model message as fragments arrive.
    ///
    /// Blank input is ignored; anything else is sent as typed. `on_fragment`
    /// sees each fragment in order.
    pub async fn send<F>(&mut self, input: &str, mut on_fragment: F) -> Result<()>
    where
        F: FnMut(&str),
    {
        if input.trim().is_empty() {
            return Ok(());
        }

        self.messages.push(ChatTurn::user(input));

        let mut reply = match self.session.send_message_stream(input).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!("Chat request failed: {}", e);
                self.messages.push(ChatTurn::model(CHAT_FAILURE_REPLY));
                return Err(e);
            }
        };

        self.messages.push(ChatTurn::model(""));
        while let Some(fragment) = reply.next().await {
            match fragment {
                Ok(text) => {
                    if let Some(last) = self.messages.last_mut() {
                        last.text.push_str(&text);
                    }
                    on_fragment(&text);
                }
                Err(e) => {
                    tracing::error!("Chat stream failed: {}", e);
                    self.messages.push(ChatTurn::model(CHAT_FAILURE_REPLY));
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    pub fn messages(&self) -> &[ChatTurn] {
        &self.messages
    }

    pub fn last_reply(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|turn| turn.role == ChatRole::Model)
            .map(|turn| turn.text.as_str())
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }
}
