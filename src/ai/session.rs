//! Conversational sessions layered over a [`ChatService`].

use super::{ChatService, FragmentStream};
use crate::models::ChatTurn;
use crate::{prompts, Result};
use futures_util::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// In-memory conversation with a fixed system instruction.
///
/// History is append-only and lives as long as the session.
pub struct ChatSession {
    service: Arc<dyn ChatService>,
    system_instruction: String,
    history: Vec<ChatTurn>,
}

impl ChatSession {
    pub fn new(service: Arc<dyn ChatService>) -> Self {
        Self::with_system_instruction(service, prompts::CHAT_SYSTEM)
    }

    pub fn with_system_instruction(service: Arc<dyn ChatService>, instruction: &str) -> Self {
        Self {
            service,
            system_instruction: instruction.to_string(),
            history: Vec::new(),
        }
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    /// Completed turns, oldest first.
    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    /// Send the next user turn and stream the reply.
    ///
    /// The exchange is recorded in the history only once the reply stream
    /// has been read to the end without error.
    pub async fn send_message_stream(&mut self, text: &str) -> Result<ChatReply<'_>> {
        let mut context = self.history.clone();
        context.push(ChatTurn::user(text));

        let fragments = self
            .service
            .stream_reply(&self.system_instruction, &context)
            .await?;

        Ok(ChatReply {
            session: self,
            fragments,
            user_text: text.to_string(),
            reply: String::new(),
            finished: false,
        })
    }
}

/// One-shot stream of reply fragments for a single turn.
pub struct ChatReply<'a> {
    session: &'a mut ChatSession,
    fragments: FragmentStream,
    user_text: String,
    reply: String,
    finished: bool,
}

impl ChatReply<'_> {
    /// Text received so far.
    pub fn text(&self) -> &str {
        &self.reply
    }

    /// Drain the stream and return the full reply.
    pub async fn collect_text(mut self) -> Result<String> {
        while let Some(fragment) = self.next().await {
            fragment?;
        }
        Ok(std::mem::take(&mut self.reply))
    }
}

impl Stream for ChatReply<'_> {
    type Item = Result<String>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }

        match this.fragments.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(fragment))) => {
                this.reply.push_str(&fragment);
                Poll::Ready(Some(Ok(fragment)))
            }
            Poll::Ready(Some(Err(e))) => {
                this.finished = true;
                tracing::warn!("Chat reply interrupted: {}", e);
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                this.finished = true;
                let user = std::mem::take(&mut this.user_text);
                this.session.history.push(ChatTurn::user(user));
                this.session
                    .history
                    .push(ChatTurn::model(this.reply.clone()));
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
