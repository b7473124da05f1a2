//! Chat-completion generator (`POST {base}/chat/completions`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GenerationError;
use crate::llm::cancel::CancelToken;
use crate::llm::http::{ApiClient, Usage};
use crate::llm::{GeneratedMessage, MessageGenerator};
use crate::prompt::Prompt;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Sends the prompt as a single user turn and keeps the first reply.
///
/// Only the token budget is sent; sampling is left at the server default.
pub struct ChatGenerator {
    client: ApiClient,
    model: String,
    max_tokens: u32,
}

impl ChatGenerator {
    pub fn new(client: ApiClient, model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            client,
            model: model.into(),
            max_tokens,
        }
    }
}

#[async_trait]
impl MessageGenerator for ChatGenerator {
    async fn generate(
        &self,
        prompt: &Prompt,
        cancel: &CancelToken,
    ) -> Result<GeneratedMessage, GenerationError> {
        let text = prompt.text();
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &text,
            }],
            max_tokens: self.max_tokens,
        };

        debug!(
            "Requesting chat completion from {} ({} prompt chars)",
            self.model,
            text.chars().count()
        );
        let response: ChatResponse = self
            .client
            .post_json("chat/completions", &request, cancel)
            .await?;

        if let Some(usage) = response.usage {
            usage.log();
        }

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or(GenerationError::NoCandidates)?;
        let content = choice.message.content.ok_or_else(|| {
            GenerationError::InvalidResponse("first choice has no message content".to_string())
        })?;
        Ok(GeneratedMessage::new(content))
    }
}
