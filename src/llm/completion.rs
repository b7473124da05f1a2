//! Text-completion generator (`POST {base}/completions`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GenerationError;
use crate::llm::cancel::CancelToken;
use crate::llm::http::{ApiClient, Usage};
use crate::llm::{GeneratedMessage, MessageGenerator};
use crate::prompt::Prompt;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
    n: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    text: String,
}

/// Sends the whole prompt as one completion request and keeps the first
/// candidate.
pub struct CompletionGenerator {
    client: ApiClient,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl CompletionGenerator {
    pub fn new(client: ApiClient, model: impl Into<String>, max_tokens: u32, temperature: f32) -> Self {
        Self {
            client,
            model: model.into(),
            max_tokens,
            temperature,
        }
    }
}

#[async_trait]
impl MessageGenerator for CompletionGenerator {
    async fn generate(
        &self,
        prompt: &Prompt,
        cancel: &CancelToken,
    ) -> Result<GeneratedMessage, GenerationError> {
        let text = prompt.text();
        let request = CompletionRequest {
            model: &self.model,
            prompt: &text,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            n: 1,
        };

        debug!(
            "Requesting completion from {} ({} prompt chars)",
            self.model,
            text.chars().count()
        );
        let response: CompletionResponse =
            self.client.post_json("completions", &request, cancel).await?;

        if let Some(usage) = response.usage {
            usage.log();
        }

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or(GenerationError::NoCandidates)?;
        Ok(GeneratedMessage::new(choice.text))
    }
}
