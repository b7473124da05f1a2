//! Message generation against OpenAI-compatible model providers.
//!
//! Two strategies share the [`MessageGenerator`] contract: the legacy
//! text-completion endpoint and the chat-completion endpoint. Both send
//! exactly one request per call; retrying is opt-in via
//! [`RetryingGenerator`].

pub mod cancel;
pub mod chat;
pub mod completion;
pub mod http;
pub mod retry;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::credentials::ApiKey;
use crate::error::GenerationError;
use crate::prompt::Prompt;

pub use cancel::{CancelHandle, CancelToken, cancel_pair};
pub use chat::ChatGenerator;
pub use completion::CompletionGenerator;
pub use http::ApiClient;
pub use retry::RetryingGenerator;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_COMPLETION_MODEL: &str = "gpt-3.5-turbo-instruct";
pub const DEFAULT_MAX_TOKENS: u32 = 30;
pub const DEFAULT_TEMPERATURE: f32 = 0.5;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// A commit message returned by the model, with surrounding whitespace
/// removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedMessage {
    text: String,
}

impl GeneratedMessage {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self {
            text: raw.as_ref().trim().to_string(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

impl fmt::Display for GeneratedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Turns a prompt into a commit message.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageGenerator: Send + Sync {
    /// Issue one model request for `prompt`.
    async fn generate(
        &self,
        prompt: &Prompt,
        cancel: &CancelToken,
    ) -> Result<GeneratedMessage, GenerationError>;
}

#[async_trait]
impl<G: MessageGenerator + ?Sized> MessageGenerator for Box<G> {
    async fn generate(
        &self,
        prompt: &Prompt,
        cancel: &CancelToken,
    ) -> Result<GeneratedMessage, GenerationError> {
        (**self).generate(prompt, cancel).await
    }
}

/// Which generation strategy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    #[default]
    Chat,
    Completion,
}

impl GeneratorKind {
    pub fn default_model(&self) -> &'static str {
        match self {
            GeneratorKind::Chat => DEFAULT_CHAT_MODEL,
            GeneratorKind::Completion => DEFAULT_COMPLETION_MODEL,
        }
    }
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratorKind::Chat => write!(f, "chat"),
            GeneratorKind::Completion => write!(f, "completion"),
        }
    }
}

impl FromStr for GeneratorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chat" => Ok(GeneratorKind::Chat),
            "completion" => Ok(GeneratorKind::Completion),
            other => Err(format!(
                "unknown provider '{other}' (expected 'chat' or 'completion')"
            )),
        }
    }
}

/// Model and transport parameters for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub kind: GeneratorKind,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for ModelSettings {
    fn default() -> Self {
        let kind = GeneratorKind::default();
        Self {
            kind,
            model: kind.default_model().to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Build the generator selected by `settings`.
pub fn build_generator(
    settings: &ModelSettings,
    api_key: ApiKey,
) -> Result<Box<dyn MessageGenerator>, GenerationError> {
    let client = ApiClient::new(&settings.base_url, api_key, settings.timeout)?;

    Ok(match settings.kind {
        GeneratorKind::Chat => Box::new(ChatGenerator::new(
            client,
            settings.model.clone(),
            settings.max_tokens,
        )),
        GeneratorKind::Completion => Box::new(CompletionGenerator::new(
            client,
            settings.model.clone(),
            settings.max_tokens,
            settings.temperature,
        )),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretBox;

    #[test]
    fn test_generated_message_trims_whitespace() {
        let message = GeneratedMessage::new("\n  Add hello.txt \t\n");
        assert_eq!(message.text(), "Add hello.txt");
        assert_eq!(message.to_string(), "Add hello.txt");
    }

    #[test]
    fn test_generated_message_keeps_inner_newlines() {
        let message = GeneratedMessage::new("Subject\n\nBody line\n");
        assert_eq!(message.into_text(), "Subject\n\nBody line");
    }

    #[test]
    fn test_generator_kind_parsing() {
        assert_eq!("chat".parse::<GeneratorKind>().unwrap(), GeneratorKind::Chat);
        assert_eq!(
            "Completion".parse::<GeneratorKind>().unwrap(),
            GeneratorKind::Completion
        );
        assert!("gemini".parse::<GeneratorKind>().is_err());
    }

    #[test]
    fn test_default_settings() {
        let settings = ModelSettings::default();
        assert_eq!(settings.kind, GeneratorKind::Chat);
        assert_eq!(settings.model, DEFAULT_CHAT_MODEL);
        assert_eq!(settings.max_tokens, 30);
        assert_eq!(settings.temperature, 0.5);
        assert_eq!(settings.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_build_generator_for_each_kind() {
        for kind in [GeneratorKind::Chat, GeneratorKind::Completion] {
            let settings = ModelSettings {
                kind,
                model: kind.default_model().to_string(),
                ..ModelSettings::default()
            };
            let key = SecretBox::new(Box::new("sk-test".to_string()));
            assert!(build_generator(&settings, key).is_ok());
        }
    }

    #[tokio::test]
    async fn test_boxed_generator_delegates() {
        let mut mock = MockMessageGenerator::new();
        mock.expect_generate()
            .times(1)
            .returning(|_, _| Ok(GeneratedMessage::new(" boxed ")));
        let boxed: Box<dyn MessageGenerator> = Box::new(mock);

        let prompt = Prompt {
            instruction_text: "{diff}".to_string(),
            diff_payload: String::new(),
        };
        let message = boxed.generate(&prompt, &CancelToken::never()).await.unwrap();
        assert_eq!(message.text(), "boxed");
    }
}
