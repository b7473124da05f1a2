//! Opt-in exponential backoff around a [`MessageGenerator`].

use std::time::Duration;

use async_trait::async_trait;
use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;
use tracing::warn;

use crate::error::GenerationError;
use crate::llm::cancel::CancelToken;
use crate::llm::{GeneratedMessage, MessageGenerator};
use crate::prompt::Prompt;

const INITIAL_INTERVAL_SECS: u64 = 1;
const MAX_INTERVAL_SECS: u64 = 30;

/// Retries transient failures of the wrapped generator.
///
/// Authentication errors, empty candidate lists, malformed responses and
/// cancellation are returned immediately.
pub struct RetryingGenerator<G> {
    inner: G,
    max_attempts: u32,
}

impl<G> RetryingGenerator<G> {
    /// `max_attempts` counts the first call; values below 1 are raised to 1.
    pub fn new(inner: G, max_attempts: u32) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

#[async_trait]
impl<G: MessageGenerator> MessageGenerator for RetryingGenerator<G> {
    async fn generate(
        &self,
        prompt: &Prompt,
        cancel: &CancelToken,
    ) -> Result<GeneratedMessage, GenerationError> {
        let mut backoff = ExponentialBackoff {
            initial_interval: Duration::from_secs(INITIAL_INTERVAL_SECS),
            max_interval: Duration::from_secs(MAX_INTERVAL_SECS),
            max_elapsed_time: None,
            ..Default::default()
        };

        let mut attempts = 0;
        loop {
            attempts += 1;

            let err = match self.inner.generate(prompt, cancel).await {
                Ok(message) => return Ok(message),
                Err(e) => e,
            };

            if !err.is_transient() {
                return Err(err);
            }
            if attempts >= self.max_attempts {
                if attempts == 1 {
                    return Err(err);
                }
                return Err(GenerationError::RetriesExhausted {
                    attempts,
                    source: Box::new(err),
                });
            }

            let wait = backoff
                .next_backoff()
                .unwrap_or(Duration::from_secs(MAX_INTERVAL_SECS));
            warn!(
                "Attempt {}/{} failed: {}. Retrying in {:?}",
                attempts, self.max_attempts, err, wait
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(GenerationError::Cancelled),
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }
}
