//! Shared HTTP plumbing for OpenAI-compatible endpoints.

use std::time::Duration;

use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::credentials::ApiKey;
use crate::error::GenerationError;
use crate::llm::cancel::CancelToken;

/// Token accounting returned by OpenAI-compatible APIs.
#[derive(Debug, Clone, Copy, serde::Deserialize)]
pub(crate) struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    pub(crate) fn log(&self) {
        debug!(
            "Token usage: prompt={}, completion={}, total={}",
            self.prompt_tokens, self.completion_tokens, self.total_tokens
        );
    }
}

/// Authenticated JSON client bound to one API base URL.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: ApiKey,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(base_url: &str, api_key: ApiKey, timeout: Duration) -> Result<Self, GenerationError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("commitscribe/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(GenerationError::Client)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            timeout,
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// POST `body` to `path` and decode the JSON response.
    ///
    /// The request is dropped (aborting it) when `cancel` fires or the
    /// configured timeout elapses.
    #[instrument(skip(self, body, cancel))]
    pub async fn post_json<B, R>(
        &self,
        path: &str,
        body: &B,
        cancel: &CancelToken,
    ) -> Result<R, GenerationError>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let endpoint = self.endpoint(path);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("Model request cancelled");
                Err(GenerationError::Cancelled)
            }
            result = tokio::time::timeout(self.timeout, self.send(&endpoint, body)) => {
                result.map_err(|_| GenerationError::Timeout(self.timeout))?
            }
        }
    }

    async fn send<B, R>(&self, endpoint: &str, body: &B) -> Result<R, GenerationError>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let request_err = |source| GenerationError::Request {
            endpoint: endpoint.to_string(),
            source,
        };

        debug!("POST {}", endpoint);
        let response = self
            .http
            .post(endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(request_err)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => GenerationError::Authentication {
                    status: status.as_u16(),
                },
                429 => GenerationError::RateLimited { body },
                code => GenerationError::Api { status: code, body },
            });
        }

        let text = response.text().await.map_err(request_err)?;
        serde_json::from_str(&text).map_err(|e| {
            let preview: String = text.chars().take(200).collect();
            GenerationError::InvalidResponse(format!("{e}. Response: {preview}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretBox;

    fn key() -> ApiKey {
        SecretBox::new(Box::new("sk-test".to_string()))
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let client = ApiClient::new("https://api.example.com/v1/", key(), Duration::from_secs(5)).unwrap();
        assert_eq!(client.endpoint("chat/completions"), "https://api.example.com/v1/chat/completions");
        assert_eq!(client.endpoint("/completions"), "https://api.example.com/v1/completions");
    }

    #[test]
    fn test_usage_deserializes() {
        let usage: Usage = serde_json::from_str(
            r#"{"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}"#,
        )
        .unwrap();
        assert_eq!(usage.total_tokens, 15);
    }
}
