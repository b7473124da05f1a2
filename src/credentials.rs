//! API key lookup.
//!
//! Keys are held as [`SecretBox`] so they never appear in `Debug` output or
//! logs.

use std::env;

use secrecy::{ExposeSecret, SecretBox};
use tracing::debug;

/// A model-provider API key.
pub type ApiKey = SecretBox<String>;

/// Environment variable consulted when no other key source is configured.
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Source of the model-provider API key.
pub trait CredentialProvider {
    /// The key, or `None` when it is absent or empty.
    fn api_key(&self) -> Option<ApiKey>;

    /// How the user can supply the key, shown when it is missing.
    fn describe(&self) -> String;
}

/// Reads the key from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    var: String,
}

impl EnvCredentials {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    pub fn var(&self) -> &str {
        &self.var
    }
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self::new(DEFAULT_API_KEY_ENV)
    }
}

impl CredentialProvider for EnvCredentials {
    fn api_key(&self) -> Option<ApiKey> {
        match env::var(&self.var) {
            Ok(value) if !value.trim().is_empty() => {
                debug!("Using API key from ${}", self.var);
                Some(SecretBox::new(Box::new(value.trim().to_string())))
            }
            _ => None,
        }
    }

    fn describe(&self) -> String {
        format!("set the {} environment variable", self.var)
    }
}

/// A key supplied directly, e.g. on the command line or in a config file.
pub struct StaticCredentials {
    key: Option<ApiKey>,
    origin: String,
}

impl StaticCredentials {
    /// `origin` names where the key came from; empty keys count as absent.
    pub fn new(key: impl Into<String>, origin: impl Into<String>) -> Self {
        let key: String = key.into();
        let key = key.trim();
        Self {
            key: (!key.is_empty()).then(|| SecretBox::new(Box::new(key.to_string()))),
            origin: origin.into(),
        }
    }
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("key", &self.key.as_ref().map(|_| "[REDACTED]"))
            .field("origin", &self.origin)
            .finish()
    }
}

impl CredentialProvider for StaticCredentials {
    fn api_key(&self) -> Option<ApiKey> {
        self.key
            .as_ref()
            .map(|key| SecretBox::new(Box::new(key.expose_secret().to_owned())))
    }

    fn describe(&self) -> String {
        format!("the key given via {} is empty", self.origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_credentials_reads_variable() {
        temp_env::with_var("COMMITSCRIBE_TEST_KEY", Some("sk-from-env"), || {
            let creds = EnvCredentials::new("COMMITSCRIBE_TEST_KEY");
            let key = creds.api_key().expect("key should be present");
            assert_eq!(key.expose_secret(), "sk-from-env");
        });
    }

    #[test]
    fn test_env_credentials_missing_variable() {
        temp_env::with_var_unset("COMMITSCRIBE_TEST_KEY", || {
            let creds = EnvCredentials::new("COMMITSCRIBE_TEST_KEY");
            assert!(creds.api_key().is_none());
            assert!(creds.describe().contains("COMMITSCRIBE_TEST_KEY"));
        });
    }

    #[test]
    fn test_env_credentials_empty_counts_as_absent() {
        temp_env::with_var("COMMITSCRIBE_TEST_KEY", Some("   "), || {
            let creds = EnvCredentials::new("COMMITSCRIBE_TEST_KEY");
            assert!(creds.api_key().is_none());
        });
    }

    #[test]
    fn test_env_credentials_default_variable() {
        assert_eq!(EnvCredentials::default().var(), "OPENAI_API_KEY");
    }

    #[test]
    fn test_static_credentials() {
        let creds = StaticCredentials::new("sk-static", "--api-key");
        assert_eq!(creds.api_key().unwrap().expose_secret(), "sk-static");
        // Repeated lookups hand out independent copies.
        assert!(creds.api_key().is_some());
    }

    #[test]
    fn test_static_credentials_empty_is_absent() {
        let creds = StaticCredentials::new("", "--api-key");
        assert!(creds.api_key().is_none());
        assert!(creds.describe().contains("--api-key"));
    }

    #[test]
    fn test_static_credentials_debug_redacts_key() {
        let creds = StaticCredentials::new("sk-secret", "config file");
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
