//! Layered configuration: CLI flags, environment, TOML file, defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::credentials::{CredentialProvider, DEFAULT_API_KEY_ENV, EnvCredentials, StaticCredentials};
use crate::diff::{DiffOptions, DiffStyle};
use crate::error::ConfigError;
use crate::git::StagedSource;
use crate::llm::{
    DEFAULT_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT_SECS,
    GeneratorKind, ModelSettings,
};
use crate::pipeline::{EmptyStagePolicy, PipelineOptions};
use crate::prompt::{InstructionTemplate, PromptPolicy};

/// Per-repository config file name.
pub const REPO_CONFIG_FILE: &str = ".commitscribe.toml";

pub const MODEL_ENV: &str = "COMMITSCRIBE_MODEL";
pub const PROVIDER_ENV: &str = "COMMITSCRIBE_PROVIDER";
pub const BASE_URL_ENV: &str = "COMMITSCRIBE_BASE_URL";

/// Contents of a TOML config file. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub provider: Option<GeneratorKind>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub timeout_secs: Option<u64>,
    pub on_empty: Option<EmptyStagePolicy>,
    pub staged_source: Option<StagedSource>,
    pub retries: Option<u32>,

    #[serde(default)]
    pub prompt: PromptSection,

    #[serde(default)]
    pub diff: DiffSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromptSection {
    /// Custom instruction template; must contain `{diff}` once.
    pub template: Option<String>,
    pub language: Option<String>,
    pub file_headers: Option<bool>,
    pub max_payload_chars: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiffSection {
    pub style: Option<DiffStyle>,
    pub context_lines: Option<usize>,
}

impl FileConfig {
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub provider: Option<GeneratorKind>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub timeout_secs: Option<u64>,
    pub language: Option<String>,
    pub template_file: Option<PathBuf>,
    pub no_file_headers: bool,
    pub style: Option<DiffStyle>,
    pub context_lines: Option<usize>,
    pub worktree: bool,
    pub on_empty: Option<EmptyStagePolicy>,
    pub retries: Option<u32>,
}

/// Where the API key is read from.
#[derive(Clone, PartialEq, Eq)]
pub enum KeySource {
    /// Key given directly; `origin` names the flag or file.
    Explicit { key: String, origin: String },
    /// Key read from the named environment variable.
    Env(String),
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub model: ModelSettings,
    pub pipeline: PipelineOptions,
    pub staged_source: StagedSource,
    /// Extra attempts after a transient generation failure.
    pub retries: u32,
    pub key_source: KeySource,
}

impl Config {
    /// Locate and read the config file, then resolve against `overrides`
    /// and the environment.
    pub fn load(overrides: &ConfigOverrides, repo_root: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match &overrides.config_path {
            Some(path) => FileConfig::load_from(path)?,
            None => match discover_config_file(repo_root) {
                Some(path) => FileConfig::load_from(&path)?,
                None => FileConfig::default(),
            },
        };
        Self::resolve(overrides, file)
    }

    /// Merge layers, highest first: CLI, environment, file, defaults.
    pub fn resolve(overrides: &ConfigOverrides, file: FileConfig) -> Result<Self, ConfigError> {
        let kind = match overrides.provider {
            Some(kind) => kind,
            None => match env_value(PROVIDER_ENV) {
                Some(raw) => raw.parse().map_err(|reason| ConfigError::InvalidValue {
                    key: "provider",
                    value: raw.clone(),
                    reason,
                })?,
                None => file.provider.unwrap_or_default(),
            },
        };

        let model = overrides
            .model
            .clone()
            .or_else(|| env_value(MODEL_ENV))
            .or(file.model)
            .unwrap_or_else(|| kind.default_model().to_string());

        let base_url = overrides
            .base_url
            .clone()
            .or_else(|| env_value(BASE_URL_ENV))
            .or(file.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let max_tokens = overrides
            .max_tokens
            .or(file.max_tokens)
            .unwrap_or(DEFAULT_MAX_TOKENS);
        if max_tokens == 0 {
            return Err(invalid("max_tokens", max_tokens, "must be at least 1"));
        }

        let temperature = overrides
            .temperature
            .or(file.temperature)
            .unwrap_or(DEFAULT_TEMPERATURE);
        if !(0.0..=2.0).contains(&temperature) {
            return Err(invalid("temperature", temperature, "must be between 0 and 2"));
        }

        let timeout_secs = overrides
            .timeout_secs
            .or(file.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(invalid("timeout", timeout_secs, "must be at least 1 second"));
        }

        let custom_template = match &overrides.template_file {
            Some(path) => Some(fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?),
            None => file.prompt.template,
        };
        let language = overrides.language.clone().or(file.prompt.language);
        let template = InstructionTemplate::resolve(custom_template.as_deref(), language.as_deref())?;

        let prompt = PromptPolicy {
            template,
            file_headers: !overrides.no_file_headers && file.prompt.file_headers.unwrap_or(true),
            max_payload_chars: file.prompt.max_payload_chars,
        };

        let diff = DiffOptions {
            style: overrides.style.or(file.diff.style).unwrap_or_default(),
            context_lines: overrides.context_lines.or(file.diff.context_lines),
        };

        let staged_source = if overrides.worktree {
            StagedSource::Worktree
        } else {
            file.staged_source.unwrap_or_default()
        };

        let key_source = match (&overrides.api_key, file.api_key) {
            (Some(key), _) => KeySource::Explicit {
                key: key.clone(),
                origin: "--api-key".to_string(),
            },
            (None, Some(key)) => KeySource::Explicit {
                key,
                origin: "api_key in the config file".to_string(),
            },
            (None, None) => KeySource::Env(
                file.api_key_env
                    .unwrap_or_else(|| DEFAULT_API_KEY_ENV.to_string()),
            ),
        };

        let config = Config {
            model: ModelSettings {
                kind,
                model,
                base_url,
                max_tokens,
                temperature,
                timeout: Duration::from_secs(timeout_secs),
            },
            pipeline: PipelineOptions {
                diff,
                prompt,
                on_empty: overrides.on_empty.or(file.on_empty).unwrap_or_default(),
            },
            staged_source,
            retries: overrides.retries.or(file.retries).unwrap_or(0),
            key_source,
        };
        debug!(
            "Resolved config: provider={}, model={}, base_url={}",
            config.model.kind, config.model.model, config.model.base_url
        );
        Ok(config)
    }

    /// The credential provider for [`Config::key_source`].
    pub fn credentials(&self) -> Box<dyn CredentialProvider> {
        match &self.key_source {
            KeySource::Explicit { key, origin } => {
                Box::new(StaticCredentials::new(key.as_str(), origin.as_str()))
            }
            KeySource::Env(var) => Box::new(EnvCredentials::new(var.as_str())),
        }
    }
}

/// `<repo>/.commitscribe.toml`, else `~/.config/commitscribe.toml`.
fn discover_config_file(repo_root: Option<&Path>) -> Option<PathBuf> {
    let repo_file = repo_root.map(|root| root.join(REPO_CONFIG_FILE));
    let user_file = dirs::home_dir().map(|home| home.join(".config").join("commitscribe.toml"));

    let found = [repo_file, user_file]
        .into_iter()
        .flatten()
        .find(|path| path.is_file());
    if let Some(path) = &found {
        debug!("Using config file {}", path.display());
    }
    found
}

fn env_value(var: &str) -> Option<String> {
    env::var(var).ok().filter(|value| !value.trim().is_empty())
}

fn invalid(key: &'static str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

impl std::fmt::Debug for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeySource::Explicit { origin, .. } => f
                .debug_struct("Explicit")
                .field("key", &"[REDACTED]")
                .field("origin", origin)
                .finish(),
            KeySource::Env(var) => f.debug_tuple("Env").field(var).finish(),
        }
    }
}

impl std::fmt::Display for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeySource::Explicit { origin, .. } => write!(f, "{origin}"),
            KeySource::Env(var) => write!(f, "${var}"),
        }
    }
}
