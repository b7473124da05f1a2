//! Error types for commitscribe modules using thiserror.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors raised while inspecting repository state (status, HEAD).
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Failed to open repository at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    #[error("Repository has no working directory (bare repositories are not supported)")]
    Bare,

    #[error("Repository has no commits yet; there is no last commit to diff staged changes against")]
    NoCommits,

    #[error("Failed to resolve HEAD: {0}")]
    Head(#[source] git2::Error),

    #[error("Failed to compute staging status: {0}")]
    Status(#[source] git2::Error),

    #[error("Path '{0}' has unresolved merge conflicts; resolve them before generating a message")]
    Unmerged(String),

    #[error("Staged path '{0}' is not valid UTF-8 and cannot be diffed")]
    NonUtf8Path(String),
}

/// Errors raised while reading the committed or staged content of one path.
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Failed to look up '{path}' in the last commit: {source}")]
    CommittedLookup {
        path: String,
        #[source]
        source: git2::Error,
    },

    #[error("Failed to read the index while resolving '{path}': {source}")]
    IndexRead {
        path: String,
        #[source]
        source: git2::Error,
    },

    #[error("'{path}' has no entry in the index")]
    NotStaged { path: String },

    #[error("Failed to read blob for '{path}': {source}")]
    BlobRead {
        path: String,
        #[source]
        source: git2::Error,
    },

    #[error("Failed to read '{path}' from the working tree: {source}")]
    WorktreeRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ContentError {
    /// The repository-relative path the failure refers to.
    pub fn path(&self) -> &str {
        match self {
            ContentError::CommittedLookup { path, .. }
            | ContentError::IndexRead { path, .. }
            | ContentError::NotStaged { path }
            | ContentError::BlobRead { path, .. }
            | ContentError::WorktreeRead { path, .. } => path,
        }
    }
}

/// Errors from the hosted model call.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Model provider rejected the API key (HTTP {status})")]
    Authentication { status: u16 },

    #[error("Rate limited by the model provider: {body}")]
    RateLimited { body: String },

    #[error("Model provider returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Model provider returned a malformed response: {0}")]
    InvalidResponse(String),

    #[error("Model provider returned no candidates")]
    NoCandidates,

    #[error("Model request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Model request was cancelled")]
    Cancelled,

    #[error("All {attempts} attempts failed: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<GenerationError>,
    },
}

impl GenerationError {
    /// Whether a later attempt could plausibly succeed.
    ///
    /// Transport failures, timeouts, rate limits and 5xx responses are
    /// transient. Auth failures, malformed bodies, empty candidate lists and
    /// cancellation are not.
    pub fn is_transient(&self) -> bool {
        match self {
            GenerationError::Request { .. }
            | GenerationError::Timeout(_)
            | GenerationError::RateLimited { .. } => true,
            GenerationError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Errors from configuration loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Instruction template must contain the {{diff}} placeholder exactly once (found {found})")]
    InvalidTemplate { found: usize },

    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Errors surfaced by a full pipeline run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("No API key available: {hint}")]
    MissingCredential { hint: String },

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}
