//! commitscribe - A CLI tool that drafts commit messages from staged git changes.
//!
//! # Overview
//!
//! commitscribe reads the staging area with git2, renders a diff per staged
//! file, wraps the combined diff in an instruction template and asks an
//! OpenAI-compatible model for a commit message. The message is returned to
//! the caller; nothing is written to the repository.

pub mod config;
pub mod credentials;
pub mod diff;
pub mod error;
pub mod git;
pub mod llm;
pub mod pipeline;
pub mod prompt;

// Re-export commonly used types
pub use config::{Config, ConfigOverrides};
pub use credentials::{CredentialProvider, EnvCredentials, StaticCredentials};
pub use diff::{DiffBlock, DiffOptions, DiffStyle};
pub use error::{ConfigError, ContentError, GenerationError, PipelineError, RepositoryError};
pub use git::{FileChange, Git2Repository, RepositoryProvider, StagingStatus};
pub use llm::{CancelToken, GeneratedMessage, GeneratorKind, MessageGenerator, ModelSettings};
pub use pipeline::{EmptyStagePolicy, Orchestrator, Outcome, PipelineOptions};
pub use prompt::{Prompt, PromptPolicy};
