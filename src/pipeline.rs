//! End-to-end orchestration: staged changes to a commit message.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use tracing::{info, instrument};

use crate::credentials::{ApiKey, CredentialProvider};
use crate::diff::{DiffBlock, DiffOptions, render_block};
use crate::error::{GenerationError, PipelineError};
use crate::git::{RepositoryProvider, enumerate_changes, resolve_snapshot};
use crate::llm::{CancelToken, GeneratedMessage, MessageGenerator};
use crate::prompt::{Prompt, PromptPolicy, compose};

/// What to do when nothing is staged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyStagePolicy {
    /// Return [`Outcome::NothingStaged`] without calling the model.
    #[default]
    Skip,
    /// Call the model with an empty diff payload.
    Generate,
}

impl fmt::Display for EmptyStagePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyStagePolicy::Skip => write!(f, "skip"),
            EmptyStagePolicy::Generate => write!(f, "generate"),
        }
    }
}

impl FromStr for EmptyStagePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "skip" => Ok(EmptyStagePolicy::Skip),
            "generate" => Ok(EmptyStagePolicy::Generate),
            other => Err(format!(
                "unknown empty-stage policy '{other}' (expected 'skip' or 'generate')"
            )),
        }
    }
}

/// Result of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Message(GeneratedMessage),
    NothingStaged,
}

impl Outcome {
    pub fn message(&self) -> Option<&str> {
        match self {
            Outcome::Message(message) => Some(message.text()),
            Outcome::NothingStaged => None,
        }
    }
}

/// Per-run rendering and composition settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineOptions {
    pub diff: DiffOptions,
    pub prompt: PromptPolicy,
    pub on_empty: EmptyStagePolicy,
}

/// Drives one run: enumerate, resolve, render, compose, generate.
pub struct Orchestrator<'r, R: ?Sized> {
    repo: &'r R,
    options: PipelineOptions,
}

impl<'r, R: RepositoryProvider + ?Sized> Orchestrator<'r, R> {
    pub fn new(repo: &'r R, options: PipelineOptions) -> Self {
        Self { repo, options }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Render one block per staged change, in path order.
    pub fn render_blocks(&self) -> Result<Vec<DiffBlock>, PipelineError> {
        let changes = enumerate_changes(self.repo)?;

        changes
            .iter()
            .map(|change| -> Result<DiffBlock, PipelineError> {
                let snapshot = resolve_snapshot(self.repo, change)?;
                Ok(render_block(change, &snapshot, &self.options.diff))
            })
            .collect()
    }

    /// Build the prompt without contacting the model.
    pub fn prepare(&self) -> Result<Prompt, PipelineError> {
        let blocks = self.render_blocks()?;
        Ok(compose(&blocks, &self.options.prompt))
    }

    /// Run the full pipeline.
    ///
    /// The credential is checked before the repository is read; `build`
    /// only runs once a prompt is ready to send, and the generator is
    /// called at most once.
    #[instrument(skip_all)]
    pub async fn run<C, F, G>(
        &self,
        credentials: &C,
        build: F,
        cancel: &CancelToken,
    ) -> Result<Outcome, PipelineError>
    where
        C: CredentialProvider + ?Sized,
        F: FnOnce(ApiKey) -> Result<G, GenerationError>,
        G: MessageGenerator,
    {
        let api_key = credentials
            .api_key()
            .ok_or_else(|| PipelineError::MissingCredential {
                hint: credentials.describe(),
            })?;

        let prompt = self.prepare()?;
        if prompt.is_empty() && self.options.on_empty == EmptyStagePolicy::Skip {
            info!("No staged changes; skipping generation");
            return Ok(Outcome::NothingStaged);
        }

        let generator = build(api_key)?;
        let message = generator.generate(&prompt, cancel).await?;
        info!("Generated commit message ({} chars)", message.text().len());
        Ok(Outcome::Message(message))
    }
}
