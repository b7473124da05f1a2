//! commitscribe - CLI entry point.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use commitscribe::config::{Config, ConfigOverrides};
use commitscribe::diff::DiffStyle;
use commitscribe::git::Git2Repository;
use commitscribe::llm::{GeneratorKind, RetryingGenerator, build_generator, cancel_pair};
use commitscribe::pipeline::{EmptyStagePolicy, Orchestrator, Outcome};

/// Draft a commit message for the staged changes using an LLM.
#[derive(Parser, Debug)]
#[command(name = "commitscribe")]
#[command(about = "Draft a commit message for the staged changes using an LLM")]
#[command(version)]
struct Cli {
    /// Run as if started in this directory
    #[arg(short = 'C', long = "repo", default_value = ".")]
    repo: PathBuf,

    /// Config file (defaults to .commitscribe.toml, then ~/.config/commitscribe.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Generation strategy: chat or completion
    #[arg(long)]
    provider: Option<GeneratorKind>,

    /// Model name
    #[arg(long)]
    model: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long)]
    base_url: Option<String>,

    /// API key (defaults to $OPENAI_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Maximum tokens in the generated message
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Sampling temperature (completion endpoint only)
    #[arg(long)]
    temperature: Option<f32>,

    /// Request timeout in seconds
    #[arg(long = "timeout")]
    timeout_secs: Option<u64>,

    /// Language the message should be written in
    #[arg(long)]
    language: Option<String>,

    /// File holding a custom instruction template with one {diff} placeholder
    #[arg(long)]
    template_file: Option<PathBuf>,

    /// Omit the ---/+++ header before each file's diff
    #[arg(long)]
    no_file_headers: bool,

    /// Diff style: lines or inline
    #[arg(long)]
    style: Option<DiffStyle>,

    /// Context lines around each hunk (default: whole file)
    #[arg(long = "context")]
    context_lines: Option<usize>,

    /// Read staged content from the working tree instead of the index
    #[arg(long)]
    worktree: bool,

    /// What to do when nothing is staged: skip or generate
    #[arg(long)]
    on_empty: Option<EmptyStagePolicy>,

    /// Retry transient model failures this many times
    #[arg(long)]
    retries: Option<u32>,

    /// Print the prompt instead of calling the model
    #[arg(long)]
    dry_run: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            config_path: self.config.clone(),
            provider: self.provider,
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            timeout_secs: self.timeout_secs,
            language: self.language.clone(),
            template_file: self.template_file.clone(),
            no_file_headers: self.no_file_headers,
            style: self.style,
            context_lines: self.context_lines,
            worktree: self.worktree,
            on_empty: self.on_empty,
            retries: self.retries,
        }
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("commitscribe=info"),
        2 => EnvFilter::new("commitscribe=debug"),
        _ => EnvFilter::new("commitscribe=trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Step 1: Open git repository
    let repo = Git2Repository::discover(&cli.repo)
        .context("Not a git repository. Run commitscribe from within a git repository.")?;

    // Step 2: Resolve configuration
    let config = Config::load(&cli.overrides(), repo.workdir())
        .context("Failed to load configuration")?;
    let repo = repo.with_staged_source(config.staged_source);
    let orchestrator = Orchestrator::new(&repo, config.pipeline.clone());

    if cli.dry_run {
        let prompt = orchestrator
            .prepare()
            .context("Failed to collect staged changes")?;
        println!("{}", prompt.text());
        return Ok(());
    }

    // Step 3: Cancel the model request on Ctrl-C
    let (cancel_handle, cancel) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling model request");
            cancel_handle.cancel();
        }
    });

    // Step 4: Generate
    let credentials = config.credentials();
    let attempts = config.retries.saturating_add(1);
    let outcome = orchestrator
        .run(
            credentials.as_ref(),
            |api_key| {
                let generator = build_generator(&config.model, api_key)?;
                Ok(RetryingGenerator::new(generator, attempts))
            },
            &cancel,
        )
        .await
        .context("Failed to generate commit message")?;

    match outcome {
        Outcome::Message(message) => println!("{}", message),
        Outcome::NothingStaged => eprintln!("No staged changes found. Nothing to describe."),
    }

    Ok(())
}
