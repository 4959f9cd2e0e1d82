//! CLI command definitions for newsforge.
//!
//! `run` augments a document tree with one generator; `status` reports how
//! far each generator has got without touching anything.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use crate::augment::{AugmentConfig, AugmentationPipeline, CancellationController, RunReport};
use crate::documents::{is_reserved_field, CoverageReport, DocumentStore};
use crate::error::RunError;
use crate::generation::ChatGenerationClient;
use crate::llm::{Backend, ChatClient};

/// Default root of the crawled article tree.
const DEFAULT_DOCUMENT_DIR: &str = "Noticias";

/// News dataset forge: pair crawled articles with machine-written counterparts.
#[derive(Parser)]
#[command(name = "newsforge")]
#[command(about = "Augment crawled news articles with generated paragraphs")]
#[command(version)]
#[command(
    long_about = "newsforge walks a tree of JSON articles and stores one generated paragraph per article and generator.\n\nRuns are resumable: documents that already hold text for the generator are skipped.\n\nExample usage:\n  newsforge run --dir ./Noticias --backend deepseek --credential $DEEPSEEK_KEY"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Generate missing augmentations for every document under a directory.
    Run(RunArgs),

    /// Report augmentation coverage for a directory without modifying it.
    Status(StatusArgs),
}

/// Arguments for `newsforge run`.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Root directory of the document tree.
    #[arg(short = 'd', long, default_value = DEFAULT_DOCUMENT_DIR)]
    pub dir: PathBuf,

    /// Backend credential (can also be set via NEWSFORGE_API_KEY).
    #[arg(long, env = "NEWSFORGE_API_KEY", hide_env_values = true)]
    pub credential: Option<String>,

    /// Generation backend preset.
    #[arg(short = 'b', long, value_enum, default_value_t = Backend::Deepseek)]
    pub backend: Backend,

    /// Augmentation field name (defaults to the backend name).
    #[arg(short = 'g', long)]
    pub generator: Option<String>,

    /// Override the backend's model.
    #[arg(short = 'm', long)]
    pub model: Option<String>,

    /// Override the backend's API base URL.
    #[arg(long)]
    pub api_base: Option<String>,

    /// Retries for timeouts and transport errors (overrides NEWSFORGE_MAX_RETRIES).
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// First backoff delay in seconds (overrides NEWSFORGE_BASE_DELAY_SECS).
    #[arg(long)]
    pub base_delay_secs: Option<u64>,

    /// Request timeout in seconds (overrides NEWSFORGE_REQUEST_TIMEOUT_SECS).
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Skip the backend connection check before the run.
    #[arg(long)]
    pub skip_preflight: bool,

    /// Output the run report as JSON.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Arguments for `newsforge status`.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Root directory of the document tree.
    #[arg(short = 'd', long, default_value = DEFAULT_DOCUMENT_DIR)]
    pub dir: PathBuf,

    /// Also count documents still pending for this generator.
    #[arg(short = 'g', long)]
    pub generator: Option<String>,

    /// Output the coverage report as JSON.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Parse CLI arguments and return the Cli struct.
///
/// This allows main.rs to access CLI arguments (like log_level) before running commands.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the CLI with the parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run(args) => run_augment_command(args).await,
        Commands::Status(args) => run_status_command(args),
    }
}

fn build_config(args: &RunArgs) -> anyhow::Result<AugmentConfig> {
    let mut config = AugmentConfig::from_env()?;
    if let Some(retries) = args.max_retries {
        config.max_retries = retries;
    }
    if let Some(secs) = args.base_delay_secs {
        config.base_delay = Duration::from_secs(secs);
    }
    if let Some(secs) = args.timeout_secs {
        config.request_timeout = Duration::from_secs(secs);
    }
    if args.skip_preflight {
        config.preflight = false;
    }
    config.validate()?;
    Ok(config)
}

async fn run_augment_command(args: RunArgs) -> anyhow::Result<()> {
    if !args.dir.is_dir() {
        return Err(anyhow::anyhow!(
            "Directory not found: {}",
            args.dir.display()
        ));
    }

    let config = build_config(&args)?;

    let mut chat = ChatClient::for_backend(
        args.backend,
        args.credential.clone(),
        config.request_timeout,
    )?;
    if let Some(api_base) = &args.api_base {
        chat = chat.with_api_base(api_base.clone());
    }
    if let Some(model) = &args.model {
        chat = chat.with_model(model.clone());
    }

    let generator = args
        .generator
        .clone()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| args.backend.default_generator().to_string());
    if is_reserved_field(&generator) {
        return Err(RunError::InvalidGenerator(generator).into());
    }

    info!(
        backend = %args.backend,
        api_base = chat.api_base(),
        model = chat.model(),
        credential = %chat.api_key_masked(),
        generator = %generator,
        "Configured generation backend"
    );

    let client = Arc::new(ChatGenerationClient::for_backend(
        Arc::new(chat),
        args.backend,
    ));

    let cancel = CancellationController::new();
    let listener = cancel.listen_for_signals();

    let pipeline = AugmentationPipeline::from_config(client, generator, &config)
        .with_cancellation(cancel.clone());
    let result = pipeline.run(&args.dir).await;

    // Let the listener task go; it exits once the token is cancelled.
    cancel.cancel();
    if let Err(err) = listener.await {
        warn!(error = %err, "Signal listener task failed");
    }

    let report = result?;
    print_run_report(&report, args.json)?;

    if report.is_fatal() {
        return Err(anyhow::anyhow!("Run aborted: {}", report.halt));
    }
    Ok(())
}

fn print_run_report(report: &RunReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    let rule = "═".repeat(50);
    println!("\n{}", rule);
    println!("Generator:  {}", report.generator);
    println!("Status:     {}", report.halt);
    println!("Processed:  {}", report.stats.processed);
    println!("Skipped:    {}", report.stats.skipped);
    println!("Errored:    {}", report.stats.errored);
    println!(
        "Duration:   {}s",
        (report.finished_at - report.started_at).num_seconds()
    );
    println!("{}", rule);
    Ok(())
}

fn run_status_command(args: StatusArgs) -> anyhow::Result<()> {
    if !args.dir.is_dir() {
        return Err(anyhow::anyhow!(
            "Directory not found: {}",
            args.dir.display()
        ));
    }

    if let Some(generator) = args.generator.as_deref() {
        if generator.trim().is_empty() || is_reserved_field(generator) {
            return Err(RunError::InvalidGenerator(generator.to_string()).into());
        }
    }

    let config = AugmentConfig::from_env()?;
    let store = DocumentStore::new(config.extension);
    let report = store.coverage(&args.dir, args.generator.as_deref());
    print_coverage_report(&report, args.generator.as_deref(), args.json)
}

fn print_coverage_report(
    report: &CoverageReport,
    generator: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("Documents:  {}", report.documents);
    println!("Invalid:    {}", report.invalid);
    if report.augmentations.is_empty() {
        println!("No augmentations yet");
    }
    for (name, count) in &report.augmentations {
        println!("  {:<20} {}", name, count);
    }
    if let (Some(generator), Some(pending)) = (generator, report.pending) {
        println!("Pending for '{}': {}", generator, pending);
    }
    Ok(())
}
