//! `tribunal`: run a profile review or keyword fit check across AI providers.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use tribunal_core::{AnalysisRequest, KeywordMatchInput, ProfileSnapshot};
use tribunal_runtime::{
    preferred_mode, AnalysisMode, DocumentStore, EnvStore, KeyValueStore, LayeredStore,
    Orchestrator, RuntimeConfig,
};

#[derive(Parser, Debug)]
#[command(name = "tribunal", version, about = "Multi-provider profile analysis with consensus merging")]
struct Cli {
    #[arg(long, global = true, help = "Runtime configuration (YAML or JSON)")]
    config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        help = "Key document with geminiApiKey, openaiApiKey, claudeApiKey and aiProvider"
    )]
    keys: Option<PathBuf>,

    #[arg(long, global = true, help = "consensus (or triple), gemini, openai or claude")]
    mode: Option<AnalysisMode>,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Review a full profile snapshot
    Profile {
        #[arg(long, help = "Profile snapshot JSON")]
        input: PathBuf,
    },
    /// Check a profile against a job description
    Keywords {
        #[arg(long, help = "Job description text")]
        job: PathBuf,

        #[arg(long, required_unless_present = "snapshot", conflicts_with = "snapshot")]
        profile: Option<PathBuf>,

        #[arg(long, help = "Derive the profile text from a snapshot JSON")]
        snapshot: Option<PathBuf>,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    // Later calls are no-ops
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn read_snapshot(path: &Path) -> Result<ProfileSnapshot> {
    serde_json::from_str(&read_text(path)?)
        .with_context(|| format!("{} is not a profile snapshot", path.display()))
}

fn build_request(command: &Commands) -> Result<AnalysisRequest> {
    match command {
        Commands::Profile { input } => Ok(AnalysisRequest::profile(read_snapshot(input)?)),
        Commands::Keywords {
            job,
            profile,
            snapshot,
        } => {
            let job_description = read_text(job)?;
            let input = match (profile, snapshot) {
                (Some(profile), _) => KeywordMatchInput::new(job_description, read_text(profile)?),
                (None, Some(snapshot)) => {
                    KeywordMatchInput::from_snapshot(job_description, &read_snapshot(snapshot)?)
                }
                (None, None) => anyhow::bail!("Either --profile or --snapshot is required"),
            };
            Ok(AnalysisRequest::keyword_match(input))
        }
    }
}

/// Key document first, environment second.
fn build_store(keys: Option<&Path>) -> Result<LayeredStore> {
    let mut store = LayeredStore::new();
    if let Some(path) = keys {
        let document = DocumentStore::from_file(path)
            .with_context(|| format!("Failed to load keys from {}", path.display()))?;
        store = store.with_layer(document);
    }
    Ok(store.with_layer(EnvStore::new()))
}

/// `--mode` wins over the store, which wins over the config file.
fn resolve_mode(
    flag: Option<AnalysisMode>,
    store: &dyn KeyValueStore,
    config: &RuntimeConfig,
) -> Result<AnalysisMode> {
    match flag {
        Some(mode) => Ok(mode),
        None => preferred_mode(store, config.default_mode).context("Invalid stored analysis mode"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = match &cli.config {
        Some(path) => RuntimeConfig::from_file(path).context("Failed to load configuration")?,
        None => RuntimeConfig::default(),
    };
    let store = build_store(cli.keys.as_deref())?;
    let mode = resolve_mode(cli.mode, &store, &config)?;
    let request = build_request(&cli.command)?;

    let orchestrator = Orchestrator::from_store(&config, &store)?;
    tracing::info!(mode = %mode, kind = %request.kind(), providers = ?orchestrator.providers(), "Starting analysis");

    let report = orchestrator
        .analyze(&request, mode)
        .await
        .context("Analysis failed")?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
