use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use deepcheck::config::{AppConfig, CliConfig, FileConfig};
use deepcheck::report::aggregate;
use deepcheck::{Auditor, ClassifierAdapter, MediaScorer, ReportStore, SamplingPolicy};

fn parse_sampling(s: &str) -> Result<SamplingPolicy> {
    SamplingPolicy::from_name(s)
        .ok_or_else(|| anyhow!("expected \"stride\" or \"count\", got {:?}", s))
}

#[derive(Parser, Debug)]
#[command(name = "deepcheck", version, about = "Deepfake detection and authenticity scoring")]
struct CliArgs {
    /// Path to a TOML config file. Its values override the flags below.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to the ONNX classifier model.
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    /// Directory where reports are stored.
    #[arg(long, global = true)]
    reports_dir: Option<PathBuf>,

    /// Video sampling policy: "stride" or "count".
    #[arg(long, global = true, value_parser = parse_sampling)]
    sampling: Option<SamplingPolicy>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Audit a file: score, hash, fuse and store a report
    Scan {
        /// Image (jpg, jpeg, png) or video (mp4, avi, mov, mkv)
        file: PathBuf,
    },
    /// Print the AI score of a file without storing a report
    Score { file: PathBuf },
    /// Print the aggregate of all stored reports
    Dashboard,
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    // Load TOML config if provided
    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };

    let cli_config = CliConfig {
        model_path: cli_args.model.clone(),
        reports_dir: cli_args.reports_dir.clone(),
        sampling: cli_args.sampling,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    match cli_args.command {
        Command::Scan { file } => scan(&config, file),
        Command::Score { file } => score(&config, file),
        Command::Dashboard => dashboard(&config),
    }
}

fn build_scorer(config: &AppConfig) -> MediaScorer {
    let adapter = ClassifierAdapter::load(&config.model_config());
    info!(
        "Classifier: {} (input {}px), sampling: {}",
        adapter.engine_name(),
        adapter.input_size(),
        config.sampling
    );
    MediaScorer::new(adapter, config.sampler())
}

fn open_store(config: &AppConfig) -> Result<ReportStore> {
    ReportStore::open(&config.reports_dir)
        .with_context(|| format!("Failed to open reports directory: {:?}", config.reports_dir))
}

fn scan(config: &AppConfig, file: PathBuf) -> Result<()> {
    let auditor = Auditor::new(build_scorer(config), open_store(config)?)
        .with_metadata(config.metadata_scorer())
        .with_weights(config.weights);

    let outcome = auditor
        .audit(&file)
        .with_context(|| format!("Failed to audit {:?}", file))?;

    if let Some(reason) = outcome.scored.fallback_reason() {
        warn!("AI score for {:?} is the neutral fallback ({})", file, reason);
    }
    info!("Report stored as {}", outcome.key);

    println!("{}", serde_json::to_string_pretty(&outcome.report)?);
    Ok(())
}

fn score(config: &AppConfig, file: PathBuf) -> Result<()> {
    let scorer = build_scorer(config);
    let scored = scorer
        .score_media(&file)
        .with_context(|| format!("Failed to score {:?}", file))?;

    let output = serde_json::json!({
        "file": file.display().to_string(),
        "ai_score": scored.value(),
        "samples": scored.samples(),
        "fallback": scored.fallback_reason().map(|r| r.as_str()),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn dashboard(config: &AppConfig) -> Result<()> {
    let store = open_store(config)?;
    let dashboard = aggregate(store.read_all()?);

    if dashboard.is_empty() {
        println!("No reports found yet. Scan a file first.");
        return Ok(());
    }

    println!("{}", serde_json::to_string_pretty(&dashboard)?);
    Ok(())
}
