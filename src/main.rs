//! ocr-disambiguate command-line entry point

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use ocr_disambiguate::config::{self, AppConfig};
use ocr_disambiguate::disambiguation::{Disambiguator, ReconcilePolicy};
use ocr_disambiguate::output::{self, OutputFormat};
use ocr_disambiguate::vision::{RecognitionEngine, RecognizeOptions, SourceImage, TesseractEngine};

/// Extract text from an image, re-reading confusable characters
#[derive(Parser, Debug)]
#[command(name = "ocr-disambiguate")]
#[command(about = "Extract text from images with a second OCR pass for confusable characters")]
struct Args {
    /// Path to image file
    image: PathBuf,

    /// Comma-separated language codes (default: en)
    #[arg(long)]
    lang: Option<String>,

    /// Show detailed output with boxes/confidence
    #[arg(long, conflicts_with = "json")]
    detail: bool,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Second-pass OCR on ambiguous tokens
    #[arg(long)]
    disambiguate: bool,

    /// Tesseract page segmentation mode
    #[arg(long)]
    psm: Option<u32>,

    /// Candidate reconciliation policy
    #[arg(long, value_enum)]
    policy: Option<ReconcilePolicy>,

    /// Concurrent second-pass calls
    #[arg(long)]
    workers: Option<usize>,

    /// Per-call timeout for the second pass in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Configuration file (default: platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_logging(args.verbose) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Install the tracing subscriber; RUST_LOG overrides the verbosity flag
fn init_logging(verbosity: u8) -> Result<()> {
    let default_level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn run(args: Args) -> Result<ExitCode> {
    let mut config = load_or_create_config(args.config.as_deref())?;
    apply_overrides(&mut config, &args);
    config.validate()?;

    let languages = config.engine.language_list();
    if languages.is_empty() {
        eprintln!("No languages specified.");
        return Ok(ExitCode::from(2));
    }

    let engine = Arc::new(TesseractEngine::new(&languages, config.engine.psm, config.engine.oem)?);
    let source = SourceImage::open(&args.image)?;
    let (width, height) = source.dimensions();
    info!("Loaded {:?} ({}x{})", source.path(), width, height);

    let mut tokens = engine
        .recognize(source.pixels(), &RecognizeOptions::full())
        .with_context(|| format!("First-pass recognition failed for {:?}", source.path()))?;
    info!("First pass ({}) found {} tokens", engine.name(), tokens.len());

    if config.disambiguation.enabled {
        let disambiguator = Disambiguator::from_config(engine, &config.disambiguation);
        tokens = disambiguator.disambiguate(source.pixels(), &tokens);
    }

    println!("{}", output::render(&tokens, config.output.format)?);

    Ok(ExitCode::SUCCESS)
}

/// Load configuration from an explicit path, the default location, or defaults
fn load_or_create_config(explicit: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        let config = config::load_config(path)
            .with_context(|| format!("Failed to load configuration from {:?}", path))?;
        info!("Loaded configuration from {:?}", path);
        return Ok(config);
    }

    if let Ok(config_path) = config::default_config_path() {
        if config_path.exists() {
            match config::load_config(&config_path) {
                Ok(config) => {
                    info!("Loaded configuration from {:?}", config_path);
                    return Ok(config);
                }
                Err(e) => warn!("Ignoring unreadable configuration {:?}: {:#}", config_path, e),
            }
        }
    }

    info!("Using default configuration");
    Ok(AppConfig::default())
}

/// Command-line flags take precedence over the configuration file
fn apply_overrides(config: &mut AppConfig, args: &Args) {
    if let Some(lang) = &args.lang {
        config.engine.languages = lang.split(',').map(|s| s.trim().to_string()).collect();
    }
    if let Some(psm) = args.psm {
        config.engine.psm = psm;
    }
    if args.disambiguate {
        config.disambiguation.enabled = true;
    }
    if let Some(policy) = args.policy {
        config.disambiguation.policy = policy;
    }
    if let Some(workers) = args.workers {
        config.disambiguation.workers = workers;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.disambiguation.timeout_ms = Some(timeout_ms);
    }
    if args.detail {
        config.output.format = OutputFormat::Detailed;
    }
    if args.json {
        config.output.format = OutputFormat::Json;
    }
}
