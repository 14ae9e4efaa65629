// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Argus: cached multi-modal file categorizer
//!
//! Describes text, image and audio files with local AI models, caches the
//! descriptions and sorts files into people/hardware buckets.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use argus::analyzers::{ContentAnalyzer, Transcriber};
use argus::cache::CacheStore;
use argus::config::AppConfig;
use argus::dispatcher::Dispatcher;
use argus::ollama::OllamaEngine;
use argus::orchestrator::{Orchestrator, RunOutcome};
use argus::transcriber::{DisabledTranscriber, WhisperClient};
use argus::{ArgusError, Result};

/// Argus CLI - cached multi-modal file categorizer
#[derive(Parser, Debug)]
#[command(name = "argus")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version)]
#[command(about = "Describe, cache and categorize text, image and audio files", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Output format for results
    #[arg(long, global = true, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Categorize every supported file in a directory
    Categorize {
        /// Directory to process
        dir: PathBuf,

        /// Where to write the categorization (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Maximum files analyzed at once (overrides config)
        #[arg(long)]
        max_concurrent: Option<usize>,

        /// Per-file timeout in seconds, 0 to disable (overrides config)
        #[arg(long)]
        timeout: Option<u64>,

        /// Skip Ollama health check on startup
        #[arg(long)]
        skip_health_check: bool,
    },

    /// Description cache operations
    Cache {
        #[command(subcommand)]
        action: CacheCommands,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Show AI engine status
    Status,
}

#[derive(Subcommand, Debug)]
enum CacheCommands {
    /// List cached descriptions
    List,

    /// Show one cached description without counting it as a use
    Show {
        /// File path as it was cached
        path: String,
    },

    /// Remove one cached description
    Remove {
        /// File path as it was cached
        path: String,
    },

    /// Remove every cached description
    Clear {
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Show cache statistics
    Stats,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Generate default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config.json")]
        output: PathBuf,
    },

    /// Validate configuration file
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::load(&cli.config)?;

    match cli.command {
        Commands::Categorize { dir, output, max_concurrent, timeout, skip_health_check } => {
            let overrides = RunOverrides { output, max_concurrent, timeout };
            run_categorize(config, &dir, overrides, skip_health_check, &cli.format).await
        }
        Commands::Cache { action } => run_cache_command(config, action, &cli.format),
        Commands::Config { action } => run_config_command(config, action, &cli.config),
        Commands::Status => run_status(config).await,
    }
}

/// Command-line overrides for pipeline settings
struct RunOverrides {
    output: Option<PathBuf>,
    max_concurrent: Option<usize>,
    timeout: Option<u64>,
}

/// Run the categorization pipeline over a directory
async fn run_categorize(
    mut config: AppConfig,
    dir: &Path,
    overrides: RunOverrides,
    skip_health_check: bool,
    format: &str,
) -> Result<()> {
    if !dir.is_dir() {
        return Err(ArgusError::Config(format!("Directory {:?} does not exist", dir)));
    }

    if let Some(output) = overrides.output {
        config.pipeline.output_path = output.to_string_lossy().into_owned();
    }
    if let Some(max_concurrent) = overrides.max_concurrent {
        config.pipeline.max_concurrent = max_concurrent;
    }
    if let Some(timeout) = overrides.timeout {
        config.pipeline.task_timeout_secs = timeout;
    }
    config.validate()?;

    let engine = OllamaEngine::new(&config.ai_engine)?;

    if !skip_health_check {
        info!("Checking Ollama availability...");
        engine.client().health_check().await.map_err(|e| {
            ArgusError::ServiceUnavailable(format!("Failed to connect to Ollama: {}", e))
        })?;

        for model in [&engine.models().vision, &engine.models().text, &engine.models().classifier] {
            if !engine.client().model_available(model).await? {
                warn!("Model '{}' not found in Ollama; requests using it will fail", model);
            }
        }
    } else {
        warn!("Skipping Ollama health check");
    }

    let orchestrator = build_orchestrator(&config, engine)?;
    info!("Processing directory: {:?}", dir);
    let outcome = orchestrator.run(dir).await?;

    print_outcome(&outcome, orchestrator.output_path(), format)
}

fn build_orchestrator(config: &AppConfig, engine: OllamaEngine) -> Result<Orchestrator> {
    let cache = CacheStore::open(&config.cache.path)?;

    let timeout = Duration::from_secs(config.ai_engine.timeout_secs);
    let transcriber: Arc<dyn Transcriber> =
        match WhisperClient::from_config(&config.transcription, timeout) {
            Ok(client) => Arc::new(client),
            Err(e) => {
                warn!("Audio transcription disabled: {}", e);
                Arc::new(DisabledTranscriber::new(e.to_string()))
            }
        };

    let engine = Arc::new(engine);
    let analyzer = ContentAnalyzer::new(
        cache,
        engine.clone(),
        transcriber,
        engine,
        config.prompts.clone(),
        config.pipeline.max_image_dimension,
    );

    Ok(Orchestrator::new(
        Dispatcher::new(config.pipeline.reserved_dir.clone()),
        Arc::new(analyzer),
        &config.pipeline.output_path,
    )
    .with_max_concurrent(config.pipeline.max_concurrent)
    .with_task_timeout(config.pipeline.task_timeout()))
}

fn print_outcome(outcome: &RunOutcome, output_path: &Path, format: &str) -> Result<()> {
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&outcome.categorization)?);
    } else {
        println!("Files with people:");
        for file in &outcome.categorization.people {
            println!("  - {}", file);
        }
        println!("\nFiles with hardware:");
        for file in &outcome.categorization.hardware {
            println!("  - {}", file);
        }
        println!("\nResults saved to {}", output_path.display());
    }

    if !outcome.failures.is_empty() {
        eprintln!(
            "\n{} of {} files could not be analyzed and are missing from the results:",
            outcome.failures.len(),
            outcome.dispatched
        );
        for failure in &outcome.failures {
            eprintln!("  - {}: {}", failure.path.display(), failure.reason);
        }
    }

    Ok(())
}

/// Run cache commands
fn run_cache_command(config: AppConfig, action: CacheCommands, format: &str) -> Result<()> {
    let cache = CacheStore::open(&config.cache.path)?;

    match action {
        CacheCommands::List => {
            let records = cache.list_all()?;
            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                println!("Cached descriptions ({}):", records.len());
                for record in records {
                    println!("  [{}] {} (used {} times, last {})",
                        record.content_type,
                        record.file_path,
                        record.use_count,
                        record.last_used.format("%Y-%m-%d %H:%M")
                    );
                }
            }
        }
        CacheCommands::Show { path } => {
            match cache.peek(&path)? {
                Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                None => eprintln!("No cached description for {}", path),
            }
        }
        CacheCommands::Remove { path } => {
            if cache.remove(&path)? {
                println!("Removed {}", path);
            } else {
                eprintln!("No cached description for {}", path);
            }
        }
        CacheCommands::Clear { force } => {
            if !force {
                eprintln!("Use --force to confirm clearing the cache");
                return Ok(());
            }
            cache.clear()?;
            println!("Cache cleared");
        }
        CacheCommands::Stats => {
            let stats = cache.stats()?;
            println!("Cache Statistics ({}):", config.cache.path);
            println!("  Entries: {}", stats.entries);
            println!("  Images: {}", stats.images);
            println!("  Audio: {}", stats.audio);
            println!("  Text: {}", stats.text);
            println!("  Total hits: {}", stats.total_uses);
        }
    }

    Ok(())
}

/// Run config commands
fn run_config_command(config: AppConfig, action: ConfigCommands, config_path: &Path) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            let json = serde_json::to_string_pretty(&config)?;
            println!("{}", json);
        }
        ConfigCommands::Generate { output } => {
            AppConfig::default().save(&output)?;
            println!("Generated config at {:?}", output);
        }
        ConfigCommands::Validate => {
            config.validate()?;
            println!("Configuration at {:?} is valid", config_path);
            println!("  Ollama: {}", config.ai_engine.url);
            println!("  Vision model: {}", config.ai_engine.models.vision);
            println!("  Cache: {}", config.cache.path);
            println!("  Reserved directory: {}", config.pipeline.reserved_dir);
        }
    }

    Ok(())
}

/// Run status check
async fn run_status(config: AppConfig) -> Result<()> {
    let engine = OllamaEngine::new(&config.ai_engine)?;
    let client = engine.client();

    println!("Argus v{} Status", env!("CARGO_PKG_VERSION"));
    println!("==================");

    match client.health_check().await {
        Ok(()) => println!("Ollama: Running"),
        Err(e) => println!("Ollama: Error - {}", e),
    }

    match client.list_models().await {
        Ok(models) => {
            println!("\nAvailable models:");
            let configured = engine.models();
            for m in &models {
                let marker = if [&configured.vision, &configured.text, &configured.classifier]
                    .iter()
                    .any(|c| m.starts_with(c.as_str()))
                {
                    "→"
                } else {
                    " "
                };
                println!("  {} {}", marker, m);
            }
        }
        Err(e) => println!("  Error listing models: {}", e),
    }

    let transcription_key = std::env::var(&config.transcription.api_key_env).is_ok();
    println!("\nTranscription: {} ({})",
        config.transcription.url,
        if transcription_key { "key set" } else { "no API key" }
    );

    match CacheStore::open(&config.cache.path).and_then(|c| c.stats()) {
        Ok(stats) => {
            println!("\nCache ({}):", config.cache.path);
            println!("  Entries: {}", stats.entries);
            println!("  Total hits: {}", stats.total_uses);
        }
        Err(e) => println!("\nCache: Error - {}", e),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_requires_command() {
        assert!(Cli::try_parse_from(["argus"]).is_err());
    }

    #[test]
    fn test_cli_categorize_command() {
        let cli = Cli::try_parse_from([
            "argus", "categorize", "/tmp/factory", "--max-concurrent", "2", "--skip-health-check"
        ]).unwrap();

        match cli.command {
            Commands::Categorize { dir, max_concurrent, skip_health_check, output, timeout } => {
                assert_eq!(dir, PathBuf::from("/tmp/factory"));
                assert_eq!(max_concurrent, Some(2));
                assert!(skip_health_check);
                assert!(output.is_none());
                assert!(timeout.is_none());
            }
            _ => panic!("Expected Categorize command"),
        }
    }

    #[test]
    fn test_cli_cache_remove() {
        let cli = Cli::try_parse_from([
            "argus", "--verbose", "cache", "remove", "data/note.txt"
        ]).unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Cache { action: CacheCommands::Remove { path } } => {
                assert_eq!(path, "data/note.txt");
            }
            _ => panic!("Expected cache remove command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["argus", "--format", "xml", "status"]).is_err());
    }
}
