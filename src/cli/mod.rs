//! CLI argument parsing and command dispatch

mod console;
mod run;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use loadknob_core::{ConfigUpdate, Engine, EngineBuilder, KnobConfig};
use loadknob_fetch::{HttpFetcherConfig, HttpJsonFetcher};

/// loadknob - paced request-load generator with live controls
#[derive(Parser, Debug)]
#[command(name = "loadknob")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Delay between requests of one worker, in milliseconds (100-10000)
    #[arg(long, global = true)]
    pub delay_ms: Option<u64>,

    /// Number of concurrent workers (1-20)
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    /// Target endpoint returning JSON
    #[arg(short, long, global = true, env = "LOADKNOB_URI")]
    pub uri: Option<String>,

    /// Base URL relative target URIs are resolved against
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds (none by default)
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate load until the duration elapses or Ctrl+C
    Run {
        /// Stop after this many seconds
        #[arg(short, long)]
        duration: Option<u64>,

        /// Print the final report as JSON
        #[arg(long)]
        json: bool,

        /// Include every response in the final report, not just the last 10
        #[arg(long)]
        full: bool,
    },
    /// Control the engine interactively from stdin
    Console,
    /// Validate the configuration and print it
    Validate,
}

impl Cli {
    /// Execute the selected command
    pub async fn run(self) -> Result<()> {
        let config = self.load_config()?;

        match &self.command {
            Commands::Validate => {
                println!("{}", serde_json::to_string_pretty(&config)?);
                Ok(())
            }
            Commands::Run {
                duration,
                json,
                full,
            } => {
                let engine = self.build_engine(config)?;
                run::execute(engine, duration.map(Duration::from_secs), *json, *full).await
            }
            Commands::Console => {
                let engine = self.build_engine(config)?;
                console::execute(engine).await
            }
        }
    }

    /// Built-in defaults, overridden by the config file, overridden by flags
    fn load_config(&self) -> Result<KnobConfig> {
        let mut config = match &self.config {
            Some(path) => KnobConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => KnobConfig::default(),
        };

        if let Some(delay_ms) = self.delay_ms {
            config
                .apply(ConfigUpdate::DelayMillis(delay_ms))
                .context("Invalid --delay-ms")?;
        }
        if let Some(workers) = self.workers {
            config
                .apply(ConfigUpdate::WorkerCount(workers))
                .context("Invalid --workers")?;
        }
        if let Some(uri) = &self.uri {
            config
                .apply(ConfigUpdate::TargetUri(uri.clone()))
                .context("Invalid --uri")?;
        }

        Ok(config)
    }

    /// Engine starting from `config`; `reset` restores the built-in defaults
    fn build_engine(&self, config: KnobConfig) -> Result<Engine> {
        let mut http = HttpFetcherConfig::default();
        if let Some(base_url) = &self.base_url {
            http = http.with_base_url(base_url.clone());
        }
        if let Some(secs) = self.timeout_secs {
            http = http.with_timeout(Duration::from_secs(secs));
        }

        let fetcher = HttpJsonFetcher::new(&http).context("Failed to create HTTP fetcher")?;

        EngineBuilder::new()
            .config(config)
            .fetcher(Arc::new(fetcher))
            .build()
            .context("Failed to build engine")
    }
}
