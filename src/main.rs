//! Code PushUp - code-quality report aggregator
//!
//! Runs each configured plugin as an external process, validates the JSON
//! it produces, scores categories, and writes the merged report.
//!
//! Exit codes:
//!   0 - Report collected and written
//!   1 - Configuration, plugin, assembly, or persistence failure

mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod process;
mod report;
mod schema;

use analysis::CollectOptions;
use anyhow::{Context, Result};
use cli::{Args, CollectArgs, Command, OutputFormat};
use config::{Config, DEFAULT_CONFIG_FILE};
use std::io::IsTerminal;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    init_logging(&args);

    info!("Code PushUp v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    let result = match args.command {
        Command::Collect(ref collect) => run_collect(&args, collect).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Initialize logging on stderr. `RUST_LOG` overrides the verbosity flags.
fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level().to_string().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the `collect` workflow: load config, run plugins, persist, summarize.
async fn run_collect(args: &Args, collect: &CollectArgs) -> Result<()> {
    let mut config = load_config(args)?;
    config.merge_with_args(collect);

    let options =
        CollectOptions::from_config(&config, args.show_progress(std::io::stderr().is_terminal()));

    let report = analysis::collect(&config.plugins, &config.categories, &options)
        .await
        .context("Failed to collect report")?;

    info!(
        plugins = report.plugins.len(),
        failed = report.failed_plugins.len(),
        audits = report.audit_count(),
        duration_ms = report.duration,
        "Report assembled"
    );

    let artifacts = report::persist_report(&report, &config.persist, &collect.format)?;

    if collect.wants(OutputFormat::Stdout) {
        print!("{}", report::generate_stdout_summary(&report, &artifacts));
    }

    Ok(())
}

/// Load configuration from `--config` or the default file.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_default()? {
        Some(config) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        None => anyhow::bail!(
            "No configuration found: pass --config or create {}",
            DEFAULT_CONFIG_FILE
        ),
    }
}
