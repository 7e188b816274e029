//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Code PushUp - runs code-quality plugins and merges their results
///
/// Each configured plugin is an external command that writes a JSON
/// runner output. Results are validated, scored per category, and
/// written as JSON/Markdown reports.
///
/// Examples:
///   code-pushup collect
///   code-pushup collect --format=md
///   code-pushup collect --format json,stdout --parallel 4
///   code-pushup --config ci/code-pushup.toml collect --continue-on-error
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for code-pushup.toml in the current directory
    #[arg(short, long, global = true, value_name = "FILE", env = "CODE_PUSHUP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output and the progress bar
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (errors only, no progress bar)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run all plugins and write the report
    Collect(CollectArgs),
}

/// Options for `collect`.
#[derive(clap::Args, Debug, Clone)]
pub struct CollectArgs {
    /// Report formats to produce (json, md, stdout)
    ///
    /// The JSON artifact is always written; `md` adds a Markdown file and
    /// `stdout` prints a summary.
    #[arg(long, value_delimiter = ',', default_value = "json", value_name = "FORMAT")]
    pub format: Vec<OutputFormat>,

    /// Maximum number of plugins to run at once
    #[arg(long, value_name = "NUM")]
    pub parallel: Option<usize>,

    /// Record failed plugins and keep going instead of aborting
    #[arg(long)]
    pub continue_on_error: bool,

    /// Directory for report artifacts
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Only include these categories (comma-separated slugs)
    #[arg(long, value_name = "SLUGS", value_delimiter = ',')]
    pub categories: Option<Vec<String>>,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON report file (default)
    #[default]
    Json,
    /// Markdown report file
    Md,
    /// Summary on standard output
    Stdout,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        let Command::Collect(ref collect) = self.command;

        if collect.parallel == Some(0) {
            return Err("Parallel must be at least 1".to_string());
        }

        if let Some(ref categories) = collect.categories {
            if categories.iter().any(|c| c.trim().is_empty()) {
                return Err("Category filter contains an empty slug".to_string());
            }
        }

        if let Some(ref config) = self.config {
            if !config.exists() {
                return Err(format!("Config file does not exist: {}", config.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// Successful runs stay silent on stderr unless `--verbose` is given.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        }
    }

    /// Whether to draw the progress bar on stderr.
    pub fn show_progress(&self, stderr_is_terminal: bool) -> bool {
        !self.quiet && (self.verbose || stderr_is_terminal)
    }
}

impl CollectArgs {
    pub fn wants(&self, format: OutputFormat) -> bool {
        self.format.contains(&format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("code-pushup").chain(args.iter().copied())).unwrap()
    }

    fn collect_args(args: &Args) -> &CollectArgs {
        let Command::Collect(ref collect) = args.command;
        collect
    }

    #[test]
    fn test_default_format_is_json() {
        let args = parse(&["collect"]);
        assert_eq!(collect_args(&args).format, vec![OutputFormat::Json]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_format_values() {
        let args = parse(&["collect", "--format=md"]);
        assert_eq!(collect_args(&args).format, vec![OutputFormat::Md]);

        let args = parse(&["collect", "--format", "json,stdout"]);
        assert!(collect_args(&args).wants(OutputFormat::Stdout));
        assert!(collect_args(&args).wants(OutputFormat::Json));
        assert!(!collect_args(&args).wants(OutputFormat::Md));
    }

    #[test]
    fn test_unknown_format_rejected() {
        let result = Args::try_parse_from(["code-pushup", "collect", "--format=html"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = parse(&["collect", "--verbose", "--categories", "style,perf"]);
        assert!(args.verbose);
        assert_eq!(
            collect_args(&args).categories,
            Some(vec!["style".to_string(), "perf".to_string()])
        );
    }

    #[test]
    fn test_validation_zero_parallel() {
        let args = parse(&["collect", "--parallel", "0"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let args = parse(&["--verbose", "--quiet", "collect"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = parse(&["collect"]);
        assert_eq!(args.log_level(), tracing::Level::WARN);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_show_progress() {
        let args = parse(&["collect"]);
        assert!(!args.show_progress(false));
        assert!(args.show_progress(true));

        let args = parse(&["collect", "--verbose"]);
        assert!(args.show_progress(false));

        let args = parse(&["--quiet", "collect"]);
        assert!(!args.show_progress(true));
    }
}
