//! Error types for plugin collection.
//!
//! Every failure the collection core can produce is one of these types.
//! Application glue (config loading, persistence, `main`) wraps them in
//! `anyhow` with context.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// An option value that the CLI-argument encoder cannot express.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported type for argument `{key}`: {kind}")]
pub struct ArgumentEncodingError {
    /// Offending option key.
    pub key: String,
    /// Human-readable name of the rejected value kind.
    pub kind: String,
}

/// Why a child process did not complete successfully.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProcessFailureKind {
    #[error("failed to spawn: {0}")]
    Spawn(String),

    #[error("exited with code {0}")]
    Exit(i32),

    #[error("terminated by signal {0}")]
    Signal(i32),

    #[error("timed out after {0}ms and was killed")]
    Timeout(u64),

    #[error("I/O error while waiting: {0}")]
    Io(String),
}

/// A child process failed to spawn, exited non-zero, was signalled, or timed out.
///
/// Carries whatever stdout/stderr had been collected up to the failure point.
#[derive(Debug, Clone, thiserror::Error)]
#[error("`{command}` {kind}{}", stderr_tail(.stderr))]
pub struct ProcessExecutionError {
    pub command: String,
    pub kind: ProcessFailureKind,
    pub stdout: String,
    pub stderr: String,
    /// Exit code, when the process exited on its own.
    pub code: Option<i32>,
    pub duration: Duration,
}

impl ProcessExecutionError {
    /// True if the process was killed because it exceeded its timeout.
    #[cfg(test)]
    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, ProcessFailureKind::Timeout(_))
    }
}

const STDERR_TAIL_LINES: usize = 3;

/// Last few non-empty stderr lines, formatted as a message suffix.
fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if lines.is_empty() {
        return String::new();
    }

    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    format!(": {}", lines[start..].join(" | "))
}

/// A single schema violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Field path, e.g. `audits[2].score`.
    pub path: String,
    pub expected: String,
    pub actual: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected {}, got {}",
            self.path, self.expected, self.actual
        )
    }
}

/// A document did not conform to its schema. Lists every violation found.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub struct SchemaValidationError {
    /// Name of the schema that was checked.
    pub schema: &'static str,
    pub violations: Vec<Violation>,
}

impl SchemaValidationError {
    /// Whether any violation points at exactly this path.
    #[cfg(test)]
    pub fn has_path(&self, path: &str) -> bool {
        self.violations.iter().any(|v| v.path == path)
    }
}

impl fmt::Display for SchemaValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failed schema validation ({} violation{})",
            self.schema,
            self.violations.len(),
            if self.violations.len() == 1 { "" } else { "s" }
        )?;
        for violation in &self.violations {
            write!(f, "\n  - {}", violation)?;
        }
        Ok(())
    }
}

/// Underlying cause of a [`PluginFailure`].
#[derive(Debug, thiserror::Error)]
pub enum PluginFailureReason {
    #[error(transparent)]
    Arguments(#[from] ArgumentEncodingError),

    #[error(transparent)]
    Process(#[from] ProcessExecutionError),

    #[error("could not read runner output from {source_name}: {message}")]
    Output {
        source_name: String,
        message: String,
    },

    #[error(transparent)]
    Schema(#[from] SchemaValidationError),
}

/// A plugin could not produce a usable report.
#[derive(Debug, thiserror::Error)]
#[error("Plugin `{slug}` failed: {reason}")]
pub struct PluginFailure {
    pub slug: String,
    pub reason: PluginFailureReason,
}

impl PluginFailure {
    pub fn new(slug: impl Into<String>, reason: impl Into<PluginFailureReason>) -> Self {
        Self {
            slug: slug.into(),
            reason: reason.into(),
        }
    }
}

/// Report finalization failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssemblyFailure {
    #[error(
        "Category `{category}` references audit `{audit}` of plugin `{plugin}`, which no plugin report provides"
    )]
    UnresolvedReference {
        category: String,
        plugin: String,
        audit: String,
    },

    #[error("Unknown category `{0}` in category filter")]
    UnknownCategory(String),
}

/// Any failure that stops the collection run.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error(transparent)]
    Plugin(#[from] PluginFailure),

    #[error(transparent)]
    Assembly(#[from] AssemblyFailure),

    #[error("assembled report is invalid: {0}")]
    Report(#[from] SchemaValidationError),
}
