//! Data models for plugin collection.
//!
//! This module contains the plugin/category configuration types, the
//! runner output shape plugins emit, and the assembled report. All wire
//! types serialize as camelCase JSON.

use crate::process::CliOptions;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Severity level of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational finding
    Info,
    /// Something that should be looked at
    Warning,
    /// A rule violation
    Error,
}

impl Severity {
    /// All severities, most severe first.
    pub const ALL: [Severity; 3] = [Severity::Error, Severity::Warning, Severity::Info];

    /// Wire names accepted by the schema.
    pub const NAMES: [&'static str; 3] = ["info", "warning", "error"];

    /// Returns an emoji representation of the severity.
    pub fn emoji(&self) -> &'static str {
        match self {
            Severity::Info => "🔵",
            Severity::Warning => "🟡",
            Severity::Error => "🔴",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Position of an issue within a file (1-indexed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcePosition {
    pub start_line: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_column: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_column: Option<u32>,
}

/// Where an issue was found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// File path, as reported by the plugin.
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<SourcePosition>,
}

/// A single finding reported for an audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub message: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceLocation>,
}

impl Issue {
    /// Returns the location as `file:line` or `file:start-end`.
    pub fn location(&self) -> Option<String> {
        let source = self.source.as_ref()?;
        let Some(position) = &source.position else {
            return Some(source.file.clone());
        };
        match position.end_line {
            Some(end) if end != position.start_line => Some(format!(
                "{}:{}-{}",
                source.file, position.start_line, end
            )),
            _ => Some(format!("{}:{}", source.file, position.start_line)),
        }
    }
}

/// Optional audit details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditDetails {
    #[serde(default)]
    pub issues: Vec<Issue>,
}

/// One audit result as emitted by a plugin runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditOutput {
    pub slug: String,
    /// Normalized score in `[0, 1]`.
    pub score: f64,
    /// Raw measured value (e.g. number of issues).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Formatted or categorical value for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<AuditDetails>,
}

/// The document a plugin runner writes on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerOutput {
    pub audits: Vec<AuditOutput>,
    /// Version of the underlying analysis tool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Self-reported runtime in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// An audit a plugin declares it can produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditMetadata {
    pub slug: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// How to invoke a plugin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Executable to run.
    pub command: String,
    /// Raw arguments, passed before the encoded options.
    #[serde(default)]
    pub args: Vec<String>,
    /// Structured options, encoded into `--key=value` tokens.
    #[serde(default, skip_serializing_if = "CliOptions::is_empty")]
    pub options: CliOptions,
    /// File the runner writes its output to. Stdout is parsed when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file: Option<PathBuf>,
    /// Kill the runner after this many milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Working directory. Defaults to the current directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
}

/// A configured plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginConfig {
    pub slug: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub runner: RunnerConfig,
    pub audits: Vec<AuditMetadata>,
}

impl PluginConfig {
    /// Look up a declared audit by slug.
    pub fn audit(&self, slug: &str) -> Option<&AuditMetadata> {
        self.audits.iter().find(|a| a.slug == slug)
    }
}

/// A weighted reference from a category to one plugin audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRef {
    /// Slug of the plugin that produces the audit.
    pub plugin: String,
    /// Audit slug.
    pub slug: String,
    pub weight: f64,
}

/// A weighted grouping of audits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub slug: String,
    pub title: String,
    pub refs: Vec<CategoryRef>,
}

/// An audit in the final report: the runner output plus declared metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub slug: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<AuditDetails>,
}

impl AuditReport {
    /// Merge a validated audit output with its declared metadata.
    pub fn new(metadata: &AuditMetadata, output: AuditOutput) -> Self {
        Self {
            slug: output.slug,
            title: metadata.title.clone(),
            description: metadata.description.clone(),
            score: output.score,
            value: output.value,
            display_value: output.display_value,
            details: output.details,
        }
    }

    /// Issues reported for this audit.
    pub fn issues(&self) -> &[Issue] {
        self.details.as_ref().map(|d| d.issues.as_slice()).unwrap_or(&[])
    }
}

/// A validated plugin result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginReport {
    pub slug: String,
    pub title: String,
    /// When the runner was started.
    pub date: DateTime<Utc>,
    /// Wall-clock runtime in milliseconds.
    pub duration: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub audits: Vec<AuditReport>,
}

impl PluginReport {
    /// Look up an audit by slug.
    pub fn audit(&self, slug: &str) -> Option<&AuditReport> {
        self.audits.iter().find(|a| a.slug == slug)
    }
}

/// A computed category score. `score` is `None` when not computable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub slug: String,
    pub title: String,
    pub score: Option<f64>,
    pub refs: Vec<CategoryRef>,
}

/// A plugin skipped under continue-on-error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedPlugin {
    pub slug: String,
    pub title: String,
    pub error: String,
}

/// The complete collection report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub package_name: String,
    pub version: String,
    pub date: DateTime<Utc>,
    /// Total wall-clock runtime in milliseconds.
    pub duration: u64,
    pub categories: Vec<CategoryScore>,
    pub plugins: Vec<PluginReport>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_plugins: Vec<FailedPlugin>,
}

impl Report {
    /// Total number of audits across all plugins.
    pub fn audit_count(&self) -> usize {
        self.plugins.iter().map(|p| p.audits.len()).sum()
    }

    /// The report as JSON with `date`, `duration` and `version` removed
    /// from the top level and from every plugin.
    #[cfg(test)]
    pub fn without_variable_data(&self) -> serde_json::Value {
        const VARIABLE: [&str; 3] = ["date", "duration", "version"];

        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(report) = value.as_object_mut() {
            for key in VARIABLE {
                report.remove(key);
            }
            if let Some(plugins) = report.get_mut("plugins").and_then(|p| p.as_array_mut()) {
                for plugin in plugins.iter_mut().filter_map(|p| p.as_object_mut()) {
                    for key in VARIABLE {
                        plugin.remove(key);
                    }
                }
            }
        }
        value
    }
}

/// Issue counts by severity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueSummary {
    pub total: usize,
    pub error: usize,
    pub warning: usize,
    pub info: usize,
}

impl IssueSummary {
    /// Creates a summary from a list of issues.
    pub fn from_issues<'a>(issues: impl IntoIterator<Item = &'a Issue>) -> Self {
        let mut summary = Self::default();
        for issue in issues {
            summary.total += 1;
            match issue.severity {
                Severity::Error => summary.error += 1,
                Severity::Warning => summary.warning += 1,
                Severity::Info => summary.info += 1,
            }
        }
        summary
    }

    pub fn count(&self, severity: Severity) -> usize {
        match severity {
            Severity::Error => self.error,
            Severity::Warning => self.warning,
            Severity::Info => self.info,
        }
    }
}
