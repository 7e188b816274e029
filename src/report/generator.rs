//! Report formatting.
//!
//! This module renders an assembled [`Report`] as pretty JSON, as a
//! Markdown document, or as a short terminal summary.

use crate::analysis::{format_score, issue_summary, most_problematic_audits, sort_issues_by_severity};
use crate::models::{AuditReport, CategoryScore, FailedPlugin, Issue, IssueSummary, PluginReport, Report, Severity};
use anyhow::Result;
use std::path::PathBuf;

/// Heading every Markdown report and terminal summary starts with.
pub const REPORT_TITLE: &str = "Code Pushup Report";

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {}\n\n", REPORT_TITLE));

    output.push_str(&generate_metadata_section(report));
    output.push_str(&generate_categories_section(&report.categories));
    output.push_str(&generate_summary_section(report));

    for plugin in &report.plugins {
        output.push_str(&generate_plugin_section(plugin));
    }

    output.push_str(&generate_failed_plugins_section(&report.failed_plugins));
    output.push_str(&generate_footer(report));

    output
}

/// Generate the metadata section.
fn generate_metadata_section(report: &Report) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Date:** {}\n",
        report.date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n",
        report.duration as f64 / 1000.0
    ));
    section.push_str(&format!("- **Plugins:** {}\n", report.plugins.len()));
    if !report.failed_plugins.is_empty() {
        section.push_str(&format!(
            "- **Failed Plugins:** {}\n",
            report.failed_plugins.len()
        ));
    }
    section.push_str(&format!("- **Audits:** {}\n", report.audit_count()));
    section.push('\n');

    section
}

fn generate_categories_section(categories: &[CategoryScore]) -> String {
    if categories.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Categories\n\n");
    section.push_str("| Category | Score | Audits |\n");
    section.push_str("|:---|:---:|:---:|\n");

    for category in categories {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            category.title,
            format_score(category.score),
            category.refs.len()
        ));
    }
    section.push('\n');

    section
}

/// Generate the issue summary section.
fn generate_summary_section(report: &Report) -> String {
    let summary = issue_summary(report);
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str(&generate_severity_table(&summary));

    let problematic = most_problematic_audits(report, 5);
    if !problematic.is_empty() {
        section.push_str("### Most Problematic Audits\n\n");
        section.push_str("| Plugin | Audit | Issues |\n");
        section.push_str("|:---|:---|:---:|\n");

        for (plugin, audit, count) in problematic {
            section.push_str(&format!(
                "| {} | {} | {} |\n",
                plugin.title, audit.title, count
            ));
        }
        section.push('\n');
    }

    section
}

fn generate_severity_table(summary: &IssueSummary) -> String {
    let mut table = String::new();

    let headers: Vec<String> = Severity::ALL
        .iter()
        .map(|s| format!("{} {}", s.emoji(), s))
        .collect();
    let counts: Vec<String> = Severity::ALL
        .iter()
        .map(|s| summary.count(*s).to_string())
        .collect();

    table.push_str(&format!("| {} | **Total** |\n", headers.join(" | ")));
    table.push_str("|:---:|:---:|:---:|:---:|\n");
    table.push_str(&format!(
        "| {} | **{}** |\n\n",
        counts.join(" | "),
        summary.total
    ));

    table
}

/// Generate the section for a single plugin.
fn generate_plugin_section(plugin: &PluginReport) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", plugin.title));

    let mut info = format!(
        "*Plugin: `{}` | Audits: {} | Duration: {}ms",
        plugin.slug,
        plugin.audits.len(),
        plugin.duration
    );
    if let Some(ref version) = plugin.version {
        info.push_str(&format!(" | Version: {}", version));
    }
    info.push_str("*\n\n");
    section.push_str(&info);

    section.push_str("| Audit | Score | Value |\n");
    section.push_str("|:---|:---:|:---|\n");
    for audit in &plugin.audits {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            audit.title,
            format_score(Some(audit.score)),
            display_value(audit)
        ));
    }
    section.push('\n');

    for audit in plugin.audits.iter().filter(|a| !a.issues().is_empty()) {
        section.push_str(&generate_audit_issues(audit));
    }

    section
}

fn display_value(audit: &AuditReport) -> String {
    match (&audit.display_value, audit.value) {
        (Some(display), _) => display.clone(),
        (None, Some(value)) => value.to_string(),
        (None, None) => "-".to_string(),
    }
}

/// Issues of one audit, errors first.
fn generate_audit_issues(audit: &AuditReport) -> String {
    let mut section = String::new();

    section.push_str(&format!("### {}\n\n", audit.title));
    if let Some(ref description) = audit.description {
        section.push_str(&format!("{}\n\n", description));
    }

    let mut issues: Vec<&Issue> = audit.issues().iter().collect();
    sort_issues_by_severity(&mut issues);

    for issue in issues {
        section.push_str(&generate_issue_line(issue));
    }
    section.push('\n');

    section
}

fn generate_issue_line(issue: &Issue) -> String {
    match issue.location() {
        Some(location) => format!(
            "- {} **{}** `{}`: {}\n",
            issue.severity.emoji(),
            issue.severity,
            location,
            issue.message
        ),
        None => format!(
            "- {} **{}**: {}\n",
            issue.severity.emoji(),
            issue.severity,
            issue.message
        ),
    }
}

fn generate_failed_plugins_section(failed: &[FailedPlugin]) -> String {
    if failed.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Failed Plugins\n\n");
    for plugin in failed {
        section.push_str(&format!(
            "- **{}** (`{}`): {}\n",
            plugin.title, plugin.slug, plugin.error
        ));
    }
    section.push('\n');

    section
}

fn generate_footer(report: &Report) -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by {} v{}*\n",
        report.package_name, report.version
    ));

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Short terminal summary listing the written artifacts.
pub fn generate_stdout_summary(report: &Report, artifacts: &[PathBuf]) -> String {
    let mut output = String::new();

    output.push_str(&format!("{}\n\n", REPORT_TITLE));

    output.push_str("Generated reports:\n");
    for path in artifacts {
        output.push_str(&format!("  - {}\n", path.display()));
    }
    output.push('\n');

    if !report.categories.is_empty() {
        output.push_str("Categories:\n");
        for category in &report.categories {
            output.push_str(&format!(
                "  {:<24} {:>4}\n",
                category.title,
                format_score(category.score)
            ));
        }
        output.push('\n');
    }

    output.push_str("Plugins:\n");
    for plugin in &report.plugins {
        output.push_str(&format!(
            "  {:<24} {} audits\n",
            plugin.title,
            plugin.audits.len()
        ));
    }
    for plugin in &report.failed_plugins {
        output.push_str(&format!("  {:<24} failed\n", plugin.title));
    }

    let summary = issue_summary(report);
    output.push_str(&format!(
        "\nIssues: {} ({} errors, {} warnings, {} info)\n",
        summary.total, summary.error, summary.warning, summary.info
    ));

    output
}
