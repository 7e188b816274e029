//! Writing report artifacts to disk.

use crate::cli::OutputFormat;
use crate::config::PersistConfig;
use crate::models::Report;
use crate::report::generator::{generate_json_report, generate_markdown_report};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Write the report artifacts and return their paths.
///
/// The JSON artifact is always written; Markdown only when requested.
pub fn persist_report(
    report: &Report,
    persist: &PersistConfig,
    formats: &[OutputFormat],
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(&persist.output_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            persist.output_dir.display()
        )
    })?;

    let mut written = Vec::new();

    let json_path = persist.artifact_path("json");
    write_artifact(&json_path, &generate_json_report(report)?)?;
    written.push(json_path);

    if formats.contains(&OutputFormat::Md) {
        let md_path = persist.artifact_path("md");
        write_artifact(&md_path, &generate_markdown_report(report))?;
        written.push(md_path);
    }

    Ok(written)
}

fn write_artifact(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    info!("Report saved to: {}", path.display());
    Ok(())
}
