//! Category scoring and issue statistics.
//!
//! This module merges validated plugin reports into category scores and
//! provides the summaries the report formatters render.

use crate::error::AssemblyFailure;
use crate::models::{
    AuditReport, CategoryConfig, CategoryScore, FailedPlugin, Issue, IssueSummary, PluginReport,
    Report,
};

/// Restrict categories to the given slugs, keeping config order.
///
/// An empty filter keeps every category.
pub fn filter_categories(
    categories: &[CategoryConfig],
    filter: &[String],
) -> Result<Vec<CategoryConfig>, AssemblyFailure> {
    if let Some(unknown) = filter
        .iter()
        .find(|slug| !categories.iter().any(|c| &c.slug == *slug))
    {
        return Err(AssemblyFailure::UnknownCategory(unknown.clone()));
    }

    Ok(categories
        .iter()
        .filter(|c| filter.is_empty() || filter.contains(&c.slug))
        .cloned()
        .collect())
}

/// Compute a score for every category.
///
/// References to plugins in `failed` are skipped; any other reference that
/// no plugin report resolves is an [`AssemblyFailure`].
pub fn score_categories(
    categories: &[CategoryConfig],
    plugins: &[PluginReport],
    failed: &[FailedPlugin],
) -> Result<Vec<CategoryScore>, AssemblyFailure> {
    categories
        .iter()
        .map(|category| {
            Ok(CategoryScore {
                slug: category.slug.clone(),
                title: category.title.clone(),
                score: score_category(category, plugins, failed)?,
                refs: category.refs.clone(),
            })
        })
        .collect()
}

/// Weighted average of the resolvable audit scores, weights normalized to 1.
///
/// Returns `None` when the resolvable weight is zero.
pub fn score_category(
    category: &CategoryConfig,
    plugins: &[PluginReport],
    failed: &[FailedPlugin],
) -> Result<Option<f64>, AssemblyFailure> {
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;

    for reference in &category.refs {
        if failed.iter().any(|f| f.slug == reference.plugin) {
            continue;
        }

        let audit = plugins
            .iter()
            .find(|p| p.slug == reference.plugin)
            .and_then(|p| p.audit(&reference.slug))
            .ok_or_else(|| AssemblyFailure::UnresolvedReference {
                category: category.slug.clone(),
                plugin: reference.plugin.clone(),
                audit: reference.slug.clone(),
            })?;

        weighted_sum += audit.score * reference.weight;
        total_weight += reference.weight;
    }

    if total_weight > 0.0 {
        Ok(Some(weighted_sum / total_weight))
    } else {
        Ok(None)
    }
}

/// All issues across every plugin and audit.
pub fn all_issues(report: &Report) -> impl Iterator<Item = &Issue> {
    report
        .plugins
        .iter()
        .flat_map(|p| p.audits.iter())
        .flat_map(|a| a.issues().iter())
}

/// Issue counts by severity across the whole report.
pub fn issue_summary(report: &Report) -> IssueSummary {
    IssueSummary::from_issues(all_issues(report))
}

/// Sort issues by severity (errors first), keeping relative order otherwise.
pub fn sort_issues_by_severity(issues: &mut [&Issue]) {
    issues.sort_by(|a, b| b.severity.cmp(&a.severity));
}

/// Audits with the most issues, most first. Ties keep report order.
pub fn most_problematic_audits(report: &Report, n: usize) -> Vec<(&PluginReport, &AuditReport, usize)> {
    let mut audits: Vec<_> = report
        .plugins
        .iter()
        .flat_map(|p| p.audits.iter().map(move |a| (p, a, a.issues().len())))
        .filter(|(_, _, count)| *count > 0)
        .collect();

    audits.sort_by_key(|(_, _, count)| std::cmp::Reverse(*count));
    audits.truncate(n);

    audits
}

/// Format a score in `[0, 1]` as a rounded percentage, `n/a` when absent.
pub fn format_score(score: Option<f64>) -> String {
    match score {
        Some(score) => format!("{}", (score * 100.0).round() as i64),
        None => "n/a".to_string(),
    }
}
