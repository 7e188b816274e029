//! Report assembly: run every plugin and merge the results.
//!
//! Plugins run up to `parallel` at a time. Results land in a slot indexed by
//! configuration position, so the report lists plugins in declaration order
//! no matter which one finishes first. A hard failure drops every in-flight
//! run, which kills its child process.

use crate::analysis::aggregator::{filter_categories, score_categories};
use crate::config::Config;
use crate::error::{CollectError, PluginFailure, PluginFailureReason};
use crate::models::{
    AuditReport, CategoryConfig, FailedPlugin, PluginConfig, PluginReport, Report, RunnerConfig,
    RunnerOutput,
};
use crate::process::{encode_cli_args, execute_process, ProcessConfig, ProcessEvent};
use crate::schema::{check_declared_audits, validate_report, validate_runner_output};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Run-wide options for one collection.
#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// Maximum number of plugins in flight.
    pub parallel: usize,
    /// Record failed plugins instead of aborting the run.
    pub continue_on_error: bool,
    /// Category slugs to keep; empty keeps all.
    pub categories: Vec<String>,
    /// Draw a progress bar on stderr.
    pub show_progress: bool,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            parallel: 1,
            continue_on_error: false,
            categories: Vec::new(),
            show_progress: false,
        }
    }
}

impl CollectOptions {
    pub fn from_config(config: &Config, show_progress: bool) -> Self {
        Self {
            parallel: config.run.parallel,
            continue_on_error: config.run.continue_on_error,
            categories: config.run.categories.clone(),
            show_progress,
        }
    }
}

/// Run all plugins as child processes and assemble the report.
pub async fn collect(
    plugins: &[PluginConfig],
    categories: &[CategoryConfig],
    options: &CollectOptions,
) -> Result<Report, CollectError> {
    collect_with(plugins, categories, options, execute_plugin).await
}

/// Assemble a report using `run_plugin` to produce each plugin's result.
pub async fn collect_with<'a, F, Fut>(
    plugins: &'a [PluginConfig],
    categories: &[CategoryConfig],
    options: &CollectOptions,
    run_plugin: F,
) -> Result<Report, CollectError>
where
    F: Fn(&'a PluginConfig) -> Fut,
    Fut: Future<Output = Result<PluginReport, PluginFailure>> + 'a,
{
    let started = Instant::now();
    let date = Utc::now();

    let selected = filter_categories(categories, &options.categories)?;
    let parallel = options.parallel.max(1);

    info!(
        plugins = plugins.len(),
        parallel,
        continue_on_error = options.continue_on_error,
        "Collecting plugin reports"
    );

    let mut slots: Vec<Option<PluginReport>> = vec![None; plugins.len()];
    let mut failures: Vec<(usize, FailedPlugin)> = Vec::new();

    // Options are encoded for every plugin before any runner starts.
    let mut runnable = Vec::with_capacity(plugins.len());
    for (i, plugin) in plugins.iter().enumerate() {
        match encode_cli_args(&plugin.runner.options) {
            Ok(_) => runnable.push((i, plugin)),
            Err(e) => {
                let failure = PluginFailure::new(&plugin.slug, e);
                if !options.continue_on_error {
                    error!(plugin = %failure.slug, "Invalid runner options, nothing was started");
                    return Err(failure.into());
                }
                warn!(plugin = %failure.slug, error = %failure.reason, "Skipping plugin");
                failures.push((i, failed_plugin(plugin, failure)));
            }
        }
    }

    let progress = progress_bar(runnable.len(), options.show_progress);

    let mut runs = stream::iter(runnable)
        .map(|(i, plugin)| {
            let run = run_plugin(plugin);
            async move { (i, run.await) }
        })
        .buffer_unordered(parallel);

    while let Some((i, result)) = runs.next().await {
        if let Some(ref pb) = progress {
            pb.inc(1);
        }

        match result {
            Ok(report) => {
                info!(
                    plugin = %report.slug,
                    audits = report.audits.len(),
                    duration_ms = report.duration,
                    "Plugin finished"
                );
                slots[i] = Some(report);
            }
            Err(failure) if options.continue_on_error => {
                warn!(plugin = %failure.slug, error = %failure.reason, "Plugin failed, continuing");
                failures.push((i, failed_plugin(&plugins[i], failure)));
            }
            Err(failure) => {
                error!(plugin = %failure.slug, "Plugin failed, cancelling remaining plugins");
                if let Some(pb) = progress {
                    pb.abandon();
                }
                return Err(failure.into());
            }
        }
    }
    drop(runs);

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    failures.sort_by_key(|(i, _)| *i);
    let failed: Vec<FailedPlugin> = failures.into_iter().map(|(_, f)| f).collect();
    let plugin_reports: Vec<PluginReport> = slots.into_iter().flatten().collect();

    let categories = score_categories(&selected, &plugin_reports, &failed)?;

    let report = Report {
        package_name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        date,
        duration: started.elapsed().as_millis() as u64,
        categories,
        plugins: plugin_reports,
        failed_plugins: failed,
    };

    validate_report(&report)?;

    Ok(report)
}

fn failed_plugin(plugin: &PluginConfig, failure: PluginFailure) -> FailedPlugin {
    FailedPlugin {
        slug: failure.slug,
        title: plugin.title.clone(),
        error: failure.reason.to_string(),
    }
}

fn progress_bar(len: usize, enabled: bool) -> Option<ProgressBar> {
    if !enabled {
        return None;
    }

    let pb = ProgressBar::new(len as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} plugins")
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb.enable_steady_tick(Duration::from_millis(120));
    Some(pb)
}

/// Run one plugin: encode its arguments, execute the runner, read and
/// validate its output.
pub async fn execute_plugin(plugin: &PluginConfig) -> Result<PluginReport, PluginFailure> {
    let fail = |reason: PluginFailureReason| PluginFailure::new(&plugin.slug, reason);
    let runner = &plugin.runner;

    let mut args = runner.args.clone();
    args.extend(encode_cli_args(&runner.options).map_err(|e| fail(e.into()))?);

    let config = ProcessConfig::new(&runner.command, args)
        .with_cwd(runner.cwd.clone())
        .with_timeout(runner.timeout_ms.map(Duration::from_millis));

    info!(plugin = %plugin.slug, command = %config, "Running plugin");

    let date = Utc::now();
    let (tx, rx) = mpsc::unbounded_channel();
    let logger = tokio::spawn(log_events(plugin.slug.clone(), rx));

    let result = execute_process(&config, Some(&tx)).await;
    drop(tx);
    let _ = logger.await;

    let output = result.map_err(|e| fail(e.into()))?;
    let raw = read_runner_output(runner, &output.stdout)
        .await
        .map_err(fail)?;
    let runner_output = validate_runner_output(&raw).map_err(|e| fail(e.into()))?;
    check_declared_audits(&runner_output, plugin).map_err(|e| fail(e.into()))?;

    Ok(build_plugin_report(
        plugin,
        runner_output,
        date,
        output.duration,
    ))
}

async fn log_events(slug: String, mut rx: mpsc::UnboundedReceiver<ProcessEvent>) {
    while let Some(event) = rx.recv().await {
        let terminal = event.is_terminal();
        match event {
            ProcessEvent::Data(chunk) => {
                debug!(plugin = %slug, stream = %chunk.stream, "{}", chunk.data.trim_end())
            }
            ProcessEvent::Complete(output) => debug!(
                plugin = %slug,
                duration_ms = output.duration.as_millis() as u64,
                "Runner completed"
            ),
            ProcessEvent::Error(err) => debug!(plugin = %slug, error = %err, "Runner failed"),
        }
        if terminal {
            break;
        }
    }
}

fn output_path(runner: &RunnerConfig) -> Option<PathBuf> {
    let file = runner.output_file.as_ref()?;
    match runner.cwd {
        Some(ref cwd) if file.is_relative() => Some(cwd.join(file)),
        _ => Some(file.clone()),
    }
}

/// Parse the runner output from its output file, or from stdout when none is configured.
async fn read_runner_output(
    runner: &RunnerConfig,
    stdout: &str,
) -> Result<serde_json::Value, PluginFailureReason> {
    let (source_name, content) = match output_path(runner) {
        Some(path) => {
            let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
                PluginFailureReason::Output {
                    source_name: path.display().to_string(),
                    message: e.to_string(),
                }
            })?;
            (path.display().to_string(), content)
        }
        None => ("stdout".to_string(), stdout.to_string()),
    };

    serde_json::from_str(&content).map_err(|e| PluginFailureReason::Output {
        source_name,
        message: format!("invalid JSON: {}", e),
    })
}

fn build_plugin_report(
    plugin: &PluginConfig,
    output: RunnerOutput,
    date: DateTime<Utc>,
    duration: Duration,
) -> PluginReport {
    PluginReport {
        slug: plugin.slug.clone(),
        title: plugin.title.clone(),
        date,
        duration: duration.as_millis() as u64,
        version: output.version,
        // Undeclared audits were rejected by check_declared_audits.
        audits: output
            .audits
            .into_iter()
            .filter_map(|audit| {
                let metadata = plugin.audit(&audit.slug)?;
                Some(AuditReport::new(metadata, audit))
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AssemblyFailure, ProcessFailureKind};
    use crate::models::{AuditMetadata, AuditOutput, CategoryRef};
    use crate::process::CliOptions;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    fn plugin(slug: &str, audits: &[&str]) -> PluginConfig {
        PluginConfig {
            slug: slug.to_string(),
            title: format!("{} plugin", slug),
            description: None,
            runner: RunnerConfig {
                command: "true".to_string(),
                ..RunnerConfig::default()
            },
            audits: audits
                .iter()
                .map(|a| AuditMetadata {
                    slug: a.to_string(),
                    title: a.to_string(),
                    description: None,
                })
                .collect(),
        }
    }

    fn category(slug: &str, refs: &[(&str, &str)]) -> CategoryConfig {
        CategoryConfig {
            slug: slug.to_string(),
            title: slug.to_string(),
            refs: refs
                .iter()
                .map(|(plugin, audit)| CategoryRef {
                    plugin: plugin.to_string(),
                    slug: audit.to_string(),
                    weight: 1.0,
                })
                .collect(),
        }
    }

    fn fake_report(plugin: &PluginConfig, score: f64) -> PluginReport {
        let output = RunnerOutput {
            audits: plugin
                .audits
                .iter()
                .map(|a| AuditOutput {
                    slug: a.slug.clone(),
                    score,
                    value: None,
                    display_value: None,
                    details: None,
                })
                .collect(),
            version: Some("1.0.0".to_string()),
            duration: None,
        };
        build_plugin_report(plugin, output, Utc::now(), Duration::from_millis(5))
    }

    fn boom(plugin: &PluginConfig) -> PluginFailure {
        PluginFailure::new(
            &plugin.slug,
            PluginFailureReason::Output {
                source_name: "stdout".to_string(),
                message: "boom".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn test_report_order_follows_config_not_completion() {
        let plugins = vec![plugin("p1", &["a"]), plugin("p2", &["b"]), plugin("p3", &["c"])];
        let finished = Arc::new(Mutex::new(Vec::new()));
        let options = CollectOptions {
            parallel: 3,
            ..CollectOptions::default()
        };

        let report = collect_with(&plugins, &[], &options, |p| {
            let finished = Arc::clone(&finished);
            async move {
                let delay = match p.slug.as_str() {
                    "p1" => 300,
                    "p2" => 150,
                    _ => 0,
                };
                tokio::time::sleep(Duration::from_millis(delay)).await;
                finished.lock().unwrap().push(p.slug.clone());
                Ok(fake_report(p, 1.0))
            }
        })
        .await
        .unwrap();

        assert_eq!(*finished.lock().unwrap(), vec!["p3", "p2", "p1"]);
        let order: Vec<_> = report.plugins.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(order, vec!["p1", "p2", "p3"]);
    }

    #[tokio::test]
    async fn test_failure_aborts_without_continue_on_error() {
        let plugins = vec![plugin("ok", &["a"]), plugin("broken", &["b"])];
        let err = collect_with(&plugins, &[], &CollectOptions::default(), |p| {
            let result = if p.slug == "broken" {
                Err(boom(p))
            } else {
                Ok(fake_report(p, 1.0))
            };
            async move { result }
        })
        .await
        .unwrap_err();

        match err {
            CollectError::Plugin(failure) => assert_eq!(failure.slug, "broken"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_hard_failure_cancels_siblings() {
        let plugins = vec![plugin("fails", &["a"]), plugin("slow", &["b"])];
        let slow_finished = Arc::new(AtomicBool::new(false));
        let options = CollectOptions {
            parallel: 2,
            ..CollectOptions::default()
        };

        let started = Instant::now();
        let result = collect_with(&plugins, &[], &options, |p| {
            let slow_finished = Arc::clone(&slow_finished);
            async move {
                if p.slug == "fails" {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    return Err(boom(p));
                }
                tokio::time::sleep(Duration::from_secs(5)).await;
                slow_finished.store(true, Ordering::SeqCst);
                Ok(fake_report(p, 1.0))
            }
        })
        .await;

        assert!(result.is_err());
        assert!(started.elapsed() < Duration::from_secs(3));
        assert!(!slow_finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_continue_on_error_marks_category_not_computable() {
        let plugins = vec![plugin("lint", &["no-var"]), plugin("size", &["bundle"])];
        let categories = vec![
            category("style", &[("lint", "no-var")]),
            category("perf", &[("size", "bundle")]),
        ];
        let options = CollectOptions {
            continue_on_error: true,
            ..CollectOptions::default()
        };

        let report = collect_with(&plugins, &categories, &options, |p| {
            let result = if p.slug == "size" {
                Err(boom(p))
            } else {
                Ok(fake_report(p, 0.8))
            };
            async move { result }
        })
        .await
        .unwrap();

        assert_eq!(report.plugins.len(), 1);
        assert_eq!(report.failed_plugins.len(), 1);
        assert_eq!(report.failed_plugins[0].slug, "size");
        assert_eq!(report.failed_plugins[0].title, "size plugin");
        assert_eq!(report.categories[0].score, Some(0.8));
        assert_eq!(report.categories[1].score, None);
    }

    #[tokio::test]
    async fn test_unresolved_category_reference_fails_assembly() {
        let plugins = vec![plugin("lint", &["no-var"])];
        let categories = vec![category("style", &[("lint", "no-console")])];

        let err = collect_with(&plugins, &categories, &CollectOptions::default(), |p| {
            let report = fake_report(p, 1.0);
            async move { Ok(report) }
        })
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            CollectError::Assembly(AssemblyFailure::UnresolvedReference { .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_category_filter_fails_before_running() {
        let plugins = vec![plugin("lint", &["no-var"])];
        let categories = vec![category("style", &[("lint", "no-var")])];
        let ran = Arc::new(AtomicBool::new(false));
        let options = CollectOptions {
            categories: vec!["perf".to_string()],
            ..CollectOptions::default()
        };

        let err = collect_with(&plugins, &categories, &options, |p| {
            ran.store(true, Ordering::SeqCst);
            let report = fake_report(p, 1.0);
            async move { Ok(report) }
        })
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            CollectError::Assembly(AssemblyFailure::UnknownCategory(_))
        ));
        assert!(!ran.load(Ordering::SeqCst));
    }

    fn with_bad_option(mut plugin: PluginConfig) -> PluginConfig {
        plugin.runner.options = CliOptions::new().with("limit", f64::NAN);
        plugin
    }

    #[tokio::test]
    async fn test_invalid_options_fail_before_any_plugin_runs() {
        let plugins = vec![plugin("first", &["a"]), with_bad_option(plugin("second", &["b"]))];
        let ran = Arc::new(Mutex::new(Vec::new()));

        let err = collect_with(&plugins, &[], &CollectOptions::default(), |p| {
            ran.lock().unwrap().push(p.slug.clone());
            let report = fake_report(p, 1.0);
            async move { Ok(report) }
        })
        .await
        .unwrap_err();

        match err {
            CollectError::Plugin(failure) => {
                assert_eq!(failure.slug, "second");
                assert!(matches!(failure.reason, PluginFailureReason::Arguments(_)));
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(ran.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_options_skip_plugin_with_continue_on_error() {
        let plugins = vec![with_bad_option(plugin("first", &["a"])), plugin("second", &["b"])];
        let ran = Arc::new(Mutex::new(Vec::new()));
        let options = CollectOptions {
            continue_on_error: true,
            ..CollectOptions::default()
        };

        let report = collect_with(&plugins, &[], &options, |p| {
            ran.lock().unwrap().push(p.slug.clone());
            let report = fake_report(p, 1.0);
            async move { Ok(report) }
        })
        .await
        .unwrap();

        assert_eq!(*ran.lock().unwrap(), vec!["second"]);
        assert_eq!(report.plugins.len(), 1);
        assert_eq!(report.failed_plugins[0].slug, "first");
        assert!(report.failed_plugins[0].error.contains("limit"));
    }

    #[tokio::test]
    async fn test_assembly_is_deterministic() {
        let plugins = vec![plugin("lint", &["no-var", "eqeqeq"]), plugin("size", &["bundle"])];
        let categories = vec![category("all", &[("lint", "eqeqeq"), ("size", "bundle")])];
        let options = CollectOptions {
            parallel: 2,
            ..CollectOptions::default()
        };
        let run = |p: &PluginConfig| {
            let report = fake_report(p, 0.5);
            async move { Ok(report) }
        };

        let first = collect_with(&plugins, &categories, &options, run).await.unwrap();
        let second = collect_with(&plugins, &categories, &options, run).await.unwrap();

        assert_eq!(
            serde_json::to_string(&first.without_variable_data()).unwrap(),
            serde_json::to_string(&second.without_variable_data()).unwrap()
        );
        assert!(validate_report(&first).is_ok());
    }

    #[cfg(unix)]
    fn sh_plugin(slug: &str, script: &str, audits: &[&str]) -> PluginConfig {
        let mut config = plugin(slug, audits);
        config.runner = RunnerConfig {
            command: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            ..RunnerConfig::default()
        };
        config
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_plugin_reads_stdout() {
        let plugin = sh_plugin(
            "lint",
            r#"echo '{"version":"2.0.0","audits":[{"slug":"no-var","score":0.5,"displayValue":"1 warning"}]}'"#,
            &["no-var"],
        );

        let report = execute_plugin(&plugin).await.unwrap();
        assert_eq!(report.slug, "lint");
        assert_eq!(report.title, "lint plugin");
        assert_eq!(report.version.as_deref(), Some("2.0.0"));
        assert_eq!(report.audits[0].title, "no-var");
        assert_eq!(report.audits[0].display_value.as_deref(), Some("1 warning"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_plugin_reads_output_file_relative_to_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let mut plugin = sh_plugin(
            "lint",
            r#"mkdir -p out && echo '{"audits":[{"slug":"no-var","score":1}]}' > out/result.json"#,
            &["no-var"],
        );
        plugin.runner.cwd = Some(dir.path().to_path_buf());
        plugin.runner.output_file = Some(PathBuf::from("out/result.json"));

        let report = execute_plugin(&plugin).await.unwrap();
        assert_eq!(report.audits.len(), 1);
        assert_eq!(report.audits[0].score, 1.0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_plugin_passes_encoded_options() {
        let mut plugin = sh_plugin(
            "echo",
            r#"printf '{"audits":[{"slug":"args","score":1,"displayValue":"%s %s"}]}' "$0" "$1""#,
            &["args"],
        );
        plugin.runner.options = CliOptions::new().with("_", "first").with("strict", true);

        let report = execute_plugin(&plugin).await.unwrap();
        assert_eq!(
            report.audits[0].display_value.as_deref(),
            Some("first --strict")
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_plugin_failures_carry_slug() {
        let exit = sh_plugin("exit", "echo nope >&2; exit 2", &["a"]);
        let failure = execute_plugin(&exit).await.unwrap_err();
        assert_eq!(failure.slug, "exit");
        match failure.reason {
            PluginFailureReason::Process(ref e) => {
                assert_eq!(e.kind, ProcessFailureKind::Exit(2));
                assert!(e.stderr.contains("nope"));
            }
            ref other => panic!("unexpected reason: {}", other),
        }

        let garbage = sh_plugin("garbage", "echo not-json", &["a"]);
        let failure = execute_plugin(&garbage).await.unwrap_err();
        assert!(matches!(failure.reason, PluginFailureReason::Output { .. }));

        let invalid = sh_plugin("invalid", r#"echo '{"audits":[{"slug":"a"}]}'"#, &["a"]);
        let failure = execute_plugin(&invalid).await.unwrap_err();
        match failure.reason {
            PluginFailureReason::Schema(ref e) => assert!(e.has_path("audits[0].score")),
            ref other => panic!("unexpected reason: {}", other),
        }

        let undeclared = sh_plugin("undeclared", r#"echo '{"audits":[{"slug":"b","score":1}]}'"#, &["a"]);
        let failure = execute_plugin(&undeclared).await.unwrap_err();
        assert!(matches!(failure.reason, PluginFailureReason::Schema(_)));

        let mut bad_args = sh_plugin("args", "true", &["a"]);
        bad_args.runner.options = CliOptions::new().with("limit", f64::NAN);
        let failure = execute_plugin(&bad_args).await.unwrap_err();
        assert!(matches!(failure.reason, PluginFailureReason::Arguments(_)));

        let mut slow = sh_plugin("slow", "sleep 5", &["a"]);
        slow.runner.timeout_ms = Some(200);
        let failure = execute_plugin(&slow).await.unwrap_err();
        match failure.reason {
            PluginFailureReason::Process(ref e) => assert!(e.is_timeout()),
            ref other => panic!("unexpected reason: {}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_invalid_options_spawn_no_process() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("first-ran");
        let plugins = vec![
            sh_plugin(
                "first",
                &format!(r#"touch "{}"; echo '{{"audits":[{{"slug":"a","score":1}}]}}'"#, marker.display()),
                &["a"],
            ),
            with_bad_option(sh_plugin("second", "true", &["a"])),
        ];

        let err = collect(&plugins, &[], &CollectOptions::default()).await.unwrap_err();

        assert!(err.to_string().contains("second"));
        assert!(!marker.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_collect_runs_real_processes_in_parallel() {
        let output = r#"{"audits":[{"slug":"a","score":1}]}"#;
        let plugins = vec![
            sh_plugin("first", &format!("sleep 0.4; echo '{}'", output), &["a"]),
            sh_plugin("second", &format!("echo '{}'", output), &["a"]),
        ];
        let categories = vec![category("both", &[("first", "a"), ("second", "a")])];
        let options = CollectOptions {
            parallel: 2,
            ..CollectOptions::default()
        };

        let report = collect(&plugins, &categories, &options).await.unwrap();

        assert_eq!(report.plugins[0].slug, "first");
        assert_eq!(report.plugins[1].slug, "second");
        assert_eq!(report.categories[0].score, Some(1.0));
        let longest = report.plugins.iter().map(|p| p.duration).max().unwrap();
        assert!(report.duration >= longest);
    }
}
