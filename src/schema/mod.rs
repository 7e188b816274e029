//! Structural schemas for plugin output, configuration, and reports.
//!
//! Each `validate_*` function walks a JSON value, records every violation
//! it finds (never just the first), and only deserializes into the typed
//! model once the document is known to conform.

use crate::config::Config;
use crate::error::{SchemaValidationError, Violation};
use crate::models::{CategoryConfig, PluginConfig, Report, RunnerOutput, Severity};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashSet;

const ROOT: &str = "(root)";

/// Validate a runner's output document.
pub fn validate_runner_output(value: &Value) -> Result<RunnerOutput, SchemaValidationError> {
    let mut c = Checker::new("RunnerOutput");
    check_runner_output(&mut c, "", value);
    c.finish(value)
}

/// Check that every audit in `output` is declared by `plugin`.
pub fn check_declared_audits(
    output: &RunnerOutput,
    plugin: &PluginConfig,
) -> Result<(), SchemaValidationError> {
    let violations: Vec<Violation> = output
        .audits
        .iter()
        .enumerate()
        .filter(|(_, audit)| plugin.audit(&audit.slug).is_none())
        .map(|(i, audit)| Violation {
            path: format!("audits[{}].slug", i),
            expected: format!(
                "an audit declared by plugin `{}` ({})",
                plugin.slug,
                plugin
                    .audits
                    .iter()
                    .map(|a| a.slug.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            actual: describe(&Value::String(audit.slug.clone())),
        })
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(SchemaValidationError {
            schema: "RunnerOutput",
            violations,
        })
    }
}

/// Validate a single plugin configuration entry.
#[allow(dead_code)] // Whole documents go through validate_core_config
pub fn validate_plugin_config(value: &Value) -> Result<PluginConfig, SchemaValidationError> {
    let mut c = Checker::new("PluginConfig");
    check_plugin_config(&mut c, "", value);
    c.finish(value)
}

/// Validate a single category configuration entry.
#[allow(dead_code)] // Whole documents go through validate_core_config
pub fn validate_category_config(value: &Value) -> Result<CategoryConfig, SchemaValidationError> {
    let mut c = Checker::new("CategoryConfig");
    check_category_config(&mut c, "", value);
    c.finish(value)
}

/// Validate the whole configuration file.
pub fn validate_core_config(value: &Value) -> Result<Config, SchemaValidationError> {
    let mut c = Checker::new("CoreConfig");
    if let Some(root) = c.object("", value) {
        if let Some(persist) = optional(root, "persist") {
            if let Some(persist) = c.object("persist", persist) {
                if let Some(dir) = optional(persist, "output_dir") {
                    c.non_empty_string("persist.output_dir", dir);
                }
                if let Some(name) = optional(persist, "filename") {
                    c.non_empty_string("persist.filename", name);
                }
            }
        }

        if let Some(run) = optional(root, "run") {
            if let Some(run) = c.object("run", run) {
                if let Some(parallel) = optional(run, "parallel") {
                    c.integer_at_least("run.parallel", parallel, 1);
                }
                if let Some(flag) = optional(run, "continue_on_error") {
                    c.boolean("run.continue_on_error", flag);
                }
                if let Some(filter) = optional(run, "categories") {
                    if let Some(items) = c.array("run.categories", filter) {
                        for (i, slug) in items.iter().enumerate() {
                            c.slug(&index("run.categories", i), slug);
                        }
                    }
                }
            }
        }

        if let Some(plugins) = c.required("", root, "plugins") {
            if let Some(items) = c.non_empty_array("plugins", plugins) {
                for (i, plugin) in items.iter().enumerate() {
                    check_plugin_config(&mut c, &index("plugins", i), plugin);
                }
                c.unique("plugins", items, "slug");
            }
        }

        if let Some(categories) = optional(root, "categories") {
            if let Some(items) = c.array("categories", categories) {
                for (i, category) in items.iter().enumerate() {
                    check_category_config(&mut c, &index("categories", i), category);
                }
                c.unique("categories", items, "slug");
            }
        }
    }
    c.finish(value)
}

/// Validate an assembled report.
pub fn validate_report(report: &Report) -> Result<(), SchemaValidationError> {
    let value = serde_json::to_value(report).map_err(|e| SchemaValidationError {
        schema: "Report",
        violations: vec![Violation {
            path: ROOT.to_string(),
            expected: "serializable report".to_string(),
            actual: e.to_string(),
        }],
    })?;
    validate_report_value(&value).map(|_| ())
}

/// Validate a report document, e.g. one read back from disk.
pub fn validate_report_value(value: &Value) -> Result<Report, SchemaValidationError> {
    let mut c = Checker::new("Report");
    if let Some(root) = c.object("", value) {
        if let Some(v) = c.required("", root, "packageName") {
            c.non_empty_string("packageName", v);
        }
        if let Some(v) = c.required("", root, "version") {
            c.non_empty_string("version", v);
        }
        if let Some(v) = c.required("", root, "date") {
            c.date("date", v);
        }
        if let Some(v) = c.required("", root, "duration") {
            c.integer_at_least("duration", v, 0);
        }

        if let Some(categories) = c.required("", root, "categories") {
            if let Some(items) = c.array("categories", categories) {
                for (i, category) in items.iter().enumerate() {
                    check_category_score(&mut c, &index("categories", i), category);
                }
                c.unique("categories", items, "slug");
            }
        }

        if let Some(plugins) = c.required("", root, "plugins") {
            if let Some(items) = c.array("plugins", plugins) {
                for (i, plugin) in items.iter().enumerate() {
                    check_plugin_report(&mut c, &index("plugins", i), plugin);
                }
                c.unique("plugins", items, "slug");
            }
        }

        if let Some(failed) = optional(root, "failedPlugins") {
            if let Some(items) = c.array("failedPlugins", failed) {
                for (i, item) in items.iter().enumerate() {
                    let path = index("failedPlugins", i);
                    if let Some(obj) = c.object(&path, item) {
                        c.required_slug(&path, obj, "slug");
                        c.required_string(&path, obj, "title");
                        c.required_string(&path, obj, "error");
                    }
                }
            }
        }
    }
    c.finish(value)
}

fn check_runner_output(c: &mut Checker, path: &str, value: &Value) {
    let Some(root) = c.object(path, value) else {
        return;
    };

    if let Some(audits) = c.required(path, root, "audits") {
        let audits_path = field(path, "audits");
        if let Some(items) = c.array(&audits_path, audits) {
            for (i, audit) in items.iter().enumerate() {
                check_audit(c, &index(&audits_path, i), audit, false);
            }
            c.unique(&audits_path, items, "slug");
        }
    }
    if let Some(version) = optional(root, "version") {
        c.non_empty_string(&field(path, "version"), version);
    }
    if let Some(duration) = optional(root, "duration") {
        c.number_in(&field(path, "duration"), duration, 0.0, f64::INFINITY);
    }
}

/// Audits in a report also carry the declared title.
fn check_audit(c: &mut Checker, path: &str, value: &Value, with_title: bool) {
    let Some(audit) = c.object(path, value) else {
        return;
    };

    c.required_slug(path, audit, "slug");
    if with_title {
        c.required_string(path, audit, "title");
    }
    if let Some(score) = c.required(path, audit, "score") {
        c.number_in(&field(path, "score"), score, 0.0, 1.0);
    }
    if let Some(v) = optional(audit, "value") {
        c.number_in(&field(path, "value"), v, 0.0, f64::INFINITY);
    }
    if let Some(v) = optional(audit, "displayValue") {
        c.string(&field(path, "displayValue"), v);
    }
    if let Some(details) = optional(audit, "details") {
        let details_path = field(path, "details");
        if let Some(details) = c.object(&details_path, details) {
            if let Some(issues) = optional(details, "issues") {
                let issues_path = field(&details_path, "issues");
                if let Some(items) = c.array(&issues_path, issues) {
                    for (i, issue) in items.iter().enumerate() {
                        check_issue(c, &index(&issues_path, i), issue);
                    }
                }
            }
        }
    }
}

fn check_issue(c: &mut Checker, path: &str, value: &Value) {
    let Some(issue) = c.object(path, value) else {
        return;
    };

    c.required_string(path, issue, "message");
    if let Some(severity) = c.required(path, issue, "severity") {
        c.one_of(&field(path, "severity"), severity, &Severity::NAMES);
    }

    let Some(source) = optional(issue, "source") else {
        return;
    };
    let source_path = field(path, "source");
    let Some(source) = c.object(&source_path, source) else {
        return;
    };
    c.required_string(&source_path, source, "file");

    let Some(position) = optional(source, "position") else {
        return;
    };
    let position_path = field(&source_path, "position");
    let Some(position) = c.object(&position_path, position) else {
        return;
    };
    if let Some(line) = c.required(&position_path, position, "startLine") {
        c.integer_at_least(&field(&position_path, "startLine"), line, 1);
    }
    for key in ["startColumn", "endLine", "endColumn"] {
        if let Some(v) = optional(position, key) {
            c.integer_at_least(&field(&position_path, key), v, 1);
        }
    }
}

fn check_plugin_config(c: &mut Checker, path: &str, value: &Value) {
    let Some(plugin) = c.object(path, value) else {
        return;
    };

    c.required_slug(path, plugin, "slug");
    c.required_string(path, plugin, "title");
    if let Some(v) = optional(plugin, "description") {
        c.string(&field(path, "description"), v);
    }

    if let Some(runner) = c.required(path, plugin, "runner") {
        let runner_path = field(path, "runner");
        if let Some(runner) = c.object(&runner_path, runner) {
            c.required_string(&runner_path, runner, "command");
            if let Some(args) = optional(runner, "args") {
                let args_path = field(&runner_path, "args");
                if let Some(items) = c.array(&args_path, args) {
                    for (i, arg) in items.iter().enumerate() {
                        c.string(&index(&args_path, i), arg);
                    }
                }
            }
            if let Some(options) = optional(runner, "options") {
                c.object(&field(&runner_path, "options"), options);
            }
            if let Some(v) = optional(runner, "output_file") {
                c.non_empty_string(&field(&runner_path, "output_file"), v);
            }
            if let Some(v) = optional(runner, "timeout_ms") {
                c.integer_at_least(&field(&runner_path, "timeout_ms"), v, 1);
            }
            if let Some(v) = optional(runner, "cwd") {
                c.non_empty_string(&field(&runner_path, "cwd"), v);
            }
        }
    }

    if let Some(audits) = c.required(path, plugin, "audits") {
        let audits_path = field(path, "audits");
        if let Some(items) = c.non_empty_array(&audits_path, audits) {
            for (i, audit) in items.iter().enumerate() {
                let audit_path = index(&audits_path, i);
                if let Some(audit) = c.object(&audit_path, audit) {
                    c.required_slug(&audit_path, audit, "slug");
                    c.required_string(&audit_path, audit, "title");
                    if let Some(v) = optional(audit, "description") {
                        c.string(&field(&audit_path, "description"), v);
                    }
                }
            }
            c.unique(&audits_path, items, "slug");
        }
    }
}

fn check_category_config(c: &mut Checker, path: &str, value: &Value) {
    let Some(category) = c.object(path, value) else {
        return;
    };

    c.required_slug(path, category, "slug");
    c.required_string(path, category, "title");
    if let Some(refs) = c.required(path, category, "refs") {
        let refs_path = field(path, "refs");
        if let Some(items) = c.non_empty_array(&refs_path, refs) {
            for (i, item) in items.iter().enumerate() {
                check_category_ref(c, &index(&refs_path, i), item);
            }
        }
    }
}

fn check_category_ref(c: &mut Checker, path: &str, value: &Value) {
    let Some(item) = c.object(path, value) else {
        return;
    };
    c.required_slug(path, item, "plugin");
    c.required_slug(path, item, "slug");
    if let Some(weight) = c.required(path, item, "weight") {
        c.number_in(&field(path, "weight"), weight, 0.0, f64::INFINITY);
    }
}

fn check_category_score(c: &mut Checker, path: &str, value: &Value) {
    let Some(category) = c.object(path, value) else {
        return;
    };

    c.required_slug(path, category, "slug");
    c.required_string(path, category, "title");
    match category.get("score") {
        None => c.violation(&field(path, "score"), "number in [0, 1] or null", "missing"),
        Some(Value::Null) => {}
        Some(score) => c.number_in(&field(path, "score"), score, 0.0, 1.0),
    }
    if let Some(refs) = c.required(path, category, "refs") {
        let refs_path = field(path, "refs");
        if let Some(items) = c.array(&refs_path, refs) {
            for (i, item) in items.iter().enumerate() {
                check_category_ref(c, &index(&refs_path, i), item);
            }
        }
    }
}

fn check_plugin_report(c: &mut Checker, path: &str, value: &Value) {
    let Some(plugin) = c.object(path, value) else {
        return;
    };

    c.required_slug(path, plugin, "slug");
    c.required_string(path, plugin, "title");
    if let Some(v) = c.required(path, plugin, "date") {
        c.date(&field(path, "date"), v);
    }
    if let Some(v) = c.required(path, plugin, "duration") {
        c.integer_at_least(&field(path, "duration"), v, 0);
    }
    if let Some(v) = optional(plugin, "version") {
        c.non_empty_string(&field(path, "version"), v);
    }
    if let Some(audits) = c.required(path, plugin, "audits") {
        let audits_path = field(path, "audits");
        if let Some(items) = c.array(&audits_path, audits) {
            for (i, audit) in items.iter().enumerate() {
                check_audit(c, &index(&audits_path, i), audit, true);
            }
            c.unique(&audits_path, items, "slug");
        }
    }
}

/// Returns true for lowercase kebab-case slugs such as `no-unused-vars`.
pub fn is_slug(s: &str) -> bool {
    !s.is_empty()
        && s.split('-').all(|part| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit())
        })
}

/// Optional fields treat `null` as absent.
fn optional<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

fn field(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn index(path: &str, i: usize) -> String {
    format!("{}[{}]", path, i)
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {}", b),
        Value::Number(n) => format!("number {}", n),
        Value::String(s) if s.chars().count() > 40 => {
            format!("string {:?}...", s.chars().take(40).collect::<String>())
        }
        Value::String(s) => format!("string {:?}", s),
        Value::Array(items) => format!("array of {} item(s)", items.len()),
        Value::Object(_) => "object".to_string(),
    }
}

/// Accumulates violations while walking a document.
struct Checker {
    schema: &'static str,
    violations: Vec<Violation>,
}

impl Checker {
    fn new(schema: &'static str) -> Self {
        Self {
            schema,
            violations: Vec::new(),
        }
    }

    fn violation(&mut self, path: &str, expected: impl Into<String>, actual: impl Into<String>) {
        self.violations.push(Violation {
            path: if path.is_empty() {
                ROOT.to_string()
            } else {
                path.to_string()
            },
            expected: expected.into(),
            actual: actual.into(),
        });
    }

    fn finish<T: DeserializeOwned>(mut self, value: &Value) -> Result<T, SchemaValidationError> {
        if self.violations.is_empty() {
            match serde_json::from_value(value.clone()) {
                Ok(typed) => return Ok(typed),
                Err(e) => self.violation("", format!("a valid {}", self.schema), e.to_string()),
            }
        }
        Err(SchemaValidationError {
            schema: self.schema,
            violations: self.violations,
        })
    }

    fn object<'a>(&mut self, path: &str, value: &'a Value) -> Option<&'a Map<String, Value>> {
        let obj = value.as_object();
        if obj.is_none() {
            self.violation(path, "object", describe(value));
        }
        obj
    }

    fn array<'a>(&mut self, path: &str, value: &'a Value) -> Option<&'a Vec<Value>> {
        let items = value.as_array();
        if items.is_none() {
            self.violation(path, "array", describe(value));
        }
        items
    }

    fn non_empty_array<'a>(&mut self, path: &str, value: &'a Value) -> Option<&'a Vec<Value>> {
        let items = self.array(path, value)?;
        if items.is_empty() {
            self.violation(path, "at least one item", "empty array");
        }
        Some(items)
    }

    fn required<'a>(
        &mut self,
        path: &str,
        obj: &'a Map<String, Value>,
        key: &str,
    ) -> Option<&'a Value> {
        let value = optional(obj, key);
        if value.is_none() {
            self.violation(&field(path, key), "required field", "missing");
        }
        value
    }

    fn required_string(&mut self, path: &str, obj: &Map<String, Value>, key: &str) {
        if let Some(value) = self.required(path, obj, key) {
            self.non_empty_string(&field(path, key), value);
        }
    }

    fn required_slug(&mut self, path: &str, obj: &Map<String, Value>, key: &str) {
        if let Some(value) = self.required(path, obj, key) {
            self.slug(&field(path, key), value);
        }
    }

    fn string<'a>(&mut self, path: &str, value: &'a Value) -> Option<&'a str> {
        let s = value.as_str();
        if s.is_none() {
            self.violation(path, "string", describe(value));
        }
        s
    }

    fn non_empty_string(&mut self, path: &str, value: &Value) {
        if let Some(s) = self.string(path, value) {
            if s.trim().is_empty() {
                self.violation(path, "non-empty string", describe(value));
            }
        }
    }

    fn slug(&mut self, path: &str, value: &Value) {
        if let Some(s) = self.string(path, value) {
            if !is_slug(s) {
                self.violation(path, "slug (lowercase kebab-case)", describe(value));
            }
        }
    }

    fn boolean(&mut self, path: &str, value: &Value) {
        if !value.is_boolean() {
            self.violation(path, "boolean", describe(value));
        }
    }

    fn number_in(&mut self, path: &str, value: &Value, min: f64, max: f64) {
        let expected = if max.is_finite() {
            format!("number in [{}, {}]", min, max)
        } else {
            format!("number >= {}", min)
        };
        match value.as_f64() {
            Some(n) if n >= min && n <= max => {}
            _ => self.violation(path, expected, describe(value)),
        }
    }

    fn integer_at_least(&mut self, path: &str, value: &Value, min: u64) {
        match value.as_u64() {
            Some(n) if n >= min => {}
            _ => self.violation(path, format!("integer >= {}", min), describe(value)),
        }
    }

    fn one_of(&mut self, path: &str, value: &Value, allowed: &[&str]) {
        if let Some(s) = self.string(path, value) {
            if !allowed.contains(&s) {
                self.violation(path, format!("one of {}", allowed.join(", ")), describe(value));
            }
        }
    }

    fn date(&mut self, path: &str, value: &Value) {
        if let Some(s) = self.string(path, value) {
            if chrono::DateTime::parse_from_rfc3339(s).is_err() {
                self.violation(path, "ISO-8601 date-time", describe(value));
            }
        }
    }

    /// Flags items whose `key` repeats an earlier item's.
    fn unique(&mut self, path: &str, items: &[Value], key: &str) {
        let mut seen = HashSet::new();
        for (i, item) in items.iter().enumerate() {
            if let Some(s) = item.get(key).and_then(Value::as_str) {
                if !seen.insert(s) {
                    self.violation(
                        &field(&index(path, i), key),
                        format!("unique {}", key),
                        format!("duplicate {}", describe(&item[key])),
                    );
                }
            }
        }
    }
}
