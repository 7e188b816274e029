//! Encoding of structured runner options into command-line tokens.
//!
//! Rules, applied per entry in insertion order:
//! - `_` becomes a bare positional token and must be a string
//! - strings become `--key="value"`
//! - numbers become `--key=value`
//! - `true` becomes `--key`, `false` becomes `--no-key`
//! - string arrays become one `--key="item"` per element
//!
//! Anything else is rejected with [`ArgumentEncodingError`].

use crate::error::ArgumentEncodingError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Key that is emitted as a positional token.
pub const POSITIONAL_KEY: &str = "_";

/// A single option value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Str(String),
    Number(Number),
    Bool(bool),
    List(Vec<String>),
    /// A value the encoder cannot express; carries the kind name.
    Unsupported(&'static str),
}

impl ArgValue {
    fn kind(&self) -> &'static str {
        match self {
            ArgValue::Str(_) => "string",
            ArgValue::Number(_) => "number",
            ArgValue::Bool(_) => "boolean",
            ArgValue::List(_) => "string array",
            ArgValue::Unsupported(kind) => kind,
        }
    }
}

impl From<Value> for ArgValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => ArgValue::Str(s),
            Value::Number(n) => ArgValue::Number(n),
            Value::Bool(b) => ArgValue::Bool(b),
            Value::Array(items) => {
                let mut strings = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::String(s) => strings.push(s),
                        _ => return ArgValue::Unsupported("array of non-strings"),
                    }
                }
                ArgValue::List(strings)
            }
            Value::Null => ArgValue::Unsupported("null"),
            Value::Object(_) => ArgValue::Unsupported("object"),
        }
    }
}

impl From<ArgValue> for Value {
    fn from(value: ArgValue) -> Self {
        match value {
            ArgValue::Str(s) => Value::String(s),
            ArgValue::Number(n) => Value::Number(n),
            ArgValue::Bool(b) => Value::Bool(b),
            ArgValue::List(items) => Value::Array(items.into_iter().map(Value::String).collect()),
            ArgValue::Unsupported(_) => Value::Null,
        }
    }
}

impl From<&str> for ArgValue {
    fn from(s: &str) -> Self {
        ArgValue::Str(s.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(s: String) -> Self {
        ArgValue::Str(s)
    }
}

impl From<bool> for ArgValue {
    fn from(b: bool) -> Self {
        ArgValue::Bool(b)
    }
}

impl From<i64> for ArgValue {
    fn from(n: i64) -> Self {
        ArgValue::Number(n.into())
    }
}

impl From<f64> for ArgValue {
    fn from(n: f64) -> Self {
        Number::from_f64(n)
            .map(ArgValue::Number)
            .unwrap_or(ArgValue::Unsupported("non-finite number"))
    }
}

impl From<Vec<String>> for ArgValue {
    fn from(items: Vec<String>) -> Self {
        ArgValue::List(items)
    }
}

impl From<Vec<&str>> for ArgValue {
    fn from(items: Vec<&str>) -> Self {
        ArgValue::List(items.into_iter().map(String::from).collect())
    }
}

/// Insertion-ordered option map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct CliOptions {
    entries: Vec<(String, ArgValue)>,
}

impl CliOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a value. A replaced key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ArgValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl From<Map<String, Value>> for CliOptions {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            entries: map.into_iter().map(|(k, v)| (k, ArgValue::from(v))).collect(),
        }
    }
}

impl From<CliOptions> for Map<String, Value> {
    fn from(options: CliOptions) -> Self {
        options
            .entries
            .into_iter()
            .map(|(k, v)| (k, Value::from(v)))
            .collect()
    }
}

/// Encode options into an ordered argument vector.
pub fn encode_cli_args(options: &CliOptions) -> Result<Vec<String>, ArgumentEncodingError> {
    let mut args = Vec::with_capacity(options.len());

    for (key, value) in options.iter() {
        if key == POSITIONAL_KEY {
            match value {
                ArgValue::Str(s) => args.push(s.clone()),
                other => {
                    return Err(ArgumentEncodingError {
                        key: key.to_string(),
                        kind: format!("{} (positional argument must be a string)", other.kind()),
                    })
                }
            }
            continue;
        }

        match value {
            ArgValue::Str(s) => args.push(format!("--{}=\"{}\"", key, s)),
            ArgValue::Number(n) => args.push(format!("--{}={}", key, n)),
            ArgValue::Bool(true) => args.push(format!("--{}", key)),
            ArgValue::Bool(false) => args.push(format!("--no-{}", key)),
            ArgValue::List(items) => {
                args.extend(items.iter().map(|item| format!("--{}=\"{}\"", key, item)))
            }
            ArgValue::Unsupported(kind) => {
                return Err(ArgumentEncodingError {
                    key: key.to_string(),
                    kind: kind.to_string(),
                })
            }
        }
    }

    Ok(args)
}
