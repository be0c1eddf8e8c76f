//! Compiler options and their command-line form.

use super::TscError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An ordered set of `tsc` compiler options, keyed by option name.
///
/// Values follow `tsconfig.json`: strings, numbers, booleans, `null` and
/// arrays. Order is preserved so the generated arguments are stable.
///
/// # Examples
///
/// ```
/// use shinobi::tsc::CompilerOptions;
///
/// let options = CompilerOptions::new()
///     .with("outDir", "dist")
///     .with("declaration", true)
///     .with("sourceMap", false);
/// assert_eq!(options.to_args().unwrap(), ["--outDir", "dist", "--declaration"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompilerOptions(Map<String, Value>);

impl CompilerOptions {
    /// Empty option set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`TscError::InvalidOptions`] when `text` is not a JSON object.
    pub fn from_json(text: &str) -> Result<Self, TscError> {
        serde_json::from_str(text).map_err(|source| TscError::InvalidOptions { source })
    }

    /// Set `name` and return the updated options.
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set `name`, replacing any previous value in place.
    pub fn insert(&mut self, name: &str, value: impl Into<Value>) {
        self.0.insert(name.to_owned(), value.into());
    }

    /// Overlay `overrides` on top of these options.
    pub fn merge(&mut self, overrides: &Self) {
        for (name, value) in &overrides.0 {
            self.0.insert(name.clone(), value.clone());
        }
    }

    /// Raw value of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Non-empty string value of `name`.
    #[must_use]
    pub fn path(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
    }

    /// `true` when `name` is set to `true`.
    #[must_use]
    pub fn flag(&self, name: &str) -> bool {
        self.get(name).and_then(Value::as_bool).unwrap_or(false)
    }

    /// `true` when no options are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Render the options as `tsc` arguments.
    ///
    /// Strings and numbers become `--name value`, `true` becomes `--name`,
    /// `false` and `null` are dropped, and arrays become `--name v1 v2`.
    ///
    /// # Errors
    ///
    /// Returns [`TscError::UnsupportedOption`] for object-valued options.
    pub fn to_args(&self) -> Result<Vec<String>, TscError> {
        let mut args = Vec::new();
        for (name, value) in &self.0 {
            let flag = format!("--{name}");
            match value {
                Value::Null | Value::Bool(false) => {}
                Value::Bool(true) => args.push(flag),
                Value::String(_) | Value::Number(_) => {
                    args.push(flag);
                    args.push(scalar(value));
                }
                Value::Array(items) => {
                    args.push(flag);
                    for item in items {
                        if item.is_object() || item.is_array() {
                            return Err(TscError::UnsupportedOption { name: name.clone() });
                        }
                        args.push(scalar(item));
                    }
                }
                Value::Object(_) => {
                    return Err(TscError::UnsupportedOption { name: name.clone() });
                }
            }
        }
        Ok(args)
    }
}

impl From<Map<String, Value>> for CompilerOptions {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
