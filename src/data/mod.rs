//! Input data handle passed to the generated function.

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use serde_json::Value;

/// The caller's data plus the type name reported to the model.
///
/// The value itself is never inspected by the orchestration layer; it is
/// serialized once per attempt and handed to the entry point.
#[derive(Debug, Clone, PartialEq)]
pub struct InputData {
    value: Value,
    type_name: String,
}

impl InputData {
    pub fn new(value: Value) -> Self {
        let type_name = python_type_name(&value).to_string();
        Self { value, type_name }
    }

    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = type_name.into();
        self
    }

    /// Load a `.json` document, or a `.jsonl`/`.ndjson` file as a list of records.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            bail!("Data file '{}' does not exist", path.display());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading data file: {}", path.display()))?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_lowercase();

        let value = match extension.as_str() {
            "jsonl" | "ndjson" => {
                let records = serde_json::Deserializer::from_str(&text)
                    .into_iter::<Value>()
                    .collect::<Result<Vec<_>, _>>()
                    .with_context(|| format!("parsing JSON lines: {}", path.display()))?;
                Value::Array(records)
            }
            "json" | "" => serde_json::from_str(&text)
                .with_context(|| format!("parsing JSON: {}", path.display()))?,
            _ => bail!(
                "Unsupported data file type: .{}\nCurrently supported: .json, .jsonl, .ndjson",
                extension
            ),
        };
        Ok(Self::new(value))
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}

impl From<Value> for InputData {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

/// The name the Python interpreter reports for the decoded JSON value.
pub fn python_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "<class 'NoneType'>",
        Value::Bool(_) => "<class 'bool'>",
        Value::Number(n) if n.is_i64() || n.is_u64() => "<class 'int'>",
        Value::Number(_) => "<class 'float'>",
        Value::String(_) => "<class 'str'>",
        Value::Array(_) => "<class 'list'>",
        Value::Object(_) => "<class 'dict'>",
    }
}
