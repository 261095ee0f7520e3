//! Items saved from an earlier API response

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::RecordSource;
use crate::error::{Error, Result};

/// Reads a JSON array of Zotero items from disk
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl RecordSource for JsonFileSource {
    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }

    fn fetch(&self) -> Result<Vec<Value>> {
        let content = fs::read_to_string(&self.path)?;
        let records = match serde_json::from_str(&content)? {
            Value::Array(records) => records,
            other => {
                return Err(Error::InvalidRecords(format!(
                    "{} holds a JSON {} instead of an array of items",
                    self.path.display(),
                    json_kind(&other)
                )))
            }
        };
        info!(path = %self.path.display(), count = records.len(), "Loaded items");
        Ok(records)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
