//! Immutable read results

use crate::core::error::Result;
use crate::types::path::Path;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// An immutable copy of the data at a path, taken at read or event time.
///
/// Absent data is represented as `Value::Null`.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSnapshot {
    path: Path,
    value: Value,
}

impl DataSnapshot {
    /// Wrap a value read at `path`
    pub fn new(path: Path, value: Option<Value>) -> Self {
        Self {
            path,
            value: value.unwrap_or(Value::Null),
        }
    }

    /// The value, or `Value::Null` when nothing was stored
    pub fn val(&self) -> &Value {
        &self.value
    }

    /// Consume the snapshot and take its value
    pub fn into_val(self) -> Value {
        self.value
    }

    /// Deserialize the value into a typed record
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.value.clone())?)
    }

    /// Last path segment
    pub fn key(&self) -> Option<&str> {
        self.path.key()
    }

    /// Path the snapshot was taken at
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True unless the value is null
    pub fn exists(&self) -> bool {
        !self.value.is_null()
    }

    /// Snapshot of a descendant
    pub fn child(&self, relative: &str) -> DataSnapshot {
        let path = self.path.join(relative);
        let mut current = Some(&self.value);
        for segment in Path::parse_lenient(relative).segments() {
            current = current.and_then(|v| v.as_object()).and_then(|m| m.get(segment));
        }
        DataSnapshot::new(path, current.cloned())
    }

    /// True if the descendant exists
    pub fn has_child(&self, relative: &str) -> bool {
        self.child(relative).exists()
    }

    /// Number of immediate children
    pub fn num_children(&self) -> usize {
        self.value.as_object().map_or(0, |m| m.len())
    }

    /// Immediate children in insertion order
    pub fn children(&self) -> Vec<DataSnapshot> {
        match self.value.as_object() {
            Some(map) => map
                .iter()
                .map(|(key, value)| DataSnapshot::new(self.path.join(key), Some(value.clone())))
                .collect(),
            None => Vec::new(),
        }
    }
}
