//! Mock session and temp-data stores.

use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value as JsonValue;

/// A value stored in the mock session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionValue {
    Str(String),
    Json(JsonValue),
    Bytes(Vec<u8>),
}

impl SessionValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SessionValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&JsonValue> {
        match self {
            SessionValue::Json(v) => Some(v),
            _ => None,
        }
    }
}

/// In-memory session store with interior mutability, so filters and test
/// code can share one instance through an `Arc`.
#[derive(Debug, Default)]
pub struct MockSession {
    values: RwLock<HashMap<String, SessionValue>>,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: impl Into<String>, value: SessionValue) {
        self.values
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.into(), value);
    }

    pub fn set_string(&self, key: impl Into<String>, value: impl Into<String>) {
        self.set(key, SessionValue::Str(value.into()));
    }

    pub fn set_json<T: serde::Serialize>(&self, key: impl Into<String>, value: &T) -> crate::TestResult<()> {
        let json = serde_json::to_value(value)?;
        self.set(key, SessionValue::Json(json));
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<SessionValue> {
        self.values
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains_key(key)
    }

    pub fn remove(&self, key: &str) -> Option<SessionValue> {
        self.values
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(key)
    }

    pub fn clear(&self) {
        self.values
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    pub fn len(&self) -> usize {
        self.values
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Temp data: values survive until first read, then disappear.
#[derive(Debug, Default)]
pub struct TempData {
    values: RwLock<HashMap<String, SessionValue>>,
}

impl TempData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: impl Into<String>, value: SessionValue) {
        self.values
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.into(), value);
    }

    /// Read a value, removing it from the store.
    pub fn take(&self, key: &str) -> Option<SessionValue> {
        self.values
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(key)
    }

    /// Read a value without consuming it.
    pub fn peek(&self, key: &str) -> Option<SessionValue> {
        self.values
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
    }
}
