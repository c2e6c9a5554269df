//! View data: the key/value bag an action hands to its view.

use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value as JsonValue;

#[derive(Debug, Default)]
pub struct ViewData {
    values: RwLock<HashMap<String, JsonValue>>,
}

impl ViewData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: impl Into<String>, value: JsonValue) {
        self.values
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<JsonValue> {
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

    pub fn keys(&self) -> Vec<String> {
        self.values
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .keys()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get() {
        let view = ViewData::new();
        view.set("title", serde_json::json!("Contact"));

        assert_eq!(view.get("title"), Some(serde_json::json!("Contact")));
        assert!(view.contains("title"));
        assert!(view.get("missing").is_none());
    }
}
