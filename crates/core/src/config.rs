//! Fixture configuration for the test harness.

use serde::{Deserialize, Serialize};

/// Environment a test fixture declares itself to run in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestEnvironment {
    Testing,
    Development,
}

impl Default for TestEnvironment {
    fn default() -> Self {
        TestEnvironment::Testing
    }
}

/// Configuration for a test fixture's service container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestConfig {
    /// Fixture name, used in diagnostics.
    pub name: String,
    pub environment: TestEnvironment,
    /// Log level applied when the fixture installs a subscriber.
    pub log_level: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            name: "trellis-fixture".to_string(),
            environment: TestEnvironment::Testing,
            log_level: "debug".to_string(),
        }
    }
}

impl TestConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn is_testing(&self) -> bool {
        self.environment == TestEnvironment::Testing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_testing() {
        let config = TestConfig::default();
        assert!(config.is_testing());
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn named_config_keeps_defaults() {
        let config = TestConfig::new("routing-suite");
        assert_eq!(config.name, "routing-suite");
        assert_eq!(config.environment, TestEnvironment::Testing);
    }
}
