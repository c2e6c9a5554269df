//! Fluent assertion builders.
//!
//! Each builder consumes failures as `TestError::Assertion` with a message
//! that names what was expected and what the pipeline actually did, so a
//! failing test reads like a sentence.

use serde_json::Value as JsonValue;

use trellis_http::BoundValue;

use crate::mocks::{MemoryCacheMock, MockSession};
use crate::outcome::{ResolveFailure, RouteOutcome};
use crate::{TestError, TestResult};

/// Assertions over one route-resolution outcome.
#[derive(Debug)]
pub struct RouteAssert {
    path: String,
    outcome: RouteOutcome,
}

impl RouteAssert {
    pub fn for_route(path: impl Into<String>, outcome: RouteOutcome) -> Self {
        Self {
            path: path.into(),
            outcome,
        }
    }

    pub fn outcome(&self) -> &RouteOutcome {
        &self.outcome
    }

    fn fail(&self, expected: &str, diagnostic: &str) -> TestError {
        TestError::assertion(format!(
            "Expected route '{}' to {} but {}.",
            self.path, expected, diagnostic
        ))
    }

    fn diagnostic(&self) -> String {
        match &self.outcome {
            RouteOutcome::Resolved {
                controller_name,
                action_name,
                ..
            } => format!("it matched {} action in {}", action_name, controller_name),
            RouteOutcome::Unresolved { reason, .. } => reason.to_string(),
        }
    }

    /// Assert the route resolved to the named controller action.
    pub fn to_action(self, controller: &str, action: &str) -> TestResult<Self> {
        let expected = format!("match {} action in {}", action, controller);
        match &self.outcome {
            RouteOutcome::Resolved {
                controller_name,
                action_name,
                ..
            } if controller_name == controller && action_name == action => Ok(self),
            _ => {
                let diagnostic = self.diagnostic();
                Err(self.fail(&expected, &diagnostic))
            }
        }
    }

    /// Assert the route resolved to an action on the named controller.
    pub fn to_controller(self, controller: &str) -> TestResult<Self> {
        let expected = format!("match an action in {}", controller);
        match &self.outcome {
            RouteOutcome::Resolved {
                controller_name, ..
            } if controller_name == controller => Ok(self),
            _ => {
                let diagnostic = self.diagnostic();
                Err(self.fail(&expected, &diagnostic))
            }
        }
    }

    pub fn should_resolve(self) -> TestResult<Self> {
        if self.outcome.resolved() {
            Ok(self)
        } else {
            let diagnostic = self.diagnostic();
            Err(self.fail("resolve", &diagnostic))
        }
    }

    pub fn should_not_resolve(self) -> TestResult<Self> {
        if self.outcome.resolved() {
            let diagnostic = self.diagnostic();
            Err(self.fail("stay unresolved", &diagnostic))
        } else {
            Ok(self)
        }
    }

    /// Assert the failure diagnostic contains a fragment.
    pub fn with_failure_containing(self, fragment: &str) -> TestResult<Self> {
        match self.outcome.failure_reason() {
            Some(reason) if reason.to_string().contains(fragment) => Ok(self),
            Some(reason) => {
                let diagnostic = format!("the failure was: {}", reason);
                Err(self.fail(&format!("fail with '{}'", fragment), &diagnostic))
            }
            None => {
                let diagnostic = self.diagnostic();
                Err(self.fail(&format!("fail with '{}'", fragment), &diagnostic))
            }
        }
    }

    /// Assert a filter with the given name short-circuited the pipeline.
    pub fn blocked_by_filter(self, filter_name: &str) -> TestResult<Self> {
        let expected = format!("be blocked by filter '{}'", filter_name);
        match self.outcome.failure_reason() {
            Some(ResolveFailure::FilterShortCircuit { filters })
                if filters.iter().any(|f| f.name == filter_name) =>
            {
                Ok(self)
            }
            _ => {
                let diagnostic = self.diagnostic();
                Err(self.fail(&expected, &diagnostic))
            }
        }
    }

    /// Assert an argument was bound to the given value.
    pub fn with_argument(self, name: &str, value: BoundValue) -> TestResult<Self> {
        let expected = format!("bind argument '{}' to {}", name, value);
        match self.outcome.argument(name) {
            Some(info) if info.value == value => Ok(self),
            Some(info) => {
                let diagnostic = format!("it was bound to {}", info.value);
                Err(self.fail(&expected, &diagnostic))
            }
            None => {
                let diagnostic = if self.outcome.resolved() {
                    format!("no argument named '{}' was bound", name)
                } else {
                    self.diagnostic()
                };
                Err(self.fail(&expected, &diagnostic))
            }
        }
    }

    /// Assert a route value was extracted.
    pub fn with_route_value(self, key: &str, value: &str) -> TestResult<Self> {
        let expected = format!("carry route value '{}' = '{}'", key, value);
        match self.outcome.route_data().and_then(|data| data.get(key)) {
            Some(actual) if actual == value => Ok(self),
            Some(actual) => {
                let diagnostic = format!("it was '{}'", actual);
                Err(self.fail(&expected, &diagnostic))
            }
            None => {
                let diagnostic = self.diagnostic();
                Err(self.fail(&expected, &diagnostic))
            }
        }
    }

    /// Assert model binding recorded an error for a field.
    pub fn with_model_error(self, field: &str) -> TestResult<Self> {
        let expected = format!("record a model error for '{}'", field);
        if !self.outcome.model_state().errors_for(field).is_empty() {
            Ok(self)
        } else {
            let diagnostic = if self.outcome.model_state().is_valid() {
                "the model state was valid".to_string()
            } else {
                format!("errors were recorded for: {}", self.error_fields())
            };
            Err(self.fail(&expected, &diagnostic))
        }
    }

    pub fn with_valid_model_state(self) -> TestResult<Self> {
        if self.outcome.model_state().is_valid() {
            Ok(self)
        } else {
            let diagnostic = format!("errors were recorded for: {}", self.error_fields());
            Err(self.fail("have a valid model state", &diagnostic))
        }
    }

    fn error_fields(&self) -> String {
        self.outcome
            .model_state()
            .fields()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Assertions over a mock session.
pub struct SessionAssert<'a> {
    session: &'a MockSession,
}

impl<'a> SessionAssert<'a> {
    pub fn for_session(session: &'a MockSession) -> Self {
        Self { session }
    }

    pub fn has_key(self, key: &str) -> TestResult<Self> {
        if self.session.contains(key) {
            Ok(self)
        } else {
            Err(TestError::assertion(format!(
                "Expected session to contain key '{}' but it was absent.",
                key
            )))
        }
    }

    pub fn has_string(self, key: &str, expected: &str) -> TestResult<Self> {
        match self.session.get(key) {
            Some(value) if value.as_str() == Some(expected) => Ok(self),
            Some(value) => Err(TestError::assertion(format!(
                "Expected session key '{}' to be '{}' but it was {:?}.",
                key, expected, value
            ))),
            None => Err(TestError::assertion(format!(
                "Expected session key '{}' to be '{}' but it was absent.",
                key, expected
            ))),
        }
    }

    pub fn missing_key(self, key: &str) -> TestResult<Self> {
        if self.session.contains(key) {
            Err(TestError::assertion(format!(
                "Expected session not to contain key '{}' but it did.",
                key
            )))
        } else {
            Ok(self)
        }
    }
}

/// Assertions over a mock cache.
pub struct CacheAssert<'a> {
    cache: &'a MemoryCacheMock,
}

impl<'a> CacheAssert<'a> {
    pub fn for_cache(cache: &'a MemoryCacheMock) -> Self {
        Self { cache }
    }

    pub fn contains(self, key: &str) -> TestResult<Self> {
        if self.cache.contains(key) {
            Ok(self)
        } else {
            Err(TestError::assertion(format!(
                "Expected cache to contain key '{}' but it was absent.",
                key
            )))
        }
    }

    pub fn has_value(self, key: &str, expected: &JsonValue) -> TestResult<Self> {
        match self.cache.get(key) {
            Some(value) if &value == expected => Ok(self),
            Some(value) => Err(TestError::assertion(format!(
                "Expected cache key '{}' to be {} but it was {}.",
                key, expected, value
            ))),
            None => Err(TestError::assertion(format!(
                "Expected cache key '{}' to be {} but it was absent.",
                key, expected
            ))),
        }
    }

    pub fn missing(self, key: &str) -> TestResult<Self> {
        if self.cache.contains(key) {
            Err(TestError::assertion(format!(
                "Expected cache not to contain key '{}' but it did.",
                key
            )))
        } else {
            Ok(self)
        }
    }
}
