//! # trellis-testing - Route-Resolution Test Harness
//!
//! A fluent toolkit for testing MVC route resolution in-process, without a
//! live server: build a simulated request, drive it through routing, action
//! selection, model binding, and the filter pipeline, and assert on the
//! structured outcome — even though the real action body never runs.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use trellis_testing::prelude::*;
//!
//! let app = TestApplication::builder()
//!     .configure_actions(|actions| { /* register controllers */ Ok(()) })?
//!     .configure_routes(|routes| { /* register routes */ Ok(()) })?
//!     .build();
//!
//! let request = SimulatedRequest::get("/Home/Contact/1").build_request()?;
//! let outcome = app.resolve_route(&request)?;
//!
//! RouteAssert::for_route("/Home/Contact/1", outcome)
//!     .to_action("Home", "Contact")?
//!     .with_argument("id", BoundValue::Int(1))?;
//! ```

pub mod application;
pub mod assertions;
pub mod capture_invoker;
pub mod features;
pub mod interceptor;
pub mod mocks;
pub mod outcome;
pub mod request;
pub mod resolver;

pub use application::TestApplication;
pub use assertions::{CacheAssert, RouteAssert, SessionAssert};
pub use capture_invoker::{CaptureArgumentsStrategy, RouteTestingInvokerProvider};
pub use features::{ControllerContext, InvocationCapture, RouteTestingMode};
pub use interceptor::CaptureInterceptorFilter;
pub use outcome::{ArgumentInfo, FilterDiagnostic, ResolveFailure, RouteOutcome};
pub use request::SimulatedRequest;
pub use resolver::RouteResolver;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        application::TestApplication,
        assertions::{CacheAssert, RouteAssert, SessionAssert},
        mocks::{MemoryCacheMock, MockDistributedCache, MockHttpContext, MockSession},
        outcome::{ArgumentInfo, ResolveFailure, RouteOutcome},
        request::SimulatedRequest,
        resolver::RouteResolver,
        utils,
    };

    pub use trellis_http::{BoundValue, Method, StatusCode};

    // Re-export commonly used external types
    pub use chrono::{DateTime, Utc};
    pub use serde_json::{json, Value as JsonValue};
    pub use uuid::Uuid;
}

// Error handling
#[derive(thiserror::Error, Debug)]
pub enum TestError {
    #[error("Assertion failed: {message}")]
    Assertion { message: String },

    /// The harness itself is wired incorrectly. Unlike resolution failures,
    /// this is never returned as outcome data.
    #[error("Test harness misconfigured: {message}")]
    Harness { message: String },

    #[error("Request construction failed: {message}")]
    Request { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Runtime error: {message}")]
    Runtime { message: String },
}

impl TestError {
    pub fn assertion<T: Into<String>>(message: T) -> Self {
        TestError::Assertion {
            message: message.into(),
        }
    }

    pub fn harness<T: Into<String>>(message: T) -> Self {
        TestError::Harness {
            message: message.into(),
        }
    }

    pub fn request<T: Into<String>>(message: T) -> Self {
        TestError::Request {
            message: message.into(),
        }
    }

    pub fn runtime<T: Into<String>>(message: T) -> Self {
        TestError::Runtime {
            message: message.into(),
        }
    }
}

pub type TestResult<T> = Result<T, TestError>;

/// Test utilities and helper functions
pub mod utils {

    /// Generate a random test string with optional prefix
    pub fn random_string(prefix: Option<&str>) -> String {
        use rand::Rng;
        let suffix: String = rand::thread_rng()
            .sample_iter(&rand::distributions::Alphanumeric)
            .take(8)
            .map(char::from)
            .collect();

        match prefix {
            Some(p) => format!("{}_{}", p, suffix),
            None => suffix,
        }
    }

    /// Create a test UUID
    pub fn test_uuid() -> uuid::Uuid {
        uuid::Uuid::new_v4()
    }

    /// Create a test timestamp
    pub fn test_timestamp() -> chrono::DateTime<chrono::Utc> {
        chrono::Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use crate::utils;

    #[test]
    fn test_random_string_generation() {
        let s1 = utils::random_string(None);
        let s2 = utils::random_string(None);

        assert_eq!(s1.len(), 8);
        assert_ne!(s1, s2);
    }

    #[test]
    fn test_random_string_with_prefix() {
        let s = utils::random_string(Some("route"));
        assert!(s.starts_with("route_"));
    }

    #[test]
    fn test_uuid_generation() {
        assert_ne!(utils::test_uuid(), utils::test_uuid());
    }
}
