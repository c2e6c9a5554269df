//! Response abstraction for pipeline results.
//!
//! Besides the usual empty/text/json bodies there is an inert marker body:
//! the interceptor filter installs it in place of the real action result so
//! nothing downstream produces side effects during route resolution.

use axum::http::{HeaderMap, StatusCode};
use serde::Serialize;

use crate::errors::{HttpError, HttpResult};

/// Response body kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Empty,
    Text(String),
    Json(serde_json::Value),
    /// Marker body whose execution is a no-op.
    Inert,
}

/// Pipeline response with fluent construction.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: ResponseBody,
}

impl Response {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: ResponseBody::Empty,
        }
    }

    pub fn with_status(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: ResponseBody::Empty,
        }
    }

    /// The inert marker result installed by the interceptor filter.
    pub fn inert() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: ResponseBody::Inert,
        }
    }

    pub fn ok() -> Self {
        Self::with_status(StatusCode::OK)
    }

    pub fn not_found() -> Self {
        Self::with_status(StatusCode::NOT_FOUND)
    }

    pub fn unauthorized() -> Self {
        Self::with_status(StatusCode::UNAUTHORIZED)
    }

    pub fn bad_request() -> Self {
        Self::with_status(StatusCode::BAD_REQUEST)
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    pub fn text(mut self, content: impl Into<String>) -> Self {
        self.body = ResponseBody::Text(content.into());
        self
    }

    pub fn json<T: Serialize>(mut self, data: &T) -> HttpResult<Self> {
        let value = serde_json::to_value(data)
            .map_err(|e| HttpError::internal(format!("JSON serialization failed: {}", e)))?;
        self.body = ResponseBody::Json(value);
        Ok(self)
    }

    pub fn json_value(mut self, value: serde_json::Value) -> Self {
        self.body = ResponseBody::Json(value);
        self
    }

    pub fn header(mut self, name: &'static str, value: &str) -> HttpResult<Self> {
        let value = value
            .parse()
            .map_err(|e| HttpError::internal(format!("Invalid header value: {}", e)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    /// Whether this is the marker result rather than a real action result.
    pub fn is_inert(&self) -> bool {
        matches!(self.body, ResponseBody::Inert)
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inert_marker_is_distinguishable() {
        assert!(Response::inert().is_inert());
        assert!(!Response::ok().is_inert());
        assert!(!Response::ok().text("hello").is_inert());
    }

    #[test]
    fn json_body_is_stored_as_value() {
        let response = Response::ok()
            .json(&serde_json::json!({"id": 1}))
            .unwrap();
        assert_eq!(
            response.body(),
            &ResponseBody::Json(serde_json::json!({"id": 1}))
        );
        assert_eq!(response.status_code(), StatusCode::OK);
    }
}
