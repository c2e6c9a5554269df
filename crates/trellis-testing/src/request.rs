//! Simulated HTTP requests.
//!
//! A `SimulatedRequest` is an immutable value describing the request a test
//! wants to dispatch: method, path, headers, query, form fields, body. The
//! generated builder gets convenience methods for incremental construction.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method};

use trellis_http::Request;

use crate::{TestError, TestResult};

/// The request value driven through route resolution. Immutable once built.
//
// The `service_builder::builder` attribute macro re-emits the struct with
// private fields and without derives, but the fields here must stay `pub`
// (callers and tests read them directly). The builder below is the macro's
// expansion written out by hand, with visibility and derives preserved.
#[derive(Debug, Clone)]
pub struct SimulatedRequest {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub form: HashMap<String, String>,
    pub body: Option<Vec<u8>>,
}

pub struct SimulatedRequestBuilder {
    method: Option<String>,
    path: Option<String>,
    headers: Option<HashMap<String, String>>,
    query: Option<HashMap<String, String>>,
    form: Option<HashMap<String, String>>,
    body: Option<Option<Vec<u8>>>,
}

impl SimulatedRequestBuilder {
    pub fn new() -> Self {
        Self {
            method: None,
            path: None,
            headers: None,
            query: None,
            form: None,
            body: None,
        }
    }

    pub fn method(mut self, value: String) -> Self {
        self.method = Some(value);
        self
    }

    pub fn path(mut self, value: String) -> Self {
        self.path = Some(value);
        self
    }

    pub fn headers(mut self, value: HashMap<String, String>) -> Self {
        self.headers = Some(value);
        self
    }

    pub fn query(mut self, value: HashMap<String, String>) -> Self {
        self.query = Some(value);
        self
    }

    pub fn form(mut self, value: HashMap<String, String>) -> Self {
        self.form = Some(value);
        self
    }

    pub fn body(mut self, value: Option<Vec<u8>>) -> Self {
        self.body = Some(value);
        self
    }

    pub fn build(self) -> Result<SimulatedRequest, service_builder::error::BuildError> {
        Ok(SimulatedRequest {
            method: self.method.ok_or_else(|| {
                service_builder::error::BuildError::MissingDependency("method".to_string())
            })?,
            path: self.path.ok_or_else(|| {
                service_builder::error::BuildError::MissingDependency("path".to_string())
            })?,
            headers: self.headers.unwrap_or_default(),
            query: self.query.unwrap_or_default(),
            form: self.form.unwrap_or_default(),
            body: self.body.unwrap_or(None),
        })
    }

    pub fn build_with_defaults(self) -> Result<SimulatedRequest, service_builder::error::BuildError> {
        self.build()
    }
}

impl SimulatedRequest {
    pub fn builder() -> SimulatedRequestBuilder {
        SimulatedRequestBuilder::new()
    }
}

impl SimulatedRequest {
    pub fn get(path: impl Into<String>) -> SimulatedRequestBuilder {
        Self::builder()
            .method("GET".to_string())
            .path(path.into())
    }

    pub fn post(path: impl Into<String>) -> SimulatedRequestBuilder {
        Self::builder()
            .method("POST".to_string())
            .path(path.into())
    }

    pub fn put(path: impl Into<String>) -> SimulatedRequestBuilder {
        Self::builder()
            .method("PUT".to_string())
            .path(path.into())
    }

    pub fn delete(path: impl Into<String>) -> SimulatedRequestBuilder {
        Self::builder()
            .method("DELETE".to_string())
            .path(path.into())
    }

    /// Build the pipeline request this simulated request describes.
    pub(crate) fn to_pipeline_request(&self) -> TestResult<Request> {
        let method = Method::from_bytes(self.method.as_bytes())
            .map_err(|e| TestError::request(format!("invalid method '{}': {}", self.method, e)))?;

        let uri = if self.query.is_empty() {
            self.path.clone()
        } else {
            let query = serde_urlencoded::to_string(&self.query)
                .map_err(|e| TestError::request(format!("invalid query parameters: {}", e)))?;
            format!("{}?{}", self.path, query)
        };
        let uri = uri
            .parse()
            .map_err(|e| TestError::request(format!("invalid request path '{}': {}", uri, e)))?;

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let name: axum::http::HeaderName = name
                .parse()
                .map_err(|e| TestError::request(format!("invalid header name '{}': {}", name, e)))?;
            let value = value
                .parse()
                .map_err(|e| TestError::request(format!("invalid header value: {}", e)))?;
            headers.insert(name, value);
        }

        let mut request = Request::new(method, uri, headers);
        if !self.form.is_empty() {
            request = request.with_form_params(self.form.clone());
        }
        if let Some(body) = &self.body {
            request = request.with_body(Bytes::from(body.clone()));
        }
        Ok(request)
    }
}

// Convenience methods on the generated builder
impl SimulatedRequestBuilder {
    /// Add a header
    pub fn add_header(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut headers = self.headers.clone().unwrap_or_default();
        headers.insert(name.into(), value.into());
        self.headers(headers)
    }

    /// Add a query parameter
    pub fn add_query(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut query = self.query.clone().unwrap_or_default();
        query.insert(key.into(), value.into());
        self.query(query)
    }

    /// Add a form field
    pub fn add_form_field(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut form = self.form.clone().unwrap_or_default();
        form.insert(key.into(), value.into());
        self.form(form)
    }

    /// Set JSON body and content type
    pub fn with_json_body<T: serde::Serialize>(self, data: &T) -> Self {
        match serde_json::to_vec(data) {
            Ok(bytes) => self
                .body(Some(bytes))
                .add_header("Content-Type", "application/json"),
            Err(_) => self,
        }
    }

    /// Set form body and content type
    pub fn with_form_body(self, data: HashMap<String, String>) -> Self {
        let encoded = data
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        self.form(data)
            .body(Some(encoded.into_bytes()))
            .add_header("Content-Type", "application/x-www-form-urlencoded")
    }

    /// Finish building the request
    pub fn build_request(self) -> TestResult<SimulatedRequest> {
        self.build_with_defaults()
            .map_err(|e| TestError::request(format!("incomplete request: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fluent_construction() {
        let request = SimulatedRequest::get("/Home/Contact/1")
            .add_query("verbose", "true")
            .add_header("Accept", "application/json")
            .build_request()
            .unwrap();

        assert_eq!(request.method, "GET");
        assert_eq!(request.path, "/Home/Contact/1");
        assert_eq!(request.query["verbose"], "true");
        assert_eq!(request.headers["Accept"], "application/json");
        assert!(request.body.is_none());
    }

    #[test]
    fn pipeline_request_carries_query_and_path() {
        let request = SimulatedRequest::get("/products")
            .add_query("id", "7")
            .build_request()
            .unwrap();

        let pipeline = request.to_pipeline_request().unwrap();
        assert_eq!(pipeline.path(), "/products");
        assert_eq!(pipeline.query_param("id"), Some(&"7".to_string()));
    }

    #[test]
    fn json_body_sets_content_type() {
        let request = SimulatedRequest::post("/submit")
            .with_json_body(&serde_json::json!({"name": "widget"}))
            .build_request()
            .unwrap();

        assert_eq!(request.headers["Content-Type"], "application/json");
        assert!(request.body.is_some());
    }

    #[test]
    fn invalid_method_is_a_request_error() {
        let request = SimulatedRequest::builder()
            .method("NOT A METHOD".to_string())
            .path("/".to_string())
            .build_request()
            .unwrap();

        assert!(matches!(
            request.to_pipeline_request(),
            Err(TestError::Request { .. })
        ));
    }
}
