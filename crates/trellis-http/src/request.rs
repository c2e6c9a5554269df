//! Request abstraction the pipeline executes against.
//!
//! Carries parsed method/uri/headers/params plus a typed per-request feature
//! bag. The feature bag is the side channel the harness uses to attach
//! route-testing flags and to read back captured invocation state.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, Uri};
use serde::de::DeserializeOwned;

use crate::errors::{HttpError, HttpResult};

/// Typed per-request feature bag, keyed by type.
#[derive(Debug, Default)]
pub struct FeatureMap {
    entries: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl FeatureMap {
    pub fn insert<T: Any + Send + Sync>(&mut self, feature: T) {
        self.entries.insert(TypeId::of::<T>(), Box::new(feature));
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<T>())
    }

    pub fn get_mut<T: Any + Send + Sync>(&mut self) -> Option<&mut T> {
        self.entries
            .get_mut(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_mut::<T>())
    }

    /// Remove and return a feature. Used for read-exactly-once state.
    pub fn take<T: Any + Send + Sync>(&mut self) -> Option<T> {
        self.entries
            .remove(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast::<T>().ok())
            .map(|boxed| *boxed)
    }

    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }
}

/// A request flowing through the pipeline.
#[derive(Debug)]
pub struct Request {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub path_params: HashMap<String, String>,
    pub query_params: HashMap<String, String>,
    pub form_params: HashMap<String, String>,
    features: FeatureMap,
    body_bytes: Option<Bytes>,
}

impl Request {
    pub fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
        let query_params = uri
            .query()
            .and_then(|query| serde_urlencoded::from_str::<HashMap<String, String>>(query).ok())
            .unwrap_or_default();

        Self {
            method,
            uri,
            headers,
            path_params: HashMap::new(),
            query_params,
            form_params: HashMap::new(),
            features: FeatureMap::default(),
            body_bytes: None,
        }
    }

    /// Request path without the query string.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn with_body(mut self, body: Bytes) -> Self {
        // Form bodies double as the form-field map used by binding.
        if self.is_form_urlencoded() {
            if let Ok(fields) =
                serde_urlencoded::from_bytes::<HashMap<String, String>>(body.as_ref())
            {
                self.form_params.extend(fields);
            }
        }
        self.body_bytes = Some(body);
        self
    }

    pub fn with_path_params(mut self, params: HashMap<String, String>) -> Self {
        self.path_params = params;
        self
    }

    pub fn with_form_params(mut self, params: HashMap<String, String>) -> Self {
        self.form_params = params;
        self
    }

    pub fn header(&self, name: &str) -> Option<&axum::http::HeaderValue> {
        self.headers.get(name)
    }

    fn is_form_urlencoded(&self) -> bool {
        self.header("content-type")
            .and_then(|value| value.to_str().ok())
            .map(|value| value.starts_with("application/x-www-form-urlencoded"))
            .unwrap_or(false)
    }

    pub fn query_param(&self, name: &str) -> Option<&String> {
        self.query_params.get(name)
    }

    pub fn path_param(&self, name: &str) -> Option<&String> {
        self.path_params.get(name)
    }

    pub fn form_param(&self, name: &str) -> Option<&String> {
        self.form_params.get(name)
    }

    pub fn body_bytes(&self) -> Option<&Bytes> {
        self.body_bytes.as_ref()
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> HttpResult<T> {
        let bytes = self
            .body_bytes
            .as_ref()
            .ok_or_else(|| HttpError::bad_request("Request body is empty"))?;
        serde_json::from_slice(bytes)
            .map_err(|e| HttpError::bad_request(format!("Invalid JSON body: {}", e)))
    }

    pub fn features(&self) -> &FeatureMap {
        &self.features
    }

    pub fn features_mut(&mut self) -> &mut FeatureMap {
        &mut self.features
    }
}
