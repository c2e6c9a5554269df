//! Model binding: computing action argument values from route data, query,
//! form fields, and the request body.
//!
//! Conversion failures never abort the pipeline. They are recorded in
//! [`ModelState`] under the parameter name and the parameter is bound to its
//! kind's default, so resolution still completes and tests can assert on the
//! validation error.

use std::collections::HashMap;

use serde::Serialize;

use crate::actions::{ControllerActionDescriptor, ParamKind, ParamSource};
use crate::request::Request;
use crate::routing::RouteData;

/// A bound argument value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BoundValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Uuid(uuid::Uuid),
    Json(serde_json::Value),
    Null,
}

impl BoundValue {
    pub fn default_for(kind: ParamKind) -> Self {
        match kind {
            ParamKind::String => BoundValue::Str(String::new()),
            ParamKind::Int => BoundValue::Int(0),
            ParamKind::Float => BoundValue::Float(0.0),
            ParamKind::Bool => BoundValue::Bool(false),
            ParamKind::Uuid => BoundValue::Uuid(uuid::Uuid::nil()),
            ParamKind::Json => BoundValue::Null,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            BoundValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            BoundValue::Str(value) => Some(value),
            _ => None,
        }
    }
}

impl std::fmt::Display for BoundValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoundValue::Str(value) => write!(f, "{}", value),
            BoundValue::Int(value) => write!(f, "{}", value),
            BoundValue::Float(value) => write!(f, "{}", value),
            BoundValue::Bool(value) => write!(f, "{}", value),
            BoundValue::Uuid(value) => write!(f, "{}", value),
            BoundValue::Json(value) => write!(f, "{}", value),
            BoundValue::Null => write!(f, "null"),
        }
    }
}

/// Validation errors accumulated during binding, keyed by field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelState {
    errors: HashMap<String, Vec<String>>,
}

impl ModelState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors_for(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = &String> {
        self.errors.keys()
    }

    pub fn error_count(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }
}

/// Binds action arguments from the request per parameter descriptor.
#[derive(Debug, Default, Clone)]
pub struct ModelBinder;

impl ModelBinder {
    pub fn new() -> Self {
        Self
    }

    /// Bind one value per declared parameter. Returns the argument map;
    /// conversion failures are recorded in `model_state`.
    pub fn bind(
        &self,
        descriptor: &ControllerActionDescriptor,
        request: &Request,
        route_data: &RouteData,
        model_state: &mut ModelState,
    ) -> HashMap<String, BoundValue> {
        let mut arguments = HashMap::with_capacity(descriptor.parameters.len());

        for parameter in &descriptor.parameters {
            let value = match parameter.source {
                ParamSource::Body => self.bind_body(&parameter.name, request, model_state),
                _ => self.bind_scalar(
                    &parameter.name,
                    parameter.kind,
                    parameter.source,
                    request,
                    route_data,
                    model_state,
                ),
            };
            arguments.insert(parameter.name.clone(), value);
        }

        arguments
    }

    fn bind_body(
        &self,
        name: &str,
        request: &Request,
        model_state: &mut ModelState,
    ) -> BoundValue {
        match request.body_bytes() {
            None => BoundValue::Null,
            Some(bytes) => match serde_json::from_slice::<serde_json::Value>(bytes) {
                Ok(value) => BoundValue::Json(value),
                Err(e) => {
                    model_state.add_error(name, format!("The request body is not valid: {}.", e));
                    BoundValue::Null
                }
            },
        }
    }

    fn bind_scalar(
        &self,
        name: &str,
        kind: ParamKind,
        source: ParamSource,
        request: &Request,
        route_data: &RouteData,
        model_state: &mut ModelState,
    ) -> BoundValue {
        let raw = match source {
            ParamSource::Route => route_data.get(name),
            ParamSource::Query => request.query_param(name),
            ParamSource::Form => request.form_param(name),
            ParamSource::Auto => route_data
                .get(name)
                .or_else(|| request.query_param(name))
                .or_else(|| request.form_param(name)),
            ParamSource::Body => unreachable!("body parameters bound separately"),
        };

        let raw = match raw {
            Some(raw) => raw,
            // Absent values bind the kind's default without a model error.
            None => return BoundValue::default_for(kind),
        };

        match Self::convert(raw, kind) {
            Some(value) => value,
            None => {
                tracing::debug!(parameter = name, raw, ?kind, "binding conversion failed");
                model_state.add_error(name, format!("The value '{}' is not valid for {}.", raw, name));
                BoundValue::default_for(kind)
            }
        }
    }

    fn convert(raw: &str, kind: ParamKind) -> Option<BoundValue> {
        match kind {
            ParamKind::String => Some(BoundValue::Str(raw.to_string())),
            ParamKind::Int => raw.parse::<i64>().ok().map(BoundValue::Int),
            ParamKind::Float => raw.parse::<f64>().ok().map(BoundValue::Float),
            ParamKind::Bool => match raw {
                "true" | "True" | "1" => Some(BoundValue::Bool(true)),
                "false" | "False" | "0" => Some(BoundValue::Bool(false)),
                _ => None,
            },
            ParamKind::Uuid => uuid::Uuid::parse_str(raw).ok().map(BoundValue::Uuid),
            ParamKind::Json => serde_json::from_str(raw).ok().map(BoundValue::Json),
        }
    }
}
