//! Router: registered routes produce route data for action selection.
//!
//! Two registration styles mirror conventional and attribute routing:
//! `route` registers a template whose parameters (plus defaults) become route
//! data, and `action_route` additionally pins the route to known action
//! descriptors, giving selection a pre-computed candidate set.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::Method;

use crate::actions::ControllerActionDescriptor;
use crate::errors::{HttpError, HttpResult};

use super::matcher::{RouteDefinition, RouteId, RouteMatcher};

/// Key/value pairs produced by routing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteData {
    values: HashMap<String, String>,
}

impl RouteData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.values.get(key)
    }

    /// Case-insensitive lookup, matching how controller/action keys are read.
    pub fn get_ignore_case(&self, key: &str) -> Option<&String> {
        self.values
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn values(&self) -> &HashMap<String, String> {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

/// A successful routing pass.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route_id: RouteId,
    pub data: RouteData,
    /// Pre-computed candidates for attribute-style routes. Empty for
    /// conventional routes.
    pub candidates: Vec<Arc<ControllerActionDescriptor>>,
}

/// Source of route data for the resolver. `Router` is the stock
/// implementation; tests substitute failing providers to exercise the
/// routing-failure classification.
pub trait RouteDataProvider: Send + Sync {
    fn resolve_route(&self, method: &Method, path: &str) -> HttpResult<Option<RouteMatch>>;
}

#[derive(Debug, Default)]
struct RouteEntry {
    defaults: HashMap<String, String>,
    candidates: Vec<Arc<ControllerActionDescriptor>>,
}

/// The router test fixtures configure.
#[derive(Default)]
pub struct Router {
    matcher: RouteMatcher,
    entries: HashMap<RouteId, RouteEntry>,
    next_id: usize,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a conventional route template.
    pub fn route(&mut self, method: Method, path: &str) -> HttpResult<&mut Self> {
        self.register(method, path, HashMap::new(), Vec::new())
    }

    /// Register a conventional route with default route values.
    pub fn route_with_defaults(
        &mut self,
        method: Method,
        path: &str,
        defaults: HashMap<String, String>,
    ) -> HttpResult<&mut Self> {
        self.register(method, path, defaults, Vec::new())
    }

    /// Register an attribute-style route bound to a known action. Routing a
    /// request through it yields the descriptor as a pre-computed candidate.
    pub fn action_route(
        &mut self,
        method: Method,
        path: &str,
        descriptor: Arc<ControllerActionDescriptor>,
    ) -> HttpResult<&mut Self> {
        let defaults = HashMap::from([
            ("controller".to_string(), descriptor.controller_name.clone()),
            ("action".to_string(), descriptor.action_name.clone()),
        ]);
        self.register(method, path, defaults, vec![descriptor])
    }

    fn register(
        &mut self,
        method: Method,
        path: &str,
        defaults: HashMap<String, String>,
        candidates: Vec<Arc<ControllerActionDescriptor>>,
    ) -> HttpResult<&mut Self> {
        let id = format!("route-{}", self.next_id);
        self.next_id += 1;

        self.matcher
            .add_route(RouteDefinition {
                id: id.clone(),
                method,
                path: path.to_string(),
            })
            .map_err(|e| HttpError::routing(e.to_string()))?;
        self.entries.insert(
            id,
            RouteEntry {
                defaults,
                candidates,
            },
        );
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.matcher.is_empty()
    }
}

impl RouteDataProvider for Router {
    fn resolve_route(&self, method: &Method, path: &str) -> HttpResult<Option<RouteMatch>> {
        let matched = match self.matcher.resolve(method, path) {
            Some(matched) => matched,
            None => {
                tracing::debug!(%method, path, "no route matched");
                return Ok(None);
            }
        };

        let entry = self.entries.get(&matched.route_id).ok_or_else(|| {
            HttpError::routing(format!(
                "route '{}' matched but has no registration entry",
                matched.route_id
            ))
        })?;

        let mut data = RouteData::new();
        for (key, value) in &entry.defaults {
            data.insert(key.clone(), value.clone());
        }
        // Extracted parameters override defaults.
        for (key, value) in matched.params {
            data.insert(key, value);
        }

        tracing::debug!(route_id = %matched.route_id, values = ?data.values(), "route matched");

        Ok(Some(RouteMatch {
            route_id: matched.route_id,
            data,
            candidates: entry.candidates.clone(),
        }))
    }
}
