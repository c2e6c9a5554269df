//! Route matching engine.
//!
//! Static routes sit in a per-method lookup table; dynamic routes are kept
//! sorted by pattern priority and probed in order.

use std::collections::HashMap;

use axum::http::Method;
use thiserror::Error;

use super::pattern::{RoutePattern, RoutePatternError};

pub type RouteId = String;

#[derive(Error, Debug)]
pub enum RouteMatchError {
    #[error("Route pattern error: {0}")]
    PatternError(#[from] RoutePatternError),
    #[error("Conflicting routes: {0} conflicts with {1}")]
    RouteConflict(String, String),
}

/// Definition of a route to be compiled.
#[derive(Debug, Clone)]
pub struct RouteDefinition {
    pub id: RouteId,
    pub method: Method,
    pub path: String,
}

#[derive(Debug)]
struct CompiledRoute {
    id: RouteId,
    method: Method,
    pattern: RoutePattern,
    priority: i32,
}

/// Result of a successful match: the route id plus extracted parameters.
#[derive(Debug, Clone)]
pub struct MatchedRoute {
    pub route_id: RouteId,
    pub params: HashMap<String, String>,
}

#[derive(Debug, Default)]
pub struct RouteMatcher {
    /// method -> path -> route id
    static_routes: HashMap<Method, HashMap<String, RouteId>>,
    dynamic_routes: Vec<CompiledRoute>,
}

impl RouteMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_route(&mut self, definition: RouteDefinition) -> Result<(), RouteMatchError> {
        let pattern = RoutePattern::parse(&definition.path)?;
        self.check_conflicts(&definition, &pattern)?;

        if pattern.is_static() {
            self.static_routes
                .entry(definition.method.clone())
                .or_default()
                .insert(definition.path.clone(), definition.id);
        } else {
            let compiled = CompiledRoute {
                id: definition.id,
                method: definition.method,
                priority: pattern.priority(),
                pattern,
            };
            let insert_pos = self
                .dynamic_routes
                .binary_search_by_key(&compiled.priority, |r| r.priority)
                .unwrap_or_else(|pos| pos);
            self.dynamic_routes.insert(insert_pos, compiled);
        }

        Ok(())
    }

    pub fn resolve(&self, method: &Method, path: &str) -> Option<MatchedRoute> {
        if let Some(method_routes) = self.static_routes.get(method) {
            if let Some(route_id) = method_routes.get(path) {
                return Some(MatchedRoute {
                    route_id: route_id.clone(),
                    params: HashMap::new(),
                });
            }
        }

        for compiled in &self.dynamic_routes {
            if &compiled.method != method {
                continue;
            }
            if let Some(params) = compiled.pattern.match_path(path) {
                return Some(MatchedRoute {
                    route_id: compiled.id.clone(),
                    params,
                });
            }
        }

        None
    }

    pub fn is_empty(&self) -> bool {
        self.static_routes.is_empty() && self.dynamic_routes.is_empty()
    }

    fn check_conflicts(
        &self,
        new_route: &RouteDefinition,
        new_pattern: &RoutePattern,
    ) -> Result<(), RouteMatchError> {
        // Only exact static duplicates conflict; dynamic overlap is resolved
        // by priority.
        if new_pattern.is_static() {
            if let Some(method_routes) = self.static_routes.get(&new_route.method) {
                if let Some(existing_id) = method_routes.get(&new_route.path) {
                    return Err(RouteMatchError::RouteConflict(
                        new_route.id.clone(),
                        existing_id.clone(),
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(id: &str, method: Method, path: &str) -> RouteDefinition {
        RouteDefinition {
            id: id.to_string(),
            method,
            path: path.to_string(),
        }
    }

    #[test]
    fn static_routes_take_the_fast_path() {
        let mut matcher = RouteMatcher::new();
        matcher
            .add_route(definition("home", Method::GET, "/home"))
            .unwrap();

        let matched = matcher.resolve(&Method::GET, "/home").unwrap();
        assert_eq!(matched.route_id, "home");
        assert!(matched.params.is_empty());
    }

    #[test]
    fn method_mismatch_does_not_match() {
        let mut matcher = RouteMatcher::new();
        matcher
            .add_route(definition("home", Method::GET, "/home"))
            .unwrap();
        assert!(matcher.resolve(&Method::POST, "/home").is_none());
    }

    #[test]
    fn dynamic_routes_matched_by_priority() {
        let mut matcher = RouteMatcher::new();
        matcher
            .add_route(definition("by-id", Method::GET, "/products/{id}"))
            .unwrap();
        matcher
            .add_route(definition("featured", Method::GET, "/products/featured/{tag}"))
            .unwrap();

        let matched = matcher.resolve(&Method::GET, "/products/featured/new").unwrap();
        assert_eq!(matched.route_id, "featured");

        let matched = matcher.resolve(&Method::GET, "/products/42").unwrap();
        assert_eq!(matched.route_id, "by-id");
        assert_eq!(matched.params["id"], "42");
    }

    #[test]
    fn duplicate_static_route_conflicts() {
        let mut matcher = RouteMatcher::new();
        matcher
            .add_route(definition("a", Method::GET, "/home"))
            .unwrap();
        assert!(matches!(
            matcher.add_route(definition("b", Method::GET, "/home")),
            Err(RouteMatchError::RouteConflict(_, _))
        ));
    }
}
