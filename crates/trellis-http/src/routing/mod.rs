//! Routing: pattern parsing, route matching, and the router that produces
//! route data (and pre-computed action candidates) for the resolver.

pub mod matcher;
pub mod pattern;
pub mod router;

pub use matcher::{MatchedRoute, RouteDefinition, RouteMatchError, RouteMatcher};
pub use pattern::{ParamConstraint, PathSegment, RoutePattern, RoutePatternError};
pub use router::{RouteData, RouteDataProvider, RouteMatch, Router};
