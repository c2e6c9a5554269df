//! Typed feature-bag entries the harness attaches to the request.

use std::collections::HashMap;
use std::sync::Arc;

use trellis_http::{
    BoundValue, Controller, ControllerActionDescriptor, ModelState, RouteData,
};

/// Per-request flag controlling whether the real action body runs.
///
/// Attached to the request's feature bag before dispatch and read by the
/// route-testing invoker provider and the interceptor filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteTestingMode {
    pub full_execution: bool,
}

impl RouteTestingMode {
    pub fn route_matching_only() -> Self {
        Self {
            full_execution: false,
        }
    }

    pub fn full_pipeline() -> Self {
        Self {
            full_execution: true,
        }
    }
}

/// The live invocation surroundings at the capture point.
#[derive(Clone)]
pub struct ControllerContext {
    pub controller: Arc<dyn Controller>,
    pub descriptor: Arc<ControllerActionDescriptor>,
    pub route_data: RouteData,
}

impl std::fmt::Debug for ControllerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerContext")
            .field("controller", &self.controller.type_name())
            .field("action", &self.descriptor.id)
            .field("route_data", &self.route_data)
            .finish()
    }
}

/// State captured by the interceptor filter immediately before the real
/// action would have run.
///
/// Written exactly once per invocation attempt, read exactly once by the
/// resolver. Never populated when an earlier filter short-circuits.
#[derive(Debug, Clone)]
pub struct InvocationCapture {
    pub context: ControllerContext,
    /// The action arguments as bound at the capture point.
    pub arguments: HashMap<String, BoundValue>,
    pub model_state: ModelState,
}
