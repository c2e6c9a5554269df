//! The route resolver.
//!
//! Drives one simulated request through routing, action selection, model
//! binding and the filter pipeline, and classifies whatever happened into a
//! single [`RouteOutcome`]. Pipeline failures become outcome data; a harness
//! wired incorrectly (missing services, raw-endpoint routes, a provider chain
//! without the capture provider) is a [`TestError::Harness`] instead.

use std::collections::HashMap;

use trellis_http::{
    ActionContext, ActionRegistry, ActionSelector, InvokerFactory, Method, ParamKind,
    RouteDataProvider,
};

use trellis_core::TestServices;

use crate::features::{InvocationCapture, RouteTestingMode};
use crate::outcome::{ArgumentInfo, FilterDiagnostic, ResolveFailure, RouteOutcome};
use crate::request::SimulatedRequest;
use crate::{TestError, TestResult};

/// Resolves simulated requests against a configured pipeline.
#[derive(Debug, Default)]
pub struct RouteResolver;

impl RouteResolver {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous wrapper over [`resolve_async`](Self::resolve_async).
    ///
    /// Spins up a current-thread runtime per call; must not be called from
    /// inside an async context.
    pub fn resolve(
        &self,
        services: &TestServices,
        router: &dyn RouteDataProvider,
        request: &SimulatedRequest,
        full_execution: bool,
    ) -> TestResult<RouteOutcome> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| TestError::runtime(format!("failed to start runtime: {}", e)))?;
        runtime.block_on(self.resolve_async(services, router, request, full_execution))
    }

    /// Drive one request through the pipeline and classify the result.
    pub async fn resolve_async(
        &self,
        services: &TestServices,
        router: &dyn RouteDataProvider,
        request: &SimulatedRequest,
        full_execution: bool,
    ) -> TestResult<RouteOutcome> {
        if request.path.trim().is_empty() {
            return Ok(unresolved(ResolveFailure::RoutingError {
                message: "the request path is empty or whitespace".to_string(),
            }));
        }

        let method = Method::from_bytes(request.method.as_bytes()).map_err(|e| {
            TestError::request(format!("invalid method '{}': {}", request.method, e))
        })?;

        let route_match = match router.resolve_route(&method, &request.path) {
            Ok(Some(route_match)) => route_match,
            Ok(None) => return Ok(unresolved(ResolveFailure::NoMatch)),
            Err(e) => {
                return Ok(unresolved(ResolveFailure::RoutingError {
                    message: innermost_message(&e),
                }))
            }
        };
        tracing::debug!(route = %route_match.route_id, "route data resolved");

        let registry = services
            .require::<ActionRegistry>()
            .map_err(|e| TestError::harness(e.to_string()))?;
        let selector = services
            .require::<ActionSelector>()
            .map_err(|e| TestError::harness(e.to_string()))?;
        let factory = services
            .require::<InvokerFactory>()
            .map_err(|e| TestError::harness(e.to_string()))?;

        let selected =
            match selector.select_best(&registry, &route_match.data, &route_match.candidates) {
                Ok(Some(selected)) => selected,
                Ok(None) => return Ok(unresolved(ResolveFailure::NoMatch)),
                Err(e) => {
                    return Ok(unresolved(ResolveFailure::SelectionError {
                        message: innermost_message(&e),
                    }))
                }
            };

        let descriptor = selected
            .as_controller_action()
            .ok_or_else(|| {
                TestError::harness(format!(
                    "selected action '{}' is not a controller action",
                    selected.id()
                ))
            })?
            .clone();
        let controller = registry.controller(&descriptor.controller_name).ok_or_else(|| {
            TestError::harness(format!(
                "controller '{}' is not registered",
                descriptor.controller_name
            ))
        })?;

        let mut pipeline_request = request.to_pipeline_request()?;
        pipeline_request
            .features_mut()
            .insert(RouteTestingMode { full_execution });
        pipeline_request = pipeline_request.with_path_params(route_match.data.values().clone());

        let mut ctx = ActionContext::new(
            pipeline_request,
            route_match.data.clone(),
            descriptor.clone(),
            controller,
        );

        let invoker = factory
            .create_invoker(&ctx)
            .map_err(|e| TestError::harness(format!("invoker creation failed: {}", e)))?
            .ok_or_else(|| {
                TestError::harness(format!(
                    "no invoker provider claimed action '{}'",
                    descriptor.id
                ))
            })?;
        let channel = invoker
            .capture_channel()
            .ok_or_else(|| {
                TestError::harness(
                    "invoker has no capture channel; the route-testing provider is not installed",
                )
            })?
            .clone();

        if let Err(e) = invoker.invoke(&mut ctx).await {
            return Ok(RouteOutcome::Unresolved {
                reason: ResolveFailure::InvocationError {
                    message: innermost_message(&e),
                },
                model_state: ctx.model_state.clone(),
            });
        }

        let capture = ctx.request.features_mut().take::<InvocationCapture>();
        let channel_arguments = channel
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();

        // The action counts as reached iff the interceptor or the capturing
        // strategy observed it.
        if capture.is_none() && channel_arguments.is_none() {
            let mut filters: Vec<FilterDiagnostic> = ctx
                .executed_filters
                .iter()
                .map(|f| FilterDiagnostic {
                    name: f.name.clone(),
                    order: f.order,
                    scope: f.scope,
                })
                .collect();
            filters.sort_by_key(|d| std::cmp::Reverse(d.order));
            return Ok(RouteOutcome::Unresolved {
                reason: ResolveFailure::FilterShortCircuit { filters },
                model_state: ctx.model_state.clone(),
            });
        }

        let (arguments, model_state) = match capture {
            Some(capture) => (capture.arguments, capture.model_state),
            None => (
                channel_arguments.unwrap_or_default(),
                ctx.model_state.clone(),
            ),
        };
        let bound_arguments = arguments
            .into_iter()
            .map(|(name, value)| {
                let declared_type = descriptor
                    .parameter(&name)
                    .map(|p| p.kind)
                    .unwrap_or(ParamKind::String);
                (name, ArgumentInfo::new(value, declared_type))
            })
            .collect::<HashMap<_, _>>();

        tracing::debug!(action = %descriptor.id, "route resolved");
        Ok(RouteOutcome::Resolved {
            controller_type_name: descriptor.controller_type_name.clone(),
            controller_name: descriptor.controller_name.clone(),
            action_name: descriptor.action_name.clone(),
            bound_arguments,
            route_data: route_match.data.values().clone(),
            model_state,
        })
    }
}

fn unresolved(reason: ResolveFailure) -> RouteOutcome {
    RouteOutcome::Unresolved {
        reason,
        model_state: Default::default(),
    }
}

/// The innermost source message of an error chain. Resolution diagnostics
/// report the root cause, not the wrapping layers.
fn innermost_message(error: &(dyn std::error::Error + 'static)) -> String {
    let mut current = error;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string()
}
