//! The capture interceptor filter.
//!
//! Appended by the route-testing invoker provider at the very end of every
//! assembled pipeline. Running at `i32::MAX` order, it only executes if no
//! regular filter short-circuited first, so reaching it proves the action
//! would have been invoked. It snapshots the invocation state into the
//! request's feature bag and, unless full execution was requested, stops the
//! pipeline with an inert result.

use async_trait::async_trait;

use trellis_http::{ActionContext, ActionFilter, HttpResult, Response};

use crate::features::{ControllerContext, InvocationCapture, RouteTestingMode};

#[derive(Debug, Default)]
pub struct CaptureInterceptorFilter;

#[async_trait]
impl ActionFilter for CaptureInterceptorFilter {
    fn order(&self) -> i32 {
        i32::MAX
    }

    fn name(&self) -> &'static str {
        "CaptureInterceptorFilter"
    }

    async fn on_action_executing(&self, ctx: &mut ActionContext) -> HttpResult<()> {
        let mode = ctx
            .request
            .features()
            .get::<RouteTestingMode>()
            .copied()
            .unwrap_or(RouteTestingMode {
                full_execution: false,
            });

        let capture = InvocationCapture {
            context: ControllerContext {
                controller: ctx.controller.clone(),
                descriptor: ctx.descriptor.clone(),
                route_data: ctx.route_data.clone(),
            },
            arguments: ctx.arguments.clone().unwrap_or_default(),
            model_state: ctx.model_state.clone(),
        };
        tracing::debug!(action = %ctx.descriptor.id, "invocation state captured");
        ctx.request.features_mut().insert(capture);

        if !mode.full_execution {
            ctx.result = Some(Response::inert());
        }
        Ok(())
    }
}
