//! Invoker provider and strategy used during route testing.
//!
//! The provider sits at maximum priority in the factory's provider chain but
//! only claims requests carrying a [`RouteTestingMode`] feature, so ordinary
//! dispatch through the same factory is untouched. For claimed requests it
//! clones the cached per-action wiring, swaps the terminal strategy for a
//! capturing one (unless full execution was asked for), and appends the
//! capture interceptor to the filter pipeline.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use trellis_http::{
    ActionCacheEntry, ActionContext, ActionHandler, ActionInvocationStrategy, ActionInvoker,
    ArgumentCaptureChannel, FilterRegistration, FilterScope, HttpResult, InvokerFactory,
    InvokerProvider, Response,
};

use crate::features::RouteTestingMode;
use crate::interceptor::CaptureInterceptorFilter;

/// Terminal strategy that records the bound arguments instead of calling the
/// action body. Acts as a safety net behind the interceptor: even if the
/// pipeline reaches the terminal stage, nothing user-visible executes.
pub struct CaptureArgumentsStrategy {
    channel: ArgumentCaptureChannel,
}

impl CaptureArgumentsStrategy {
    pub fn new(channel: ArgumentCaptureChannel) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl ActionInvocationStrategy for CaptureArgumentsStrategy {
    fn name(&self) -> &'static str {
        "CaptureArguments"
    }

    async fn invoke(
        &self,
        ctx: &mut ActionContext,
        _handler: &ActionHandler,
    ) -> HttpResult<Response> {
        if ctx.descriptor.has_parameters() {
            let mut slot = self
                .channel
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *slot = Some(ctx.arguments.clone().unwrap_or_default());
        }
        Ok(Response::inert())
    }
}

/// Provider claiming only requests flagged for route testing.
#[derive(Debug, Default)]
pub struct RouteTestingInvokerProvider;

impl InvokerProvider for RouteTestingInvokerProvider {
    fn priority(&self) -> i32 {
        i32::MAX
    }

    fn name(&self) -> &'static str {
        "RouteTestingInvokerProvider"
    }

    fn create(
        &self,
        factory: &InvokerFactory,
        ctx: &ActionContext,
    ) -> HttpResult<Option<ActionInvoker>> {
        let Some(mode) = ctx.request.features().get::<RouteTestingMode>().copied() else {
            return Ok(None);
        };

        let lookup = factory.lookup(&ctx.descriptor)?;
        let channel: ArgumentCaptureChannel = Arc::new(Mutex::new(None));

        let strategy: Arc<dyn ActionInvocationStrategy> = if mode.full_execution {
            lookup.entry.strategy.clone()
        } else {
            Arc::new(CaptureArgumentsStrategy::new(channel.clone()))
        };
        let entry = ActionCacheEntry {
            strategy,
            ..lookup.entry
        };
        let filters = lookup.filters.with_appended(FilterRegistration::new(
            Arc::new(CaptureInterceptorFilter),
            FilterScope::Action,
        ));

        Ok(Some(
            ActionInvoker::new(entry, filters).with_capture_channel(channel),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::Any;
    use std::collections::HashMap;

    use axum::http::{HeaderMap, Method};
    use trellis_http::{
        handler, ActionRegistry, BoundValue, Controller, ControllerActionDescriptor,
        DefaultInvokerProvider, ParameterDescriptor, Request, RouteData,
    };

    use crate::features::InvocationCapture;

    struct OrdersController;

    impl Controller for OrdersController {
        fn name(&self) -> &str {
            "Orders"
        }
        fn type_name(&self) -> &'static str {
            std::any::type_name::<Self>()
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn factory() -> (InvokerFactory, Arc<ControllerActionDescriptor>, Arc<ActionRegistry>) {
        let mut registry = ActionRegistry::new();
        registry.register_controller(Arc::new(OrdersController));
        let descriptor = registry
            .register_action(
                ControllerActionDescriptor::new(
                    "Orders",
                    "Show",
                    std::any::type_name::<OrdersController>(),
                    vec![ParameterDescriptor::int("id")],
                ),
                handler(|_args| async move { Ok(Response::ok()) }),
            )
            .unwrap();
        let registry = Arc::new(registry);
        let factory = InvokerFactory::new(registry.clone())
            .with_provider(Arc::new(DefaultInvokerProvider))
            .with_provider(Arc::new(RouteTestingInvokerProvider));
        (factory, descriptor, registry)
    }

    fn context(
        descriptor: Arc<ControllerActionDescriptor>,
        registry: &ActionRegistry,
        testing: bool,
    ) -> ActionContext {
        let mut request = Request::new(Method::GET, "/orders/4".parse().unwrap(), HeaderMap::new());
        if testing {
            request
                .features_mut()
                .insert(RouteTestingMode::route_matching_only());
        }
        let mut route_data = RouteData::new();
        route_data.insert("id", "4");
        ActionContext::new(
            request,
            route_data,
            descriptor,
            registry.controller("Orders").unwrap(),
        )
    }

    #[test]
    fn provider_ignores_requests_without_the_testing_flag() {
        let (factory, descriptor, registry) = factory();
        let ctx = context(descriptor, &registry, false);
        let invoker = factory.create_invoker(&ctx).unwrap().unwrap();
        assert!(invoker.capture_channel().is_none());
        assert_eq!(invoker.strategy_name(), "ExecuteAction");
    }

    #[test]
    fn provider_claims_flagged_requests_with_a_capture_channel() {
        let (factory, descriptor, registry) = factory();
        let ctx = context(descriptor, &registry, true);
        let invoker = factory.create_invoker(&ctx).unwrap().unwrap();
        assert!(invoker.capture_channel().is_some());
        assert_eq!(invoker.strategy_name(), "CaptureArguments");
        // one appended interceptor on an otherwise empty pipeline
        assert_eq!(invoker.filters().len(), 1);
    }

    #[tokio::test]
    async fn invocation_captures_without_running_the_action() {
        let (factory, descriptor, registry) = factory();
        let mut ctx = context(descriptor, &registry, true);
        let invoker = factory.create_invoker(&ctx).unwrap().unwrap();

        let response = invoker.invoke(&mut ctx).await.unwrap();
        assert!(response.is_inert());

        let capture = ctx
            .request
            .features()
            .get::<InvocationCapture>()
            .expect("capture present");
        assert_eq!(capture.arguments["id"], BoundValue::Int(4));
    }

    #[tokio::test]
    async fn strategy_records_arguments_on_the_channel() {
        let channel: ArgumentCaptureChannel = Arc::new(Mutex::new(None));
        let strategy = CaptureArgumentsStrategy::new(channel.clone());

        let (_, descriptor, registry) = factory();
        let mut ctx = context(descriptor, &registry, true);
        let mut arguments = HashMap::new();
        arguments.insert("id".to_string(), BoundValue::Int(4));
        ctx.arguments = Some(arguments);

        let noop = handler(|_args| async move { Ok(Response::ok()) });
        let response = strategy.invoke(&mut ctx, &noop).await.unwrap();
        assert!(response.is_inert());
        assert_eq!(
            channel.lock().unwrap().as_ref().unwrap()["id"],
            BoundValue::Int(4)
        );
    }
}
