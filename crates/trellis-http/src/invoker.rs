//! Action invocation.
//!
//! The invoker runs model binding and the filter pipeline exactly as normal
//! dispatch would, then hands off to an [`ActionInvocationStrategy`]: the
//! stock strategy calls the registered action body, while the harness
//! substitutes a capturing no-op through the same seam. The strategy is an
//! explicit field of the cached per-action entry, so swapping it never touches
//! framework internals.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;

use crate::actions::{ActionHandler, ActionRegistry, Controller, ControllerActionDescriptor};
use crate::binding::{BoundValue, ModelBinder, ModelState};
use crate::errors::{HttpError, HttpResult};
use crate::filters::{ExecutedFilter, FilterPipeline};
use crate::request::Request;
use crate::response::Response;
use crate::routing::RouteData;

/// Mutable state for one action invocation attempt.
pub struct ActionContext {
    pub request: Request,
    pub route_data: RouteData,
    pub descriptor: Arc<ControllerActionDescriptor>,
    pub controller: Arc<dyn Controller>,
    /// Bound arguments, populated by the invoker after model binding.
    pub arguments: Option<HashMap<String, BoundValue>>,
    pub model_state: ModelState,
    /// Setting this short-circuits the remaining pipeline.
    pub result: Option<Response>,
    pub executed_filters: Vec<ExecutedFilter>,
}

impl ActionContext {
    pub fn new(
        request: Request,
        route_data: RouteData,
        descriptor: Arc<ControllerActionDescriptor>,
        controller: Arc<dyn Controller>,
    ) -> Self {
        Self {
            request,
            route_data,
            descriptor,
            controller,
            arguments: None,
            model_state: ModelState::new(),
            result: None,
            executed_filters: Vec::new(),
        }
    }
}

impl std::fmt::Debug for ActionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionContext")
            .field("action", &self.descriptor.id)
            .field("route_data", &self.route_data)
            .field("arguments", &self.arguments)
            .field("result_set", &self.result.is_some())
            .finish()
    }
}

/// Side channel through which a capturing strategy exposes the arguments it
/// saw at the would-be method call.
pub type ArgumentCaptureChannel = Arc<Mutex<Option<HashMap<String, BoundValue>>>>;

/// Terminal stage of invocation: what happens in place of (or as) the real
/// action body once binding and filters have run.
#[async_trait]
pub trait ActionInvocationStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn invoke(
        &self,
        ctx: &mut ActionContext,
        handler: &ActionHandler,
    ) -> HttpResult<Response>;
}

/// Stock strategy: call the registered action body with the bound arguments.
#[derive(Debug, Default)]
pub struct ExecuteActionStrategy;

#[async_trait]
impl ActionInvocationStrategy for ExecuteActionStrategy {
    fn name(&self) -> &'static str {
        "ExecuteAction"
    }

    async fn invoke(
        &self,
        ctx: &mut ActionContext,
        handler: &ActionHandler,
    ) -> HttpResult<Response> {
        let arguments = ctx.arguments.clone().unwrap_or_default();
        handler(arguments).await
    }
}

/// Cached per-action wiring. Built once per action and reused across
/// requests; providers clone it and swap only the strategy.
#[derive(Clone)]
pub struct ActionCacheEntry {
    pub descriptor: Arc<ControllerActionDescriptor>,
    pub controller: Arc<dyn Controller>,
    pub handler: ActionHandler,
    pub binder: ModelBinder,
    pub strategy: Arc<dyn ActionInvocationStrategy>,
}

/// Typed result of a cache lookup: the entry plus the assembled filter
/// pipeline for the action.
#[derive(Clone)]
pub struct CacheLookup {
    pub entry: ActionCacheEntry,
    pub filters: FilterPipeline,
}

/// Supplies invokers for actions. Providers are consulted in ascending
/// priority order; the first one to produce an invoker wins.
pub trait InvokerProvider: Send + Sync {
    fn priority(&self) -> i32 {
        0
    }

    fn name(&self) -> &'static str;

    fn create(
        &self,
        factory: &InvokerFactory,
        ctx: &ActionContext,
    ) -> HttpResult<Option<ActionInvoker>>;
}

/// Builds invokers for controller actions, caching per-action wiring.
pub struct InvokerFactory {
    registry: Arc<ActionRegistry>,
    cache: RwLock<HashMap<String, CacheLookup>>,
    providers: Vec<Arc<dyn InvokerProvider>>,
}

impl InvokerFactory {
    pub fn new(registry: Arc<ActionRegistry>) -> Self {
        Self {
            registry,
            cache: RwLock::new(HashMap::new()),
            providers: Vec::new(),
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn InvokerProvider>) -> Self {
        self.providers.push(provider);
        self.providers.sort_by_key(|p| p.priority());
        self
    }

    pub fn registry(&self) -> &Arc<ActionRegistry> {
        &self.registry
    }

    /// Resolve the cached wiring for an action, building it on first use.
    pub fn lookup(
        &self,
        descriptor: &Arc<ControllerActionDescriptor>,
    ) -> HttpResult<CacheLookup> {
        if let Some(found) = self
            .cache
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&descriptor.id)
        {
            return Ok(found.clone());
        }

        let controller = self
            .registry
            .controller(&descriptor.controller_name)
            .ok_or_else(|| {
                HttpError::invalid_descriptor(format!(
                    "controller '{}' is not registered",
                    descriptor.controller_name
                ))
            })?;
        let handler = self.registry.handler(&descriptor.id).ok_or_else(|| {
            HttpError::invalid_descriptor(format!(
                "action '{}' has no registered handler",
                descriptor.id
            ))
        })?;

        let (global, controller_filters, action_filters) = self.registry.filters_for(descriptor);
        let lookup = CacheLookup {
            entry: ActionCacheEntry {
                descriptor: descriptor.clone(),
                controller,
                handler,
                binder: ModelBinder::new(),
                strategy: Arc::new(ExecuteActionStrategy),
            },
            filters: FilterPipeline::assemble(global, controller_filters, action_filters),
        };

        self.cache
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(descriptor.id.clone(), lookup.clone());
        Ok(lookup)
    }

    /// Ask the provider chain for an invoker.
    pub fn create_invoker(&self, ctx: &ActionContext) -> HttpResult<Option<ActionInvoker>> {
        for provider in &self.providers {
            if let Some(invoker) = provider.create(self, ctx)? {
                tracing::debug!(provider = provider.name(), action = %ctx.descriptor.id, "invoker created");
                return Ok(Some(invoker));
            }
        }
        Ok(None)
    }
}

/// Stock provider: real invocation for any controller action.
#[derive(Debug, Default)]
pub struct DefaultInvokerProvider;

impl InvokerProvider for DefaultInvokerProvider {
    fn name(&self) -> &'static str {
        "DefaultInvokerProvider"
    }

    fn create(
        &self,
        factory: &InvokerFactory,
        ctx: &ActionContext,
    ) -> HttpResult<Option<ActionInvoker>> {
        let lookup = factory.lookup(&ctx.descriptor)?;
        Ok(Some(ActionInvoker::new(lookup.entry, lookup.filters)))
    }
}

/// Drives one invocation: bind, filter, then the terminal strategy.
///
/// Controller instances are shared `Arc`s and are never dropped here, so
/// assertions can keep inspecting them after invocation.
pub struct ActionInvoker {
    entry: ActionCacheEntry,
    filters: FilterPipeline,
    capture_channel: Option<ArgumentCaptureChannel>,
}

impl ActionInvoker {
    pub fn new(entry: ActionCacheEntry, filters: FilterPipeline) -> Self {
        Self {
            entry,
            filters,
            capture_channel: None,
        }
    }

    pub fn with_capture_channel(mut self, channel: ArgumentCaptureChannel) -> Self {
        self.capture_channel = Some(channel);
        self
    }

    /// The bound-arguments side channel, present only on capturing invokers.
    pub fn capture_channel(&self) -> Option<&ArgumentCaptureChannel> {
        self.capture_channel.as_ref()
    }

    pub fn filters(&self) -> &FilterPipeline {
        &self.filters
    }

    pub fn strategy_name(&self) -> &'static str {
        self.entry.strategy.name()
    }

    pub async fn invoke(&self, ctx: &mut ActionContext) -> HttpResult<Response> {
        let mut model_state = std::mem::take(&mut ctx.model_state);
        let arguments =
            self.entry
                .binder
                .bind(&self.entry.descriptor, &ctx.request, &ctx.route_data, &mut model_state);
        ctx.model_state = model_state;
        ctx.arguments = Some(arguments);

        self.filters.run(ctx).await?;

        if let Some(result) = ctx.result.clone() {
            tracing::debug!(action = %ctx.descriptor.id, "pipeline short-circuited by filter");
            return Ok(result);
        }

        self.entry.strategy.invoke(ctx, &self.entry.handler).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{handler, ControllerActionDescriptor, ParameterDescriptor};
    use crate::filters::{ActionFilter, FilterScope};
    use axum::http::{HeaderMap, Method, StatusCode};
    use std::any::Any;

    struct ProductsController;

    impl Controller for ProductsController {
        fn name(&self) -> &str {
            "Products"
        }
        fn type_name(&self) -> &'static str {
            std::any::type_name::<Self>()
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    struct Deny;

    #[async_trait]
    impl ActionFilter for Deny {
        fn name(&self) -> &'static str {
            "Deny"
        }
        async fn on_action_executing(&self, ctx: &mut ActionContext) -> HttpResult<()> {
            ctx.result = Some(Response::unauthorized());
            Ok(())
        }
    }

    fn fixture(with_deny_filter: bool) -> (InvokerFactory, ActionContext) {
        let mut registry = ActionRegistry::new();
        registry.register_controller(Arc::new(ProductsController));
        let descriptor = registry
            .register_action(
                ControllerActionDescriptor::new(
                    "Products",
                    "Show",
                    std::any::type_name::<ProductsController>(),
                    vec![ParameterDescriptor::int("id")],
                ),
                handler(|args| async move {
                    let id = args["id"].as_i64().unwrap_or_default();
                    Response::ok().json(&serde_json::json!({ "id": id }))
                }),
            )
            .unwrap();
        if with_deny_filter {
            registry
                .add_action_filter(&descriptor.id, Arc::new(Deny))
                .unwrap();
        }

        let registry = Arc::new(registry);
        let factory =
            InvokerFactory::new(registry.clone()).with_provider(Arc::new(DefaultInvokerProvider));

        let mut route_data = RouteData::new();
        route_data.insert("id", "9");
        let controller = registry.controller("Products").unwrap();
        let ctx = ActionContext::new(
            Request::new(Method::GET, "/products/9".parse().unwrap(), HeaderMap::new()),
            route_data,
            descriptor,
            controller,
        );
        (factory, ctx)
    }

    #[tokio::test]
    async fn default_provider_invokes_the_real_action() {
        let (factory, mut ctx) = fixture(false);
        let invoker = factory.create_invoker(&ctx).unwrap().unwrap();
        assert!(invoker.capture_channel().is_none());

        let response = invoker.invoke(&mut ctx).await.unwrap();
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(
            ctx.arguments.as_ref().unwrap()["id"],
            BoundValue::Int(9)
        );
    }

    #[tokio::test]
    async fn filter_short_circuit_returns_filter_result() {
        let (factory, mut ctx) = fixture(true);
        let invoker = factory.create_invoker(&ctx).unwrap().unwrap();

        let response = invoker.invoke(&mut ctx).await.unwrap();
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ctx.executed_filters.len(), 1);
        assert_eq!(ctx.executed_filters[0].scope, FilterScope::Action);
    }

    #[tokio::test]
    async fn cache_entry_is_reused_across_lookups() {
        let (factory, ctx) = fixture(false);
        let first = factory.lookup(&ctx.descriptor).unwrap();
        let second = factory.lookup(&ctx.descriptor).unwrap();
        assert!(Arc::ptr_eq(&first.entry.handler, &second.entry.handler));
    }
}
