//! The test application fixture.
//!
//! Bundles a service container, a configured router and the resolver into a
//! single entry point. Each `TestApplication` is fully independent: two
//! fixtures never share registries, routers or mocked stores, so tests run
//! concurrently without interference.

use std::sync::Arc;

use trellis_core::{TestConfig, TestServices};
use trellis_http::{
    ActionRegistry, ActionSelector, DefaultInvokerProvider, HttpResult, InvokerFactory, Router,
};

use crate::capture_invoker::RouteTestingInvokerProvider;
use crate::outcome::RouteOutcome;
use crate::request::SimulatedRequest;
use crate::resolver::RouteResolver;
use crate::{TestError, TestResult};

/// A fully wired, self-contained pipeline fixture.
pub struct TestApplication {
    services: Arc<TestServices>,
    router: Arc<Router>,
    resolver: RouteResolver,
}

impl TestApplication {
    pub fn builder() -> TestApplicationBuilder {
        TestApplicationBuilder::new()
    }

    pub fn services(&self) -> &Arc<TestServices> {
        &self.services
    }

    /// Resolve a route without executing the action body.
    pub fn resolve_route(&self, request: &SimulatedRequest) -> TestResult<RouteOutcome> {
        self.resolver
            .resolve(&self.services, self.router.as_ref(), request, false)
    }

    /// Async variant of [`resolve_route`](Self::resolve_route).
    pub async fn resolve_route_async(
        &self,
        request: &SimulatedRequest,
    ) -> TestResult<RouteOutcome> {
        self.resolver
            .resolve_async(&self.services, self.router.as_ref(), request, false)
            .await
    }

    /// Resolve a route and let the real action body run. State is still
    /// captured on the way through.
    pub fn resolve_with_full_execution(
        &self,
        request: &SimulatedRequest,
    ) -> TestResult<RouteOutcome> {
        self.resolver
            .resolve(&self.services, self.router.as_ref(), request, true)
    }

    pub async fn resolve_with_full_execution_async(
        &self,
        request: &SimulatedRequest,
    ) -> TestResult<RouteOutcome> {
        self.resolver
            .resolve_async(&self.services, self.router.as_ref(), request, true)
            .await
    }
}

/// Builder collecting controllers, actions and routes before wiring the
/// container.
pub struct TestApplicationBuilder {
    config: TestConfig,
    registry: ActionRegistry,
    router: Router,
}

impl TestApplicationBuilder {
    pub fn new() -> Self {
        Self {
            config: TestConfig::default(),
            registry: ActionRegistry::new(),
            router: Router::new(),
        }
    }

    pub fn with_config(mut self, config: TestConfig) -> Self {
        self.config = config;
        self
    }

    /// Register controllers, actions and filters.
    pub fn configure_actions<F>(mut self, configure: F) -> TestResult<Self>
    where
        F: FnOnce(&mut ActionRegistry) -> HttpResult<()>,
    {
        configure(&mut self.registry)
            .map_err(|e| TestError::harness(format!("action configuration failed: {}", e)))?;
        Ok(self)
    }

    /// Register route templates.
    pub fn configure_routes<F>(mut self, configure: F) -> TestResult<Self>
    where
        F: FnOnce(&mut Router) -> HttpResult<()>,
    {
        configure(&mut self.router)
            .map_err(|e| TestError::harness(format!("route configuration failed: {}", e)))?;
        Ok(self)
    }

    pub fn build(self) -> TestApplication {
        let registry = Arc::new(self.registry);
        let factory = InvokerFactory::new(registry.clone())
            .with_provider(Arc::new(DefaultInvokerProvider))
            .with_provider(Arc::new(RouteTestingInvokerProvider));

        let services = TestServices::new(self.config);
        services.register(registry);
        services.register(Arc::new(ActionSelector::new()));
        services.register(Arc::new(factory));

        tracing::debug!("test application built");
        TestApplication {
            services: Arc::new(services),
            router: Arc::new(self.router),
            resolver: RouteResolver::new(),
        }
    }
}

impl Default for TestApplicationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::Any;

    use trellis_http::{
        handler, Controller, ControllerActionDescriptor, Method, ParameterDescriptor, Response,
    };

    struct HomeController;

    impl Controller for HomeController {
        fn name(&self) -> &str {
            "Home"
        }
        fn type_name(&self) -> &'static str {
            std::any::type_name::<Self>()
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn app() -> TestApplication {
        TestApplication::builder()
            .configure_actions(|actions| {
                actions.register_controller(Arc::new(HomeController));
                actions.register_action(
                    ControllerActionDescriptor::new(
                        "Home",
                        "Contact",
                        std::any::type_name::<HomeController>(),
                        vec![ParameterDescriptor::int("id")],
                    ),
                    handler(|_args| async move { Ok(Response::ok()) }),
                )?;
                Ok(())
            })
            .unwrap()
            .configure_routes(|routes| {
                routes.route(Method::GET, "/{controller}/{action}/{id:int}")?;
                Ok(())
            })
            .unwrap()
            .build()
    }

    #[test]
    fn builds_and_resolves() {
        let app = app();
        let request = SimulatedRequest::get("/Home/Contact/3").build_request().unwrap();
        let outcome = app.resolve_route(&request).unwrap();
        assert!(outcome.resolved());
    }

    #[test]
    fn fixtures_are_independent() {
        let first = app();
        let second = TestApplication::builder().build();

        let request = SimulatedRequest::get("/Home/Contact/3").build_request().unwrap();
        assert!(first.resolve_route(&request).unwrap().resolved());
        assert!(!second.resolve_route(&request).unwrap().resolved());
    }
}
