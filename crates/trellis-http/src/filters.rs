//! Action filters and the filter pipeline.
//!
//! Filters run global -> controller -> action, ordered by ascending priority
//! value. A filter short-circuits the pipeline by setting the context result;
//! everything after it (including the terminal invocation strategy) is
//! skipped. Every filter that actually ran is recorded for diagnostics.

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::HttpResult;
use crate::invoker::ActionContext;

/// Where a filter was registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FilterScope {
    Global,
    Controller,
    Action,
}

impl std::fmt::Display for FilterScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterScope::Global => write!(f, "global"),
            FilterScope::Controller => write!(f, "controller"),
            FilterScope::Action => write!(f, "action"),
        }
    }
}

/// A filter running before the action body. Setting `ctx.result` prevents
/// later filters and the terminal strategy from running.
#[async_trait]
pub trait ActionFilter: Send + Sync {
    /// Execution priority. Lower values run earlier.
    fn order(&self) -> i32 {
        0
    }

    fn name(&self) -> &'static str {
        "ActionFilter"
    }

    async fn on_action_executing(&self, ctx: &mut ActionContext) -> HttpResult<()>;
}

/// A filter plus the scope it was registered at.
#[derive(Clone)]
pub struct FilterRegistration {
    pub filter: Arc<dyn ActionFilter>,
    pub scope: FilterScope,
}

impl FilterRegistration {
    pub fn new(filter: Arc<dyn ActionFilter>, scope: FilterScope) -> Self {
        Self { filter, scope }
    }
}

impl std::fmt::Debug for FilterRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterRegistration")
            .field("name", &self.filter.name())
            .field("order", &self.filter.order())
            .field("scope", &self.scope)
            .finish()
    }
}

/// Record of a filter that actually executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedFilter {
    pub name: String,
    pub order: i32,
    pub scope: FilterScope,
}

/// Ordered filter pipeline for one action.
#[derive(Debug, Default, Clone)]
pub struct FilterPipeline {
    filters: Vec<FilterRegistration>,
}

impl FilterPipeline {
    /// Assemble and sort the pipeline from per-scope filter lists.
    pub fn assemble(
        global: Vec<Arc<dyn ActionFilter>>,
        controller: Vec<Arc<dyn ActionFilter>>,
        action: Vec<Arc<dyn ActionFilter>>,
    ) -> Self {
        let mut filters: Vec<FilterRegistration> = global
            .into_iter()
            .map(|f| FilterRegistration::new(f, FilterScope::Global))
            .chain(
                controller
                    .into_iter()
                    .map(|f| FilterRegistration::new(f, FilterScope::Controller)),
            )
            .chain(
                action
                    .into_iter()
                    .map(|f| FilterRegistration::new(f, FilterScope::Action)),
            )
            .collect();

        filters.sort_by_key(|reg| (reg.filter.order(), reg.scope));
        Self { filters }
    }

    /// Append a filter and restore ordering. Used to pin the harness
    /// interceptor at the end of the chain.
    pub fn with_appended(mut self, registration: FilterRegistration) -> Self {
        self.filters.push(registration);
        self.filters.sort_by_key(|reg| (reg.filter.order(), reg.scope));
        self
    }

    pub fn filters(&self) -> &[FilterRegistration] {
        &self.filters
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Run filters in order until one short-circuits or the chain ends.
    pub async fn run(&self, ctx: &mut ActionContext) -> HttpResult<()> {
        for registration in &self.filters {
            if ctx.result.is_some() {
                break;
            }

            tracing::debug!(
                filter = registration.filter.name(),
                order = registration.filter.order(),
                scope = %registration.scope,
                "running action filter"
            );
            ctx.executed_filters.push(ExecutedFilter {
                name: registration.filter.name().to_string(),
                order: registration.filter.order(),
                scope: registration.scope,
            });
            registration.filter.on_action_executing(ctx).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{ControllerActionDescriptor, Controller};
    use crate::response::Response;
    use std::any::Any;

    struct NullController;

    impl Controller for NullController {
        fn name(&self) -> &str {
            "Null"
        }
        fn type_name(&self) -> &'static str {
            std::any::type_name::<Self>()
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn context() -> ActionContext {
        use axum::http::{HeaderMap, Method};
        ActionContext::new(
            crate::request::Request::new(Method::GET, "/".parse().unwrap(), HeaderMap::new()),
            crate::routing::RouteData::new(),
            Arc::new(ControllerActionDescriptor::new(
                "Null",
                "Index",
                std::any::type_name::<NullController>(),
                vec![],
            )),
            Arc::new(NullController),
        )
    }

    struct Ordered(&'static str, i32);

    #[async_trait]
    impl ActionFilter for Ordered {
        fn order(&self) -> i32 {
            self.1
        }
        fn name(&self) -> &'static str {
            self.0
        }
        async fn on_action_executing(&self, _ctx: &mut ActionContext) -> HttpResult<()> {
            Ok(())
        }
    }

    struct Blocking;

    #[async_trait]
    impl ActionFilter for Blocking {
        fn order(&self) -> i32 {
            5
        }
        fn name(&self) -> &'static str {
            "Blocking"
        }
        async fn on_action_executing(&self, ctx: &mut ActionContext) -> HttpResult<()> {
            ctx.result = Some(Response::unauthorized());
            Ok(())
        }
    }

    #[tokio::test]
    async fn filters_run_in_ascending_order() {
        let pipeline = FilterPipeline::assemble(
            vec![Arc::new(Ordered("second", 10))],
            vec![Arc::new(Ordered("first", -10))],
            vec![Arc::new(Ordered("third", 20))],
        );

        let mut ctx = context();
        pipeline.run(&mut ctx).await.unwrap();

        let names: Vec<_> = ctx.executed_filters.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn equal_order_breaks_ties_by_scope() {
        let pipeline = FilterPipeline::assemble(
            vec![Arc::new(Ordered("global", 0))],
            vec![Arc::new(Ordered("controller", 0))],
            vec![Arc::new(Ordered("action", 0))],
        );

        let mut ctx = context();
        pipeline.run(&mut ctx).await.unwrap();

        let scopes: Vec<_> = ctx.executed_filters.iter().map(|f| f.scope).collect();
        assert_eq!(
            scopes,
            vec![FilterScope::Global, FilterScope::Controller, FilterScope::Action]
        );
    }

    #[tokio::test]
    async fn short_circuit_stops_the_chain() {
        let pipeline = FilterPipeline::assemble(
            vec![Arc::new(Ordered("before", 0))],
            vec![],
            vec![Arc::new(Blocking), Arc::new(Ordered("after", 100))],
        );

        let mut ctx = context();
        pipeline.run(&mut ctx).await.unwrap();

        let names: Vec<_> = ctx.executed_filters.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["before", "Blocking"]);
        assert!(ctx.result.is_some());
    }
}
