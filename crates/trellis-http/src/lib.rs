//! # trellis-http
//!
//! The minimal MVC host pipeline the trellis harness drives in-process: pure
//! request/response abstractions, route pattern matching, controller action
//! descriptors, a priority-ordered filter pipeline, model binding, and the
//! action invoker with its explicit invocation-strategy seam.
//!
//! No server is started anywhere in this crate. Requests are constructed by
//! test code and dispatched as plain method calls.

pub mod actions;
pub mod binding;
pub mod errors;
pub mod filters;
pub mod invoker;
pub mod request;
pub mod response;
pub mod routing;

pub use actions::{
    handler, ActionDescriptor, ActionHandler, ActionRegistry, ActionSelector, Controller,
    ControllerActionDescriptor, ParamKind, ParamSource, ParameterDescriptor,
};
pub use binding::{BoundValue, ModelBinder, ModelState};
pub use errors::{HttpError, HttpResult};
pub use filters::{ActionFilter, ExecutedFilter, FilterPipeline, FilterRegistration, FilterScope};
pub use invoker::{
    ActionCacheEntry, ActionContext, ActionInvocationStrategy, ActionInvoker,
    ArgumentCaptureChannel, CacheLookup, DefaultInvokerProvider, ExecuteActionStrategy,
    InvokerFactory, InvokerProvider,
};
pub use request::Request;
pub use response::{Response, ResponseBody};
pub use routing::{RouteData, RouteDataProvider, RouteMatch, Router};

/// HTTP method re-exported from the underlying http types.
pub use axum::http::Method;
/// Status code re-exported from the underlying http types.
pub use axum::http::StatusCode;
