//! Controller action descriptors, the action registry, and action selection.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::binding::BoundValue;
use crate::errors::{HttpError, HttpResult};
use crate::filters::ActionFilter;
use crate::response::Response;
use crate::routing::RouteData;

/// Declared type of an action parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Int,
    Float,
    Bool,
    Uuid,
    Json,
}

impl ParamKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            ParamKind::String => "String",
            ParamKind::Int => "i64",
            ParamKind::Float => "f64",
            ParamKind::Bool => "bool",
            ParamKind::Uuid => "Uuid",
            ParamKind::Json => "Json",
        }
    }
}

/// Where a parameter's value is bound from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSource {
    /// Route data, then query, then form.
    Auto,
    Route,
    Query,
    Form,
    Body,
}

/// One bound parameter of a controller action.
#[derive(Debug, Clone)]
pub struct ParameterDescriptor {
    pub name: String,
    pub kind: ParamKind,
    pub source: ParamSource,
}

impl ParameterDescriptor {
    pub fn new(name: impl Into<String>, kind: ParamKind, source: ParamSource) -> Self {
        Self {
            name: name.into(),
            kind,
            source,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::String, ParamSource::Auto)
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Int, ParamSource::Auto)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Float, ParamSource::Auto)
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Bool, ParamSource::Auto)
    }

    pub fn uuid(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Uuid, ParamSource::Auto)
    }

    pub fn json_body(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Json, ParamSource::Body)
    }

    pub fn from_source(self, source: ParamSource) -> Self {
        Self { source, ..self }
    }
}

/// Descriptor of a controller action: the unit routing resolves to.
#[derive(Debug, Clone)]
pub struct ControllerActionDescriptor {
    /// Stable id, `Controller::Action`.
    pub id: String,
    pub controller_name: String,
    pub action_name: String,
    pub controller_type_name: String,
    pub parameters: Vec<ParameterDescriptor>,
}

impl ControllerActionDescriptor {
    pub fn new(
        controller_name: impl Into<String>,
        action_name: impl Into<String>,
        controller_type_name: impl Into<String>,
        parameters: Vec<ParameterDescriptor>,
    ) -> Self {
        let controller_name = controller_name.into();
        let action_name = action_name.into();
        Self {
            id: format!("{}::{}", controller_name, action_name),
            controller_name,
            action_name,
            controller_type_name: controller_type_name.into(),
            parameters,
        }
    }

    pub fn has_parameters(&self) -> bool {
        !self.parameters.is_empty()
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterDescriptor> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// Descriptor kinds the selection service can return. The resolver only
/// accepts controller actions; anything else is a host misconfiguration.
#[derive(Debug, Clone)]
pub enum ActionDescriptor {
    ControllerAction(Arc<ControllerActionDescriptor>),
    /// A bare endpoint with no controller semantics.
    RawEndpoint { id: String },
}

impl ActionDescriptor {
    pub fn id(&self) -> &str {
        match self {
            ActionDescriptor::ControllerAction(descriptor) => &descriptor.id,
            ActionDescriptor::RawEndpoint { id } => id,
        }
    }

    pub fn as_controller_action(&self) -> Option<&Arc<ControllerActionDescriptor>> {
        match self {
            ActionDescriptor::ControllerAction(descriptor) => Some(descriptor),
            ActionDescriptor::RawEndpoint { .. } => None,
        }
    }
}

/// A controller instance. Instances are registered per fixture and stay alive
/// after invocation so assertions can still inspect them.
pub trait Controller: Send + Sync {
    fn name(&self) -> &str;
    fn type_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
}

pub type HandlerFuture = Pin<Box<dyn Future<Output = HttpResult<Response>> + Send>>;

/// The terminal action body, called with the bound arguments.
pub type ActionHandler =
    Arc<dyn Fn(HashMap<String, BoundValue>) -> HandlerFuture + Send + Sync>;

/// Wrap an async closure as an [`ActionHandler`].
pub fn handler<F, Fut>(f: F) -> ActionHandler
where
    F: Fn(HashMap<String, BoundValue>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HttpResult<Response>> + Send + 'static,
{
    Arc::new(move |args| Box::pin(f(args)))
}

struct RegisteredAction {
    descriptor: ActionDescriptor,
    handler: ActionHandler,
    filters: Vec<Arc<dyn ActionFilter>>,
}

/// Registry of controllers, actions, and filters for one fixture.
#[derive(Default)]
pub struct ActionRegistry {
    controllers: HashMap<String, Arc<dyn Controller>>,
    actions: HashMap<String, RegisteredAction>,
    controller_filters: HashMap<String, Vec<Arc<dyn ActionFilter>>>,
    global_filters: Vec<Arc<dyn ActionFilter>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_controller(&mut self, controller: Arc<dyn Controller>) {
        self.controllers
            .insert(controller.name().to_string(), controller);
    }

    /// Register a controller action. The owning controller must be registered
    /// first.
    pub fn register_action(
        &mut self,
        descriptor: ControllerActionDescriptor,
        handler: ActionHandler,
    ) -> HttpResult<Arc<ControllerActionDescriptor>> {
        if !self.controllers.contains_key(&descriptor.controller_name) {
            return Err(HttpError::invalid_descriptor(format!(
                "controller '{}' is not registered",
                descriptor.controller_name
            )));
        }

        let descriptor = Arc::new(descriptor);
        self.actions.insert(
            descriptor.id.clone(),
            RegisteredAction {
                descriptor: ActionDescriptor::ControllerAction(descriptor.clone()),
                handler,
                filters: Vec::new(),
            },
        );
        Ok(descriptor)
    }

    /// Register a bare endpoint with no controller semantics.
    pub fn register_raw_endpoint(&mut self, id: impl Into<String>, handler: ActionHandler) {
        let id = id.into();
        self.actions.insert(
            id.clone(),
            RegisteredAction {
                descriptor: ActionDescriptor::RawEndpoint { id },
                handler,
                filters: Vec::new(),
            },
        );
    }

    pub fn add_global_filter(&mut self, filter: Arc<dyn ActionFilter>) {
        self.global_filters.push(filter);
    }

    pub fn add_controller_filter(
        &mut self,
        controller_name: impl Into<String>,
        filter: Arc<dyn ActionFilter>,
    ) {
        self.controller_filters
            .entry(controller_name.into())
            .or_default()
            .push(filter);
    }

    pub fn add_action_filter(
        &mut self,
        action_id: &str,
        filter: Arc<dyn ActionFilter>,
    ) -> HttpResult<()> {
        let action = self.actions.get_mut(action_id).ok_or_else(|| {
            HttpError::invalid_descriptor(format!("action '{}' is not registered", action_id))
        })?;
        action.filters.push(filter);
        Ok(())
    }

    pub fn controller(&self, name: &str) -> Option<Arc<dyn Controller>> {
        self.controllers.get(name).cloned()
    }

    pub fn handler(&self, action_id: &str) -> Option<ActionHandler> {
        self.actions.get(action_id).map(|a| a.handler.clone())
    }

    pub fn descriptor(&self, action_id: &str) -> Option<&ActionDescriptor> {
        self.actions.get(action_id).map(|a| &a.descriptor)
    }

    /// Filters applying to an action, grouped by scope. Ordering within and
    /// across scopes is the pipeline's concern.
    pub fn filters_for(
        &self,
        descriptor: &ControllerActionDescriptor,
    ) -> (
        Vec<Arc<dyn ActionFilter>>,
        Vec<Arc<dyn ActionFilter>>,
        Vec<Arc<dyn ActionFilter>>,
    ) {
        let global = self.global_filters.clone();
        let controller = self
            .controller_filters
            .get(&descriptor.controller_name)
            .cloned()
            .unwrap_or_default();
        let action = self
            .actions
            .get(&descriptor.id)
            .map(|a| a.filters.clone())
            .unwrap_or_default();
        (global, controller, action)
    }

    fn controller_actions(&self) -> impl Iterator<Item = &Arc<ControllerActionDescriptor>> {
        self.actions
            .values()
            .filter_map(|a| a.descriptor.as_controller_action())
    }
}

/// Picks the best-matching action descriptor for resolved route data.
#[derive(Debug, Default)]
pub struct ActionSelector;

impl ActionSelector {
    pub fn new() -> Self {
        Self
    }

    /// Select the best-matching action descriptor.
    ///
    /// Router-supplied candidates (attribute routes) win outright. An
    /// `endpoint` route value selects a raw endpoint by id. Otherwise the
    /// `controller`/`action` route values are matched case-insensitively
    /// against the registry. No match is `Ok(None)`; more than one match is an
    /// ambiguity error.
    pub fn select_best(
        &self,
        registry: &ActionRegistry,
        route_data: &RouteData,
        candidates: &[Arc<ControllerActionDescriptor>],
    ) -> HttpResult<Option<ActionDescriptor>> {
        if let Some(candidate) = candidates.first() {
            tracing::debug!(action = %candidate.id, "selected pre-computed route candidate");
            return Ok(Some(ActionDescriptor::ControllerAction(candidate.clone())));
        }

        if let Some(endpoint) = route_data.get_ignore_case("endpoint") {
            return Ok(registry.descriptor(endpoint).cloned());
        }

        let controller = match route_data.get_ignore_case("controller") {
            Some(controller) => controller,
            None => return Ok(None),
        };
        let action = match route_data.get_ignore_case("action") {
            Some(action) => action,
            None => return Ok(None),
        };

        let matches: Vec<_> = registry
            .controller_actions()
            .filter(|descriptor| {
                descriptor.controller_name.eq_ignore_ascii_case(controller)
                    && descriptor.action_name.eq_ignore_ascii_case(action)
            })
            .cloned()
            .collect();

        match matches.len() {
            0 => Ok(None),
            1 => {
                tracing::debug!(action = %matches[0].id, "selected action");
                let descriptor = matches.into_iter().next().expect("len checked");
                Ok(Some(ActionDescriptor::ControllerAction(descriptor)))
            }
            _ => {
                let ids: Vec<_> = matches.iter().map(|d| d.id.clone()).collect();
                Err(HttpError::ambiguous(format!(
                    "multiple actions match '{}/{}': {}",
                    controller,
                    action,
                    ids.join(", ")
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn ok_handler() -> ActionHandler {
        handler(|_args| async { Ok(Response::ok()) })
    }

    fn registry_with_contact() -> (ActionRegistry, Arc<ControllerActionDescriptor>) {
        let mut registry = ActionRegistry::new();
        registry.register_controller(Arc::new(HomeController));
        let descriptor = registry
            .register_action(
                ControllerActionDescriptor::new(
                    "Home",
                    "Contact",
                    std::any::type_name::<HomeController>(),
                    vec![ParameterDescriptor::int("id")],
                ),
                ok_handler(),
            )
            .unwrap();
        (registry, descriptor)
    }

    #[test]
    fn selection_matches_case_insensitively() {
        let (registry, descriptor) = registry_with_contact();
        let mut route_data = RouteData::new();
        route_data.insert("controller", "home");
        route_data.insert("action", "CONTACT");

        let selected = ActionSelector::new()
            .select_best(&registry, &route_data, &[])
            .unwrap()
            .unwrap();
        assert_eq!(selected.id(), descriptor.id);
    }

    #[test]
    fn selection_without_controller_key_is_no_match() {
        let (registry, _) = registry_with_contact();
        let route_data = RouteData::new();

        let selected = ActionSelector::new()
            .select_best(&registry, &route_data, &[])
            .unwrap();
        assert!(selected.is_none());
    }

    #[test]
    fn candidates_win_over_route_values() {
        let (registry, descriptor) = registry_with_contact();
        let mut route_data = RouteData::new();
        route_data.insert("controller", "Other");
        route_data.insert("action", "Missing");

        let selected = ActionSelector::new()
            .select_best(&registry, &route_data, &[descriptor.clone()])
            .unwrap()
            .unwrap();
        assert_eq!(selected.id(), descriptor.id);
    }

    #[test]
    fn endpoint_route_value_selects_raw_endpoints() {
        let (mut registry, _) = registry_with_contact();
        registry.register_raw_endpoint("health", ok_handler());

        let mut route_data = RouteData::new();
        route_data.insert("endpoint", "health");

        let selected = ActionSelector::new()
            .select_best(&registry, &route_data, &[])
            .unwrap()
            .unwrap();
        assert!(matches!(selected, ActionDescriptor::RawEndpoint { .. }));
    }

    #[test]
    fn ambiguous_match_is_an_error() {
        let (mut registry, _) = registry_with_contact();
        // Same pair under a differently-cased id.
        registry
            .register_action(
                ControllerActionDescriptor::new(
                    "Home",
                    "contact",
                    std::any::type_name::<HomeController>(),
                    vec![],
                ),
                ok_handler(),
            )
            .unwrap();

        let mut route_data = RouteData::new();
        route_data.insert("controller", "Home");
        route_data.insert("action", "Contact");

        let err = ActionSelector::new()
            .select_best(&registry, &route_data, &[])
            .unwrap_err();
        assert!(matches!(err, HttpError::AmbiguousMatch { .. }));
    }

    #[test]
    fn action_registration_requires_controller() {
        let mut registry = ActionRegistry::new();
        let result = registry.register_action(
            ControllerActionDescriptor::new("Ghost", "Index", "tests::Ghost", vec![]),
            ok_handler(),
        );
        assert!(matches!(result, Err(HttpError::InvalidDescriptor { .. })));
    }
}
