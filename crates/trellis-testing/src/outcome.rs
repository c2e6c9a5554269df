//! Structured route-resolution outcomes.
//!
//! One resolution attempt produces exactly one [`RouteOutcome`]. The enum
//! shape guarantees the all-or-nothing contract: a resolved outcome always
//! carries the full set of action details, an unresolved one only the failure
//! reason and whatever model state accumulated before the attempt stopped.

use std::collections::HashMap;

use trellis_http::{BoundValue, FilterScope, ModelState, ParamKind};

/// A bound argument together with its declared parameter type.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentInfo {
    pub value: BoundValue,
    pub declared_type: ParamKind,
}

impl ArgumentInfo {
    pub fn new(value: BoundValue, declared_type: ParamKind) -> Self {
        Self {
            value,
            declared_type,
        }
    }
}

/// Identifying facts about a filter that ran before resolution stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterDiagnostic {
    pub name: String,
    pub order: i32,
    pub scope: FilterScope,
}

impl std::fmt::Display for FilterDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (order {}, {} scope)", self.name, self.order, self.scope)
    }
}

/// Why a resolution attempt did not produce action details.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveFailure {
    /// Route-data resolution itself failed.
    RoutingError { message: String },
    /// Action selection raised an error (e.g. an ambiguous candidate set).
    SelectionError { message: String },
    /// Routing and selection ran but no action matched.
    NoMatch,
    /// The invocation pipeline failed with an error.
    InvocationError { message: String },
    /// A filter stopped the pipeline before the action was reached.
    /// Diagnostics list every executed filter, highest order first.
    FilterShortCircuit { filters: Vec<FilterDiagnostic> },
}

impl std::fmt::Display for ResolveFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveFailure::RoutingError { message } => {
                write!(f, "exception during route-data resolution: {}", message)
            }
            ResolveFailure::SelectionError { message } => {
                write!(f, "exception during action selection: {}", message)
            }
            ResolveFailure::NoMatch => write!(f, "action could not be matched"),
            ResolveFailure::InvocationError { message } => {
                write!(f, "exception during pipeline invocation: {}", message)
            }
            ResolveFailure::FilterShortCircuit { filters } => {
                let list = filters
                    .iter()
                    .map(|d| d.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(
                    f,
                    "action could not be invoked because of the declared filters: {}",
                    list
                )
            }
        }
    }
}

/// The structured result of driving one simulated request through the
/// pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    Resolved {
        controller_type_name: String,
        controller_name: String,
        action_name: String,
        bound_arguments: HashMap<String, ArgumentInfo>,
        route_data: HashMap<String, String>,
        model_state: ModelState,
    },
    Unresolved {
        reason: ResolveFailure,
        model_state: ModelState,
    },
}

impl RouteOutcome {
    pub fn resolved(&self) -> bool {
        matches!(self, RouteOutcome::Resolved { .. })
    }

    pub fn failure_reason(&self) -> Option<&ResolveFailure> {
        match self {
            RouteOutcome::Unresolved { reason, .. } => Some(reason),
            RouteOutcome::Resolved { .. } => None,
        }
    }

    pub fn controller_name(&self) -> Option<&str> {
        match self {
            RouteOutcome::Resolved {
                controller_name, ..
            } => Some(controller_name),
            RouteOutcome::Unresolved { .. } => None,
        }
    }

    pub fn action_name(&self) -> Option<&str> {
        match self {
            RouteOutcome::Resolved { action_name, .. } => Some(action_name),
            RouteOutcome::Unresolved { .. } => None,
        }
    }

    pub fn bound_arguments(&self) -> Option<&HashMap<String, ArgumentInfo>> {
        match self {
            RouteOutcome::Resolved {
                bound_arguments, ..
            } => Some(bound_arguments),
            RouteOutcome::Unresolved { .. } => None,
        }
    }

    pub fn argument(&self, name: &str) -> Option<&ArgumentInfo> {
        self.bound_arguments().and_then(|args| args.get(name))
    }

    pub fn route_data(&self) -> Option<&HashMap<String, String>> {
        match self {
            RouteOutcome::Resolved { route_data, .. } => Some(route_data),
            RouteOutcome::Unresolved { .. } => None,
        }
    }

    pub fn model_state(&self) -> &ModelState {
        match self {
            RouteOutcome::Resolved { model_state, .. } => model_state,
            RouteOutcome::Unresolved { model_state, .. } => model_state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_short_circuit_message_lists_filters() {
        let reason = ResolveFailure::FilterShortCircuit {
            filters: vec![
                FilterDiagnostic {
                    name: "RequireAuth".to_string(),
                    order: 10,
                    scope: FilterScope::Controller,
                },
                FilterDiagnostic {
                    name: "Audit".to_string(),
                    order: -5,
                    scope: FilterScope::Global,
                },
            ],
        };

        assert_eq!(
            reason.to_string(),
            "action could not be invoked because of the declared filters: \
             RequireAuth (order 10, controller scope), Audit (order -5, global scope)"
        );
    }

    #[test]
    fn no_match_message() {
        assert_eq!(
            ResolveFailure::NoMatch.to_string(),
            "action could not be matched"
        );
    }

    #[test]
    fn resolved_outcome_accessors() {
        let mut args = HashMap::new();
        args.insert(
            "id".to_string(),
            ArgumentInfo::new(BoundValue::Int(1), ParamKind::Int),
        );
        let outcome = RouteOutcome::Resolved {
            controller_type_name: "HomeController".to_string(),
            controller_name: "Home".to_string(),
            action_name: "Contact".to_string(),
            bound_arguments: args,
            route_data: HashMap::new(),
            model_state: ModelState::new(),
        };

        assert!(outcome.resolved());
        assert_eq!(outcome.controller_name(), Some("Home"));
        assert_eq!(outcome.action_name(), Some("Contact"));
        assert_eq!(
            outcome.argument("id").unwrap().value,
            BoundValue::Int(1)
        );
        assert!(outcome.failure_reason().is_none());
    }

    #[test]
    fn unresolved_outcome_hides_action_details() {
        let outcome = RouteOutcome::Unresolved {
            reason: ResolveFailure::NoMatch,
            model_state: ModelState::new(),
        };
        assert!(!outcome.resolved());
        assert!(outcome.controller_name().is_none());
        assert!(outcome.bound_arguments().is_none());
        assert_eq!(outcome.failure_reason(), Some(&ResolveFailure::NoMatch));
    }
}
