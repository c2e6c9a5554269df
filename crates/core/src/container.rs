//! Per-fixture service container.
//!
//! `TestServices` is constructed once per test fixture and passed explicitly to
//! every resolution call. Nothing here is process-global: two fixtures hold two
//! independent containers, so mocked-pipeline tests can run concurrently.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use thiserror::Error;

use crate::config::TestConfig;

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("Service not found: {service}")]
    ServiceNotFound { service: String },

    #[error("Service registry poisoned: {message}")]
    RegistryPoisoned { message: String },
}

/// Container for the services a test fixture wires up: the pipeline's action
/// registry, routers, mocked ambient stores, and anything user tests register.
///
/// Services are keyed by type. Registration replaces any previous instance of
/// the same type.
pub struct TestServices {
    config: Arc<TestConfig>,
    registry: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl TestServices {
    pub fn new(config: TestConfig) -> Self {
        Self {
            config: Arc::new(config),
            registry: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> Arc<TestConfig> {
        self.config.clone()
    }

    /// Register a service instance, replacing any existing one of the same type.
    pub fn register<T: Any + Send + Sync>(&self, service: Arc<T>) {
        let mut registry = self
            .registry
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        registry.insert(TypeId::of::<T>(), service);
    }

    /// Resolve a service by type.
    pub fn resolve<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        let registry = self
            .registry
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        registry
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|service| service.downcast::<T>().ok())
    }

    /// Resolve a service by type, failing with a descriptive error.
    pub fn require<T: Any + Send + Sync>(&self) -> Result<Arc<T>, ContainerError> {
        self.resolve::<T>().ok_or_else(|| {
            tracing::warn!(service = type_name::<T>(), "service not registered");
            ContainerError::ServiceNotFound {
                service: type_name::<T>().to_string(),
            }
        })
    }

    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        let registry = self
            .registry
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        registry.contains_key(&TypeId::of::<T>())
    }
}

impl Default for TestServices {
    fn default() -> Self {
        Self::new(TestConfig::default())
    }
}

impl std::fmt::Debug for TestServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self
            .registry
            .read()
            .map(|registry| registry.len())
            .unwrap_or(0);
        f.debug_struct("TestServices")
            .field("config", &self.config)
            .field("services", &count)
            .finish()
    }
}
