//! Startup-time service registry and controller resolution.
//!
//! Controllers declare their dependencies in [`Injectable::inject`] by asking
//! the registry for each one. A dependency that was never registered comes
//! back as `None` and the controller is still constructed; it has to cope
//! with the gap at request time.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::response::Response;

use super::RouteRequest;

// ---

/// Type-keyed map of shared services.
#[derive(Default)]
pub struct ServiceRegistry {
    services: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl ServiceRegistry {
    // ---
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `service` under its concrete type, replacing any previous one.
    pub fn register<T: Send + Sync + 'static>(&mut self, service: Arc<T>) -> &mut Self {
        self.services.insert(TypeId::of::<T>(), service);
        self
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        // ---
        let service = self.services.get(&TypeId::of::<T>())?.clone();
        service.downcast::<T>().ok()
    }
}

/// Construction from registered services.
pub trait Injectable: Sized + Send + Sync + 'static {
    fn inject(services: &ServiceRegistry) -> Self;
}

/// A handler object exposing named actions.
#[async_trait]
pub trait Controller: Send + Sync + 'static {
    async fn call(&self, action: &str, request: RouteRequest) -> Response;
}

/// A registered instance wins; otherwise build one through [`Injectable`].
pub(crate) fn resolve<C>(services: &ServiceRegistry) -> Arc<C>
where
    C: Controller + Injectable,
{
    services
        .get::<C>()
        .unwrap_or_else(|| Arc::new(C::inject(services)))
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    struct Greeting(&'static str);

    #[test]
    fn test_get_returns_registered_instance() {
        // ---
        let mut services = ServiceRegistry::new();
        let greeting = Arc::new(Greeting("hello"));
        services.register(greeting.clone());

        let resolved = services.get::<Greeting>().unwrap();
        assert!(Arc::ptr_eq(&resolved, &greeting));
        assert_eq!(resolved.0, "hello");
    }

    #[test]
    fn test_missing_service_is_none() {
        // ---
        let services = ServiceRegistry::new();
        assert!(services.get::<Greeting>().is_none());
    }

    #[test]
    fn test_register_replaces() {
        // ---
        let mut services = ServiceRegistry::new();
        services
            .register(Arc::new(Greeting("first")))
            .register(Arc::new(Greeting("second")));

        assert_eq!(services.get::<Greeting>().unwrap().0, "second");
    }
}
