//! Registry of the resources served by the application

use super::router::{ResourceState, build_resource_routes};
use crate::core::auth::{AuthProvider, PermissionPolicy};
use crate::resource::Resource;
use axum::Router;
use indexmap::IndexMap;
use std::sync::Arc;

/// Registry for all resources in the application
///
/// Resources are keyed by name; registering a name twice replaces the
/// earlier resource. Routes are built in registration order.
#[derive(Default)]
pub struct ResourceRegistry {
    resources: IndexMap<String, Arc<Resource>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource under its name
    pub fn register(&mut self, resource: Resource) {
        tracing::info!(resource = resource.name(), "Registered resource");
        self.resources
            .insert(resource.name().to_string(), Arc::new(resource));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Resource>> {
        self.resources.get(name)
    }

    /// Names of the registered resources
    pub fn names(&self) -> Vec<&str> {
        self.resources.keys().map(|s| s.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Build a router with the routes of every registered resource
    pub fn build_routes(
        &self,
        auth_provider: Arc<dyn AuthProvider>,
        policy: Arc<PermissionPolicy>,
    ) -> Router {
        self.resources
            .values()
            .fold(Router::new(), |router, resource| {
                router.merge(build_resource_routes(ResourceState {
                    resource: resource.clone(),
                    auth_provider: auth_provider.clone(),
                    policy: policy.clone(),
                }))
            })
    }
}
