//! ServerBuilder for fluent API to build HTTP servers

use super::hello::{ServiceInfo, hello_routes};
use super::resource_registry::ResourceRegistry;
use crate::config::AppConfig;
use crate::core::auth::{AuthProvider, NoAuthProvider, PermissionPolicy};
use crate::core::backend::Backend;
use crate::core::schema::ResourceSchema;
use crate::resource::Resource;
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Builder for creating HTTP servers with auto-registered resource routes
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .with_backend(InMemoryBackend::new())
///     .register_resource("articles", schema)
///     .build()?;
/// ```
pub struct ServerBuilder {
    backend: Option<Arc<dyn Backend>>,
    auth_provider: Arc<dyn AuthProvider>,
    policy: PermissionPolicy,
    info: ServiceInfo,
    schemas: Vec<(String, ResourceSchema)>,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder
    pub fn new() -> Self {
        Self {
            backend: None,
            auth_provider: Arc::new(NoAuthProvider),
            policy: PermissionPolicy::default(),
            info: ServiceInfo::default(),
            schemas: Vec::new(),
            custom_routes: Vec::new(),
        }
    }

    /// Set the storage backend (required)
    pub fn with_backend(mut self, backend: impl Backend + 'static) -> Self {
        self.backend = Some(Arc::new(backend));
        self
    }

    /// Set an already shared storage backend
    pub fn with_shared_backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_auth_provider(mut self, provider: impl AuthProvider + 'static) -> Self {
        self.auth_provider = Arc::new(provider);
        self
    }

    pub fn with_permission_policy(mut self, policy: PermissionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_service_info(mut self, info: ServiceInfo) -> Self {
        self.info = info;
        self
    }

    /// Apply a configuration
    ///
    /// This will:
    /// 1. Use its service description for the hello endpoint
    /// 2. Install its permission policy and auth provider
    /// 3. Register every configured resource
    pub fn with_config(mut self, config: &AppConfig) -> Result<Self> {
        self.info = config.service_info();
        self.policy = config.policy()?;
        self.auth_provider = config.auth_provider()?;

        for resource in &config.resources {
            let schema = resource.to_schema()?;
            self = self.register_resource(&resource.name, schema);
        }

        Ok(self)
    }

    /// Register a resource served at `/{name}` and `/{name}/{id}`
    pub fn register_resource(mut self, name: impl Into<String>, schema: ResourceSchema) -> Self {
        self.schemas.push((name.into(), schema));
        self
    }

    /// Add custom routes to the server
    ///
    /// Use this for endpoints that don't fit the resource pattern, such as
    /// health checks or webhooks.
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Build the resource registry against the configured backend
    pub fn build_registry(&mut self) -> Result<ResourceRegistry> {
        let backend = self
            .backend
            .clone()
            .ok_or_else(|| anyhow::anyhow!("Backend is required. Call .with_backend()"))?;

        for (name, _) in &self.schemas {
            Resource::check_name(name)?;
        }

        let mut registry = ResourceRegistry::new();
        for (name, schema) in self.schemas.drain(..) {
            registry.register(Resource::new(name, schema, backend.clone()));
        }

        Ok(registry)
    }

    /// Build the final router
    ///
    /// This generates:
    /// - The hello route at `/`
    /// - CRUD routes for all registered resources
    /// - Custom routes
    pub fn build(mut self) -> Result<Router> {
        let registry = self.build_registry()?;

        let mut app = hello_routes(self.info)
            .merge(registry.build_routes(self.auth_provider, Arc::new(self.policy)));

        for custom_router in self.custom_routes {
            app = app.merge(custom_router);
        }

        Ok(app.layer(TraceLayer::new_for_http()))
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Bind to the provided address
    /// - Start serving requests
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::FieldDef;
    use crate::storage::InMemoryBackend;

    // ── Constructor tests ────────────────────────────────────────────────

    #[test]
    fn test_new_creates_empty_builder() {
        let builder = ServerBuilder::new();
        assert!(builder.backend.is_none());
        assert!(builder.schemas.is_empty());
        assert!(builder.custom_routes.is_empty());
        assert!(matches!(builder.policy, PermissionPolicy::AllowAll));
    }

    // ── with_backend ─────────────────────────────────────────────────────

    #[test]
    fn test_with_backend_sets_backend() {
        let builder = ServerBuilder::new().with_backend(InMemoryBackend::new());
        assert!(builder.backend.is_some());
    }

    // ── with_config ──────────────────────────────────────────────────────

    #[test]
    fn test_with_config_registers_resources() {
        let mut config = AppConfig::default_config();
        config.permission_policy = "authenticated".to_string();

        let builder = ServerBuilder::new()
            .with_backend(InMemoryBackend::new())
            .with_config(&config)
            .expect("config should apply");
        assert_eq!(builder.schemas.len(), 1);
        assert!(matches!(builder.policy, PermissionPolicy::Authenticated));
    }

    #[test]
    fn test_with_config_invalid_policy_fails() {
        let mut config = AppConfig::default_config();
        config.permission_policy = "nobody".to_string();
        let result = ServerBuilder::new().with_config(&config);
        assert!(result.is_err());
    }

    // ── build ────────────────────────────────────────────────────────────

    #[test]
    fn test_build_registry_without_backend_fails() {
        let result = ServerBuilder::new()
            .register_resource("articles", ResourceSchema::base())
            .build();
        let err_msg = format!("{}", result.err().expect("should be Err"));
        assert!(
            err_msg.contains("Backend is required"),
            "error should mention Backend: {}",
            err_msg
        );
    }

    #[test]
    fn test_build_rejects_unroutable_names() {
        for name in ["", "a/b", "{id}"] {
            let result = ServerBuilder::new()
                .with_backend(InMemoryBackend::new())
                .register_resource(name, ResourceSchema::base())
                .build();
            assert!(result.is_err(), "{:?} should be rejected", name);
        }
    }

    #[test]
    fn test_with_config_rejects_empty_resource_name() {
        let mut config = AppConfig::default_config();
        config.resources[0].name = String::new();
        assert!(ServerBuilder::new().with_config(&config).is_err());
    }

    #[test]
    fn test_build_registry_names() {
        let mut builder = ServerBuilder::new()
            .with_backend(InMemoryBackend::new())
            .register_resource("articles", ResourceSchema::base())
            .register_resource(
                "devices",
                ResourceSchema::base().field(FieldDef::string("label")),
            );
        let registry = builder.build_registry().expect("registry should build");
        assert_eq!(registry.names(), vec!["articles", "devices"]);
    }

    #[test]
    fn test_fluent_chaining_full_pipeline() {
        use axum::routing::get;

        let result = ServerBuilder::new()
            .with_backend(InMemoryBackend::new())
            .with_permission_policy(PermissionPolicy::AuthenticatedWrites)
            .with_auth_provider(NoAuthProvider)
            .with_custom_routes(Router::new().route("/custom", get(|| async { "ok" })))
            .register_resource("articles", ResourceSchema::base())
            .build();
        assert!(result.is_ok(), "full fluent pipeline should succeed");
    }
}
