//! Server module for building HTTP servers with auto-registered routes
//!
//! This module provides a `ServerBuilder` that registers:
//! - CRUD routes for every resource
//! - The hello route describing the service
//! - Custom routes supplied by the application

pub mod builder;
pub mod hello;
pub mod resource_registry;
pub mod router;

pub use builder::ServerBuilder;
pub use hello::{HelloResponse, ServiceInfo};
pub use resource_registry::ResourceRegistry;
pub use router::{ResourceState, build_resource_routes};
