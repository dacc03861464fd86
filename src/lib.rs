//! # readinglist
//!
//! Generic CRUD resources for RESTful APIs: list, create, read, replace,
//! patch and delete records over a pluggable storage backend.
//!
//! ## Features
//!
//! - **Schema validation**: every write is checked field by field, all
//!   errors reported at once
//! - **Timestamps**: `last_modified` is maintained on every write
//! - **Query strings**: `?field=value` filters, `?since=<epoch>` and
//!   `?sort=-last_modified,title`
//! - **Structured errors**: 400/404 bodies listing `{location, field, message}`
//! - **Pluggable storage**: anything implementing [`core::Backend`]
//! - **Configuration-Based**: declare resources in YAML
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use readinglist::prelude::*;
//!
//! let schema = ResourceSchema::base().extend([
//!     FieldDef::string("title").rule(validators::string_length(1, 1024)),
//!     FieldDef::string("url").rule(validators::url()),
//!     FieldDef::boolean("unread").with_default(json!(true)),
//! ]);
//!
//! ServerBuilder::new()
//!     .with_backend(InMemoryBackend::new())
//!     .register_resource("articles", schema)
//!     .serve("127.0.0.1:8000")
//!     .await?;
//! ```

pub mod config;
pub mod core;
pub mod resource;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        Backend, BackendError, Comparison, Direction, FieldDef, FieldKind, Filter, ID_FIELD,
        MODIFIED_FIELD, Record, ResourceError, ResourceSchema, Scope, Sort, TimeStamp,
        ValidationError,
        auth::{AuthContext, AuthProvider, HeaderAuthProvider, NoAuthProvider, Permission, PermissionPolicy},
        schema::validators,
    };

    // === Resources ===
    pub use crate::resource::{
        CollectionBody, CollectionMeta, Operation, Resource, ResourceRequest,
        guards::{exists_or_404, validates_or_400},
    };

    // === Storage ===
    pub use crate::storage::InMemoryBackend;

    // === Config ===
    pub use crate::config::{AppConfig, FieldConfig, HttpConfig, ResourceConfig};

    // === Server ===
    pub use crate::server::{ResourceRegistry, ServerBuilder, ServiceInfo};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use serde_json::{Value, json};

    // === Axum ===
    pub use axum::{Router, routing::get};
}
