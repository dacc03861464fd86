//! Core module containing the schema, query and storage contracts

pub mod auth;
pub mod backend;
pub mod error;
pub mod query;
pub mod schema;

pub use auth::{AuthContext, AuthProvider, HeaderAuthProvider, NoAuthProvider, Permission, PermissionPolicy};
pub use backend::{Backend, Scope};
pub use error::{BackendError, ConfigError, ResourceError, ValidationError};
pub use query::{Comparison, Direction, Filter, Sort};
pub use schema::{FieldDef, FieldKind, ResourceSchema, TimeStamp};

/// One resource instance, fields in insertion order
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Field holding the record identifier
pub const ID_FIELD: &str = "id";

/// Field holding the epoch second of the last write
pub const MODIFIED_FIELD: &str = "last_modified";
