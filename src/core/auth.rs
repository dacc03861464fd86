//! Identity and permission declarations for resource operations
//!
//! Resources only declare which [`Permission`] each operation needs.
//! Resolving who is calling is the job of an [`AuthProvider`], and deciding
//! whether that caller holds the permission is the job of a
//! [`PermissionPolicy`]. Both are plugged into the server builder.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderName};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Permission level required by an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// Listing and reading records
    ReadOnly,
    /// Creating, replacing, patching and deleting records
    ReadWrite,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Permission::ReadOnly => f.write_str("readonly"),
            Permission::ReadWrite => f.write_str("readwrite"),
        }
    }
}

/// Authorization context extracted from a request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthContext {
    /// Authenticated user
    User { user_id: String },

    /// No authentication (public access)
    #[default]
    Anonymous,
}

impl AuthContext {
    pub fn user(user_id: impl Into<String>) -> Self {
        AuthContext::User {
            user_id: user_id.into(),
        }
    }

    /// Get user_id if available
    pub fn user_id(&self) -> Option<&str> {
        match self {
            AuthContext::User { user_id } => Some(user_id),
            AuthContext::Anonymous => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !matches!(self, AuthContext::Anonymous)
    }
}

/// Decides whether a caller holds a permission
#[derive(Debug, Clone)]
pub enum PermissionPolicy {
    /// Every operation is allowed, even anonymously
    AllowAll,

    /// Reads are public, writes need an authenticated user
    AuthenticatedWrites,

    /// Every operation needs an authenticated user
    Authenticated,

    /// Custom policy function
    Custom(fn(&AuthContext, Permission) -> bool),
}

impl Default for PermissionPolicy {
    fn default() -> Self {
        PermissionPolicy::AllowAll
    }
}

impl PermissionPolicy {
    /// Check if auth context holds `permission` under this policy
    pub fn check(&self, context: &AuthContext, permission: Permission) -> bool {
        match self {
            PermissionPolicy::AllowAll => true,

            PermissionPolicy::AuthenticatedWrites => {
                permission == Permission::ReadOnly || context.is_authenticated()
            }

            PermissionPolicy::Authenticated => context.is_authenticated(),

            PermissionPolicy::Custom(f) => f(context, permission),
        }
    }

    /// Parse policy from string (for YAML config)
    pub fn parse_policy(s: &str) -> Option<Self> {
        match s {
            "allow_all" => Some(PermissionPolicy::AllowAll),
            "authenticated_writes" => Some(PermissionPolicy::AuthenticatedWrites),
            "authenticated" => Some(PermissionPolicy::Authenticated),
            _ => None,
        }
    }
}

/// Trait for auth providers
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Extract auth context from the request headers
    async fn extract_context(&self, headers: &HeaderMap) -> Result<AuthContext>;
}

/// Default no-auth provider (for development)
pub struct NoAuthProvider;

#[async_trait]
impl AuthProvider for NoAuthProvider {
    async fn extract_context(&self, _headers: &HeaderMap) -> Result<AuthContext> {
        Ok(AuthContext::Anonymous)
    }
}

/// Trusts a header set by an upstream authenticating proxy
///
/// The header value is taken as the user id; requests without the header
/// are anonymous.
pub struct HeaderAuthProvider {
    header: HeaderName,
}

impl HeaderAuthProvider {
    pub fn new(header: HeaderName) -> Self {
        Self { header }
    }
}

impl Default for HeaderAuthProvider {
    fn default() -> Self {
        Self::new(HeaderName::from_static("x-user-id"))
    }
}

#[async_trait]
impl AuthProvider for HeaderAuthProvider {
    async fn extract_context(&self, headers: &HeaderMap) -> Result<AuthContext> {
        let Some(value) = headers.get(&self.header) else {
            return Ok(AuthContext::Anonymous);
        };

        let user_id = value
            .to_str()
            .map_err(|e| anyhow!("Invalid {} header: {}", self.header, e))?
            .trim();

        if user_id.is_empty() {
            Ok(AuthContext::Anonymous)
        } else {
            Ok(AuthContext::user(user_id))
        }
    }
}
