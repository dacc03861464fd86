//! Typed error handling for resource operations
//!
//! Resource handlers never panic and never return ad-hoc strings: every
//! failure is one of the variants below, so the error guards in
//! [`crate::resource::guards`] can decide what is turned into a structured
//! 400/404 and what keeps propagating as a server fault.
//!
//! # Error Categories
//!
//! - [`ResourceError`]: failures raised while serving one operation
//! - [`BackendError`]: failures raised by a storage backend
//! - [`ValidationError`]: per-field schema violations
//! - [`ConfigError`]: configuration loading and interpretation
//!
//! The HTTP shape of an error is an [`ErrorResponse`]: a list of
//! `{location, field, message}` entries collected in a [`RequestErrors`].

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

// =============================================================================
// Resource Errors
// =============================================================================

/// Failure of a single resource operation
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The requested record does not exist in the backend
    #[error("record '{id}' not found")]
    NotFound { id: String },

    /// The record did not pass schema validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Generic malformed input (undecodable body, wrong JSON shape)
    #[error("{0}")]
    Value(String),

    /// Anything else: storage faults, poisoned locks, ...
    #[error(transparent)]
    Storage(anyhow::Error),
}

impl ResourceError {
    /// Shortcut for a generic value error
    pub fn value(message: impl Into<String>) -> Self {
        ResourceError::Value(message.into())
    }

    /// HTTP status used when the error reaches the dispatch layer unguarded
    pub fn status_code(&self) -> StatusCode {
        match self {
            ResourceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ResourceError::Validation(_) | ResourceError::Value(_) => StatusCode::BAD_REQUEST,
            ResourceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<BackendError> for ResourceError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::RecordNotFound { id } => ResourceError::NotFound { id },
            BackendError::AlreadyExists { id } => ResourceError::Validation(
                ValidationError::single("id", format!("record '{}' already exists", id)),
            ),
            BackendError::Storage(e) => ResourceError::Storage(e),
        }
    }
}

impl IntoResponse for ResourceError {
    fn into_response(self) -> Response {
        let mut errors = RequestErrors::new();
        match &self {
            ResourceError::NotFound { .. } => errors.add(Location::Path, "id", self.to_string()),
            ResourceError::Validation(invalid) => {
                for entry in invalid.errors() {
                    errors.add(Location::Body, &entry.field, &entry.message);
                }
            }
            ResourceError::Value(message) => errors.add(Location::Body, "body", message),
            // Internal details stay in the logs
            ResourceError::Storage(_) => errors.add(Location::Body, "body", "Internal server error"),
        }
        errors.set_status(self.status_code());
        errors.into_response()
    }
}

// =============================================================================
// Backend Errors
// =============================================================================

/// Errors a storage backend may raise
#[derive(Debug, Error)]
pub enum BackendError {
    /// No record with this id in the collection
    #[error("record '{id}' not found")]
    RecordNotFound { id: String },

    /// A record with this id is already stored in the collection
    #[error("record '{id}' already exists")]
    AlreadyExists { id: String },

    /// Backend-specific failure
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl BackendError {
    pub fn not_found(id: impl Into<String>) -> Self {
        BackendError::RecordNotFound { id: id.into() }
    }

    pub fn already_exists(id: impl Into<String>) -> Self {
        BackendError::AlreadyExists { id: id.into() }
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// A single field validation error
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Schema validation failure, carrying every offending field
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationError {
    errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an error for a single field
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut err = Self::new();
        err.push(field, message);
        err
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Message attached to `field`, if it failed
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msgs: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "Validation errors: {}", msgs.join(", "))
    }
}

impl std::error::Error for ValidationError {}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration is not valid YAML for the expected shape
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A value parsed but cannot be used
    #[error("invalid value '{value}' for '{field}': {message}")]
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },
}

// =============================================================================
// Structured error responses
// =============================================================================

/// Part of the request an error entry points to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Path,
    Body,
    Querystring,
    Header,
}

/// One `{location, field, message}` entry of an error response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEntry {
    pub location: Location,
    pub field: String,
    pub message: String,
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub errors: Vec<ErrorEntry>,
}

/// Errors collected while serving one request
///
/// Guards append entries and set the status in place; the dispatch layer
/// renders the collector instead of the handler's value whenever it is
/// not empty.
#[derive(Debug, Clone, Default)]
pub struct RequestErrors {
    entries: Vec<ErrorEntry>,
    status: Option<StatusCode>,
}

impl RequestErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, location: Location, field: impl Into<String>, message: impl Into<String>) {
        self.entries.push(ErrorEntry {
            location,
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    /// Status to answer with; 400 unless a guard said otherwise
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::BAD_REQUEST)
    }

    pub fn entries(&self) -> &[ErrorEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            status: "error",
            errors: self.entries.clone(),
        }
    }
}

impl IntoResponse for RequestErrors {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse {
            status: "error",
            errors: self.entries,
        });
        (status, body).into_response()
    }
}

// =============================================================================
// Tests
// =============================================================================
