//! Error guards wrapped around resource operations
//!
//! A guard looks at the outcome of an operation body. Failures it knows
//! about are written into the request's [`RequestErrors`] and replaced by
//! `Ok(None)`; everything else passes through untouched, so unexpected
//! failures still surface as server faults.
//!
//! Guards compose by nesting, the existence guard outermost:
//!
//! ```rust,ignore
//! let outcome = self.replace_record(id, request).await.map(Some);
//! let outcome = validates_or_400(&mut request.errors, outcome);
//! exists_or_404(&mut request.errors, outcome)
//! ```

use crate::core::ID_FIELD;
use crate::core::error::{Location, RequestErrors, ResourceError};
use axum::http::StatusCode;

/// Field name used for errors about the request body as a whole
pub const BODY_FIELD: &str = "body";

/// Turn a missing record into a 404 path error on `id`
pub fn exists_or_404<T>(
    errors: &mut RequestErrors,
    outcome: Result<Option<T>, ResourceError>,
) -> Result<Option<T>, ResourceError> {
    match outcome {
        Err(err @ ResourceError::NotFound { .. }) => {
            errors.add(Location::Path, ID_FIELD, err.to_string());
            errors.set_status(StatusCode::NOT_FOUND);
            Ok(None)
        }
        other => other,
    }
}

/// Turn malformed input and schema violations into 400 body errors
///
/// A schema violation yields one entry per offending field.
pub fn validates_or_400<T>(
    errors: &mut RequestErrors,
    outcome: Result<Option<T>, ResourceError>,
) -> Result<Option<T>, ResourceError> {
    match outcome {
        Err(ResourceError::Value(message)) => {
            errors.add(Location::Body, BODY_FIELD, message);
        }
        Err(ResourceError::Validation(invalid)) => {
            for entry in invalid.errors() {
                errors.add(Location::Body, &entry.field, &entry.message);
            }
        }
        other => return other,
    }
    errors.set_status(StatusCode::BAD_REQUEST);
    Ok(None)
}
