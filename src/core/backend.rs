//! Storage backend contract consumed by resources

use crate::core::Record;
use crate::core::error::BackendError;
use crate::core::query::{Filter, Sort};
use async_trait::async_trait;

/// Collection a backend call applies to
///
/// Records are partitioned by resource name and by the authenticated user,
/// two users never see each other's records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scope<'a> {
    pub resource: &'a str,
    pub user_id: Option<&'a str>,
}

impl<'a> Scope<'a> {
    pub fn new(resource: &'a str, user_id: Option<&'a str>) -> Self {
        Self { resource, user_id }
    }
}

/// Storage trait for resource records
///
/// Implementations decide how filters and sort directives are applied; the
/// resource layer passes them through untouched. The framework is agnostic
/// to the underlying storage mechanism.
#[async_trait]
pub trait Backend: Send + Sync {
    /// List the records of a collection matching every filter, in the
    /// requested order
    async fn get_all(
        &self,
        filters: &[Filter],
        sorting: &[Sort],
        scope: Scope<'_>,
    ) -> Result<Vec<Record>, BackendError>;

    /// Get a record by id, failing with `RecordNotFound` when absent
    async fn get(&self, record_id: &str, scope: Scope<'_>) -> Result<Record, BackendError>;

    /// Store a new record, assigning its id when it has none
    ///
    /// Fails with [`BackendError::AlreadyExists`] when the given id is taken.
    async fn create(&self, record: Record, scope: Scope<'_>) -> Result<Record, BackendError>;

    /// Replace the record stored under `record_id`, creating it if needed
    async fn update(
        &self,
        record_id: &str,
        record: Record,
        scope: Scope<'_>,
    ) -> Result<Record, BackendError>;

    /// Remove a record and return its last known state
    async fn delete(&self, record_id: &str, scope: Scope<'_>) -> Result<Record, BackendError>;
}
