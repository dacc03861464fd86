//! Generic resource controller
//!
//! A [`Resource`] exposes list/create/read/replace/patch/delete over one
//! collection of a [`Backend`], validating every write against its
//! [`ResourceSchema`]. It keeps no state between requests: everything an
//! operation needs travels in the [`ResourceRequest`].
//!
//! | Operation        | Permission  | Guards                   |
//! |------------------|-------------|--------------------------|
//! | `collection_get` | `readonly`  |                          |
//! | `collection_post`| `readwrite` | validation               |
//! | `get`            | `readonly`  | existence                |
//! | `put`            | `readwrite` | existence, validation    |
//! | `patch`          | `readwrite` | existence, validation    |
//! | `delete`         | `readwrite` | existence                |

pub mod guards;

use crate::core::auth::{AuthContext, Permission};
use crate::core::backend::{Backend, Scope};
use crate::core::error::{BackendError, ConfigError, RequestErrors, ResourceError};
use crate::core::query::{self, Filter, QueryParams, Sort};
use crate::core::schema::{ResourceSchema, TimeStamp};
use crate::core::{MODIFIED_FIELD, Record};
use axum::body::Bytes;
use guards::{exists_or_404, validates_or_400};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, OnceLock};

/// One of the six operations a resource serves
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    CollectionGet,
    CollectionPost,
    Get(String),
    Put(String),
    Patch(String),
    Delete(String),
}

impl Operation {
    /// Permission the caller must hold
    pub fn permission(&self) -> Permission {
        match self {
            Operation::CollectionGet | Operation::Get(_) => Permission::ReadOnly,
            _ => Permission::ReadWrite,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::CollectionGet => "collection_get",
            Operation::CollectionPost => "collection_post",
            Operation::Get(_) => "get",
            Operation::Put(_) => "put",
            Operation::Patch(_) => "patch",
            Operation::Delete(_) => "delete",
        }
    }

    /// Id targeted by a record operation
    pub fn record_id(&self) -> Option<&str> {
        match self {
            Operation::Get(id) | Operation::Put(id) | Operation::Patch(id) | Operation::Delete(id) => {
                Some(id)
            }
            Operation::CollectionGet | Operation::CollectionPost => None,
        }
    }
}

/// Everything an operation reads from, and reports errors into
#[derive(Debug, Default)]
pub struct ResourceRequest {
    pub auth: AuthContext,
    /// Query string parameters, in order
    pub params: Vec<(String, String)>,
    pub body: Bytes,
    pub errors: RequestErrors,
}

impl ResourceRequest {
    pub fn new(auth: AuthContext) -> Self {
        Self {
            auth,
            ..Default::default()
        }
    }

    pub fn with_params(mut self, params: Vec<(String, String)>) -> Self {
        self.params = params;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}

/// Metadata of a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionMeta {
    pub total: usize,
}

/// Body of a listing: `{"items": [...], "meta": {"total": N}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionBody {
    pub items: Vec<Record>,
    pub meta: CollectionMeta,
}

/// CRUD controller for one resource type
pub struct Resource {
    name: String,
    schema: Arc<ResourceSchema>,
    backend: Arc<dyn Backend>,
}

impl Resource {
    /// Create a resource named `name` (its collection path segment)
    pub fn new(name: impl Into<String>, schema: ResourceSchema, backend: Arc<dyn Backend>) -> Self {
        Self {
            name: name.into(),
            schema: Arc::new(schema),
            backend,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check that `name` can be used as a collection path segment
    ///
    /// Names are made of ASCII letters, digits, `_` and `-`.
    pub fn check_name(name: &str) -> Result<(), ConfigError> {
        static NAME_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = NAME_REGEX.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());
        if regex.is_match(name) {
            return Ok(());
        }
        Err(ConfigError::InvalidValue {
            field: "resources.name".to_string(),
            value: name.to_string(),
            message: "expected letters, digits, '_' or '-'".to_string(),
        })
    }

    pub fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    fn scope<'a>(&'a self, request: &'a ResourceRequest) -> Scope<'a> {
        Scope::new(&self.name, request.auth.user_id())
    }

    /// Decode a request body; an empty body is an empty mapping
    pub fn deserialize(raw: &[u8]) -> Result<Value, ResourceError> {
        let raw = std::str::from_utf8(raw)
            .map_err(|e| ResourceError::value(format!("Invalid UTF-8 body: {}", e)))?;
        if raw.is_empty() {
            return Ok(Value::Object(Record::new()));
        }
        serde_json::from_str(raw).map_err(|e| ResourceError::value(format!("Invalid JSON: {}", e)))
    }

    pub fn validate(&self, record: &Value) -> Result<Record, ResourceError> {
        Ok(self.schema.validate(record)?)
    }

    pub fn extract_filters(&self, params: &QueryParams) -> Vec<Filter> {
        query::extract_filters(params, &self.schema.known_fields())
    }

    pub fn extract_sorting(&self, params: &QueryParams) -> Vec<Sort> {
        query::extract_sorting(params)
    }

    /// Serve `operation`
    ///
    /// `Ok(None)` means a guard intercepted a failure and `request.errors`
    /// holds the response to send. `Err` is a failure no guard handles.
    pub async fn handle(
        &self,
        operation: &Operation,
        request: &mut ResourceRequest,
    ) -> Result<Option<Value>, ResourceError> {
        tracing::debug!(
            resource = %self.name,
            operation = operation.name(),
            id = operation.record_id(),
            "Handling resource operation"
        );

        let record = match operation {
            Operation::CollectionGet => {
                let body = self.collection_get(request).await?;
                return serde_json::to_value(body)
                    .map(Some)
                    .map_err(|e| ResourceError::Storage(e.into()));
            }
            Operation::CollectionPost => self.collection_post(request).await?,
            Operation::Get(id) => self.get(id, request).await?,
            Operation::Put(id) => self.put(id, request).await?,
            Operation::Patch(id) => self.patch(id, request).await?,
            Operation::Delete(id) => self.delete(id, request).await?,
        };

        Ok(record.map(Value::Object))
    }

    //
    // End-points
    //

    /// List the collection, filtered and sorted by the query string
    pub async fn collection_get(
        &self,
        request: &ResourceRequest,
    ) -> Result<CollectionBody, ResourceError> {
        let filters = self.extract_filters(&request.params);
        let sorting = self.extract_sorting(&request.params);
        let items = self
            .backend
            .get_all(&filters, &sorting, self.scope(request))
            .await?;

        Ok(CollectionBody {
            meta: CollectionMeta { total: items.len() },
            items,
        })
    }

    /// Validate the body and store it as a new record
    pub async fn collection_post(
        &self,
        request: &mut ResourceRequest,
    ) -> Result<Option<Record>, ResourceError> {
        let outcome = self.create_record(request).await.map(Some);
        validates_or_400(&mut request.errors, outcome)
    }

    /// Fetch one record
    pub async fn get(
        &self,
        record_id: &str,
        request: &mut ResourceRequest,
    ) -> Result<Option<Record>, ResourceError> {
        let outcome = self
            .backend
            .get(record_id, self.scope(request))
            .await
            .map(Some)
            .map_err(ResourceError::from);
        exists_or_404(&mut request.errors, outcome)
    }

    /// Replace a record with the validated body
    ///
    /// Without an explicit `last_modified`, the replacement gets a value
    /// strictly later than the stored one.
    pub async fn put(
        &self,
        record_id: &str,
        request: &mut ResourceRequest,
    ) -> Result<Option<Record>, ResourceError> {
        let outcome = self.replace_record(record_id, request).await.map(Some);
        let outcome = validates_or_400(&mut request.errors, outcome);
        exists_or_404(&mut request.errors, outcome)
    }

    /// Merge the body onto a record, refresh its timestamp, and store it
    pub async fn patch(
        &self,
        record_id: &str,
        request: &mut ResourceRequest,
    ) -> Result<Option<Record>, ResourceError> {
        let outcome = self.patch_record(record_id, request).await.map(Some);
        let outcome = validates_or_400(&mut request.errors, outcome);
        exists_or_404(&mut request.errors, outcome)
    }

    /// Remove a record, returning its last state
    pub async fn delete(
        &self,
        record_id: &str,
        request: &mut ResourceRequest,
    ) -> Result<Option<Record>, ResourceError> {
        let outcome = self
            .backend
            .delete(record_id, self.scope(request))
            .await
            .map(Some)
            .map_err(ResourceError::from);
        exists_or_404(&mut request.errors, outcome)
    }

    async fn create_record(&self, request: &ResourceRequest) -> Result<Record, ResourceError> {
        let new_record = Self::deserialize(&request.body)?;
        let new_record = self.validate(&new_record)?;
        Ok(self.backend.create(new_record, self.scope(request)).await?)
    }

    async fn replace_record(
        &self,
        record_id: &str,
        request: &ResourceRequest,
    ) -> Result<Record, ResourceError> {
        let scope = self.scope(request);
        let mut new_record = Self::deserialize(&request.body)?;

        if let Value::Object(fields) = &mut new_record
            && fields.get(MODIFIED_FIELD).is_none_or(Value::is_null)
        {
            let previous = match self.backend.get(record_id, scope).await {
                Ok(current) => current.get(MODIFIED_FIELD).and_then(Value::as_i64),
                Err(BackendError::RecordNotFound { .. }) => None,
                Err(err) => return Err(err.into()),
            };
            fields.insert(
                MODIFIED_FIELD.to_string(),
                Value::from(TimeStamp::after(previous)),
            );
        }

        let new_record = self.validate(&new_record)?;
        Ok(self.backend.update(record_id, new_record, scope).await?)
    }

    async fn patch_record(
        &self,
        record_id: &str,
        request: &ResourceRequest,
    ) -> Result<Record, ResourceError> {
        let scope = self.scope(request);
        let current = self.backend.get(record_id, scope).await?;

        let Value::Object(modified) = Self::deserialize(&request.body)? else {
            return Err(ResourceError::value("Patch body must be a JSON object"));
        };

        let previous = current.get(MODIFIED_FIELD).and_then(Value::as_i64);
        let mut updated = current;
        updated.extend(modified);
        updated.insert(
            MODIFIED_FIELD.to_string(),
            Value::from(TimeStamp::after(previous)),
        );
        let updated = self.validate(&Value::Object(updated))?;

        Ok(self.backend.update(record_id, updated, scope).await?)
    }
}
