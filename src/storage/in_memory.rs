//! In-memory implementation of Backend for testing and development

use crate::core::backend::{Backend, Scope};
use crate::core::error::BackendError;
use crate::core::query::{Comparison, Direction, Filter, Sort};
use crate::core::{ID_FIELD, MODIFIED_FIELD, Record, TimeStamp};
use anyhow::anyhow;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Records of one collection, by id, in insertion order
type Collection = IndexMap<String, Record>;

/// `(resource, user_id)` partition key
type CollectionKey = (String, Option<String>);

/// In-memory backend implementation
///
/// Useful for testing and development. Uses RwLock for thread-safe access.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    collections: Arc<RwLock<HashMap<CollectionKey, Collection>>>,
}

impl InMemoryBackend {
    /// Create a new in-memory backend
    pub fn new() -> Self {
        Self::default()
    }

    fn key(scope: Scope<'_>) -> CollectionKey {
        (scope.resource.to_string(), scope.user_id.map(str::to_string))
    }

    /// Copy of `record` with `id` first and a `last_modified` value
    fn stamped(record_id: &str, record: Record) -> Record {
        let mut stored = Record::new();
        stored.insert(ID_FIELD.to_string(), Value::String(record_id.to_string()));
        for (field, value) in record {
            if field != ID_FIELD {
                stored.insert(field, value);
            }
        }
        if stored.get(MODIFIED_FIELD).is_none_or(Value::is_null) {
            stored.insert(MODIFIED_FIELD.to_string(), Value::from(TimeStamp::now()));
        }
        stored
    }
}

#[async_trait]
impl Backend for InMemoryBackend {
    async fn get_all(
        &self,
        filters: &[Filter],
        sorting: &[Sort],
        scope: Scope<'_>,
    ) -> Result<Vec<Record>, BackendError> {
        let collections = self
            .collections
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        let mut records: Vec<Record> = collections
            .get(&Self::key(scope))
            .map(|collection| {
                collection
                    .values()
                    .filter(|record| filters.iter().all(|f| matches_filter(record, f)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if !sorting.is_empty() {
            records.sort_by(|a, b| compare_records(a, b, sorting));
        }

        Ok(records)
    }

    async fn get(&self, record_id: &str, scope: Scope<'_>) -> Result<Record, BackendError> {
        let collections = self
            .collections
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        collections
            .get(&Self::key(scope))
            .and_then(|collection| collection.get(record_id))
            .cloned()
            .ok_or_else(|| BackendError::not_found(record_id))
    }

    async fn create(&self, record: Record, scope: Scope<'_>) -> Result<Record, BackendError> {
        let record_id = match record.get(ID_FIELD).and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => Uuid::new_v4().to_string(),
        };
        let stored = Self::stamped(&record_id, record);

        let mut collections = self
            .collections
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let collection = collections.entry(Self::key(scope)).or_default();
        if collection.contains_key(&record_id) {
            return Err(BackendError::already_exists(record_id));
        }
        collection.insert(record_id, stored.clone());

        Ok(stored)
    }

    async fn update(
        &self,
        record_id: &str,
        record: Record,
        scope: Scope<'_>,
    ) -> Result<Record, BackendError> {
        let stored = Self::stamped(record_id, record);

        let mut collections = self
            .collections
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        collections
            .entry(Self::key(scope))
            .or_default()
            .insert(record_id.to_string(), stored.clone());

        Ok(stored)
    }

    async fn delete(&self, record_id: &str, scope: Scope<'_>) -> Result<Record, BackendError> {
        let mut collections = self
            .collections
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        collections
            .get_mut(&Self::key(scope))
            .and_then(|collection| collection.shift_remove(record_id))
            .ok_or_else(|| BackendError::not_found(record_id))
    }
}

fn matches_filter(record: &Record, filter: &Filter) -> bool {
    let Some(value) = record.get(&filter.field) else {
        return false;
    };
    match filter.operator {
        Comparison::Eq => loose_eq(value, &filter.value),
        Comparison::Gte => matches!(
            compare_scalars(value, &filter.value),
            Some(Ordering::Greater | Ordering::Equal)
        ),
    }
}

/// Numeric view of a value; booleans count as 1 and 0
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Equality where `true == 1`, `false == 0` and `3 == 3.0`
fn loose_eq(a: &Value, b: &Value) -> bool {
    match (as_number(a), as_number(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Ordering between two numbers or two strings, `None` otherwise
fn compare_scalars(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => as_number(a)?.partial_cmp(&as_number(b)?),
    }
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) | Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Array(_)) => 3,
        Some(Value::Object(_)) => 4,
    }
}

/// Total order on optional field values, missing values first
fn compare_field(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => compare_scalars(x, y)
            .unwrap_or_else(|| type_rank(a).cmp(&type_rank(b))),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn compare_records(a: &Record, b: &Record, sorting: &[Sort]) -> Ordering {
    sorting
        .iter()
        .map(|sort| {
            let ordering = compare_field(a.get(&sort.field), b.get(&sort.field));
            match sort.direction {
                Direction::Ascending => ordering,
                Direction::Descending => ordering.reverse(),
            }
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}
