//! Shared test harness for storage backend testing
//!
//! Provides record builders and the `backend_tests!` macro, which checks any
//! [`Backend`](readinglist::core::Backend) implementation against the
//! contract resources rely on.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//!
//! backend_tests!(InMemoryBackend::new());
//! ```

#![allow(dead_code)]

pub mod backend_tests;

use readinglist::core::{Record, Scope};
use serde_json::{Value, json};

/// Collection used by the contract tests
pub const RESOURCE: &str = "articles";

pub fn scope(user_id: Option<&'static str>) -> Scope<'static> {
    Scope::new(RESOURCE, user_id)
}

pub fn alice() -> Scope<'static> {
    scope(Some("alice"))
}

/// Record built from a JSON object literal
pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("test records must be objects, got {}", other),
    }
}

/// Article record with the fields the contract tests filter and sort on
pub fn article(title: &str, unread: bool, read_position: i64) -> Record {
    record(json!({
        "title": title,
        "unread": unread,
        "read_position": read_position,
    }))
}

pub fn titles(records: &[Record]) -> Vec<&str> {
    records
        .iter()
        .map(|r| r["title"].as_str().unwrap_or_default())
        .collect()
}
