//! Epoch timestamp field

use super::{FieldDef, FieldKind};
use chrono::Utc;

/// Integer field holding epoch seconds, filled with "now" when a required
/// value is missing
pub struct TimeStamp;

impl TimeStamp {
    /// Current time in seconds since the epoch
    pub fn now() -> i64 {
        Utc::now().timestamp()
    }

    /// A timestamp strictly later than `previous`, normally "now"
    ///
    /// Records touched twice within the same second still get a new value.
    pub fn after(previous: Option<i64>) -> i64 {
        let now = Self::now();
        match previous {
            Some(prev) if prev >= now => prev.saturating_add(1),
            _ => now,
        }
    }

    /// Required timestamp field named `name`
    pub fn field(name: impl Into<String>) -> FieldDef {
        FieldDef::new(name, FieldKind::Timestamp).with_title("Epoch timestamp")
    }
}
