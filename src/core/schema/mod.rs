//! Resource schemas
//!
//! A [`ResourceSchema`] is the list of fields one resource type accepts.
//! Every schema starts from [`ResourceSchema::base`], which brings the
//! common `id` and `last_modified` fields, and is extended with the
//! resource's own [`FieldDef`]s.
//!
//! # Example
//!
//! ```rust,ignore
//! let schema = ResourceSchema::base().extend([
//!     FieldDef::string("title").rule(validators::string_length(1, 1024)),
//!     FieldDef::string("url").rule(validators::url()),
//!     FieldDef::boolean("unread").with_default(json!(true)),
//! ]);
//!
//! let record = schema.validate(&json!({"title": "Rust", "url": "https://rust-lang.org"}))?;
//! assert!(record.contains_key("last_modified"));
//! ```

pub mod timestamp;
pub mod validators;

pub use timestamp::TimeStamp;

use crate::core::error::ValidationError;
use crate::core::{ID_FIELD, MODIFIED_FIELD, Record};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;
use std::sync::Arc;

/// Extra check run on a field value once it has its kind
pub type Rule = Arc<dyn Fn(&str, &Value) -> Result<(), String> + Send + Sync>;

/// Type of value a field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    String,
    Integer,
    Float,
    Boolean,
    /// Integer epoch seconds, see [`TimeStamp`]
    Timestamp,
    List,
    Mapping,
    Any,
}

impl FieldKind {
    /// Coerce a non-null raw value into this kind
    pub fn coerce(&self, value: &Value) -> Result<Value, String> {
        match self {
            FieldKind::String => match value {
                Value::String(_) => Ok(value.clone()),
                other => Err(format!("{} is not a string", quoted(other))),
            },
            FieldKind::Integer | FieldKind::Timestamp => coerce_integer(value)
                .map(Value::from)
                .ok_or_else(|| format!("{} is not a number", quoted(value))),
            FieldKind::Float => coerce_float(value)
                .map(Value::Number)
                .ok_or_else(|| format!("{} is not a number", quoted(value))),
            FieldKind::Boolean => coerce_boolean(value)
                .map(Value::Bool)
                .ok_or_else(|| format!("{} is not a boolean", quoted(value))),
            FieldKind::List => match value {
                Value::Array(_) => Ok(value.clone()),
                other => Err(format!("{} is not iterable", quoted(other))),
            },
            FieldKind::Mapping => match value {
                Value::Object(_) => Ok(value.clone()),
                other => Err(format!("{} is not a mapping type", quoted(other))),
            },
            FieldKind::Any => Ok(value.clone()),
        }
    }
}

fn quoted(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        other => format!("\"{}\"", other),
    }
}

fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn coerce_float(value: &Value) -> Option<Number> {
    match value {
        Value::Number(n) => Some(n.clone()),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .and_then(Number::from_f64),
        _ => None,
    }
}

fn coerce_boolean(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.to_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// What happens when a field is absent (or null) in the input
#[derive(Debug, Clone, PartialEq)]
pub enum Missing {
    /// Validation fails, except for timestamps which default to now
    Required,
    /// The field is left out of the validated record
    Drop,
    /// The field takes this value
    Default(Value),
}

/// Definition of one schema field
#[derive(Clone)]
pub struct FieldDef {
    name: String,
    kind: FieldKind,
    missing: Missing,
    title: Option<String>,
    rules: Vec<Rule>,
}

impl fmt::Debug for FieldDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDef")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("missing", &self.missing)
            .field("rules", &self.rules.len())
            .finish()
    }
}

impl FieldDef {
    /// Create a required field
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            missing: Missing::Required,
            title: None,
            rules: Vec::new(),
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Float)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    /// Drop the field from the record when it is missing
    pub fn optional(mut self) -> Self {
        self.missing = Missing::Drop;
        self
    }

    /// Use `value` when the field is missing
    pub fn with_default(mut self, value: Value) -> Self {
        self.missing = Missing::Default(value);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Add a rule checked after coercion
    pub fn rule(
        mut self,
        rule: impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn is_required(&self) -> bool {
        self.missing == Missing::Required
    }

    /// Turn the raw value of this field into its validated value
    ///
    /// `Ok(None)` means the field is left out of the record.
    pub fn deserialize(&self, raw: Option<&Value>) -> Result<Option<Value>, String> {
        let value = match raw.filter(|v| !v.is_null()) {
            Some(raw) => self.kind.coerce(raw)?,
            None => match &self.missing {
                Missing::Required if self.kind == FieldKind::Timestamp => {
                    Value::from(TimeStamp::now())
                }
                Missing::Required => return Err("Required".to_string()),
                Missing::Drop => return Ok(None),
                Missing::Default(default) => default.clone(),
            },
        };

        for rule in &self.rules {
            rule(&self.name, &value)?;
        }

        Ok(Some(value))
    }
}

/// Field definitions of one resource type
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    fields: Vec<FieldDef>,
}

impl Default for ResourceSchema {
    fn default() -> Self {
        Self::base()
    }
}

impl ResourceSchema {
    /// Schema with the fields every resource carries
    pub fn base() -> Self {
        Self {
            fields: vec![
                FieldDef::string(ID_FIELD).optional(),
                TimeStamp::field(MODIFIED_FIELD),
            ],
        }
    }

    /// Add a field, replacing any field already declared with that name
    pub fn field(mut self, field: FieldDef) -> Self {
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
        self
    }

    /// Add several fields, see [`ResourceSchema::field`]
    pub fn extend(self, fields: impl IntoIterator<Item = FieldDef>) -> Self {
        fields.into_iter().fold(self, |schema, field| schema.field(field))
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Names of the declared fields, in declaration order
    pub fn known_fields(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Validate a raw JSON value into a record
    ///
    /// Every field is checked and all failures are reported together.
    /// Keys the schema does not declare are dropped.
    pub fn validate(&self, raw: &Value) -> Result<Record, ValidationError> {
        let Value::Object(input) = raw else {
            return Err(ValidationError::single(
                "body",
                format!("{} is not a mapping type", quoted(raw)),
            ));
        };

        let mut record = Record::new();
        let mut invalid = ValidationError::new();

        for field in &self.fields {
            match field.deserialize(input.get(&field.name)) {
                Ok(Some(value)) => {
                    record.insert(field.name.clone(), value);
                }
                Ok(None) => {}
                Err(message) => invalid.push(field.name.clone(), message),
            }
        }

        if invalid.is_empty() {
            Ok(record)
        } else {
            Err(invalid)
        }
    }
}
