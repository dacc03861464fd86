//! Query string translation into backend filters and sort directives
//!
//! # Format
//! - Equality: `?status=read` for any field declared by the schema
//! - Range: `?since=1420070400` keeps records with `last_modified >= value`
//! - Sorting: `?sort=-last_modified,title` (leading `-` for descending)
//!
//! Values are decoded into JSON values before they reach the backend, see
//! [`decode_filter_value`].

use crate::core::MODIFIED_FIELD;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;
use std::sync::OnceLock;

/// Query parameters in the order they appeared in the query string
pub type QueryParams = [(String, String)];

/// Reserved parameter mapped onto a range filter on the modification field
pub const SINCE_PARAM: &str = "since";

/// Reserved parameter holding the sort directives
pub const SORT_PARAM: &str = "sort";

const TRUE_TOKENS: [&str; 4] = ["on", "true", "yes", "1"];
const FALSE_TOKENS: [&str; 4] = ["off", "false", "no", "0"];

/// Comparison applied by a [`Filter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = ">=")]
    Gte,
}

impl Comparison {
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparison::Eq => "==",
            Comparison::Gte => ">=",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `(field, value, operator)` constraint applied by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub value: Value,
    pub operator: Comparison,
}

impl Filter {
    pub fn new(field: impl Into<String>, value: Value, operator: Comparison) -> Self {
        Self {
            field: field.into(),
            value,
            operator,
        }
    }
}

/// Sort direction, `+1` ascending and `-1` descending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn sign(&self) -> i8 {
        match self {
            Direction::Ascending => 1,
            Direction::Descending => -1,
        }
    }
}

/// A `(field, direction)` pair controlling list ordering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub direction: Direction,
}

impl Sort {
    pub fn new(field: impl Into<String>, direction: Direction) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

/// Extract filters from query string parameters
///
/// A parameter named after a known field yields an equality filter, and
/// `since` yields a `>=` filter on the modification field. Both rules are
/// checked independently, so one parameter gives zero, one or two filters.
pub fn extract_filters<S: AsRef<str>>(params: &QueryParams, known_fields: &[S]) -> Vec<Filter> {
    let mut filters = Vec::new();

    for (param, raw) in params {
        let value = decode_filter_value(raw);

        if known_fields.iter().any(|f| f.as_ref() == param.as_str()) {
            filters.push(Filter::new(param.as_str(), value.clone(), Comparison::Eq));
        }
        if param == SINCE_PARAM {
            filters.push(Filter::new(MODIFIED_FIELD, value, Comparison::Gte));
        }
    }

    filters
}

/// Extract sort directives from the `sort` parameter
///
/// Tokens that do not look like `[+-]field` are skipped silently.
pub fn extract_sorting(params: &QueryParams) -> Vec<Sort> {
    let specified = params
        .iter()
        .find(|(name, _)| name == SORT_PARAM)
        .map(|(_, value)| value.as_str())
        .unwrap_or("");

    specified
        .split(',')
        .filter_map(|token| {
            let caps = sort_token_regex().captures(token)?;
            let direction = match caps.get(1).map(|m| m.as_str()) {
                Some("-") => Direction::Descending,
                _ => Direction::Ascending,
            };
            Some(Sort::new(&caps[2], direction))
        })
        .collect()
}

fn sort_token_regex() -> &'static Regex {
    static SORT_TOKEN: OnceLock<Regex> = OnceLock::new();
    SORT_TOKEN.get_or_init(|| Regex::new(r"^\s?([\-+]?)(\w+)\s?").unwrap())
}

/// Convert a raw query string value into a JSON value
///
/// Decoders are tried in order, the first one that accepts wins:
/// 1. boolean tokens (`on/true/yes/1`, `off/false/no/0`, any case)
/// 2. integer
/// 3. finite float
/// 4. literal: JSON (quoted strings, lists, objects, null) or `'single quoted'`
/// 5. the raw string itself
pub fn decode_filter_value(raw: &str) -> Value {
    let lowered = raw.to_lowercase();
    if TRUE_TOKENS.contains(&lowered.as_str()) {
        return Value::Bool(true);
    }
    if FALSE_TOKENS.contains(&lowered.as_str()) {
        return Value::Bool(false);
    }

    if let Ok(int) = raw.parse::<i64>() {
        return Value::from(int);
    }

    if let Some(number) = raw
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .and_then(Number::from_f64)
    {
        return Value::Number(number);
    }

    if let Ok(literal) = serde_json::from_str::<Value>(raw) {
        return literal;
    }

    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        return Value::String(raw[1..raw.len() - 1].to_string());
    }

    Value::String(raw.to_string())
}
