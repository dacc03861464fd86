//! Reusable field rules
//!
//! Rules run after a value has been coerced to its field kind. A rule only
//! looks at values of the shape it understands and lets anything else pass,
//! type errors are reported by the kind itself.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Rule: string length must be within range (in characters)
pub fn string_length(
    min: usize,
    max: usize,
) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |_: &str, value: &Value| {
        if let Some(s) = value.as_str() {
            let len = s.chars().count();
            if len < min {
                Err(format!("Shorter than minimum length {}", min))
            } else if len > max {
                Err(format!("Longer than maximum length {}", max))
            } else {
                Ok(())
            }
        } else {
            Ok(())
        }
    }
}

/// Rule: number must be within an inclusive range
pub fn value_range(
    min: Option<f64>,
    max: Option<f64>,
) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |_: &str, value: &Value| {
        let Some(num) = value.as_f64() else {
            return Ok(());
        };
        if let Some(min) = min.filter(|min| num < *min) {
            return Err(format!("{} is less than minimum value {}", num, min));
        }
        if let Some(max) = max.filter(|max| num > *max) {
            return Err(format!("{} is greater than maximum value {}", num, max));
        }
        Ok(())
    }
}

/// Rule: value must be in allowed list
pub fn one_of(
    allowed: Vec<String>,
) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |_: &str, value: &Value| {
        if let Some(s) = value.as_str() {
            if !allowed.iter().any(|a| a == s) {
                Err(format!("\"{}\" is not one of {}", s, allowed.join(", ")))
            } else {
                Ok(())
            }
        } else {
            Ok(())
        }
    }
}

/// Rule: string must match a regular expression
pub fn pattern(regex: Regex) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |_: &str, value: &Value| match value.as_str() {
        Some(s) if !regex.is_match(s) => Err("String does not match expected pattern".to_string()),
        _ => Ok(()),
    }
}

/// Rule: string must be an http(s) URL
pub fn url() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |_: &str, value: &Value| {
        static URL_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = URL_REGEX.get_or_init(|| Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").unwrap());
        match value.as_str() {
            Some(s) if !regex.is_match(s) => Err("Must be a URL".to_string()),
            _ => Ok(()),
        }
    }
}

/// Rule: date must match format
pub fn date_format(
    format: impl Into<String>,
) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    let format = format.into();
    move |_: &str, value: &Value| {
        if let Some(s) = value.as_str() {
            match chrono::NaiveDate::parse_from_str(s, &format) {
                Ok(_) => Ok(()),
                Err(_) => Err(format!("\"{}\" does not match date format {}", s, format)),
            }
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // === string_length() ===

    #[test]
    fn test_string_length_too_short_returns_error() {
        let v = string_length(3, 50);
        let result = v("title", &json!("ab"));
        assert!(result.unwrap_err().contains("minimum length 3"));
    }

    #[test]
    fn test_string_length_too_long_returns_error() {
        let v = string_length(1, 5);
        let result = v("title", &json!("abcdef"));
        assert!(result.unwrap_err().contains("maximum length 5"));
    }

    #[test]
    fn test_string_length_counts_characters() {
        let v = string_length(1, 4);
        assert!(v("title", &json!("été!")).is_ok());
    }

    #[test]
    fn test_string_length_bounds_inclusive() {
        let v = string_length(3, 5);
        assert!(v("title", &json!("abc")).is_ok());
        assert!(v("title", &json!("abcde")).is_ok());
    }

    #[test]
    fn test_string_length_non_string_passthrough() {
        let v = string_length(5, 10);
        assert!(v("read_position", &json!(42)).is_ok());
    }

    // === value_range() ===

    #[test]
    fn test_value_range_below_min() {
        let v = value_range(Some(0.0), None);
        assert!(v("read_position", &json!(-1)).unwrap_err().contains("minimum"));
    }

    #[test]
    fn test_value_range_above_max() {
        let v = value_range(None, Some(100.0));
        assert!(v("score", &json!(101)).unwrap_err().contains("maximum"));
    }

    #[test]
    fn test_value_range_inclusive_and_passthrough() {
        let v = value_range(Some(0.0), Some(100.0));
        assert!(v("score", &json!(0)).is_ok());
        assert!(v("score", &json!(100.0)).is_ok());
        assert!(v("title", &json!("hello")).is_ok());
    }

    // === one_of() ===

    #[test]
    fn test_one_of_accepts_listed_value() {
        let v = one_of(vec!["read".into(), "unread".into()]);
        assert!(v("status", &json!("read")).is_ok());
    }

    #[test]
    fn test_one_of_rejects_other_value() {
        let v = one_of(vec!["read".into(), "unread".into()]);
        let err = v("status", &json!("deleted")).unwrap_err();
        assert!(err.contains("deleted"));
        assert!(err.contains("read, unread"));
    }

    #[test]
    fn test_one_of_empty_list_rejects_strings() {
        let v = one_of(vec![]);
        assert!(v("status", &json!("anything")).is_err());
        assert!(v("status", &json!(1)).is_ok());
    }

    // === pattern() / url() ===

    #[test]
    fn test_pattern_matches() {
        let v = pattern(Regex::new(r"^[a-z]+$").unwrap());
        assert!(v("device", &json!("laptop")).is_ok());
        assert!(v("device", &json!("Laptop 2")).is_err());
    }

    #[test]
    fn test_url() {
        let v = url();
        assert!(v("url", &json!("https://example.com/article")).is_ok());
        assert!(v("url", &json!("not a url")).is_err());
        assert!(v("url", &json!(3)).is_ok());
    }

    // === date_format() ===

    #[test]
    fn test_date_format_valid_date_returns_ok() {
        let v = date_format("%Y-%m-%d");
        assert!(v("published", &json!("2024-01-15")).is_ok());
    }

    #[test]
    fn test_date_format_invalid_date_returns_error() {
        let v = date_format("%Y-%m-%d");
        let result = v("published", &json!("not-a-date"));
        assert!(result.unwrap_err().contains("date format"));
    }

    #[test]
    fn test_date_format_custom_format() {
        let v = date_format("%d/%m/%Y");
        assert!(v("published", &json!("15/01/2024")).is_ok());
        assert!(v("published", &json!("2024-01-15")).is_err());
    }
}
