//! Reusable field validators
//!
//! Validators receive the field name and its (already filtered) value. Type
//! checks are done by `is_*` validators; the others let values of the wrong
//! type pass so that exactly one message is reported per problem.

use crate::core::field::{FieldFormat, FieldValue};
use serde_json::Value;
use uuid::Uuid;

/// Validator: field is required (not null)
pub fn required() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &Value| {
        if value.is_null() {
            Err(format!("'{}' is required", field))
        } else {
            Ok(())
        }
    }
}

/// Validator: value must be a string
pub fn is_string() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &Value| {
        if value.is_string() || value.is_null() {
            Ok(())
        } else {
            Err(format!("'{}' must be a string", field))
        }
    }
}

/// Validator: value must be a number
pub fn is_number() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &Value| {
        if value.is_number() || value.is_null() {
            Ok(())
        } else {
            Err(format!("'{}' must be a number", field))
        }
    }
}

/// Validator: value must be a boolean
pub fn is_bool() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &Value| {
        if value.is_boolean() || value.is_null() {
            Ok(())
        } else {
            Err(format!("'{}' must be a boolean", field))
        }
    }
}

/// Validator: number must be positive
pub fn positive() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &Value| match value.as_f64() {
        Some(num) if num <= 0.0 => Err(format!("'{}' must be positive (got {})", field, num)),
        _ => Ok(()),
    }
}

/// Validator: number must not be below minimum
pub fn min_value(min: f64) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &Value| match value.as_f64() {
        Some(num) if num < min => Err(format!("'{}' must be at least {} (got {})", field, min, num)),
        _ => Ok(()),
    }
}

/// Validator: number must not exceed maximum
pub fn max_value(max: f64) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &Value| match value.as_f64() {
        Some(num) if num > max => Err(format!("'{}' must not exceed {} (got {})", field, max, num)),
        _ => Ok(()),
    }
}

/// Validator: string length (in characters) must be within range
pub fn string_length(
    min: usize,
    max: usize,
) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &Value| {
        let Some(s) = value.as_str() else {
            return Ok(());
        };
        let len = s.chars().count();
        if len < min {
            Err(format!(
                "'{}' must have at least {} characters (got {})",
                field, min, len
            ))
        } else if len > max {
            Err(format!(
                "'{}' must not exceed {} characters (got {})",
                field, max, len
            ))
        } else {
            Ok(())
        }
    }
}

/// Validator: string must be one of the allowed choices
pub fn in_list(
    allowed: Vec<String>,
) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &Value| match value.as_str() {
        Some(s) if !allowed.iter().any(|a| a == s) => Err(format!(
            "'{}' must be one of: {} (got '{}')",
            field,
            allowed.join(", "),
            s
        )),
        _ => Ok(()),
    }
}

/// Validator: string must be an http(s) URL
pub fn url() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &Value| match value.as_str() {
        Some(s) if !FieldFormat::Url.validate(&FieldValue::from(s)) => {
            Err(format!("'{}' must be a valid URL", field))
        }
        _ => Ok(()),
    }
}

/// Validator: string must be an email address
pub fn email() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &Value| match value.as_str() {
        Some(s) if !FieldFormat::Email.validate(&FieldValue::from(s)) => {
            Err(format!("'{}' must be a valid email address", field))
        }
        _ => Ok(()),
    }
}

/// Validator: value must be a UUID string
pub fn uuid() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &Value| match value {
        Value::Null => Ok(()),
        Value::String(s) if Uuid::parse_str(s).is_ok() => Ok(()),
        _ => Err(format!("'{}' must be a valid UUID", field)),
    }
}

/// Validator: value must be an array of UUID strings
pub fn uuid_list() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &Value| match value {
        Value::Null => Ok(()),
        Value::Array(items)
            if items
                .iter()
                .all(|v| v.as_str().is_some_and(|s| Uuid::parse_str(s).is_ok())) =>
        {
            Ok(())
        }
        _ => Err(format!("'{}' must be a list of UUIDs", field)),
    }
}
