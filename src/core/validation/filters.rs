//! Reusable field filters
//!
//! Filters transform field values before validation

use anyhow::Result;
use serde_json::{Value, json};

/// Filter: trim whitespace from string
pub fn trim() -> impl Fn(&str, Value) -> Result<Value> + Send + Sync + Clone {
    |_: &str, value: Value| match value.as_str() {
        Some(s) => Ok(Value::String(s.trim().to_string())),
        None => Ok(value),
    }
}

/// Filter: convert string to lowercase
pub fn lowercase() -> impl Fn(&str, Value) -> Result<Value> + Send + Sync + Clone {
    |_: &str, value: Value| match value.as_str() {
        Some(s) => Ok(Value::String(s.to_lowercase())),
        None => Ok(value),
    }
}

/// Filter: round number to specified decimal places
pub fn round_decimals(decimals: u32) -> impl Fn(&str, Value) -> Result<Value> + Send + Sync + Clone {
    move |field: &str, value: Value| {
        let Some(num) = value.as_f64() else {
            return Ok(value);
        };
        let factor = 10_f64.powi(decimals as i32);
        let rounded = (num * factor).round() / factor;
        if !rounded.is_finite() {
            anyhow::bail!("'{}' is out of range", field);
        }
        Ok(json!(rounded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim() {
        let f = trim();
        assert_eq!(f("name", json!("  Lamp ")).unwrap(), json!("Lamp"));
        assert_eq!(f("name", json!(3)).unwrap(), json!(3));
    }

    #[test]
    fn test_lowercase() {
        let f = lowercase();
        assert_eq!(f("email", json!("A@B.IO")).unwrap(), json!("a@b.io"));
    }

    #[test]
    fn test_round_decimals() {
        let f = round_decimals(2);
        assert_eq!(f("price", json!(19.999)).unwrap(), json!(20.0));
        assert_eq!(f("price", json!(3.14159)).unwrap(), json!(3.14));
        assert_eq!(f("price", json!("n/a")).unwrap(), json!("n/a"));
    }
}
