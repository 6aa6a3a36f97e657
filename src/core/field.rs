//! Field value types and validation

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::OnceLock;
use uuid::Uuid;

/// A polymorphic field value that can hold different types
///
/// Records expose their columns through this type so the query pipeline can
/// filter and sort without knowing the concrete record.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Uuid(Uuid),
    DateTime(DateTime<Utc>),
    /// Many-valued column (e.g. the tags of a product)
    List(Vec<FieldValue>),
    Null,
}

impl FieldValue {
    /// Get the value as a string if possible
    pub fn as_string(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as a float, widening integers
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(f) => Some(*f),
            FieldValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get the value as a UUID if possible
    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            FieldValue::Uuid(u) => Some(*u),
            _ => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Text content used by free-text search
    ///
    /// Lists contribute every string element; non-text scalars contribute nothing.
    pub fn texts(&self) -> Vec<String> {
        match self {
            FieldValue::String(s) => vec![s.clone()],
            FieldValue::List(values) => values.iter().flat_map(FieldValue::texts).collect(),
            _ => Vec::new(),
        }
    }

    /// Compare two scalar values of compatible types
    ///
    /// Integers and floats compare numerically. Returns `None` for nulls,
    /// lists and mismatched types.
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::String(a), FieldValue::String(b)) => Some(a.cmp(b)),
            (FieldValue::Boolean(a), FieldValue::Boolean(b)) => Some(a.cmp(b)),
            (FieldValue::Uuid(a), FieldValue::Uuid(b)) => Some(a.cmp(b)),
            (FieldValue::DateTime(a), FieldValue::DateTime(b)) => Some(a.cmp(b)),
            (FieldValue::Integer(a), FieldValue::Integer(b)) => Some(a.cmp(b)),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.partial_cmp(&y),
                _ => None,
            },
        }
    }

    /// Equality as used by exact filters; a list matches when any element does
    pub fn matches(&self, wanted: &FieldValue) -> bool {
        match self {
            FieldValue::List(values) => values.iter().any(|v| v.matches(wanted)),
            value => value.compare(wanted) == Some(Ordering::Equal),
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<Uuid> for FieldValue {
    fn from(value: Uuid) -> Self {
        FieldValue::Uuid(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::DateTime(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// Declared type of a filterable column
///
/// Query-string values are parsed into this type once per request; a value
/// that does not parse disables its filter instead of failing the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Boolean,
    Uuid,
    DateTime,
}

impl FieldKind {
    /// Parse a raw query-string value into a typed field value
    pub fn parse(&self, raw: &str) -> Option<FieldValue> {
        let raw = raw.trim();
        match self {
            FieldKind::Text => Some(FieldValue::String(raw.to_string())),
            FieldKind::Number => raw.parse::<f64>().ok().filter(|n| n.is_finite()).map(FieldValue::Float),
            FieldKind::Boolean => match raw.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Some(FieldValue::Boolean(true)),
                "false" | "0" | "no" | "off" => Some(FieldValue::Boolean(false)),
                _ => None,
            },
            FieldKind::Uuid => Uuid::parse_str(raw).ok().map(FieldValue::Uuid),
            FieldKind::DateTime => DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| FieldValue::DateTime(dt.with_timezone(&Utc))),
        }
    }
}

/// Field format validators
#[derive(Debug, Clone)]
pub enum FieldFormat {
    Email,
    Uuid,
    Url,
}

impl FieldFormat {
    /// Validate a field value against this format
    pub fn validate(&self, value: &FieldValue) -> bool {
        let string_value = match value.as_string() {
            Some(s) => s,
            None => return false,
        };

        match self {
            FieldFormat::Email => Self::is_valid_email(string_value),
            FieldFormat::Uuid => Uuid::parse_str(string_value).is_ok(),
            FieldFormat::Url => Self::is_valid_url(string_value),
        }
    }

    fn is_valid_email(email: &str) -> bool {
        static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = EMAIL_REGEX.get_or_init(|| {
            Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
                .expect("static email pattern")
        });
        regex.is_match(email)
    }

    fn is_valid_url(url: &str) -> bool {
        static URL_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = URL_REGEX
            .get_or_init(|| Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").expect("static url pattern"));
        regex.is_match(url)
    }
}
