//! Declarative input schemas
//!
//! A schema lists the fields an action accepts. For each field, filters run
//! first, then validators; all errors are collected before returning.

use crate::core::error::FieldValidationError;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

type Validator = Arc<dyn Fn(&str, &Value) -> Result<(), String> + Send + Sync>;
type Filter = Arc<dyn Fn(&str, Value) -> anyhow::Result<Value> + Send + Sync>;

/// Rules attached to a single input field
#[derive(Clone, Default)]
pub struct FieldRules {
    required: bool,
    nullable: bool,
    default: Option<Value>,
    validators: Vec<Validator>,
    filters: Vec<Filter>,
}

impl FieldRules {
    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }
}

/// Per-action input validation schema
#[derive(Clone, Default)]
pub struct InputSchema {
    fields: IndexMap<String, FieldRules>,
}

impl fmt::Debug for InputSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputSchema")
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl InputSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a required field
    pub fn required(mut self, field: &str) -> Self {
        self.rules(field).required = true;
        self
    }

    /// Declare an optional field
    pub fn optional(mut self, field: &str) -> Self {
        self.rules(field);
        self
    }

    /// Accept an explicit `null` for a field (declaring it if needed)
    pub fn nullable(mut self, field: &str) -> Self {
        self.rules(field).nullable = true;
        self
    }

    /// Value used on full writes when the field is absent
    pub fn default_value(mut self, field: &str, value: Value) -> Self {
        self.rules(field).default = Some(value);
        self
    }

    /// Add a validator to a field (declaring it if needed)
    pub fn validate<V>(mut self, field: &str, validator: V) -> Self
    where
        V: Fn(&str, &Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.rules(field).validators.push(Arc::new(validator));
        self
    }

    /// Add a filter to a field (declaring it if needed)
    pub fn filter<F>(mut self, field: &str, filter: F) -> Self
    where
        F: Fn(&str, Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.rules(field).filters.push(Arc::new(filter));
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    fn rules(&mut self, field: &str) -> &mut FieldRules {
        self.fields.entry(field.to_string()).or_default()
    }

    /// Validate a payload and return the cleaned object
    ///
    /// Unknown keys are dropped. With `partial`, absent fields are skipped
    /// entirely (no required check, no default). Explicit `null` is rejected
    /// unless the field was declared nullable.
    pub fn validate_and_filter(
        &self,
        payload: Value,
        partial: bool,
    ) -> Result<Value, Vec<FieldValidationError>> {
        let Value::Object(mut input) = payload else {
            return Err(vec![FieldValidationError {
                field: "non_field_errors".to_string(),
                message: "Expected a JSON object".to_string(),
            }]);
        };

        let mut cleaned = Map::new();
        let mut errors = Vec::new();

        for (field, rules) in &self.fields {
            let value = match input.remove(field) {
                Some(value) => value,
                None if partial => continue,
                None => match &rules.default {
                    Some(default) => default.clone(),
                    None if rules.required => {
                        errors.push(FieldValidationError {
                            field: field.clone(),
                            message: format!("'{}' is required", field),
                        });
                        continue;
                    }
                    None => continue,
                },
            };

            let mut value = value;
            let mut failed = false;
            for filter in &rules.filters {
                match filter(field, value.clone()) {
                    Ok(next) => value = next,
                    Err(e) => {
                        errors.push(FieldValidationError {
                            field: field.clone(),
                            message: e.to_string(),
                        });
                        failed = true;
                        break;
                    }
                }
            }
            if failed {
                continue;
            }

            if value.is_null() {
                if rules.nullable {
                    cleaned.insert(field.clone(), value);
                } else {
                    errors.push(FieldValidationError {
                        field: field.clone(),
                        message: format!("'{}' may not be null", field),
                    });
                }
                continue;
            }

            let before = errors.len();
            for validator in &rules.validators {
                if let Err(message) = validator(field, &value) {
                    errors.push(FieldValidationError {
                        field: field.clone(),
                        message,
                    });
                }
            }
            if errors.len() == before {
                cleaned.insert(field.clone(), value);
            }
        }

        if errors.is_empty() {
            Ok(Value::Object(cleaned))
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::validation::{filters, validators};
    use serde_json::json;

    fn product_schema() -> InputSchema {
        InputSchema::new()
            .required("name")
            .filter("name", filters::trim())
            .validate("name", validators::string_length(1, 10))
            .required("price")
            .validate("price", validators::is_number())
            .validate("price", validators::positive())
            .filter("price", filters::round_decimals(2))
            .optional("description")
            .optional("category")
            .nullable("category")
            .default_value("is_published", json!(true))
    }

    #[test]
    fn test_valid_payload_is_cleaned() {
        let out = product_schema()
            .validate_and_filter(json!({"name": "  Lamp ", "price": 9.999, "extra": 1}), false)
            .unwrap();
        assert_eq!(out, json!({"name": "Lamp", "price": 10.0, "is_published": true}));
    }

    #[test]
    fn test_missing_required_fields_are_all_reported() {
        let errors = product_schema().validate_and_filter(json!({}), false).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "price"]);
    }

    #[test]
    fn test_partial_skips_absent_fields() {
        let out = product_schema()
            .validate_and_filter(json!({"price": 5}), true)
            .unwrap();
        assert_eq!(out, json!({"price": 5.0}));
    }

    #[test]
    fn test_partial_still_validates_present_fields() {
        let errors = product_schema()
            .validate_and_filter(json!({"price": -1}), true)
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "price");
    }

    #[test]
    fn test_null_on_required_field() {
        let errors = product_schema()
            .validate_and_filter(json!({"name": null, "price": 1}), false)
            .unwrap_err();
        assert_eq!(errors[0].field, "name");
        assert!(errors[0].message.contains("null"));
    }

    #[test]
    fn test_null_kept_for_nullable_field() {
        let out = product_schema()
            .validate_and_filter(json!({"name": "a", "price": 1, "category": null}), false)
            .unwrap();
        assert_eq!(out["category"], Value::Null);
    }

    #[test]
    fn test_null_rejected_for_optional_field() {
        let errors = product_schema()
            .validate_and_filter(json!({"description": null, "category": null}), true)
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "description");
        assert!(errors[0].message.contains("may not be null"));
    }

    #[test]
    fn test_non_object_payload() {
        let errors = product_schema().validate_and_filter(json!([1, 2]), false).unwrap_err();
        assert_eq!(errors[0].field, "non_field_errors");
    }

    #[test]
    fn test_schema_declares_fields_in_order() {
        let fields: Vec<_> = product_schema().fields().map(str::to_string).collect();
        assert_eq!(fields, vec!["name", "price", "description", "category", "is_published"]);
    }
}
