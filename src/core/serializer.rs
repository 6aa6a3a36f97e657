//! Serializer pairs: input validation plus output projection
//!
//! The dispatcher hands each request one [`SerializerPair`]. Its input side
//! validates writes; its output side shapes the JSON representation.

use crate::core::action::Action;
use crate::core::error::{CatalogError, CatalogResult, RequestError, ValidationError};
use crate::core::validation::InputSchema;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Which keys of a representation are kept
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Projection {
    #[default]
    All,
    /// Keep only these keys
    Fields(Vec<String>),
    /// Drop these keys
    Exclude(Vec<String>),
}

impl Projection {
    pub fn fields(fields: &[&str]) -> Self {
        Projection::Fields(fields.iter().map(|f| f.to_string()).collect())
    }

    pub fn exclude(fields: &[&str]) -> Self {
        Projection::Exclude(fields.iter().map(|f| f.to_string()).collect())
    }

    /// Apply to an object; non-objects pass through untouched
    pub fn apply(&self, value: Value) -> Value {
        let Value::Object(mut map) = value else {
            return value;
        };
        match self {
            Projection::All => {}
            Projection::Fields(keep) => map.retain(|key, _| keep.iter().any(|k| k == key)),
            Projection::Exclude(drop) => map.retain(|key, _| !drop.iter().any(|k| k == key)),
        }
        Value::Object(map)
    }
}

/// Input schema and output projection selected together
#[derive(Clone, Default)]
pub struct SerializerPair {
    name: String,
    input: Option<Arc<InputSchema>>,
    output: Projection,
}

impl fmt::Debug for SerializerPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializerPair")
            .field("name", &self.name)
            .field("accepts_input", &self.input.is_some())
            .field("output", &self.output)
            .finish()
    }
}

impl PartialEq for SerializerPair {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl SerializerPair {
    /// A read-only serializer with the full representation
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input: None,
            output: Projection::All,
        }
    }

    pub fn with_input(mut self, schema: InputSchema) -> Self {
        self.input = Some(Arc::new(schema));
        self
    }

    pub fn with_output(mut self, projection: Projection) -> Self {
        self.output = projection;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn accepts_input(&self) -> bool {
        self.input.is_some()
    }

    /// Validate an input payload
    ///
    /// A serializer without an input schema rejects every write for `action`.
    pub fn validate(
        &self,
        payload: Value,
        partial: bool,
        action: &Action,
        resource: &str,
    ) -> CatalogResult<Value> {
        let Some(schema) = &self.input else {
            return Err(RequestError::MethodNotAllowed {
                method: action.to_string(),
                resource: resource.to_string(),
            }
            .into());
        };
        schema
            .validate_and_filter(payload, partial)
            .map_err(|errors| CatalogError::Validation(ValidationError::FieldErrors(errors)))
    }

    /// Shape a full representation through the output projection
    pub fn represent(&self, value: Value) -> Value {
        self.output.apply(value)
    }
}
