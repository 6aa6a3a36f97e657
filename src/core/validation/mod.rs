//! Validation and filtering system
//!
//! Input schemas validate and clean request payloads before they are merged
//! into records. Schemas are attached to actions through serializer pairs.

pub mod extractor;
pub mod filters;
pub mod schema;
pub mod validators;

pub use extractor::JsonPayload;
pub use schema::{FieldRules, InputSchema};
