//! Axum extractor for raw JSON payloads
//!
//! Which schema applies depends on the resolved action, so handlers take the
//! body as a plain `Value` and validate it after dispatch. This extractor only
//! turns body rejections into the crate's error format.

use crate::core::error::{CatalogError, ValidationError};
use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde_json::Value;

/// JSON request body, rejected with a `VALIDATION_ERROR` response
pub struct JsonPayload(pub Value);

impl JsonPayload {
    /// Get the inner payload
    pub fn into_inner(self) -> Value {
        self.0
    }
}

impl std::ops::Deref for JsonPayload {
    type Target = Value;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequest<S> for JsonPayload
where
    S: Send + Sync,
{
    type Rejection = CatalogError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<Value>::from_request(req, state).await {
            Ok(Json(payload)) => Ok(JsonPayload(payload)),
            Err(rejection) => Err(CatalogError::Validation(ValidationError::InvalidJson {
                message: rejection.body_text(),
            })),
        }
    }
}
