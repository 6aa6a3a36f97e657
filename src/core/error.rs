//! Typed error handling for the storefront
//!
//! Every failure a handler can surface is a [`CatalogError`]. Each category
//! knows its HTTP status and a stable machine-readable code, and the whole
//! enum renders as a JSON body through axum's `IntoResponse`.
//!
//! # Error Categories
//!
//! - [`EntityError`]: missing records and dangling references
//! - [`ValidationError`]: malformed or invalid request payloads
//! - [`RequestError`]: authentication/authorization and routing problems
//! - [`AuthError`]: login and credential handling
//! - [`ConfigError`]: configuration loading
//! - [`StoreError`]: storage backend failures
//!
//! # Example
//!
//! ```rust,ignore
//! async fn load(id: Uuid) -> CatalogResult<Product> {
//!     products.get(&id).await?.ok_or_else(|| {
//!         EntityError::NotFound { entity_type: "product".into(), id }.into()
//!     })
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// The main error type of the crate
#[derive(Debug)]
pub enum CatalogError {
    /// Record lookups and references
    Entity(EntityError),

    /// Payload validation
    Validation(ValidationError),

    /// Request-level failures (auth, ids, methods)
    Request(RequestError),

    /// Login and credential failures
    Auth(AuthError),

    /// Configuration errors
    Config(ConfigError),

    /// Storage backend errors
    Storage(StoreError),

    /// Should not happen in normal operation
    Internal(String),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Entity(e) => write!(f, "{}", e),
            CatalogError::Validation(e) => write!(f, "{}", e),
            CatalogError::Request(e) => write!(f, "{}", e),
            CatalogError::Auth(e) => write!(f, "{}", e),
            CatalogError::Config(e) => write!(f, "{}", e),
            CatalogError::Storage(e) => write!(f, "{}", e),
            CatalogError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Entity(e) => Some(e),
            CatalogError::Validation(e) => Some(e),
            CatalogError::Request(e) => Some(e),
            CatalogError::Auth(e) => Some(e),
            CatalogError::Config(e) => Some(e),
            CatalogError::Storage(e) => Some(e),
            CatalogError::Internal(_) => None,
        }
    }
}

/// JSON body returned for every error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl CatalogError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            CatalogError::Entity(e) => e.status_code(),
            CatalogError::Validation(_) => StatusCode::BAD_REQUEST,
            CatalogError::Request(e) => e.status_code(),
            CatalogError::Auth(e) => e.status_code(),
            CatalogError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CatalogError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CatalogError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            CatalogError::Entity(e) => e.error_code(),
            CatalogError::Validation(_) => "VALIDATION_ERROR",
            CatalogError::Request(e) => e.error_code(),
            CatalogError::Auth(e) => e.error_code(),
            CatalogError::Config(_) => "CONFIG_ERROR",
            CatalogError::Storage(_) => "STORAGE_ERROR",
            CatalogError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to an error response body
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            CatalogError::Entity(EntityError::NotFound { entity_type, id }) => {
                Some(serde_json::json!({
                    "entity_type": entity_type,
                    "id": id.to_string()
                }))
            }
            CatalogError::Entity(EntityError::InvalidReference { field, id }) => {
                Some(serde_json::json!({
                    "field": field,
                    "id": id.to_string()
                }))
            }
            CatalogError::Validation(ValidationError::FieldErrors(errors)) => {
                Some(serde_json::json!({ "fields": errors }))
            }
            _ => None,
        }
    }

    /// Shorthand for a single-field validation failure
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        CatalogError::Validation(ValidationError::FieldErrors(vec![FieldValidationError {
            field: field.into(),
            message: message.into(),
        }]))
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), "{}", self);
        }
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Entity Errors
// =============================================================================

/// Errors related to records
#[derive(Debug)]
pub enum EntityError {
    /// Record was not found
    NotFound { entity_type: String, id: Uuid },

    /// A payload referenced a record that does not exist
    InvalidReference { field: String, id: Uuid },
}

impl fmt::Display for EntityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityError::NotFound { entity_type, id } => {
                write!(f, "{} with id '{}' not found", entity_type, id)
            }
            EntityError::InvalidReference { field, id } => {
                write!(f, "Invalid pk '{}' for field '{}': object does not exist", id, field)
            }
        }
    }
}

impl std::error::Error for EntityError {}

impl EntityError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            EntityError::NotFound { .. } => StatusCode::NOT_FOUND,
            EntityError::InvalidReference { .. } => StatusCode::BAD_REQUEST,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            EntityError::NotFound { .. } => "ENTITY_NOT_FOUND",
            EntityError::InvalidReference { .. } => "INVALID_REFERENCE",
        }
    }
}

impl From<EntityError> for CatalogError {
    fn from(err: EntityError) -> Self {
        CatalogError::Entity(err)
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors related to input validation
#[derive(Debug)]
pub enum ValidationError {
    /// One or more field errors
    FieldErrors(Vec<FieldValidationError>),

    /// Body is not valid JSON
    InvalidJson { message: String },

    /// Invalid UUID format
    InvalidUuid { value: String },
}

/// A single field validation error
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldValidationError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::FieldErrors(errors) => {
                let msgs: Vec<String> = errors
                    .iter()
                    .map(|e| format!("{}: {}", e.field, e.message))
                    .collect();
                write!(f, "Validation errors: {}", msgs.join(", "))
            }
            ValidationError::InvalidJson { message } => {
                write!(f, "Invalid JSON: {}", message)
            }
            ValidationError::InvalidUuid { value } => {
                write!(f, "Invalid UUID format: {}", value)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for CatalogError {
    fn from(err: ValidationError) -> Self {
        CatalogError::Validation(err)
    }
}

// =============================================================================
// Request Errors
// =============================================================================

/// Errors related to HTTP requests
#[derive(Debug)]
pub enum RequestError {
    /// Path id is not a UUID
    InvalidEntityId { id: String },

    /// Credentials were not provided or are invalid
    Unauthorized { message: String },

    /// Authenticated but not allowed
    Forbidden { message: String },

    /// The resolved serializer accepts no input for this action
    MethodNotAllowed { method: String, resource: String },
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::InvalidEntityId { id } => {
                write!(f, "Invalid entity ID format: '{}'", id)
            }
            RequestError::Unauthorized { message } => {
                write!(f, "Unauthorized: {}", message)
            }
            RequestError::Forbidden { message } => {
                write!(f, "Forbidden: {}", message)
            }
            RequestError::MethodNotAllowed { method, resource } => {
                write!(f, "Method {} not allowed on {}", method, resource)
            }
        }
    }
}

impl std::error::Error for RequestError {}

impl RequestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RequestError::InvalidEntityId { .. } => StatusCode::BAD_REQUEST,
            RequestError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            RequestError::Forbidden { .. } => StatusCode::FORBIDDEN,
            RequestError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            RequestError::InvalidEntityId { .. } => "INVALID_ENTITY_ID",
            RequestError::Unauthorized { .. } => "UNAUTHORIZED",
            RequestError::Forbidden { .. } => "FORBIDDEN",
            RequestError::MethodNotAllowed { .. } => "METHOD_NOT_ALLOWED",
        }
    }
}

impl From<RequestError> for CatalogError {
    fn from(err: RequestError) -> Self {
        CatalogError::Request(err)
    }
}

// =============================================================================
// Auth Errors
// =============================================================================

/// Errors raised while logging in or hashing credentials
#[derive(Debug)]
pub enum AuthError {
    /// Unknown user or wrong password
    InvalidCredentials,

    /// Password hashing or hash parsing failed
    Crypto(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials => {
                write!(f, "The user does not exist or the password is incorrect.")
            }
            AuthError::Crypto(message) => write!(f, "Credential hashing failed: {}", message),
        }
    }
}

impl std::error::Error for AuthError {}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials => StatusCode::BAD_REQUEST,
            AuthError::Crypto(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::Crypto(_) => "CREDENTIAL_ERROR",
        }
    }
}

impl From<AuthError> for CatalogError {
    fn from(err: AuthError) -> Self {
        CatalogError::Auth(err)
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to parse configuration
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// Invalid value in configuration
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    /// IO error while reading configuration
    IoError { message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError { file, message } => {
                if let Some(file) = file {
                    write!(f, "Failed to parse config file '{}': {}", file, message)
                } else {
                    write!(f, "Failed to parse config: {}", message)
                }
            }
            ConfigError::InvalidValue {
                field,
                value,
                message,
            } => {
                write!(
                    f,
                    "Invalid value '{}' for field '{}': {}",
                    value, field, message
                )
            }
            ConfigError::IoError { message } => {
                write!(f, "IO error: {}", message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for CatalogError {
    fn from(err: ConfigError) -> Self {
        CatalogError::Config(err)
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors raised by storage backends
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No row with this id
    #[error("{entity_type} with id '{id}' not found")]
    NotFound { entity_type: String, id: Uuid },

    /// A row with this id already exists
    #[error("{entity_type} with id '{id}' already exists")]
    Duplicate { entity_type: String, id: Uuid },

    /// A lock guarding the backend was poisoned
    #[error("storage lock poisoned: {0}")]
    Poisoned(String),
}

/// Result type of storage operations
pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity_type, id } => {
                CatalogError::Entity(EntityError::NotFound { entity_type, id })
            }
            other => CatalogError::Storage(other),
        }
    }
}

// =============================================================================
// Conversions from external errors
// =============================================================================

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Validation(ValidationError::InvalidJson {
            message: err.to_string(),
        })
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::Config(ConfigError::IoError {
            message: err.to_string(),
        })
    }
}

impl From<serde_yaml::Error> for CatalogError {
    fn from(err: serde_yaml::Error) -> Self {
        CatalogError::Config(ConfigError::ParseError {
            file: None,
            message: err.to_string(),
        })
    }
}

impl From<uuid::Error> for CatalogError {
    fn from(err: uuid::Error) -> Self {
        CatalogError::Validation(ValidationError::InvalidUuid {
            value: err.to_string(),
        })
    }
}

impl From<validator::ValidationErrors> for CatalogError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<FieldValidationError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| FieldValidationError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        CatalogError::Validation(ValidationError::FieldErrors(fields))
    }
}

impl From<anyhow::Error> for CatalogError {
    fn from(err: anyhow::Error) -> Self {
        CatalogError::Internal(err.to_string())
    }
}

// =============================================================================
// Result type alias
// =============================================================================

/// A specialized Result type for storefront operations
pub type CatalogResult<T> = Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_error_display() {
        let err = EntityError::NotFound {
            entity_type: "product".to_string(),
            id: Uuid::nil(),
        };
        assert!(err.to_string().contains("product"));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_entity_error_status_code() {
        let err = EntityError::NotFound {
            entity_type: "product".to_string(),
            id: Uuid::nil(),
        };
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err = EntityError::InvalidReference {
            field: "category".to_string(),
            id: Uuid::nil(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_store_not_found_becomes_entity_not_found() {
        let err: CatalogError = StoreError::NotFound {
            entity_type: "tag".to_string(),
            id: Uuid::nil(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.error_code(), "ENTITY_NOT_FOUND");
    }

    #[test]
    fn test_store_poisoned_is_server_error() {
        let err: CatalogError = StoreError::Poisoned("boom".to_string()).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), "STORAGE_ERROR");
    }

    #[test]
    fn test_field_shorthand_carries_details() {
        let err = CatalogError::field("price", "Ensure this value is greater than 0.");
        let response = err.to_response();
        assert_eq!(response.code, "VALIDATION_ERROR");
        let details = response.details.expect("details");
        assert_eq!(details["fields"][0]["field"], "price");
    }

    #[test]
    fn test_request_error_status_codes() {
        assert_eq!(
            RequestError::Unauthorized {
                message: "test".to_string()
            }
            .status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            RequestError::Forbidden {
                message: "test".to_string()
            }
            .status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            RequestError::MethodNotAllowed {
                method: "POST".to_string(),
                resource: "tags".to_string()
            }
            .status_code(),
            StatusCode::METHOD_NOT_ALLOWED
        );
    }

    #[test]
    fn test_invalid_credentials_message() {
        let err: CatalogError = AuthError::InvalidCredentials.into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.to_string(),
            "The user does not exist or the password is incorrect."
        );
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: CatalogError = json_err.into();
        assert!(matches!(
            err,
            CatalogError::Validation(ValidationError::InvalidJson { .. })
        ));
    }
}
