//! Tests for the typed error handling system
//!
//! These tests verify that:
//! - Errors return correct HTTP status codes
//! - Error bodies carry a stable code and field details
//! - Conversions from storage and external errors land in the right category

use axum::http::StatusCode;
use axum::response::IntoResponse;
use storefront::core::error::{
    AuthError, CatalogError, ConfigError, EntityError, FieldValidationError, RequestError,
    StoreError, ValidationError,
};
use storefront::prelude::*;

fn not_found() -> CatalogError {
    EntityError::NotFound {
        entity_type: "product".to_string(),
        id: Uuid::new_v4(),
    }
    .into()
}

// =============================================================================
// HTTP Status Code Tests
// =============================================================================

mod status_code_tests {
    use super::*;

    #[test]
    fn test_entity_not_found_returns_404() {
        assert_eq!(not_found().status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_invalid_reference_returns_400() {
        let err: CatalogError = EntityError::InvalidReference {
            field: "category".to_string(),
            id: Uuid::new_v4(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_request_errors() {
        let cases = [
            (
                RequestError::InvalidEntityId { id: "abc".to_string() },
                StatusCode::BAD_REQUEST,
            ),
            (
                RequestError::Unauthorized { message: "no token".to_string() },
                StatusCode::UNAUTHORIZED,
            ),
            (
                RequestError::Forbidden { message: "not yours".to_string() },
                StatusCode::FORBIDDEN,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(CatalogError::from(err).status_code(), status);
        }
    }

    #[test]
    fn test_server_side_failures_return_500() {
        let config: CatalogError = ConfigError::IoError { message: "gone".to_string() }.into();
        let crypto: CatalogError = AuthError::Crypto("bad hash".to_string()).into();
        let internal = CatalogError::Internal("unexpected".to_string());
        for err in [config, crypto, internal] {
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}

// =============================================================================
// Error Response Tests
// =============================================================================

mod error_response_tests {
    use super::*;

    #[test]
    fn test_not_found_details() {
        let id = Uuid::new_v4();
        let err: CatalogError = EntityError::NotFound {
            entity_type: "tag".to_string(),
            id,
        }
        .into();
        let response = err.to_response();
        assert_eq!(response.code, "ENTITY_NOT_FOUND");
        let details = response.details.unwrap();
        assert_eq!(details["entity_type"], "tag");
        assert_eq!(details["id"], id.to_string());
    }

    #[test]
    fn test_field_errors_keep_their_order() {
        let err = CatalogError::Validation(ValidationError::FieldErrors(vec![
            FieldValidationError {
                field: "name".to_string(),
                message: "This field is required.".to_string(),
            },
            FieldValidationError {
                field: "price".to_string(),
                message: "Ensure this value is greater than 0.".to_string(),
            },
        ]));
        let response = err.to_response();
        assert_eq!(response.code, "VALIDATION_ERROR");
        let fields = &response.details.unwrap()["fields"];
        assert_eq!(fields[0]["field"], "name");
        assert_eq!(fields[1]["field"], "price");
    }

    #[test]
    fn test_auth_errors_have_no_details() {
        let err: CatalogError = RequestError::Unauthorized {
            message: "Invalid token.".to_string(),
        }
        .into();
        let response = err.to_response();
        assert_eq!(response.code, "UNAUTHORIZED");
        assert!(response.details.is_none());
    }
}

// =============================================================================
// Conversion Tests
// =============================================================================

mod error_conversion_tests {
    use super::*;

    #[test]
    fn test_store_not_found_is_entity_not_found() {
        let err: CatalogError = StoreError::NotFound {
            entity_type: "image".to_string(),
            id: Uuid::new_v4(),
        }
        .into();
        assert!(matches!(err, CatalogError::Entity(EntityError::NotFound { .. })));
    }

    #[test]
    fn test_store_duplicate_is_storage_error() {
        let err: CatalogError = StoreError::Duplicate {
            entity_type: "tag".to_string(),
            id: Uuid::new_v4(),
        }
        .into();
        assert_eq!(err.error_code(), "STORAGE_ERROR");
    }

    #[test]
    fn test_uuid_error_is_validation_error() {
        let uuid_err = Uuid::parse_str("not-a-uuid").unwrap_err();
        let err: CatalogError = uuid_err.into();
        assert!(matches!(
            err,
            CatalogError::Validation(ValidationError::InvalidUuid { .. })
        ));
    }

    #[test]
    fn test_anyhow_error_is_internal() {
        let err: CatalogError = anyhow::anyhow!("disk on fire").into();
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
        assert!(err.to_string().contains("disk on fire"));
    }
}

// =============================================================================
// IntoResponse Tests
// =============================================================================

mod into_response_tests {
    use super::*;

    #[tokio::test]
    async fn test_body_is_json_error_response() {
        let response = not_found().into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "ENTITY_NOT_FOUND");
        assert!(body["message"].as_str().unwrap().contains("not found"));
    }

    #[test]
    fn test_invalid_credentials_status() {
        let response = CatalogError::from(AuthError::InvalidCredentials).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
