//! Token login endpoint

use crate::catalog::Accounts;
use crate::core::error::{AuthError, CatalogError};
use crate::core::validation::JsonPayload;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

/// Body of `POST /auth/login`
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub username: String,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub password: String,
}

async fn login(State(accounts): State<Accounts>, JsonPayload(payload): JsonPayload) -> Response {
    let request: LoginRequest = match serde_json::from_value(payload) {
        Ok(request) => request,
        Err(e) => {
            return CatalogError::field("non_field_errors", e.to_string()).into_response();
        }
    };
    if let Err(errors) = request.validate() {
        return CatalogError::from(errors).into_response();
    }

    match accounts.login(&request.username, &request.password).await {
        Ok(response) => Json(response).into_response(),
        Err(CatalogError::Auth(AuthError::InvalidCredentials)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": AuthError::InvalidCredentials.to_string() })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Routes mounted under `/auth`
pub fn routes(accounts: Accounts) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .with_state(accounts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ValidationError;

    #[test]
    fn test_login_request_validation() {
        let ok = LoginRequest {
            username: "bob".into(),
            password: "pw".into(),
        };
        assert!(ok.validate().is_ok());

        let blank = LoginRequest {
            username: String::new(),
            password: String::new(),
        };
        let err = CatalogError::from(blank.validate().unwrap_err());
        match err {
            CatalogError::Validation(ValidationError::FieldErrors(fields)) => {
                let names: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(names, vec!["password", "username"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
