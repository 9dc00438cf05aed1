use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

use crate::auth::PasswordConfig;
use crate::child::repository::ChildRepository;
use crate::session::TokenConfig;
use crate::user::repository::UserRepository;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub user_repository: Arc<dyn UserRepository + Send + Sync>,
    pub child_repository: Arc<dyn ChildRepository + Send + Sync>,
    pub token_config: TokenConfig,
    pub password_config: PasswordConfig,
}

impl AppState {
    pub fn new(
        user_repository: Arc<dyn UserRepository + Send + Sync>,
        child_repository: Arc<dyn ChildRepository + Send + Sync>,
        token_config: TokenConfig,
        password_config: PasswordConfig,
    ) -> Self {
        Self {
            user_repository,
            child_repository,
            token_config,
            password_config,
        }
    }
}

/// A single rejected input field, reported back in the `details` array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{message}")]
    Validation {
        message: String,
        details: Vec<FieldError>,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Deliberately identical for unknown emails and wrong passwords
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Access denied. No token provided.")]
    MissingToken,

    #[error("Token expired")]
    ExpiredToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("JWT error: {0}")]
    JwtError(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error")]
    Internal,
}

impl AppError {
    /// Validation failure carrying field-level details
    pub fn validation(details: Vec<FieldError>) -> Self {
        AppError::Validation {
            message: "Validation failed".to_string(),
            details,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::MissingToken | AppError::ExpiredToken => {
                StatusCode::UNAUTHORIZED
            }
            AppError::InvalidToken => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::JwtError(_)
            | AppError::PasswordHash(_)
            | AppError::DatabaseError(_)
            | AppError::Config(_)
            | AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let (error_message, details) = match self {
            AppError::Validation { message, details } => (message, Some(details)),
            AppError::Conflict(msg) | AppError::NotFound(msg) => (msg, None),
            AppError::InvalidCredentials
            | AppError::MissingToken
            | AppError::ExpiredToken
            | AppError::InvalidToken => (self.to_string(), None),
            AppError::JwtError(_)
            | AppError::PasswordHash(_)
            | AppError::DatabaseError(_)
            | AppError::Config(_)
            | AppError::Internal => {
                // Internal details stay in the server log
                error!(error = %self, "Request failed with internal error");
                ("Internal Server Error".to_string(), None)
            }
        };

        let mut body = json!({
            "success": false,
            "error": error_message,
        });
        if let Some(details) = details.filter(|d| !d.is_empty()) {
            body["details"] = json!(details);
        }

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation {
            message: "Invalid JSON payload".to_string(),
            details: vec![FieldError::new("body", rejection.body_text())],
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::validation(vec![FieldError::new("id", rejection.body_text())])
    }
}

/// JSON body extractor whose rejections go through [`AppError`]
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Path extractor whose rejections go through [`AppError`]
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);


#[cfg(test)]
mod tests {
    use super::*;

    async fn response_json(error: AppError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_validation_error_includes_details() {
        let (status, body) = response_json(AppError::validation(vec![FieldError::new(
            "age",
            "Age must be between 1 and 18",
        )]))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Validation failed");
        assert_eq!(body["details"][0]["field"], "age");
    }

    #[tokio::test]
    async fn test_token_errors_map_to_distinct_statuses() {
        let (missing, _) = response_json(AppError::MissingToken).await;
        let (expired, body) = response_json(AppError::ExpiredToken).await;
        let (invalid, _) = response_json(AppError::InvalidToken).await;

        assert_eq!(missing, StatusCode::UNAUTHORIZED);
        assert_eq!(expired, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Token expired");
        assert_eq!(invalid, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_database_error_is_opaque() {
        let (status, body) =
            response_json(AppError::DatabaseError("no such table: users".to_string())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal Server Error");
        assert!(body.get("details").is_none());
        assert!(!body.to_string().contains("no such table"));
    }
}
