use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::db::services::{RecipeError, SubscriptionError};
use crate::services::media_service::MediaError;
use crate::validation::FieldErrors;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),
    #[error("User already exists: {0}")]
    UserAlreadyExists(String),
    #[error("User not found")]
    UserNotFound,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Password hashing failed: {0}")]
    PasswordHashingError(String),
    #[error("JWT creation failed: {0}")]
    TokenCreationError(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Internal server error: {0}")]
    InternalServerError(String),
    #[error("Not Found: {0}")]
    NotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Field errors go out as-is: {"field": ["message"]}
            AppError::Validation(errors) => {
                return (StatusCode::BAD_REQUEST, Json(errors)).into_response();
            }
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::UserAlreadyExists(msg) => (StatusCode::CONFLICT, msg),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "User not found".to_string()),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string()),
            AppError::PasswordHashingError(msg) => {
                error!(error = %msg, "Password hashing failed.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Password hashing error: {msg}"),
                )
            }
            AppError::TokenCreationError(msg) => {
                error!(error = %msg, "Token creation failed.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Token creation error: {msg}"),
                )
            }
            AppError::DatabaseError(msg) => {
                error!(error = %msg, "Database error while handling request.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Database error: {msg}"),
                )
            }
            AppError::InternalServerError(msg) => {
                error!(error = %msg, "Internal server error.");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };
        (status, Json(serde_json::json!({ "error": error_message }))).into_response()
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        AppError::Validation(errors)
    }
}

impl From<RecipeError> for AppError {
    fn from(err: RecipeError) -> Self {
        match err {
            RecipeError::DbErr(db_err) => AppError::DatabaseError(db_err.to_string()),
            RecipeError::NotFound(id) => AppError::NotFound(format!("Recipe {id} not found")),
            RecipeError::Forbidden(_) => AppError::Forbidden(err.to_string()),
            RecipeError::Validation(errors) => AppError::Validation(errors),
        }
    }
}

impl From<SubscriptionError> for AppError {
    fn from(err: SubscriptionError) -> Self {
        match err {
            SubscriptionError::DbErr(db_err) => AppError::DatabaseError(db_err.to_string()),
            SubscriptionError::AuthorNotFound(id) => AppError::NotFound(format!("User {id} not found")),
            SubscriptionError::SelfSubscription | SubscriptionError::AlreadySubscribed(_) => {
                AppError::InvalidInput(err.to_string())
            }
        }
    }
}

impl From<MediaError> for AppError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::InvalidEncoding(_)
            | MediaError::Empty
            | MediaError::UnsupportedType(_)
            | MediaError::NotAnImage => {
                AppError::Validation(FieldErrors::single("image", err.to_string()))
            }
            MediaError::Io(io_err) => AppError::InternalServerError(format!("Failed to store image: {io_err}")),
        }
    }
}
