use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::models::session::FlowError;

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// A Redis error.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// A record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] sonic_rs::Error),

    /// A page template failed to render.
    #[error("Template error: {0}")]
    Template(#[from] handlebars::RenderError),

    /// Registration for an email that already has an account.
    #[error("Account already exists")]
    AlreadyExists,

    /// Unknown email or wrong password.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// A booking-flow step attempted out of order.
    #[error(transparent)]
    Flow(#[from] FlowError),

    /// A validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A form was posted without the session's CSRF token.
    #[error("CSRF token missing or invalid")]
    Csrf,

    /// An operator endpoint was called without the right token.
    #[error("Authorization failed")]
    Unauthorized,

    /// A resource not found error.
    #[error("Resource not found")]
    NotFound,

    /// The notification channel rejected a message.
    #[error("Notification error: {0}")]
    Notification(String),

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Redis(ref e) => {
                tracing::error!("Redis error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
            }

            AppError::Serialization(ref e) => {
                tracing::error!("Serialization error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }

            AppError::Template(ref e) => {
                tracing::error!("Template error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }

            AppError::AlreadyExists => {
                tracing::debug!("Registration for existing account");
                (StatusCode::CONFLICT, "Account already exists.".to_string())
            }

            AppError::InvalidCredentials => {
                tracing::warn!("Authentication failed");
                (StatusCode::UNAUTHORIZED, "Invalid email or password.".to_string())
            }

            AppError::Flow(flow) => {
                tracing::debug!("Out-of-order request: {}", flow);
                return Redirect::to(flow.redirect_target()).into_response();
            }

            AppError::Validation(ref msg) => {
                tracing::debug!("Validation error: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }

            AppError::Csrf => {
                tracing::warn!("CSRF token rejected");
                (StatusCode::FORBIDDEN, "Invalid or missing CSRF token".to_string())
            }

            AppError::Unauthorized => {
                tracing::warn!("Authorization failed");
                (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
            }

            AppError::NotFound => {
                tracing::debug!("Resource not found");
                (StatusCode::NOT_FOUND, "Resource not found".to_string())
            }

            AppError::Notification(ref msg) => {
                tracing::error!("Notification error: {}", msg);
                (StatusCode::BAD_GATEWAY, "Notification error".to_string())
            }

            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        (status, message).into_response()
    }
}
