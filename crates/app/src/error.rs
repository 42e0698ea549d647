//! Unified error handling for the HTTP layer.
//!
//! Every failure leaves the app as the JSON envelope
//! `{"success": false, "message": "...", "error"?: "...", "userErrors"?: [...]}`.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::ValidationError;
use crate::shopify::{ShopifyError, UserError};

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(RepositoryError),

    /// Shopify API operation failed.
    #[error("Shopify error: {0}")]
    Shopify(ShopifyError),

    /// Shopify rejected a mutation's input.
    #[error("Shopify rejected the request")]
    UserErrors(Vec<UserError>),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or invalid session.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Plan limit reached or subscription expired.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("Resource not found".to_string()),
            RepositoryError::Conflict(what) => Self::BadRequest(format!("{what} already exists")),
            other => Self::Database(other),
        }
    }
}

impl From<ShopifyError> for AppError {
    fn from(err: ShopifyError) -> Self {
        match err {
            ShopifyError::UserErrors(errors) => Self::UserErrors(errors),
            other => Self::Shopify(other),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Body of every error response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_errors: Option<Vec<UserError>>,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Shopify(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::UserErrors(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    fn body(self) -> ErrorBody {
        let (message, error, user_errors) = match self {
            // Don't expose internal error details to clients
            Self::Database(_) | Self::Internal(_) => {
                ("Internal server error".to_string(), None, None)
            }
            Self::Shopify(err) => (
                "Shopify request failed".to_string(),
                Some(err.to_string()),
                None,
            ),
            Self::UserErrors(errors) => {
                let message = errors
                    .first()
                    .map_or_else(|| "Shopify rejected the request".to_string(), |e| {
                        e.message.clone()
                    });
                (message, None, Some(errors))
            }
            Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::BadRequest(msg) => (msg, None, None),
        };

        ErrorBody {
            success: false,
            message,
            error,
            user_errors,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if matches!(
            self,
            Self::Database(_) | Self::Internal(_) | Self::Shopify(_)
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        (status, Json(self.body())).into_response()
    }
}
