//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Every error body is JSON. Most are `{"message": "..."}`; payment failures
//! are `{"success": false, "message": "..."}` so the checkout client can
//! treat all payment outcomes alike.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::payments::PaymentError;

const INTERNAL: &str = "Internal server error";

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Charging the cart failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated or lacks the capability.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_)
                | Self::Internal(_)
                | Self::Payment(PaymentError::Repository(_) | PaymentError::Amount(_))
                | Self::Auth(
                    AuthError::Repository(_) | AuthError::PasswordHash | AuthError::TokenSigning
                )
        )
    }

    fn status(&self) -> StatusCode {
        if self.is_server_error() {
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
        match self {
            Self::Auth(
                AuthError::InvalidCredentials
                | AuthError::InvalidToken(_)
                | AuthError::TokenExpired,
            )
            | Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// The message shown to the client. Internal details are never exposed.
    fn client_message(&self) -> String {
        if self.is_server_error() {
            return INTERNAL.to_owned();
        }
        match self {
            Self::Auth(err) => match err {
                AuthError::MissingFields => "Please enter all required fields".to_owned(),
                AuthError::InvalidEmail(_) => "Please enter a valid email".to_owned(),
                AuthError::InvalidCredentials => "Invalid login credentials".to_owned(),
                AuthError::UserAlreadyExists => "User with this email already exists".to_owned(),
                AuthError::GoogleLoginFailed(_) => "Google login failed".to_owned(),
                _ => "Please authenticate.".to_owned(),
            },
            Self::Payment(err) => err.client_message(),
            Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::BadRequest(msg)
            | Self::Internal(msg) => msg.clone(),
            Self::Database(_) => INTERNAL.to_owned(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else if let Self::Payment(err) = &self {
            tracing::warn!(error = %err, "Payment rejected");
        }

        let status = self.status();
        let message = self.client_message();

        let body = match &self {
            Self::Payment(_) if status == StatusCode::BAD_REQUEST => {
                json!({ "success": false, "message": message })
            }
            _ => json!({ "message": message }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use platter_core::PriceError;

    use super::*;
    use crate::services::stripe::GatewayError;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("Order not found".to_string());
        assert_eq!(err.to_string(), "Not found: Order not found");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            let response = err.into_response();
            response.status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::InvalidCredentials)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::UserAlreadyExists)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Payment(PaymentError::EmptyCart)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Payment(PaymentError::Repository(
                RepositoryError::NotFound
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );        assert_eq!(
            get_status(AppError::Payment(PaymentError::Amount(PriceError::Overflow))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let response = AppError::Database(RepositoryError::DataCorruption(
            "users.email".to_string(),
        ))
        .into_response();

        assert_eq!(
            body_json(response).await,
            json!({ "message": "Internal server error" })
        );
    }

    #[tokio::test]
    async fn test_message_body() {
        let response = AppError::NotFound("Restaurant not found".to_string()).into_response();
        assert_eq!(
            body_json(response).await,
            json!({ "message": "Restaurant not found" })
        );

        let response = AppError::Auth(AuthError::GoogleLoginFailed("audience".to_string()))
            .into_response();
        assert_eq!(
            body_json(response).await,
            json!({ "message": "Google login failed" })
        );
    }

    #[tokio::test]
    async fn test_payment_errors_carry_success_flag() {
        let response = AppError::Payment(PaymentError::Gateway(GatewayError::Api {
            status: 402,
            message: "Your card was declined.".to_string(),
        }))
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({ "success": false, "message": "Your card was declined." })
        );
    }
}
