//! Error types for sailor-api
//!
//! Every failure leaves the service as
//! `{"success": false, "error": <what failed>, "message": <detail>}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sailor_common::api::AdminAuthError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Required query or body fields absent (400)
    #[error("Missing required parameters")]
    MissingParameters(Vec<&'static str>),

    /// No or wrong admin token (401)
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed (403)
    #[error("{0}")]
    Forbidden(String),

    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Conflict (409)
    #[error("{0}")]
    Conflict(String),

    /// Requested booking slot was taken between availability check and booking (409)
    #[error("Time slot no longer available")]
    SlotTaken,

    /// Calendar or payment provider failed (502)
    #[error("{0}")]
    Upstream(String),

    /// Internal server error (500)
    #[error("{0}")]
    Internal(String),

    /// sailor-common error
    #[error(transparent)]
    Common(#[from] sailor_common::Error),
}

impl From<AdminAuthError> for ApiError {
    fn from(err: AdminAuthError) -> Self {
        match &err {
            AdminAuthError::MissingToken | AdminAuthError::InvalidToken => ApiError::Unauthorized(err.to_string()),
            AdminAuthError::Forbidden(_) => ApiError::Forbidden(err.to_string()),
            AdminAuthError::DatabaseError(msg) => ApiError::Internal(msg.clone()),
        }
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        use sailor_common::Error as Common;
        match self {
            ApiError::BadRequest(_) | ApiError::MissingParameters(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) | ApiError::SlotTaken => StatusCode::CONFLICT,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Common(err) => match err {
                Common::InvalidInput(_) => StatusCode::BAD_REQUEST,
                Common::NotFound(_) => StatusCode::NOT_FOUND,
                Common::Conflict(_) => StatusCode::CONFLICT,
                Common::Integration(_) => StatusCode::BAD_GATEWAY,
                Common::Database(_) | Common::Io(_) | Common::Config(_) | Common::Internal(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    /// Short label for the `error` field
    fn label(&self) -> String {
        use sailor_common::Error as Common;
        match self {
            ApiError::Common(Common::InvalidInput(msg))
            | ApiError::Common(Common::NotFound(msg))
            | ApiError::Common(Common::Conflict(msg)) => msg.clone(),
            ApiError::Common(Common::Integration(_)) => "Upstream service error".to_string(),
            ApiError::Common(_) | ApiError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::SlotTaken => {
                "This time slot has been booked by someone else. Please choose another time.".to_string()
            }
            ApiError::Common(err) => err.to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Request failed");
        }

        let mut body = json!({
            "success": false,
            "error": self.label(),
            "message": self.message(),
        });
        if let ApiError::MissingParameters(required) = &self {
            body["required"] = json!(required);
        }

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_errors_map_to_status() {
        let cases = [
            (sailor_common::Error::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (sailor_common::Error::NotFound("x".into()), StatusCode::NOT_FOUND),
            (sailor_common::Error::Conflict("x".into()), StatusCode::CONFLICT),
            (sailor_common::Error::Integration("x".into()), StatusCode::BAD_GATEWAY),
            (sailor_common::Error::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_auth_errors() {
        assert_eq!(
            ApiError::from(AdminAuthError::MissingToken).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AdminAuthError::Forbidden("no".into())).status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_internal_details_not_exposed_as_label() {
        let err = ApiError::Common(sailor_common::Error::Internal("stack".into()));
        assert_eq!(err.label(), "Internal server error");
    }
}
