use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use boardwright_core::error::CoreError;
use serde_json::json;

/// Error returned by storyboard handlers.
///
/// Every variant renders as a `{ "error", "code" }` JSON body, including
/// request bodies and query strings axum could not decode, so clients never
/// see a plain-text rejection.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// JSON body or query string that could not be decoded.
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Core(CoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
            AppError::Core(CoreError::Validation(_)) | AppError::MalformedRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Core(CoreError::Conflict(_) | CoreError::InvalidTransition { .. }) => {
                StatusCode::CONFLICT
            }
            AppError::Core(CoreError::Internal(_)) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Machine-readable code placed in the `code` field.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Core(CoreError::NotFound { .. }) => "NOT_FOUND",
            AppError::Core(CoreError::Validation(_)) => "VALIDATION_ERROR",
            AppError::Core(CoreError::Conflict(_)) => "CONFLICT",
            AppError::Core(CoreError::InvalidTransition { .. }) => "INVALID_TRANSITION",
            AppError::MalformedRequest(_) => "MALFORMED_REQUEST",
            AppError::Core(CoreError::Internal(_)) | AppError::InternalError(_) => {
                "INTERNAL_ERROR"
            }
        }
    }

    /// Client-facing message. Server-side failures are not echoed back.
    fn message(&self) -> String {
        match self {
            AppError::Core(CoreError::NotFound { entity, id }) => {
                format!("{entity} with id {id} not found")
            }
            AppError::Core(CoreError::Validation(msg) | CoreError::Conflict(msg)) => msg.clone(),
            AppError::MalformedRequest(msg) => msg.clone(),
            AppError::Core(CoreError::InvalidTransition { .. }) => self.to_string(),
            AppError::Core(CoreError::Internal(_)) | AppError::InternalError(_) => {
                "An internal error occurred".to_string()
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::MalformedRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::MalformedRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, %status, "Request rejected");
        }

        let body = json!({
            "error": self.message(),
            "code": self.code(),
        });

        (status, axum::Json(body)).into_response()
    }
}
