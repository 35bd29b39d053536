use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use twitcanva_core::error::CoreError;

/// Message returned in place of any internal error's details.
const INTERNAL_MESSAGE: &str = "An internal error occurred";

/// Error returned by canvas handlers.
///
/// Store and validation failures arrive as [`CoreError`]; the other
/// variants are raised by the handlers themselves. Every variant renders
/// as `{ "error": ..., "code": ... }`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A request the handler cannot act on, such as an empty node update.
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Core(CoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
            AppError::Core(CoreError::Validation(_)) | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Core(CoreError::Conflict(_)) => StatusCode::CONFLICT,
            AppError::Core(CoreError::Internal(_)) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Machine-readable error code for the response body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Core(CoreError::NotFound { .. }) => "NOT_FOUND",
            AppError::Core(CoreError::Validation(_)) => "VALIDATION_ERROR",
            AppError::Core(CoreError::Conflict(_)) => "CONFLICT",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Core(CoreError::Internal(_)) | AppError::InternalError(_) => {
                "INTERNAL_ERROR"
            }
        }
    }

    /// Message safe to show a client. Internal details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            AppError::Core(CoreError::NotFound { entity, id }) => {
                format!("{entity} with id {id} not found")
            }
            AppError::Core(CoreError::Validation(msg) | CoreError::Conflict(msg))
            | AppError::BadRequest(msg) => msg.clone(),
            AppError::Core(CoreError::Internal(_)) | AppError::InternalError(_) => {
                INTERNAL_MESSAGE.to_string()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Canvas request failed");
        }

        let body = json!({
            "error": self.public_message(),
            "code": self.code(),
        });
        (status, axum::Json(body)).into_response()
    }
}
