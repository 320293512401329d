//! Mapping of workspace errors to HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tandem_error::{RelayErrorKind, StorageErrorKind, TandemError, TandemErrorKind};

/// Handler error carrying a [`TandemError`].
///
/// Bodies are `{"message": ...}` and never include upstream or database detail.
#[derive(Debug, derive_more::From)]
pub struct ApiError(TandemError);

impl ApiError {
    /// Status code and client-safe message for the wrapped error.
    pub fn status_and_message(&self) -> (StatusCode, String) {
        match self.0.kind() {
            TandemErrorKind::Relay(e) => match &e.kind {
                RelayErrorKind::InvalidPrompt => {
                    (StatusCode::BAD_REQUEST, e.kind.to_string())
                }
                RelayErrorKind::RunCreation(_) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Could not start the comparison. Please try again.".to_string(),
                ),
            },
            TandemErrorKind::Storage(e) => match &e.kind {
                StorageErrorKind::NotFound(_) => {
                    (StatusCode::NOT_FOUND, "Session not found".to_string())
                }
                _ => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Storage is unavailable. Please try again.".to_string(),
                ),
            },
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            tracing::error!(error = %self.0, %status, "Request failed");
        } else {
            tracing::debug!(error = %self.0, %status, "Request rejected");
        }
        (status, Json(json!({ "message": message }))).into_response()
    }
}
