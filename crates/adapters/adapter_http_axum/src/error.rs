//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use tangorest_app::services::assembler::{ErrorRepresentation, FailureKind};

/// Maps an [`ErrorRepresentation`] to an HTTP response whose status code is
/// derived from its failure kind.
pub struct ApiError(ErrorRepresentation);

impl From<ErrorRepresentation> for ApiError {
    fn from(err: ErrorRepresentation) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if self.0.kind() == FailureKind::Internal {
            tracing::error!(detail = %self.0.detail(), "internal error");
        }
        (status, Json(self.0)).into_response()
    }
}
