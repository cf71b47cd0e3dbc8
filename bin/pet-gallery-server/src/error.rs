//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors become a JSON-body HTTP
//! response with an appropriate status code.
//!
//! Internal errors (storage, archive) are logged with full detail but only a
//! generic message is returned so file paths never leak to clients.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pet_gallery_core::{ExportError, FetchError, StorageError};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// All errors that can occur in the request lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The caller sent an invalid or malformed request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The catalog endpoint could not be reached or returned garbage.
    #[error("catalog source error: {0}")]
    Upstream(#[from] FetchError),

    /// Propagated from the export pipeline.
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// Propagated from the persisted history store.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, client_message) = match &self {
            ServerError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ServerError::Export(ExportError::AlreadyRunning) => (
                StatusCode::CONFLICT,
                "an export is already in progress".to_owned(),
            ),
            ServerError::Upstream(e) => {
                error!(error = %e, "catalog source error");
                (
                    StatusCode::BAD_GATEWAY,
                    "pet catalog is unavailable".to_owned(),
                )
            }
            ServerError::Export(e) => {
                error!(error = %e, "export failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
            ServerError::Storage(e) => {
                error!(error = %e, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
        };
        (status, Json(json!({ "error": client_message }))).into_response()
    }
}
