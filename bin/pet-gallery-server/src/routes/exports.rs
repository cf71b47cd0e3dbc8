//! Export route: packages the selection and returns the ZIP archive.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::http::HeaderName;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use pet_gallery_core::ExportError;
use serde::Serialize;
use tracing::info;
use utoipa::{OpenApi, ToSchema};

use crate::error::ServerError;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(create_export, export_status))]
pub struct ExportsApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/exports", post(create_export))
        .route("/exports/status", get(export_status))
}

/// `POST /v1/exports`
///
/// Downloads every selected image, records the history and answers with
/// `pets_images.zip` as an attachment. Images that could not be fetched are
/// left out; the `x-export-*` headers carry the counts.
///
/// The pipeline runs on its own task: a client that hangs up does not stop
/// it, and the history still records every image it packaged.
#[utoipa::path(
    post,
    path = "/v1/exports",
    tag = "exports",
    responses(
        (status = 200, description = "ZIP archive of the selected images",
            content_type = "application/zip", body = [u8],
            headers(
                ("x-export-requested" = usize, description = "Urls in the selection"),
                ("x-export-packaged" = usize, description = "Images in the archive"),
                ("x-export-failed" = usize, description = "Urls whose fetch failed")
            )),
        (status = 400, description = "Nothing selected"),
        (status = 409, description = "Another export is running"),
        (status = 500, description = "History or archive error"),
    )
)]
pub async fn create_export(State(state): State<Arc<AppState>>) -> Result<Response, ServerError> {
    let selection = state.selection.urls().await;
    if selection.is_empty() {
        return Err(ServerError::BadRequest("no pets selected".into()));
    }
    let pets = state.catalog.pets().await;

    let exporter = Arc::clone(&state.exporter);
    let archive = tokio::spawn(async move { exporter.export_selection(&selection, &pets).await })
        .await
        .map_err(ExportError::from)??;

    info!(
        packaged = archive.report.packaged,
        failed = archive.report.failed.len(),
        "export served"
    );

    let headers = [
        (header::CONTENT_TYPE, "application/zip".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", archive.file_name),
        ),
        (
            HeaderName::from_static("x-export-requested"),
            archive.report.requested.to_string(),
        ),
        (
            HeaderName::from_static("x-export-packaged"),
            archive.report.packaged.to_string(),
        ),
        (
            HeaderName::from_static("x-export-failed"),
            archive.report.failed.len().to_string(),
        ),
    ];
    Ok((headers, archive.bytes).into_response())
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExportStatus {
    pub running: bool,
}

/// `GET /v1/exports/status`
#[utoipa::path(
    get,
    path = "/v1/exports/status",
    tag = "exports",
    responses(
        (status = 200, description = "Whether an export is in progress", body = ExportStatus)
    )
)]
pub async fn export_status(State(state): State<Arc<AppState>>) -> Json<ExportStatus> {
    Json(ExportStatus {
        running: state.exporter.is_running(),
    })
}
