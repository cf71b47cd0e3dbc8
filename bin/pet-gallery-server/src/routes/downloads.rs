//! Download history routes.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Local;
use pet_gallery_core::DownloadHistoryEntry;
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use crate::error::ServerError;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(list_downloads, clear_downloads))]
pub struct DownloadsApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/downloads", get(list_downloads).delete(clear_downloads))
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadItem {
    #[serde(flatten)]
    pub entry: DownloadHistoryEntry,
    /// `downloadedAt` rendered in the server's local time zone; `None` when
    /// the stored timestamp does not parse.
    pub downloaded_at_local: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DownloadsResponse {
    pub count: usize,
    pub downloads: Vec<DownloadItem>,
}

/// `GET /v1/downloads`
#[utoipa::path(
    get,
    path = "/v1/downloads",
    tag = "downloads",
    responses(
        (status = 200, description = "Download history, oldest first", body = DownloadsResponse)
    )
)]
pub async fn list_downloads(State(state): State<Arc<AppState>>) -> Json<DownloadsResponse> {
    let downloads: Vec<DownloadItem> = state
        .history
        .read()
        .await
        .into_iter()
        .map(|entry| DownloadItem {
            downloaded_at_local: entry
                .downloaded_at_utc()
                .map(|at| at.with_timezone(&Local).format("%x %X").to_string()),
            entry,
        })
        .collect();

    Json(DownloadsResponse {
        count: downloads.len(),
        downloads,
    })
}

/// `DELETE /v1/downloads`
#[utoipa::path(
    delete,
    path = "/v1/downloads",
    tag = "downloads",
    responses(
        (status = 204, description = "History cleared"),
        (status = 500, description = "Storage error"),
    )
)]
pub async fn clear_downloads(
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ServerError> {
    state.history.clear().await?;
    Ok(StatusCode::NO_CONTENT)
}
