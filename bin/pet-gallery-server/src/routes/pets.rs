//! Gallery routes: the filtered/sorted catalog view and catalog reload.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use pet_gallery_core::{GalleryView, SortOrder};
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::error::ServerError;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(list_pets, reload_pets))]
pub struct PetsApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/pets", get(list_pets))
        .route("/pets/reload", post(reload_pets))
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GalleryQuery {
    /// Search text matched against titles and descriptions.
    #[serde(default)]
    pub q: String,
    /// One-off sort override; the stored preference is used when absent.
    pub sort: Option<SortOrder>,
}

/// `GET /v1/pets?q=&sort=`
#[utoipa::path(
    get,
    path = "/v1/pets",
    tag = "pets",
    params(GalleryQuery),
    responses(
        (status = 200, description = "Filtered and sorted gallery", body = GalleryView)
    )
)]
pub async fn list_pets(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GalleryQuery>,
) -> Json<GalleryView> {
    let order = match query.sort {
        Some(order) => order,
        None => state.selection.sort_order().await,
    };
    let snapshot = state.catalog.snapshot().await;
    let selection = state.selection.selection().await;

    debug!(query = %query.q, %order, "gallery view");
    Json(GalleryView::build(
        &snapshot.pets,
        snapshot.loading,
        snapshot.error,
        &selection,
        &query.q,
        order,
    ))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReloadResponse {
    pub count: usize,
}

/// `POST /v1/pets/reload`: fetch the catalog again and replace it.
#[utoipa::path(
    post,
    path = "/v1/pets/reload",
    tag = "pets",
    responses(
        (status = 200, description = "Catalog reloaded", body = ReloadResponse),
        (status = 502, description = "Catalog endpoint unavailable"),
    )
)]
pub async fn reload_pets(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReloadResponse>, ServerError> {
    let count = state.catalog.reload(state.client.as_ref()).await?;
    Ok(Json(ReloadResponse { count }))
}
