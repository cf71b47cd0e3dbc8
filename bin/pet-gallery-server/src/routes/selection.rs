//! Selection routes: toggle, select-all, clear and sort preference.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use pet_gallery_core::SortOrder;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(get_selection, toggle_selection, select_all, clear_selection, set_sort_order))]
pub struct SelectionApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/selection", get(get_selection).delete(clear_selection))
        .route("/selection/toggle", post(toggle_selection))
        .route("/selection/select-all", post(select_all))
        .route("/selection/sort", put(set_sort_order))
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectionResponse {
    /// Selected urls in selection order.
    pub urls: Vec<String>,
    pub sort_order: SortOrder,
    pub count: usize,
}

async fn current(state: &AppState) -> SelectionResponse {
    let urls = state.selection.urls().await;
    SelectionResponse {
        count: urls.len(),
        urls,
        sort_order: state.selection.sort_order().await,
    }
}

/// `GET /v1/selection`
#[utoipa::path(
    get,
    path = "/v1/selection",
    tag = "selection",
    responses(
        (status = 200, description = "Current selection", body = SelectionResponse)
    )
)]
pub async fn get_selection(State(state): State<Arc<AppState>>) -> Json<SelectionResponse> {
    Json(current(&state).await)
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ToggleRequest {
    pub url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ToggleResponse {
    pub url: String,
    pub selected: bool,
    pub count: usize,
}

/// `POST /v1/selection/toggle`
///
/// The url is taken as given; it need not belong to the loaded catalog.
#[utoipa::path(
    post,
    path = "/v1/selection/toggle",
    tag = "selection",
    request_body = ToggleRequest,
    responses(
        (status = 200, description = "Url toggled", body = ToggleResponse)
    )
)]
pub async fn toggle_selection(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ToggleRequest>,
) -> Json<ToggleResponse> {
    let selected = state.selection.toggle(&req.url).await;
    Json(ToggleResponse {
        count: state.selection.len().await,
        url: req.url,
        selected,
    })
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SelectAllResponse {
    pub added: usize,
    pub count: usize,
}

/// `POST /v1/selection/select-all`: select every currently loaded pet.
#[utoipa::path(
    post,
    path = "/v1/selection/select-all",
    tag = "selection",
    responses(
        (status = 200, description = "Loaded pets selected", body = SelectAllResponse)
    )
)]
pub async fn select_all(State(state): State<Arc<AppState>>) -> Json<SelectAllResponse> {
    let pets = state.catalog.pets().await;
    let added = state.selection.select_all(&pets).await;
    Json(SelectAllResponse {
        added,
        count: state.selection.len().await,
    })
}

/// `DELETE /v1/selection`
#[utoipa::path(
    delete,
    path = "/v1/selection",
    tag = "selection",
    responses(
        (status = 200, description = "Selection cleared", body = SelectionResponse)
    )
)]
pub async fn clear_selection(State(state): State<Arc<AppState>>) -> Json<SelectionResponse> {
    state.selection.clear().await;
    Json(current(&state).await)
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SortRequest {
    pub order: SortOrder,
}

/// `PUT /v1/selection/sort`
#[utoipa::path(
    put,
    path = "/v1/selection/sort",
    tag = "selection",
    request_body = SortRequest,
    responses(
        (status = 200, description = "Sort preference stored", body = SelectionResponse)
    )
)]
pub async fn set_sort_order(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SortRequest>,
) -> Json<SelectionResponse> {
    state.selection.set_sort_order(req.order).await;
    Json(current(&state).await)
}
