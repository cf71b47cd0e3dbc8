//! Liveness plus catalog readiness.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(get_health))]
pub struct HealthApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(get_health))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogHealth {
    pub loading: bool,
    pub error: Option<String>,
    pub pets: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `"ok"`, or `"degraded"` when the last catalog fetch failed.
    pub status: &'static str,
    pub version: &'static str,
    pub catalog: CatalogHealth,
}

/// `GET /health`
///
/// Always 200 while the process serves requests; a failed catalog fetch
/// shows up as `degraded` rather than as an error status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Server is up", body = HealthResponse)
    )
)]
pub async fn get_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let snapshot = state.catalog.snapshot().await;
    Json(HealthResponse {
        status: if snapshot.error.is_some() { "degraded" } else { "ok" },
        version: env!("CARGO_PKG_VERSION"),
        catalog: CatalogHealth {
            loading: snapshot.loading,
            error: snapshot.error,
            pets: snapshot.pets.len(),
        },
    })
}
