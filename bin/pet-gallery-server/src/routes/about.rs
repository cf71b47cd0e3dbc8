//! Static "about" page content.

use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};
use std::sync::Arc;

use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct AboutInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub features: Vec<Feature>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Feature {
    pub title: &'static str,
    pub description: &'static str,
}

#[derive(OpenApi)]
#[openapi(paths(get_about))]
pub struct AboutApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/about", get(get_about))
}

#[utoipa::path(
    get,
    path = "/about",
    tag = "about",
    responses(
        (status = 200, description = "Application information", body = AboutInfo)
    )
)]
pub async fn get_about() -> Json<AboutInfo> {
    Json(AboutInfo {
        name: "Pet Gallery",
        version: env!("CARGO_PKG_VERSION"),
        description: "Discover and download adorable pet photos.",
        features: vec![
            Feature {
                title: "Search",
                description: "Find pets by name or description.",
            },
            Feature {
                title: "Selection",
                description: "Select several pets at once, or all of them.",
            },
            Feature {
                title: "Download",
                description: "Get every selected photo in one zip archive.",
            },
            Feature {
                title: "History",
                description: "Review and clear what you downloaded before.",
            },
        ],
    })
}
