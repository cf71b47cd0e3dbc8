use crate::state::AppState;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// The export response carries its outcome in custom headers; browsers only
/// let scripts read them when exposed.
const EXPOSED_HEADERS: [&str; 4] = [
    "content-disposition",
    "x-export-requested",
    "x-export-packaged",
    "x-export-failed",
];

pub fn cors_layer(state: Arc<AppState>) -> CorsLayer {
    let exposed: Vec<axum::http::HeaderName> = EXPOSED_HEADERS
        .into_iter()
        .map(axum::http::HeaderName::from_static)
        .collect();

    let origins: Vec<axum::http::HeaderValue> = state
        .config
        .cors_allowed_origins
        .as_deref()
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect();

    let cors = if origins.is_empty() {
        // Wildcard; set PET_GALLERY_CORS_ORIGINS in production.
        CorsLayer::new().allow_origin(Any)
    } else {
        CorsLayer::new().allow_origin(origins)
    };
    cors.allow_headers(Any)
        .allow_methods(Any)
        .expose_headers(exposed)
}
