//! Axum router construction.
//!
//! [`build`] assembles the complete application router:
//! - Middleware layers (CORS, per-request trace-ID injection)
//! - Optional Swagger UI / OpenAPI document (disable with `PET_GALLERY_ENABLE_SWAGGER=false`)
//! - Health and about routes
//! - `/v1` gallery, selection, export and download-history routes

mod about;
pub mod doc;
mod downloads;
mod exports;
mod health;
mod pets;
mod selection;

use crate::middleware::{cors, trace};
use crate::state::AppState;
use axum::{middleware, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use utoipa_swagger_ui::SwaggerUi;

// ── Router builder ────────────────────────────────────────────────────────────

/// Build the complete Axum [`Router`] for the application.
pub fn build(state: Arc<AppState>) -> Router {
    let v1 = Router::new()
        .merge(pets::router())
        .merge(selection::router())
        .merge(exports::router())
        .merge(downloads::router());

    let mut app = Router::new()
        .merge(health::router())
        .merge(about::router())
        .nest("/v1", v1);

    if state.config.enable_swagger {
        app = app.merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", doc::get_docs()),
        );
    }

    app
        // Outermost layers execute first on the way in.
        .layer(ServiceBuilder::new().layer(cors::cors_layer(state.clone())))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            trace::trace_middleware,
        ))
        .with_state(state)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
pub(super) mod tests {
    use super::*;
    use crate::config::Config;
    use axum::body::Body;
    use axum::extract::Path;
    use axum::http::{Method, Request, StatusCode};
    use axum::routing::get;
    use axum::Json;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::io::Cursor;
    use std::time::Duration;
    use tower::ServiceExt;

    /// Serve a three-pet catalog plus its images on a loopback port.
    /// `/img/missing` answers 404.
    pub(in crate::routes) async fn spawn_pet_host() -> String {
        spawn_pet_host_with_delay(Duration::ZERO).await
    }

    /// Like [`spawn_pet_host`], but the `stella` image takes `delay` to arrive.
    async fn spawn_pet_host_with_delay(delay: Duration) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let pets = json!([
            {"title": "Bella", "description": "Sleepy beagle", "url": format!("{base}/img/bella")},
            {"title": "Max", "description": "Lost his photo", "url": format!("{base}/img/missing")},
            {
                "title": "Stella  Jr",
                "description": "Tiny terrier",
                "url": format!("{base}/img/stella"),
            },
        ]);

        let app = Router::new()
            .route(
                "/pets",
                get(move || {
                    let pets = pets.clone();
                    async move { Json(pets) }
                }),
            )
            .route(
                "/img/{name}",
                get(move |Path(name): Path<String>| async move {
                    if name == "stella" {
                        tokio::time::sleep(delay).await;
                    }
                    if name == "missing" {
                        (StatusCode::NOT_FOUND, Vec::new())
                    } else {
                        (StatusCode::OK, format!("jpeg:{name}").into_bytes())
                    }
                }),
            );

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        base
    }

    pub(in crate::routes) async fn test_state(
        catalog_url: String,
        data_dir: &std::path::Path,
    ) -> Arc<AppState> {
        let config = Config {
            bind_address: "127.0.0.1:0".into(),
            catalog_url,
            data_dir: data_dir.to_path_buf(),
            log_level: "debug".into(),
            log_json: false,
            http_timeout_secs: 5,
            fetch_attempts: 1,
            retry_delay_secs: 0,
            proxy: None,
            no_proxy: true,
            cors_allowed_origins: None,
            enable_swagger: true,
        };
        Arc::new(AppState::new(config).await.unwrap())
    }

    async fn call(
        state: &Arc<AppState>,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                req = req.header("content-type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let resp = build(Arc::clone(state))
            .oneshot(req.body(body).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes().to_vec();
        (status, headers, bytes)
    }

    async fn call_json(
        state: &Arc<AppState>,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, _, bytes) = call(state, method, uri, body).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn health_carries_trace_id() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state("http://127.0.0.1:9/pets".into(), dir.path()).await;

        let (status, headers, _) = call(&state, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers.contains_key(trace::X_TRACE_ID));
    }

    #[tokio::test]
    async fn gallery_reports_loading_before_first_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state("http://127.0.0.1:9/pets".into(), dir.path()).await;

        let (status, body) = call_json(&state, Method::GET, "/v1/pets", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["loading"], true);
        assert_eq!(body["pets"], json!([]));
    }

    #[tokio::test]
    async fn failed_catalog_fetch_is_reported() {
        let base = spawn_pet_host().await;
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(format!("{base}/no-such-endpoint"), dir.path()).await;

        let (status, _) = call_json(&state, Method::POST, "/v1/pets/reload", None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let (_, body) = call_json(&state, Method::GET, "/v1/pets", None).await;
        assert_eq!(body["loading"], false);
        assert!(body["error"].as_str().unwrap().contains("404"));
    }

    #[tokio::test]
    async fn search_sort_and_toggle() {
        let base = spawn_pet_host().await;
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(format!("{base}/pets"), dir.path()).await;

        let (status, body) = call_json(&state, Method::POST, "/v1/pets/reload", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 3);

        let (_, body) = call_json(
            &state,
            Method::POST,
            "/v1/selection/toggle",
            Some(json!({"url": format!("{base}/img/stella")})),
        )
        .await;
        assert_eq!(body["selected"], true);
        assert_eq!(body["count"], 1);

        let (_, body) = call_json(
            &state,
            Method::PUT,
            "/v1/selection/sort",
            Some(json!({"order": "Z-A"})),
        )
        .await;
        assert_eq!(body["sortOrder"], "Z-A");

        let (_, body) = call_json(&state, Method::GET, "/v1/pets?q=ELLA", None).await;
        let titles: Vec<&str> = body["pets"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["Stella  Jr", "Bella"]);
        assert_eq!(body["pets"][0]["selected"], true);
        assert_eq!(body["pets"][1]["selected"], false);
        assert_eq!(body["showing"], 2);
        assert_eq!(body["total"], 3);

        let (_, body) = call_json(&state, Method::GET, "/v1/pets?sort=A-Z", None).await;
        assert_eq!(body["pets"][0]["title"], "Bella");

        let (status, body) = call_json(&state, Method::DELETE, "/v1/selection", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 0);
    }

    #[tokio::test]
    async fn export_with_empty_selection_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state("http://127.0.0.1:9/pets".into(), dir.path()).await;

        let (status, body) = call_json(&state, Method::POST, "/v1/exports", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "no pets selected");
    }

    #[tokio::test]
    async fn export_select_all_skips_missing_image_and_records_history() {
        let base = spawn_pet_host().await;
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(format!("{base}/pets"), dir.path()).await;
        state.catalog.load(state.client.as_ref()).await.unwrap();

        let (_, body) = call_json(&state, Method::POST, "/v1/selection/select-all", None).await;
        assert_eq!(body["added"], 3);
        let (_, body) = call_json(&state, Method::POST, "/v1/selection/select-all", None).await;
        assert_eq!(body["added"], 0);
        assert_eq!(body["count"], 3);

        let (status, headers, bytes) = call(&state, Method::POST, "/v1/exports", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers["content-type"], "application/zip");
        assert_eq!(
            headers["content-disposition"],
            "attachment; filename=\"pets_images.zip\""
        );
        assert_eq!(headers["x-export-packaged"], "2");
        assert_eq!(headers["x-export-failed"], "1");

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort_unstable();
        assert_eq!(names, vec!["Bella.jpeg", "Stella_Jr.jpeg"]);
        assert_eq!(archive.len(), 2);
        let _ = archive.by_name("Bella.jpeg").unwrap();

        let (_, body) = call_json(&state, Method::GET, "/v1/downloads", None).await;
        assert_eq!(body["count"], 2);
        assert_eq!(body["downloads"][0]["title"], "Bella");
        assert!(body["downloads"][0]["downloadedAt"].is_string());
        assert!(body["downloads"][0]["downloadedAtLocal"].is_string());

        let (status, _) = call_json(&state, Method::DELETE, "/v1/downloads", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, body) = call_json(&state, Method::GET, "/v1/downloads", None).await;
        assert_eq!(body["count"], 0);

        let (_, body) = call_json(&state, Method::GET, "/v1/exports/status", None).await;
        assert_eq!(body["running"], false);
    }

    #[tokio::test]
    async fn toggle_accepts_any_url() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state("http://127.0.0.1:9/pets".into(), dir.path()).await;

        let (status, body) = call_json(
            &state,
            Method::POST,
            "/v1/selection/toggle",
            Some(json!({"url": ""})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["selected"], true);
        assert_eq!(body["count"], 1);
    }

    #[tokio::test]
    async fn export_finishes_after_client_disconnects() {
        let base = spawn_pet_host_with_delay(Duration::from_millis(800)).await;
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(format!("{base}/pets"), dir.path()).await;
        state.catalog.load(state.client.as_ref()).await.unwrap();
        state.selection.select_all(&state.catalog.pets().await).await;

        let request = Request::builder()
            .method(Method::POST)
            .uri("/v1/exports")
            .body(Body::empty())
            .unwrap();
        let abandoned = tokio::time::timeout(
            Duration::from_millis(200),
            build(Arc::clone(&state)).oneshot(request),
        )
        .await;
        assert!(abandoned.is_err(), "export should still be fetching the slow image");

        for _ in 0..50 {
            if !state.exporter.is_running() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(!state.exporter.is_running());

        let titles: Vec<String> = state
            .history
            .read()
            .await
            .into_iter()
            .filter_map(|e| e.title)
            .collect();
        assert_eq!(titles, vec!["Bella", "Stella  Jr"]);
    }

    #[tokio::test]
    async fn openapi_document_lists_v1_routes() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state("http://127.0.0.1:9/pets".into(), dir.path()).await;

        let (status, body) = call_json(&state, Method::GET, "/api-docs/openapi.json", None).await;
        assert_eq!(status, StatusCode::OK);
        let paths = [
            "/health",
            "/v1/pets",
            "/v1/selection/toggle",
            "/v1/exports",
            "/v1/downloads",
        ];
        for path in paths {
            assert!(body["paths"].get(path).is_some(), "missing {path}");
        }
    }
}
