//! Server configuration, loaded from environment variables at startup.

use std::path::PathBuf;

use pet_gallery_core::DEFAULT_CATALOG_URL;

/// Runtime configuration for pet-gallery-server.
///
/// Every field has a default so the server runs without any environment
/// variables set.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:3000"`).
    pub bind_address: String,

    /// Endpoint serving the pet catalog JSON array.
    pub catalog_url: String,

    /// Directory holding persisted state (the download history).
    pub data_dir: PathBuf,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// Per-request timeout for catalog and image fetches, in seconds.
    pub http_timeout_secs: u64,

    /// Attempts per fetch, including the first. `1` disables retries.
    pub fetch_attempts: usize,

    /// Delay between fetch attempts, in seconds.
    pub retry_delay_secs: u64,

    /// Optional HTTP/HTTPS proxy for outbound requests.
    pub proxy: Option<String>,

    /// When `true`, proxy settings from the environment are ignored.
    pub no_proxy: bool,

    /// Comma-separated CORS origins; `None` allows any origin.
    pub cors_allowed_origins: Option<String>,

    /// Serve Swagger UI and the OpenAPI document (default: `true`).
    pub enable_swagger: bool,
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            bind_address: env_or("PET_GALLERY_BIND", "0.0.0.0:3000"),
            catalog_url: env_or("PET_GALLERY_CATALOG_URL", DEFAULT_CATALOG_URL),
            data_dir: std::env::var("PET_GALLERY_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_data_dir()),
            log_level: env_or("PET_GALLERY_LOG", "info"),
            log_json: std::env::var("PET_GALLERY_LOG_JSON")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            http_timeout_secs: parse_env("PET_GALLERY_HTTP_TIMEOUT_SECS", 30),
            fetch_attempts: parse_env("PET_GALLERY_FETCH_ATTEMPTS", 1),
            retry_delay_secs: parse_env("PET_GALLERY_RETRY_DELAY_SECS", 1),
            proxy: non_empty_env("PET_GALLERY_PROXY"),
            no_proxy: std::env::var("PET_GALLERY_NO_PROXY")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            cors_allowed_origins: non_empty_env("PET_GALLERY_CORS_ORIGINS"),
            enable_swagger: std::env::var("PET_GALLERY_ENABLE_SWAGGER")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true),
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    dirs_next::data_dir()
        .map(|d| d.join("pet-gallery"))
        .unwrap_or_else(|| PathBuf::from("./data"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
