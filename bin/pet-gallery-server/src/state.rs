//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use pet_gallery_core::{
    DownloadHistory, Exporter, FileStore, HttpClient, PetListStore, SelectionStore,
};
use tracing::warn;

use crate::config::Config;

/// State shared across all HTTP handlers.
///
/// This is the one composed store of the application: the catalog, the
/// selection, the history and the exporter all live here and are reached
/// only through it.
#[derive(Debug)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// Outbound HTTP client for the catalog and the images.
    pub client: Arc<HttpClient>,
    /// Fetched pet catalog and its loading flag.
    pub catalog: Arc<PetListStore>,
    /// Selected pet urls and the sort preference.
    pub selection: Arc<SelectionStore>,
    /// Persisted download history.
    pub history: Arc<DownloadHistory<FileStore>>,
    /// Archive export pipeline.
    pub exporter: Arc<Exporter<HttpClient, FileStore>>,
}

impl AppState {
    /// Wire up every store from `config`. Does not touch the network.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let mut builder = HttpClient::builder()
            .set_catalog_url(config.catalog_url.clone())
            .set_timeout_secs(config.http_timeout_secs)
            .set_attempts(config.fetch_attempts)
            .set_retry_delay_secs(config.retry_delay_secs)
            .set_no_proxy(config.no_proxy);
        if let Some(proxy) = &config.proxy {
            builder = builder.set_proxy(proxy.clone());
        }
        let client = Arc::new(builder.build()?);

        let store = Arc::new(FileStore::open(&config.data_dir).await?);
        let history = Arc::new(DownloadHistory::new(store));
        let exporter = Arc::new(Exporter::new(Arc::clone(&client), Arc::clone(&history)));

        Ok(Self {
            config: Arc::new(config),
            client,
            catalog: Arc::new(PetListStore::new()),
            selection: Arc::new(SelectionStore::new()),
            history,
            exporter,
        })
    }

    /// Start the one catalog fetch of a session in the background.
    pub fn spawn_initial_load(self: &Arc<Self>) {
        let state = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = state.catalog.load(state.client.as_ref()).await {
                warn!(error = %e, "initial catalog load failed");
            }
        });
    }
}
