//! HTTP access to the catalog endpoint and the image hosts.
//!
//! [`HttpClient`] is the production implementation of both
//! [`CatalogSource`] and [`ImageSource`]; tests substitute in-memory fakes.

use std::time::Duration;

use bytes::Bytes;
use reqwest::{Client, Url};
use tracing::{debug, warn};

use crate::catalog::{decode_catalog, CatalogSource};
use crate::error::FetchError;
use crate::export::ImageSource;
use crate::model::PetRecord;

/// Public endpoint serving the pet catalog.
pub const DEFAULT_CATALOG_URL: &str = "https://eulerity-hackathon.appspot.com/pets";

/// Builder for [`HttpClient`].
///
/// # Example
/// ```rust,no_run
/// use pet_gallery_core::client::HttpClient;
/// let client = HttpClient::builder()
///     .set_timeout_secs(10)
///     .set_attempts(3)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct HttpClientBuilder {
    pub(crate) catalog_url: String,
    pub(crate) timeout_secs: Option<u64>,
    pub(crate) attempts: usize,
    pub(crate) retry_delay_secs: u64,
    pub(crate) proxy: Option<String>,
    pub(crate) no_proxy: bool,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            timeout_secs: None,
            attempts: 1,
            retry_delay_secs: 1,
            proxy: None,
            no_proxy: false,
        }
    }
}

impl HttpClientBuilder {
    /// Override the catalog endpoint.
    pub fn set_catalog_url(mut self, url: impl Into<String>) -> Self {
        self.catalog_url = url.into();
        self
    }

    /// Per-request timeout. Without one a stalled host stalls the caller.
    pub fn set_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Total attempts per request, including the first (minimum `1`).
    pub fn set_attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// Delay between attempts (default: `1`).
    pub fn set_retry_delay_secs(mut self, secs: u64) -> Self {
        self.retry_delay_secs = secs;
        self
    }

    /// Route every request through an HTTP/HTTPS proxy.
    pub fn set_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Ignore `HTTP_PROXY`/`HTTPS_PROXY` from the environment. An explicit
    /// [`set_proxy`](Self::set_proxy) still applies.
    pub fn set_no_proxy(mut self, no_proxy: bool) -> Self {
        self.no_proxy = no_proxy;
        self
    }

    pub fn build(self) -> Result<HttpClient, FetchError> {
        let mut builder =
            Client::builder().user_agent(concat!("pet-gallery/", env!("CARGO_PKG_VERSION")));

        if let Some(secs) = self.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        if self.no_proxy {
            builder = builder.no_proxy();
        }

        if let Some(ref proxy_url) = self.proxy {
            match reqwest::Proxy::all(proxy_url) {
                Ok(p) => builder = builder.proxy(p),
                Err(e) => warn!(proxy = %proxy_url, error = %e, "ignoring invalid proxy URL"),
            }
        }

        Ok(HttpClient {
            client: builder.build()?,
            catalog_url: self.catalog_url,
            attempts: self.attempts,
            retry_delay: Duration::from_secs(self.retry_delay_secs),
        })
    }
}

/// Shared `reqwest` client with the retry policy applied to every GET.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    catalog_url: String,
    attempts: usize,
    retry_delay: Duration,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    pub fn catalog_url(&self) -> &str {
        &self.catalog_url
    }

    /// GET `url` and return the whole body, retrying on failure.
    pub async fn get_bytes(&self, url: &str) -> Result<Bytes, FetchError> {
        let parsed = parse_http_url(url)?;

        let mut last_err = None;
        for attempt in 0..self.attempts {
            match self.get_once(parsed.clone()).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    debug!(url, attempt = attempt + 1, error = %e, "GET failed");
                    last_err = Some(e);
                    if attempt + 1 < self.attempts {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }
        Err(last_err.unwrap_or_else(|| FetchError::InvalidResponse {
            message: format!("no attempt was made for {url}"),
        }))
    }

    async fn get_once(&self, url: Url) -> Result<Bytes, FetchError> {
        let resp = self.client.get(url.clone()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(resp.bytes().await?)
    }
}

impl CatalogSource for HttpClient {
    async fn fetch_catalog(&self) -> Result<Vec<PetRecord>, FetchError> {
        let body = self.get_bytes(&self.catalog_url).await?;
        decode_catalog(&body)
    }
}

impl ImageSource for HttpClient {
    async fn fetch_image(&self, url: &str) -> Result<Bytes, FetchError> {
        self.get_bytes(url).await
    }
}

/// Parse `raw` as an absolute `http`/`https` URL.
pub fn parse_http_url(raw: &str) -> Result<Url, FetchError> {
    let url = Url::parse(raw).map_err(|e| FetchError::InvalidUrl {
        url: raw.to_string(),
        message: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(FetchError::InvalidUrl {
            url: raw.to_string(),
            message: format!("unsupported scheme {other:?}"),
        }),
    }
}
