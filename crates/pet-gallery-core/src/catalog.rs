//! Pet catalog: the remote source and the in-memory list store.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::client::parse_http_url;
use crate::error::FetchError;
use crate::model::PetRecord;

/// Where the pet catalog comes from.
///
/// All trait methods use `impl Future` in their signatures so no extra
/// `async-trait` crate is required.
pub trait CatalogSource: Send + Sync {
    /// Fetch and validate the full catalog in one request.
    fn fetch_catalog(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<PetRecord>, FetchError>> + Send;
}

/// Decode a catalog response body.
///
/// The body must be a JSON array. Elements that are not well-formed pet
/// records (missing or non-string fields, non-http url) are dropped, as are
/// repeated urls after their first occurrence.
pub fn decode_catalog(body: &[u8]) -> Result<Vec<PetRecord>, FetchError> {
    let raw: Vec<serde_json::Value> =
        serde_json::from_slice(body).map_err(|e| FetchError::InvalidResponse {
            message: format!("expected a JSON array of pets: {e}"),
        })?;

    let total = raw.len();
    let mut seen = HashSet::with_capacity(total);
    let mut pets = Vec::with_capacity(total);
    let mut malformed = 0usize;
    let mut duplicates = 0usize;

    for value in raw {
        let pet = match serde_json::from_value::<PetRecord>(value) {
            Ok(pet) if parse_http_url(&pet.url).is_ok() => pet,
            _ => {
                malformed += 1;
                continue;
            }
        };
        if seen.insert(pet.url.clone()) {
            pets.push(pet);
        } else {
            duplicates += 1;
        }
    }

    if malformed > 0 || duplicates > 0 {
        warn!(total, malformed, duplicates, "dropped invalid catalog entries");
    }
    Ok(pets)
}

/// Point-in-time copy of the pet list store.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CatalogSnapshot {
    pub pets: Vec<PetRecord>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug)]
struct CatalogState {
    pets: Vec<PetRecord>,
    loading: bool,
    error: Option<String>,
}

/// Holds the fetched catalog and its loading flag.
///
/// A fresh store is in the loading state until the first [`load`] resolves.
/// When two loads overlap only the most recently started one is applied.
///
/// [`load`]: PetListStore::load
#[derive(Debug)]
pub struct PetListStore {
    state: RwLock<CatalogState>,
    generation: AtomicU64,
}

impl Default for PetListStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PetListStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(CatalogState {
                pets: Vec::new(),
                loading: true,
                error: None,
            }),
            generation: AtomicU64::new(0),
        }
    }

    /// Fetch the catalog once and replace the stored list wholesale.
    ///
    /// On failure the store leaves the loading state with an error message
    /// and an empty list. Returns the number of pets now loaded.
    pub async fn load<S: CatalogSource>(&self, source: &S) -> Result<usize, FetchError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.state.write().await;
            state.pets.clear();
            state.loading = true;
            state.error = None;
        }

        let result = source.fetch_catalog().await;

        let mut state = self.state.write().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            // A newer load has started; its result wins.
            return result.map(|pets| pets.len());
        }
        state.loading = false;
        match result {
            Ok(pets) => {
                let count = pets.len();
                state.pets = pets;
                state.error = None;
                info!(count, "pet catalog loaded");
                Ok(count)
            }
            Err(e) => {
                warn!(error = %e, "pet catalog fetch failed");
                state.pets = Vec::new();
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// User-triggered refetch. Same semantics as [`load`](Self::load).
    pub async fn reload<S: CatalogSource>(&self, source: &S) -> Result<usize, FetchError> {
        info!("pet catalog reload requested");
        self.load(source).await
    }

    pub async fn snapshot(&self) -> CatalogSnapshot {
        let state = self.state.read().await;
        CatalogSnapshot {
            pets: state.pets.clone(),
            loading: state.loading,
            error: state.error.clone(),
        }
    }

    pub async fn pets(&self) -> Vec<PetRecord> {
        self.state.read().await.pets.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }
}
