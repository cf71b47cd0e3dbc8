//! pet-gallery-core: catalog, selection and export logic for the pet gallery.
//!
//! - [`catalog`]: remote catalog source and the in-memory pet list store
//! - [`selection`]: multi-select state and sort preference
//! - [`view`]: pure filter/sort projection for the gallery
//! - [`export`]: sequential fetch-and-zip pipeline
//! - [`history`]: persisted download history
//! - [`storage`]: key-value persistence behind the history
//! - [`client`]: `reqwest`-based HTTP implementation of the sources

pub mod catalog;
pub mod client;
pub mod error;
pub mod export;
pub mod history;
pub mod model;
pub mod selection;
pub mod storage;
pub mod view;

pub use catalog::{CatalogSnapshot, CatalogSource, PetListStore};
pub use client::{HttpClient, HttpClientBuilder, DEFAULT_CATALOG_URL};
pub use error::{ExportError, FetchError, StorageError};
pub use export::{ExportArchive, ExportReport, Exporter, ImageSource, ARCHIVE_NAME};
pub use history::{DownloadHistory, HISTORY_KEY};
pub use model::{DownloadHistoryEntry, PetRecord, SortOrder};
pub use selection::{SelectionSet, SelectionStore};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use view::{filter_sort, GalleryItem, GalleryView};
