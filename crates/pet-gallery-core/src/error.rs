use thiserror::Error;

/// Errors raised while talking to the catalog endpoint or an image host.
#[derive(Debug, Error)]
pub enum FetchError {
    /// An HTTP request failed (network error, timeout, body read, etc.).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("unexpected HTTP status {status} from {url}")]
    Status { url: String, status: u16 },

    /// The catalog body was not the expected JSON shape.
    #[error("invalid catalog response: {message}")]
    InvalidResponse { message: String },

    /// A URL could not be parsed or uses an unsupported scheme.
    #[error("invalid URL {url:?}: {message}")]
    InvalidUrl { url: String, message: String },
}

/// Errors raised by a [`crate::storage::KeyValueStore`].
#[derive(Debug, Error)]
pub enum StorageError {
    /// A filesystem I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to serialize a value to JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The key cannot be mapped to a storage slot.
    #[error("invalid storage key {0:?}")]
    InvalidKey(String),
}

/// Errors that abort an export as a whole.
///
/// A single image that fails to download is *not* an error here: the
/// pipeline skips it and reports it in [`crate::export::ExportReport`].
#[derive(Debug, Error)]
pub enum ExportError {
    /// Another export is still running on the same exporter.
    #[error("an export is already in progress")]
    AlreadyRunning,

    /// The download history could not be persisted.
    #[error("failed to persist download history: {0}")]
    Storage(#[from] StorageError),

    /// Writing the ZIP archive failed.
    #[error("ZIP archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Writing into the in-memory archive buffer failed.
    #[error("archive I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The blocking archive task panicked or was cancelled.
    #[error("archive task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
