//! Selection-to-archive export pipeline.
//!
//! An export walks the selection one url at a time: fetch the image, name it
//! after its catalog title, add it to the archive and record a history
//! entry. A url whose fetch fails is logged and skipped; the rest of the
//! selection still goes through.

use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{ExportError, FetchError};
use crate::history::DownloadHistory;
use crate::model::{DownloadHistoryEntry, PetRecord};
use crate::storage::KeyValueStore;

/// File name of every produced archive.
pub const ARCHIVE_NAME: &str = "pets_images.zip";

/// Stem used when a selected url has no catalog entry.
pub const DEFAULT_IMAGE_NAME: &str = "pet_image";

const IMAGE_EXTENSION: &str = "jpeg";

/// Where image bytes come from.
pub trait ImageSource: Send + Sync + 'static {
    /// Fetch the raw bytes behind `url`.
    fn fetch_image(
        &self,
        url: &str,
    ) -> impl std::future::Future<Output = Result<Bytes, FetchError>> + Send;
}

/// Turn a pet title into a file-name stem.
///
/// Each run of whitespace becomes a single `_`; path separators become `_`
/// as well so a title can never introduce a directory in the archive.
pub fn safe_file_stem(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut in_space = false;
    for c in title.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('_');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        out.push(if c == '/' || c == '\\' { '_' } else { c });
    }
    if out.is_empty() {
        DEFAULT_IMAGE_NAME.to_string()
    } else {
        out
    }
}

/// Outcome counts of one export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportReport {
    /// Urls in the selection.
    pub requested: usize,
    /// Images written into the archive.
    pub packaged: usize,
    /// Urls skipped because their fetch failed, in selection order.
    pub failed: Vec<String>,
    /// Length of the download history after this export.
    pub history_len: usize,
}

/// A finished archive, ready to hand to the user.
#[derive(Debug, Clone)]
pub struct ExportArchive {
    pub file_name: &'static str,
    /// Names of the files inside the archive, in write order.
    pub entries: Vec<String>,
    pub bytes: Vec<u8>,
    pub report: ExportReport,
}

/// Runs exports. At most one export runs at a time per exporter.
#[derive(Debug)]
pub struct Exporter<I, S> {
    images: Arc<I>,
    history: Arc<DownloadHistory<S>>,
    running: AtomicBool,
}

/// Clears the running flag when an export finishes, fails, or is dropped.
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<I: ImageSource, S: KeyValueStore> Exporter<I, S> {
    pub fn new(images: Arc<I>, history: Arc<DownloadHistory<S>>) -> Self {
        Self {
            images,
            history,
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Package every url of `selection` into one ZIP archive.
    ///
    /// Fetches are strictly sequential. The history entries of packaged
    /// images are persisted before the archive is serialized.
    pub async fn export_selection(
        &self,
        selection: &[String],
        catalog: &[PetRecord],
    ) -> Result<ExportArchive, ExportError> {
        let _guard = RunGuard::acquire(&self.running).ok_or(ExportError::AlreadyRunning)?;

        let by_url: HashMap<&str, &PetRecord> =
            catalog.iter().map(|p| (p.url.as_str(), p)).collect();

        let mut files: Vec<(String, Bytes)> = Vec::with_capacity(selection.len());
        let mut used_names = HashSet::with_capacity(selection.len());
        let mut new_entries = Vec::with_capacity(selection.len());
        let mut failed = Vec::new();

        for url in selection {
            let bytes = match self.images.fetch_image(url).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(url = %url, error = %e, "failed to fetch image; skipping");
                    failed.push(url.clone());
                    continue;
                }
            };

            let title = by_url.get(url.as_str()).map(|pet| pet.title.clone());
            let stem = match &title {
                Some(t) => safe_file_stem(t),
                None => DEFAULT_IMAGE_NAME.to_string(),
            };
            let name = unique_name(&stem, &mut used_names);

            files.push((name, bytes));
            new_entries.push(DownloadHistoryEntry::new(title, url.clone(), Utc::now()));
        }

        let history_len = self.history.append(new_entries).await?;

        let entries: Vec<String> = files.iter().map(|(name, _)| name.clone()).collect();
        let bytes = tokio::task::spawn_blocking(move || write_archive(&files)).await??;

        let report = ExportReport {
            requested: selection.len(),
            packaged: entries.len(),
            failed,
            history_len,
        };
        info!(
            requested = report.requested,
            packaged = report.packaged,
            failed = report.failed.len(),
            archive_bytes = bytes.len(),
            "export finished"
        );

        Ok(ExportArchive {
            file_name: ARCHIVE_NAME,
            entries,
            bytes,
            report,
        })
    }
}

/// `<stem>.jpeg`, or `<stem>_N.jpeg` when that name is already taken.
fn unique_name(stem: &str, used: &mut HashSet<String>) -> String {
    let mut candidate = format!("{stem}.{IMAGE_EXTENSION}");
    let mut n = 2;
    while used.contains(&candidate) {
        candidate = format!("{stem}_{n}.{IMAGE_EXTENSION}");
        n += 1;
    }
    used.insert(candidate.clone());
    candidate
}

fn write_archive(files: &[(String, Bytes)]) -> Result<Vec<u8>, ExportError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, data) in files {
        writer.start_file(name.as_str(), options)?;
        writer.write_all(data)?;
    }

    Ok(writer.finish()?.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::io::Read;
    use std::sync::Mutex;
    use tokio::sync::Notify;
    use tracing_test::traced_test;

    /// Image host serving `image:<url>` for every url except the failing ones.
    #[derive(Default)]
    struct FakeImages {
        failing: HashSet<String>,
        requests: Mutex<Vec<String>>,
        gate: Option<Arc<Notify>>,
    }

    impl FakeImages {
        fn failing(urls: &[&str]) -> Self {
            Self {
                failing: urls.iter().map(|u| u.to_string()).collect(),
                ..Self::default()
            }
        }
    }

    impl ImageSource for FakeImages {
        async fn fetch_image(&self, url: &str) -> Result<Bytes, FetchError> {
            self.requests.lock().unwrap().push(url.to_string());
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.failing.contains(url) {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                });
            }
            Ok(Bytes::from(format!("image:{url}")))
        }
    }

    fn pet(title: &str, file: &str) -> PetRecord {
        PetRecord::new(title, "", format!("https://pets.example/{file}.jpg"))
    }

    fn exporter(
        images: FakeImages,
    ) -> (
        Exporter<FakeImages, MemoryStore>,
        Arc<DownloadHistory<MemoryStore>>,
    ) {
        let history = Arc::new(DownloadHistory::new(Arc::new(MemoryStore::new())));
        (Exporter::new(Arc::new(images), Arc::clone(&history)), history)
    }

    fn archive_files(bytes: &[u8]) -> Vec<(String, String)> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut file = archive.by_index(i).unwrap();
                let mut body = String::new();
                file.read_to_string(&mut body).unwrap();
                (file.name().to_string(), body)
            })
            .collect()
    }

    #[test]
    fn whitespace_runs_become_single_underscores() {
        assert_eq!(safe_file_stem("Max  Jr"), "Max_Jr");
        assert_eq!(safe_file_stem("Golden Retriever Puppy"), "Golden_Retriever_Puppy");
        assert_eq!(safe_file_stem(" Tab\tand\nnewline "), "_Tab_and_newline_");
        assert_eq!(safe_file_stem("Rex/../etc"), "Rex_.._etc");
        assert_eq!(safe_file_stem(""), DEFAULT_IMAGE_NAME);
    }

    #[test]
    fn unique_name_suffixes_collisions() {
        let mut used = HashSet::new();
        assert_eq!(unique_name("Max", &mut used), "Max.jpeg");
        assert_eq!(unique_name("Max", &mut used), "Max_2.jpeg");
        assert_eq!(unique_name("Max", &mut used), "Max_3.jpeg");
        assert_eq!(unique_name("Bella", &mut used), "Bella.jpeg");
    }

    #[tokio::test]
    #[traced_test]
    async fn failed_fetch_is_skipped_and_not_recorded() {
        let catalog = vec![pet("Bella", "b"), pet("Max", "m"), pet("Stella", "s")];
        let selection: Vec<String> = catalog.iter().map(|p| p.url.clone()).collect();
        let (exporter, history) = exporter(FakeImages::failing(&["https://pets.example/m.jpg"]));

        let archive = exporter.export_selection(&selection, &catalog).await.unwrap();

        assert_eq!(archive.file_name, "pets_images.zip");
        assert_eq!(archive.entries, vec!["Bella.jpeg", "Stella.jpeg"]);
        let files = archive_files(&archive.bytes);
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].1, "image:https://pets.example/b.jpg");

        let log = history.read().await;
        assert_eq!(log.len(), 2);
        assert!(log.iter().all(|e| e.url != "https://pets.example/m.jpg"));

        assert_eq!(archive.report.requested, 3);
        assert_eq!(archive.report.packaged, 2);
        assert_eq!(archive.report.failed, vec!["https://pets.example/m.jpg"]);
        assert!(logs_contain("failed to fetch image"));
    }

    #[tokio::test]
    async fn export_appends_one_entry_per_packaged_image() {
        let catalog = vec![pet("Bella", "b"), pet("Max", "m")];
        let (exporter, history) = exporter(FakeImages::default());
        history
            .append(vec![DownloadHistoryEntry::new(None, "https://old.example/x.jpg", Utc::now())])
            .await
            .unwrap();

        let before = history.read().await.len();
        let archive = exporter
            .export_selection(&[catalog[1].url.clone()], &catalog)
            .await
            .unwrap();
        let after = history.read().await;

        assert_eq!(after.len(), before + 1);
        assert_eq!(after.last().unwrap().url, catalog[1].url);
        assert_eq!(after.last().unwrap().title.as_deref(), Some("Max"));
        assert_eq!(archive.report.history_len, after.len());
    }

    #[tokio::test]
    async fn fetches_follow_selection_order_one_at_a_time() {
        let catalog = vec![pet("Apollo", "a"), pet("Zed", "z")];
        let selection = vec![catalog[1].url.clone(), catalog[0].url.clone()];
        let images = Arc::new(FakeImages::default());
        let history = Arc::new(DownloadHistory::new(Arc::new(MemoryStore::new())));
        let exporter = Exporter::new(Arc::clone(&images), history);

        let archive = exporter.export_selection(&selection, &catalog).await.unwrap();

        assert_eq!(*images.requests.lock().unwrap(), selection);
        assert_eq!(archive.entries, vec!["Zed.jpeg", "Apollo.jpeg"]);
    }

    #[tokio::test]
    async fn stale_selection_uses_default_name() {
        let catalog = vec![pet("Bella", "b")];
        let selection = vec!["https://pets.example/gone.jpg".to_string()];
        let (exporter, history) = exporter(FakeImages::default());

        let archive = exporter.export_selection(&selection, &catalog).await.unwrap();

        assert_eq!(archive.entries, vec!["pet_image.jpeg"]);
        let log = history.read().await;
        assert_eq!(log[0].title, None);
        assert_eq!(log[0].url, "https://pets.example/gone.jpg");
    }

    #[tokio::test]
    async fn duplicate_titles_are_all_packaged() {
        let catalog = vec![pet("Max", "m1"), pet("Max", "m2")];
        let selection: Vec<String> = catalog.iter().map(|p| p.url.clone()).collect();
        let (exporter, _) = exporter(FakeImages::default());

        let archive = exporter.export_selection(&selection, &catalog).await.unwrap();

        let names: Vec<String> = archive_files(&archive.bytes).into_iter().map(|f| f.0).collect();
        assert_eq!(names, vec!["Max.jpeg", "Max_2.jpeg"]);
    }

    #[tokio::test]
    async fn empty_selection_yields_empty_archive() {
        let (exporter, history) = exporter(FakeImages::default());
        let archive = exporter.export_selection(&[], &[]).await.unwrap();

        assert!(archive.entries.is_empty());
        assert!(archive_files(&archive.bytes).is_empty());
        assert!(history.read().await.is_empty());
    }

    #[tokio::test]
    async fn second_export_is_refused_while_one_runs() {
        let gate = Arc::new(Notify::new());
        let images = FakeImages {
            gate: Some(Arc::clone(&gate)),
            ..FakeImages::default()
        };
        let history = Arc::new(DownloadHistory::new(Arc::new(MemoryStore::new())));
        let exporter = Arc::new(Exporter::new(Arc::new(images), Arc::clone(&history)));
        let catalog = vec![pet("Bella", "b")];
        let selection = vec![catalog[0].url.clone()];

        let first = {
            let exporter = Arc::clone(&exporter);
            let (selection, catalog) = (selection.clone(), catalog.clone());
            tokio::spawn(async move { exporter.export_selection(&selection, &catalog).await })
        };
        while !exporter.is_running() {
            tokio::task::yield_now().await;
        }

        let second = exporter.export_selection(&selection, &catalog).await;
        assert!(matches!(second, Err(ExportError::AlreadyRunning)));

        gate.notify_one();
        let archive = first.await.unwrap().unwrap();
        assert_eq!(archive.report.packaged, 1);
        assert!(!exporter.is_running());
        assert_eq!(history.read().await.len(), 1);

        // The flag is released, so a new export may start.
        gate.notify_one();
        assert!(exporter.export_selection(&selection, &catalog).await.is_ok());
    }
}
