//! Media file downloading.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use reqwest::{header, Client};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::api::client::download_file;
use crate::download::optimize::{optimize_photo, OptimizeOptions};
use crate::error::{Error, Result};
use crate::fs::naming::{extension_from_url, media_filename, resolve_extension};
use crate::fs::paths::OutputLayout;
use crate::record::{DownloadStatus, MediaKind, MediaRef, RecordCollection};
use crate::shutdown::Shutdown;

/// Download pool settings.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Concurrent downloads.
    pub workers: usize,
    /// Re-encode photos after download; `None` keeps originals.
    pub optimize: Option<OptimizeOptions>,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            workers: 4,
            optimize: Some(OptimizeOptions::default()),
        }
    }
}

/// Counts of what a download pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub downloaded: usize,
    pub failed: usize,
    /// Already present on disk.
    pub skipped: usize,
    /// Never started because the run was cancelled.
    pub cancelled: usize,
}

/// One finished media item.
enum ItemResult {
    Downloaded,
    Existing,
    Failed,
    Cancelled,
}

/// Downloads record media into `<output>/media/` with a bounded worker pool.
#[derive(Debug, Clone)]
pub struct MediaDownloader {
    client: Client,
    media_dir: PathBuf,
    options: DownloadOptions,
    progress: Option<ProgressBar>,
}

impl MediaDownloader {
    pub fn new(client: Client, layout: &OutputLayout, options: DownloadOptions) -> Self {
        Self {
            client,
            media_dir: layout.media_dir(),
            options,
            progress: None,
        }
    }

    /// Advance `bar` once per media item.
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = Some(bar);
        self
    }

    pub fn media_dir(&self) -> &Path {
        &self.media_dir
    }

    /// Download every media reference in `records` and record the outcome on it.
    ///
    /// Individual failures are marked on the reference and logged. Once
    /// `shutdown` trips, items not yet started are marked not downloaded.
    pub async fn download_collection(
        &self,
        records: &mut RecordCollection,
        shutdown: &Shutdown,
    ) -> DownloadSummary {
        let mut media: HashMap<String, Vec<MediaRef>> = records
            .iter()
            .filter(|r| !r.media.is_empty())
            .map(|r| (r.id.clone(), r.media.clone()))
            .collect();

        let jobs: Vec<(String, usize, MediaRef)> = records
            .iter()
            .flat_map(|r| {
                r.media
                    .iter()
                    .enumerate()
                    .map(move |(i, m)| (r.id.clone(), i, m.clone()))
            })
            .collect();

        let mut summary = DownloadSummary::default();
        if jobs.is_empty() {
            return summary;
        }

        if let Err(e) = tokio::fs::create_dir_all(&self.media_dir).await {
            tracing::warn!(
                "Cannot create media directory {}: {}",
                self.media_dir.display(),
                e
            );
        }

        if let Some(bar) = &self.progress {
            bar.set_length(jobs.len() as u64);
        }
        tracing::info!(
            "Downloading {} media items with {} workers",
            jobs.len(),
            self.options.workers
        );

        let results: Vec<(String, usize, MediaRef, ItemResult)> = stream::iter(jobs)
            .map(|(id, index, item)| async move {
                let (item, result) = self.download_item(&id, index, item, shutdown).await;
                if let Some(bar) = &self.progress {
                    bar.inc(1);
                }
                (id, index, item, result)
            })
            .buffer_unordered(self.options.workers.max(1))
            .collect()
            .await;

        for (id, index, item, result) in results {
            match result {
                ItemResult::Downloaded => summary.downloaded += 1,
                ItemResult::Existing => summary.skipped += 1,
                ItemResult::Failed => summary.failed += 1,
                ItemResult::Cancelled => summary.cancelled += 1,
            }
            if let Some(slot) = media.get_mut(&id).and_then(|m| m.get_mut(index)) {
                *slot = item;
            }
        }

        for (id, refs) in media {
            records.update_media(&id, refs);
        }

        if let Some(bar) = &self.progress {
            bar.finish_and_clear();
        }

        summary
    }

    async fn download_item(
        &self,
        record_id: &str,
        index: usize,
        mut item: MediaRef,
        shutdown: &Shutdown,
    ) -> (MediaRef, ItemResult) {
        if item.is_downloaded() {
            return (item, ItemResult::Existing);
        }

        if shutdown.is_cancelled() {
            item.download = DownloadStatus::NotDownloaded;
            return (item, ItemResult::Cancelled);
        }

        match self.fetch_to_disk(record_id, index, &item).await {
            Ok((filename, existed)) => {
                item.local_path = Some(OutputLayout::relative_media_path(&filename));
                item.download = DownloadStatus::Downloaded;
                let result = if existed {
                    ItemResult::Existing
                } else {
                    ItemResult::Downloaded
                };
                (item, result)
            }
            Err(e) => {
                tracing::warn!("Media {}_{} failed: {}", record_id, index, e);
                item.download = DownloadStatus::Failed(e.to_string());
                (item, ItemResult::Failed)
            }
        }
    }

    /// Fetch one item into the media directory. Returns the filename and
    /// whether it was already on disk.
    async fn fetch_to_disk(
        &self,
        record_id: &str,
        index: usize,
        item: &MediaRef,
    ) -> Result<(String, bool)> {
        let url = item
            .download_url()
            .ok_or_else(|| Error::Download("no media URL".to_string()))?;
        let url = match item.kind {
            MediaKind::Photo => original_photo_url(url),
            _ => url.to_string(),
        };

        // Skip the request when the URL already tells us the final name.
        if let Some(ext) = extension_from_url(&url) {
            let filename = media_filename(record_id, index, &ext)?;
            if self.media_dir.join(&filename).exists() {
                tracing::debug!("Skipping existing file: {}", filename);
                return Ok((filename, true));
            }
        }

        let response = download_file(&self.client, &url).await?;
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let ext = resolve_extension(&url, content_type.as_deref(), item.kind);
        let filename = media_filename(record_id, index, &ext)?;
        let target = self.media_dir.join(&filename);

        if target.exists() {
            return Ok((filename, true));
        }

        let tmp = self
            .media_dir
            .join(format!(".{}.{}.part", filename, uuid::Uuid::new_v4()));

        if let Err(e) = stream_to_file(response, &tmp).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e);
        }
        tokio::fs::rename(&tmp, &target).await?;

        if let (MediaKind::Photo, Some(options)) = (item.kind, self.options.optimize) {
            let path = target.clone();
            match tokio::task::spawn_blocking(move || optimize_photo(&path, options)).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => tracing::warn!("Could not optimize {}: {}", filename, e),
                Err(e) => tracing::warn!("Optimization task failed for {}: {}", filename, e),
            }
        }

        tracing::debug!("Downloaded: {}", target.display());
        Ok((filename, false))
    }
}

async fn stream_to_file(response: reqwest::Response, path: &Path) -> Result<()> {
    let mut file = File::create(path).await?;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| Error::Download(format!("Stream error: {}", e)))?;
        file.write_all(&chunk).await?;
    }

    file.flush().await?;
    Ok(())
}

/// Full-resolution variant of a photo URL.
pub fn original_photo_url(url: &str) -> String {
    let base = url.split('?').next().unwrap_or(url);
    format!("{}?format=jpg&name=orig", base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::item::fixtures::{photo, record};

    #[test]
    fn test_original_photo_url() {
        assert_eq!(
            original_photo_url("https://pbs.twimg.com/media/GabC.jpg"),
            "https://pbs.twimg.com/media/GabC.jpg?format=jpg&name=orig"
        );
        assert_eq!(
            original_photo_url("https://pbs.twimg.com/media/GabC?format=png&name=small"),
            "https://pbs.twimg.com/media/GabC?format=jpg&name=orig"
        );
    }

    #[tokio::test]
    async fn test_cancelled_run_marks_items_not_downloaded() {
        let dir = tempfile::TempDir::new().unwrap();
        let layout = OutputLayout::new(dir.path());
        let downloader = MediaDownloader::new(Client::new(), &layout, DownloadOptions::default());

        let mut r = record("1");
        r.media.push(photo("http://127.0.0.1:9/a.jpg"));
        r.media.push(photo("http://127.0.0.1:9/b.jpg"));
        let mut records = RecordCollection::from_records([r]);

        let shutdown = Shutdown::new();
        shutdown.request_shutdown();
        let summary = downloader.download_collection(&mut records, &shutdown).await;

        assert_eq!(summary.cancelled, 2);
        assert_eq!(summary.downloaded, 0);
        let media = &records.get("1").unwrap().media;
        assert!(media
            .iter()
            .all(|m| m.download == DownloadStatus::NotDownloaded && m.local_path.is_none()));
    }

    #[tokio::test]
    async fn test_existing_file_is_not_refetched() {
        let dir = tempfile::TempDir::new().unwrap();
        let layout = OutputLayout::new(dir.path());
        std::fs::create_dir_all(layout.media_dir()).unwrap();
        std::fs::write(layout.media_dir().join("1_0.jpg"), b"jpeg").unwrap();

        let downloader = MediaDownloader::new(Client::new(), &layout, DownloadOptions::default());
        let mut r = record("1");
        // Unroutable host: any request would fail.
        r.media.push(photo("http://127.0.0.1:9/a.jpg"));
        let mut records = RecordCollection::from_records([r]);

        let summary = downloader
            .download_collection(&mut records, &Shutdown::new())
            .await;

        assert_eq!(summary.skipped, 1);
        let item = &records.get("1").unwrap().media[0];
        assert_eq!(item.local_path.as_deref(), Some("media/1_0.jpg"));
        assert!(item.is_downloaded());
    }

    #[tokio::test]
    async fn test_no_media_is_a_no_op() {
        let dir = tempfile::TempDir::new().unwrap();
        let layout = OutputLayout::new(dir.path());
        let downloader = MediaDownloader::new(Client::new(), &layout, DownloadOptions::default());
        let mut records = RecordCollection::from_records([record("1")]);

        let summary = downloader
            .download_collection(&mut records, &Shutdown::new())
            .await;

        assert_eq!(summary, DownloadSummary::default());
        assert!(!layout.media_dir().exists());
    }
}
