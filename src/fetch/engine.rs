//! Pagination fetch engine.
//!
//! Drives the cursor loop over the Likes timeline: request a page, update the
//! rate-limit tracker, normalize and deduplicate entries, then decide whether
//! to stop or sleep before the next page.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;

use crate::api::client::{PageResponse, XApi};
use crate::api::rate_limit::{self, RateLimitTracker};
use crate::download::{DownloadSummary, MediaDownloader};
use crate::error::{AbortedFetch, Error, Result};
use crate::record::{parse_record, RecordCollection};
use crate::shutdown::Shutdown;

/// Source of Likes timeline pages.
#[async_trait]
pub trait LikesSource: Send + Sync {
    /// Fetch one page starting at `cursor` (`None` for the newest page).
    async fn fetch_page(
        &self,
        user_id: &str,
        cursor: Option<&str>,
        count: u32,
    ) -> Result<PageResponse>;
}

#[async_trait]
impl LikesSource for XApi {
    async fn fetch_page(
        &self,
        user_id: &str,
        cursor: Option<&str>,
        count: u32,
    ) -> Result<PageResponse> {
        self.fetch_likes_page(user_id, cursor, count).await
    }
}

/// Called with `(user_id, resume_cursor, records)` whenever progress should be persisted.
pub type CheckpointFn = Box<dyn FnMut(&str, Option<&str>, &RecordCollection) + Send>;

/// Progress hook: `(records_collected, entries_fetched)`.
pub type ProgressFn<'a> = &'a mut (dyn FnMut(usize, usize) + Send);

/// Tuning knobs for a fetch run.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Minimum spacing between consecutive requests.
    pub request_delay: Duration,
    /// Retries per page for transient failures.
    pub max_retries: u32,
    /// Base backoff when a transient failure carries no rate-limit window.
    pub fallback_backoff: Duration,
    /// Consecutive pages without new records before stopping.
    pub empty_page_limit: u32,
    /// Pages between checkpoint callbacks.
    pub checkpoint_interval: u32,
    /// Keep the raw API payload on each record.
    pub keep_raw: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            request_delay: Duration::from_millis(1000),
            max_retries: 5,
            fallback_backoff: Duration::from_secs(30),
            empty_page_limit: 2,
            checkpoint_interval: 10,
            keep_raw: false,
        }
    }
}

/// Counters describing what a run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchReport {
    pub pages_fetched: u32,
    /// Transient failures that were retried.
    pub retries: u32,
    /// Pauses taken because the quota was exhausted.
    pub throttle_waits: u32,
    /// Entries that failed normalization.
    pub skipped_entries: usize,
    /// Post entries returned by the API, including repeats.
    pub total_entries: usize,
    pub duplicate_entries: usize,
    /// Run stopped early by Ctrl+C or the run deadline.
    pub cancelled: bool,
    /// Cursor to resume from; `None` when the timeline was exhausted.
    pub final_cursor: Option<String>,
}

/// Result of a completed (or cancelled) run.
#[derive(Debug)]
pub struct FetchOutcome {
    pub records: RecordCollection,
    pub report: FetchReport,
    /// Present when media download ran.
    pub downloads: Option<DownloadSummary>,
}

/// Why a page request gave up.
enum PageFailure {
    Cancelled,
    Failed { error: Error, attempts: u32 },
}

/// The Likes pagination loop.
pub struct FetchEngine<S> {
    source: S,
    options: FetchOptions,
    tracker: RateLimitTracker,
    shutdown: Shutdown,
    downloader: Option<MediaDownloader>,
    checkpoint: Option<CheckpointFn>,
    start_cursor: Option<String>,
    seed: RecordCollection,
}

impl<S: LikesSource> FetchEngine<S> {
    pub fn new(source: S, options: FetchOptions, shutdown: Shutdown) -> Self {
        Self {
            source,
            options,
            tracker: RateLimitTracker::new(),
            shutdown,
            downloader: None,
            checkpoint: None,
            start_cursor: None,
            seed: RecordCollection::new(),
        }
    }

    /// Attach the media downloader used when `download_media` is requested.
    pub fn with_downloader(mut self, downloader: MediaDownloader) -> Self {
        self.downloader = Some(downloader);
        self
    }

    /// Persist progress through `checkpoint`.
    pub fn with_checkpoint(mut self, checkpoint: CheckpointFn) -> Self {
        self.checkpoint = Some(checkpoint);
        self
    }

    /// Continue a previous run from `cursor` with its records already collected.
    pub fn with_resume(mut self, cursor: Option<String>, records: RecordCollection) -> Self {
        self.start_cursor = cursor.filter(|c| !c.is_empty());
        self.seed = records;
        self
    }

    /// Rate-limit state observed so far.
    pub fn tracker(&self) -> &RateLimitTracker {
        &self.tracker
    }

    /// Fetch every liked post of `user_id`.
    ///
    /// Transient failures are retried per page. Once a page exhausts its
    /// retries the run fails with [`Error::FetchAborted`] carrying every
    /// record collected so far. Cancellation is not an error: the partial
    /// collection is returned with `report.cancelled` set.
    pub async fn run(
        &mut self,
        user_id: &str,
        page_size: u32,
        download_media: bool,
        mut progress: Option<ProgressFn<'_>>,
    ) -> Result<FetchOutcome> {
        let mut records = std::mem::take(&mut self.seed);
        let mut cursor = self.start_cursor.take();
        let mut report = FetchReport::default();
        let mut consecutive_empty = 0u32;

        if !records.is_empty() {
            tracing::info!(
                "Resuming with {} records from cursor {:?}",
                records.len(),
                cursor
            );
        }

        loop {
            let response = match self
                .fetch_with_retry(user_id, cursor.as_deref(), page_size, &mut report)
                .await
            {
                Ok(response) => response,
                Err(PageFailure::Cancelled) => {
                    report.cancelled = true;
                    break;
                }
                Err(PageFailure::Failed { error, attempts }) => {
                    return Err(self.abort(user_id, records, cursor, report, error, attempts));
                }
            };

            report.pages_fetched += 1;
            self.tracker.observe_window(response.rate_limit);

            let page = response.page;
            let entries = page.posts.len();
            report.total_entries += entries;

            let mut added = 0usize;
            for raw in &page.posts {
                match parse_record(raw, self.options.keep_raw) {
                    Ok(record) => {
                        if records.push(record) {
                            added += 1;
                        } else {
                            report.duplicate_entries += 1;
                        }
                    }
                    Err(reason) => {
                        report.skipped_entries += 1;
                        tracing::warn!("Skipping liked post: {}", reason);
                    }
                }
            }

            if let Some(progress) = progress.as_mut() {
                progress(records.len(), report.total_entries);
            }

            tracing::info!(
                "Page {}: {} entries, {} new, {} total",
                report.pages_fetched,
                entries,
                added,
                records.len()
            );
            if let Some(window) = self.tracker.window() {
                tracing::debug!("Rate limit: {}/{}", window.remaining, window.limit);
            }

            // End of timeline
            if entries == 0 {
                tracing::debug!("Page had no post entries");
                cursor = None;
                break;
            }

            if added == 0 {
                consecutive_empty += 1;
            } else {
                consecutive_empty = 0;
            }

            let Some(next) = page.next_cursor else {
                tracing::debug!("No next cursor");
                cursor = None;
                break;
            };

            if cursor.as_deref() == Some(next.as_str()) && added == 0 {
                tracing::debug!("Cursor did not advance");
                cursor = None;
                break;
            }

            if consecutive_empty >= self.options.empty_page_limit {
                tracing::debug!("{} consecutive pages without new records", consecutive_empty);
                cursor = None;
                break;
            }

            cursor = Some(next);

            if self.options.checkpoint_interval > 0
                && report.pages_fetched % self.options.checkpoint_interval == 0
            {
                self.save_checkpoint(user_id, cursor.as_deref(), &records);
            }

            if self.shutdown.is_cancelled() {
                report.cancelled = true;
                break;
            }

            if !self.shutdown.sleep(politeness_delay(self.options.request_delay)).await {
                report.cancelled = true;
                break;
            }

            if self.tracker.should_wait() {
                let wait = self.tracker.wait_duration();
                self.tracker.mark_waited();

                if !wait.is_zero() {
                    report.throttle_waits += 1;
                    tracing::warn!("Rate limit reached, waiting {}s", wait.as_secs());
                    self.save_checkpoint(user_id, cursor.as_deref(), &records);

                    if !self.shutdown.sleep(wait).await {
                        report.cancelled = true;
                        break;
                    }
                }
            }
        }

        report.final_cursor = cursor;

        if report.cancelled {
            tracing::warn!("Fetch cancelled with {} records collected", records.len());
            self.save_checkpoint(user_id, report.final_cursor.as_deref(), &records);
        } else {
            tracing::info!(
                "Fetch complete: {} records in {} pages",
                records.len(),
                report.pages_fetched
            );
        }

        let downloads = match (&self.downloader, download_media) {
            (Some(downloader), true) => {
                Some(downloader.download_collection(&mut records, &self.shutdown).await)
            }
            _ => None,
        };

        Ok(FetchOutcome {
            records,
            report,
            downloads,
        })
    }

    /// Request one page, retrying transient failures against the same cursor.
    async fn fetch_with_retry(
        &mut self,
        user_id: &str,
        cursor: Option<&str>,
        page_size: u32,
        report: &mut FetchReport,
    ) -> std::result::Result<PageResponse, PageFailure> {
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let result = self.source.fetch_page(user_id, cursor, page_size).await;

            let error = match result {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };

            if !error.is_transient() || attempts > self.options.max_retries {
                return Err(PageFailure::Failed { error, attempts });
            }

            if self.shutdown.is_cancelled() {
                return Err(PageFailure::Cancelled);
            }

            let fallback = rate_limit::fallback_backoff(self.options.fallback_backoff, attempts);
            let window = error.rate_limit_window();
            self.tracker.observe_window(window);
            let wait = match window {
                Some(window) => {
                    // This retry waits the window out itself.
                    self.tracker.mark_waited();
                    let until_reset = rate_limit::wait_until(window.reset_at, Utc::now());
                    if until_reset.is_zero() {
                        fallback
                    } else {
                        until_reset
                    }
                }
                None => fallback,
            };

            report.retries += 1;
            tracing::warn!(
                "Attempt {}/{} failed: {}. Retrying in {}s",
                attempts,
                self.options.max_retries + 1,
                error,
                wait.as_secs()
            );

            if !self.shutdown.sleep(wait).await {
                return Err(PageFailure::Cancelled);
            }
        }
    }

    fn abort(
        &mut self,
        user_id: &str,
        records: RecordCollection,
        cursor: Option<String>,
        report: FetchReport,
        error: Error,
        attempts: u32,
    ) -> Error {
        // Nothing collected yet and retrying would not help: report the cause directly.
        if report.pages_fetched == 0 && records.is_empty() && !error.is_transient() {
            return error;
        }

        tracing::error!(
            "Giving up on page {} after {} attempt(s): {}",
            report.pages_fetched + 1,
            attempts,
            error
        );
        self.save_checkpoint(user_id, cursor.as_deref(), &records);

        Error::FetchAborted(Box::new(AbortedFetch {
            records,
            cursor,
            attempts,
            reason: error.to_string(),
        }))
    }

    fn save_checkpoint(&mut self, user_id: &str, cursor: Option<&str>, records: &RecordCollection) {
        if let Some(checkpoint) = self.checkpoint.as_mut() {
            checkpoint(user_id, cursor, records);
        }
    }
}

/// Fixed floor plus up to a quarter of it in random jitter.
fn politeness_delay(base: Duration) -> Duration {
    let base_ms = base.as_millis() as u64;
    if base_ms == 0 {
        return Duration::ZERO;
    }
    let jitter = rand::thread_rng().gen_range(0..=base_ms / 4);
    Duration::from_millis(base_ms + jitter)
}
