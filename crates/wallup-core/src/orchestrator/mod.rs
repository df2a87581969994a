//! Upload orchestrator: the resumable three-step state machine.
//!
//! Drives thumbnail generation → full-image store → thumbnail store →
//! record persist, reporting progress and log events, honoring one shared
//! cancel token and a whole-job deadline, and deciding retryability and
//! whether cached partial progress can be reused.

mod run;

use std::time::Duration;

use tokio::sync::watch;

use crate::blob_store::BlobStore;
use crate::cache::UploadCache;
use crate::config::{ThumbnailConfig, UploadConfig};
use crate::control::CancelToken;
use crate::error::{classify_transport, UploadError};
use crate::job::{JobSnapshot, UploadOutcome, UploadRequest, UploadState};
use crate::net_monitor::{ConnectionState, Speed};
use crate::reporter::{LogEntry, LogKind, ProgressState, Reporter, ReporterEvent};
use crate::wallpaper_api::WallpaperApi;

/// One upload session: owns the cache slot, the log/progress reporter, and
/// the in-memory snapshot reused across retries. The UI layer is responsible
/// for not starting a second job while one is uploading.
pub struct UploadOrchestrator {
    blob: BlobStore,
    api: WallpaperApi,
    cache: UploadCache,
    reporter: Reporter,
    conn: watch::Receiver<ConnectionState>,
    thumb_cfg: ThumbnailConfig,
    job_timeout: Duration,
    max_file_bytes: u64,
    state: UploadState,
    snapshot: Option<JobSnapshot>,
}

impl UploadOrchestrator {
    pub fn new(
        cfg: &UploadConfig,
        cache: UploadCache,
        conn: watch::Receiver<ConnectionState>,
    ) -> Self {
        let client = reqwest::Client::new();
        Self {
            blob: BlobStore::new(client.clone(), &cfg.blob_endpoint),
            api: WallpaperApi::new(client, &cfg.record_endpoint),
            cache,
            reporter: Reporter::new(),
            conn,
            thumb_cfg: cfg.thumbnail(),
            job_timeout: cfg.job_timeout(),
            max_file_bytes: cfg.max_file_bytes,
            state: UploadState::Idle,
            snapshot: None,
        }
    }

    /// Subscribe the UI to log and progress events.
    pub fn subscribe_events(&mut self) -> tokio::sync::mpsc::UnboundedReceiver<ReporterEvent> {
        self.reporter.subscribe()
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    pub fn log(&self) -> &[LogEntry] {
        self.reporter.entries()
    }

    pub fn progress(&self) -> &ProgressState {
        self.reporter.progress()
    }

    /// Run one upload attempt. Never panics and never returns an error past
    /// this boundary: every failure is folded into the outcome.
    ///
    /// `cancel` is the attempt's shared abort signal; the caller keeps a clone
    /// and may trigger it from another task. Cancellation aborts the in-flight
    /// network call, clears progress/log/error, and returns the session to
    /// Idle without compensation.
    pub async fn upload(&mut self, req: UploadRequest, cancel: &CancelToken) -> UploadOutcome {
        if let Err(e) = self.validate(&req) {
            // Validation failures cause no state transition and no cache write.
            // A fresh attempt starts a fresh log; a retry keeps its history.
            if !req.is_retry {
                self.reporter.reset();
            }
            let message = e.to_string();
            self.reporter.fail(message.clone());
            return UploadOutcome::failed(message, false);
        }

        if !req.is_retry {
            self.reporter.reset();
            self.snapshot = None;
        }
        self.reporter.begin();
        if req.is_retry {
            self.reporter
                .append(format!("Retrying upload of \"{}\"", req.title), LogKind::Info);
        } else {
            self.reporter
                .append(format!("Starting upload of \"{}\"", req.title), LogKind::Info);
        }

        // The in-memory snapshot wins; the durable cache is the fallback for
        // a fresh process (page-reload equivalent).
        let mut snap = match self.snapshot.take() {
            Some(snap) => snap,
            None => self
                .cache
                .load(&req.user_id)
                .map(|rec| JobSnapshot::from_cache(&rec))
                .unwrap_or_default(),
        };
        let had_cached_image = snap.image_url.is_some();
        if had_cached_image {
            self.reporter
                .append("Resuming from saved progress", LogKind::Info);
        }

        let deadline = self.job_timeout;
        let cancel = cancel.clone();
        let result = tokio::select! {
            _ = cancel.cancelled() => Err(UploadError::Cancelled),
            run = tokio::time::timeout(deadline, self.run_steps(&req, &mut snap, had_cached_image)) => {
                match run {
                    Ok(inner) => inner,
                    Err(_) => Err(UploadError::Timeout(deadline)),
                }
            }
        };

        match result {
            Ok((image_url, thumbnail_url, record_id)) => {
                self.state = UploadState::Complete;
                self.reporter.append("Upload complete", LogKind::Success);
                self.reporter.complete();
                self.cache.clear();
                self.snapshot = None;
                UploadOutcome {
                    success: true,
                    image_url: Some(image_url),
                    thumbnail_url: Some(thumbnail_url),
                    record_id,
                    error: None,
                    resumable: false,
                }
            }
            Err(UploadError::Cancelled) => {
                tracing::info!("upload cancelled by user");
                self.state = UploadState::Idle;
                self.reporter.reset();
                self.cache.clear();
                self.snapshot = None;
                UploadOutcome::failed("upload cancelled".to_string(), false)
            }
            Err(e) => {
                if let UploadError::Network(inner) = &e {
                    tracing::debug!(kind = ?classify_transport(inner), "transport failure");
                }
                self.state = UploadState::Failed;
                let resumable = e.is_retryable() && snap.has_partial();
                let message = e.to_string();
                self.reporter.fail(message.clone());
                if resumable {
                    self.reporter
                        .append("Partial progress saved; resume to continue", LogKind::Info);
                }
                // Keep the snapshot so an explicit retry can skip done steps.
                self.snapshot = Some(snap);
                UploadOutcome::failed(message, resumable)
            }
        }
    }

    /// Entry conditions checked before any state transition.
    fn validate(&self, req: &UploadRequest) -> Result<(), UploadError> {
        let reject = |message: String| Err(UploadError::Validation(message));
        if req.user_id.trim().is_empty() {
            return reject("you must be signed in to upload".to_string());
        }
        if req.title.trim().is_empty() {
            return reject("a title is required".to_string());
        }
        if req.file.bytes.is_empty() {
            return reject("the selected file is empty".to_string());
        }
        if req.file.bytes.len() as u64 > self.max_file_bytes {
            return reject(format!(
                "file is too large ({} MB, limit {} MB)",
                req.file.bytes.len() as u64 / (1024 * 1024),
                self.max_file_bytes / (1024 * 1024)
            ));
        }
        if !req.file.content_type.starts_with("image/") {
            return reject(format!(
                "unsupported file type: {}",
                req.file.content_type
            ));
        }
        let conn = *self.conn.borrow();
        if !conn.online || conn.speed == Speed::Offline {
            return reject("no internet connection".to_string());
        }
        Ok(())
    }
}
