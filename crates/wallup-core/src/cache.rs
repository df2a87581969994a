//! Durable single-slot upload cache (JSON under XDG state dir).
//!
//! Stores the partial progress of the one in-flight upload — URLs obtained so
//! far plus the original form fields — so a retried or resumed job can skip
//! remote steps whose output is already known. File bytes are never persisted,
//! only name/size/type metadata.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source-file metadata kept for display on resume (never the bytes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    pub name: String,
    pub size: u64,
    pub content_type: String,
}

/// The one durable record. Valid only while fresh and owned by the same user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadCacheRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<FileMeta>,
    pub title: String,
    pub description: String,
    pub user_id: String,
    /// Unix timestamp (seconds) of the last merge.
    pub timestamp: i64,
}

/// Handle to the single-slot cache file.
///
/// The default slot lives at `~/.local/state/wallup/upload_cache.json`.
pub struct UploadCache {
    path: PathBuf,
    ttl: Duration,
    record: Option<UploadCacheRecord>,
}

impl UploadCache {
    /// Open the default slot under the XDG state dir.
    pub fn open_default(ttl: Duration) -> Result<Self> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("wallup")?;
        let state_dir = xdg_dirs.get_state_home();
        std::fs::create_dir_all(&state_dir)
            .with_context(|| format!("create state dir: {}", state_dir.display()))?;
        Ok(Self::open_at(state_dir.join("upload_cache.json"), ttl))
    }

    /// Open a slot at an explicit path (tests point this at a temp dir).
    pub fn open_at(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl,
            record: None,
        }
    }

    /// Merge the original form fields into the slot and persist.
    pub fn record_job_fields(&mut self, file: FileMeta, title: &str, description: &str, user_id: &str) {
        let rec = self.record.get_or_insert_with(UploadCacheRecord::default);
        rec.file = Some(file);
        rec.title = title.to_string();
        rec.description = description.to_string();
        rec.user_id = user_id.to_string();
        self.persist();
    }

    /// Record the stored full-image URL and persist.
    pub fn record_image_url(&mut self, url: &str) {
        let rec = self.record.get_or_insert_with(UploadCacheRecord::default);
        rec.image_url = Some(url.to_string());
        self.persist();
    }

    /// Record the stored thumbnail URL and persist.
    pub fn record_thumbnail_url(&mut self, url: &str) {
        let rec = self.record.get_or_insert_with(UploadCacheRecord::default);
        rec.thumbnail_url = Some(url.to_string());
        self.persist();
    }

    /// Load the durable record for `current_user`.
    ///
    /// A record older than the TTL or belonging to a different user is treated
    /// as absent and the slot is purged.
    pub fn load(&mut self, current_user: &str) -> Option<UploadCacheRecord> {
        let rec = match self.read_slot() {
            Some(rec) => rec,
            None => return None,
        };

        let age = unix_timestamp().saturating_sub(rec.timestamp);
        if age >= self.ttl.as_secs() as i64 {
            tracing::debug!("upload cache expired ({}s old), purging", age);
            self.clear();
            return None;
        }
        if rec.user_id != current_user {
            tracing::debug!("upload cache belongs to another user, purging");
            self.clear();
            return None;
        }

        self.record = Some(rec.clone());
        Some(rec)
    }

    /// Remove the durable record and reset in-memory state.
    pub fn clear(&mut self) {
        self.record = None;
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("failed to remove upload cache {}: {}", self.path.display(), e),
        }
    }

    /// Write the in-memory record to disk, stamping `timestamp = now`.
    /// Persistence failures are warnings, never errors: the upload proceeds.
    fn persist(&mut self) {
        let rec = match &mut self.record {
            Some(rec) => rec,
            None => return,
        };
        rec.timestamp = unix_timestamp();

        let result = serde_json::to_string_pretty(rec)
            .map_err(anyhow::Error::from)
            .and_then(|json| {
                if let Some(parent) = self.path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&self.path, json)?;
                Ok(())
            });
        if let Err(e) = result {
            tracing::warn!("failed to persist upload cache {}: {}", self.path.display(), e);
        }
    }

    fn read_slot(&self) -> Option<UploadCacheRecord> {
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("failed to read upload cache {}: {}", self.path.display(), e);
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(rec) => Some(rec),
            Err(e) => {
                tracing::warn!("corrupt upload cache {}: {}", self.path.display(), e);
                None
            }
        }
    }
}

fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Rewrite the slot's timestamp in place (test helper for TTL expiry).
#[doc(hidden)]
pub fn backdate_slot(path: &Path, timestamp: i64) -> Result<()> {
    let bytes = std::fs::read(path)?;
    let mut rec: UploadCacheRecord = serde_json::from_slice(&bytes)?;
    rec.timestamp = timestamp;
    std::fs::write(path, serde_json::to_string_pretty(&rec)?)?;
    Ok(())
}
