//! Upload job types: request, state, in-memory snapshot, and outcome.

use crate::cache::{FileMeta, UploadCacheRecord};

/// The source image handed to one upload job. Immutable for the job's
/// duration; bytes live in memory only.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn meta(&self) -> FileMeta {
        FileMeta {
            name: self.name.clone(),
            size: self.bytes.len() as u64,
            content_type: self.content_type.clone(),
        }
    }
}

/// Caller input for one upload attempt.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file: SourceFile,
    pub title: String,
    pub description: String,
    pub user_id: String,
    /// Retry of the previous attempt: keep log history and reuse the job
    /// snapshot (in-memory first, durable cache as fallback).
    pub is_retry: bool,
}

/// State machine position of the current attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Idle,
    Preparing,
    UploadingImage,
    UploadingThumbnail,
    SavingRecord,
    Complete,
    Failed,
}

impl UploadState {
    /// Human label shown as the progress status line.
    pub fn label(self) -> &'static str {
        match self {
            UploadState::Idle => "Idle",
            UploadState::Preparing => "Preparing upload",
            UploadState::UploadingImage => "Uploading image",
            UploadState::UploadingThumbnail => "Uploading thumbnail",
            UploadState::SavingRecord => "Saving wallpaper",
            UploadState::Complete => "Complete",
            UploadState::Failed => "Failed",
        }
    }
}

/// Partial progress of one job, reused across retries.
///
/// This is the explicit value threaded through attempts; the durable cache is
/// only the fallback when the in-memory snapshot is gone (page-reload
/// equivalent). URLs recorded here have already been confirmed by the store.
#[derive(Debug, Clone, Default)]
pub struct JobSnapshot {
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
    /// Generated thumbnail bytes, kept so a retry skips re-encoding.
    pub thumbnail: Option<Vec<u8>>,
}

impl JobSnapshot {
    pub fn from_cache(rec: &UploadCacheRecord) -> Self {
        Self {
            image_url: rec.image_url.clone(),
            thumbnail_url: rec.thumbnail_url.clone(),
            thumbnail: None,
        }
    }

    /// At least one stored URL is known, so a retry can skip steps.
    pub fn has_partial(&self) -> bool {
        self.image_url.is_some() || self.thumbnail_url.is_some()
    }
}

/// Structured result of one attempt. Failures are reported here, never thrown
/// past the orchestrator's public contract.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub success: bool,
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub record_id: Option<String>,
    pub error: Option<String>,
    /// Enough remote state was cached that the UI should offer "Resume"
    /// rather than "Retry".
    pub resumable: bool,
}

impl UploadOutcome {
    pub fn failed(error: String, resumable: bool) -> Self {
        Self {
            success: false,
            image_url: None,
            thumbnail_url: None,
            record_id: None,
            error: Some(error),
            resumable,
        }
    }
}
