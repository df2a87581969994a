//! The step sequence of one upload attempt: prepare → store image → store
//! thumbnail → persist record, with cache writes after each completed step
//! and compensation on first-attempt persistence failure.

use super::UploadOrchestrator;
use crate::blob_store::{FOLDER_THUMBNAILS, FOLDER_WALLPAPERS};
use crate::error::UploadError;
use crate::job::{JobSnapshot, UploadRequest, UploadState};
use crate::reporter::LogKind;
use crate::thumbnail::{self, ThumbnailError};

impl UploadOrchestrator {
    /// Runs steps strictly in order; each cache write happens after the remote
    /// call it records has succeeded. Returns `(image_url, thumbnail_url,
    /// record_id)` on full completion.
    pub(super) async fn run_steps(
        &mut self,
        req: &UploadRequest,
        snap: &mut JobSnapshot,
        had_cached_image: bool,
    ) -> Result<(String, String, Option<String>), UploadError> {
        // --- Preparing ---
        self.state = UploadState::Preparing;
        self.reporter.set_progress(5, UploadState::Preparing.label());

        if snap.thumbnail_url.is_none() && snap.thumbnail.is_none() {
            self.reporter.append("Generating thumbnail", LogKind::Log);
            let thumb_cfg = self.thumb_cfg.clone();
            let bytes = req.file.bytes.clone();
            let thumb = tokio::task::spawn_blocking(move || {
                thumbnail::generate_thumbnail(&bytes, thumb_cfg.target_width, thumb_cfg.quality)
            })
            .await
            .map_err(|e| ThumbnailError::Task(e.to_string()))??;
            self.reporter.append(
                format!("Thumbnail ready ({:.1} KB)", thumb.len() as f64 / 1024.0),
                LogKind::Info,
            );
            snap.thumbnail = Some(thumb);
        }

        // Persist form fields now so a crash mid-upload is still resumable.
        self.cache
            .record_job_fields(req.file.meta(), &req.title, &req.description, &req.user_id);
        self.reporter.set_progress(10, UploadState::Preparing.label());

        // --- Full image ---
        let image_url = match &snap.image_url {
            Some(url) => {
                self.reporter
                    .append("Full image already stored, skipping", LogKind::Info);
                url.clone()
            }
            None => {
                self.state = UploadState::UploadingImage;
                self.reporter
                    .set_progress(15, UploadState::UploadingImage.label());
                let url = self
                    .blob
                    .upload(
                        &req.file.name,
                        &req.file.content_type,
                        req.file.bytes.clone(),
                        &req.user_id,
                        FOLDER_WALLPAPERS,
                    )
                    .await?;
                self.reporter
                    .append(format!("Image stored at {}", url), LogKind::Success);
                snap.image_url = Some(url.clone());
                self.cache.record_image_url(&url);
                url
            }
        };
        self.reporter
            .set_progress(40, UploadState::UploadingThumbnail.label());

        // --- Thumbnail (non-fatal) ---
        let thumbnail_url = match &snap.thumbnail_url {
            Some(url) => {
                self.reporter
                    .append("Thumbnail already stored, skipping", LogKind::Info);
                url.clone()
            }
            None => {
                self.state = UploadState::UploadingThumbnail;
                // Generated above whenever no stored thumbnail URL exists.
                let bytes = snap.thumbnail.clone().unwrap_or_default();
                let name = format!("thumb_{}.jpg", req.file.name);
                match self
                    .blob
                    .upload(&name, "image/jpeg", bytes, &req.user_id, FOLDER_THUMBNAILS)
                    .await
                {
                    Ok(url) => {
                        self.reporter
                            .append(format!("Thumbnail stored at {}", url), LogKind::Success);
                        snap.thumbnail_url = Some(url.clone());
                        self.cache.record_thumbnail_url(&url);
                        url
                    }
                    Err(e) => {
                        self.reporter.append(
                            format!("Thumbnail store failed ({}), reusing full image", e),
                            LogKind::Warning,
                        );
                        snap.thumbnail_url = Some(image_url.clone());
                        self.cache.record_thumbnail_url(&image_url);
                        image_url.clone()
                    }
                }
            }
        };
        self.reporter
            .set_progress(70, UploadState::SavingRecord.label());

        // --- Persist record ---
        self.state = UploadState::SavingRecord;
        match self
            .api
            .save(
                &req.user_id,
                &req.title,
                &req.description,
                &image_url,
                &thumbnail_url,
            )
            .await
        {
            Ok(record_id) => {
                self.reporter
                    .append("Wallpaper record saved", LogKind::Success);
                Ok((image_url, thumbnail_url, record_id))
            }
            Err(e) => {
                // Compensate only for brand-new jobs: a resumed job's stored
                // blob may still be needed by a future retry.
                if !had_cached_image {
                    self.reporter
                        .append("Save failed, removing stored image", LogKind::Warning);
                    match self.blob.delete(&image_url).await {
                        Ok(()) => self
                            .reporter
                            .append("Stored image removed", LogKind::Log),
                        Err(del) => self.reporter.append(
                            format!("Cleanup failed, blob left behind: {}", del),
                            LogKind::Warning,
                        ),
                    }
                }
                Err(e)
            }
        }
    }
}
