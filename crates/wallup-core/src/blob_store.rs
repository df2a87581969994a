//! Client for the remote blob-store endpoint.
//!
//! The store accepts a multipart POST (`file`, `userId`, `folder`) and replies
//! `{success, url?, error?}`; a JSON-body DELETE removes a stored blob. Both
//! are consumed as an opaque HTTP contract.

use serde::Deserialize;

use crate::error::UploadError;

/// Folder for full-resolution wallpapers.
pub const FOLDER_WALLPAPERS: &str = "wallpapers";
/// Folder for generated preview thumbnails.
pub const FOLDER_THUMBNAILS: &str = "thumbnails";

#[derive(Debug, Deserialize)]
struct StoreResponse {
    success: bool,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

pub struct BlobStore {
    client: reqwest::Client,
    endpoint: String,
}

impl BlobStore {
    pub fn new(client: reqwest::Client, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
        }
    }

    /// POST `bytes` as a multipart upload tagged with `user_id` and `folder`.
    /// Returns the URL assigned by the store.
    pub async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
        user_id: &str,
        folder: &str,
    ) -> Result<String, UploadError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)
            .map_err(|e| UploadError::Storage(format!("invalid content type: {}", e)))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("userId", user_id.to_string())
            .text("folder", folder.to_string());

        let resp = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(UploadError::Network)?;

        let status = resp.status();
        let body = resp.text().await.map_err(UploadError::Network)?;
        let parsed = parsed_from(&body);

        if !status.is_success() || !parsed.as_ref().map(|r| r.success).unwrap_or(false) {
            let message = parsed
                .and_then(|r| r.error)
                .unwrap_or_else(|| format!("store returned HTTP {}", status.as_u16()));
            return Err(UploadError::Storage(message));
        }

        parsed_url(parsed)
    }

    /// Best-effort DELETE of a stored blob. The caller only logs the result.
    pub async fn delete(&self, url: &str) -> Result<(), UploadError> {
        let resp = self
            .client
            .delete(&self.endpoint)
            .json(&serde_json::json!({ "url": url }))
            .send()
            .await
            .map_err(UploadError::Network)?;
        if !resp.status().is_success() {
            return Err(UploadError::Storage(format!(
                "delete returned HTTP {}",
                resp.status().as_u16()
            )));
        }
        Ok(())
    }
}

fn parsed_from(body: &str) -> Option<StoreResponse> {
    serde_json::from_str(body).ok()
}

fn parsed_url(parsed: Option<StoreResponse>) -> Result<String, UploadError> {
    parsed
        .and_then(|r| r.url)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| UploadError::Storage("store response missing url".to_string()))
}
