//! Client for the application's own persistence endpoint.
//!
//! `POST /api/save-wallpaper` with the job metadata; the endpoint replies
//! `{success, data?: {id, ...}, error?}`.

use serde::{Deserialize, Serialize};

use crate::error::UploadError;

#[derive(Debug, Serialize)]
struct SaveWallpaperBody<'a> {
    user_id: &'a str,
    title: &'a str,
    description: &'a str,
    image_url: &'a str,
    thumbnail_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct SaveResponse {
    success: bool,
    #[serde(default)]
    data: Option<SavedRecord>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SavedRecord {
    id: String,
}

pub struct WallpaperApi {
    client: reqwest::Client,
    endpoint: String,
}

impl WallpaperApi {
    pub fn new(client: reqwest::Client, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
        }
    }

    /// Persist the wallpaper record. Returns the new record id when the
    /// endpoint reports one.
    pub async fn save(
        &self,
        user_id: &str,
        title: &str,
        description: &str,
        image_url: &str,
        thumbnail_url: &str,
    ) -> Result<Option<String>, UploadError> {
        let body = SaveWallpaperBody {
            user_id,
            title,
            description,
            image_url,
            thumbnail_url,
        };
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(UploadError::Network)?;

        let status = resp.status();
        let text = resp.text().await.map_err(UploadError::Network)?;
        let parsed: Option<SaveResponse> = serde_json::from_str(&text).ok();

        if !status.is_success() || !parsed.as_ref().map(|r| r.success).unwrap_or(false) {
            let message = parsed
                .and_then(|r| r.error)
                .unwrap_or_else(|| format!("save returned HTTP {}", status.as_u16()));
            return Err(UploadError::Persistence(message));
        }

        Ok(parsed.and_then(|r| r.data).map(|d| d.id))
    }
}
