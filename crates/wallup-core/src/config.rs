use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Thumbnail generation parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailConfig {
    /// Output width in pixels; height follows the source aspect ratio.
    pub target_width: u32,
    /// JPEG quality (1-100). Kept aggressive so previews land around 10-20 KB.
    pub quality: u8,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            target_width: 250,
            quality: 40,
        }
    }
}

/// Global configuration loaded from `~/.config/wallup/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Blob-store endpoint accepting multipart POST and JSON-body DELETE.
    pub blob_endpoint: String,
    /// Application persistence endpoint for wallpaper records.
    pub record_endpoint: String,
    /// Stable endpoint for the timed connectivity probe.
    pub probe_url: String,
    /// Whole-job deadline in seconds (Preparing through SavingRecord).
    pub job_timeout_secs: u64,
    /// Probe request timeout in seconds.
    pub probe_timeout_secs: u64,
    /// Round-trip above this is classified as a slow connection.
    pub slow_threshold_ms: u64,
    /// Interval between background probes in seconds.
    pub monitor_interval_secs: u64,
    /// Upload cache records older than this are treated as absent.
    pub cache_ttl_secs: u64,
    /// Largest accepted source file in bytes.
    pub max_file_bytes: u64,
    /// Optional thumbnail tuning; built-in defaults if missing.
    #[serde(default)]
    pub thumbnail: Option<ThumbnailConfig>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            blob_endpoint: "https://store.wallup.app/upload".to_string(),
            record_endpoint: "https://wallup.app/api/save-wallpaper".to_string(),
            probe_url: "https://wallup.app/favicon.ico".to_string(),
            job_timeout_secs: 120,
            probe_timeout_secs: 5,
            slow_threshold_ms: 2000,
            monitor_interval_secs: 30,
            cache_ttl_secs: 3600,
            max_file_bytes: 10 * 1024 * 1024,
            thumbnail: None,
        }
    }
}

impl UploadConfig {
    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn slow_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_threshold_ms)
    }

    pub fn monitor_interval(&self) -> Duration {
        Duration::from_secs(self.monitor_interval_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn thumbnail(&self) -> ThumbnailConfig {
        self.thumbnail.clone().unwrap_or_default()
    }

    /// Check that the configured endpoints parse as absolute URLs.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("blob_endpoint", &self.blob_endpoint),
            ("record_endpoint", &self.record_endpoint),
            ("probe_url", &self.probe_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| anyhow::anyhow!("invalid {}: {} ({})", name, value, e))?;
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("wallup")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<UploadConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = UploadConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: UploadConfig = toml::from_str(&data)?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = UploadConfig::default();
        assert_eq!(cfg.job_timeout_secs, 120);
        assert_eq!(cfg.probe_timeout_secs, 5);
        assert_eq!(cfg.slow_threshold_ms, 2000);
        assert_eq!(cfg.cache_ttl_secs, 3600);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = UploadConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: UploadConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.blob_endpoint, cfg.blob_endpoint);
        assert_eq!(parsed.record_endpoint, cfg.record_endpoint);
        assert_eq!(parsed.job_timeout_secs, cfg.job_timeout_secs);
        assert_eq!(parsed.max_file_bytes, cfg.max_file_bytes);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            blob_endpoint = "http://127.0.0.1:9000/blob"
            record_endpoint = "http://127.0.0.1:9000/save"
            probe_url = "http://127.0.0.1:9000/probe"
            job_timeout_secs = 5
            probe_timeout_secs = 1
            slow_threshold_ms = 100
            monitor_interval_secs = 10
            cache_ttl_secs = 60
            max_file_bytes = 1024
        "#;
        let cfg: UploadConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.job_timeout_secs, 5);
        assert_eq!(cfg.cache_ttl_secs, 60);
        assert!(cfg.thumbnail.is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn config_toml_thumbnail_section() {
        let toml = r#"
            blob_endpoint = "http://127.0.0.1:9000/blob"
            record_endpoint = "http://127.0.0.1:9000/save"
            probe_url = "http://127.0.0.1:9000/probe"
            job_timeout_secs = 120
            probe_timeout_secs = 5
            slow_threshold_ms = 2000
            monitor_interval_secs = 30
            cache_ttl_secs = 3600
            max_file_bytes = 10485760

            [thumbnail]
            target_width = 320
            quality = 60
        "#;
        let cfg: UploadConfig = toml::from_str(toml).unwrap();
        let thumb = cfg.thumbnail();
        assert_eq!(thumb.target_width, 320);
        assert_eq!(thumb.quality, 60);
    }

    #[test]
    fn invalid_endpoint_rejected() {
        let mut cfg = UploadConfig::default();
        cfg.blob_endpoint = "not a url".to_string();
        assert!(cfg.validate().is_err());
    }
}
