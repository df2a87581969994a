pub mod config;
pub mod logging;

// Core modules
pub mod blob_store;
pub mod cache;
pub mod control;
pub mod error;
pub mod job;
pub mod net_monitor;
pub mod orchestrator;
pub mod progress;
pub mod reporter;
pub mod thumbnail;
pub mod wallpaper_api;

pub use error::UploadError;
pub use job::{UploadOutcome, UploadRequest};
pub use orchestrator::UploadOrchestrator;
