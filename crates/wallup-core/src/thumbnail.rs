//! Thumbnail generation: downsample an in-memory image to a small JPEG.
//!
//! Output width is fixed (config, default 250 px) with the aspect ratio
//! preserved; quality is kept aggressive so previews land around 10-20 KB.
//! Pure and idempotent; no network, no temporary files.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

/// Thumbnail decode/encode failure. Fatal to the owning upload job.
#[derive(Debug, thiserror::Error)]
pub enum ThumbnailError {
    #[error("decode failed: {0}")]
    Decode(#[from] image::ImageError),
    #[error("encode produced no output")]
    EmptyOutput,
    /// The blocking generation task was aborted or panicked.
    #[error("generation task failed: {0}")]
    Task(String),
}

/// Downsample `bytes` to a JPEG of `target_width` pixels at `quality`.
pub fn generate_thumbnail(
    bytes: &[u8],
    target_width: u32,
    quality: u8,
) -> Result<Vec<u8>, ThumbnailError> {
    let img = image::load_from_memory(bytes)?;

    let scale = target_width as f32 / img.width().max(1) as f32;
    let target_height = ((img.height() as f32 * scale).round() as u32).max(1);
    // resize_exact: the output width must equal the target even for sources
    // narrower than it, so previews are uniform in the grid.
    let resized = img
        .resize_exact(target_width, target_height, FilterType::Triangle)
        .to_rgb8();

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality).encode_image(&resized)?;
    if out.is_empty() {
        return Err(ThumbnailError::EmptyOutput);
    }
    Ok(out)
}
