use crate::domain::errors::{VisionError, VisionResult};
use image::{DynamicImage, ImageFormat, codecs::jpeg::JpegEncoder};
use reqwest::Url;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

pub fn decode_file(path: &Path) -> VisionResult<DynamicImage> {
    image::open(path).map_err(|e| VisionError::source_error(path.display().to_string(), e))
}

pub fn decode_bytes(bytes: &[u8], origin: &str) -> VisionResult<DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| VisionError::source_error(origin, e))
}

/// Re-encode as baseline JPEG. Alpha is dropped since JPEG cannot carry it.
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> VisionResult<Vec<u8>> {
    let rgb = image.to_rgb8();
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .encode_image(&rgb)
        .map_err(|e| VisionError::Encoding(format!("JPEG encoding failed: {}", e)))?;
    debug!(
        "JPEG encoding complete ({}x{}, q{}), output size: {} bytes",
        rgb.width(),
        rgb.height(),
        quality,
        buffer.len()
    );
    Ok(buffer)
}

pub fn encode_png(image: &DynamicImage) -> VisionResult<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| VisionError::Encoding(format!("PNG encoding failed: {}", e)))?;
    Ok(buffer.into_inner())
}

pub fn basename(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Last non-empty path segment, falling back to the host for bare origins.
pub fn url_basename(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(str::to_string)
        .or_else(|| url.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}
