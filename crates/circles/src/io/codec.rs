//! Image decode/encode helpers shared by the HTTP handlers and the CLI.

use std::io::Cursor;
use std::path::Path;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{DynamicImage, ImageFormat};

use crate::error::{CircleError, Result};

/// File extensions accepted for uploads
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp"];

const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Check whether a filename carries one of [`ALLOWED_EXTENSIONS`]
pub fn allowed_file(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Decode encoded image bytes (PNG, JPEG, GIF, BMP, ...)
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    if bytes.is_empty() {
        return Err(CircleError::InvalidImage("image data is empty".to_string()));
    }
    let image = image::load_from_memory(bytes)
        .map_err(|e| CircleError::InvalidImage(format!("cannot decode image: {e}")))?;
    if image.width() == 0 || image.height() == 0 {
        return Err(CircleError::InvalidImage("image has zero size".to_string()));
    }
    Ok(image)
}

/// Read and decode an image file
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .map_err(|e| CircleError::InvalidImage(format!("cannot read image from {}: {e}", path.display())))?;
    decode_image(&bytes)
}

/// Decode a base64 payload, with or without a `data:<mime>;base64,` prefix
pub fn decode_base64_image(data: &str) -> Result<DynamicImage> {
    let payload = match data.split_once(',') {
        Some((_, rest)) => rest,
        None => data,
    };
    let payload: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    let bytes = STANDARD
        .decode(payload.as_bytes())
        .map_err(|e| CircleError::InvalidImage(format!("invalid base64 image data: {e}")))?;
    decode_image(&bytes)
}

/// Encode an image as PNG bytes
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| CircleError::Internal(format!("PNG encoding failed: {e}")))?;
    Ok(buffer.into_inner())
}

/// Encode an image as a `data:image/png;base64,` URI
pub fn encode_png_data_uri(image: &DynamicImage) -> Result<String> {
    let png = encode_png(image)?;
    Ok(format!("{PNG_DATA_URI_PREFIX}{}", STANDARD.encode(png)))
}
