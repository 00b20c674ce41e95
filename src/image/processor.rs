use crate::{Error, Result};
use base64::Engine as _;
use image::imageops::FilterType;
use image::ImageFormat;
use std::io::Cursor;

pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    Ok(base64::engine::general_purpose::STANDARD.decode(data.trim())?)
}

pub fn encode_base64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Shrink an encoded image to exactly `width`x`height` with nearest-neighbour
/// sampling and re-encode it as PNG. Images smaller than the target in either
/// direction are returned at their own size.
pub fn downscale_png(image_data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let img = image::load_from_memory(image_data)?;

    let shrinks = width <= img.width() && height <= img.height();
    let resized = if shrinks && (width, height) != (img.width(), img.height()) {
        img.resize_exact(width, height, FilterType::Nearest)
    } else {
        img
    };

    let mut out = Cursor::new(Vec::new());
    resized.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

/// Base64-in, base64-out wrapper around [`downscale_png`], run on the blocking pool.
pub async fn downscale_base64_png(data: String, width: u32, height: u32) -> Result<String> {
    tokio::task::spawn_blocking(move || {
        let bytes = decode_base64(&data)?;
        let png = downscale_png(&bytes, width, height)?;
        Ok(encode_base64(&png))
    })
    .await
    .map_err(|e| Error::Generic(format!("Image processing task join error: {}", e)))?
}
