//! Decode uploads into rasters and encode rasters as PNG.
//!
//! The async entry points move the work onto the blocking pool so large
//! images never stall the runtime.

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use canvas_ops::RasterBuffer;
use image::ImageFormat;

use crate::error::PipelineError;

pub const PNG_MIME: &str = "image/png";

/// Decode image bytes to RGBA8.
///
/// The format comes from `mime_type` when it names a supported format and is
/// sniffed from the bytes otherwise.
pub fn decode_blocking(bytes: &[u8], mime_type: &str) -> Result<RasterBuffer, PipelineError> {
    let format = match ImageFormat::from_mime_type(mime_type) {
        Some(format) => format,
        None => image::guess_format(bytes)
            .map_err(|e| PipelineError::Decode(format!("unrecognised image data: {e}")))?,
    };

    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| PipelineError::Decode(e.to_string()))?;
    let rgba = img.into_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(RasterBuffer::from_rgba(width, height, rgba.into_raw())?)
}

pub async fn decode(bytes: Arc<[u8]>, mime_type: &str) -> Result<RasterBuffer, PipelineError> {
    let mime_type = mime_type.to_string();
    tokio::task::spawn_blocking(move || decode_blocking(&bytes, &mime_type)).await?
}

/// Encode as an 8-bit RGBA PNG.
pub fn encode_png(buffer: &RasterBuffer) -> Result<Vec<u8>, PipelineError> {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut encoder = png::Encoder::new(&mut buf, buffer.width(), buffer.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(png::Compression::Fast);
        let mut writer = encoder
            .write_header()
            .map_err(|e| PipelineError::Encode(e.to_string()))?;
        writer
            .write_image_data(buffer.as_bytes())
            .map_err(|e| PipelineError::Encode(e.to_string()))?;
    }
    Ok(buf.into_inner())
}

pub async fn encode(buffer: RasterBuffer) -> Result<Vec<u8>, PipelineError> {
    tokio::task::spawn_blocking(move || encode_png(&buffer)).await?
}

/// Mime type for a file path, from its extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    ImageFormat::from_path(path)
        .map(|f| f.to_mime_type())
        .unwrap_or("application/octet-stream")
}
