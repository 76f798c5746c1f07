//! Find separate objects on a scan and cut them into new uploads.

use std::sync::Arc;

use canvas_ops::{self as ops, DetectOptions, Rectangle};

use crate::error::PipelineError;
use crate::models::{BatchItem, Upload};
use crate::services::codec::{self, PNG_MIME};

/// Image the detector looks at. Always the original upload, so parts never
/// carry transforms their fresh operation log does not record.
pub fn detection_input(item: &BatchItem) -> (Arc<[u8]>, String) {
    (item.source.bytes.clone(), item.source.mime_type.clone())
}

/// Decode and detect blobs, returning boxes in scan order.
pub fn detect_regions_blocking(
    bytes: &[u8],
    mime_type: &str,
    options: &DetectOptions,
) -> Result<Vec<Rectangle>, PipelineError> {
    let raster = codec::decode_blocking(bytes, mime_type)?;
    Ok(ops::detect_blobs(&raster, options))
}

/// Decode, detect, crop each blob and encode it as a PNG upload named
/// `<stem>_item<N>.png`.
pub fn split_blocking(
    bytes: &[u8],
    mime_type: &str,
    stem: &str,
    options: &DetectOptions,
) -> Result<Vec<Upload>, PipelineError> {
    let raster = codec::decode_blocking(bytes, mime_type)?;
    let regions = ops::detect_blobs(&raster, options);

    let mut uploads = Vec::with_capacity(regions.len());
    for (n, rect) in regions.iter().enumerate() {
        let part = ops::crop(&raster, *rect)?;
        let png = codec::encode_png(&part)?;
        uploads.push(Upload::new(
            format!("{stem}_item{}.png", n + 1),
            PNG_MIME,
            png,
        ));
    }
    tracing::debug!(stem, parts = uploads.len(), "Scan split");
    Ok(uploads)
}

pub async fn detect_regions(
    image: Arc<[u8]>,
    mime_type: String,
    options: DetectOptions,
) -> Result<Vec<Rectangle>, PipelineError> {
    tokio::task::spawn_blocking(move || detect_regions_blocking(&image, &mime_type, &options))
        .await?
}

/// Split the image of `item` into one upload per detected object.
pub async fn split_item(
    item: &BatchItem,
    options: DetectOptions,
) -> Result<Vec<Upload>, PipelineError> {
    let (image, mime_type) = detection_input(item);
    let stem = item.source.stem().to_string();
    tokio::task::spawn_blocking(move || split_blocking(&image, &mime_type, &stem, &options))
        .await?
}
