//! Canvas expansion: pad an image with a solid background.

use crate::error::CanvasError;
use crate::raster::{RasterBuffer, Rgba};

/// Output dimensions for expanding `width x height` by `percentage`.
///
/// Each side becomes `round(side * (1 + percentage / 100))`.
pub fn expanded_size(
    width: u32,
    height: u32,
    percentage: f64,
) -> Result<(u64, u64), CanvasError> {
    if !percentage.is_finite() || percentage < 0.0 {
        return Err(CanvasError::InvalidPercentage(percentage));
    }
    let scale = 1.0 + percentage / 100.0;
    let w = (width as f64 * scale).round();
    let h = (height as f64 * scale).round();
    // Saturating float-to-int casts keep absurd percentages in TooLarge territory
    Ok((w as u64, h as u64))
}

/// Expand onto a white background. See [`expand_with_background`].
///
/// ```
/// use canvas_ops::{expand, RasterBuffer, Rgba};
///
/// let src = RasterBuffer::filled(100, 50, Rgba::BLACK).unwrap();
/// let out = expand(&src, 20.0).unwrap();
/// assert_eq!((out.width(), out.height()), (120, 60));
/// assert_eq!(out.pixel(0, 0), Rgba::WHITE);
/// assert_eq!(out.pixel(10, 5), Rgba::BLACK);
/// ```
pub fn expand(buffer: &RasterBuffer, percentage: f64) -> Result<RasterBuffer, CanvasError> {
    expand_with_background(buffer, percentage, Rgba::WHITE)
}

/// Allocate a larger canvas filled with `background` and draw `buffer`
/// centred on it.
///
/// The source lands at `((new_w - w) / 2, (new_h - h) / 2)` using integer
/// division. A percentage of zero returns a copy of the input.
pub fn expand_with_background(
    buffer: &RasterBuffer,
    percentage: f64,
    background: Rgba,
) -> Result<RasterBuffer, CanvasError> {
    let (new_w, new_h) = expanded_size(buffer.width(), buffer.height(), percentage)?;
    if new_w == buffer.width() as u64 && new_h == buffer.height() as u64 {
        return Ok(buffer.clone());
    }
    crate::raster::checked_len(new_w, new_h)?;

    let new_w = new_w as u32;
    let new_h = new_h as u32;
    let mut out = RasterBuffer::filled(new_w, new_h, background)?;
    let dx = (new_w - buffer.width()) / 2;
    let dy = (new_h - buffer.height()) / 2;
    out.blit(buffer, dx, dy);
    Ok(out)
}
