//! Rectangular crop.

use crate::error::CanvasError;
use crate::raster::{RasterBuffer, Rectangle};

/// Copy the region `rect` into a new `rect.width x rect.height` buffer.
///
/// The rectangle must lie entirely inside the buffer; this function never
/// clamps. Use [`Rectangle::clamp_to`] upstream to turn free-form editor
/// coordinates into a valid region.
///
/// # Errors
///
/// - [`CanvasError::ZeroArea`] if `rect` has zero width or height
/// - [`CanvasError::OutOfBounds`] if `rect` extends past the buffer
pub fn crop(buffer: &RasterBuffer, rect: Rectangle) -> Result<RasterBuffer, CanvasError> {
    if rect.is_empty() {
        return Err(CanvasError::ZeroArea {
            width: rect.width,
            height: rect.height,
        });
    }
    if !rect.fits_within(buffer.width(), buffer.height()) {
        return Err(CanvasError::OutOfBounds {
            rect,
            width: buffer.width(),
            height: buffer.height(),
        });
    }
    if rect == buffer.bounds() {
        return Ok(buffer.clone());
    }

    let mut out = RasterBuffer::new(rect.width, rect.height)?;
    let start = rect.x as usize * 4;
    let len = rect.width as usize * 4;
    for y in 0..rect.height {
        let src = &buffer.row(rect.y + y)[start..start + len];
        out.row_mut(y).copy_from_slice(src);
    }
    Ok(out)
}
