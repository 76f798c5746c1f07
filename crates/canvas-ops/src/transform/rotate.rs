//! Arbitrary-angle rotation with bounding-box growth.
//!
//! Rotation follows the 2-D canvas convention: positive angles turn clockwise
//! on screen (y axis pointing down). The output is sized so that no corner of
//! the source is cut off; uncovered area is transparent.

use crate::error::CanvasError;
use crate::raster::{RasterBuffer, Rgba};

/// Slack for floating point noise when taking the ceiling of the bounding
/// box, so an exact 90 degree turn of a 100x50 image stays 50x100.
const SIZE_EPSILON: f64 = 1e-6;

/// Bounding box of a `width x height` image rotated by `degrees`.
///
/// `new_w = ceil(w*|cos θ| + h*|sin θ|)`, `new_h = ceil(w*|sin θ| + h*|cos θ|)`.
pub fn rotated_size(width: u32, height: u32, degrees: f64) -> Result<(u64, u64), CanvasError> {
    if !degrees.is_finite() {
        return Err(CanvasError::NonFiniteAngle(degrees));
    }
    let (sin, cos) = degrees.to_radians().sin_cos();
    let (sin, cos) = (sin.abs(), cos.abs());
    let w = width as f64;
    let h = height as f64;
    let new_w = (w * cos + h * sin - SIZE_EPSILON).ceil().max(1.0);
    let new_h = (w * sin + h * cos - SIZE_EPSILON).ceil().max(1.0);
    Ok((new_w as u64, new_h as u64))
}

/// Rotate `buffer` clockwise by `degrees` around its centre.
///
/// - Multiples of 360 return an exact copy.
/// - Multiples of 90 are lossless pixel permutations.
/// - Other angles resample with bilinear interpolation.
///
/// ```
/// use canvas_ops::{rotate, RasterBuffer, Rgba};
///
/// let src = RasterBuffer::filled(100, 50, Rgba::BLACK).unwrap();
/// let out = rotate(&src, 90.0).unwrap();
/// assert_eq!((out.width(), out.height()), (50, 100));
///
/// let same = rotate(&src, 0.0).unwrap();
/// assert_eq!(same, src);
/// ```
pub fn rotate(buffer: &RasterBuffer, degrees: f64) -> Result<RasterBuffer, CanvasError> {
    if !degrees.is_finite() {
        return Err(CanvasError::NonFiniteAngle(degrees));
    }

    let turn = degrees.rem_euclid(360.0);
    if turn == 0.0 {
        return Ok(buffer.clone());
    }
    if turn == 90.0 {
        return quarter_turns(buffer, 1);
    }
    if turn == 180.0 {
        return quarter_turns(buffer, 2);
    }
    if turn == 270.0 {
        return quarter_turns(buffer, 3);
    }

    let (new_w, new_h) = rotated_size(buffer.width(), buffer.height(), degrees)?;
    crate::raster::checked_len(new_w, new_h)?;
    let mut out = RasterBuffer::new(new_w as u32, new_h as u32)?;

    let (sin, cos) = degrees.to_radians().sin_cos();
    let src_w = buffer.width() as f64;
    let src_h = buffer.height() as f64;
    let src_cx = src_w / 2.0;
    let src_cy = src_h / 2.0;
    let dst_cx = new_w as f64 / 2.0;
    let dst_cy = new_h as f64 / 2.0;

    for dy in 0..out.height() {
        let py = dy as f64 + 0.5 - dst_cy;
        for dx in 0..out.width() {
            let px = dx as f64 + 0.5 - dst_cx;
            // Inverse rotation back into source space
            let sx = px * cos + py * sin + src_cx;
            let sy = -px * sin + py * cos + src_cy;
            if sx < 0.0 || sy < 0.0 || sx >= src_w || sy >= src_h {
                continue;
            }
            out.set_pixel(dx, dy, sample_bilinear(buffer, sx - 0.5, sy - 0.5));
        }
    }

    Ok(out)
}

/// Bilinear sample at continuous pixel-centre coordinates, clamping
/// neighbours to the buffer edge.
fn sample_bilinear(buffer: &RasterBuffer, u: f64, v: f64) -> Rgba {
    let max_x = buffer.width() as i64 - 1;
    let max_y = buffer.height() as i64 - 1;

    let x0f = u.floor();
    let y0f = v.floor();
    let fx = u - x0f;
    let fy = v - y0f;

    let x0 = (x0f as i64).clamp(0, max_x) as u32;
    let x1 = (x0f as i64 + 1).clamp(0, max_x) as u32;
    let y0 = (y0f as i64).clamp(0, max_y) as u32;
    let y1 = (y0f as i64 + 1).clamp(0, max_y) as u32;

    let p00 = buffer.pixel(x0, y0).to_array();
    let p10 = buffer.pixel(x1, y0).to_array();
    let p01 = buffer.pixel(x0, y1).to_array();
    let p11 = buffer.pixel(x1, y1).to_array();

    let mut out = [0u8; 4];
    for c in 0..4 {
        let top = p00[c] as f64 * (1.0 - fx) + p10[c] as f64 * fx;
        let bottom = p01[c] as f64 * (1.0 - fx) + p11[c] as f64 * fx;
        let value = top * (1.0 - fy) + bottom * fy;
        out[c] = value.round().clamp(0.0, 255.0) as u8;
    }
    Rgba::from(out)
}

/// Lossless clockwise rotation by `turns * 90` degrees.
fn quarter_turns(buffer: &RasterBuffer, turns: u8) -> Result<RasterBuffer, CanvasError> {
    let w = buffer.width();
    let h = buffer.height();
    let (out_w, out_h) = if turns % 2 == 1 { (h, w) } else { (w, h) };
    let mut out = RasterBuffer::new(out_w, out_h)?;

    for y in 0..h {
        for x in 0..w {
            let (nx, ny) = match turns {
                1 => (h - 1 - y, x),
                2 => (w - 1 - x, h - 1 - y),
                _ => (y, w - 1 - x),
            };
            out.set_pixel(nx, ny, buffer.pixel(x, y));
        }
    }
    Ok(out)
}
