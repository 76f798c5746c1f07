//! Fixed brightness/contrast/saturation enhancement.
//!
//! The profile is not configurable: identical input always yields identical
//! output, which the batch pipeline relies on for reproducible exports.
//!
//! Per pixel, in a single pass:
//!
//! ```text
//! v'  = (v * BRIGHTNESS - 128) * CONTRAST + 128      (lookup table)
//! L   = 0.2989 R' + 0.5870 G' + 0.1140 B'
//! v'' = L + (v' - L) * SATURATION                    (clamped to 0..=255)
//! ```

use crate::raster::{RasterBuffer, Rgba};

use super::lut::tone;

/// Brightness multiplier. build.rs bakes this into the tone table.
pub const BRIGHTNESS: f32 = 1.1;
/// Contrast multiplier around the 128 midpoint. Baked into the tone table.
pub const CONTRAST: f32 = 1.15;
/// Saturation multiplier applied away from perceptual luminance.
pub const SATURATION: f32 = 1.2;

/// Perceptual luminance of (possibly out-of-range) channel values.
#[inline]
pub fn luminance(r: f32, g: f32, b: f32) -> f32 {
    0.2989 * r + 0.5870 * g + 0.1140 * b
}

#[inline]
fn to_channel(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Enhance a single pixel. Alpha passes through unchanged.
///
/// ```
/// use canvas_ops::{enhance_pixel, Rgba};
///
/// assert_eq!(enhance_pixel(Rgba::BLACK), Rgba::BLACK);
/// assert_eq!(enhance_pixel(Rgba::WHITE), Rgba::WHITE);
/// ```
#[inline]
pub fn enhance_pixel(p: Rgba) -> Rgba {
    let r = tone(p.r);
    let g = tone(p.g);
    let b = tone(p.b);
    let l = luminance(r, g, b);
    Rgba::new(
        to_channel(l + (r - l) * SATURATION),
        to_channel(l + (g - l) * SATURATION),
        to_channel(l + (b - l) * SATURATION),
        p.a,
    )
}

/// Apply the enhancement profile to every pixel.
pub fn enhance(buffer: &RasterBuffer) -> RasterBuffer {
    let mut out = buffer.clone();
    for px in out.data_mut().chunks_exact_mut(4) {
        let e = enhance_pixel(Rgba::new(px[0], px[1], px[2], px[3]));
        px.copy_from_slice(&e.to_array());
    }
    out
}
