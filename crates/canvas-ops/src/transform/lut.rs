//! Brightness/contrast lookup table access.
//!
//! The table is generated at compile time by build.rs.

#![allow(clippy::excessive_precision)]

include!(concat!(env!("OUT_DIR"), "/tone_lut.rs"));

/// Brightness scale then contrast remap for an 8-bit channel, unclamped.
#[inline]
pub fn tone(v: u8) -> f32 {
    TONE_LUT[v as usize]
}
