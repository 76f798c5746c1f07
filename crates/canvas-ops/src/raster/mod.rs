//! Raster types shared by every transform.
//!
//! - [`RasterBuffer`]: owned RGBA8 pixel grid with explicit dimensions
//! - [`Rectangle`]: axis-aligned region in buffer pixel coordinates
//! - [`Rgba`]: a single 8-bit RGBA pixel

mod buffer;
mod rect;

pub use buffer::{RasterBuffer, Rgba, MAX_DIMENSION};
pub use rect::Rectangle;

pub(crate) use buffer::checked_len;
