//! Canvas transforms.
//!
//! Each function borrows its input and returns a new [`RasterBuffer`]. The
//! pipeline applies them in a fixed order:
//!
//! 1. [`expand`] - pad with a background color
//! 2. [`rotate`] - arbitrary angle, bounding box grows to fit the corners
//! 3. [`crop`] - rectangular sub-region
//! 4. [`enhance`] - fixed brightness/contrast/saturation profile
//!
//! [`RasterBuffer`]: crate::RasterBuffer

mod crop;
mod enhance;
mod expand;
mod lut;
mod rotate;

pub use crop::crop;
pub use enhance::{enhance, enhance_pixel, luminance, BRIGHTNESS, CONTRAST, SATURATION};
pub use expand::{expand, expand_with_background, expanded_size};
pub use rotate::{rotate, rotated_size};
