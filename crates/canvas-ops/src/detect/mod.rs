//! Blob detection for splitting a multi-item scan into individual crops.
//!
//! The detector assumes dark-ish objects on a light, mostly uniform
//! background (a flatbed scan of stamps, coins or cards):
//!
//! 1. **Binarize** - sample pixels on a coarse grid; a sample is foreground
//!    when its channel average is below [`DetectOptions::threshold`]
//! 2. **Flood fill** - 4-connected fill over grid cells, tracking extents
//! 3. **Filter** - drop blobs smaller than [`DetectOptions::min_size`]
//! 4. **Pad** - grow each box by [`DetectOptions::padding`], clamped
//!
//! The result is grid-quantized, not pixel exact. It seeds crop regions that
//! a person confirms or adjusts.
//!
//! # Example
//!
//! ```
//! use canvas_ops::{detect_blobs, DetectOptions, RasterBuffer, Rectangle, Rgba};
//!
//! let mut scan = RasterBuffer::filled(100, 100, Rgba::WHITE).unwrap();
//! for y in 40..60 {
//!     for x in 40..60 {
//!         scan.set_pixel(x, y, Rgba::BLACK);
//!     }
//! }
//!
//! let blobs = detect_blobs(&scan, &DetectOptions::default());
//! assert_eq!(blobs, vec![Rectangle::new(30, 30, 40, 40)]);
//! ```

mod blobs;
mod options;

pub use blobs::detect_blobs;
pub use options::DetectOptions;
