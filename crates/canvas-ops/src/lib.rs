//! canvas-ops: Pixel-level transforms for scanned item photographs
//!
//! This library holds the image math behind the batch pipeline: canvas
//! expansion, rotation with bounding-box growth, cropping, a fixed
//! enhancement profile, and grid-based blob detection for splitting a scan
//! that contains several items.
//!
//! All operations work on an owned RGBA8 [`RasterBuffer`] and return a new
//! buffer. Degenerate geometry is reported as a [`CanvasError`], never as a
//! panic.
//!
//! # Quick Start
//!
//! ```
//! use canvas_ops::{crop, enhance, expand, rotate, RasterBuffer, Rectangle, Rgba};
//!
//! let scan = RasterBuffer::filled(100, 80, Rgba::rgb(200, 180, 160)).unwrap();
//!
//! let expanded = expand(&scan, 10.0).unwrap();
//! assert_eq!((expanded.width(), expanded.height()), (110, 88));
//!
//! let rotated = rotate(&expanded, 90.0).unwrap();
//! assert_eq!((rotated.width(), rotated.height()), (88, 110));
//!
//! let cropped = crop(&rotated, Rectangle::new(4, 5, 80, 100)).unwrap();
//! let finished = enhance(&cropped);
//! assert_eq!((finished.width(), finished.height()), (80, 100));
//! ```
//!
//! # Blob Detection
//!
//! [`detect_blobs`] binarizes a sparse sample grid and flood-fills connected
//! cells. Each surviving region is returned as a padded [`Rectangle`]:
//!
//! ```
//! use canvas_ops::{detect_blobs, DetectOptions, RasterBuffer, Rectangle, Rgba};
//!
//! let mut scan = RasterBuffer::filled(200, 100, Rgba::WHITE).unwrap();
//! for y in 20..80 {
//!     for x in 20..80 {
//!         scan.set_pixel(x, y, Rgba::BLACK);
//!     }
//! }
//! let blobs = detect_blobs(&scan, &DetectOptions::default());
//! assert_eq!(blobs, vec![Rectangle::new(10, 10, 80, 80)]);
//! ```
//!
//! # Coordinate System
//!
//! Origin is the top-left pixel, x grows right and y grows down. Positive
//! rotation angles therefore turn the image clockwise on screen.

pub mod detect;
pub mod error;
pub mod raster;
pub mod transform;

#[cfg(test)]
mod domain_tests;

pub use detect::{detect_blobs, DetectOptions};
pub use error::CanvasError;
pub use raster::{RasterBuffer, Rectangle, Rgba, MAX_DIMENSION};
pub use transform::{
    crop, enhance, enhance_pixel, expand, expand_with_background, expanded_size, luminance,
    rotate, rotated_size, BRIGHTNESS, CONTRAST, SATURATION,
};
