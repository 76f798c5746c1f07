//! Error type for canvas operations.
//!
//! Every transform returns [`CanvasError`] for degenerate geometry instead of
//! panicking, so a caller processing many images can fail a single image
//! without stopping the rest.

use std::fmt;

use crate::raster::Rectangle;

/// Error returned by raster construction and the transform functions.
///
/// # Example
///
/// ```
/// use canvas_ops::{crop, CanvasError, RasterBuffer, Rectangle};
///
/// let buffer = RasterBuffer::new(10, 10).unwrap();
/// let err = crop(&buffer, Rectangle::new(5, 5, 10, 10)).unwrap_err();
/// assert!(matches!(err, CanvasError::OutOfBounds { .. }));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasError {
    /// Width or height is zero
    ZeroArea {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },
    /// Dimensions exceed [`MAX_DIMENSION`](crate::MAX_DIMENSION) on some axis
    TooLarge {
        /// Requested width
        width: u64,
        /// Requested height
        height: u64,
    },
    /// Rectangle is not fully contained in the buffer
    OutOfBounds {
        /// The offending rectangle
        rect: Rectangle,
        /// Buffer width
        width: u32,
        /// Buffer height
        height: u32,
    },
    /// Expansion percentage is negative or not finite
    InvalidPercentage(f64),
    /// Rotation angle is NaN or infinite
    NonFiniteAngle(f64),
    /// Pixel data length does not equal `width * height * 4`
    BufferSizeMismatch {
        /// Expected byte length
        expected: usize,
        /// Actual byte length
        actual: usize,
    },
}

impl fmt::Display for CanvasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanvasError::ZeroArea { width, height } => {
                write!(f, "zero-area raster: {}x{}", width, height)
            }
            CanvasError::TooLarge { width, height } => {
                write!(
                    f,
                    "raster too large: {}x{} (max {} per side)",
                    width,
                    height,
                    crate::MAX_DIMENSION
                )
            }
            CanvasError::OutOfBounds {
                rect,
                width,
                height,
            } => write!(
                f,
                "rectangle {}x{}+{}+{} out of bounds for {}x{} raster",
                rect.width, rect.height, rect.x, rect.y, width, height
            ),
            CanvasError::InvalidPercentage(p) => {
                write!(f, "invalid expansion percentage: {}", p)
            }
            CanvasError::NonFiniteAngle(a) => write!(f, "non-finite rotation angle: {}", a),
            CanvasError::BufferSizeMismatch { expected, actual } => write!(
                f,
                "pixel data length mismatch: expected {} bytes, got {}",
                expected, actual
            ),
        }
    }
}

impl std::error::Error for CanvasError {}
