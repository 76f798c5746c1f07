//! Owned RGBA8 raster buffer.

use crate::error::CanvasError;

use super::Rectangle;

/// Largest accepted width or height, in pixels.
///
/// Buffers are allocated eagerly, so the limit turns what would be an
/// allocation abort into a [`CanvasError::TooLarge`].
pub const MAX_DIMENSION: u32 = 32_768;

/// A single pixel with 8-bit red, green, blue and alpha channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Opaque white, the default expansion background.
    pub const WHITE: Self = Self::new(255, 255, 255, 255);
    /// Opaque black.
    pub const BLACK: Self = Self::new(0, 0, 0, 255);
    /// Fully transparent black, the fill for uncovered rotation corners.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from RGB channels.
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    #[inline]
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Unweighted channel average, used for binarization.
    #[inline]
    pub fn average(self) -> u8 {
        ((self.r as u16 + self.g as u16 + self.b as u16) / 3) as u8
    }
}

impl From<[u8; 4]> for Rgba {
    fn from(p: [u8; 4]) -> Self {
        Self::new(p[0], p[1], p[2], p[3])
    }
}

/// An owned, row-major RGBA8 pixel grid.
///
/// Transforms never mutate their input; each returns a freshly allocated
/// buffer. The buffer always has a non-zero area and both sides are at most
/// [`MAX_DIMENSION`].
///
/// # Example
///
/// ```
/// use canvas_ops::{RasterBuffer, Rgba};
///
/// let mut buffer = RasterBuffer::filled(4, 3, Rgba::WHITE).unwrap();
/// buffer.set_pixel(1, 2, Rgba::BLACK);
///
/// assert_eq!(buffer.width(), 4);
/// assert_eq!(buffer.height(), 3);
/// assert_eq!(buffer.pixel(1, 2), Rgba::BLACK);
/// assert_eq!(buffer.as_bytes().len(), 4 * 3 * 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RasterBuffer {
    /// Allocate a transparent buffer.
    pub fn new(width: u32, height: u32) -> Result<Self, CanvasError> {
        Self::filled(width, height, Rgba::TRANSPARENT)
    }

    /// Allocate a buffer with every pixel set to `color`.
    pub fn filled(width: u32, height: u32, color: Rgba) -> Result<Self, CanvasError> {
        let len = checked_len(width as u64, height as u64)?;
        let data = if color == Rgba::TRANSPARENT {
            vec![0; len]
        } else {
            color.to_array().repeat(len / 4)
        };
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Wrap existing RGBA8 bytes (row-major, 4 bytes per pixel).
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, CanvasError> {
        let expected = checked_len(width as u64, height as u64)?;
        if data.len() != expected {
            return Err(CanvasError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The rectangle covering the whole buffer.
    #[inline]
    pub fn bounds(&self) -> Rectangle {
        Rectangle::new(0, 0, self.width, self.height)
    }

    /// Raw RGBA8 bytes, row-major.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the buffer and return its RGBA8 bytes.
    #[inline]
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        debug_assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}x{}",
            self.width,
            self.height
        );
        (y as usize * self.width as usize + x as usize) * 4
    }

    /// Read one pixel.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the buffer.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        let i = self.offset(x, y);
        Rgba::new(
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        )
    }

    /// Write one pixel.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the buffer.
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        let i = self.offset(x, y);
        self.data[i..i + 4].copy_from_slice(&color.to_array());
    }

    /// Bytes of row `y`.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        let start = self.offset(0, y);
        &self.data[start..start + self.width as usize * 4]
    }

    #[inline]
    pub(crate) fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = self.offset(0, y);
        let len = self.width as usize * 4;
        &mut self.data[start..start + len]
    }

    #[inline]
    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Copy all of `src` into this buffer with its top-left corner at
    /// `(dx, dy)`. `src` must fit entirely.
    pub(crate) fn blit(&mut self, src: &RasterBuffer, dx: u32, dy: u32) {
        debug_assert!(dx + src.width <= self.width && dy + src.height <= self.height);
        let row_len = src.width as usize * 4;
        let start_x = dx as usize * 4;
        for y in 0..src.height {
            let dst = self.row_mut(dy + y);
            dst[start_x..start_x + row_len].copy_from_slice(src.row(y));
        }
    }
}

/// Byte length for a `width x height` RGBA8 buffer, validating dimensions.
pub(crate) fn checked_len(width: u64, height: u64) -> Result<usize, CanvasError> {
    if width == 0 || height == 0 {
        return Err(CanvasError::ZeroArea {
            width: width.min(u32::MAX as u64) as u32,
            height: height.min(u32::MAX as u64) as u32,
        });
    }
    if width > MAX_DIMENSION as u64 || height > MAX_DIMENSION as u64 {
        return Err(CanvasError::TooLarge { width, height });
    }
    Ok(width as usize * height as usize * 4)
}
