//! Axis-aligned rectangle in buffer pixel coordinates.

/// A region `{x, y, width, height}` in buffer pixel coordinates.
///
/// Coordinates are unsigned, so a rectangle can never start left of or above
/// the origin. Whether it fits inside a particular buffer is checked with
/// [`fits_within`](Self::fits_within); callers holding signed editor
/// coordinates convert with [`clamp_to`](Self::clamp_to).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rectangle {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rectangle {
    #[inline]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    #[inline]
    pub fn right(&self) -> u64 {
        self.x as u64 + self.width as u64
    }

    /// Exclusive bottom edge.
    #[inline]
    pub fn bottom(&self) -> u64 {
        self.y as u64 + self.height as u64
    }

    #[inline]
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True if `x + width <= width_bound` and `y + height <= height_bound`.
    #[inline]
    pub fn fits_within(&self, width_bound: u32, height_bound: u32) -> bool {
        self.right() <= width_bound as u64 && self.bottom() <= height_bound as u64
    }

    /// Intersect a signed rectangle with `[0, width_bound) x [0, height_bound)`.
    ///
    /// Returns `None` when nothing of the rectangle remains inside the bounds.
    ///
    /// ```
    /// use canvas_ops::Rectangle;
    ///
    /// let r = Rectangle::clamp_to(-5, 10, 20, 200, 100, 100).unwrap();
    /// assert_eq!(r, Rectangle::new(0, 10, 15, 90));
    /// assert!(Rectangle::clamp_to(150, 0, 10, 10, 100, 100).is_none());
    /// ```
    pub fn clamp_to(
        x: i64,
        y: i64,
        width: i64,
        height: i64,
        width_bound: u32,
        height_bound: u32,
    ) -> Option<Self> {
        let x0 = x.clamp(0, width_bound as i64);
        let y0 = y.clamp(0, height_bound as i64);
        let x1 = x.saturating_add(width).clamp(0, width_bound as i64);
        let y1 = y.saturating_add(height).clamp(0, height_bound as i64);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Self::new(
            x0 as u32,
            y0 as u32,
            (x1 - x0) as u32,
            (y1 - y0) as u32,
        ))
    }

    /// Grow by `margin` on every side, clamped to the bounds.
    pub fn padded(&self, margin: u32, width_bound: u32, height_bound: u32) -> Self {
        let m = margin as i64;
        Self::clamp_to(
            self.x as i64 - m,
            self.y as i64 - m,
            self.width as i64 + 2 * m,
            self.height as i64 + 2 * m,
            width_bound,
            height_bound,
        )
        .unwrap_or(*self)
    }
}
