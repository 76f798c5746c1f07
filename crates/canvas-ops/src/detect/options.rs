//! Blob detection tuning.

/// Thresholds for [`detect_blobs`](super::detect_blobs).
///
/// The defaults suit 8-bit scans at typical flatbed resolutions. None of the
/// values is derived from first principles; adjust them per scanner.
///
/// ```
/// use canvas_ops::DetectOptions;
///
/// let options = DetectOptions::new().threshold(180).grid_step(5);
/// assert_eq!(options.threshold, 180);
/// assert_eq!(options.grid_step, 5);
/// assert_eq!(options.padding, 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectOptions {
    /// Channel average below which a sample counts as foreground.
    pub threshold: u8,
    /// Distance between samples in pixels (0 is treated as 1).
    pub grid_step: u32,
    /// Margin added around each detected box.
    pub padding: u32,
    /// Minimum width and height of a blob before padding.
    pub min_size: u32,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            threshold: 200,
            grid_step: 10,
            padding: 10,
            min_size: 20,
        }
    }
}

impl DetectOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    #[inline]
    pub fn grid_step(mut self, step: u32) -> Self {
        self.grid_step = step;
        self
    }

    #[inline]
    pub fn padding(mut self, padding: u32) -> Self {
        self.padding = padding;
        self
    }

    #[inline]
    pub fn min_size(mut self, min_size: u32) -> Self {
        self.min_size = min_size;
        self
    }

    #[inline]
    pub(crate) fn effective_step(&self) -> u32 {
        self.grid_step.max(1)
    }
}
