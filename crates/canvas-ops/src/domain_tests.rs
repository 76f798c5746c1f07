//! Domain-critical regression tests for canvas-ops.
//!
//! Each test pins a property the batch pipeline relies on. The comment above
//! each test names what has gone wrong if it fails.

#[cfg(test)]
mod domain_tests {
    use crate::detect::{detect_blobs, DetectOptions};
    use crate::error::CanvasError;
    use crate::raster::{RasterBuffer, Rectangle, Rgba};
    use crate::transform::{
        crop, enhance, enhance_pixel, expand, expand_with_background, expanded_size, rotate,
        rotated_size,
    };

    /// Deterministic non-uniform test image.
    fn noisy(width: u32, height: u32) -> RasterBuffer {
        let mut buffer = RasterBuffer::new(width, height).unwrap();
        let mut state = 0x2545_f491u32;
        for y in 0..height {
            for x in 0..width {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                let [r, g, b, a] = state.to_le_bytes();
                buffer.set_pixel(x, y, Rgba::new(r, g, b, a | 0x80));
            }
        }
        buffer
    }

    fn scan_with_square(size: u32, square: Rectangle) -> RasterBuffer {
        let mut scan = RasterBuffer::filled(size, size, Rgba::WHITE).unwrap();
        for y in square.y..square.y + square.height {
            for x in square.x..square.x + square.width {
                scan.set_pixel(x, y, Rgba::BLACK);
            }
        }
        scan
    }

    // ========================================================================
    // Zero-parameter transforms are identities
    // ========================================================================

    /// If this breaks, items with expansion at 0% or no rotation get resampled
    /// or shifted, and untouched items no longer export byte-identical pixels.
    #[test]
    fn test_zero_parameter_transforms_are_identity() {
        let src = noisy(37, 23);
        assert_eq!(expand(&src, 0.0).unwrap(), src);
        assert_eq!(rotate(&src, 0.0).unwrap(), src);
        assert_eq!(rotate(&src, 360.0).unwrap(), src);
        assert_eq!(crop(&src, src.bounds()).unwrap(), src);
    }

    // ========================================================================
    // Dimension laws
    // ========================================================================

    /// If this breaks, expansion sizes drift from `round(side * (1 + p/100))`
    /// and editor crop rectangles computed against the expected size no
    /// longer line up with the buffer.
    #[test]
    fn test_expand_dimension_law() {
        for (w, h) in [(1u32, 1u32), (10, 7), (33, 15), (100, 250), (641, 480)] {
            for p in [0.0, 1.0, 5.0, 12.5, 20.0, 33.3, 50.0] {
                let out = expand(&noisy(w, h), p).unwrap();
                let scale = 1.0 + p / 100.0;
                let want_w = (w as f64 * scale).round() as u32;
                let want_h = (h as f64 * scale).round() as u32;
                assert_eq!(
                    (out.width(), out.height()),
                    (want_w, want_h),
                    "expand {w}x{h} by {p}%"
                );
                assert_eq!(
                    expanded_size(w, h, p).unwrap(),
                    (want_w as u64, want_h as u64)
                );
            }
        }
    }

    /// If this breaks, rotated corners get clipped (box too small) or the
    /// output gains stray transparent margins (box too large).
    #[test]
    fn test_rotation_bounding_box_law() {
        for (w, h) in [(1u32, 1u32), (7, 3), (30, 20), (64, 64)] {
            for deg in [0.0, 10.0, 30.0, 45.0, 90.0, 123.4, 180.0, 200.0, -60.0, 270.0] {
                let out = rotate(&noisy(w, h), deg).unwrap();
                let (sin, cos) = deg.to_radians().sin_cos();
                let (sin, cos) = (sin.abs(), cos.abs());
                let want_w = (w as f64 * cos + h as f64 * sin).ceil();
                let want_h = (w as f64 * sin + h as f64 * cos).ceil();
                assert!(
                    (out.width() as f64 - want_w).abs() <= 1.0
                        && (out.height() as f64 - want_h).abs() <= 1.0,
                    "rotate {w}x{h} by {deg}: got {}x{}, want {want_w}x{want_h}",
                    out.width(),
                    out.height()
                );
                let (sw, sh) = rotated_size(w, h, deg).unwrap();
                assert_eq!((out.width() as u64, out.height() as u64), (sw, sh));
            }
        }
    }

    // ========================================================================
    // Enhancement stays in range
    // ========================================================================

    /// If this breaks, out-of-range intermediate values wrap around instead
    /// of saturating, turning highlights black or shadows white.
    #[test]
    fn test_enhance_clamps_at_extremes() {
        assert_eq!(enhance_pixel(Rgba::BLACK), Rgba::BLACK);
        assert_eq!(enhance_pixel(Rgba::WHITE), Rgba::WHITE);
        assert_eq!(enhance_pixel(Rgba::rgb(255, 0, 0)), Rgba::rgb(255, 0, 0));
        assert_eq!(enhance_pixel(Rgba::rgb(0, 0, 255)), Rgba::rgb(0, 0, 255));
    }

    /// If this breaks, the tone curve is no longer monotonic and gradients
    /// in scans pick up banding after enhancement.
    #[test]
    fn test_enhance_grey_ramp_monotonic() {
        let mut previous = 0u8;
        for v in 0..=255u8 {
            let out = enhance_pixel(Rgba::rgb(v, v, v));
            assert!(out.r >= previous, "grey ramp decreased at {v}");
            previous = out.r;
        }
    }

    /// If this breaks, enhancement touches alpha and rotated corners stop
    /// being transparent in the exported PNG.
    #[test]
    fn test_enhance_after_rotate_keeps_transparent_corners() {
        let src = RasterBuffer::filled(40, 40, Rgba::rgb(90, 140, 200)).unwrap();
        let out = enhance(&rotate(&src, 30.0).unwrap());
        assert_eq!(out.pixel(0, 0).a, 0);
        let centre = out.pixel(out.width() / 2, out.height() / 2);
        assert_eq!(centre.a, 255);
    }

    // ========================================================================
    // Crop bounds
    // ========================================================================

    /// If this breaks, the library silently clamps and callers lose the
    /// signal that their editor rectangle was wrong.
    #[test]
    fn test_crop_partially_outside_is_error() {
        let src = noisy(50, 40);
        for rect in [
            Rectangle::new(45, 0, 10, 10),
            Rectangle::new(0, 35, 10, 10),
            Rectangle::new(0, 0, 51, 40),
            Rectangle::new(49, 39, 2, 2),
        ] {
            assert!(
                matches!(crop(&src, rect), Err(CanvasError::OutOfBounds { .. })),
                "{rect:?} should be out of bounds"
            );
        }
    }

    // ========================================================================
    // Blob detection
    // ========================================================================

    /// If this breaks, split uploads would get different names or order on
    /// every run.
    #[test]
    fn test_blob_detection_deterministic() {
        let mut scan = RasterBuffer::filled(300, 200, Rgba::WHITE).unwrap();
        for (x0, y0, side) in [(20u32, 20u32, 40u32), (150, 30, 60), (60, 120, 50)] {
            for y in y0..y0 + side {
                for x in x0..x0 + side {
                    scan.set_pixel(x, y, Rgba::rgb(30, 40, 50));
                }
            }
        }
        let options = DetectOptions::default();
        let first = detect_blobs(&scan, &options);
        let second = detect_blobs(&scan, &options);
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
    }

    /// If this breaks, the detector's grid quantization or padding changed
    /// and the single-square reference scan no longer yields one padded box.
    #[test]
    fn test_end_to_end_single_square() {
        let scan = scan_with_square(100, Rectangle::new(40, 40, 20, 20));
        let blobs = detect_blobs(&scan, &DetectOptions::new().threshold(200));
        assert_eq!(blobs.len(), 1);

        let expected = Rectangle::new(30, 30, 40, 40);
        let got = blobs[0];
        for (g, e) in [
            (got.x, expected.x),
            (got.y, expected.y),
            (got.width, expected.width),
            (got.height, expected.height),
        ] {
            assert!((g as i64 - e as i64).abs() <= 10, "{got:?} vs {expected:?}");
        }

        // Detected region crops cleanly and contains the whole square
        let item = crop(&scan, got).unwrap();
        let dark = (0..item.height())
            .flat_map(|y| (0..item.width()).map(move |x| (x, y)))
            .filter(|&(x, y)| item.pixel(x, y) == Rgba::BLACK)
            .count();
        assert_eq!(dark, 20 * 20);
    }

    /// If this breaks, transparent padding (the uncovered corners left by
    /// rotation) is binarized as foreground and every rotated scan yields
    /// one giant blob.
    #[test]
    fn test_transparent_margin_not_detected() {
        let scan = scan_with_square(100, Rectangle::new(40, 40, 20, 20));
        let padded = expand_with_background(&scan, 100.0, Rgba::TRANSPARENT).unwrap();
        assert_eq!((padded.width(), padded.height()), (200, 200));
        let blobs = detect_blobs(&padded, &DetectOptions::default());
        assert_eq!(blobs, vec![Rectangle::new(80, 80, 40, 40)]);
    }
}
