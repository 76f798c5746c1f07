//! Grid-quantized flood fill.

use crate::raster::{RasterBuffer, Rectangle, Rgba};

use super::DetectOptions;

#[inline]
fn is_foreground(p: Rgba, threshold: u8) -> bool {
    p.a != 0 && p.average() < threshold
}

/// Find bounding boxes of connected foreground regions.
///
/// Boxes are returned in raster-scan order of the first grid cell touched
/// by each blob, so repeated calls on the same buffer with the same options
/// return the same list in the same order.
pub fn detect_blobs(buffer: &RasterBuffer, options: &DetectOptions) -> Vec<Rectangle> {
    let step = options.effective_step();
    let width = buffer.width();
    let height = buffer.height();
    let cols = width.div_ceil(step);
    let rows = height.div_ceil(step);
    let index = |gx: u32, gy: u32| gy as usize * cols as usize + gx as usize;

    let mut foreground = vec![false; cols as usize * rows as usize];
    for gy in 0..rows {
        for gx in 0..cols {
            foreground[index(gx, gy)] =
                is_foreground(buffer.pixel(gx * step, gy * step), options.threshold);
        }
    }

    let mut visited = vec![false; foreground.len()];
    let mut stack: Vec<(u32, u32)> = Vec::new();
    let mut blobs = Vec::new();

    for gy in 0..rows {
        for gx in 0..cols {
            let start = index(gx, gy);
            if !foreground[start] || visited[start] {
                continue;
            }

            visited[start] = true;
            stack.push((gx, gy));
            let (mut min_x, mut max_x, mut min_y, mut max_y) = (gx, gx, gy, gy);

            while let Some((cx, cy)) = stack.pop() {
                min_x = min_x.min(cx);
                max_x = max_x.max(cx);
                min_y = min_y.min(cy);
                max_y = max_y.max(cy);

                let neighbours = [
                    (cx > 0).then(|| (cx - 1, cy)),
                    (cx + 1 < cols).then(|| (cx + 1, cy)),
                    (cy > 0).then(|| (cx, cy - 1)),
                    (cy + 1 < rows).then(|| (cx, cy + 1)),
                ];
                for (nx, ny) in neighbours.into_iter().flatten() {
                    let n = index(nx, ny);
                    if foreground[n] && !visited[n] {
                        visited[n] = true;
                        stack.push((nx, ny));
                    }
                }
            }

            let x0 = min_x * step;
            let y0 = min_y * step;
            let x1 = ((max_x + 1) * step).min(width);
            let y1 = ((max_y + 1) * step).min(height);
            let blob = Rectangle::new(x0, y0, x1 - x0, y1 - y0);

            if blob.width < options.min_size || blob.height < options.min_size {
                continue;
            }
            blobs.push(blob.padded(options.padding, width, height));
        }
    }

    blobs
}
