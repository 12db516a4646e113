//─────────────────────────────────────────────────────────────────────────────
// pointwise-additive pixel metrics over a rectangle (SSD, euclidean, colour distance)
//─────────────────────────────────────────────────────────────────────────────

use rayon::prelude::*;

use crate::geom::DirtyRect;

/// per-pixel error kernel over one RGBA pixel of each image
pub type PixelKernel = fn(&[u8], &[u8]) -> f64;

#[inline]
fn channel_deltas(t: &[u8], c: &[u8]) -> (f64, f64, f64) {
    (
        t[0] as f64 - c[0] as f64,
        t[1] as f64 - c[1] as f64,
        t[2] as f64 - c[2] as f64,
    )
}

/// squared difference summed over RGB
#[inline]
pub fn squared_diff(t: &[u8], c: &[u8]) -> f64 {
    let (dr, dg, db) = channel_deltas(t, c);
    dr * dr + dg * dg + db * db
}

/// 3-channel euclidean distance
#[inline]
pub fn euclidean(t: &[u8], c: &[u8]) -> f64 {
    squared_diff(t, c).sqrt()
}

/// red-mean weighted squared colour distance.
/// weights are (512 + rmean)/256, 4, (767 - rmean)/256 for R, G, B.
#[inline]
pub fn squared_color_dist(t: &[u8], c: &[u8]) -> f64 {
    let rmean = (t[0] as f64 + c[0] as f64) * 0.5;
    let (dr, dg, db) = channel_deltas(t, c);
    (512.0 + rmean) / 256.0 * dr * dr + 4.0 * dg * dg + (767.0 - rmean) / 256.0 * db * db
}

/// red-mean weighted colour distance (square-rooted per pixel)
#[inline]
pub fn color_dist(t: &[u8], c: &[u8]) -> f64 {
    squared_color_dist(t, c).sqrt()
}

/// sum `kernel` over every pixel of `rect` (inclusive bounds).
/// rows are scored in parallel and then added in row order, so the result does
/// not depend on the thread count.
pub fn sum_rect(target: &[u8], current: &[u8], rect: DirtyRect, stride: u32, kernel: PixelKernel) -> f64 {
    profiling::scope!("sum_rect");
    debug_assert_eq!(target.len(), current.len());
    let row_bytes = rect.width() as usize * 4;

    let rows: Vec<f64> = (rect.y0..=rect.y1)
        .into_par_iter()
        .map(|y| {
            let start = ((y * stride + rect.x0) * 4) as usize;
            target[start..start + row_bytes]
                .chunks_exact(4)
                .zip(current[start..start + row_bytes].chunks_exact(4))
                .map(|(t, c)| kernel(t, c))
                .sum()
        })
        .collect();

    rows.iter().sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernels_on_known_pixels() {
        let t = [10u8, 20, 30, 255];
        let c = [13u8, 16, 30, 255];
        assert_eq!(squared_diff(&t, &c), 25.0);
        assert_eq!(euclidean(&t, &c), 5.0);
        // rmean = 11.5 -> (523.5/256)*9 + 4*16 + 0
        let expected = 523.5 / 256.0 * 9.0 + 64.0;
        assert!((squared_color_dist(&t, &c) - expected).abs() < 1e-9);
        assert!((color_dist(&t, &c) - expected.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn identical_pixels_score_zero() {
        let p = [200u8, 100, 50, 255];
        let kernels: [PixelKernel; 4] = [squared_diff, euclidean, color_dist, squared_color_dist];
        for k in kernels {
            assert_eq!(k(&p, &p), 0.0);
        }
    }

    #[test]
    fn rect_sum_counts_only_rect() {
        // 3x2 image, only pixel (2,1) differs
        let a = vec![0u8; 3 * 2 * 4];
        let mut b = a.clone();
        b[5 * 4] = 4;
        assert_eq!(sum_rect(&a, &b, DirtyRect::full(3, 2), 3, squared_diff), 16.0);
        assert_eq!(sum_rect(&a, &b, DirtyRect::new(0, 0, 1, 1), 3, squared_diff), 0.0);
        assert_eq!(sum_rect(&a, &b, DirtyRect::new(2, 1, 2, 1), 3, squared_diff), 16.0);
    }
}
