// structural similarity on luma, over non-overlapping square windows.
// not pointwise additive, so there is no bounded-region variant.

use rayon::prelude::*;

const WINDOW: u32 = 8;
const C1: f64 = (0.01 * 255.0) * (0.01 * 255.0);
const C2: f64 = (0.03 * 255.0) * (0.03 * 255.0);

#[inline]
fn luma(px: &[u8]) -> f64 {
    0.299 * px[0] as f64 + 0.587 * px[1] as f64 + 0.114 * px[2] as f64
}

fn window_ssim(target: &[u8], current: &[u8], stride: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> f64 {
    let n = ((x1 - x0) * (y1 - y0)) as f64;
    let (mut sa, mut sb, mut saa, mut sbb, mut sab) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for y in y0..y1 {
        for x in x0..x1 {
            let i = ((y * stride + x) * 4) as usize;
            let a = luma(&target[i..i + 3]);
            let b = luma(&current[i..i + 3]);
            sa += a;
            sb += b;
            saa += a * a;
            sbb += b * b;
            sab += a * b;
        }
    }
    let (ma, mb) = (sa / n, sb / n);
    let va = (saa / n - ma * ma).max(0.0);
    let vb = (sbb / n - mb * mb).max(0.0);
    let cov = sab / n - ma * mb;
    ((2.0 * ma * mb + C1) * (2.0 * cov + C2)) / ((ma * ma + mb * mb + C1) * (va + vb + C2))
}

/// mean SSIM over the image, in [-1, 1]; 1 means identical
pub fn mean_ssim(target: &[u8], current: &[u8], width: u32, height: u32) -> f64 {
    profiling::scope!("mean_ssim");
    if width == 0 || height == 0 {
        return 1.0;
    }
    let bands: Vec<(f64, usize)> = (0..height.div_ceil(WINDOW))
        .into_par_iter()
        .map(|band| {
            let y0 = band * WINDOW;
            let y1 = (y0 + WINDOW).min(height);
            let mut sum = 0.0;
            let mut count = 0;
            let mut x0 = 0;
            while x0 < width {
                let x1 = (x0 + WINDOW).min(width);
                sum += window_ssim(target, current, width, x0, y0, x1, y1);
                count += 1;
                x0 = x1;
            }
            (sum, count)
        })
        .collect();

    let (sum, count) = bands
        .iter()
        .fold((0.0, 0usize), |(s, c), &(bs, bc)| (s + bs, c + bc));
    sum / count as f64
}
