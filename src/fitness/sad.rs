/// Sum of Absolute Differences (SAD) / Manhattan distance on RGBA.
/// both buffers are opaque, so the alpha bytes cancel and this equals SAD over RGB.
use rayon::prelude::*;

use crate::geom::DirtyRect;

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

/// SIMD-accelerated SAD computation using x86_64 PSADBW instruction.
/// processes 16 bytes at a time.
#[cfg(target_arch = "x86_64")]
#[inline]
unsafe fn sad_simd_chunk(target: &[u8], current: &[u8]) -> u64 {
    debug_assert!(target.len() == current.len());
    debug_assert!(target.len() % 16 == 0);

    let mut sum = _mm_setzero_si128();
    let chunks = target.len() / 16;

    for i in 0..chunks {
        let offset = i * 16;
        let t_bytes = _mm_loadu_si128(target.as_ptr().add(offset) as *const __m128i);
        let c_bytes = _mm_loadu_si128(current.as_ptr().add(offset) as *const __m128i);

        // PSADBW: 16 bytes -> two u64 sums, one per 64-bit lane
        let sad = _mm_sad_epu8(t_bytes, c_bytes);
        sum = _mm_add_epi64(sum, sad);
    }

    // fold the high lane down (SSE2 only)
    let low = _mm_cvtsi128_si64(sum) as u64;
    let high = _mm_cvtsi128_si64(_mm_srli_si128(sum, 8)) as u64;
    low + high
}

#[cfg(not(target_arch = "x86_64"))]
#[inline]
unsafe fn sad_simd_chunk(target: &[u8], current: &[u8]) -> u64 {
    sad_scalar(target, current)
}

#[inline]
fn sad_scalar(target: &[u8], current: &[u8]) -> u64 {
    target
        .iter()
        .zip(current)
        .map(|(&t, &c)| t.abs_diff(c) as u64)
        .sum()
}

/// full-frame SAD, rayon over fixed-size chunks.
/// the result is an integer, so the parallel reduction order does not matter.
pub fn sad_full(target_rgba: &[u8], current_rgba: &[u8]) -> u64 {
    profiling::scope!("sad_full");
    debug_assert_eq!(target_rgba.len(), current_rgba.len());
    debug_assert_eq!(target_rgba.len() % 4, 0);

    let len = target_rgba.len();
    let simd_len = (len / 16) * 16;

    // minimum chunk keeps task overhead down on small images
    const MIN_CHUNK_BYTES: usize = 64 * 1024;
    let num_cores = rayon::current_num_threads().max(1);
    let chunk_size = ((simd_len / num_cores / 16) * 16).max(MIN_CHUNK_BYTES);

    let simd_sum: u64 = if simd_len > 0 {
        target_rgba[..simd_len]
            .par_chunks(chunk_size)
            .zip(current_rgba[..simd_len].par_chunks(chunk_size))
            // safety: every chunk length is a multiple of 16 (chunk_size and simd_len both are)
            .map(|(t_chunk, c_chunk)| unsafe { sad_simd_chunk(t_chunk, c_chunk) })
            .sum()
    } else {
        0
    };

    // at most three trailing pixels
    simd_sum + sad_scalar(&target_rgba[simd_len..], &current_rgba[simd_len..])
}

/// SIMD (AVX2) SAD computation for rectangular region
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn sad_rect_avx2(target: &[u8], current: &[u8], rect: DirtyRect, stride: u32) -> u64 {
    let mut sum: u64 = 0;
    let row_bytes = rect.width() as usize * 4;

    for y in rect.y0..=rect.y1 {
        let row_start = ((y * stride + rect.x0) * 4) as usize;
        let t_row = &target[row_start..row_start + row_bytes];
        let c_row = &current[row_start..row_start + row_bytes];

        // 32 bytes = 8 pixels per step
        let mut row_sum = _mm256_setzero_si256();
        let mut i = 0;
        while i + 32 <= row_bytes {
            let t = _mm256_loadu_si256(t_row.as_ptr().add(i) as *const __m256i);
            let c = _mm256_loadu_si256(c_row.as_ptr().add(i) as *const __m256i);
            row_sum = _mm256_add_epi64(row_sum, _mm256_sad_epu8(t, c));
            i += 32;
        }

        let mut lanes: [u64; 4] = [0; 4];
        _mm256_storeu_si256(lanes.as_mut_ptr() as *mut __m256i, row_sum);
        sum += lanes[0] + lanes[1] + lanes[2] + lanes[3];

        // remainder of the row (up to 31 bytes)
        sum += sad_scalar(&t_row[i..], &c_row[i..]);
    }

    sum
}

#[inline]
fn sad_rect_scalar(target: &[u8], current: &[u8], rect: DirtyRect, stride: u32) -> u64 {
    let row_bytes = rect.width() as usize * 4;
    (rect.y0..=rect.y1)
        .map(|y| {
            let row_start = ((y * stride + rect.x0) * 4) as usize;
            sad_scalar(
                &target[row_start..row_start + row_bytes],
                &current[row_start..row_start + row_bytes],
            )
        })
        .sum()
}

/// SAD over a rectangular region (inclusive bounds) - dispatches to SIMD or scalar.
/// stride is the width of the full image in pixels.
#[inline]
pub fn sad_rect(target: &[u8], current: &[u8], rect: DirtyRect, stride: u32) -> u64 {
    profiling::scope!("sad_rect");
    debug_assert!(((rect.y1 * stride + rect.x1 + 1) * 4) as usize <= target.len());

    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            // safety: the feature was detected at runtime
            return unsafe { sad_rect_avx2(target, current, rect, stride) };
        }
    }

    sad_rect_scalar(target, current, rect, stride)
}
