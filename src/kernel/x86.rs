//! SSE4.1 and AVX2 kernels (x86_64).
//!
//! Both kernels stage each window into a zero-padded 16x16 buffer and
//! reduce it with integer vector arithmetic: byte sums via `sad`, squares
//! and cross products via widening `madd` after zero-extending to 16 bits.
//! The accumulated sums are exact, so the shared finish reproduces the
//! scalar reference bit for bit.

use std::arch::x86_64::*;

use crate::kernel::{finish, stage_window, WindowSums, STAGE_AREA};
use crate::ImageView;

#[allow(clippy::too_many_arguments)]
pub(crate) fn cross_correlation_sse41(
    frame_a: ImageView<'_, u8>,
    x1: usize,
    y1: usize,
    frame_b: ImageView<'_, u8>,
    x2: usize,
    y2: usize,
    match_sz: u8,
) -> f64 {
    let mut win_a = [0u8; STAGE_AREA];
    let mut win_b = [0u8; STAGE_AREA];
    stage_window(frame_a, x1, y1, match_sz, &mut win_a);
    stage_window(frame_b, x2, y2, match_sz, &mut win_b);

    // Safety: dispatched only after the SSE4.1 probe succeeded.
    let sums = unsafe { window_sums_sse41(&win_a, &win_b) };
    let size = usize::from(match_sz);
    finish(sums, (size * size) as u32)
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn cross_correlation_avx2(
    frame_a: ImageView<'_, u8>,
    x1: usize,
    y1: usize,
    frame_b: ImageView<'_, u8>,
    x2: usize,
    y2: usize,
    match_sz: u8,
) -> f64 {
    let mut win_a = [0u8; STAGE_AREA];
    let mut win_b = [0u8; STAGE_AREA];
    stage_window(frame_a, x1, y1, match_sz, &mut win_a);
    stage_window(frame_b, x2, y2, match_sz, &mut win_b);

    // Safety: dispatched only after the AVX2 probe succeeded.
    let sums = unsafe { window_sums_avx2(&win_a, &win_b) };
    let size = usize::from(match_sz);
    finish(sums, (size * size) as u32)
}

#[target_feature(enable = "sse4.1")]
unsafe fn window_sums_sse41(win_a: &[u8; STAGE_AREA], win_b: &[u8; STAGE_AREA]) -> WindowSums {
    let zero = _mm_setzero_si128();
    let mut acc_a = _mm_setzero_si128();
    let mut acc_b = _mm_setzero_si128();
    let mut acc_a2 = _mm_setzero_si128();
    let mut acc_b2 = _mm_setzero_si128();
    let mut acc_ab = _mm_setzero_si128();

    for chunk in 0..STAGE_AREA / 16 {
        let a = _mm_loadu_si128(win_a.as_ptr().add(chunk * 16) as *const __m128i);
        let b = _mm_loadu_si128(win_b.as_ptr().add(chunk * 16) as *const __m128i);

        acc_a = _mm_add_epi64(acc_a, _mm_sad_epu8(a, zero));
        acc_b = _mm_add_epi64(acc_b, _mm_sad_epu8(b, zero));

        // Zero-extend to 16 bits; 255*255 products fit i32 lanes via madd.
        let a_lo = _mm_unpacklo_epi8(a, zero);
        let a_hi = _mm_unpackhi_epi8(a, zero);
        let b_lo = _mm_unpacklo_epi8(b, zero);
        let b_hi = _mm_unpackhi_epi8(b, zero);

        acc_a2 = _mm_add_epi32(acc_a2, _mm_madd_epi16(a_lo, a_lo));
        acc_a2 = _mm_add_epi32(acc_a2, _mm_madd_epi16(a_hi, a_hi));
        acc_b2 = _mm_add_epi32(acc_b2, _mm_madd_epi16(b_lo, b_lo));
        acc_b2 = _mm_add_epi32(acc_b2, _mm_madd_epi16(b_hi, b_hi));
        acc_ab = _mm_add_epi32(acc_ab, _mm_madd_epi16(a_lo, b_lo));
        acc_ab = _mm_add_epi32(acc_ab, _mm_madd_epi16(a_hi, b_hi));
    }

    WindowSums {
        sum_a: hsum_sad_128(acc_a),
        sum_b: hsum_sad_128(acc_b),
        sum_a2: hsum_epi32_128(acc_a2),
        sum_b2: hsum_epi32_128(acc_b2),
        sum_ab: hsum_epi32_128(acc_ab),
    }
}

#[target_feature(enable = "avx2")]
unsafe fn window_sums_avx2(win_a: &[u8; STAGE_AREA], win_b: &[u8; STAGE_AREA]) -> WindowSums {
    let zero = _mm256_setzero_si256();
    let mut acc_a = _mm256_setzero_si256();
    let mut acc_b = _mm256_setzero_si256();
    let mut acc_a2 = _mm256_setzero_si256();
    let mut acc_b2 = _mm256_setzero_si256();
    let mut acc_ab = _mm256_setzero_si256();

    for chunk in 0..STAGE_AREA / 32 {
        let a = _mm256_loadu_si256(win_a.as_ptr().add(chunk * 32) as *const __m256i);
        let b = _mm256_loadu_si256(win_b.as_ptr().add(chunk * 32) as *const __m256i);

        acc_a = _mm256_add_epi64(acc_a, _mm256_sad_epu8(a, zero));
        acc_b = _mm256_add_epi64(acc_b, _mm256_sad_epu8(b, zero));

        // Per-128-lane unpack order is irrelevant: every lane is summed.
        let a_lo = _mm256_unpacklo_epi8(a, zero);
        let a_hi = _mm256_unpackhi_epi8(a, zero);
        let b_lo = _mm256_unpacklo_epi8(b, zero);
        let b_hi = _mm256_unpackhi_epi8(b, zero);

        acc_a2 = _mm256_add_epi32(acc_a2, _mm256_madd_epi16(a_lo, a_lo));
        acc_a2 = _mm256_add_epi32(acc_a2, _mm256_madd_epi16(a_hi, a_hi));
        acc_b2 = _mm256_add_epi32(acc_b2, _mm256_madd_epi16(b_lo, b_lo));
        acc_b2 = _mm256_add_epi32(acc_b2, _mm256_madd_epi16(b_hi, b_hi));
        acc_ab = _mm256_add_epi32(acc_ab, _mm256_madd_epi16(a_lo, b_lo));
        acc_ab = _mm256_add_epi32(acc_ab, _mm256_madd_epi16(a_hi, b_hi));
    }

    WindowSums {
        sum_a: hsum_sad_256(acc_a),
        sum_b: hsum_sad_256(acc_b),
        sum_a2: hsum_epi32_256(acc_a2),
        sum_b2: hsum_epi32_256(acc_b2),
        sum_ab: hsum_epi32_256(acc_ab),
    }
}

#[target_feature(enable = "sse4.1")]
unsafe fn hsum_sad_128(v: __m128i) -> u32 {
    (_mm_extract_epi64::<0>(v) + _mm_extract_epi64::<1>(v)) as u32
}

#[target_feature(enable = "sse4.1")]
unsafe fn hsum_epi32_128(v: __m128i) -> u32 {
    let v = _mm_add_epi32(v, _mm_srli_si128::<8>(v));
    let v = _mm_add_epi32(v, _mm_srli_si128::<4>(v));
    _mm_cvtsi128_si32(v) as u32
}

#[target_feature(enable = "avx2")]
unsafe fn hsum_sad_256(v: __m256i) -> u32 {
    let folded = _mm_add_epi64(_mm256_castsi256_si128(v), _mm256_extracti128_si256::<1>(v));
    hsum_sad_128(folded)
}

#[target_feature(enable = "avx2")]
unsafe fn hsum_epi32_256(v: __m256i) -> u32 {
    let folded = _mm_add_epi32(_mm256_castsi256_si128(v), _mm256_extracti128_si256::<1>(v));
    hsum_epi32_128(folded)
}
