//! NEON and NEON-dotprod kernels (aarch64).
//!
//! Windows are staged into zero-padded 16x16 buffers and reduced 16 bytes
//! at a time: the plain NEON kernel widens through pairwise-add and
//! widening multiplies, the dotprod kernel folds each reduction into a
//! single `vdot` against ones or the second operand. Sums are exact, so
//! the shared finish reproduces the scalar reference bit for bit.

use std::arch::aarch64::*;

use crate::kernel::{finish, stage_window, WindowSums, STAGE_AREA};
use crate::ImageView;

#[allow(clippy::too_many_arguments)]
pub(crate) fn cross_correlation_neon(
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

    // Safety: dispatched only after the NEON probe succeeded.
    let sums = unsafe { window_sums_neon(&win_a, &win_b) };
    let size = usize::from(match_sz);
    finish(sums, (size * size) as u32)
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn cross_correlation_neon_dotprod(
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

    // Safety: dispatched only after the dotprod probe succeeded.
    let sums = unsafe { window_sums_neon_dotprod(&win_a, &win_b) };
    let size = usize::from(match_sz);
    finish(sums, (size * size) as u32)
}

#[target_feature(enable = "neon")]
unsafe fn window_sums_neon(win_a: &[u8; STAGE_AREA], win_b: &[u8; STAGE_AREA]) -> WindowSums {
    let mut acc_a = vdupq_n_u32(0);
    let mut acc_b = vdupq_n_u32(0);
    let mut acc_a2 = vdupq_n_u32(0);
    let mut acc_b2 = vdupq_n_u32(0);
    let mut acc_ab = vdupq_n_u32(0);

    for chunk in 0..STAGE_AREA / 16 {
        let a = vld1q_u8(win_a.as_ptr().add(chunk * 16));
        let b = vld1q_u8(win_b.as_ptr().add(chunk * 16));

        acc_a = vpadalq_u16(acc_a, vpaddlq_u8(a));
        acc_b = vpadalq_u16(acc_b, vpaddlq_u8(b));

        let a_lo = vget_low_u8(a);
        let b_lo = vget_low_u8(b);
        acc_a2 = vpadalq_u16(acc_a2, vmull_u8(a_lo, a_lo));
        acc_a2 = vpadalq_u16(acc_a2, vmull_high_u8(a, a));
        acc_b2 = vpadalq_u16(acc_b2, vmull_u8(b_lo, b_lo));
        acc_b2 = vpadalq_u16(acc_b2, vmull_high_u8(b, b));
        acc_ab = vpadalq_u16(acc_ab, vmull_u8(a_lo, b_lo));
        acc_ab = vpadalq_u16(acc_ab, vmull_high_u8(a, b));
    }

    WindowSums {
        sum_a: vaddvq_u32(acc_a),
        sum_b: vaddvq_u32(acc_b),
        sum_a2: vaddvq_u32(acc_a2),
        sum_b2: vaddvq_u32(acc_b2),
        sum_ab: vaddvq_u32(acc_ab),
    }
}

#[target_feature(enable = "neon,dotprod")]
unsafe fn window_sums_neon_dotprod(
    win_a: &[u8; STAGE_AREA],
    win_b: &[u8; STAGE_AREA],
) -> WindowSums {
    let ones = vdupq_n_u8(1);
    let mut acc_a = vdupq_n_u32(0);
    let mut acc_b = vdupq_n_u32(0);
    let mut acc_a2 = vdupq_n_u32(0);
    let mut acc_b2 = vdupq_n_u32(0);
    let mut acc_ab = vdupq_n_u32(0);

    for chunk in 0..STAGE_AREA / 16 {
        let a = vld1q_u8(win_a.as_ptr().add(chunk * 16));
        let b = vld1q_u8(win_b.as_ptr().add(chunk * 16));

        acc_a = vdotq_u32(acc_a, a, ones);
        acc_b = vdotq_u32(acc_b, b, ones);
        acc_a2 = vdotq_u32(acc_a2, a, a);
        acc_b2 = vdotq_u32(acc_b2, b, b);
        acc_ab = vdotq_u32(acc_ab, a, b);
    }

    WindowSums {
        sum_a: vaddvq_u32(acc_a),
        sum_b: vaddvq_u32(acc_b),
        sum_a2: vaddvq_u32(acc_a2),
        sum_b2: vaddvq_u32(acc_b2),
        sum_ab: vaddvq_u32(acc_ab),
    }
}
