//! Portable vector kernel built on the `wide` crate.
//!
//! Serves targets without a dedicated `std::arch` implementation. Staged
//! window bytes are widened to `u32` lanes and the five sums accumulate in
//! eight-lane integer arithmetic, so the result is exact like every other
//! backend.

use wide::u32x8;

use crate::kernel::{finish, stage_window, WindowSums, STAGE_AREA};
use crate::ImageView;

const LANES: usize = 8;

/// Load 8 u8 values zero-extended into u32x8.
#[inline]
fn load_u8x8_as_u32x8(slice: &[u8]) -> u32x8 {
    u32x8::from([
        slice[0] as u32,
        slice[1] as u32,
        slice[2] as u32,
        slice[3] as u32,
        slice[4] as u32,
        slice[5] as u32,
        slice[6] as u32,
        slice[7] as u32,
    ])
}

/// Horizontal sum of u32x8.
#[inline]
fn hsum(v: u32x8) -> u32 {
    let arr = v.to_array();
    arr[0] + arr[1] + arr[2] + arr[3] + arr[4] + arr[5] + arr[6] + arr[7]
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn cross_correlation_wide(
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

    let mut acc_a = u32x8::ZERO;
    let mut acc_b = u32x8::ZERO;
    let mut acc_a2 = u32x8::ZERO;
    let mut acc_b2 = u32x8::ZERO;
    let mut acc_ab = u32x8::ZERO;

    let mut offset = 0;
    while offset < STAGE_AREA {
        let a = load_u8x8_as_u32x8(&win_a[offset..]);
        let b = load_u8x8_as_u32x8(&win_b[offset..]);

        acc_a += a;
        acc_b += b;
        acc_a2 += a * a;
        acc_b2 += b * b;
        acc_ab += a * b;

        offset += LANES;
    }

    let sums = WindowSums {
        sum_a: hsum(acc_a),
        sum_b: hsum(acc_b),
        sum_a2: hsum(acc_a2),
        sum_b2: hsum(acc_b2),
        sum_ab: hsum(acc_ab),
    };
    let size = usize::from(match_sz);
    finish(sums, (size * size) as u32)
}
