//! Scalar reference kernel.
//!
//! Defines the exact semantics every accelerated backend must reproduce:
//! the five window sums are accumulated as exact integers and the score is
//! finished in double precision by [`finish`](crate::kernel::finish).

use crate::kernel::{finish, WindowSums};
use crate::ImageView;

/// Computes the correlation score between two `match_sz` windows.
#[allow(clippy::too_many_arguments)]
pub(crate) fn cross_correlation(
    frame_a: ImageView<'_, u8>,
    x1: usize,
    y1: usize,
    frame_b: ImageView<'_, u8>,
    x2: usize,
    y2: usize,
    match_sz: u8,
) -> f64 {
    let size = usize::from(match_sz);
    let half = size / 2;

    let mut sums = WindowSums::default();
    for dy in 0..size {
        let row_a = frame_a
            .row(y1 - half + dy)
            .expect("window within frame A bounds");
        let row_b = frame_b
            .row(y2 - half + dy)
            .expect("window within frame B bounds");
        let row_a = &row_a[x1 - half..x1 - half + size];
        let row_b = &row_b[x2 - half..x2 - half + size];

        for (&a, &b) in row_a.iter().zip(row_b) {
            let a = u32::from(a);
            let b = u32::from(b);
            sums.sum_a += a;
            sums.sum_b += b;
            sums.sum_a2 += a * a;
            sums.sum_b2 += b * b;
            sums.sum_ab += a * b;
        }
    }

    finish(sums, (size * size) as u32)
}
