//! Statistical sanity of the correlation score.
//!
//! Two extreme content modes bound the expected behavior: independent
//! random frames should correlate near 0, a frame linearly derived from the
//! other plus bounded noise should correlate near 1.

use cornermatch::{cross_correlation, ImageView};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const FRAME_W: usize = 128;
const FRAME_H: usize = 128;
const NUM_TRIALS: usize = 10_000;
const MATCH_SIZES: [u8; 7] = [3, 5, 7, 9, 11, 13, 15];

fn score_stats(
    frame_a: ImageView<'_, u8>,
    frame_b: ImageView<'_, u8>,
    match_sz: u8,
    rng: &mut StdRng,
) -> (f64, f64) {
    let half = usize::from(match_sz) / 2;
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    for _ in 0..NUM_TRIALS {
        let x1 = rng.random_range(half..FRAME_W - half);
        let y1 = rng.random_range(half..FRAME_H - half);
        let x2 = rng.random_range(half..FRAME_W - half);
        let y2 = rng.random_range(half..FRAME_H - half);
        let score = cross_correlation(frame_a, x1, y1, frame_b, x2, y2, match_sz);
        sum += score;
        sum_sq += score * score;
    }
    let n = NUM_TRIALS as f64;
    let mean = sum / n;
    let std = (sum_sq / n - mean * mean).max(0.0).sqrt();
    (mean, std)
}

#[test]
fn independent_noise_correlates_near_zero() {
    let mut rng = StdRng::seed_from_u64(0xD15E);
    let data_a: Vec<u8> = (0..FRAME_W * FRAME_H).map(|_| rng.random()).collect();
    let data_b: Vec<u8> = (0..FRAME_W * FRAME_H).map(|_| rng.random()).collect();
    let frame_a = ImageView::from_slice(&data_a, FRAME_W, FRAME_H).unwrap();
    let frame_b = ImageView::from_slice(&data_b, FRAME_W, FRAME_H).unwrap();

    for &match_sz in &MATCH_SIZES {
        let (mean, std) = score_stats(frame_a, frame_b, match_sz, &mut rng);
        assert!(
            mean.abs() < 0.05,
            "match_sz {match_sz}: mean {mean} not near zero"
        );
        assert!(
            std < 0.5,
            "match_sz {match_sz}: std {std} not small relative to 1"
        );
    }
}

#[test]
fn linearly_related_content_correlates_near_one() {
    let mut rng = StdRng::seed_from_u64(0x11EA4);
    let mut data_a = Vec::with_capacity(FRAME_W * FRAME_H);
    let mut data_b = Vec::with_capacity(FRAME_W * FRAME_H);
    for _ in 0..FRAME_W * FRAME_H {
        let v = rng.random::<u8>();
        data_a.push(v);
        data_b.push(v / 2 + (rng.random::<u8>() & 15));
    }
    let frame_a = ImageView::from_slice(&data_a, FRAME_W, FRAME_H).unwrap();
    let frame_b = ImageView::from_slice(&data_b, FRAME_W, FRAME_H).unwrap();

    // Correlated mode compares co-located windows, not independent pairs.
    for &match_sz in &MATCH_SIZES {
        let half = usize::from(match_sz) / 2;
        let mut sum = 0.0f64;
        for _ in 0..NUM_TRIALS {
            let x = rng.random_range(half..FRAME_W - half);
            let y = rng.random_range(half..FRAME_H - half);
            sum += cross_correlation(frame_a, x, y, frame_b, x, y, match_sz);
        }
        let mean = sum / NUM_TRIALS as f64;
        assert!(
            mean > 0.8,
            "match_sz {match_sz}: mean {mean} below linear-content floor"
        );
    }
}
