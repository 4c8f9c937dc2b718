//! Matcher acceptance, ordering, and policy behavior.

use cornermatch::{Corner, CornerMatcher, ImageView, MatchConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const FRAME_W: usize = 128;
const FRAME_H: usize = 128;

/// Random canvas plus a crop of it shifted by `(sx, sy)`: a corner at
/// `(x, y)` in frame A corresponds to `(x + sx, y + sy)` in frame B.
fn make_shifted_frames(sx: usize, sy: usize, seed: u64) -> (Vec<u8>, Vec<u8>) {
    let canvas_w = FRAME_W + sx;
    let canvas_h = FRAME_H + sy;
    let mut rng = StdRng::seed_from_u64(seed);
    let canvas: Vec<u8> = (0..canvas_w * canvas_h).map(|_| rng.random()).collect();

    let mut frame_a = Vec::with_capacity(FRAME_W * FRAME_H);
    let mut frame_b = Vec::with_capacity(FRAME_W * FRAME_H);
    for y in 0..FRAME_H {
        for x in 0..FRAME_W {
            frame_a.push(canvas[(y + sy) * canvas_w + (x + sx)]);
            frame_b.push(canvas[y * canvas_w + x]);
        }
    }
    (frame_a, frame_b)
}

fn grid_corners(margin: usize, step: usize) -> Vec<Corner> {
    let mut corners = Vec::new();
    let mut y = margin;
    while y < FRAME_H - margin {
        let mut x = margin;
        while x < FRAME_W - margin {
            corners.push(Corner::new(x, y));
            x += step;
        }
        y += step;
    }
    corners
}

#[test]
fn recovers_known_shift() {
    let (sx, sy) = (5usize, 3usize);
    let (data_a, data_b) = make_shifted_frames(sx, sy, 0xF00D);
    let frame_a = ImageView::from_slice(&data_a, FRAME_W, FRAME_H).unwrap();
    let frame_b = ImageView::from_slice(&data_b, FRAME_W, FRAME_H).unwrap();

    let corners_a = grid_corners(16, 16);
    let corners_b: Vec<Corner> = corners_a
        .iter()
        .map(|c| Corner::new(c.x + sx, c.y + sy))
        .collect();

    let matcher = CornerMatcher::new(MatchConfig::default()).unwrap();
    let matches = matcher.match_corners(frame_a, &corners_a, frame_b, &corners_b);

    assert_eq!(matches.len(), corners_a.len());
    for m in &matches {
        assert_eq!(m.b.x, m.a.x + sx);
        assert_eq!(m.b.y, m.a.y + sy);
        assert!(m.score > 0.999, "shifted window scored {}", m.score);
    }
}

#[test]
fn matching_is_deterministic() {
    let (data_a, data_b) = make_shifted_frames(4, 7, 42);
    let frame_a = ImageView::from_slice(&data_a, FRAME_W, FRAME_H).unwrap();
    let frame_b = ImageView::from_slice(&data_b, FRAME_W, FRAME_H).unwrap();

    let corners_a = grid_corners(12, 8);
    let corners_b = grid_corners(12, 8);

    let matcher = CornerMatcher::new(MatchConfig {
        min_score: 0.0,
        ..MatchConfig::default()
    })
    .unwrap();

    let first = matcher.match_corners(frame_a, &corners_a, frame_b, &corners_b);
    let second = matcher.match_corners(frame_a, &corners_a, frame_b, &corners_b);
    assert_eq!(first, second);
}

#[test]
fn raising_threshold_never_adds_matches() {
    let mut rng = StdRng::seed_from_u64(99);
    let data_a: Vec<u8> = (0..FRAME_W * FRAME_H).map(|_| rng.random()).collect();
    let data_b: Vec<u8> = (0..FRAME_W * FRAME_H).map(|_| rng.random()).collect();
    let frame_a = ImageView::from_slice(&data_a, FRAME_W, FRAME_H).unwrap();
    let frame_b = ImageView::from_slice(&data_b, FRAME_W, FRAME_H).unwrap();

    let corners_a = grid_corners(8, 8);
    let corners_b = grid_corners(8, 8);

    let mut prev_count = usize::MAX;
    for min_score in [-1.0, 0.0, 0.3, 0.6, 0.9, 0.999] {
        let matcher = CornerMatcher::new(MatchConfig {
            search_radius: 48,
            min_score,
            ..MatchConfig::default()
        })
        .unwrap();
        let count = matcher
            .match_corners(frame_a, &corners_a, frame_b, &corners_b)
            .len();
        assert!(
            count <= prev_count,
            "threshold {min_score} produced {count} matches, more than {prev_count}"
        );
        prev_count = count;
    }
}

#[test]
fn empty_inputs_yield_empty_set() {
    let data = vec![0u8; FRAME_W * FRAME_H];
    let frame = ImageView::from_slice(&data, FRAME_W, FRAME_H).unwrap();
    let corners = grid_corners(16, 16);

    for match_sz in [3u8, 5, 7, 9, 11, 13, 15] {
        let matcher = CornerMatcher::new(MatchConfig {
            match_sz,
            ..MatchConfig::default()
        })
        .unwrap();
        assert!(matcher.match_corners(frame, &[], frame, &corners).is_empty());
        assert!(matcher.match_corners(frame, &corners, frame, &[]).is_empty());
        assert!(matcher.match_corners(frame, &[], frame, &[]).is_empty());
    }
}

#[test]
fn window_margin_is_enforced_per_corner() {
    let mut rng = StdRng::seed_from_u64(5);
    let data: Vec<u8> = (0..64 * 64).map(|_| rng.random()).collect();
    let frame = ImageView::from_slice(&data, 64, 64).unwrap();

    // match_sz 9 -> half 4: centers 4 pixels from the edge are valid,
    // centers 3 pixels from the edge are not.
    let cfg = MatchConfig {
        match_sz: 9,
        min_score: 0.5,
        ..MatchConfig::default()
    };
    let matcher = CornerMatcher::new(cfg).unwrap();

    let valid = Corner::new(4, 4);
    let matches = matcher.match_corners(frame, &[valid], frame, &[valid]);
    assert_eq!(matches.len(), 1);
    assert!(matches[0].score > 0.999);

    let too_close = Corner::new(3, 4);
    assert!(matcher
        .match_corners(frame, &[too_close], frame, &[too_close])
        .is_empty());
    // A valid reference corner with only out-of-margin candidates is dropped.
    assert!(matcher
        .match_corners(frame, &[valid], frame, &[too_close])
        .is_empty());
}

#[test]
fn mutual_best_rejects_ambiguous_matches() {
    // Two identical patches in frame A compete for one patch in frame B.
    let mut rng = StdRng::seed_from_u64(21);
    let patch: Vec<u8> = (0..7 * 7).map(|_| rng.random()).collect();

    let mut data_a = vec![0u8; 64 * 64];
    let mut data_b = vec![0u8; 64 * 64];
    let paste = |data: &mut Vec<u8>, cx: usize, cy: usize| {
        for dy in 0..7 {
            for dx in 0..7 {
                data[(cy - 3 + dy) * 64 + (cx - 3 + dx)] = patch[dy * 7 + dx];
            }
        }
    };
    let p1 = Corner::new(10, 10);
    let p2 = Corner::new(20, 10);
    let q = Corner::new(15, 10);
    paste(&mut data_a, p1.x, p1.y);
    paste(&mut data_a, p2.x, p2.y);
    paste(&mut data_b, q.x, q.y);

    let frame_a = ImageView::from_slice(&data_a, 64, 64).unwrap();
    let frame_b = ImageView::from_slice(&data_b, 64, 64).unwrap();
    let corners_a = [p1, p2];
    let corners_b = [q];

    let base = MatchConfig {
        match_sz: 7,
        min_score: 0.5,
        ..MatchConfig::default()
    };

    let mutual = CornerMatcher::new(MatchConfig {
        mutual: true,
        ..base.clone()
    })
    .unwrap();
    let kept = mutual.match_corners(frame_a, &corners_a, frame_b, &corners_b);
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].a, p1);
    assert_eq!(kept[0].b, q);

    let non_mutual = CornerMatcher::new(MatchConfig {
        mutual: false,
        ..base
    })
    .unwrap();
    let kept = non_mutual.match_corners(frame_a, &corners_a, frame_b, &corners_b);
    assert_eq!(kept.len(), 2);
}

#[test]
fn candidates_outside_search_radius_are_ignored() {
    let (data_a, data_b) = make_shifted_frames(0, 0, 314);
    let frame_a = ImageView::from_slice(&data_a, FRAME_W, FRAME_H).unwrap();
    let frame_b = ImageView::from_slice(&data_b, FRAME_W, FRAME_H).unwrap();

    let p = Corner::new(40, 40);
    let far = Corner::new(80, 40);

    let matcher = CornerMatcher::new(MatchConfig {
        search_radius: 16,
        min_score: -1.0,
        ..MatchConfig::default()
    })
    .unwrap();
    assert!(matcher.match_corners(frame_a, &[p], frame_b, &[far]).is_empty());
}
