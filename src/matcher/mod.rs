//! Corner matching across two frames.
//!
//! Consumes corner lists produced by an external detector and emits point
//! correspondences for the downstream global-motion model fitter. Candidate
//! pairs are pruned to a square search window, scored with the correlation
//! kernel, and accepted on a best-match-above-threshold policy with an
//! optional mutual-best constraint.

use crate::kernel::{self, cross_correlation};
use crate::trace::{trace_event, trace_span};
use crate::util::{CornerMatchError, CornerMatchResult};
use crate::ImageView;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Integer pixel coordinate flagged by the corner detector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Corner {
    /// X coordinate (column).
    pub x: usize,
    /// Y coordinate (row).
    pub y: usize,
}

impl Corner {
    /// Creates a corner at `(x, y)`.
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Matched corner pair with its correlation score.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Correspondence {
    /// Corner in the reference frame.
    pub a: Corner,
    /// Matched corner in the current frame.
    pub b: Corner,
    /// Correlation score of the accepted match.
    pub score: f64,
}

/// Matching policy configuration.
#[derive(Clone, Debug)]
pub struct MatchConfig {
    /// Correlation window side; odd, within 3..=15.
    pub match_sz: u8,
    /// Chebyshev radius of the candidate search window in pixels.
    pub search_radius: usize,
    /// Minimum correlation score for an accepted match.
    pub min_score: f64,
    /// Keep a pair only if both corners are each other's best match.
    pub mutual: bool,
    /// Fan out over reference corners (effective with the `rayon` feature).
    pub parallel: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            match_sz: 13,
            search_radius: 16,
            min_score: 0.75,
            mutual: true,
            parallel: false,
        }
    }
}

/// Matches corners between a reference frame and the current frame.
pub struct CornerMatcher {
    cfg: MatchConfig,
}

impl CornerMatcher {
    /// Validates the configuration and builds a matcher.
    pub fn new(cfg: MatchConfig) -> CornerMatchResult<Self> {
        if !kernel::is_valid_match_sz(cfg.match_sz) {
            return Err(CornerMatchError::InvalidMatchSize {
                match_sz: cfg.match_sz,
            });
        }
        Ok(Self { cfg })
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &MatchConfig {
        &self.cfg
    }

    /// Produces the correspondence set for two frames.
    ///
    /// A corner whose window leaves its frame is skipped, as is a corner
    /// with no candidate scoring at least `min_score`; neither is an error.
    /// Output order follows the frame-A corner order and is identical for
    /// the sequential and parallel paths.
    pub fn match_corners(
        &self,
        frame_a: ImageView<'_, u8>,
        corners_a: &[Corner],
        frame_b: ImageView<'_, u8>,
        corners_b: &[Corner],
    ) -> Vec<Correspondence> {
        let _span = trace_span!(
            "match_corners",
            corners_a = corners_a.len(),
            corners_b = corners_b.len()
        )
        .entered();

        #[cfg(feature = "rayon")]
        let matches: Vec<Correspondence> = if self.cfg.parallel {
            corners_a
                .par_iter()
                .filter_map(|p| self.match_one(frame_a, corners_a, frame_b, corners_b, *p))
                .collect()
        } else {
            corners_a
                .iter()
                .filter_map(|p| self.match_one(frame_a, corners_a, frame_b, corners_b, *p))
                .collect()
        };
        #[cfg(not(feature = "rayon"))]
        let matches: Vec<Correspondence> = corners_a
            .iter()
            .filter_map(|p| self.match_one(frame_a, corners_a, frame_b, corners_b, *p))
            .collect();

        trace_event!("correspondences", count = matches.len());
        matches
    }

    /// Finds the accepted match for one reference corner, if any.
    fn match_one(
        &self,
        frame_a: ImageView<'_, u8>,
        corners_a: &[Corner],
        frame_b: ImageView<'_, u8>,
        corners_b: &[Corner],
        p: Corner,
    ) -> Option<Correspondence> {
        let half = usize::from(self.cfg.match_sz) / 2;
        if !frame_a.contains_window(p.x, p.y, half) {
            return None;
        }

        let (best_idx, best_score) = best_candidate(frame_a, p, frame_b, corners_b, &self.cfg)?;
        if best_score < self.cfg.min_score {
            return None;
        }
        let q = corners_b[best_idx];

        if self.cfg.mutual {
            // NCC is symmetric, so the reverse pass reuses the same kernel
            // with the frames swapped. Thresholding stays one-sided: the
            // constraint is about the argmax, not the score.
            let (rev_idx, _) = best_candidate(frame_b, q, frame_a, corners_a, &self.cfg)?;
            if corners_a[rev_idx] != p {
                return None;
            }
        }

        Some(Correspondence {
            a: p,
            b: q,
            score: best_score,
        })
    }
}

/// Scores every in-window candidate around `p` and returns the index and
/// score of the best one. Ties keep the earliest candidate in input order.
fn best_candidate(
    frame_p: ImageView<'_, u8>,
    p: Corner,
    frame_q: ImageView<'_, u8>,
    candidates: &[Corner],
    cfg: &MatchConfig,
) -> Option<(usize, f64)> {
    let half = usize::from(cfg.match_sz) / 2;
    let mut best: Option<(usize, f64)> = None;
    for (idx, q) in candidates.iter().enumerate() {
        if chebyshev(p, *q) > cfg.search_radius {
            continue;
        }
        if !frame_q.contains_window(q.x, q.y, half) {
            continue;
        }
        let score = cross_correlation(frame_p, p.x, p.y, frame_q, q.x, q.y, cfg.match_sz);
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((idx, score)),
        }
    }
    best
}

fn chebyshev(p: Corner, q: Corner) -> usize {
    p.x.abs_diff(q.x).max(p.y.abs_diff(q.y))
}
