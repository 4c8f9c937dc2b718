//! Normalized cross-correlation kernels and runtime backend dispatch.
//!
//! The scalar kernel defines the exact semantics; accelerated backends must
//! reproduce its result bit for bit. Every implementation accumulates the
//! five window sums as exact `u32` integers and hands them to the shared
//! [`finish`] routine, so equality with the reference is structural rather
//! than tolerance-based.

use std::sync::OnceLock;

use crate::ImageView;

pub(crate) mod scalar;

#[cfg(target_arch = "x86_64")]
pub(crate) mod x86;

#[cfg(target_arch = "aarch64")]
pub(crate) mod neon;

#[cfg(feature = "simd")]
pub(crate) mod simd;

/// Smallest supported correlation window side.
pub const MIN_MATCH_SZ: u8 = 3;

/// Largest supported correlation window side.
pub const MAX_MATCH_SZ: u8 = 15;

/// Score returned for windows with no intensity variation.
pub const DEGENERATE_SCORE: f64 = 0.0;

/// Row pitch of the zero-padded staging buffer used by vector kernels.
pub(crate) const STAGE_SZ: usize = 16;

/// Size of the staging buffer in bytes.
pub(crate) const STAGE_AREA: usize = STAGE_SZ * STAGE_SZ;

/// Signature shared by every correlation kernel implementation.
///
/// Arguments are the two frames, the two window centers and the window side.
/// Both centers must admit a full `match_sz` window; callers pre-filter.
pub type CorrelationFn =
    fn(ImageView<'_, u8>, usize, usize, ImageView<'_, u8>, usize, usize, u8) -> f64;

/// Exact integer reductions over a pair of windows.
///
/// At `match_sz = 15` the largest sum (sum of squares) is `225 * 255^2`,
/// well inside `u32`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct WindowSums {
    pub sum_a: u32,
    pub sum_b: u32,
    pub sum_a2: u32,
    pub sum_b2: u32,
    pub sum_ab: u32,
}

/// Turns exact window sums into the correlation score.
///
/// Shared by every backend so the degenerate-variance sentinel and the
/// floating-point evaluation order are identical across them.
#[inline]
pub(crate) fn finish(sums: WindowSums, n: u32) -> f64 {
    let n = f64::from(n);
    let mean_a = f64::from(sums.sum_a) / n;
    let mean_b = f64::from(sums.sum_b) / n;
    let cov = f64::from(sums.sum_ab) - n * mean_a * mean_b;
    let var_a = f64::from(sums.sum_a2) - n * mean_a * mean_a;
    let var_b = f64::from(sums.sum_b2) - n * mean_b * mean_b;
    let var_prod = var_a * var_b;
    if var_prod <= 0.0 {
        return DEGENERATE_SCORE;
    }
    cov / var_prod.sqrt()
}

/// Returns true if `match_sz` is odd and within the supported range.
#[inline]
pub(crate) fn is_valid_match_sz(match_sz: u8) -> bool {
    match_sz % 2 == 1 && (MIN_MATCH_SZ..=MAX_MATCH_SZ).contains(&match_sz)
}

/// Copies the window centered at `(x, y)` into a zero-padded staging buffer
/// with a fixed row pitch of [`STAGE_SZ`].
///
/// Zero padding contributes nothing to any of the five sums, so vector
/// kernels reduce over the whole buffer with in-bounds full-width loads.
#[cfg(any(target_arch = "x86_64", target_arch = "aarch64", feature = "simd"))]
#[inline]
pub(crate) fn stage_window(
    image: ImageView<'_, u8>,
    x: usize,
    y: usize,
    match_sz: u8,
    buf: &mut [u8; STAGE_AREA],
) {
    let size = usize::from(match_sz);
    let half = size / 2;
    for dy in 0..size {
        let row = image.row(y - half + dy).expect("window within image bounds");
        let src = &row[x - half..x - half + size];
        buf[dy * STAGE_SZ..dy * STAGE_SZ + size].copy_from_slice(src);
    }
}

/// Kernel implementation selected by the capability probe.
///
/// `Scalar` is always present and doubles as production fallback and test
/// oracle. SVE has no stable `std::arch` surface, so aarch64 coverage tops
/// out at NEON-dotprod.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    /// Portable reference implementation; defines the exact semantics.
    Scalar,
    /// SSE4.1 kernel (x86_64).
    #[cfg(target_arch = "x86_64")]
    Sse41,
    /// AVX2 kernel (x86_64).
    #[cfg(target_arch = "x86_64")]
    Avx2,
    /// NEON kernel (aarch64).
    #[cfg(target_arch = "aarch64")]
    Neon,
    /// NEON kernel using the dot-product extension (aarch64).
    #[cfg(target_arch = "aarch64")]
    NeonDotprod,
    /// Portable vector kernel built on the `wide` crate.
    #[cfg(feature = "simd")]
    Wide,
}

impl Backend {
    /// Probes CPU capability and returns the most capable backend.
    ///
    /// The probe is side-effect free and idempotent, so racing first calls
    /// resolve to the same answer.
    #[allow(unreachable_code)]
    pub fn detect() -> Backend {
        #[cfg(target_arch = "x86_64")]
        {
            if is_x86_feature_detected!("avx2") {
                return Backend::Avx2;
            }
            if is_x86_feature_detected!("sse4.1") {
                return Backend::Sse41;
            }
        }
        #[cfg(target_arch = "aarch64")]
        {
            if std::arch::is_aarch64_feature_detected!("dotprod") {
                return Backend::NeonDotprod;
            }
            if std::arch::is_aarch64_feature_detected!("neon") {
                return Backend::Neon;
            }
        }
        #[cfg(feature = "simd")]
        {
            return Backend::Wide;
        }
        Backend::Scalar
    }

    /// Lists every backend usable on the running CPU, scalar first.
    ///
    /// Equivalence tests iterate this to validate each variant against the
    /// reference on the hardware at hand.
    pub fn available() -> Vec<Backend> {
        let mut out = vec![Backend::Scalar];
        #[cfg(target_arch = "x86_64")]
        {
            if is_x86_feature_detected!("sse4.1") {
                out.push(Backend::Sse41);
            }
            if is_x86_feature_detected!("avx2") {
                out.push(Backend::Avx2);
            }
        }
        #[cfg(target_arch = "aarch64")]
        {
            if std::arch::is_aarch64_feature_detected!("neon") {
                out.push(Backend::Neon);
            }
            if std::arch::is_aarch64_feature_detected!("dotprod") {
                out.push(Backend::NeonDotprod);
            }
        }
        #[cfg(feature = "simd")]
        out.push(Backend::Wide);
        out
    }

    /// Returns the kernel entry point for this backend.
    ///
    /// Arch-specific entries are sound to call only after the matching
    /// capability probe succeeded; `detect` and `available` guarantee that.
    pub(crate) fn kernel(self) -> CorrelationFn {
        match self {
            Backend::Scalar => scalar::cross_correlation,
            #[cfg(target_arch = "x86_64")]
            Backend::Sse41 => x86::cross_correlation_sse41,
            #[cfg(target_arch = "x86_64")]
            Backend::Avx2 => x86::cross_correlation_avx2,
            #[cfg(target_arch = "aarch64")]
            Backend::Neon => neon::cross_correlation_neon,
            #[cfg(target_arch = "aarch64")]
            Backend::NeonDotprod => neon::cross_correlation_neon_dotprod,
            #[cfg(feature = "simd")]
            Backend::Wide => simd::cross_correlation_wide,
        }
    }

    /// Evaluates the kernel through this specific backend.
    ///
    /// Intended for equivalence tests and benchmarks; production call sites
    /// go through [`cross_correlation`], which binds the probed backend once.
    #[allow(clippy::too_many_arguments)]
    pub fn compute(
        self,
        frame_a: ImageView<'_, u8>,
        x1: usize,
        y1: usize,
        frame_b: ImageView<'_, u8>,
        x2: usize,
        y2: usize,
        match_sz: u8,
    ) -> f64 {
        debug_assert!(is_valid_match_sz(match_sz));
        (self.kernel())(frame_a, x1, y1, frame_b, x2, y2, match_sz)
    }
}

static SELECTED: OnceLock<(Backend, CorrelationFn)> = OnceLock::new();

#[inline]
fn selected() -> (Backend, CorrelationFn) {
    *SELECTED.get_or_init(|| {
        let backend = Backend::detect();
        (backend, backend.kernel())
    })
}

/// Returns the process-wide backend, probing capability on first use.
pub fn selected_backend() -> Backend {
    selected().0
}

/// Computes the normalized cross-correlation of two `match_sz` windows.
///
/// Windows are centered at `(x1, y1)` in `frame_a` and `(x2, y2)` in
/// `frame_b`; both centers must admit a full window and `match_sz` must be
/// odd and within 3..=15 (the matcher enforces both). The score is close to
/// 0 for uncorrelated content and close to 1 for linearly related content;
/// constant windows yield [`DEGENERATE_SCORE`]. The call dispatches through
/// the backend bound at first use and is bit-identical across backends.
#[allow(clippy::too_many_arguments)]
pub fn cross_correlation(
    frame_a: ImageView<'_, u8>,
    x1: usize,
    y1: usize,
    frame_b: ImageView<'_, u8>,
    x2: usize,
    y2: usize,
    match_sz: u8,
) -> f64 {
    debug_assert!(is_valid_match_sz(match_sz));
    debug_assert!(frame_a.contains_window(x1, y1, usize::from(match_sz) / 2));
    debug_assert!(frame_b.contains_window(x2, y2, usize::from(match_sz) / 2));
    (selected().1)(frame_a, x1, y1, frame_b, x2, y2, match_sz)
}
