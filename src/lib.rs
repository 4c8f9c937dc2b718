//! Corner matching for global-motion estimation.
//!
//! Given two 8-bit grayscale frames and corner lists detected independently
//! in each, this crate scores candidate pairs with normalized
//! cross-correlation and emits a correspondence set for a downstream
//! motion-model fitter. The scalar kernel defines the exact numeric
//! semantics; accelerated backends (SSE4.1/AVX2 on x86_64, NEON and
//! NEON-dotprod on aarch64, a portable `wide` variant behind the `simd`
//! feature) are bound once at first use and reproduce the scalar result bit
//! for bit. The `rayon` feature parallelizes matching over reference
//! corners without changing the output.

pub mod image;
pub mod kernel;
pub mod matcher;
mod trace;
pub mod util;

pub use image::{ImageView, OwnedImage};
pub use kernel::{
    cross_correlation, selected_backend, Backend, DEGENERATE_SCORE, MAX_MATCH_SZ, MIN_MATCH_SZ,
};
pub use matcher::{Corner, CornerMatcher, Correspondence, MatchConfig};
pub use util::{CornerMatchError, CornerMatchResult};

#[cfg(feature = "image-io")]
pub use image::io;
