//! Uniform point generation inside a single polygon.
//!
//! This module holds the sample point type, the random helpers shared with the
//! allocator, and the bounding-box [`RejectionSampler`].
use rand::RngCore;

pub mod rejection;

pub use rejection::{PolygonPoints, RejectionSampler, DEFAULT_MAX_ATTEMPTS_PER_POINT};

/// A generated position, latitude-first like the boundary model.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SamplePoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl SamplePoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Generate a random float in the range [0, 1).
///
/// Uses the top 53 bits of one `next_u64` draw.
#[inline]
pub(crate) fn rand01<R: RngCore + ?Sized>(rng: &mut R) -> f64 {
    (rng.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
}

/// Pick an index in `0..len` uniformly. `len` must be > 0.
#[inline]
pub(crate) fn pick_index<R: RngCore + ?Sized>(len: usize, rng: &mut R) -> usize {
    debug_assert!(len > 0, "pick_index needs a non-empty range");
    ((rand01(rng) * len as f64) as usize).min(len.saturating_sub(1))
}
