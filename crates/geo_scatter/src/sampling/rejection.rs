//! Bounding-box rejection sampling inside a polygon.
//!
//! Candidates are drawn uniformly in the polygon's longitude/latitude bounding
//! box and kept on the first containment hit. Containment is boundary
//! exclusive (`geo::Contains`), so candidates exactly on an edge are rejected.
//! For thin polygons the expected number of draws per point grows with
//! bbox area / polygon area, which is why each point has an attempts ceiling.
use geo::{Contains, Coord, Point, Polygon};
use rand::RngCore;
use tracing::warn;

use crate::boundary::Region;
use crate::error::{Error, Result};
use crate::geodesy;
use crate::sampling::{rand01, SamplePoint};

pub const DEFAULT_MAX_ATTEMPTS_PER_POINT: u64 = 1_000_000;

/// Rejection sampler with a per-point attempts ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RejectionSampler {
    /// Candidate draws allowed for a single accepted point.
    pub max_attempts_per_point: u64,
}

impl Default for RejectionSampler {
    fn default() -> Self {
        Self {
            max_attempts_per_point: DEFAULT_MAX_ATTEMPTS_PER_POINT,
        }
    }
}

impl RejectionSampler {
    pub fn new(max_attempts_per_point: u64) -> Self {
        Self {
            max_attempts_per_point,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts_per_point == 0 {
            return Err(Error::InvalidConfig(
                "max_attempts_per_point must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Draws `count` points inside `region`.
    ///
    /// Returns [`Error::SamplingTimeout`] naming the region if any single point
    /// needs more than `max_attempts_per_point` candidates. A zero `count`
    /// returns immediately without drawing from `rng`.
    pub fn sample<R: RngCore>(
        &self,
        region: &Region,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<SamplePoint>> {
        self.sample_counted(region, count, rng).map(|(points, _)| points)
    }

    /// Like [`RejectionSampler::sample`], also returning the number of rejected candidates.
    pub(crate) fn sample_counted<R: RngCore>(
        &self,
        region: &Region,
        count: usize,
        rng: &mut R,
    ) -> Result<(Vec<SamplePoint>, u64)> {
        if count == 0 {
            return Ok((Vec::new(), 0));
        }
        let mut points = self.points(region, rng)?;
        let out = points
            .by_ref()
            .take(count)
            .collect::<Result<Vec<SamplePoint>>>()?;
        Ok((out, points.rejected()))
    }

    /// Lazy, unbounded sequence of points inside `region`.
    ///
    /// The bounding box is computed once here. Each call starts a fresh
    /// sequence; with identically seeded generators two sequences are equal.
    /// After a timeout the iterator yields the error once and then ends.
    pub fn points<'a, R: RngCore>(
        &self,
        region: &'a Region,
        rng: &'a mut R,
    ) -> Result<PolygonPoints<'a, R>> {
        self.validate()?;
        let polygon = geodesy::to_polygon(&region.ring);
        let rect = geodesy::polygon_bounds(&polygon).ok_or_else(|| {
            Error::DegenerateInput(format!("region '{}' has no bounding box", region.name))
        })?;

        Ok(PolygonPoints {
            region: &region.name,
            polygon,
            min: rect.min(),
            extent: Coord {
                x: rect.width(),
                y: rect.height(),
            },
            rng,
            max_attempts: self.max_attempts_per_point,
            accepted: 0,
            rejected: 0,
            exhausted: false,
        })
    }
}

/// Iterator over uniformly distributed points inside one polygon.
pub struct PolygonPoints<'a, R: RngCore> {
    region: &'a str,
    polygon: Polygon<f64>,
    min: Coord<f64>,
    extent: Coord<f64>,
    rng: &'a mut R,
    max_attempts: u64,
    accepted: u64,
    rejected: u64,
    exhausted: bool,
}

impl<R: RngCore> PolygonPoints<'_, R> {
    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    #[inline]
    fn candidate(&mut self) -> Point<f64> {
        let x = self.min.x + rand01(&mut *self.rng) * self.extent.x;
        let y = self.min.y + rand01(&mut *self.rng) * self.extent.y;
        Point::new(x, y)
    }
}

impl<R: RngCore> Iterator for PolygonPoints<'_, R> {
    type Item = Result<SamplePoint>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }

        for _ in 0..self.max_attempts {
            let p = self.candidate();
            if self.polygon.contains(&p) {
                self.accepted += 1;
                return Some(Ok(SamplePoint::new(p.y(), p.x())));
            }
            self.rejected += 1;
        }

        self.exhausted = true;
        warn!(
            "Region '{}': no point accepted after {} attempts ({} points accepted so far).",
            self.region, self.max_attempts, self.accepted
        );
        Some(Err(Error::SamplingTimeout {
            region: self.region.to_string(),
            attempts: self.max_attempts,
        }))
    }
}
