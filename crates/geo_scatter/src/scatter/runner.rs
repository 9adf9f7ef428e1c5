//! High-level runner that turns a region set and a point budget into samples.
//!
//! A run computes the geodesic [`AreaTable`], splits the budget with
//! [`allocate`], then samples each region in set order with the
//! [`RejectionSampler`]. The first error aborts the whole run; a partial
//! [`SampleSet`] is never returned.
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::{info, warn};

use crate::allocation::{allocate, AllocationPlan, AreaTable, ResidualPolicy};
use crate::boundary::RegionSet;
use crate::error::{Error, Result};
use crate::sampling::{RejectionSampler, SamplePoint, DEFAULT_MAX_ATTEMPTS_PER_POINT};
use crate::scatter::events::{EventSink, ScatterEvent, ScatterEventKind};
use crate::scatter::seed::{seed_for_allocation, seed_for_region};

/// Configuration for a sampling run.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SampleConfig {
    /// Number of points to generate across all regions.
    pub total_points: usize,
    /// Candidate draws allowed for a single accepted point.
    pub max_attempts_per_point: u64,
    /// How points lost to flooring are handed out.
    pub residual_policy: ResidualPolicy,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            total_points: 0,
            max_attempts_per_point: DEFAULT_MAX_ATTEMPTS_PER_POINT,
            residual_policy: ResidualPolicy::RandomRegion,
        }
    }
}

impl SampleConfig {
    /// Creates a new [`SampleConfig`] requesting `total_points` points.
    pub fn new(total_points: usize) -> Self {
        Self {
            total_points,
            ..Default::default()
        }
    }

    /// Sets the per-point attempts ceiling.
    pub fn with_max_attempts_per_point(mut self, max_attempts_per_point: u64) -> Self {
        self.max_attempts_per_point = max_attempts_per_point;
        self
    }

    /// Sets the residual policy.
    pub fn with_residual_policy(mut self, residual_policy: ResidualPolicy) -> Self {
        self.residual_policy = residual_policy;
        self
    }

    /// Validates the configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        self.sampler().validate()
    }

    pub fn sampler(&self) -> RejectionSampler {
        RejectionSampler::new(self.max_attempts_per_point)
    }
}

/// A generated point tagged with the region it was drawn from.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sample {
    pub region: String,
    pub point: SamplePoint,
}

/// Result of a sampling run.
#[non_exhaustive]
#[derive(Debug, Clone, Default)]
pub struct SampleSet {
    /// Samples in region order, then generation order.
    pub samples: Vec<Sample>,
    /// Areas the budget was split by.
    pub areas: AreaTable,
    /// Points allocated per region.
    pub plan: AllocationPlan,
    /// Total candidates rejected by the sampler.
    pub candidates_rejected: u64,
}

impl SampleSet {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    /// Points drawn from one region, in generation order.
    pub fn points_in<'a>(&'a self, region: &'a str) -> impl Iterator<Item = SamplePoint> + 'a {
        self.samples
            .iter()
            .filter(move |s| s.region == region)
            .map(|s| s.point)
    }

    /// Flat `(index, latitude, longitude)` rows across all regions.
    pub fn rows(&self) -> impl Iterator<Item = (usize, f64, f64)> + '_ {
        self.samples
            .iter()
            .enumerate()
            .map(|(idx, s)| (idx, s.point.latitude, s.point.longitude))
    }
}

/// Runner bound to a validated [`SampleConfig`].
#[derive(Debug, Clone)]
pub struct SamplingRunner {
    /// Run configuration applied to this runner.
    pub config: SampleConfig,
}

impl SamplingRunner {
    pub fn try_new(config: SampleConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Runs over `regions` drawing from a shared random source.
    pub fn run(&self, regions: &RegionSet, rng: &mut impl RngCore) -> Result<SampleSet> {
        run(regions, &self.config, rng)
    }

    pub fn run_with_events(
        &self,
        regions: &RegionSet,
        rng: &mut impl RngCore,
        sink: &mut dyn EventSink,
    ) -> Result<SampleSet> {
        run_with_events(regions, &self.config, rng, sink)
    }

    /// Runs with one independent stream per region derived from `seed`.
    pub fn run_seeded(&self, regions: &RegionSet, seed: u64) -> Result<SampleSet> {
        run_seeded(regions, &self.config, seed, None)
    }
}

/// Samples `config.total_points` points across `regions` using `rng`.
pub fn run<R: RngCore>(
    regions: &RegionSet,
    config: &SampleConfig,
    rng: &mut R,
) -> Result<SampleSet> {
    run_internal(regions, config, RngSource::Shared(rng), &mut ())
}

pub fn run_with_events<R: RngCore>(
    regions: &RegionSet,
    config: &SampleConfig,
    rng: &mut R,
    sink: &mut dyn EventSink,
) -> Result<SampleSet> {
    run_internal(regions, config, RngSource::Shared(rng), sink)
}

/// Samples with per-region random streams derived from `seed`.
///
/// Each region's points depend only on `seed` and the region's position in
/// the set, not on how many candidates other regions rejected.
pub fn run_seeded(
    regions: &RegionSet,
    config: &SampleConfig,
    seed: u64,
    sink: Option<&mut dyn EventSink>,
) -> Result<SampleSet> {
    let source: RngSource<'_, StdRng> = RngSource::PerRegion(seed);
    if let Some(s) = sink {
        run_internal(regions, config, source, s)
    } else {
        run_internal(regions, config, source, &mut ())
    }
}

enum RngSource<'a, R: RngCore> {
    Shared(&'a mut R),
    PerRegion(u64),
}

fn run_internal<R: RngCore>(
    regions: &RegionSet,
    config: &SampleConfig,
    mut source: RngSource<'_, R>,
    sink: &mut dyn EventSink,
) -> Result<SampleSet> {
    config.validate()?;
    if regions.is_empty() {
        return Err(Error::DegenerateInput("region set is empty".into()));
    }

    info!("{} polygons found.", regions.len());
    if sink.wants(ScatterEventKind::RunStarted) {
        sink.send(ScatterEvent::RunStarted {
            config: config.clone(),
            region_count: regions.len(),
        });
    }

    let areas = AreaTable::from_regions(regions);
    for (region, (_, area)) in regions.iter().zip(areas.iter()) {
        if sink.wants(ScatterEventKind::AreaComputed) {
            sink.send(ScatterEvent::AreaComputed {
                region: region.name.clone(),
                vertices: region.ring.len(),
                area_m2: area,
            });
        }
        if area <= 0.0 {
            warn!("Region '{}' has zero area.", region.name);
            emit_warning(sink, &region.name, "Region has zero area");
        }
    }

    let plan = match &mut source {
        RngSource::Shared(rng) => {
            allocate(&areas, config.total_points, config.residual_policy, &mut **rng)?
        }
        RngSource::PerRegion(seed) => {
            let mut rng = StdRng::seed_from_u64(seed_for_allocation(*seed));
            allocate(&areas, config.total_points, config.residual_policy, &mut rng)?
        }
    };
    if sink.wants(ScatterEventKind::AllocationPlanned) {
        sink.send(ScatterEvent::AllocationPlanned { plan: plan.clone() });
    }

    let sampler = config.sampler();
    let mut samples: Vec<Sample> = Vec::new();
    samples.try_reserve_exact(config.total_points).map_err(|_| {
        Error::InvalidConfig(format!(
            "cannot hold {} samples in memory",
            config.total_points
        ))
    })?;
    let mut total_rejected = 0u64;

    for (idx, (region, (_, count))) in regions.iter().zip(plan.iter()).enumerate() {
        if count == 0 && config.total_points > 0 {
            emit_warning(sink, &region.name, "Region receives no points");
        }

        let (points, rejected) = match &mut source {
            RngSource::Shared(rng) => sampler.sample_counted(region, count, &mut **rng)?,
            RngSource::PerRegion(seed) => {
                let mut rng = StdRng::seed_from_u64(seed_for_region(*seed, idx));
                sampler.sample_counted(region, count, &mut rng)?
            }
        };
        total_rejected += rejected;

        if sink.wants(ScatterEventKind::RegionSampled) {
            sink.send(ScatterEvent::RegionSampled {
                index: idx,
                region: region.name.clone(),
                points: points.len(),
                rejected,
            });
        }

        samples.extend(points.into_iter().map(|point| Sample {
            region: region.name.clone(),
            point,
        }));
    }

    info!(
        "Generated {} points ({} candidates rejected).",
        samples.len(),
        total_rejected
    );
    if sink.wants(ScatterEventKind::RunFinished) {
        sink.send(ScatterEvent::RunFinished {
            points: samples.len(),
            rejected: total_rejected,
        });
    }

    Ok(SampleSet {
        samples,
        areas,
        plan,
        candidates_rejected: total_rejected,
    })
}

fn emit_warning(sink: &mut dyn EventSink, context: &str, message: &str) {
    if sink.wants(ScatterEventKind::Warning) {
        sink.send(ScatterEvent::Warning {
            context: format!("region:{context}"),
            message: message.into(),
        });
    }
}
