#![forbid(unsafe_code)]
//! geo_scatter: area-weighted uniform point sampling inside geographic polygons.
//!
//! Modules:
//! - boundary: vertex rings, named regions, and a KML `<coordinates>` reader
//! - geodesy: WGS84 geodesic area and the lat/lon to `geo` axis conversion
//! - allocation: split a point budget across regions by area with exact totals
//! - sampling: bounding-box rejection sampling with a per-point attempts ceiling
//! - scatter: runner, events, and per-region seeding
pub mod allocation;
pub mod boundary;
pub mod error;
pub mod geodesy;
pub mod sampling;
pub mod scatter;

/// Convenient re-exports for common types. Import with `use geo_scatter::prelude::*;`.
pub mod prelude {
    pub use crate::allocation::{allocate, AllocationPlan, AreaTable, ResidualPolicy};
    pub use crate::boundary::kml::parse_kml;
    pub use crate::boundary::{Region, RegionSet, Ring, Vertex};
    pub use crate::error::{Error, Result};
    pub use crate::geodesy::geodesic_area;
    pub use crate::sampling::{
        PolygonPoints, RejectionSampler, SamplePoint, DEFAULT_MAX_ATTEMPTS_PER_POINT,
    };
    pub use crate::scatter::events::{EventSink, FnSink, ScatterEvent, ScatterEventKind, VecSink};
    pub use crate::scatter::runner::{
        run, run_seeded, run_with_events, Sample, SampleConfig, SampleSet, SamplingRunner,
    };
    pub use crate::scatter::seed::{seed_for_allocation, seed_for_region};
}
