use std::time::Duration;

use criterion::{Criterion, Throughput};
use geo_scatter::boundary::{Ring, Vertex};

pub const SAMPLE_SIZE: usize = 20;
pub const WARM_UP: Duration = Duration::from_secs(1);
pub const MEASUREMENT_TIME: Duration = Duration::from_secs(2);

pub fn default_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .sample_size(SAMPLE_SIZE)
        .warm_up_time(WARM_UP)
        .measurement_time(MEASUREMENT_TIME)
}

pub fn elements_throughput(elements: usize) -> Throughput {
    Throughput::Elements(elements.max(1) as u64)
}

/// Regular polygon with `sides` vertices around (`lat`, `lon`).
#[allow(dead_code)]
pub fn regular_ring(lat: f64, lon: f64, radius_deg: f64, sides: usize) -> Ring {
    let vertices = (0..sides)
        .map(|i| {
            let t = i as f64 / sides as f64 * std::f64::consts::TAU;
            Vertex::new(lat + radius_deg * t.sin(), lon + radius_deg * t.cos())
        })
        .collect();
    Ring::new(vertices).expect("regular ring is valid")
}
