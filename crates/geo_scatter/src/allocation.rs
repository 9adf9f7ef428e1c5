//! Area-weighted distribution of a point budget across regions.
//!
//! [`allocate`] floors each region's proportional share and then hands the
//! points lost to flooring (the residual) out according to a [`ResidualPolicy`],
//! so the resulting [`AllocationPlan`] always sums to the requested total.
use rand::RngCore;
use tracing::{debug, info};

use crate::boundary::RegionSet;
use crate::error::{Error, Result};
use crate::geodesy;
use crate::sampling::pick_index;

/// Geodesic area per region in square meters, in region order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AreaTable {
    entries: Vec<(String, f64)>,
}

impl AreaTable {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Computes the WGS84 geodesic area of every region in `regions`.
    pub fn from_regions(regions: &RegionSet) -> Self {
        let entries = regions
            .iter()
            .map(|region| {
                let area = geodesy::geodesic_area(&region.ring);
                info!(
                    "Polygon {}, with {} coordinates, has area {:.2} km^2.",
                    region.name,
                    region.ring.len(),
                    area * 1e-6
                );
                (region.name.clone(), area)
            })
            .collect();
        Self { entries }
    }

    /// Appends an entry; builder style for hand-made tables.
    pub fn with_area(mut self, name: impl Into<String>, area: f64) -> Self {
        self.entries.push((name.into(), area));
        self
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, a)| *a)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(n, a)| (n.as_str(), *a))
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, a)| a).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Integer point count per region, in region order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllocationPlan {
    entries: Vec<(String, usize)>,
}

impl AllocationPlan {
    pub fn get(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| *c)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(n, c)| (n.as_str(), *c))
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, c)| c).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// How points lost to flooring are handed out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResidualPolicy {
    /// The whole residual goes to a single region drawn uniformly at random.
    #[default]
    RandomRegion,
    /// One extra point each to the regions with the largest fractional shares.
    /// Ties go to the earlier region. Draws nothing from the random source.
    LargestRemainder,
}

/// Splits `total_points` across the regions of `areas` proportionally to area.
///
/// Fails with [`Error::DegenerateInput`] when the table is empty, holds a
/// negative or non-finite area, or sums to zero. With
/// [`ResidualPolicy::RandomRegion`] exactly one value is drawn from `rng`.
pub fn allocate<R: RngCore>(
    areas: &AreaTable,
    total_points: usize,
    policy: ResidualPolicy,
    rng: &mut R,
) -> Result<AllocationPlan> {
    let total_area = validated_total(areas)?;

    let shares: Vec<f64> = areas
        .iter()
        .map(|(_, area)| total_points as f64 * (area / total_area))
        .collect();
    let mut counts = floored_counts(&shares, total_points);
    let assigned: usize = counts.iter().sum();
    let residual = total_points - assigned;

    match policy {
        ResidualPolicy::RandomRegion => {
            let idx = pick_index(counts.len(), rng);
            counts[idx] += residual;
            debug!(
                "Residual of {} points assigned to {}.",
                residual, areas.entries[idx].0
            );
        }
        ResidualPolicy::LargestRemainder => {
            let mut order: Vec<usize> = (0..counts.len()).collect();
            order.sort_by(|&a, &b| {
                let fa = shares[a] - shares[a].floor();
                let fb = shares[b] - shares[b].floor();
                fb.total_cmp(&fa)
            });
            for &idx in order.iter().cycle().take(residual) {
                counts[idx] += 1;
            }
            debug!("Residual of {} points spread by largest remainder.", residual);
        }
    }

    let entries: Vec<(String, usize)> = areas
        .entries
        .iter()
        .zip(counts)
        .map(|((name, _), count)| (name.clone(), count))
        .collect();
    for (name, count) in &entries {
        info!("For polygon {}, {} points to be generated.", name, count);
    }

    let plan = AllocationPlan { entries };
    debug_assert_eq!(plan.total(), total_points);
    Ok(plan)
}

/// Floors each share, clamped so the counts never sum past `total_points`.
///
/// Summed in `u128`: near `usize::MAX` the floored shares can round up and
/// their plain sum would overflow.
fn floored_counts(shares: &[f64], total_points: usize) -> Vec<usize> {
    let target = total_points as u128;
    let mut counts: Vec<u128> = shares
        .iter()
        .map(|s| (s.floor() as u128).min(target))
        .collect();

    // Float rounding can push floored shares past the total; take the excess back.
    let mut assigned: u128 = counts.iter().sum();
    for c in counts.iter_mut().rev() {
        if assigned <= target {
            break;
        }
        let take = (assigned - target).min(*c);
        *c -= take;
        assigned -= take;
    }

    // Every count is now <= total_points and so fits in usize.
    counts.into_iter().map(|c| c as usize).collect()
}

fn validated_total(areas: &AreaTable) -> Result<f64> {
    if areas.is_empty() {
        return Err(Error::DegenerateInput("no regions to allocate to".into()));
    }
    if let Some((name, area)) = areas.iter().find(|(_, a)| !a.is_finite() || *a < 0.0) {
        return Err(Error::DegenerateInput(format!(
            "region '{name}' has invalid area {area}"
        )));
    }
    let total = areas.total();
    if !total.is_finite() || total <= 0.0 {
        return Err(Error::DegenerateInput(format!(
            "total area must be > 0, got {total}"
        )));
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    struct FixedRng {
        value: u64,
    }

    impl RngCore for FixedRng {
        fn next_u32(&mut self) -> u32 {
            (self.value >> 32) as u32
        }

        fn next_u64(&mut self) -> u64 {
            self.value
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            let bytes = self.value.to_le_bytes();
            for (i, b) in dest.iter_mut().enumerate() {
                *b = bytes[i % 8];
            }
        }
    }

    fn three_regions() -> AreaTable {
        AreaTable::new()
            .with_area("a", 1.0)
            .with_area("b", 1.0)
            .with_area("c", 1.0)
    }

    #[test]
    fn counts_sum_to_total_for_many_budgets() {
        let table = AreaTable::new()
            .with_area("a", 3.7)
            .with_area("b", 0.01)
            .with_area("c", 12.9)
            .with_area("d", 0.0)
            .with_area("e", 1e-9);
        let mut rng = StdRng::seed_from_u64(5);
        for total in [0, 1, 2, 7, 99, 1000, 12_345, 1_000_003] {
            for policy in [ResidualPolicy::RandomRegion, ResidualPolicy::LargestRemainder] {
                let plan = allocate(&table, total, policy, &mut rng).unwrap();
                assert_eq!(plan.total(), total, "total {total} policy {policy:?}");
                assert_eq!(plan.len(), table.len());
            }
        }
    }

    #[test]
    fn single_region_gets_everything() {
        let table = AreaTable::new().with_area("only", 0.123);
        let mut rng = StdRng::seed_from_u64(1);
        for total in [0, 1, 17, 500_000] {
            let plan = allocate(&table, total, ResidualPolicy::RandomRegion, &mut rng).unwrap();
            assert_eq!(plan.get("only"), Some(total));
        }
    }

    #[test]
    fn zero_total_area_is_degenerate() {
        let table = AreaTable::new().with_area("a", 0.0).with_area("b", 0.0);
        let mut rng = StdRng::seed_from_u64(1);
        let err = allocate(&table, 10, ResidualPolicy::RandomRegion, &mut rng).unwrap_err();
        assert!(matches!(err, Error::DegenerateInput(_)));
    }

    #[test]
    fn empty_and_invalid_tables_are_degenerate() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            allocate(&AreaTable::new(), 10, ResidualPolicy::RandomRegion, &mut rng),
            Err(Error::DegenerateInput(_))
        ));
        let negative = AreaTable::new().with_area("a", 2.0).with_area("b", -1.0);
        assert!(matches!(
            allocate(&negative, 10, ResidualPolicy::RandomRegion, &mut rng),
            Err(Error::DegenerateInput(_))
        ));
        let nan = AreaTable::new().with_area("a", f64::NAN);
        assert!(matches!(
            allocate(&nan, 10, ResidualPolicy::RandomRegion, &mut rng),
            Err(Error::DegenerateInput(_))
        ));
    }

    #[test]
    fn zero_points_yields_zero_counts() {
        let mut rng = StdRng::seed_from_u64(3);
        let plan = allocate(&three_regions(), 0, ResidualPolicy::RandomRegion, &mut rng).unwrap();
        assert!(plan.iter().all(|(_, c)| c == 0));
    }

    #[test]
    fn random_region_residual_goes_to_drawn_region() {
        // 10 / 3 floors to 3 each, residual 1.
        let mut first = FixedRng { value: 0 };
        let plan =
            allocate(&three_regions(), 10, ResidualPolicy::RandomRegion, &mut first).unwrap();
        assert_eq!(plan.get("a"), Some(4));
        assert_eq!(plan.get("b"), Some(3));
        assert_eq!(plan.get("c"), Some(3));

        let mut last = FixedRng { value: u64::MAX };
        let plan =
            allocate(&three_regions(), 10, ResidualPolicy::RandomRegion, &mut last).unwrap();
        assert_eq!(plan.get("c"), Some(4));
    }

    #[test]
    fn largest_remainder_prefers_biggest_fractions() {
        // Shares: 4.5, 3.3, 2.2 -> floors 4, 3, 2 with residual 1 going to "a".
        let table = AreaTable::new()
            .with_area("a", 45.0)
            .with_area("b", 33.0)
            .with_area("c", 22.0);
        let mut rng = FixedRng { value: u64::MAX };
        let plan = allocate(&table, 10, ResidualPolicy::LargestRemainder, &mut rng).unwrap();
        assert_eq!(plan.get("a"), Some(5));
        assert_eq!(plan.get("b"), Some(3));
        assert_eq!(plan.get("c"), Some(2));
    }

    #[test]
    fn largest_remainder_breaks_ties_by_order() {
        let mut rng = StdRng::seed_from_u64(0);
        let plan =
            allocate(&three_regions(), 11, ResidualPolicy::LargestRemainder, &mut rng).unwrap();
        let counts: Vec<_> = plan.iter().map(|(_, c)| c).collect();
        assert_eq!(counts, vec![4, 4, 3]);
    }

    fn ring(points: &[(f64, f64)]) -> crate::boundary::Ring {
        crate::boundary::Ring::new(points.iter().copied().map(Into::into).collect()).unwrap()
    }

    #[test]
    fn square_and_sliver_split_follows_floor_formula() {
        let ccw = ring(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)]);
        let cw = ring(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
        let sliver = ring(&[(0.0, 0.0), (0.0, 1e-5), (1e-5, 0.0)]);

        for square in [ccw, cw] {
            let set = RegionSet::new()
                .with_region("square", square)
                .and_then(|s| s.with_region("sliver", sliver.clone()))
                .unwrap();
            let table = AreaTable::from_regions(&set);
            let a_square = table.get("square").unwrap();
            let a_sliver = table.get("sliver").unwrap();
            // ~1.23e12 m^2 against well under 1 km^2
            assert!(a_square > 1.2e12 && a_square < 1.3e12, "square = {a_square}");
            assert!(a_sliver < 1e6, "sliver = {a_sliver}");

            let total = 1000usize;
            let whole = a_square + a_sliver;
            let floor_square = (total as f64 * (a_square / whole)).floor() as usize;
            let floor_sliver = (total as f64 * (a_sliver / whole)).floor() as usize;
            assert_eq!((floor_square, floor_sliver), (999, 0));

            // First region drawn for the residual.
            let mut rng = FixedRng { value: 0 };
            let plan = allocate(&table, total, ResidualPolicy::RandomRegion, &mut rng).unwrap();
            assert_eq!(plan.get("square"), Some(floor_square + 1));
            assert_eq!(plan.get("sliver"), Some(floor_sliver));

            // Second region drawn: the sliver absorbs the single leftover point.
            let mut rng = FixedRng { value: u64::MAX };
            let plan = allocate(&table, total, ResidualPolicy::RandomRegion, &mut rng).unwrap();
            assert_eq!(plan.get("square"), Some(floor_square));
            assert_eq!(plan.get("sliver"), Some(floor_sliver + 1));
        }
    }

    #[test]
    fn budget_near_usize_max_does_not_overflow() {
        let table = AreaTable::new().with_area("a", 1.0).with_area("b", 1.0);
        for policy in [ResidualPolicy::RandomRegion, ResidualPolicy::LargestRemainder] {
            let mut rng = StdRng::seed_from_u64(9);
            let plan = allocate(&table, usize::MAX, policy, &mut rng).unwrap();
            assert_eq!(plan.total(), usize::MAX, "policy {policy:?}");
        }
    }

    #[test]
    fn area_table_from_regions_keeps_order() {
        use crate::boundary::{Ring, Vertex};
        let ring = |lat: f64| {
            Ring::new(vec![
                Vertex::new(lat, 0.0),
                Vertex::new(lat, 1.0),
                Vertex::new(lat + 1.0, 1.0),
                Vertex::new(lat + 1.0, 0.0),
            ])
            .unwrap()
        };
        let set = RegionSet::new()
            .with_region("north", ring(60.0))
            .and_then(|s| s.with_region("equator", ring(0.0)))
            .unwrap();
        let table = AreaTable::from_regions(&set);
        let names: Vec<_> = table.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["north", "equator"]);
        assert!(table.get("north").unwrap() < table.get("equator").unwrap());
    }
}
