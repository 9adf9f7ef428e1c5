//! Boundary model: named polygons described by latitude/longitude vertex rings.
//!
//! A [`RegionSet`] is built once from boundary input (see [`kml`]) and stays
//! immutable for the duration of a sampling run. Insertion order is preserved;
//! the orchestrator processes regions in that order.
pub mod kml;

use crate::error::{Error, Result};

/// A geographic position stored latitude-first.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "(f64, f64)", into = "(f64, f64)")
)]
pub struct Vertex {
    /// Degrees north, expected in [-90, 90].
    pub latitude: f64,
    /// Degrees east, expected in [-180, 180].
    pub longitude: f64,
}

impl Vertex {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

impl From<(f64, f64)> for Vertex {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self::new(latitude, longitude)
    }
}

impl From<Vertex> for (f64, f64) {
    fn from(v: Vertex) -> Self {
        (v.latitude, v.longitude)
    }
}

/// Open polygon boundary with at least three vertices.
///
/// The first vertex is not repeated at the end; consumers close the ring
/// implicitly. Self-intersecting rings are not supported.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "Vec<Vertex>", into = "Vec<Vertex>")
)]
pub struct Ring {
    vertices: Vec<Vertex>,
}

impl Ring {
    /// Minimum number of distinct vertices in a ring.
    pub const MIN_VERTICES: usize = 3;

    /// Builds a ring, dropping repeated consecutive vertices and a closing
    /// vertex that repeats the first one.
    pub fn new(mut vertices: Vec<Vertex>) -> Result<Self> {
        if let Some(bad) = vertices.iter().find(|v| !v.is_finite()) {
            return Err(Error::Parse(format!(
                "non-finite vertex ({}, {})",
                bad.latitude, bad.longitude
            )));
        }

        vertices.dedup();
        if vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }

        let distinct = distinct_count(&vertices);
        if distinct < Self::MIN_VERTICES {
            return Err(Error::Parse(format!(
                "ring needs at least {} distinct vertices, got {}",
                Self::MIN_VERTICES,
                distinct
            )));
        }

        Ok(Self { vertices })
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Always false for a constructed ring; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

fn distinct_count(vertices: &[Vertex]) -> usize {
    let mut sorted = vertices.to_vec();
    sorted.sort_by(|a, b| {
        a.latitude
            .total_cmp(&b.latitude)
            .then(a.longitude.total_cmp(&b.longitude))
    });
    sorted.dedup();
    sorted.len()
}

impl TryFrom<Vec<Vertex>> for Ring {
    type Error = Error;

    fn try_from(vertices: Vec<Vertex>) -> Result<Self> {
        Ring::new(vertices)
    }
}

impl From<Ring> for Vec<Vertex> {
    fn from(ring: Ring) -> Self {
        ring.vertices
    }
}

/// A named polygon within a boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub name: String,
    pub ring: Ring,
}

impl Region {
    pub fn new(name: impl Into<String>, ring: Ring) -> Self {
        Self {
            name: name.into(),
            ring,
        }
    }
}

/// Ordered collection of uniquely named regions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionSet {
    regions: Vec<Region>,
}

impl RegionSet {
    pub fn new() -> Self {
        Self {
            regions: Vec::new(),
        }
    }

    /// Builds a set from rings, naming them `polygon_0`, `polygon_1`, ...
    pub fn from_rings(rings: impl IntoIterator<Item = Ring>) -> Self {
        let regions = rings
            .into_iter()
            .enumerate()
            .map(|(idx, ring)| Region::new(format!("polygon_{idx}"), ring))
            .collect();
        Self { regions }
    }

    /// Appends a region. Names must be unique.
    pub fn insert(&mut self, region: Region) -> Result<()> {
        if self.contains(&region.name) {
            return Err(Error::DuplicateRegion { name: region.name });
        }
        self.regions.push(region);
        Ok(())
    }

    /// Builder-style variant of [`RegionSet::insert`].
    pub fn with_region(mut self, name: impl Into<String>, ring: Ring) -> Result<Self> {
        self.insert(Region::new(name, ring))?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Region> {
        self.regions.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.regions.iter().map(|r| r.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.regions.iter().map(|r| r.ring.len()).sum()
    }

    /// All boundary vertices in region order with a running index.
    ///
    /// Useful as a debug dump to check that every vertex of the input was picked up.
    pub fn vertex_rows(&self) -> impl Iterator<Item = (usize, f64, f64)> + '_ {
        self.regions
            .iter()
            .flat_map(|r| r.ring.vertices().iter())
            .enumerate()
            .map(|(idx, v)| (idx, v.latitude, v.longitude))
    }
}

impl<'a> IntoIterator for &'a RegionSet {
    type Item = &'a Region;
    type IntoIter = std::slice::Iter<'a, Region>;

    fn into_iter(self) -> Self::IntoIter {
        self.regions.iter()
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use std::fmt;

    use serde::de::{self, MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::{Region, RegionSet, Ring};

    impl Serialize for RegionSet {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut map = serializer.serialize_map(Some(self.len()))?;
            for region in self {
                map.serialize_entry(&region.name, &region.ring)?;
            }
            map.end()
        }
    }

    struct RegionSetVisitor;

    impl<'de> Visitor<'de> for RegionSetVisitor {
        type Value = RegionSet;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map from region name to a list of [latitude, longitude] pairs")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<RegionSet, A::Error> {
            let mut set = RegionSet::new();
            while let Some((name, ring)) = access.next_entry::<String, Ring>()? {
                set.insert(Region::new(name, ring))
                    .map_err(de::Error::custom)?;
            }
            Ok(set)
        }
    }

    impl<'de> Deserialize<'de> for RegionSet {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            deserializer.deserialize_map(RegionSetVisitor)
        }
    }
}
