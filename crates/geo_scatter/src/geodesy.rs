//! Adapters between the latitude-first boundary model and `geo` primitives.
//!
//! `geo` treats `x` as longitude and `y` as latitude. [`to_polygon`] is the only
//! place where [`Ring`] vertices are swapped into that order; everything that
//! needs a `geo` geometry goes through it. Getting the order wrong still yields a
//! plausible-looking but different geodesic area.
use geo::{BoundingRect, Coord, GeodesicArea, LineString, Polygon, Rect};

use crate::boundary::Ring;

/// Converts a ring to a `geo` polygon with `x = longitude`, `y = latitude`.
pub fn to_polygon(ring: &Ring) -> Polygon<f64> {
    let exterior: LineString<f64> = ring
        .vertices()
        .iter()
        .map(|v| Coord {
            x: v.longitude,
            y: v.latitude,
        })
        .collect();
    Polygon::new(exterior, Vec::new())
}

/// Unsigned surface area of the ring on the WGS84 ellipsoid in square meters.
pub fn geodesic_area(ring: &Ring) -> f64 {
    polygon_area(&to_polygon(ring))
}

/// Unsigned area regardless of ring winding.
///
/// `geodesic_area_unsigned` assumes a counter-clockwise exterior and reports the
/// complement of the globe for clockwise rings. The signed area stays within half
/// the ellipsoid, so its magnitude is the enclosed area either way.
#[inline]
pub(crate) fn polygon_area(polygon: &Polygon<f64>) -> f64 {
    polygon.geodesic_area_signed().abs()
}

/// Axis-aligned bounds of the ring as `(min_x, min_y, max_x, max_y)`,
/// i.e. `(min_lon, min_lat, max_lon, max_lat)`.
pub fn bounds(ring: &Ring) -> (f64, f64, f64, f64) {
    // A constructed ring always has vertices, so the rect exists.
    let rect = polygon_bounds(&to_polygon(ring)).unwrap_or_else(|| {
        let v = ring.vertices()[0];
        Rect::new(
            Coord {
                x: v.longitude,
                y: v.latitude,
            },
            Coord {
                x: v.longitude,
                y: v.latitude,
            },
        )
    });
    (rect.min().x, rect.min().y, rect.max().x, rect.max().y)
}

#[inline]
pub(crate) fn polygon_bounds(polygon: &Polygon<f64>) -> Option<Rect<f64>> {
    polygon.bounding_rect()
}
