//! Minimal KML boundary reader.
//!
//! Every `<coordinates>` element becomes one region, named `polygon_0`,
//! `polygon_1`, ... in document order. Coordinate tuples are whitespace
//! separated `lon,lat[,alt]` triples; altitude is ignored and the axis order is
//! swapped to the latitude-first [`Vertex`] layout. No other KML structure
//! (placemarks, inner boundaries, styles) is interpreted.
use tracing::{debug, info};

use crate::boundary::{RegionSet, Ring, Vertex};
use crate::error::{Error, Result};

const COORDINATES_TAG: &str = "coordinates";

/// Parses a KML document into a [`RegionSet`].
///
/// Fails with [`Error::Parse`] if the document has no `<coordinates>` element
/// or any element holds a malformed tuple or fewer than three vertices.
pub fn parse_kml(doc: &str) -> Result<RegionSet> {
    let blocks = coordinate_blocks(doc)?;
    if blocks.is_empty() {
        return Err(Error::Parse("no <coordinates> element found".into()));
    }
    if blocks.len() > 1 {
        debug!("Document holds {} coordinate blocks.", blocks.len());
    }

    let mut rings = Vec::with_capacity(blocks.len());
    for (idx, block) in blocks.iter().enumerate() {
        let vertices = parse_coordinate_block(block)
            .map_err(|e| Error::Parse(format!("polygon_{idx}: {e}")))?;
        let ring =
            Ring::new(vertices).map_err(|e| Error::Parse(format!("polygon_{idx}: {e}")))?;
        debug!("Polygon polygon_{}: {} coordinates.", idx, ring.len());
        rings.push(ring);
    }

    let set = RegionSet::from_rings(rings);
    info!(
        "Found {} polygons/disjoint regions ({} coordinates in total).",
        set.len(),
        set.vertex_count()
    );
    Ok(set)
}

/// Parses the text content of one `<coordinates>` element.
pub fn parse_coordinate_block(text: &str) -> Result<Vec<Vertex>> {
    let mut out = Vec::new();
    for token in text.split_whitespace() {
        let mut parts = token.split(',');
        let lon = parse_component(parts.next(), token)?;
        let lat = parse_component(parts.next(), token)?;
        out.push(Vertex::new(lat, lon));
    }
    if out.is_empty() {
        return Err(Error::Parse("empty <coordinates> element".into()));
    }
    Ok(out)
}

fn parse_component(part: Option<&str>, token: &str) -> Result<f64> {
    match part {
        Some(s) if !s.is_empty() => s
            .parse::<f64>()
            .map_err(|_| Error::Parse(format!("invalid number '{s}' in tuple '{token}'"))),
        _ => Err(Error::Parse(format!(
            "tuple '{token}' needs at least longitude and latitude"
        ))),
    }
}

/// Returns the raw text of each `<coordinates>` element in document order.
fn coordinate_blocks(doc: &str) -> Result<Vec<&str>> {
    // ASCII lowercasing keeps byte offsets aligned with `doc`.
    let lower = doc.to_ascii_lowercase();
    let mut blocks = Vec::new();
    let mut pos = 0;

    while let Some(rel) = lower[pos..].find('<') {
        let start = pos + rel;
        if lower[start..].starts_with("<!--") {
            pos = match lower[start..].find("-->") {
                Some(e) => start + e + 3,
                None => return Err(Error::Parse("unterminated comment".into())),
            };
            continue;
        }

        let end = tag_end(&lower, start)?;
        let tag = &lower[start + 1..end];
        pos = end + 1;
        if tag.starts_with(['/', '!', '?']) || tag.ends_with('/') {
            continue;
        }
        if local_name(tag) != COORDINATES_TAG {
            continue;
        }

        let (content_end, after_close) = closing_tag(&lower, pos)?;
        blocks.push(&doc[pos..content_end]);
        pos = after_close;
    }

    Ok(blocks)
}

fn tag_end(lower: &str, start: usize) -> Result<usize> {
    lower[start..]
        .find('>')
        .map(|e| start + e)
        .ok_or_else(|| Error::Parse(format!("unterminated tag at byte {start}")))
}

/// Finds the `</coordinates>` that closes an element opened before `from`.
/// Returns the byte offset where the closing tag starts and the offset just past it.
fn closing_tag(lower: &str, from: usize) -> Result<(usize, usize)> {
    let mut pos = from;
    while let Some(rel) = lower[pos..].find("</") {
        let start = pos + rel;
        let end = tag_end(lower, start)?;
        if local_name(&lower[start + 2..end]) == COORDINATES_TAG {
            return Ok((start, end + 1));
        }
        pos = end + 1;
    }
    Err(Error::Parse("unclosed <coordinates> element".into()))
}

/// Tag name without attributes or namespace prefix.
fn local_name(tag: &str) -> &str {
    let name = tag
        .split(|c: char| c.is_ascii_whitespace())
        .next()
        .unwrap_or("");
    name.rsplit(':').next().unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_POLYGONS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document>
    <!-- <coordinates>not a block</coordinates> -->
    <Placemark>
      <Polygon><outerBoundaryIs><LinearRing>
        <coordinates>
          -79.40,43.65,0 -79.38,43.65,0 -79.38,43.67,0 -79.40,43.67,0 -79.40,43.65,0
        </coordinates>
      </LinearRing></outerBoundaryIs></Polygon>
    </Placemark>
    <Placemark>
      <Polygon><outerBoundaryIs><LinearRing>
        <kml:Coordinates>10,20 11,20 11,21</kml:Coordinates>
      </LinearRing></outerBoundaryIs></Polygon>
    </Placemark>
  </Document>
</kml>"#;

    #[test]
    fn extracts_each_coordinate_block_as_region() {
        let set = parse_kml(TWO_POLYGONS).unwrap();
        let names: Vec<_> = set.names().collect();
        assert_eq!(names, vec!["polygon_0", "polygon_1"]);

        let first = set.get("polygon_0").unwrap();
        assert_eq!(first.ring.len(), 4);
        assert_eq!(first.ring.vertices()[0], Vertex::new(43.65, -79.40));

        let second = set.get("polygon_1").unwrap();
        assert_eq!(second.ring.vertices()[1], Vertex::new(20.0, 11.0));
    }

    #[test]
    fn missing_coordinates_is_an_error() {
        let err = parse_kml("<kml><Document/></kml>").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn malformed_tuple_names_polygon() {
        let doc = "<coordinates>1,2 3,x 5,6</coordinates>";
        match parse_kml(doc).unwrap_err() {
            Error::Parse(msg) => assert!(msg.starts_with("polygon_0"), "{msg}"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn tuple_without_latitude_is_rejected() {
        assert!(parse_coordinate_block("1,2 3 4,5").is_err());
    }

    #[test]
    fn unclosed_block_is_rejected() {
        assert!(parse_kml("<coordinates>1,2 3,4 5,6").is_err());
    }

    #[test]
    fn ring_revisiting_two_points_is_rejected() {
        let doc = "<coordinates>0,0 1,1 0,0 1,1</coordinates>";
        assert!(matches!(parse_kml(doc), Err(Error::Parse(_))));
    }

    #[test]
    fn empty_block_is_rejected() {
        assert!(parse_kml("<coordinates>  </coordinates>").is_err());
    }
}
