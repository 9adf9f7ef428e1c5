//! File formats: KML in, boundary JSON in/out, point CSV out.
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use geo_scatter::prelude::*;
use tracing::info;

pub const CSV_HEADER: [&str; 3] = ["title", "latitude", "longitude"];

pub fn read_kml(path: &Path) -> Result<RegionSet> {
    let doc = fs::read_to_string(path)
        .with_context(|| format!("Failed to read KML file: {path:?}"))?;
    parse_kml(&doc).with_context(|| format!("Failed to parse KML file: {path:?}"))
}

pub fn read_regions_json(path: &Path) -> Result<RegionSet> {
    let file =
        File::open(path).with_context(|| format!("Failed to open boundary JSON: {path:?}"))?;
    serde_json::from_reader(file).with_context(|| format!("Invalid boundary JSON: {path:?}"))
}

pub fn write_regions_json(path: &Path, regions: &RegionSet) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create JSON file: {path:?}"))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, regions)?;
    writer.flush()?;
    info!("Written boundary JSON to {:?}.", path);
    Ok(())
}

/// Writes `title,latitude,longitude` rows to `path`.
pub fn write_rows_csv_file(
    path: &Path,
    rows: impl Iterator<Item = (usize, f64, f64)>,
) -> Result<usize> {
    let file =
        File::create(path).with_context(|| format!("Failed to create CSV file: {path:?}"))?;
    let written = write_rows_csv(file, rows)?;
    info!("Written {} rows to {:?}.", written, path);
    Ok(written)
}

pub fn write_rows_csv<W: Write>(
    writer: W,
    rows: impl Iterator<Item = (usize, f64, f64)>,
) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(CSV_HEADER)?;
    let mut written = 0;
    for (idx, lat, lon) in rows {
        wtr.write_record([idx.to_string(), lat.to_string(), lon.to_string()])?;
        written += 1;
    }
    wtr.flush()?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_has_header_and_indexed_rows() {
        let mut buf = Vec::new();
        let rows = vec![(0, 43.5, -79.25), (1, 43.75, -79.5)];
        let n = write_rows_csv(&mut buf, rows.into_iter()).unwrap();
        assert_eq!(n, 2);
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "title,latitude,longitude\n0,43.5,-79.25\n1,43.75,-79.5\n"
        );
    }

    #[test]
    fn empty_sample_set_writes_header_only() {
        let mut buf = Vec::new();
        let n = write_rows_csv(&mut buf, std::iter::empty()).unwrap();
        assert_eq!(n, 0);
        assert_eq!(String::from_utf8(buf).unwrap(), "title,latitude,longitude\n");
    }
}
