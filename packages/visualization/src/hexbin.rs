//! Hexagon histogram of record centroids on the H3 grid.

use std::collections::BTreeMap;

use h3o::{CellIndex, LatLng, Resolution};
use serde::Serialize;
use storm_impact_dataset::NormalizedRecord;

/// H3 resolution used for binning (cells roughly 22 km across).
pub const HEX_RESOLUTION: Resolution = Resolution::Four;

/// Layer id of the hexagon histogram.
pub const LAYER_ID: &str = "impact-heatmap-layer";

/// One occupied hexagon.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HexCell {
    /// H3 cell index (hex string).
    pub cell: String,
    /// Cell center, `[lon, lat]`.
    pub center: [f64; 2],
    /// Cell boundary, `[lon, lat]` vertices.
    pub boundary: Vec<[f64; 2]>,
    /// Records whose centroid falls in the cell.
    pub count: usize,
}

/// Bins record centroids into H3 cells.
///
/// Centroids outside valid coordinates are skipped. Cells are returned in
/// index order.
#[must_use]
pub fn bin_centroids<'a>(records: impl IntoIterator<Item = &'a NormalizedRecord>) -> Vec<HexCell> {
    let mut counts: BTreeMap<CellIndex, usize> = BTreeMap::new();

    for record in records {
        let [lon, lat] = record.centroid;
        match LatLng::new(lat, lon) {
            Ok(coord) => *counts.entry(coord.to_cell(HEX_RESOLUTION)).or_insert(0) += 1,
            Err(e) => log::debug!("Skipping centroid ({lon}, {lat}): {e}"),
        }
    }

    counts
        .into_iter()
        .map(|(cell, count)| {
            let center = LatLng::from(cell);
            HexCell {
                cell: cell.to_string(),
                center: [center.lng(), center.lat()],
                boundary: cell.boundary().iter().map(|v| [v.lng(), v.lat()]).collect(),
                count,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record;

    fn at(lon: f64, lat: f64) -> NormalizedRecord {
        let mut record = record(&[]);
        record.centroid = [lon, lat];
        record
    }

    #[test]
    fn nearby_centroids_share_a_cell() {
        let records = vec![
            at(-89.60, 29.25),
            at(-89.601, 29.251),
            at(-80.0, 25.0),
        ];
        let cells = bin_centroids(&records);

        assert_eq!(cells.len(), 2);
        assert_eq!(cells.iter().map(|c| c.count).sum::<usize>(), 3);
        assert!(cells.iter().any(|c| c.count == 2));
        assert!(cells.iter().all(|c| c.boundary.len() >= 5));
    }

    #[test]
    fn invalid_coordinates_are_skipped() {
        let records = vec![at(f64::NAN, 10.0)];
        assert!(bin_centroids(&records).is_empty());
    }
}
