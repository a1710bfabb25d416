#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Map visualizations of a filtered record set.
//!
//! Each [`VisualizationKind`] turns records into serializable layer
//! descriptions for the rendering front end. The descriptions carry the
//! data a map layer needs (hex cells, weighted points, colored county
//! polygons) and the fixed styling of the layer.

pub mod choropleth;
pub mod detail;
pub mod format;
pub mod hexbin;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use storm_impact_dataset::NormalizedRecord;
use storm_impact_dataset_models::{FieldMapping, StatKey};
use strum_macros::{AsRefStr, Display, EnumString, IntoStaticStr};

pub use choropleth::{Choropleth, ChoroplethRegion, Legend};
pub use detail::{ImpactDetail, ImpactReport, StatRow};
pub use hexbin::HexCell;

/// Layer opacity shared by every visualization.
pub const LAYER_OPACITY: f64 = 0.7;

/// Layer id of the heatmap.
pub const HEATMAP_LAYER_ID: &str = "heatmapLayer";

/// Available map visualizations.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    IntoStaticStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum VisualizationKind {
    /// Hexagon histogram of record centroids.
    HexHisto,
    /// Centroid heatmap.
    Heatmap,
    /// County choropleth.
    PolyHisto,
}

impl VisualizationKind {
    /// All visualizations in menu order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::HexHisto, Self::Heatmap, Self::PolyHisto]
    }

    /// Registry key.
    #[must_use]
    pub fn key(self) -> &'static str {
        self.into()
    }

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::HexHisto => "Hexagon Histogram",
            Self::Heatmap => "Heatmap",
            Self::PolyHisto => "Choropleth Map by County",
        }
    }

    /// Builds the layers for a record set. `fields` names the region fields
    /// the choropleth groups by.
    #[must_use]
    pub fn layers(
        self,
        records: &[&NormalizedRecord],
        fields: &FieldMapping,
        args: &LayerArgs,
    ) -> Rendered {
        log::debug!("Building {} layers over {} records", self.key(), records.len());

        match self {
            Self::HexHisto => Rendered {
                layers: vec![Layer::Hexagon(HexagonLayer {
                    id: hexbin::LAYER_ID.to_string(),
                    opacity: LAYER_OPACITY,
                    extruded: args.is_3d,
                    radius: 30_000.0,
                    elevation_scale: 1000.0,
                    color_domain: [0.0, 15.0],
                    elevation_domain: [0.0, 20.0],
                    cells: hexbin::bin_centroids(records.iter().copied()),
                })],
                legend: None,
            },
            Self::Heatmap => Rendered {
                layers: vec![Layer::Heatmap(HeatmapLayer {
                    id: HEATMAP_LAYER_ID.to_string(),
                    opacity: LAYER_OPACITY,
                    points: records
                        .iter()
                        .map(|r| WeightedPoint {
                            position: r.centroid,
                            weight: 1.0,
                        })
                        .collect(),
                })],
                legend: None,
            },
            Self::PolyHisto => {
                let choropleth = Choropleth::build(records.iter().copied(), fields, args.stat_key);
                Rendered {
                    legend: Some(choropleth.legend),
                    layers: vec![Layer::Choropleth(ChoroplethLayer {
                        id: choropleth::LAYER_ID.to_string(),
                        opacity: LAYER_OPACITY,
                        extruded: args.is_3d,
                        line_color: choropleth::LINE_COLOR,
                        regions: choropleth.regions,
                    })],
                }
            }
        }
    }
}

/// Visualizations keyed by registry key.
#[must_use]
pub fn registry() -> BTreeMap<&'static str, VisualizationKind> {
    VisualizationKind::all()
        .iter()
        .map(|kind| (kind.key(), *kind))
        .collect()
}

/// Options passed to a layer builder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerArgs {
    /// Extrude layers.
    pub is_3d: bool,
    /// Statistic the choropleth is colored by.
    pub stat_key: Option<StatKey>,
}

/// Hexagon histogram layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HexagonLayer {
    /// Layer id.
    pub id: String,
    /// Opacity.
    pub opacity: f64,
    /// Extruded by count.
    pub extruded: bool,
    /// Nominal hexagon radius in meters.
    pub radius: f64,
    /// Elevation multiplier.
    pub elevation_scale: f64,
    /// Count range mapped onto the color ramp.
    pub color_domain: [f64; 2],
    /// Count range mapped onto elevation.
    pub elevation_domain: [f64; 2],
    /// Occupied cells.
    pub cells: Vec<HexCell>,
}

/// Heatmap point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeightedPoint {
    /// `[lon, lat]`.
    pub position: [f64; 2],
    /// Point weight.
    pub weight: f64,
}

/// Heatmap layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapLayer {
    /// Layer id.
    pub id: String,
    /// Opacity.
    pub opacity: f64,
    /// Weighted centroids.
    pub points: Vec<WeightedPoint>,
}

/// County choropleth layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoroplethLayer {
    /// Layer id.
    pub id: String,
    /// Opacity.
    pub opacity: f64,
    /// Extruded by value.
    pub extruded: bool,
    /// Outline color.
    pub line_color: [u8; 3],
    /// Colored counties.
    pub regions: Vec<ChoroplethRegion>,
}

/// A layer description.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Layer {
    /// See [`HexagonLayer`].
    Hexagon(HexagonLayer),
    /// See [`HeatmapLayer`].
    Heatmap(HeatmapLayer),
    /// See [`ChoroplethLayer`].
    Choropleth(ChoroplethLayer),
}

/// Layers plus the legend to show beside them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rendered {
    /// Layer descriptions, bottom first.
    pub layers: Vec<Layer>,
    /// Value legend, for visualizations that color by value.
    pub legend: Option<Legend>,
}

#[cfg(test)]
pub(crate) mod test_support {
    use geo::polygon;
    use storm_impact_dataset::NormalizedRecord;
    use storm_impact_dataset_models::{RawRecord, TaggedValue};

    /// A unit-square record with the given fields.
    pub fn record(fields: &[(&str, &str)]) -> NormalizedRecord {
        let fields: RawRecord = fields
            .iter()
            .map(|(k, v)| ((*k).to_string(), TaggedValue::new(*v)))
            .collect();
        NormalizedRecord {
            fields,
            geometry: polygon![
                (x: 0.0, y: 0.0),
                (x: 1.0, y: 0.0),
                (x: 1.0, y: 1.0),
                (x: 0.0, y: 1.0),
            ],
            centroid: [0.5, 0.5],
            start_time: 0,
            end_time: 0,
            event_type_short: "Hurricane".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record;

    #[test]
    fn registry_has_three_visualizations() {
        let registry = registry();
        let keys: Vec<_> = registry.keys().copied().collect();
        assert_eq!(keys, vec!["heatmap", "hexHisto", "polyHisto"]);
        assert_eq!(registry["polyHisto"].name(), "Choropleth Map by County");
    }

    #[test]
    fn key_matches_strum() {
        for kind in VisualizationKind::all() {
            let strum_key: &str = kind.as_ref();
            assert_eq!(kind.key(), strum_key);
            assert_eq!(kind.key().parse::<VisualizationKind>().unwrap(), *kind);
            assert_eq!(serde_json::to_value(kind).unwrap(), kind.key());
        }
        assert_eq!(VisualizationKind::HexHisto.key(), "hexHisto");
        assert_eq!(VisualizationKind::PolyHisto.key(), "polyHisto");
    }

    #[test]
    fn heatmap_weights_every_record_once() {
        let a = record(&[]);
        let b = record(&[]);
        let rendered = VisualizationKind::Heatmap.layers(
            &[&a, &b],
            &FieldMapping::default(),
            &LayerArgs::default(),
        );

        assert!(rendered.legend.is_none());
        let [Layer::Heatmap(layer)] = rendered.layers.as_slice() else {
            panic!("expected one heatmap layer");
        };
        assert_eq!(layer.points.len(), 2);
        assert!(layer.points.iter().all(|p| (p.weight - 1.0).abs() < f64::EPSILON));
    }

    #[test]
    fn choropleth_carries_legend() {
        let a = record(&[("event_loc_fips", "1"), ("health_obesity", "0.2")]);
        let b = record(&[("event_loc_fips", "2"), ("health_obesity", "0.4")]);
        let rendered = VisualizationKind::PolyHisto.layers(
            &[&a, &b],
            &FieldMapping::default(),
            &LayerArgs {
                is_3d: true,
                stat_key: Some(StatKey::Obesity),
            },
        );

        let legend = rendered.legend.unwrap();
        assert!((legend.min - 0.2).abs() < 1e-12);
        assert!((legend.max - 0.4).abs() < 1e-12);

        let [Layer::Choropleth(layer)] = rendered.layers.as_slice() else {
            panic!("expected one choropleth layer");
        };
        assert!(layer.extruded);
        assert_eq!(layer.id, "choroplethLayer");
        assert_eq!(layer.regions.len(), 2);
    }

    #[test]
    fn empty_records_render_empty_layers() {
        for kind in VisualizationKind::all() {
            let rendered = kind.layers(&[], &FieldMapping::default(), &LayerArgs::default());
            assert_eq!(rendered.layers.len(), 1);
        }
    }

    #[test]
    fn layer_serializes_with_type_tag() {
        let rendered =
            VisualizationKind::Heatmap.layers(&[], &FieldMapping::default(), &LayerArgs::default());
        let json = serde_json::to_value(&rendered).unwrap();
        assert_eq!(json["layers"][0]["type"], "heatmap");
        assert_eq!(json["layers"][0]["id"], "heatmapLayer");
    }
}
