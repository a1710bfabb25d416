//! County choropleth: region aggregation, legend, colors, and `GeoJSON`
//! export.

use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject};
use serde::Serialize;
use storm_impact_dataset::{NormalizedRecord, RegionAggregate, aggregate};
use storm_impact_dataset_models::{FieldMapping, StatKey};

use crate::format::format_stat;

/// Layer id of the choropleth.
pub const LAYER_ID: &str = "choroplethLayer";

/// Elevation of the largest value when extruded.
pub const MAX_ELEVATION: f64 = 4e5;

/// Fill of regions without data.
pub const NO_DATA_COLOR: [u8; 3] = [64, 64, 64];

/// Region outline color.
pub const LINE_COLOR: [u8; 3] = [80, 80, 80];

/// Values at or below this are missing-value sentinels, not data.
const LEGEND_FLOOR: f64 = -0.5;

/// Value range shown in the legend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Legend {
    /// Smallest regional value.
    pub min: f64,
    /// Largest regional value.
    pub max: f64,
}

impl Legend {
    /// Range over the finite values above the missing-value floor. Zero
    /// when no value qualifies.
    #[must_use]
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        values
            .into_iter()
            .filter(|v| v.is_finite() && *v > LEGEND_FLOOR)
            .fold(None, |acc: Option<Self>, v| {
                Some(acc.map_or(Self { min: v, max: v }, |l| Self {
                    min: l.min.min(v),
                    max: l.max.max(v),
                }))
            })
            .unwrap_or_default()
    }

    /// Position of a value within the range, `0` when the range is empty.
    #[must_use]
    pub fn normalize(&self, value: f64) -> f64 {
        let range = self.max - self.min;
        if range > 0.0 {
            (value - self.min) / range
        } else {
            0.0
        }
    }

    /// Fill color: gray for missing values, else white-red to yellow-ish
    /// by position.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn color(&self, value: f64) -> [u8; 3] {
        if value < 0.0 {
            return NO_DATA_COLOR;
        }
        let green = 255.0_f64.mul_add(-self.normalize(value), 255.0).clamp(0.0, 255.0);
        [255, green.round() as u8, 100]
    }

    /// Extrusion height. Missing values lie flat.
    #[must_use]
    pub fn elevation(&self, value: f64) -> f64 {
        if value < 0.0 {
            return 0.0;
        }
        self.normalize(value) * MAX_ELEVATION
    }
}

/// One county polygon.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoroplethRegion {
    /// Region key (county FIPS).
    pub key: String,
    /// Region label.
    pub label: Option<String>,
    /// Aggregated value.
    pub stat_value: f64,
    /// Records in the region.
    pub count: usize,
    /// Fill color.
    pub fill_color: [u8; 3],
    /// Extrusion height.
    pub elevation: f64,
    /// Outline of the first record, `[lon, lat]` vertices.
    pub polygon: Vec<[f64; 2]>,
}

/// Aggregated choropleth over a record set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Choropleth {
    /// Statistic the regions are colored by. `None` colors by report count.
    pub stat_key: Option<StatKey>,
    /// Legend range.
    pub legend: Legend,
    /// Regions in key order.
    pub regions: Vec<ChoroplethRegion>,
}

impl Choropleth {
    /// Aggregates records by the region fields of `fields` and colors each
    /// region.
    #[must_use]
    pub fn build<'a>(
        records: impl IntoIterator<Item = &'a NormalizedRecord>,
        fields: &FieldMapping,
        stat_key: Option<StatKey>,
    ) -> Self {
        let aggregated = aggregate(
            records,
            &fields.region_key,
            &fields.region_label,
            stat_key.as_ref().map(AsRef::<str>::as_ref),
        );
        let legend = Legend::from_values(aggregated.values().map(|r| r.stat_value));

        let regions = aggregated
            .into_iter()
            .map(|(key, region)| region_of(key, &region, &legend))
            .collect();

        Self {
            stat_key,
            legend,
            regions,
        }
    }

    /// Tooltip lines for a region: its label and, when a statistic is
    /// selected and the value is non-zero, the formatted value.
    #[must_use]
    pub fn tooltip(&self, region: &ChoroplethRegion) -> Vec<String> {
        let mut lines = vec![region.label.clone().unwrap_or_else(|| region.key.clone())];
        if let Some(key) = self.stat_key
            && region.stat_value.abs() > f64::EPSILON
        {
            lines.push(format!("{}: {}", key.name(), format_stat(region.stat_value, key)));
        }
        lines
    }

    /// Exports the regions as a `GeoJSON` `FeatureCollection`.
    #[must_use]
    pub fn to_geojson(&self) -> GeoJson {
        let features = self
            .regions
            .iter()
            .map(|region| {
                let ring: Vec<Vec<f64>> = region.polygon.iter().map(|p| p.to_vec()).collect();
                let mut properties = JsonObject::new();
                properties.insert("fips".to_string(), region.key.clone().into());
                properties.insert(
                    "name".to_string(),
                    region.label.clone().map_or(serde_json::Value::Null, Into::into),
                );
                properties.insert("value".to_string(), region.stat_value.into());
                properties.insert("count".to_string(), region.count.into());
                properties.insert(
                    "fillColor".to_string(),
                    region.fill_color.iter().copied().collect::<Vec<u8>>().into(),
                );
                properties.insert("elevation".to_string(), region.elevation.into());

                Feature {
                    bbox: None,
                    geometry: Some(Geometry::new(geojson::Value::Polygon(vec![ring]))),
                    id: None,
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        GeoJson::FeatureCollection(FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        })
    }
}

fn region_of(key: String, region: &RegionAggregate<'_>, legend: &Legend) -> ChoroplethRegion {
    let polygon = region
        .records
        .first()
        .map(|r| r.ring().coords().map(|c| [c.x, c.y]).collect())
        .unwrap_or_default();

    ChoroplethRegion {
        key,
        label: region.label.clone(),
        stat_value: region.stat_value,
        count: region.count,
        fill_color: legend.color(region.stat_value),
        elevation: legend.elevation(region.stat_value),
        polygon,
    }
}
