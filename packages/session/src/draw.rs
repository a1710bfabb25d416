//! Hand-drawn impact area.

use geo::Polygon;
use wkt::ToWkt;

/// The impact area being drawn on the map. Holds at most one polygon: each
/// newly completed polygon replaces the previous one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawnArea {
    polygon: Option<Polygon<f64>>,
}

impl DrawnArea {
    /// An area with nothing drawn yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The drawn polygon.
    #[must_use]
    pub const fn polygon(&self) -> Option<&Polygon<f64>> {
        self.polygon.as_ref()
    }

    /// Number of drawn features (`0` or `1`).
    #[must_use]
    pub const fn len(&self) -> usize {
        if self.polygon.is_some() { 1 } else { 0 }
    }

    /// Whether nothing has been drawn.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.polygon.is_none()
    }

    /// Handles an edit from the drawing layer.
    ///
    /// Returns the new area (keeping only the last feature) when the edit
    /// added a feature, `None` for edits that did not.
    #[must_use]
    pub fn on_edit(&self, mut features: Vec<Polygon<f64>>) -> Option<Self> {
        if features.len() > self.len() {
            features.pop().map(|polygon| Self {
                polygon: Some(polygon),
            })
        } else {
            None
        }
    }

    /// WKT of the drawn polygon.
    #[must_use]
    pub fn wkt(&self) -> Option<String> {
        self.polygon.as_ref().map(|p| p.wkt_string())
    }
}

#[cfg(test)]
mod tests {
    use geo::polygon;

    use super::*;

    fn square(offset: f64) -> Polygon<f64> {
        polygon![
            (x: offset, y: 0.0),
            (x: offset + 1.0, y: 0.0),
            (x: offset + 1.0, y: 1.0),
        ]
    }

    #[test]
    fn keeps_last_added_feature() {
        let area = DrawnArea::new();
        let area = area.on_edit(vec![square(0.0)]).unwrap();
        assert_eq!(area.polygon(), Some(&square(0.0)));

        let area = area.on_edit(vec![square(0.0), square(5.0)]).unwrap();
        assert_eq!(area.len(), 1);
        assert_eq!(area.polygon(), Some(&square(5.0)));
    }

    #[test]
    fn ignores_edits_without_new_features() {
        let area = DrawnArea::new().on_edit(vec![square(0.0)]).unwrap();
        assert!(area.on_edit(vec![square(3.0)]).is_none());
        assert!(DrawnArea::new().on_edit(Vec::new()).is_none());
    }

    #[test]
    fn exports_wkt() {
        assert!(DrawnArea::new().wkt().is_none());
        let area = DrawnArea::new().on_edit(vec![square(0.0)]).unwrap();
        assert!(area.wkt().unwrap().starts_with("POLYGON"));
    }
}
