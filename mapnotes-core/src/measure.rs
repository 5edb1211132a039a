//! Spherical area and length of drawn shapes.

use geo::{ChamberlainDuquetteArea, Coord, Haversine, Length, LineString, Polygon};

use crate::ShapeKind;

/// Area in square metres enclosed by `ring`.
///
/// The ring is closed implicitly. Rings with fewer than three vertices have
/// no area.
#[must_use]
pub fn polygon_area(ring: &[Coord<f64>]) -> f64 {
    if ring.len() < ShapeKind::Polygon.min_vertices() {
        return 0.0;
    }
    let polygon = Polygon::new(LineString::from(ring.to_vec()), Vec::new());
    polygon.chamberlain_duquette_unsigned_area()
}

/// Great-circle length in metres of the path through `path`.
#[must_use]
pub fn line_length(path: &[Coord<f64>]) -> f64 {
    if path.len() < ShapeKind::Line.min_vertices() {
        return 0.0;
    }
    Haversine.length(&LineString::from(path.to_vec()))
}
