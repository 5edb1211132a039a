//! Coordinate string codec.
//!
//! Shapes are persisted as a single string of `lat,lon;` pairs. KML wants the
//! opposite axis order (`lon,lat`) separated by spaces. Both directions go
//! through [`geo::Coord`] so the swap happens in exactly one place per format.

use geo::Coord;
use log::warn;

const PAIR_SEPARATOR: char = ';';
const AXIS_SEPARATOR: char = ',';

/// Encode vertices as `lat,lon;` pairs.
///
/// Every pair, including the last, is followed by `;`.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use mapnotes_core::codec::encode_vertices;
///
/// let encoded = encode_vertices(&[Coord { x: 2.0, y: 41.5 }, Coord { x: 2.25, y: 41.0 }]);
/// assert_eq!(encoded, "41.5,2;41,2.25;");
/// ```
#[must_use]
pub fn encode_vertices(vertices: &[Coord<f64>]) -> String {
    vertices
        .iter()
        .map(|vertex| format!("{}{AXIS_SEPARATOR}{}{PAIR_SEPARATOR}", vertex.y, vertex.x))
        .collect()
}

/// Decode a `lat,lon;` string.
///
/// Segments that are empty or do not split into exactly two finite numbers are
/// skipped, so a trailing separator is harmless.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use mapnotes_core::codec::decode_vertices;
///
/// let vertices = decode_vertices("41.0,2.0;bogus;41.1,2.0;");
/// assert_eq!(vertices, vec![Coord { x: 2.0, y: 41.0 }, Coord { x: 2.0, y: 41.1 }]);
/// ```
#[must_use]
pub fn decode_vertices(encoded: &str) -> Vec<Coord<f64>> {
    encoded
        .split(PAIR_SEPARATOR)
        .filter(|segment| !segment.trim().is_empty())
        .filter_map(|segment| {
            let decoded = decode_pair(segment);
            if decoded.is_none() {
                warn!("skipping malformed coordinate segment {segment:?}");
            }
            decoded
        })
        .collect()
}

fn decode_pair(segment: &str) -> Option<Coord<f64>> {
    let mut fields = segment.split(AXIS_SEPARATOR);
    let lat = parse_axis(fields.next()?)?;
    let lon = parse_axis(fields.next()?)?;
    if fields.next().is_some() {
        return None;
    }
    Some(Coord { x: lon, y: lat })
}

fn parse_axis(field: &str) -> Option<f64> {
    field
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Render vertices as KML coordinates: `lon,lat` pairs separated by spaces.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use mapnotes_core::codec::markup_coordinates;
///
/// let text = markup_coordinates(&[Coord { x: 2.0, y: 41.0 }, Coord { x: 2.1, y: 41.1 }]);
/// assert_eq!(text, "2,41 2.1,41.1");
/// ```
#[must_use]
pub fn markup_coordinates(vertices: &[Coord<f64>]) -> String {
    vertices
        .iter()
        .map(|vertex| markup_pair(*vertex))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render a single vertex as `lon,lat`.
#[must_use]
pub fn markup_pair(vertex: Coord<f64>) -> String {
    format!("{}{AXIS_SEPARATOR}{}", vertex.x, vertex.y)
}
