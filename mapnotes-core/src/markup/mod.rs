//! KML placemark fragments and document assembly.
//!
//! Fragments are produced as plain text rather than through an XML writer:
//! duplicate detection on append compares generated fragments verbatim
//! against the existing document, so the exact bytes of every fragment are
//! part of the contract. The same record always yields the same fragment.

mod document;

use std::borrow::Cow;

use geo::Coord;
use quick_xml::escape::partial_escape;
use thiserror::Error;

use crate::codec::{markup_coordinates, markup_pair};
use crate::{Point, Saved, Shape, ShapeKind};

pub use document::{Merge, count_placemarks, merge_document, new_document};

/// Title written into new documents when the caller does not supply one.
pub const DOCUMENT_TITLE: &str = "Dades del Mapa";

pub(crate) const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
pub(crate) const KML_OPEN: &str = "<kml xmlns=\"http://www.opengis.net/kml/2.2\">\n";
pub(crate) const DOCUMENT_OPEN: &str = "<Document>\n";
/// Final two closing tags; new placemarks are spliced in before them.
pub(crate) const CLOSING_TAGS: &str = "</Document>\n</kml>";

/// Errors raised while inspecting a KML document.
#[derive(Debug, Error)]
pub enum MarkupError {
    /// The document is not well-formed XML.
    #[error("document is not well-formed XML")]
    Malformed {
        /// Parser error from `quick-xml`.
        #[source]
        source: quick_xml::Error,
    },
    /// The document ended with elements still open.
    #[error("document ended with {open} unclosed elements")]
    Unbalanced {
        /// Number of elements left open.
        open: usize,
    },
}

/// A record that can be exported as a placemark.
///
/// # Examples
/// ```
/// use mapnotes_core::{MapItem, Point};
///
/// # fn main() -> Result<(), mapnotes_core::ValidationError> {
/// let point = Point::new(41.3, 2.17, "Font", "12/05/2024", "A1")?;
/// let item = MapItem::from(&point);
/// assert!(item.fragment().contains("<coordinates>2.17,41.3</coordinates>"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapItem<'a> {
    /// A saved pin.
    Point(&'a Point),
    /// A saved line or polygon.
    Shape(&'a Shape),
}

impl<'a> From<&'a Point> for MapItem<'a> {
    fn from(point: &'a Point) -> Self {
        Self::Point(point)
    }
}

impl<'a> From<&'a Shape> for MapItem<'a> {
    fn from(shape: &'a Shape) -> Self {
        Self::Shape(shape)
    }
}

impl<'a> From<&'a Saved<Point>> for MapItem<'a> {
    fn from(saved: &'a Saved<Point>) -> Self {
        Self::Point(&saved.record)
    }
}

impl<'a> From<&'a Saved<Shape>> for MapItem<'a> {
    fn from(saved: &'a Saved<Shape>) -> Self {
        Self::Shape(&saved.record)
    }
}

impl<'a> MapItem<'a> {
    /// Name written to the placemark's `<name>` element.
    #[must_use]
    pub fn display_name(&self) -> &'a str {
        match *self {
            Self::Point(point) => &point.name,
            Self::Shape(shape) => shape.display_name(),
        }
    }

    /// Text of the placemark's `<description>` element, unescaped.
    #[must_use]
    pub fn description(&self) -> String {
        match *self {
            Self::Point(point) => format!("Data: {}, Codi: {}", point.date, point.code),
            Self::Shape(shape) => shape_summary(shape),
        }
    }

    /// The `<name>` element exactly as it appears in a fragment.
    #[must_use]
    pub fn name_element(&self) -> String {
        format!("<name>{}</name>", escape_text(self.display_name()))
    }

    /// Render the self-contained `<Placemark>` block for this item.
    #[must_use]
    pub fn fragment(&self) -> String {
        format!(
            "<Placemark>\n{}\n<description>{}</description>\n{}</Placemark>\n",
            self.name_element(),
            escape_text(&self.description()),
            self.geometry(),
        )
    }

    fn geometry(&self) -> String {
        match *self {
            Self::Point(point) => format!(
                "<Point>\n<coordinates>{}</coordinates>\n</Point>\n",
                markup_pair(point.location())
            ),
            Self::Shape(shape) => match shape.kind {
                ShapeKind::Polygon => format!(
                    "<Polygon><outerBoundaryIs><LinearRing><coordinates>\n{}\n\
                     </coordinates></LinearRing></outerBoundaryIs></Polygon>\n",
                    markup_coordinates(&closed_ring(&shape.vertices))
                ),
                ShapeKind::Line => format!(
                    "<LineString><coordinates>\n{}\n</coordinates></LineString>\n",
                    markup_coordinates(&shape.vertices)
                ),
            },
        }
    }
}

/// KML rings repeat their first vertex at the end.
fn closed_ring(vertices: &[Coord<f64>]) -> Cow<'_, [Coord<f64>]> {
    match (vertices.first(), vertices.last()) {
        (Some(first), Some(last)) if first != last => {
            let mut ring = vertices.to_vec();
            ring.push(*first);
            Cow::Owned(ring)
        }
        _ => Cow::Borrowed(vertices),
    }
}

/// `Àrea: … m²` for polygons, `Distància: … m` for lines.
#[must_use]
pub fn shape_summary(shape: &Shape) -> String {
    match shape.kind {
        ShapeKind::Polygon => format!("Àrea: {} m²", format_metric(shape.area)),
        ShapeKind::Line => format!(
            "Distància: {} m",
            format_metric(shape.length.unwrap_or_default())
        ),
    }
}

/// Round to at most two decimals and trim trailing zeros.
///
/// # Examples
/// ```
/// use mapnotes_core::markup::format_metric;
///
/// assert_eq!(format_metric(3.0), "3");
/// assert_eq!(format_metric(3.10), "3.1");
/// assert_eq!(format_metric(1234.567), "1234.57");
/// ```
#[must_use]
pub fn format_metric(value: f64) -> String {
    let fixed = format!("{value:.2}");
    let trimmed = if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.')
    } else {
        fixed.as_str()
    };
    if trimmed == "-0" {
        String::from("0")
    } else {
        trimmed.to_owned()
    }
}

pub(crate) fn escape_text(text: &str) -> Cow<'_, str> {
    partial_escape(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn font() -> Point {
        Point::new(41.3, 2.17, "Font", "12/05/2024", "A1").expect("valid point")
    }

    #[fixture]
    fn field() -> Shape {
        let vertices = crate::codec::decode_vertices("41.0,2.0;41.1,2.0;41.1,2.1;41.0,2.0");
        Shape::from_parts(ShapeKind::Polygon, vertices, "Camp", 1234.5, None)
            .expect("valid polygon")
    }

    #[rstest]
    fn point_fragment_is_byte_exact(font: Point) {
        let expected = "<Placemark>\n\
                        <name>Font</name>\n\
                        <description>Data: 12/05/2024, Codi: A1</description>\n\
                        <Point>\n\
                        <coordinates>2.17,41.3</coordinates>\n\
                        </Point>\n\
                        </Placemark>\n";
        assert_eq!(MapItem::from(&font).fragment(), expected);
    }

    #[rstest]
    fn polygon_fragment_uses_closed_ring_in_lon_lat_order(field: Shape) {
        let fragment = MapItem::from(&field).fragment();
        assert!(fragment.contains("<description>Àrea: 1234.5 m²</description>"));
        assert!(fragment.contains(
            "<Polygon><outerBoundaryIs><LinearRing><coordinates>\n\
             2,41 2,41.1 2.1,41.1 2,41\n\
             </coordinates></LinearRing></outerBoundaryIs></Polygon>\n"
        ));
    }

    #[rstest]
    fn open_polygon_rings_are_closed_in_markup() {
        let vertices = vec![
            Coord { x: 2.0, y: 41.0 },
            Coord { x: 2.0, y: 41.1 },
            Coord { x: 2.1, y: 41.1 },
        ];
        let shape = Shape::from_parts(ShapeKind::Polygon, vertices, "", 10.0, None)
            .expect("valid polygon");
        let fragment = MapItem::from(&shape).fragment();
        assert!(fragment.contains("\n2,41 2,41.1 2.1,41.1 2,41\n"));
    }

    #[rstest]
    fn line_fragment_is_an_open_path() {
        let line = Shape::from_parts(
            ShapeKind::Line,
            vec![Coord { x: 2.0, y: 41.0 }, Coord { x: 2.5, y: 41.25 }],
            "",
            0.0,
            Some(42.004),
        )
        .expect("valid line");
        let fragment = MapItem::from(&line).fragment();
        assert!(fragment.contains("<name>linia</name>"));
        assert!(fragment.contains("<description>Distància: 42 m</description>"));
        assert!(fragment.contains("<LineString><coordinates>\n2,41 2.5,41.25\n</coordinates></LineString>"));
        assert!(!fragment.contains("LinearRing"));
    }

    #[rstest]
    fn fragments_are_deterministic(font: Point, field: Shape) {
        for item in [MapItem::from(&font), MapItem::from(&field)] {
            assert_eq!(item.fragment(), item.fragment());
        }
    }

    #[rstest]
    fn markup_characters_are_escaped() {
        let point = Point::new(0.0, 0.0, "Fish & <Chips>", "", "a<b").expect("valid point");
        let item = MapItem::from(&point);
        assert_eq!(item.name_element(), "<name>Fish &amp; &lt;Chips&gt;</name>");
        assert!(item.fragment().contains("Codi: a&lt;b</description>"));
    }

    #[rstest]
    #[case(3.0, "3")]
    #[case(3.10, "3.1")]
    #[case(1234.5, "1234.5")]
    #[case(0.004, "0")]
    #[case(-0.001, "0")]
    #[case(99.999, "100")]
    #[case(12.345_678, "12.35")]
    fn metric_formatting(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(format_metric(value), expected);
    }
}
