//! Validated point and shape records.

use std::fmt;

use geo::Coord;
use thiserror::Error;

use crate::measure::{line_length, polygon_area};

/// Identifier assigned by a store on insert.
pub type RecordId = i64;

/// Date format stamped on new points, e.g. `12/05/2024`.
const DATE_FORMAT: &str = "%d/%m/%Y";

/// Errors raised when a record fails validation before reaching a store.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    /// A required name was empty or whitespace.
    #[error("name must not be empty")]
    EmptyName,
    /// Latitude fell outside `[-90, 90]` or was not finite.
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    /// Longitude fell outside `[-180, 180]` or was not finite.
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
    /// A shape had fewer vertices than its kind requires.
    #[error("a {kind} needs at least {required} vertices, found {found}")]
    TooFewVertices {
        /// Kind being validated.
        kind: ShapeKind,
        /// Minimum vertex count for the kind.
        required: usize,
        /// Vertices supplied.
        found: usize,
    },
}

/// A record paired with the identifier its store assigned.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Saved<T> {
    /// Store-assigned identifier.
    pub id: RecordId,
    /// The persisted record.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub record: T,
}

impl<T> Saved<T> {
    /// Pair `record` with `id`.
    pub const fn new(id: RecordId, record: T) -> Self {
        Self { id, record }
    }
}

/// A pin dropped on the map.
///
/// # Examples
/// ```
/// use mapnotes_core::Point;
///
/// # fn main() -> Result<(), mapnotes_core::ValidationError> {
/// let point = Point::new(41.3, 2.17, "Font", "12/05/2024", "A1")?;
/// assert_eq!(point.location().x, 2.17);
/// assert!(Point::new(41.3, 2.17, "  ", "12/05/2024", "").is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// User-supplied label.
    pub name: String,
    /// Creation date, formatted when the point was created.
    pub date: String,
    /// Free-text identifier; empty when absent.
    pub code: String,
    /// Reserved photo reference; empty when absent.
    pub photo_path: String,
}

impl Point {
    /// Validate and construct a point.
    ///
    /// # Errors
    /// Returns [`ValidationError`] when the name is blank or the coordinates
    /// are out of range.
    pub fn new(
        latitude: f64,
        longitude: f64,
        name: impl Into<String>,
        date: impl Into<String>,
        code: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        validate_vertex(Coord {
            x: longitude,
            y: latitude,
        })?;
        Ok(Self {
            latitude,
            longitude,
            name,
            date: date.into(),
            code: code.into(),
            photo_path: String::new(),
        })
    }

    /// Construct a point stamped with today's local date.
    ///
    /// # Errors
    /// See [`Point::new`].
    pub fn created_today(
        latitude: f64,
        longitude: f64,
        name: impl Into<String>,
        code: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let date = chrono::Local::now().format(DATE_FORMAT).to_string();
        Self::new(latitude, longitude, name, date, code)
    }

    /// Position as a `geo` coordinate (`x = longitude`, `y = latitude`).
    #[must_use]
    pub const fn location(&self) -> Coord<f64> {
        Coord {
            x: self.longitude,
            y: self.latitude,
        }
    }
}

/// Geometry kind of a drawn shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ShapeKind {
    /// Open path.
    Line,
    /// Closed ring.
    Polygon,
}

impl ShapeKind {
    /// Label stored alongside the shape and used when it has no name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Line => "linia",
            Self::Polygon => "poligon",
        }
    }

    /// Capitalised label shown in list views.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Line => "Linia",
            Self::Polygon => "Poligon",
        }
    }

    /// Parse a stored label.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "linia" => Some(Self::Line),
            "poligon" => Some(Self::Polygon),
            _ => None,
        }
    }

    /// Fewest vertices a finished shape of this kind may have.
    #[must_use]
    pub const fn min_vertices(self) -> usize {
        match self {
            Self::Line => 2,
            Self::Polygon => 3,
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Line => f.write_str("line"),
            Self::Polygon => f.write_str("polygon"),
        }
    }
}

/// A finished line or polygon.
///
/// `area` is in square metres and is zero for lines. `length` is in metres
/// and is only present for lines.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use mapnotes_core::{Shape, ShapeKind};
///
/// # fn main() -> Result<(), mapnotes_core::ValidationError> {
/// let line = Shape::from_vertices(
///     ShapeKind::Line,
///     vec![Coord { x: 2.0, y: 41.0 }, Coord { x: 2.0, y: 41.1 }],
///     "",
/// )?;
/// assert_eq!(line.display_name(), "linia");
/// assert!(line.length.is_some_and(|metres| metres > 11_000.0));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Shape {
    /// Line or polygon.
    pub kind: ShapeKind,
    /// Ordered vertices.
    pub vertices: Vec<Coord<f64>>,
    /// Optional label; empty when unnamed.
    pub name: String,
    /// Area in square metres; zero for lines.
    pub area: f64,
    /// Path length in metres; lines only.
    pub length: Option<f64>,
}

impl Shape {
    /// Validate the vertices and compute the shape's metric.
    ///
    /// # Errors
    /// Returns [`ValidationError::TooFewVertices`] below the kind minimum and
    /// a range error for any out-of-range vertex.
    pub fn from_vertices(
        kind: ShapeKind,
        vertices: Vec<Coord<f64>>,
        name: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        validate_vertices(kind, &vertices)?;
        let (area, length) = match kind {
            ShapeKind::Polygon => (polygon_area(&vertices), None),
            ShapeKind::Line => (0.0, Some(line_length(&vertices))),
        };
        Ok(Self {
            kind,
            vertices,
            name: name.into(),
            area,
            length,
        })
    }

    /// Rebuild a shape whose metric was computed earlier, e.g. when loading
    /// from a store.
    ///
    /// # Errors
    /// Applies the same vertex checks as [`Shape::from_vertices`].
    pub fn from_parts(
        kind: ShapeKind,
        vertices: Vec<Coord<f64>>,
        name: impl Into<String>,
        area: f64,
        length: Option<f64>,
    ) -> Result<Self, ValidationError> {
        validate_vertices(kind, &vertices)?;
        Ok(Self {
            kind,
            vertices,
            name: name.into(),
            area,
            length,
        })
    }

    /// Name shown in documents: the shape's name, or its kind label.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            self.kind.label()
        } else {
            &self.name
        }
    }
}

/// The minimum counts raw vertices, not distinct ones: a polygon drawn as
/// `A, B, A` passes with three.
fn validate_vertices(kind: ShapeKind, vertices: &[Coord<f64>]) -> Result<(), ValidationError> {
    let required = kind.min_vertices();
    if vertices.len() < required {
        return Err(ValidationError::TooFewVertices {
            kind,
            required,
            found: vertices.len(),
        });
    }
    vertices.iter().copied().try_for_each(validate_vertex)
}

pub(crate) fn validate_vertex(vertex: Coord<f64>) -> Result<(), ValidationError> {
    if !vertex.y.is_finite() || !(-90.0..=90.0).contains(&vertex.y) {
        return Err(ValidationError::LatitudeOutOfRange(vertex.y));
    }
    if !vertex.x.is_finite() || !(-180.0..=180.0).contains(&vertex.x) {
        return Err(ValidationError::LongitudeOutOfRange(vertex.x));
    }
    Ok(())
}
