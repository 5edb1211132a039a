//! In-memory drawing session for lines and polygons.
//!
//! A draft collects vertices as the user taps the map and may be edited
//! freely. Nothing is persisted: [`Draft::finish`] hands back a validated
//! [`Shape`] for the caller to store.

use geo::Coord;
use thiserror::Error;

use crate::record::validate_vertex;
use crate::{Shape, ShapeKind, ValidationError};

/// Errors raised while editing or finishing a draft.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DraftError {
    /// A vertex index was past the end of the draft.
    #[error("vertex {index} does not exist; the draft has {len} vertices")]
    NoSuchVertex {
        /// Requested index.
        index: usize,
        /// Number of vertices in the draft.
        len: usize,
    },
    /// The draft or a vertex failed validation.
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// A shape being drawn.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use mapnotes_core::{Draft, ShapeKind};
///
/// # fn main() -> Result<(), mapnotes_core::DraftError> {
/// let mut draft = Draft::new(ShapeKind::Polygon);
/// draft.push(Coord { x: 2.0, y: 41.0 })?;
/// draft.push(Coord { x: 2.0, y: 41.1 })?;
/// assert!(!draft.is_finishable());
/// draft.push(Coord { x: 2.1, y: 41.1 })?;
/// let shape = draft.finish("Camp")?;
/// assert!(shape.area > 0.0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    kind: ShapeKind,
    vertices: Vec<Coord<f64>>,
}

impl Draft {
    /// Start an empty draft.
    #[must_use]
    pub const fn new(kind: ShapeKind) -> Self {
        Self {
            kind,
            vertices: Vec::new(),
        }
    }

    /// Kind being drawn.
    #[must_use]
    pub const fn kind(&self) -> ShapeKind {
        self.kind
    }

    /// Vertices placed so far.
    #[must_use]
    pub fn vertices(&self) -> &[Coord<f64>] {
        &self.vertices
    }

    /// Append a vertex.
    ///
    /// # Errors
    /// Rejects out-of-range coordinates.
    pub fn push(&mut self, vertex: Coord<f64>) -> Result<(), DraftError> {
        validate_vertex(vertex)?;
        self.vertices.push(vertex);
        Ok(())
    }

    /// Move an existing vertex, e.g. after the user drags its marker.
    ///
    /// # Errors
    /// Fails for unknown indices and out-of-range coordinates.
    pub fn move_vertex(&mut self, index: usize, vertex: Coord<f64>) -> Result<(), DraftError> {
        validate_vertex(vertex)?;
        let len = self.vertices.len();
        let slot = self
            .vertices
            .get_mut(index)
            .ok_or(DraftError::NoSuchVertex { index, len })?;
        *slot = vertex;
        Ok(())
    }

    /// Remove a vertex and return it.
    ///
    /// # Errors
    /// Fails for unknown indices.
    pub fn remove_vertex(&mut self, index: usize) -> Result<Coord<f64>, DraftError> {
        let len = self.vertices.len();
        if index >= len {
            return Err(DraftError::NoSuchVertex { index, len });
        }
        Ok(self.vertices.remove(index))
    }

    /// Whether enough vertices exist to finish the shape.
    #[must_use]
    pub fn is_finishable(&self) -> bool {
        self.vertices.len() >= self.kind.min_vertices()
    }

    /// Discard all vertices, keeping the kind.
    pub fn clear(&mut self) {
        self.vertices.clear();
    }

    /// Validate the draft and compute its metric.
    ///
    /// The draft is left untouched so a rejected name can be retried.
    ///
    /// # Errors
    /// Returns [`ValidationError::TooFewVertices`] below the kind minimum.
    pub fn finish(&self, name: impl Into<String>) -> Result<Shape, DraftError> {
        Ok(Shape::from_vertices(
            self.kind,
            self.vertices.clone(),
            name,
        )?)
    }
}
