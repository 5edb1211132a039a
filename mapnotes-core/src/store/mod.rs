//! Persistence traits for saved points and shapes.
//!
//! Stores own their records exclusively. Inserts return the identifier the
//! store assigned, listings come back in ascending id order, and records are
//! never updated in place: they are only inserted and deleted.

use thiserror::Error;

use crate::{Point, RecordId, Saved, Shape, ValidationError};

#[cfg(feature = "store-sqlite")]
mod sqlite;

#[cfg(feature = "store-sqlite")]
pub use sqlite::SqliteStore;

/// Errors raised by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Creating the directory that holds the database failed.
    #[error("failed to create parent directory {path:?}")]
    CreateDirectory {
        /// Directory that could not be created.
        path: camino::Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Opening the SQLite database failed.
    #[cfg(feature = "store-sqlite")]
    #[error("failed to open SQLite database at {path:?}")]
    Open {
        /// Database path.
        path: camino::Utf8PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Creating the tables failed.
    #[cfg(feature = "store-sqlite")]
    #[error("failed to create store schema")]
    Schema {
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// A statement failed.
    #[cfg(feature = "store-sqlite")]
    #[error("failed to {operation}")]
    Query {
        /// What the statement was doing.
        operation: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// A stored shape carried a kind label this build does not know.
    #[error("shape {id} has unknown kind {kind:?}")]
    UnknownShapeKind {
        /// Row identifier.
        id: RecordId,
        /// Stored label.
        kind: String,
    },
    /// A stored row no longer passes record validation.
    #[error("stored record {id} is invalid")]
    InvalidRecord {
        /// Row identifier.
        id: RecordId,
        /// Validation failure.
        #[source]
        source: ValidationError,
    },
    /// The store does not accept writes.
    #[error("store is read-only")]
    ReadOnly,
}

/// Saved pins.
pub trait PointStore {
    /// Persist `point` and return its new identifier.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the write fails; nothing is stored.
    fn insert_point(&mut self, point: &Point) -> Result<RecordId, StoreError>;

    /// Every saved point, in ascending id order.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the rows cannot be read or decoded.
    fn points(&self) -> Result<Vec<Saved<Point>>, StoreError>;

    /// Delete a point. Returns whether a record was removed.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the delete fails.
    fn delete_point(&mut self, id: RecordId) -> Result<bool, StoreError>;

    /// Delete every point and return how many were removed.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the delete fails.
    fn clear_points(&mut self) -> Result<usize, StoreError>;
}

/// Saved lines and polygons.
pub trait ShapeStore {
    /// Persist `shape` and return its new identifier.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the write fails; nothing is stored.
    fn insert_shape(&mut self, shape: &Shape) -> Result<RecordId, StoreError>;

    /// Every saved shape, in ascending id order.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the rows cannot be read or decoded.
    fn shapes(&self) -> Result<Vec<Saved<Shape>>, StoreError>;

    /// Delete a shape. Returns whether a record was removed.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the delete fails.
    fn delete_shape(&mut self, id: RecordId) -> Result<bool, StoreError>;

    /// Delete every shape and return how many were removed.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the delete fails.
    fn clear_shapes(&mut self) -> Result<usize, StoreError>;
}
