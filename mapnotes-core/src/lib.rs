//! Core domain types for the mapnotes toolkit.
//!
//! Saved points and drawn shapes are validated on construction, persisted
//! through the [`PointStore`] and [`ShapeStore`] traits, and exported as KML
//! placemarks. Appending to an existing document skips placemarks that are
//! already present and replaces the file atomically.
//!
//! Coordinates use [`geo::Coord`] with `x = longitude` and `y = latitude`.

#![forbid(unsafe_code)]

pub mod codec;
pub mod draft;
pub mod export;
pub mod listing;
pub mod markup;
pub mod measure;
pub mod queue;
mod record;
pub mod store;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use draft::{Draft, DraftError};
pub use export::{
    ExportError, ExportMode, ExportReport, export_items, list_markup_files, markup_file_name,
    placemarks_in,
};
pub use listing::RecordList;
pub use markup::{DOCUMENT_TITLE, MapItem, MarkupError, Merge};
pub use queue::{Pending, QueueError, SerialQueue};
pub use record::{Point, RecordId, Saved, Shape, ShapeKind, ValidationError};
pub use store::{PointStore, ShapeStore, StoreError};

#[cfg(feature = "store-sqlite")]
pub use store::SqliteStore;
