//! Facade crate for the mapnotes toolkit.
//!
//! This crate re-exports the core record, export, store and queue types. The
//! SQLite store is available behind the `store-sqlite` feature.

#![forbid(unsafe_code)]

pub use mapnotes_core::{
    DOCUMENT_TITLE, Draft, DraftError, ExportError, ExportMode, ExportReport, MapItem,
    MarkupError, Merge, Pending, Point, PointStore, QueueError, RecordId, RecordList, Saved,
    SerialQueue, Shape, ShapeKind, ShapeStore, StoreError, ValidationError, export_items,
    list_markup_files, markup_file_name, placemarks_in,
};

/// Coordinate string codec.
pub use mapnotes_core::codec;
/// Placemark fragments and document assembly.
pub use mapnotes_core::markup;
/// Spherical area and length.
pub use mapnotes_core::measure;

#[cfg(feature = "store-sqlite")]
pub use mapnotes_core::SqliteStore;

#[cfg(feature = "test-support")]
pub use mapnotes_core::test_support;
