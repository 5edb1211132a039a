//! Text lines and in-memory state behind the saved-record lists.

use crate::markup::shape_summary;
use crate::{Point, RecordId, Saved, Shape};

/// Label for shapes saved without a name.
pub const UNNAMED_SHAPE: &str = "Sense nom";

/// One list line for a saved point.
///
/// # Examples
/// ```
/// use mapnotes_core::Point;
/// use mapnotes_core::listing::point_line;
///
/// # fn main() -> Result<(), mapnotes_core::ValidationError> {
/// let point = Point::new(41.3, 2.17, "Font", "12/05/2024", "A1")?;
/// assert_eq!(point_line(&point), "Nom: Font - Lat: 41.30000, Lng: 2.17000");
/// # Ok(())
/// # }
/// ```
#[must_use]
pub fn point_line(point: &Point) -> String {
    format!(
        "Nom: {} - Lat: {:.5}, Lng: {:.5}",
        point.name, point.latitude, point.longitude
    )
}

/// One list line for a saved shape.
#[must_use]
pub fn shape_line(shape: &Shape) -> String {
    let name = if shape.name.trim().is_empty() {
        UNNAMED_SHAPE
    } else {
        shape.name.as_str()
    };
    format!("{name} ({}) - {}", shape.kind.title(), shape_summary(shape))
}

/// Records that can be shown as list lines.
pub trait Listed {
    /// Text shown for this record.
    fn line(&self) -> String;
}

impl Listed for Point {
    fn line(&self) -> String {
        point_line(self)
    }
}

impl Listed for Shape {
    fn line(&self) -> String {
        shape_line(self)
    }
}

/// The currently loaded records of one kind.
///
/// The list mirrors the store: it is refilled after loads and only loses an
/// entry once the store confirms the deletion.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordList<T> {
    items: Vec<Saved<T>>,
}

impl<T> Default for RecordList<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> RecordList<T> {
    /// Wrap records loaded from a store.
    #[must_use]
    pub const fn new(items: Vec<Saved<T>>) -> Self {
        Self { items }
    }

    /// Records in display order.
    #[must_use]
    pub fn items(&self) -> &[Saved<T>] {
        &self.items
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Replace the contents after a fresh load.
    pub fn replace(&mut self, items: Vec<Saved<T>>) {
        self.items = items;
    }

    /// Record with the given id.
    #[must_use]
    pub fn get(&self, id: RecordId) -> Option<&Saved<T>> {
        self.items.iter().find(|saved| saved.id == id)
    }

    /// Run `delete` against the store, then drop the entry.
    ///
    /// The entry is only removed when `delete` succeeds; on error the list is
    /// left exactly as it was. Returns the removed record, if it was listed.
    ///
    /// # Errors
    /// Propagates the error returned by `delete`.
    pub fn delete_with<E>(
        &mut self,
        id: RecordId,
        delete: impl FnOnce(RecordId) -> Result<bool, E>,
    ) -> Result<Option<Saved<T>>, E> {
        delete(id)?;
        let position = self.items.iter().position(|saved| saved.id == id);
        Ok(position.map(|index| self.items.remove(index)))
    }
}

impl<T: Listed> RecordList<T> {
    /// One text line per record, in order.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.items.iter().map(|saved| saved.record.line()).collect()
    }

    /// One line per record prefixed with its id, e.g. `3: Nom: Font - ...`.
    #[must_use]
    pub fn numbered_lines(&self) -> Vec<String> {
        self.items
            .iter()
            .map(|saved| format!("{}: {}", saved.id, saved.record.line()))
            .collect()
    }
}
