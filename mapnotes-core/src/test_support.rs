//! In-memory store used by unit and behaviour tests.

use crate::{Point, PointStore, RecordId, Saved, Shape, ShapeStore, StoreError};

/// In-memory implementation of [`PointStore`] and [`ShapeStore`].
///
/// Identifiers start at 1 and are never reused, matching an autoincrement
/// column.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    points: Vec<Saved<Point>>,
    shapes: Vec<Saved<Shape>>,
    last_id: RecordId,
    read_only: bool,
}

impl MemoryStore {
    /// Create a store holding the given points.
    pub fn with_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = Point>,
    {
        let mut store = Self::default();
        for point in points {
            let id = store.next_id();
            store.points.push(Saved::new(id, point));
        }
        store
    }

    /// Keep the current contents but reject every later write.
    #[must_use]
    pub fn into_read_only(self) -> Self {
        Self {
            read_only: true,
            ..self
        }
    }

    fn next_id(&mut self) -> RecordId {
        self.last_id += 1;
        self.last_id
    }

    fn writable(&self) -> Result<(), StoreError> {
        if self.read_only {
            Err(StoreError::ReadOnly)
        } else {
            Ok(())
        }
    }
}

fn remove_by_id<T>(records: &mut Vec<Saved<T>>, id: RecordId) -> bool {
    let before = records.len();
    records.retain(|saved| saved.id != id);
    records.len() != before
}

impl PointStore for MemoryStore {
    fn insert_point(&mut self, point: &Point) -> Result<RecordId, StoreError> {
        self.writable()?;
        let id = self.next_id();
        self.points.push(Saved::new(id, point.clone()));
        Ok(id)
    }

    fn points(&self) -> Result<Vec<Saved<Point>>, StoreError> {
        Ok(self.points.clone())
    }

    fn delete_point(&mut self, id: RecordId) -> Result<bool, StoreError> {
        self.writable()?;
        Ok(remove_by_id(&mut self.points, id))
    }

    fn clear_points(&mut self) -> Result<usize, StoreError> {
        self.writable()?;
        Ok(std::mem::take(&mut self.points).len())
    }
}

impl ShapeStore for MemoryStore {
    fn insert_shape(&mut self, shape: &Shape) -> Result<RecordId, StoreError> {
        self.writable()?;
        let id = self.next_id();
        self.shapes.push(Saved::new(id, shape.clone()));
        Ok(id)
    }

    fn shapes(&self) -> Result<Vec<Saved<Shape>>, StoreError> {
        Ok(self.shapes.clone())
    }

    fn delete_shape(&mut self, id: RecordId) -> Result<bool, StoreError> {
        self.writable()?;
        Ok(remove_by_id(&mut self.shapes, id))
    }

    fn clear_shapes(&mut self) -> Result<usize, StoreError> {
        self.writable()?;
        Ok(std::mem::take(&mut self.shapes).len())
    }
}
