//! SQLite-backed store for saved points and shapes.

use std::fmt;

use camino::Utf8Path;
use log::debug;
use rusqlite::{Connection, Row, Transaction, params};

use crate::codec::{decode_vertices, encode_vertices};
use crate::{Point, RecordId, Saved, Shape, ShapeKind};

use super::{PointStore, ShapeStore, StoreError};

const CREATE_POINTS: &str = "CREATE TABLE IF NOT EXISTS saved_points (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    latitude REAL,
    longitude REAL,
    name TEXT,
    date TEXT,
    code TEXT,
    photoPath TEXT DEFAULT ''
)";

const CREATE_SHAPES: &str = "CREATE TABLE IF NOT EXISTS saved_polygons (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    points TEXT,
    area REAL,
    tipus TEXT,
    distancia REAL,
    name TEXT
)";

/// Point and shape tables in one SQLite database.
///
/// # Examples
/// ```
/// use mapnotes_core::{Point, PointStore, SqliteStore};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut store = SqliteStore::open_in_memory()?;
/// let id = store.insert_point(&Point::new(41.3, 2.17, "Font", "12/05/2024", "A1")?)?;
/// assert_eq!(store.points()?[0].id, id);
/// # Ok(())
/// # }
/// ```
pub struct SqliteStore {
    connection: Connection,
}

impl fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteStore")
            .field("path", &self.connection.path())
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    ///
    /// Missing parent directories are created and both tables are created
    /// if absent.
    ///
    /// # Errors
    /// Fails when the directory, database or schema cannot be created.
    pub fn open(path: &Utf8Path) -> Result<Self, StoreError> {
        mapnotes_fs::ensure_parent_dir(path).map_err(|source| StoreError::CreateDirectory {
            path: path.parent().unwrap_or(path).to_path_buf(),
            source,
        })?;
        let connection =
            Connection::open(path.as_std_path()).map_err(|source| StoreError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        debug!("opened store at {path}");
        Self::with_connection(connection)
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    /// Fails when SQLite cannot allocate the database or schema.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let connection = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: ":memory:".into(),
            source,
        })?;
        Self::with_connection(connection)
    }

    fn with_connection(mut connection: Connection) -> Result<Self, StoreError> {
        let transaction = connection
            .transaction()
            .map_err(|source| StoreError::Schema { source })?;
        create_schema(&transaction)?;
        transaction
            .commit()
            .map_err(|source| StoreError::Schema { source })?;
        Ok(Self { connection })
    }

    fn delete_row(&mut self, sql: &str, id: RecordId) -> Result<bool, StoreError> {
        let removed = self
            .connection
            .execute(sql, params![id])
            .map_err(|source| StoreError::Query {
                operation: "delete record",
                source,
            })?;
        debug!("deleted {removed} row(s) for id {id}");
        Ok(removed > 0)
    }

    fn clear_table(&mut self, sql: &str) -> Result<usize, StoreError> {
        self.connection
            .execute(sql, [])
            .map_err(|source| StoreError::Query {
                operation: "clear records",
                source,
            })
    }
}

fn create_schema(tx: &Transaction<'_>) -> Result<(), StoreError> {
    tx.execute(CREATE_POINTS, [])
        .map_err(|source| StoreError::Schema { source })?;
    tx.execute(CREATE_SHAPES, [])
        .map_err(|source| StoreError::Schema { source })?;
    Ok(())
}

struct PointRow {
    id: RecordId,
    latitude: f64,
    longitude: f64,
    name: String,
    date: String,
    code: String,
    photo_path: String,
}

impl PointRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            latitude: row.get(1)?,
            longitude: row.get(2)?,
            name: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            date: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
            code: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
            photo_path: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        })
    }

    fn into_saved(self) -> Result<Saved<Point>, StoreError> {
        let mut point = Point::new(self.latitude, self.longitude, self.name, self.date, self.code)
            .map_err(|source| StoreError::InvalidRecord {
                id: self.id,
                source,
            })?;
        point.photo_path = self.photo_path;
        Ok(Saved::new(self.id, point))
    }
}

struct ShapeRow {
    id: RecordId,
    points: String,
    area: Option<f64>,
    kind: String,
    length: Option<f64>,
    name: String,
}

impl ShapeRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            points: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            area: row.get(2)?,
            kind: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            length: row.get(4)?,
            name: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        })
    }

    fn into_saved(self) -> Result<Saved<Shape>, StoreError> {
        let Some(kind) = ShapeKind::from_label(&self.kind) else {
            return Err(StoreError::UnknownShapeKind {
                id: self.id,
                kind: self.kind,
            });
        };
        let length = match kind {
            ShapeKind::Line => Some(self.length.unwrap_or_default()),
            ShapeKind::Polygon => None,
        };
        let shape = Shape::from_parts(
            kind,
            decode_vertices(&self.points),
            self.name,
            self.area.unwrap_or_default(),
            length,
        )
        .map_err(|source| StoreError::InvalidRecord {
            id: self.id,
            source,
        })?;
        Ok(Saved::new(self.id, shape))
    }
}

impl PointStore for SqliteStore {
    fn insert_point(&mut self, point: &Point) -> Result<RecordId, StoreError> {
        self.connection
            .execute(
                "INSERT INTO saved_points (latitude, longitude, name, date, code, photoPath)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    point.latitude,
                    point.longitude,
                    point.name,
                    point.date,
                    point.code,
                    point.photo_path,
                ],
            )
            .map_err(|source| StoreError::Query {
                operation: "insert point",
                source,
            })?;
        let id = self.connection.last_insert_rowid();
        debug!("inserted point {id} ({})", point.name);
        Ok(id)
    }

    fn points(&self) -> Result<Vec<Saved<Point>>, StoreError> {
        let query_error = |source: rusqlite::Error| StoreError::Query {
            operation: "list points",
            source,
        };
        let mut statement = self
            .connection
            .prepare(
                "SELECT id, latitude, longitude, name, date, code, photoPath
                 FROM saved_points ORDER BY id",
            )
            .map_err(query_error)?;
        let rows = statement
            .query_map([], PointRow::read)
            .map_err(query_error)?;
        rows.map(|row| row.map_err(query_error)?.into_saved())
            .collect()
    }

    fn delete_point(&mut self, id: RecordId) -> Result<bool, StoreError> {
        self.delete_row("DELETE FROM saved_points WHERE id = ?1", id)
    }

    fn clear_points(&mut self) -> Result<usize, StoreError> {
        self.clear_table("DELETE FROM saved_points")
    }
}

impl ShapeStore for SqliteStore {
    fn insert_shape(&mut self, shape: &Shape) -> Result<RecordId, StoreError> {
        self.connection
            .execute(
                "INSERT INTO saved_polygons (points, area, tipus, distancia, name)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    encode_vertices(&shape.vertices),
                    shape.area,
                    shape.kind.label(),
                    shape.length,
                    shape.name,
                ],
            )
            .map_err(|source| StoreError::Query {
                operation: "insert shape",
                source,
            })?;
        let id = self.connection.last_insert_rowid();
        debug!("inserted {} {id}", shape.kind);
        Ok(id)
    }

    fn shapes(&self) -> Result<Vec<Saved<Shape>>, StoreError> {
        let query_error = |source: rusqlite::Error| StoreError::Query {
            operation: "list shapes",
            source,
        };
        let mut statement = self
            .connection
            .prepare(
                "SELECT id, points, area, tipus, distancia, name
                 FROM saved_polygons ORDER BY id",
            )
            .map_err(query_error)?;
        let rows = statement
            .query_map([], ShapeRow::read)
            .map_err(query_error)?;
        rows.map(|row| row.map_err(query_error)?.into_saved())
            .collect()
    }

    fn delete_shape(&mut self, id: RecordId) -> Result<bool, StoreError> {
        self.delete_row("DELETE FROM saved_polygons WHERE id = ?1", id)
    }

    fn clear_shapes(&mut self) -> Result<usize, StoreError> {
        self.clear_table("DELETE FROM saved_polygons")
    }
}
