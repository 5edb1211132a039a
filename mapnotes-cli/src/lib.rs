//! Command-line interface for saving, listing and exporting map records.
#![forbid(unsafe_code)]

mod error;

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand, ValueEnum};
use geo::Coord;
use log::debug;
use mapnotes_core::listing::Listed;
use mapnotes_core::{
    DOCUMENT_TITLE, Draft, ExportError, ExportMode, ExportReport, MapItem, Point, PointStore,
    RecordId, RecordList, SerialQueue, ShapeKind, ShapeStore, SqliteStore, StoreError, export_items,
    list_markup_files, markup_file_name,
};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

pub use error::CliError;

const ARG_DATABASE: &str = "database";
const ARG_DOCUMENTS_DIR: &str = "documents-dir";
const DEFAULT_DATABASE: &str = "mapnotes.db";
const DEFAULT_DOCUMENTS_DIR: &str = "documents";
const STORE_WORKER: &str = "mapnotes-store";

/// Run the mapnotes CLI with the current process arguments and environment.
///
/// # Errors
/// Returns [`CliError`] when parsing, configuration, storage or export fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    run_with(cli, &mut stdout)
}

fn run_with(cli: Cli, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = cli.storage.into_config()?;
    let store = SqliteStore::open(&config.database).map_err(|source| CliError::OpenStore {
        path: config.database.clone(),
        source,
    })?;
    let queue = SerialQueue::spawn(STORE_WORKER, store)?;
    match cli.command {
        Command::Point { action } => run_point(&queue, action, writer),
        Command::Shape { action } => run_shape(&queue, action, writer),
        Command::Export(args) => run_export(&queue, &config, args, writer),
        Command::Files => run_files(&config, writer),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "mapnotes",
    about = "Save map points and shapes and export them as KML",
    version
)]
struct Cli {
    #[command(flatten)]
    storage: StorageArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Manage saved points.
    Point {
        #[command(subcommand)]
        action: PointCommand,
    },
    /// Manage saved lines and polygons.
    Shape {
        #[command(subcommand)]
        action: ShapeCommand,
    },
    /// Export every saved point or shape to a KML file.
    Export(ExportArgs),
    /// List KML files in the documents directory.
    Files,
}

#[derive(Debug, Subcommand)]
enum PointCommand {
    /// Save a new point stamped with today's date.
    Add(AddPointArgs),
    /// List saved points.
    List(ListArgs),
    /// Delete a saved point.
    Delete {
        /// Identifier shown by `point list`.
        id: RecordId,
    },
}

#[derive(Debug, Subcommand)]
enum ShapeCommand {
    /// Save a new line or polygon.
    Add(AddShapeArgs),
    /// List saved shapes.
    List(ListArgs),
    /// Delete a saved shape.
    Delete {
        /// Identifier shown by `shape list`.
        id: RecordId,
    },
}

#[derive(Debug, Args)]
struct AddPointArgs {
    /// Latitude in degrees.
    #[arg(long, allow_negative_numbers = true)]
    lat: f64,
    /// Longitude in degrees.
    #[arg(long, allow_negative_numbers = true)]
    lon: f64,
    /// Label for the point.
    #[arg(long)]
    name: String,
    /// Optional free-text identifier.
    #[arg(long, default_value = "")]
    code: String,
}

#[derive(Debug, Args)]
struct AddShapeArgs {
    /// Geometry to draw.
    #[arg(long, value_enum)]
    kind: KindArg,
    /// Vertex as `lat,lon`; repeat in drawing order.
    #[arg(
        long = "vertex",
        value_name = "lat,lon",
        value_parser = parse_vertex,
        allow_hyphen_values = true
    )]
    vertices: Vec<Coord<f64>>,
    /// Optional label; unnamed shapes use their kind.
    #[arg(long, default_value = "")]
    name: String,
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Print records as JSON instead of list lines.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Line,
    Polygon,
}

impl From<KindArg> for ShapeKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Line => Self::Line,
            KindArg::Polygon => Self::Polygon,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RecordsArg {
    Points,
    Shapes,
}

#[derive(Debug, Args)]
struct ExportArgs {
    /// Which records to export.
    #[arg(value_enum)]
    records: RecordsArg,
    /// File name inside the documents directory; `.kml` is added if missing.
    #[arg(long)]
    file: String,
    /// Merge into an existing file instead of replacing it.
    #[arg(long)]
    append: bool,
    /// Title for newly created documents.
    #[arg(long, default_value = DOCUMENT_TITLE)]
    title: String,
}

/// Storage locations shared by every command.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[ortho_config(prefix = "MAPNOTES")]
pub(crate) struct StorageArgs {
    /// SQLite database holding saved records.
    #[arg(long = ARG_DATABASE, value_name = "path", global = true)]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Directory holding exported KML files.
    #[arg(long = ARG_DOCUMENTS_DIR, value_name = "dir", global = true)]
    #[serde(default)]
    pub(crate) documents_dir: Option<Utf8PathBuf>,
}

impl StorageArgs {
    fn into_config(self) -> Result<StorageConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        Ok(StorageConfig::from(merged))
    }
}

/// Resolved storage locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StorageConfig {
    /// SQLite database path.
    pub(crate) database: Utf8PathBuf,
    /// Documents directory for exports.
    pub(crate) documents_dir: Utf8PathBuf,
}

impl From<StorageArgs> for StorageConfig {
    fn from(args: StorageArgs) -> Self {
        Self {
            database: args
                .database
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE)),
            documents_dir: args
                .documents_dir
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DOCUMENTS_DIR)),
        }
    }
}

fn parse_vertex(value: &str) -> Result<Coord<f64>, String> {
    let (lat, lon) = value
        .split_once(',')
        .ok_or_else(|| format!("expected lat,lon but found {value:?}"))?;
    let parse = |axis: &str| {
        axis.trim()
            .parse::<f64>()
            .map_err(|err| format!("invalid coordinate {axis:?}: {err}"))
    };
    Ok(Coord {
        x: parse(lon)?,
        y: parse(lat)?,
    })
}

type StoreQueue = SerialQueue<SqliteStore>;

fn run_point(
    queue: &StoreQueue,
    action: PointCommand,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    match action {
        PointCommand::Add(args) => {
            let point = Point::created_today(args.lat, args.lon, args.name, args.code)?;
            let id = queue.run(move |store| store.insert_point(&point))??;
            write_line(writer, &format!("saved point {id}"))
        }
        PointCommand::List(args) => {
            let points = queue.run(|store| store.points())??;
            write_listing(writer, &RecordList::new(points), args.json)
        }
        PointCommand::Delete { id } => {
            let removed = queue.run(move |store| store.delete_point(id))??;
            report_delete(writer, "point", id, removed)
        }
    }
}

fn run_shape(
    queue: &StoreQueue,
    action: ShapeCommand,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    match action {
        ShapeCommand::Add(args) => {
            let mut draft = Draft::new(args.kind.into());
            for vertex in args.vertices {
                draft.push(vertex)?;
            }
            let shape = draft.finish(args.name)?;
            let kind = shape.kind;
            let id = queue.run(move |store| store.insert_shape(&shape))??;
            write_line(writer, &format!("saved {kind} {id}"))
        }
        ShapeCommand::List(args) => {
            let shapes = queue.run(|store| store.shapes())??;
            write_listing(writer, &RecordList::new(shapes), args.json)
        }
        ShapeCommand::Delete { id } => {
            let removed = queue.run(move |store| store.delete_shape(id))??;
            report_delete(writer, "shape", id, removed)
        }
    }
}

fn write_listing<T: Listed + Serialize>(
    writer: &mut dyn Write,
    list: &RecordList<T>,
    json: bool,
) -> Result<(), CliError> {
    if json {
        return write_json(writer, list.items());
    }
    for line in list.numbered_lines() {
        write_line(writer, &line)?;
    }
    Ok(())
}

fn report_delete(
    writer: &mut dyn Write,
    kind: &'static str,
    id: RecordId,
    removed: bool,
) -> Result<(), CliError> {
    if removed {
        write_line(writer, &format!("deleted {kind} {id}"))
    } else {
        Err(CliError::NoSuchRecord { kind, id })
    }
}

fn run_export(
    queue: &StoreQueue,
    config: &StorageConfig,
    args: ExportArgs,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let path = config.documents_dir.join(markup_file_name(&args.file)?);
    let mode = if args.append {
        ExportMode::Append
    } else {
        ExportMode::Create
    };
    let records = args.records;
    let title = args.title;
    debug!("exporting {records:?} to {path} ({mode:?})");
    let exported = queue.run(move |store| export_records(store, records, &path, &title, mode))?;
    let report = exported??;
    write_line(
        writer,
        &format!(
            "exported {} placemarks to {} ({} already present)",
            report.appended, report.path, report.skipped
        ),
    )
}

/// Store reads fail the outer layer; file writes fail the inner one.
type ExportOutcome = Result<Result<ExportReport, ExportError>, StoreError>;

fn export_records(
    store: &mut SqliteStore,
    records: RecordsArg,
    path: &Utf8Path,
    title: &str,
    mode: ExportMode,
) -> ExportOutcome {
    Ok(match records {
        RecordsArg::Points => {
            let points = store.points()?;
            let items: Vec<MapItem<'_>> = points.iter().map(MapItem::from).collect();
            export_items(path, title, &items, mode)
        }
        RecordsArg::Shapes => {
            let shapes = store.shapes()?;
            let items: Vec<MapItem<'_>> = shapes.iter().map(MapItem::from).collect();
            export_items(path, title, &items, mode)
        }
    })
}

fn run_files(config: &StorageConfig, writer: &mut dyn Write) -> Result<(), CliError> {
    for name in list_markup_files(&config.documents_dir)? {
        write_line(writer, &name)?;
    }
    Ok(())
}

fn write_line(writer: &mut dyn Write, line: &str) -> Result<(), CliError> {
    writeln!(writer, "{line}").map_err(CliError::WriteOutput)
}

fn write_json<T: Serialize + ?Sized>(writer: &mut dyn Write, value: &T) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerialiseRecords)?;
    write_line(writer, &payload)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<StorageConfig, CliError> {
    let merged = StorageArgs::merge_from_layers(layers).map_err(CliError::from)?;
    Ok(StorageConfig::from(merged))
}

#[cfg(test)]
mod tests;
