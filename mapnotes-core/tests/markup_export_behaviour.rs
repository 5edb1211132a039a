//! Behavioural tests for KML export using rstest-bdd.

use std::cell::RefCell;

use camino::Utf8PathBuf;
use mapnotes_core::codec::decode_vertices;
use mapnotes_core::{
    DOCUMENT_TITLE, ExportMode, ExportReport, MapItem, Point, Shape, ShapeKind, export_items,
    placemarks_in,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

/// Saved records and export results shared between steps.
#[derive(Debug)]
struct ExportWorld {
    _temp_dir: TempDir,
    root: Utf8PathBuf,
    points: RefCell<Vec<Point>>,
    shapes: RefCell<Vec<Shape>>,
    last_report: RefCell<Option<ExportReport>>,
}

impl ExportWorld {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let root =
            Utf8PathBuf::from_path_buf(temp_dir.path().to_path_buf()).expect("utf8 temp dir");
        Self {
            _temp_dir: temp_dir,
            root,
            points: RefCell::new(Vec::new()),
            shapes: RefCell::new(Vec::new()),
            last_report: RefCell::new(None),
        }
    }

    fn points_file(&self) -> Utf8PathBuf {
        self.root.join("documents/punts.kml")
    }

    fn shapes_file(&self) -> Utf8PathBuf {
        self.root.join("documents/camps.kml")
    }

    fn export_points(&self, mode: ExportMode) {
        let points = self.points.borrow();
        let items: Vec<_> = points.iter().map(MapItem::from).collect();
        let report =
            export_items(&self.points_file(), DOCUMENT_TITLE, &items, mode).expect("export points");
        self.last_report.replace(Some(report));
    }

    fn export_shapes(&self, mode: ExportMode) {
        let shapes = self.shapes.borrow();
        let items: Vec<_> = shapes.iter().map(MapItem::from).collect();
        let report =
            export_items(&self.shapes_file(), DOCUMENT_TITLE, &items, mode).expect("export shapes");
        self.last_report.replace(Some(report));
    }

    fn read(path: &Utf8PathBuf) -> String {
        std::fs::read_to_string(path).expect("read exported file")
    }
}

#[fixture]
fn world() -> ExportWorld {
    ExportWorld::new()
}

fn font() -> Point {
    Point::new(41.3, 2.17, "Font", "12/05/2024", "A1").expect("valid point")
}

#[given("the saved point Font at 41.3, 2.17")]
fn given_font(world: &ExportWorld) {
    world.points.borrow_mut().push(font());
}

#[given("the saved point Molí at 41.4, 2.2")]
fn given_mill(world: &ExportWorld) {
    let mill = Point::new(41.4, 2.2, "Molí", "13/05/2024", "").expect("valid point");
    world.points.borrow_mut().push(mill);
}

#[given("the saved field polygon with an area of 1234.5 square metres")]
fn given_field(world: &ExportWorld) {
    let vertices = decode_vertices("41.0,2.0;41.1,2.0;41.1,2.1;41.0,2.0");
    let field = Shape::from_parts(ShapeKind::Polygon, vertices, "Camp", 1234.5, None)
        .expect("valid polygon");
    world.shapes.borrow_mut().push(field);
}

#[given("the points were already exported to a new file")]
fn given_points_exported(world: &ExportWorld) {
    world.export_points(ExportMode::Create);
}

#[when("I export the points to a new file")]
fn when_export_points(world: &ExportWorld) {
    world.export_points(ExportMode::Create);
}

#[when("I export the shapes to a new file")]
fn when_export_shapes(world: &ExportWorld) {
    world.export_shapes(ExportMode::Create);
}

#[when("I append the points to the points file")]
fn when_append_points(world: &ExportWorld) {
    world.export_points(ExportMode::Append);
}

#[when("I append the shapes to the shapes file")]
fn when_append_shapes(world: &ExportWorld) {
    world.export_shapes(ExportMode::Append);
}

#[when("I append the shapes to the shapes file again")]
fn when_append_shapes_again(world: &ExportWorld) {
    world.export_shapes(ExportMode::Append);
}

#[then("the points file holds exactly one placemark")]
fn then_points_one(world: &ExportWorld) {
    assert_eq!(placemarks_in(&world.points_file()).expect("count"), 1);
}

#[then("the points file holds exactly two placemarks")]
fn then_points_two(world: &ExportWorld) {
    assert_eq!(placemarks_in(&world.points_file()).expect("count"), 2);
}

#[then("the shapes file holds exactly one placemark")]
fn then_shapes_one(world: &ExportWorld) {
    assert_eq!(placemarks_in(&world.shapes_file()).expect("count"), 1);
}

#[then("the points file names the placemark Font")]
fn then_named_font(world: &ExportWorld) {
    assert!(ExportWorld::read(&world.points_file()).contains("<name>Font</name>"));
}

#[then("the points file places Font at 2.17,41.3")]
fn then_font_coordinates(world: &ExportWorld) {
    assert!(
        ExportWorld::read(&world.points_file())
            .contains("<coordinates>2.17,41.3</coordinates>")
    );
}

#[then("the shapes file describes an area of 1234.5 square metres")]
fn then_area(world: &ExportWorld) {
    assert!(
        ExportWorld::read(&world.shapes_file())
            .contains("<description>Àrea: 1234.5 m²</description>")
    );
}

#[then("the shapes file holds a closed ring in lon,lat order")]
fn then_ring(world: &ExportWorld) {
    assert!(ExportWorld::read(&world.shapes_file()).contains(
        "<LinearRing><coordinates>\n2,41 2,41.1 2.1,41.1 2,41\n</coordinates></LinearRing>"
    ));
}

#[then("the last export skipped one record")]
fn then_skipped_one(world: &ExportWorld) {
    let report = world.last_report.borrow();
    let report = report.as_ref().expect("an export should have run");
    assert_eq!(report.skipped, 1);
}

#[then("the Font placemark is unchanged in the points file")]
fn then_font_unchanged(world: &ExportWorld) {
    let font = font();
    let fragment = MapItem::from(&font).fragment();
    let doc = ExportWorld::read(&world.points_file());
    assert_eq!(doc.matches(fragment.as_str()).count(), 1);
    let font_at = doc.find(fragment.as_str()).expect("font placemark");
    let mill_at = doc.find("<name>Molí</name>").expect("mill placemark");
    assert!(font_at < mill_at);
}

#[scenario(path = "tests/features/markup_export.feature", index = 0)]
fn point_export(world: ExportWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/markup_export.feature", index = 1)]
fn polygon_export(world: ExportWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/markup_export.feature", index = 2)]
fn duplicate_append(world: ExportWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/markup_export.feature", index = 3)]
fn append_new_point(world: ExportWorld) {
    let _ = world;
}
