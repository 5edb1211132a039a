//! Whole-document assembly and duplicate-aware merging.

use std::borrow::Cow;

use log::debug;
use quick_xml::Reader;
use quick_xml::events::Event;

use super::{
    CLOSING_TAGS, DOCUMENT_OPEN, KML_OPEN, MapItem, MarkupError, XML_DECLARATION, escape_text,
};

/// Build a complete document containing every item, in order.
///
/// # Examples
/// ```
/// use mapnotes_core::markup::{count_placemarks, new_document};
/// use mapnotes_core::{MapItem, Point};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let point = Point::new(41.3, 2.17, "Font", "12/05/2024", "A1")?;
/// let doc = new_document("Dades del Mapa", &[MapItem::from(&point)]);
/// assert_eq!(count_placemarks(&doc)?, 1);
/// # Ok(())
/// # }
/// ```
#[must_use]
pub fn new_document(title: &str, items: &[MapItem<'_>]) -> String {
    let mut doc = String::from(XML_DECLARATION);
    doc.push_str(KML_OPEN);
    doc.push_str(DOCUMENT_OPEN);
    doc.push_str("<name>");
    doc.push_str(&escape_text(title));
    doc.push_str("</name>\n");
    for item in items {
        doc.push_str(&item.fragment());
    }
    doc.push_str(CLOSING_TAGS);
    doc.push('\n');
    doc
}

/// Outcome of merging items into an existing document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merge {
    /// Document text after the merge.
    pub content: String,
    /// Number of placemarks added.
    pub appended: usize,
    /// Number of items already present and left out.
    pub skipped: usize,
}

impl Merge {
    /// Whether the merge added anything.
    #[must_use]
    pub const fn changed(&self) -> bool {
        self.appended > 0
    }
}

/// Merge `items` into `existing`, skipping those already present.
///
/// An item counts as present when the document contains both its `<name>`
/// element and its trimmed fragment. New fragments go immediately before the
/// last `</Document>\n</kml>`; anything after that marker is kept. A document
/// without the marker gets the fragments and a fresh pair of closing tags
/// appended. Duplicates within `items` are not collapsed.
///
/// CRLF line endings in `existing` are read as LF, so a merged document is
/// always written with LF endings.
#[must_use]
pub fn merge_document(existing: &str, items: &[MapItem<'_>]) -> Merge {
    let normalised = normalise_line_endings(existing);
    let existing = normalised.as_ref();
    let mut fresh = String::new();
    let mut appended = 0;
    let mut skipped = 0;
    for item in items {
        let fragment = item.fragment();
        if is_present(existing, &item.name_element(), &fragment) {
            debug!("skipping placemark {:?}: already exported", item.display_name());
            skipped += 1;
        } else {
            fresh.push_str(&fragment);
            appended += 1;
        }
    }

    if appended == 0 {
        return Merge {
            content: existing.to_owned(),
            appended,
            skipped,
        };
    }

    let content = match existing
        .rfind(CLOSING_TAGS)
        .and_then(|at| existing.split_at_checked(at))
    {
        Some((head, tail)) => {
            let mut merged = String::with_capacity(existing.len() + fresh.len());
            merged.push_str(head);
            merged.push_str(&fresh);
            merged.push_str(tail);
            merged
        }
        None => {
            debug!("document has no closing tags; appending them");
            let mut merged = String::with_capacity(existing.len() + fresh.len() + 32);
            merged.push_str(existing);
            merged.push_str(&fresh);
            merged.push_str(CLOSING_TAGS);
            merged.push('\n');
            merged
        }
    };
    Merge {
        content,
        appended,
        skipped,
    }
}

fn normalise_line_endings(text: &str) -> Cow<'_, str> {
    if text.contains("\r\n") {
        Cow::Owned(text.replace("\r\n", "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

fn is_present(existing: &str, name_element: &str, fragment: &str) -> bool {
    existing.contains(name_element) && existing.contains(fragment.trim())
}

/// Count `<Placemark>` elements in a well-formed document.
///
/// # Errors
/// Returns [`MarkupError::Malformed`] when the XML cannot be parsed and
/// [`MarkupError::Unbalanced`] when elements remain open at end of input.
pub fn count_placemarks(doc: &str) -> Result<usize, MarkupError> {
    let mut reader = Reader::from_str(doc);
    let mut depth = 0_usize;
    let mut placemarks = 0_usize;
    loop {
        match reader
            .read_event()
            .map_err(|source| MarkupError::Malformed { source })?
        {
            Event::Start(start) => {
                depth += 1;
                if start.local_name().as_ref() == b"Placemark" {
                    placemarks += 1;
                }
            }
            Event::Empty(empty) => {
                if empty.local_name().as_ref() == b"Placemark" {
                    placemarks += 1;
                }
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => break,
            _ => {}
        }
    }
    if depth == 0 {
        Ok(placemarks)
    } else {
        Err(MarkupError::Unbalanced { open: depth })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::DOCUMENT_TITLE;
    use crate::{Point, Shape, ShapeKind};
    use rstest::{fixture, rstest};

    #[fixture]
    fn font() -> Point {
        Point::new(41.3, 2.17, "Font", "12/05/2024", "A1").expect("valid point")
    }

    #[fixture]
    fn mill() -> Point {
        Point::new(41.4, 2.2, "Molí", "13/05/2024", "").expect("valid point")
    }

    #[fixture]
    fn field() -> Shape {
        let vertices = crate::codec::decode_vertices("41.0,2.0;41.1,2.0;41.1,2.1;41.0,2.0");
        Shape::from_parts(ShapeKind::Polygon, vertices, "Camp", 1234.5, None)
            .expect("valid polygon")
    }

    #[rstest]
    fn new_document_has_header_title_and_closing_tags(font: Point) {
        let doc = new_document(DOCUMENT_TITLE, &[MapItem::from(&font)]);
        assert!(doc.starts_with(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <kml xmlns=\"http://www.opengis.net/kml/2.2\">\n\
             <Document>\n\
             <name>Dades del Mapa</name>\n\
             <Placemark>\n"
        ));
        assert!(doc.ends_with("</Placemark>\n</Document>\n</kml>\n"));
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(3)]
    fn new_document_holds_one_placemark_per_item(font: Point, #[case] count: usize) {
        let items = vec![MapItem::from(&font); count];
        let doc = new_document("t", &items);
        assert_eq!(count_placemarks(&doc).expect("well-formed"), count);
    }

    #[rstest]
    fn merging_a_present_item_is_a_no_op(font: Point, field: Shape) {
        let items = [MapItem::from(&font), MapItem::from(&field)];
        let doc = new_document(DOCUMENT_TITLE, &items);
        let merge = merge_document(&doc, &items);
        assert_eq!(merge.content, doc);
        assert_eq!((merge.appended, merge.skipped), (0, 2));
        assert!(!merge.changed());
    }

    #[rstest]
    fn merging_a_new_item_keeps_existing_placemarks(font: Point, mill: Point) {
        let doc = new_document(DOCUMENT_TITLE, &[MapItem::from(&font)]);
        let merge = merge_document(&doc, &[MapItem::from(&font), MapItem::from(&mill)]);
        assert_eq!((merge.appended, merge.skipped), (1, 1));
        assert_eq!(count_placemarks(&merge.content).expect("well-formed"), 2);
        let font_at = merge.content.find("<name>Font</name>").expect("font kept");
        let mill_at = merge.content.find("<name>Molí</name>").expect("mill added");
        assert!(font_at < mill_at);
        assert!(merge.content.ends_with("</Placemark>\n</Document>\n</kml>\n"));
    }

    #[rstest]
    fn merge_is_idempotent(font: Point, mill: Point) {
        let doc = new_document(DOCUMENT_TITLE, &[MapItem::from(&font)]);
        let once = merge_document(&doc, &[MapItem::from(&mill)]);
        let twice = merge_document(&once.content, &[MapItem::from(&mill)]);
        assert_eq!(twice.content, once.content);
    }

    #[rstest]
    fn same_name_with_different_data_is_appended(font: Point) {
        let doc = new_document(DOCUMENT_TITLE, &[MapItem::from(&font)]);
        let moved = Point::new(41.31, 2.17, "Font", "12/05/2024", "A1").expect("valid point");
        let merge = merge_document(&doc, &[MapItem::from(&moved)]);
        assert_eq!(merge.appended, 1);
        assert_eq!(count_placemarks(&merge.content).expect("well-formed"), 2);
    }

    #[rstest]
    fn splice_uses_the_last_closing_marker(font: Point) {
        let doc = "<?xml version=\"1.0\"?>\n<kml>\n<Document>\n\
                   <description>ends with </Document>\n</kml> literally</description>\n\
                   </Document>\n</kml>\n<!-- trailer -->\n";
        let merge = merge_document(doc, &[MapItem::from(&font)]);
        assert!(merge.content.ends_with(
            "</Placemark>\n</Document>\n</kml>\n<!-- trailer -->\n"
        ));
        assert!(merge.content.contains("literally</description>\n<Placemark>"));
    }

    #[rstest]
    fn crlf_documents_recognise_present_items(font: Point) {
        let doc = new_document(DOCUMENT_TITLE, &[MapItem::from(&font)]).replace('\n', "\r\n");
        let merge = merge_document(&doc, &[MapItem::from(&font)]);
        assert_eq!((merge.appended, merge.skipped), (0, 1));
        assert!(!merge.changed());
    }

    #[rstest]
    fn crlf_documents_splice_before_the_closing_tags(font: Point, mill: Point) {
        let doc = new_document(DOCUMENT_TITLE, &[MapItem::from(&font)]).replace('\n', "\r\n");
        let merge = merge_document(&doc, &[MapItem::from(&mill)]);
        assert_eq!(merge.appended, 1);
        assert_eq!(count_placemarks(&merge.content).expect("well-formed"), 2);
        assert_eq!(merge.content.matches("</kml>").count(), 1);
        assert!(merge.content.ends_with("</Placemark>\n</Document>\n</kml>\n"));
        assert!(!merge.content.contains('\r'));
    }

    #[rstest]
    fn missing_closing_tags_are_appended(font: Point) {
        let merge = merge_document("<kml>\n<Document>\n", &[MapItem::from(&font)]);
        assert!(merge.content.starts_with("<kml>\n<Document>\n<Placemark>\n"));
        assert!(merge.content.ends_with("</Placemark>\n</Document>\n</kml>\n"));
        assert_eq!(count_placemarks(&merge.content).expect("well-formed"), 1);
    }

    #[rstest]
    fn duplicates_within_one_batch_are_all_written(font: Point) {
        let doc = new_document(DOCUMENT_TITLE, &[]);
        let merge = merge_document(&doc, &[MapItem::from(&font), MapItem::from(&font)]);
        assert_eq!(merge.appended, 2);
    }

    #[rstest]
    #[case("<kml><Document>")]
    #[case("<kml><Placemark></Placemark>")]
    fn unclosed_documents_are_rejected(#[case] doc: &str) {
        assert!(matches!(
            count_placemarks(doc),
            Err(MarkupError::Unbalanced { .. } | MarkupError::Malformed { .. })
        ));
    }

    #[rstest]
    fn mismatched_tags_are_malformed() {
        assert!(matches!(
            count_placemarks("<kml><Document></kml>"),
            Err(MarkupError::Malformed { .. })
        ));
    }

    #[rstest]
    fn empty_placemark_elements_are_counted() {
        assert_eq!(
            count_placemarks("<kml><Document><Placemark/></Document></kml>").expect("well-formed"),
            1
        );
    }
}
