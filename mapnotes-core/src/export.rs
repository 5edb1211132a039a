//! Writing placemarks to markup files on disk.
//!
//! Every write goes through [`mapnotes_fs::replace_atomically`]: the new
//! document is staged next to the target and renamed over it, so a failed
//! export leaves the previous file untouched.

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use thiserror::Error;

use crate::markup::{self, MapItem, MarkupError};

/// File extension for exported documents, without the dot.
pub const MARKUP_EXTENSION: &str = "kml";

/// How to treat an existing target file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportMode {
    /// Write a new document, replacing any existing file.
    #[default]
    Create,
    /// Merge into the existing document, skipping items already present.
    Append,
}

/// Summary of a finished export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    /// File that was written or inspected.
    pub path: Utf8PathBuf,
    /// Placemarks added by this export.
    pub appended: usize,
    /// Items left out because the file already held them.
    pub skipped: usize,
    /// Whether a new document was created.
    pub created: bool,
}

impl ExportReport {
    /// Whether the file on disk changed.
    #[must_use]
    pub const fn wrote(&self) -> bool {
        self.created || self.appended > 0
    }
}

/// Errors raised while exporting.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The requested file name was blank.
    #[error("export file name must not be empty")]
    EmptyFileName,
    /// The requested file name would escape the documents directory.
    #[error("export file name {name:?} must not contain path separators")]
    InvalidFileName {
        /// Name as supplied.
        name: String,
    },
    /// Creating the target's parent directory failed.
    #[error("failed to create directory for {path:?}: {source}")]
    CreateDirectory {
        /// Target file.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Checking whether the target exists failed.
    #[error("failed to inspect {path:?}: {source}")]
    Inspect {
        /// Target file.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Reading the existing document failed.
    #[error("failed to read {path:?}: {source}")]
    Read {
        /// Target file.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Writing the new document failed.
    #[error("failed to write {path:?}: {source}")]
    Write {
        /// Target file.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The documents directory could not be listed.
    #[error("failed to list documents in {path:?}: {source}")]
    DocumentsDirectory {
        /// Directory that was listed.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The document could not be parsed.
    #[error("document {path:?} is not valid markup: {source}")]
    Markup {
        /// Document path.
        path: Utf8PathBuf,
        /// Parser error.
        #[source]
        source: MarkupError,
    },
}

/// Turn a user-supplied name into a markup file name.
///
/// # Errors
/// Rejects blank names and names containing path separators.
///
/// # Examples
/// ```
/// use mapnotes_core::markup_file_name;
///
/// # fn main() -> Result<(), mapnotes_core::ExportError> {
/// assert_eq!(markup_file_name(" camins ")?, "camins.kml");
/// assert_eq!(markup_file_name("camins.kml")?, "camins.kml");
/// assert!(markup_file_name("  ").is_err());
/// # Ok(())
/// # }
/// ```
pub fn markup_file_name(name: &str) -> Result<String, ExportError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ExportError::EmptyFileName);
    }
    if trimmed.contains(['/', '\\']) || trimmed == "." || trimmed == ".." {
        return Err(ExportError::InvalidFileName {
            name: name.to_owned(),
        });
    }
    let suffix = format!(".{MARKUP_EXTENSION}");
    if trimmed.ends_with(&suffix) {
        Ok(trimmed.to_owned())
    } else {
        Ok(format!("{trimmed}{suffix}"))
    }
}

/// Export `items` to `path`.
///
/// `Create` always writes a fresh document. `Append` merges into the
/// existing file, or creates one when none exists. When an append adds
/// nothing the file is not rewritten.
///
/// # Errors
/// Any filesystem failure aborts the export before the target is replaced.
pub fn export_items(
    path: &Utf8Path,
    title: &str,
    items: &[MapItem<'_>],
    mode: ExportMode,
) -> Result<ExportReport, ExportError> {
    mapnotes_fs::ensure_parent_dir(path).map_err(|source| ExportError::CreateDirectory {
        path: path.to_path_buf(),
        source,
    })?;

    let existing = match mode {
        ExportMode::Create => None,
        ExportMode::Append => read_existing(path)?,
    };

    let report = match existing {
        None => {
            write(path, &markup::new_document(title, items))?;
            ExportReport {
                path: path.to_path_buf(),
                appended: items.len(),
                skipped: 0,
                created: true,
            }
        }
        Some(existing) => {
            let merge = markup::merge_document(&existing, items);
            if merge.changed() {
                write(path, &merge.content)?;
            }
            ExportReport {
                path: path.to_path_buf(),
                appended: merge.appended,
                skipped: merge.skipped,
                created: false,
            }
        }
    };
    info!(
        "exported {} placemarks to {path} ({} already present)",
        report.appended, report.skipped
    );
    Ok(report)
}

fn read_existing(path: &Utf8Path) -> Result<Option<String>, ExportError> {
    let exists = mapnotes_fs::file_is_file(path).map_err(|source| ExportError::Inspect {
        path: path.to_path_buf(),
        source,
    })?;
    if !exists {
        return Ok(None);
    }
    mapnotes_fs::read_to_string(path)
        .map(Some)
        .map_err(|source| ExportError::Read {
            path: path.to_path_buf(),
            source,
        })
}

fn write(path: &Utf8Path, contents: &str) -> Result<(), ExportError> {
    mapnotes_fs::replace_atomically(path, contents.as_bytes()).map_err(|source| {
        ExportError::Write {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Count placemarks in the document at `path`.
///
/// # Errors
/// Fails when the file cannot be read or is not well-formed markup.
pub fn placemarks_in(path: &Utf8Path) -> Result<usize, ExportError> {
    let doc = mapnotes_fs::read_to_string(path).map_err(|source| ExportError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    markup::count_placemarks(&doc).map_err(|source| ExportError::Markup {
        path: path.to_path_buf(),
        source,
    })
}

/// Markup files in `dir`, sorted by name.
///
/// # Errors
/// Fails when the directory cannot be read.
pub fn list_markup_files(dir: &Utf8Path) -> Result<Vec<String>, ExportError> {
    mapnotes_fs::list_files_with_extension(dir, MARKUP_EXTENSION).map_err(|source| {
        ExportError::DocumentsDirectory {
            path: dir.to_path_buf(),
            source,
        }
    })
}
