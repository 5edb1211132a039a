//! Error types emitted by the mapnotes CLI.

use std::sync::Arc;

use camino::Utf8PathBuf;
use mapnotes_core::{
    DraftError, ExportError, QueueError, RecordId, StoreError, ValidationError,
};
use thiserror::Error;

/// Errors emitted by the mapnotes CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// Opening the record database failed.
    #[error("failed to open record store at {path:?}: {source}")]
    OpenStore {
        path: Utf8PathBuf,
        #[source]
        source: StoreError,
    },
    /// A store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The background worker could not run the request.
    #[error(transparent)]
    Queue(#[from] QueueError),
    /// A point failed validation.
    #[error("invalid point: {0}")]
    InvalidPoint(#[from] ValidationError),
    /// A shape failed validation.
    #[error("invalid shape: {0}")]
    InvalidShape(#[from] DraftError),
    /// No record with the requested id exists.
    #[error("no {kind} with id {id}")]
    NoSuchRecord { kind: &'static str, id: RecordId },
    /// Exporting to a markup file failed.
    #[error(transparent)]
    Export(#[from] ExportError),
    /// Records could not be encoded as JSON.
    #[error("failed to serialise records: {0}")]
    SerialiseRecords(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
