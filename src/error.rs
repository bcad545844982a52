use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Reasons a data file could not be turned into a [`Dataset`](crate::data::model::Dataset).
///
/// A failed load never touches the current dataset or selection.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{}: line {line} has {found} fields but the header has {expected}", .path.display())]
    Malformed {
        path: PathBuf,
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("{}: missing header row", .0.display())]
    NoHeader(PathBuf),

    #[error("{}: file contains no data rows", .0.display())]
    Empty(PathBuf),

    #[error("{}: {source}", .path.display())]
    Parquet {
        path: PathBuf,
        #[source]
        source: parquet::errors::ParquetError,
    },

    #[error("building column table: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Zoom bounds that are inverted (or not numbers at all).
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("invalid zoom range: min {min} is greater than max {max}")]
pub struct InvalidRangeError {
    pub min: f64,
    pub max: f64,
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Summary statistics were requested for an array with no elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot summarize an empty array")]
pub struct EmptyInputError;

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("nothing to export: no view has been rendered yet")]
    NothingRendered,

    #[error("export directory {} is not writable", .dir.display())]
    NotWritable {
        dir: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("rendering failed: {0}")]
    Render(String),

    #[error("encoding image: {0}")]
    Encode(#[from] image::ImageError),
}

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

/// Failure to persist the preferences document. Never fatal: the in-memory
/// preferences stay valid for the rest of the session.
#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("no writable preferences location")]
    NoLocation,

    #[error("writing {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serializing preferences: {0}")]
    Serialize(#[from] toml::ser::Error),
}
