//! Error types for the AMASS converters. Every variant names the stage that
//! failed and the archive field involved.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("load failed: could not read archive {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("load failed: {path} is not a valid npz archive: {reason}")]
    CorruptArchive { path: PathBuf, reason: String },

    #[error("load failed: entry `{field}` could not be decoded: {reason}")]
    Entry { field: String, reason: String },

    #[error("load failed: {archive} archive has no field `{field}`")]
    MissingField { archive: &'static str, field: String },

    #[error("load failed: field `{field}` should be {expected}, found {found}")]
    UnexpectedKind {
        field: String,
        expected: &'static str,
        found: String,
    },

    #[error("shape mismatch in {fields}: expected {expected}, found {found}")]
    ShapeMismatch { fields: String, expected: String, found: String },

    #[error("field `{field}` holds a non-finite value at frame {frame}, joint {joint}")]
    NonFinite { field: String, frame: usize, joint: usize },

    #[error("encoding failed: field `{field}` {reason}")]
    Encoding { field: String, reason: String },

    #[error("write failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("output format `{0}` is not available in this build")]
    UnsupportedOutput(String),

    #[cfg(feature = "hdf5")]
    #[error("hdf5 error: {0}")]
    Hdf5(#[from] hdf5::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn shape_mismatch(fields: &[&str], expected: impl ToString, found: impl ToString) -> Self {
        Error::ShapeMismatch {
            fields: fields.join(", "),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}
