use std::path::PathBuf;

use thiserror::Error;

use super::model::RecordSchema;

/// Failures while building or filtering a label dataset.
#[derive(Debug, Error)]
pub enum LabelError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unknown JSON content in {path}: expected an object with 'annotations' or an array")]
    UnknownJsonShape { path: PathBuf },
    #[error("Annotation {index}: missing field '{field}'")]
    MissingField { index: usize, field: &'static str },
    #[error("Annotation {index}: invalid field '{field}': {reason}")]
    InvalidField {
        index: usize,
        field: &'static str,
        reason: String,
    },
    #[error("{path}:{line}: {reason}")]
    MalformedLine {
        path: PathBuf,
        line: usize,
        reason: String,
    },
    #[error("Mixed record layouts in {context}: expected {expected}, found {found}")]
    SchemaMismatch {
        expected: RecordSchema,
        found: RecordSchema,
        context: String,
    },
    #[error("Invalid image shape {width}x{height}")]
    InvalidImageShape { width: u32, height: u32 },
    #[error("Labels carry no confidence column")]
    ConfidenceUnavailable,
    #[error("Unsupported label source: {path}")]
    UnsupportedSource { path: PathBuf },
}

impl LabelError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LabelError::Io {
            path: path.into(),
            source,
        }
    }
}
