use std::path::PathBuf;
use thiserror::Error;

/// The main error type for bib-tfrecord operations.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read image {path}: {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read annotation {path}: {source}")]
    AnnotationRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse annotation {path}: {message}")]
    AnnotationParse { path: PathBuf, message: String },

    #[error("Label '{name}' in {path} is not in the label table")]
    LabelNotFound { name: String, path: PathBuf },

    #[error("Bounding box {index} has {len} coordinate(s); expected 4")]
    BBoxArity { index: usize, len: usize },

    #[error("Invalid dataset layout at {path}: {message}")]
    DatasetLayout { path: PathBuf, message: String },

    #[error("Failed to load label table from {path}: {message}")]
    LabelTableParse { path: PathBuf, message: String },

    #[error("Corrupt TFRecord data in {path} at byte {offset}: {message}")]
    RecordCorrupt {
        path: PathBuf,
        offset: u64,
        message: String,
    },

    #[error("Failed to decode Example record {index} in {path}: {source}")]
    RecordDecode {
        path: PathBuf,
        index: usize,
        #[source]
        source: prost::DecodeError,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}
