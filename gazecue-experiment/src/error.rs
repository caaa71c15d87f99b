use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no stimulus onset asynchronies configured")]
    EmptyOnsetAsyncs,

    #[error("stimulus onset asynchrony {0} ms listed more than once")]
    DuplicateOnsetAsync(u64),

    #[error("max response window must be positive")]
    ZeroResponseWindow,

    #[error("{field} of {ms} ms exceeds the ten minute limit")]
    DurationTooLong { field: &'static str, ms: u64 },

    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("invalid search pattern {0}")]
    Pattern(String),

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no image number in file name {0}")]
    Untagged(PathBuf),

    #[error("failed to load image {path}: {message}")]
    Image { path: PathBuf, message: String },
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("results JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid data directory pattern {0}")]
    Pattern(String),
}
