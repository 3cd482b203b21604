use std::path::PathBuf;
use thiserror::Error;

/// Every failure the filter can run into, from reading inputs to the external COMMIT process.
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse connectome {}: {source}", path.display())]
    ConnectomeCsv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error(
        "connectome {}: row {row}, column {col}: cannot parse {value:?} as a number",
        path.display()
    )]
    ConnectomeValue {
        path: PathBuf,
        row: usize,
        col: usize,
        value: String,
    },

    #[error("connectome must be a square matrix, found {rows} x {cols}")]
    NotSquare { rows: usize, cols: usize },

    #[error("connectome entry ({row}, {col}) = {value} is not a valid streamline count")]
    InvalidCount { row: usize, col: usize, value: f64 },

    #[error(
        "bundle sizes sum to {expected} streamlines but the coefficient vector has {found} entries"
    )]
    GroupSizeMismatch { expected: usize, found: usize },

    #[error("bundle sizes add up to more than {} streamlines", usize::MAX)]
    TooManyStreamlines,

    #[error("{groups} bundle sizes but {blocks} blocks")]
    BlockCount { groups: usize, blocks: usize },

    #[error("block {start}..{end} of group {group} does not hold {size} of the {len} coefficients")]
    InvalidBlock {
        group: usize,
        start: usize,
        end: usize,
        size: usize,
        len: usize,
    },

    #[error("invalid coefficient file {}: {reason}", path.display())]
    Coefficients { path: PathBuf, reason: String },

    #[error("failed to parse parameter file {}: {source}", path.display())]
    Params {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize parameters: {0}")]
    ParamsSerialize(#[from] toml::ser::Error),

    #[error("failed to write group table: {0}")]
    GroupTable(#[from] csv::Error),

    #[error("bridge protocol error: {0}")]
    Protocol(#[from] serde_json::Error),

    #[error("COMMIT bridge process: {0}")]
    Bridge(String),

    #[error("COMMIT {op} failed: {message}")]
    Library { op: String, message: String },
}

impl FilterError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, FilterError>;
