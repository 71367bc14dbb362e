//! Error types for thumbsheet

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building a thumbnail workbook
#[derive(Debug, Error)]
pub enum Error {
    /// Directory traversal failed
    #[error("Directory scan failed: {0}")]
    Scan(#[from] walkdir::Error),

    /// Scan root is not a directory
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// Image could not be decoded
    #[error("Failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Thumbnail could not be encoded
    #[error("Failed to encode thumbnail: {0}")]
    Encode(#[source] image::ImageError),

    /// IO error on a specific path
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Workbook serialization error
    #[error("XLSX error: {0}")]
    Xlsx(#[from] thumbsheet_xlsx::XlsxError),

    /// Workbook model error
    #[error("Workbook error: {0}")]
    Core(#[from] thumbsheet_core::Error),

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Rows must be appended in increasing order without gaps
    #[error("Row {got} appended out of order (expected {expected})")]
    RowOutOfOrder { expected: u32, got: u32 },
}

impl Error {
    /// Create an IO error for a path
    pub fn io<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether a run can skip the file that raised this error and continue
    pub fn is_skippable(&self) -> bool {
        matches!(self, Error::Decode { .. } | Error::Encode(_))
    }
}
