//! XLSX error types

use thiserror::Error;

/// Result type for XLSX operations
pub type XlsxResult<T> = std::result::Result<T, XlsxError>;

/// Errors raised while writing or reading a thumbsheet package
#[derive(Debug, Error)]
pub enum XlsxError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Not a workbook this crate can write or read
    #[error("Invalid XLSX package: {0}")]
    InvalidFormat(String),

    /// A part referenced by the package is absent from the archive
    #[error("Package part not found: {0}")]
    MissingPart(String),

    /// A cell reference or value that cannot be interpreted
    #[error("Malformed value: {0}")]
    Parse(String),

    /// Workbook model rejected a value read from the package
    #[error("Workbook error: {0}")]
    Core(#[from] thumbsheet_core::Error),
}
