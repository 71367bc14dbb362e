//! # thumbsheet
//!
//! Turn a folder of images into an XLSX workbook with one row per image: the
//! file name in column A and a shrunken, re-encoded preview anchored in
//! column B.
//!
//! ## Example
//!
//! ```no_run
//! use thumbsheet::prelude::*;
//!
//! let config = Config::new("photos").with_error_policy(ErrorPolicy::Skip);
//! let summary = run(&config, |file| println!("Processing {}", file.name))?;
//! println!("{} rows written to {}", summary.rows_written, summary.output.display());
//! # Ok::<(), thumbsheet::Error>(())
//! ```
//!
//! The pieces can also be used on their own: [`scan::Scanner`] walks a folder,
//! [`thumbnail::Thumbnail`] shrinks one image and [`sheet::ImageSheet`] appends
//! rows to a workbook.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod prelude;
pub mod scan;
pub mod sheet;
pub mod thumbnail;

pub use config::{Config, ErrorPolicy};
pub use error::{Error, Result};
pub use pipeline::{run, RunSummary};
pub use scan::{ScannedFile, Scanner};
pub use sheet::{ImageSheet, SheetLayout};
pub use thumbnail::{Thumbnail, ThumbnailOptions};

// Re-export the workbook model and XLSX I/O
pub use thumbsheet_core::{
    CellAddress, CellValue, ObjectPosition, Picture, PictureFormat, Workbook, Worksheet,
};
pub use thumbsheet_xlsx::{XlsxError, XlsxReader, XlsxWriter};

use std::path::Path;

/// Extension trait for Workbook to add file I/O
pub trait WorkbookExt {
    /// Open an XLSX workbook from a file
    fn open<P: AsRef<Path>>(path: P) -> Result<Workbook>;

    /// Save the workbook as XLSX
    fn save<P: AsRef<Path>>(&self, path: P) -> Result<()>;
}

impl WorkbookExt for Workbook {
    fn open<P: AsRef<Path>>(path: P) -> Result<Workbook> {
        Ok(XlsxReader::read_file(path)?)
    }

    fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        Ok(XlsxWriter::write_file(self, path)?)
    }
}
