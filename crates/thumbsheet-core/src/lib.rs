//! # thumbsheet-core
//!
//! Core data structures for the thumbsheet workbook model.
//!
//! This crate provides the in-memory document that the XLSX writer serializes:
//! - [`CellValue`] - Represents cell values (numbers, strings, booleans)
//! - [`CellAddress`] and [`CellRange`] - Cell addressing and ranges
//! - [`Picture`] - An image anchored to a cell
//! - [`Workbook`], [`Worksheet`] - The main document structures
//! - [`units`] - Conversions between pixels, character widths, points and EMUs
//!
//! ## Example
//!
//! ```rust
//! use thumbsheet_core::{Workbook, CellValue};
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//!
//! sheet.set_cell_value("A1", "Filename").unwrap();
//! sheet.set_cell_value_at(1, 0, CellValue::string("a.jpg")).unwrap();
//! sheet.set_column_width_pixels(1, 95);
//! sheet.set_row_height_pixels(1, 95);
//! ```

pub mod cell;
pub mod error;
pub mod picture;
pub mod units;
pub mod workbook;
pub mod worksheet;

// Re-exports for convenience
pub use cell::{CellAddress, CellData, CellRange, CellValue};
pub use error::{Error, Result};
pub use picture::{ObjectPosition, Picture, PictureFormat};
pub use workbook::{DocumentProperties, Workbook};
pub use worksheet::{AnchorMarker, PictureAnchor, Worksheet};

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
