//! # thumbsheet-xlsx
//!
//! XLSX (Office Open XML) writer and reader for thumbsheet workbooks,
//! including cell-anchored pictures stored as DrawingML parts.

pub mod error;
pub mod reader;
mod text;
pub mod writer;

pub use error::{XlsxError, XlsxResult};
pub use reader::XlsxReader;
pub use writer::XlsxWriter;
