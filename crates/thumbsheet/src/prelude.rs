//! Prelude module - common imports for thumbsheet users
//!
//! ```rust
//! use thumbsheet::prelude::*;
//! ```

pub use crate::{
    // Pipeline
    run,
    Config,
    ErrorPolicy,
    RunSummary,

    // Building blocks
    ImageSheet,
    ScannedFile,
    Scanner,
    SheetLayout,
    Thumbnail,
    ThumbnailOptions,

    // Error types
    Error,
    Result,

    // Workbook model and I/O
    Workbook,
    WorkbookExt,
    Worksheet,
    XlsxReader,
    XlsxWriter,
};
