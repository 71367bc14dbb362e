//! Run configuration
//!
//! Defaults reproduce the classic layout: a 95 pixel image column and row
//! height, thumbnails bounded to 90 pixels, JPEG quality 50, pictures inset by
//! 2 pixels, and output written to `result.xlsx` inside the scanned folder.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::sheet::SheetLayout;
use crate::thumbnail::ThumbnailOptions;

/// Default cell size (image column width and data row height), in pixels
pub const DEFAULT_CELL_SIZE: u32 = 95;

/// Default gap between the thumbnail box and the cell size, in pixels
pub const DEFAULT_MARGIN: u32 = 5;

/// Default JPEG quality of re-encoded thumbnails
pub const DEFAULT_QUALITY: u8 = 50;

/// Default picture inset from its cell's top-left corner, in pixels
pub const DEFAULT_IMAGE_OFFSET: (u32, u32) = (2, 2);

/// Default file name suffix to match
pub const DEFAULT_EXTENSION: &str = ".jpg";

/// Default output file name, created inside the input folder
pub const DEFAULT_OUTPUT_NAME: &str = "result.xlsx";

/// What to do when a single image cannot be turned into a thumbnail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Stop at the first failure; no workbook is finalized
    #[default]
    Abort,
    /// Log the failure, record the file as skipped and continue
    Skip,
}

/// Configuration for a [`run`](crate::pipeline::run)
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Folder to scan recursively
    pub input: PathBuf,
    /// Output workbook path; `<input>/result.xlsx` when unset
    pub output: Option<PathBuf>,
    /// File name suffix to match (case-sensitive)
    pub extension: String,
    /// Image column width and data row height, in pixels
    pub cell_size: u32,
    /// Thumbnails are bounded to `cell_size - margin` pixels
    pub margin: u32,
    /// JPEG quality (1-100)
    pub quality: u8,
    /// Picture inset `(x, y)` from the cell's top-left corner, in pixels
    pub image_offset: (u32, u32),
    /// Header labels for the filename and image columns
    pub headers: (String, String),
    /// Worksheet name
    pub sheet_name: String,
    /// Per-file failure handling
    pub error_policy: ErrorPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: PathBuf::from("."),
            output: None,
            extension: DEFAULT_EXTENSION.to_string(),
            cell_size: DEFAULT_CELL_SIZE,
            margin: DEFAULT_MARGIN,
            quality: DEFAULT_QUALITY,
            image_offset: DEFAULT_IMAGE_OFFSET,
            headers: ("Filename".to_string(), "Image".to_string()),
            sheet_name: "Sheet1".to_string(),
            error_policy: ErrorPolicy::default(),
        }
    }
}

impl Config {
    /// Create a configuration with default settings for an input folder
    pub fn new<P: Into<PathBuf>>(input: P) -> Self {
        Self {
            input: input.into(),
            ..Default::default()
        }
    }

    pub fn with_output<P: Into<PathBuf>>(mut self, output: P) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_extension<S: Into<String>>(mut self, extension: S) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_cell_size(mut self, cell_size: u32) -> Self {
        self.cell_size = cell_size;
        self
    }

    pub fn with_margin(mut self, margin: u32) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_image_offset(mut self, x: u32, y: u32) -> Self {
        self.image_offset = (x, y);
        self
    }

    pub fn with_headers<A: Into<String>, B: Into<String>>(mut self, filename: A, image: B) -> Self {
        self.headers = (filename.into(), image.into());
        self
    }

    pub fn with_sheet_name<S: Into<String>>(mut self, name: S) -> Self {
        self.sheet_name = name.into();
        self
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Where the workbook will be written
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.input.join(DEFAULT_OUTPUT_NAME))
    }

    /// Side of the square box thumbnails must fit in
    pub fn thumbnail_box(&self) -> u32 {
        self.cell_size.saturating_sub(self.margin)
    }

    /// Thumbnail settings derived from this configuration
    pub fn thumbnail_options(&self) -> ThumbnailOptions {
        ThumbnailOptions {
            max_size: self.thumbnail_box(),
            quality: self.quality,
        }
    }

    /// Worksheet layout derived from this configuration
    pub fn sheet_layout(&self) -> SheetLayout {
        SheetLayout {
            sheet_name: self.sheet_name.clone(),
            cell_size: self.cell_size,
            image_offset: self.image_offset,
            headers: self.headers.clone(),
        }
    }

    /// Check the configuration for values that cannot produce a workbook
    pub fn validate(&self) -> Result<()> {
        if self.extension.is_empty() {
            return Err(Error::InvalidConfig("extension cannot be empty".into()));
        }
        if self.cell_size == 0 {
            return Err(Error::InvalidConfig("cell size must be positive".into()));
        }
        if self.thumbnail_box() == 0 {
            return Err(Error::InvalidConfig(format!(
                "margin {} leaves no room for a thumbnail in a {} pixel cell",
                self.margin, self.cell_size
            )));
        }
        if !(1..=100).contains(&self.quality) {
            return Err(Error::InvalidConfig(format!(
                "JPEG quality must be between 1 and 100, got {}",
                self.quality
            )));
        }
        if self.image_offset.0 >= self.cell_size || self.image_offset.1 >= self.cell_size {
            return Err(Error::InvalidConfig(format!(
                "image offset {:?} falls outside a {} pixel cell",
                self.image_offset, self.cell_size
            )));
        }
        if !is_dir(&self.input) {
            return Err(Error::NotADirectory(self.input.clone()));
        }
        Ok(())
    }
}

fn is_dir(path: &Path) -> bool {
    path.metadata().map(|m| m.is_dir()).unwrap_or(false)
}
