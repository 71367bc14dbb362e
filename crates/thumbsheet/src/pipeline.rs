//! Scan a folder and build its thumbnail workbook

use std::path::PathBuf;

use log::{debug, info, warn};

use crate::config::{Config, ErrorPolicy};
use crate::error::Result;
use crate::scan::{ScannedFile, Scanner};
use crate::sheet::ImageSheet;
use crate::thumbnail::Thumbnail;

/// Outcome of a successful [`run`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Path of the written workbook
    pub output: PathBuf,
    /// Number of data rows (one per image)
    pub rows_written: u32,
    /// Files left out under [`ErrorPolicy::Skip`]
    pub skipped: Vec<PathBuf>,
}

/// Build the workbook described by `config`.
///
/// `on_file` is called for every matching file, in scan order, before it is
/// processed. Under [`ErrorPolicy::Abort`] the first failure is returned and
/// the workbook is never finalized. Under [`ErrorPolicy::Skip`] files that fail
/// to decode or encode are logged and left out; scan and write failures still
/// abort.
pub fn run<F>(config: &Config, mut on_file: F) -> Result<RunSummary>
where
    F: FnMut(&ScannedFile),
{
    config.validate()?;

    let output = config.output_path();
    let options = config.thumbnail_options();

    let mut sheet = ImageSheet::create(&output, config.sheet_layout())?;
    let mut skipped = Vec::new();

    for file in Scanner::new(&config.input, config.extension.as_str())? {
        let file = file?;
        on_file(&file);

        let thumbnail = match Thumbnail::from_path(&file.path, &options) {
            Ok(thumbnail) => thumbnail,
            Err(err) if config.error_policy == ErrorPolicy::Skip && err.is_skippable() => {
                warn!("skipping {}: {}", file.path.display(), err);
                skipped.push(file.path);
                continue;
            }
            Err(err) => return Err(err),
        };

        debug!(
            "row {}: {} -> {}x{} thumbnail ({} bytes)",
            sheet.rows_written() + 1,
            file.name,
            thumbnail.width(),
            thumbnail.height(),
            thumbnail.data().len()
        );
        sheet.append_row(sheet.rows_written(), &file.name, &thumbnail)?;
    }

    let rows_written = sheet.rows_written();
    let output = sheet.finalize()?;
    info!(
        "wrote {} rows to {} ({} skipped)",
        rows_written,
        output.display(),
        skipped.len()
    );

    Ok(RunSummary {
        output,
        rows_written,
        skipped,
    })
}
