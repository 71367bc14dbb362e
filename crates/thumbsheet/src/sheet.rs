//! Append-only worksheet of filenames and thumbnails

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::debug;
use thumbsheet_core::{ObjectPosition, Picture, Workbook, Worksheet};
use thumbsheet_xlsx::XlsxWriter;

use crate::config::{DEFAULT_CELL_SIZE, DEFAULT_IMAGE_OFFSET};
use crate::error::{Error, Result};
use crate::thumbnail::Thumbnail;

const FILENAME_COL: u16 = 0;
const IMAGE_COL: u16 = 1;

/// Geometry and labels of the output worksheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLayout {
    pub sheet_name: String,
    /// Image column width and data row height, in pixels
    pub cell_size: u32,
    /// Picture inset `(x, y)` from the cell's top-left corner, in pixels
    pub image_offset: (u32, u32),
    /// Header labels for the filename and image columns
    pub headers: (String, String),
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            sheet_name: "Sheet1".to_string(),
            cell_size: DEFAULT_CELL_SIZE,
            image_offset: DEFAULT_IMAGE_OFFSET,
            headers: ("Filename".to_string(), "Image".to_string()),
        }
    }
}

/// A workbook being filled one row per image.
///
/// The output file is created when the sheet is, rows are appended in order
/// below the header row, and [`finalize`](ImageSheet::finalize) writes the
/// workbook exactly once. Dropping an unfinalized sheet leaves the output file
/// empty.
pub struct ImageSheet {
    path: PathBuf,
    file: File,
    workbook: Workbook,
    layout: SheetLayout,
    rows_written: u32,
}

impl ImageSheet {
    /// Create (or truncate) the output file and write the header row
    pub fn create<P: AsRef<Path>>(path: P, layout: SheetLayout) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let mut workbook = Workbook::new();
        workbook.rename_worksheet(0, &layout.sheet_name)?;

        let sheet = first_sheet(&mut workbook)?;
        sheet.set_column_width_pixels(IMAGE_COL, layout.cell_size);
        sheet.set_cell_value_at(0, FILENAME_COL, layout.headers.0.as_str())?;
        sheet.set_cell_value_at(0, IMAGE_COL, layout.headers.1.as_str())?;

        let file = File::create(&path).map_err(|source| Error::io(&path, source))?;
        debug!("created {}", path.display());

        Ok(Self {
            path,
            file,
            workbook,
            layout,
            rows_written: 0,
        })
    }

    /// Append the data row `index` (0-based, below the header).
    ///
    /// `index` must equal the number of rows already appended.
    pub fn append_row(&mut self, index: u32, filename: &str, thumbnail: &Thumbnail) -> Result<()> {
        if index != self.rows_written {
            return Err(Error::RowOutOfOrder {
                expected: self.rows_written,
                got: index,
            });
        }

        let row = index + 1;
        let (x, y) = self.layout.image_offset;
        let picture = Picture::new(
            thumbnail.data().to_vec(),
            thumbnail.width(),
            thumbnail.height(),
        )?
        .with_offset(x, y)
        .with_position(ObjectPosition::MoveAndSize)
        .with_description(filename);

        let cell_size = self.layout.cell_size;
        let sheet = first_sheet(&mut self.workbook)?;
        sheet.set_row_height_pixels(row, cell_size);
        sheet.set_cell_value_at(row, FILENAME_COL, filename)?;
        sheet.insert_picture_at(row, IMAGE_COL, picture)?;

        self.rows_written += 1;
        Ok(())
    }

    /// Number of data rows appended so far
    pub fn rows_written(&self) -> u32 {
        self.rows_written
    }

    /// Output file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The workbook as built so far
    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    /// Serialize the workbook into the output file and close it
    pub fn finalize(self) -> Result<PathBuf> {
        let Self {
            path,
            file,
            workbook,
            rows_written,
            ..
        } = self;

        let mut writer = BufWriter::new(file);
        XlsxWriter::write(&workbook, &mut writer)?;
        writer.flush().map_err(|source| Error::io(&path, source))?;

        debug!("wrote {} data rows to {}", rows_written, path.display());
        Ok(path)
    }
}

fn first_sheet(workbook: &mut Workbook) -> Result<&mut Worksheet> {
    workbook
        .worksheet_mut(0)
        .ok_or_else(|| Error::Core(thumbsheet_core::Error::SheetOutOfBounds(0, 0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thumbnail::ThumbnailOptions;
    use image::{DynamicImage, RgbImage};
    use pretty_assertions::assert_eq;
    use thumbsheet_xlsx::XlsxReader;

    fn thumbnail(width: u32, height: u32) -> Thumbnail {
        let img = DynamicImage::ImageRgb8(RgbImage::new(width, height));
        Thumbnail::from_image(img, &ThumbnailOptions::default()).unwrap()
    }

    #[test]
    fn test_create_writes_header_and_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        std::fs::write(&path, b"stale contents").unwrap();

        let sheet = ImageSheet::create(&path, SheetLayout::default()).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);

        let ws = sheet.workbook().worksheet(0).unwrap();
        assert_eq!(ws.get_value("A1").unwrap().as_string(), Some("Filename"));
        assert_eq!(ws.get_value("B1").unwrap().as_string(), Some("Image"));
        assert_eq!(ws.column_width_pixels(1), 95);
    }

    #[test]
    fn test_append_rows_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut sheet = ImageSheet::create(dir.path().join("out.xlsx"), SheetLayout::default())
            .unwrap();

        sheet.append_row(0, "a.jpg", &thumbnail(200, 100)).unwrap();
        assert!(matches!(
            sheet.append_row(2, "c.jpg", &thumbnail(10, 10)),
            Err(Error::RowOutOfOrder {
                expected: 1,
                got: 2
            })
        ));
        assert!(matches!(
            sheet.append_row(0, "a.jpg", &thumbnail(10, 10)),
            Err(Error::RowOutOfOrder { .. })
        ));
        sheet.append_row(1, "b.jpg", &thumbnail(10, 10)).unwrap();
        assert_eq!(sheet.rows_written(), 2);

        let ws = sheet.workbook().worksheet(0).unwrap();
        assert_eq!(ws.get_value("A2").unwrap().as_string(), Some("a.jpg"));
        assert_eq!(ws.row_height_pixels(1), 95);
        let pic = &ws.pictures()[0];
        assert_eq!((pic.row, pic.col), (1, 1));
        assert_eq!((pic.x_offset, pic.y_offset), (2, 2));
        assert_eq!((pic.width, pic.height), (90, 45));
    }

    #[test]
    fn test_finalize_writes_readable_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let layout = SheetLayout {
            sheet_name: "Photos".to_string(),
            ..Default::default()
        };
        let mut sheet = ImageSheet::create(dir.path().join("out.xlsx"), layout).unwrap();
        sheet.append_row(0, "a.jpg", &thumbnail(40, 30)).unwrap();
        let path = sheet.finalize().unwrap();

        let wb = XlsxReader::read_file(&path).unwrap();
        let ws = wb.worksheet(0).unwrap();
        assert_eq!(ws.name(), "Photos");
        assert_eq!(ws.get_value("A2").unwrap().as_string(), Some("a.jpg"));
        assert_eq!(ws.picture_count(), 1);
        assert_eq!(ws.pictures()[0].description.as_deref(), Some("a.jpg"));
    }

    #[test]
    fn test_invalid_sheet_name() {
        let dir = tempfile::tempdir().unwrap();
        let layout = SheetLayout {
            sheet_name: "bad/name".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            ImageSheet::create(dir.path().join("out.xlsx"), layout),
            Err(Error::Core(_))
        ));
        assert!(!dir.path().join("out.xlsx").exists());
    }
}
