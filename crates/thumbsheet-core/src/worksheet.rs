//! Worksheet type

use std::collections::{BTreeMap, BTreeSet};

use crate::cell::{CellAddress, CellData, CellRange, CellStorage, CellValue};
use crate::error::{Error, Result};
use crate::picture::Picture;
use crate::units;
use crate::{MAX_COLS, MAX_ROWS};

/// A worksheet (single sheet in a workbook)
#[derive(Debug)]
pub struct Worksheet {
    /// Sheet name
    name: String,
    /// Cell storage
    cells: CellStorage,
    /// Pictures, in insertion order
    pictures: Vec<Picture>,
}

/// One corner of a picture's two-cell anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorMarker {
    /// Column index (0-based)
    pub col: u16,
    /// Offset into the column, in pixels
    pub col_offset: u32,
    /// Row index (0-based)
    pub row: u32,
    /// Offset into the row, in pixels
    pub row_offset: u32,
}

/// Resolved placement of a picture on the cell grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PictureAnchor {
    /// Top-left corner
    pub from: AnchorMarker,
    /// Bottom-right corner
    pub to: AnchorMarker,
    /// Absolute distance from the sheet's left edge, in pixels
    pub x: u64,
    /// Absolute distance from the sheet's top edge, in pixels
    pub y: u64,
}

impl Worksheet {
    /// Create a new worksheet with the given name
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            cells: CellStorage::new(),
            pictures: Vec::new(),
        }
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the sheet name
    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    // === Cell Access ===

    /// Get a cell by row and column indices
    pub fn cell_at(&self, row: u32, col: u16) -> Option<&CellData> {
        self.cells.get(row, col)
    }

    /// Get cell value (convenience method)
    pub fn get_value(&self, address: &str) -> Result<CellValue> {
        let addr = CellAddress::parse(address)?;
        Ok(self.get_value_at(addr.row, addr.col))
    }

    /// Get cell value by indices
    pub fn get_value_at(&self, row: u32, col: u16) -> CellValue {
        self.cells
            .get(row, col)
            .map(|c| c.value.clone())
            .unwrap_or(CellValue::Empty)
    }

    // === Cell Modification ===

    /// Set a cell value by address string
    pub fn set_cell_value<V: Into<CellValue>>(&mut self, address: &str, value: V) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_value_at(addr.row, addr.col, value)
    }

    /// Set a cell value by row and column indices
    pub fn set_cell_value_at<V: Into<CellValue>>(
        &mut self,
        row: u32,
        col: u16,
        value: V,
    ) -> Result<()> {
        validate_cell_position(row, col)?;
        self.cells.set_value(row, col, value.into());
        Ok(())
    }

    /// Clear a cell by indices
    pub fn clear_cell_at(&mut self, row: u32, col: u16) {
        self.cells.remove(row, col);
    }

    // === Range Operations ===

    /// Get the used range (bounds of all non-empty cells)
    pub fn used_range(&self) -> Option<CellRange> {
        self.cells
            .used_bounds()
            .map(|(min_row, min_col, max_row, max_col)| {
                CellRange::from_indices(min_row, min_col, max_row, max_col)
            })
    }

    // === Row/Column Operations ===

    /// Get row height in points
    pub fn row_height(&self, row: u32) -> f64 {
        self.cells.row_height(row)
    }

    /// Set row height in points
    pub fn set_row_height(&mut self, row: u32, height: f64) {
        self.cells.set_row_height(row, height);
    }

    /// Get row height in pixels
    pub fn row_height_pixels(&self, row: u32) -> u32 {
        units::points_to_pixels(self.row_height(row))
    }

    /// Set row height in pixels
    pub fn set_row_height_pixels(&mut self, row: u32, pixels: u32) {
        self.set_row_height(row, units::pixels_to_points(pixels));
    }

    /// Get column width in characters
    pub fn column_width(&self, col: u16) -> f64 {
        self.cells.column_width(col)
    }

    /// Set column width in characters
    pub fn set_column_width(&mut self, col: u16, width: f64) {
        self.cells.set_column_width(col, width);
    }

    /// Get column width in pixels
    pub fn column_width_pixels(&self, col: u16) -> u32 {
        units::width_to_pixels(self.column_width(col))
    }

    /// Set column width in pixels
    pub fn set_column_width_pixels(&mut self, col: u16, pixels: u32) {
        self.set_column_width(col, units::pixels_to_width(pixels));
    }

    /// Get all custom row heights (row index → height in points).
    pub fn custom_row_heights(&self) -> &BTreeMap<u32, f64> {
        self.cells.custom_row_heights()
    }

    /// Get all custom column widths (column index → width in characters).
    pub fn custom_column_widths(&self) -> &BTreeMap<u16, f64> {
        self.cells.custom_column_widths()
    }

    /// Rows that carry cells or a custom height, ascending
    pub fn rows_in_use(&self) -> BTreeSet<u32> {
        self.cells
            .row_indices()
            .chain(self.custom_row_heights().keys().copied())
            .collect()
    }

    // === Pictures ===

    /// Insert a picture anchored at a cell address (e.g., "B2")
    pub fn insert_picture(&mut self, address: &str, picture: Picture) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.insert_picture_at(addr.row, addr.col, picture)
    }

    /// Insert a picture anchored at a cell by row and column indices
    pub fn insert_picture_at(&mut self, row: u32, col: u16, mut picture: Picture) -> Result<()> {
        validate_cell_position(row, col)?;
        picture.row = row;
        picture.col = col;
        self.pictures.push(picture);
        Ok(())
    }

    /// Get all pictures, in insertion order
    pub fn pictures(&self) -> &[Picture] {
        &self.pictures
    }

    /// Get the number of pictures
    pub fn picture_count(&self) -> usize {
        self.pictures.len()
    }

    /// Resolve where a picture sits on the cell grid.
    ///
    /// Offsets larger than the anchor cell carry over into the following
    /// cells, and the bottom-right corner is found by walking column widths
    /// and row heights from the (adjusted) top-left corner.
    pub fn picture_anchor(&self, picture: &Picture) -> PictureAnchor {
        let mut col_start = picture.col;
        let mut row_start = picture.row;
        let mut x1 = picture.x_offset;
        let mut y1 = picture.y_offset;

        while col_start < MAX_COLS - 1 && x1 >= self.column_width_pixels(col_start) {
            x1 -= self.column_width_pixels(col_start);
            col_start += 1;
        }
        while row_start < MAX_ROWS - 1 && y1 >= self.row_height_pixels(row_start) {
            y1 -= self.row_height_pixels(row_start);
            row_start += 1;
        }

        let mut col_end = col_start;
        let mut row_end = row_start;
        let mut width = picture.width + x1;
        let mut height = picture.height + y1;

        while col_end < MAX_COLS - 1 && width >= self.column_width_pixels(col_end) {
            width -= self.column_width_pixels(col_end);
            col_end += 1;
        }
        while row_end < MAX_ROWS - 1 && height >= self.row_height_pixels(row_end) {
            height -= self.row_height_pixels(row_end);
            row_end += 1;
        }

        let x = (0..col_start)
            .map(|c| self.column_width_pixels(c) as u64)
            .sum::<u64>()
            + x1 as u64;
        let y = self.rows_height_pixels(row_start) + y1 as u64;

        PictureAnchor {
            from: AnchorMarker {
                col: col_start,
                col_offset: x1,
                row: row_start,
                row_offset: y1,
            },
            to: AnchorMarker {
                col: col_end,
                col_offset: width,
                row: row_end,
                row_offset: height,
            },
            x,
            y,
        }
    }

    /// Total pixel height of the rows above `row`
    fn rows_height_pixels(&self, row: u32) -> u64 {
        let default = units::points_to_pixels(self.cells.default_row_height()) as u64;
        let custom = self.custom_row_heights().range(..row);
        let custom_count = custom.clone().count() as u64;
        let custom_total: u64 = custom.map(|(_, &h)| units::points_to_pixels(h) as u64).sum();
        (row as u64 - custom_count) * default + custom_total
    }

    // === Internal ===

    /// Get the number of non-empty cells
    pub fn cell_count(&self) -> usize {
        self.cells.cell_count()
    }

    /// Check if the worksheet has no cells and no pictures
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty() && self.pictures.is_empty()
    }

    /// Iterate over all non-empty cells
    pub fn iter_cells(&self) -> impl Iterator<Item = (u32, u16, &CellData)> {
        self.cells.iter()
    }
}

/// Validate cell position
fn validate_cell_position(row: u32, col: u16) -> Result<()> {
    if row >= MAX_ROWS {
        return Err(Error::RowOutOfBounds(row, MAX_ROWS - 1));
    }
    if col >= MAX_COLS {
        return Err(Error::ColumnOutOfBounds(col, MAX_COLS - 1));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn jpeg_picture(width: u32, height: u32) -> Picture {
        Picture::new(vec![0xFF, 0xD8, 0xFF, 0xE0], width, height).unwrap()
    }

    #[test]
    fn test_new_worksheet() {
        let ws = Worksheet::new("Sheet1");
        assert_eq!(ws.name(), "Sheet1");
        assert!(ws.is_empty());
        assert!(ws.used_range().is_none());
    }

    #[test]
    fn test_set_cell_values() {
        let mut ws = Worksheet::new("Test");

        ws.set_cell_value("A1", "Filename").unwrap();
        ws.set_cell_value("B1", "Image").unwrap();
        ws.set_cell_value_at(1, 0, "a.jpg").unwrap();

        assert_eq!(ws.get_value("A1").unwrap().as_string(), Some("Filename"));
        assert_eq!(ws.get_value_at(0, 1).as_string(), Some("Image"));
        assert_eq!(ws.get_value("A2").unwrap().as_string(), Some("a.jpg"));
        assert_eq!(ws.cell_count(), 3);
        assert_eq!(ws.used_range().unwrap().to_string(), "A1:B2");

        ws.clear_cell_at(1, 0);
        assert!(ws.get_value("A2").unwrap().is_empty());
    }

    #[test]
    fn test_out_of_bounds() {
        let mut ws = Worksheet::new("Test");
        assert!(ws.set_cell_value_at(MAX_ROWS, 0, 1.0).is_err());
        assert!(ws.set_cell_value_at(0, MAX_COLS, 1.0).is_err());
        assert!(ws
            .insert_picture_at(MAX_ROWS, 0, jpeg_picture(1, 1))
            .is_err());
    }

    #[test]
    fn test_pixel_dimensions() {
        let mut ws = Worksheet::new("Test");

        assert_eq!(ws.column_width_pixels(0), 64);
        assert_eq!(ws.row_height_pixels(0), 20);

        ws.set_column_width_pixels(1, 95);
        ws.set_row_height_pixels(1, 95);

        assert_eq!(ws.column_width_pixels(1), 95);
        assert_eq!(ws.row_height_pixels(1), 95);
        assert_eq!(ws.row_height(1), 71.25);
        assert_eq!(ws.rows_in_use().into_iter().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_insert_picture() {
        let mut ws = Worksheet::new("Test");
        ws.insert_picture("B2", jpeg_picture(90, 45).with_offset(2, 2))
            .unwrap();

        assert_eq!(ws.picture_count(), 1);
        let pic = &ws.pictures()[0];
        assert_eq!((pic.row, pic.col), (1, 1));
        assert!(!ws.is_empty());
    }

    #[test]
    fn test_picture_anchor_within_cell() {
        let mut ws = Worksheet::new("Test");
        ws.set_column_width_pixels(1, 95);
        ws.set_row_height_pixels(1, 95);
        ws.insert_picture_at(1, 1, jpeg_picture(90, 45).with_offset(2, 2))
            .unwrap();

        let anchor = ws.picture_anchor(&ws.pictures()[0]);
        assert_eq!(
            anchor.from,
            AnchorMarker {
                col: 1,
                col_offset: 2,
                row: 1,
                row_offset: 2
            }
        );
        assert_eq!(
            anchor.to,
            AnchorMarker {
                col: 1,
                col_offset: 92,
                row: 1,
                row_offset: 47
            }
        );
        // Column A is 64px wide, row 1 is 20px tall
        assert_eq!((anchor.x, anchor.y), (66, 22));
    }

    #[test]
    fn test_picture_anchor_spans_cells() {
        let mut ws = Worksheet::new("Test");
        ws.insert_picture_at(0, 0, jpeg_picture(100, 30)).unwrap();

        let anchor = ws.picture_anchor(&ws.pictures()[0]);
        assert_eq!((anchor.to.col, anchor.to.col_offset), (1, 36));
        assert_eq!((anchor.to.row, anchor.to.row_offset), (1, 10));
    }

    #[test]
    fn test_picture_anchor_offset_overflow() {
        let mut ws = Worksheet::new("Test");
        ws.insert_picture_at(0, 0, jpeg_picture(10, 10).with_offset(70, 25))
            .unwrap();

        let anchor = ws.picture_anchor(&ws.pictures()[0]);
        assert_eq!((anchor.from.col, anchor.from.col_offset), (1, 6));
        assert_eq!((anchor.from.row, anchor.from.row_offset), (1, 5));
        assert_eq!((anchor.x, anchor.y), (70, 25));
    }
}
