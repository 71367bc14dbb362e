//! Unit conversions for worksheet geometry.
//!
//! Spreadsheet applications size columns in "characters" of the default font's
//! maximum digit width, rows in points, and drawing objects in English Metric
//! Units (EMU). All conversions here assume the default Calibri 11 font, whose
//! maximum digit width is 7 pixels with 5 pixels of cell padding, at 96 DPI.

/// Maximum digit width of the default font, in pixels
pub const MAX_DIGIT_WIDTH: u32 = 7;

/// Horizontal cell padding, in pixels
pub const COLUMN_PADDING: u32 = 5;

/// EMUs per pixel at 96 DPI
pub const EMU_PER_PIXEL: u32 = 9525;

/// Default column width in characters
pub const DEFAULT_COLUMN_WIDTH: f64 = 8.43;

/// Default row height in points
pub const DEFAULT_ROW_HEIGHT: f64 = 15.0;

/// Convert a column width in characters to pixels.
pub fn width_to_pixels(width: f64) -> u32 {
    if width <= 0.0 {
        0
    } else if width < 1.0 {
        (width * (MAX_DIGIT_WIDTH + COLUMN_PADDING) as f64 + 0.5) as u32
    } else {
        (width * MAX_DIGIT_WIDTH as f64 + 0.5) as u32 + COLUMN_PADDING
    }
}

/// Convert a pixel width to a column width in characters.
pub fn pixels_to_width(pixels: u32) -> f64 {
    if pixels <= 12 {
        pixels as f64 / (MAX_DIGIT_WIDTH + COLUMN_PADDING) as f64
    } else {
        (pixels - COLUMN_PADDING) as f64 / MAX_DIGIT_WIDTH as f64
    }
}

/// Column width as stored in the `width` attribute of a `<col>` element.
///
/// The stored value includes the cell padding and is truncated to 1/256th of a
/// character.
pub fn width_to_stored(width: f64) -> f64 {
    let stored = width_to_pixels(width) as f64 / MAX_DIGIT_WIDTH as f64;
    (stored * 256.0).trunc() / 256.0
}

/// Inverse of [`width_to_stored`].
pub fn stored_to_width(stored: f64) -> f64 {
    let pixels = (stored * MAX_DIGIT_WIDTH as f64 + 0.5) as u32;
    pixels_to_width(pixels)
}

/// Convert a row height in points to pixels.
pub fn points_to_pixels(points: f64) -> u32 {
    (points * 4.0 / 3.0).round() as u32
}

/// Convert a pixel height to points.
pub fn pixels_to_points(pixels: u32) -> f64 {
    pixels as f64 * 0.75
}

/// Convert pixels to EMUs.
pub fn pixels_to_emu(pixels: u32) -> u64 {
    pixels as u64 * EMU_PER_PIXEL as u64
}

/// Convert EMUs to pixels, rounding to the nearest pixel.
pub fn emu_to_pixels(emu: u64) -> u32 {
    ((emu + EMU_PER_PIXEL as u64 / 2) / EMU_PER_PIXEL as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_column_is_64_pixels() {
        assert_eq!(width_to_pixels(DEFAULT_COLUMN_WIDTH), 64);
    }

    #[test]
    fn test_pixel_width_roundtrip() {
        for px in [1, 5, 12, 13, 64, 95, 200] {
            assert_eq!(width_to_pixels(pixels_to_width(px)), px, "px = {}", px);
        }
    }

    #[test]
    fn test_stored_width() {
        // 95 pixels is stored as 13.5703125 characters
        let width = pixels_to_width(95);
        assert_eq!(width_to_stored(width), 13.5703125);
        assert_eq!(width_to_pixels(stored_to_width(13.5703125)), 95);

        // The default width is stored as 9.140625
        assert_eq!(width_to_stored(DEFAULT_COLUMN_WIDTH), 9.140625);
    }

    #[test]
    fn test_row_heights() {
        assert_eq!(pixels_to_points(95), 71.25);
        assert_eq!(points_to_pixels(71.25), 95);
        assert_eq!(points_to_pixels(DEFAULT_ROW_HEIGHT), 20);
    }

    #[test]
    fn test_emu() {
        assert_eq!(pixels_to_emu(2), 19050);
        assert_eq!(emu_to_pixels(19050), 2);
        assert_eq!(emu_to_pixels(19049), 2);
    }
}
