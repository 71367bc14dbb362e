//! Pictures anchored to worksheet cells

use std::fmt;

use crate::error::{Error, Result};

/// Encoded image format of a picture's data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PictureFormat {
    /// JPEG (JFIF/EXIF)
    Jpeg,
    /// PNG
    Png,
}

impl PictureFormat {
    /// Detect the format from the leading magic bytes
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(PictureFormat::Jpeg)
        } else if data.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(PictureFormat::Png)
        } else {
            None
        }
    }

    /// Guess the format from a media part's file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(PictureFormat::Jpeg),
            "png" => Some(PictureFormat::Png),
            _ => None,
        }
    }

    /// File extension used for the media part
    pub fn extension(&self) -> &'static str {
        match self {
            PictureFormat::Jpeg => "jpeg",
            PictureFormat::Png => "png",
        }
    }

    /// MIME content type of the media part
    pub fn content_type(&self) -> &'static str {
        match self {
            PictureFormat::Jpeg => "image/jpeg",
            PictureFormat::Png => "image/png",
        }
    }
}

impl fmt::Display for PictureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// How a picture reacts when the cells beneath it are moved or resized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectPosition {
    /// Move and size with cells (`editAs="twoCell"`)
    #[default]
    MoveAndSize,
    /// Move but don't size with cells (`editAs="oneCell"`)
    MoveOnly,
    /// Don't move or size with cells (`editAs="absolute"`)
    Absolute,
}

impl ObjectPosition {
    /// Value of the `editAs` attribute
    pub fn edit_as(&self) -> &'static str {
        match self {
            ObjectPosition::MoveAndSize => "twoCell",
            ObjectPosition::MoveOnly => "oneCell",
            ObjectPosition::Absolute => "absolute",
        }
    }

    /// Parse an `editAs` attribute value (missing means `twoCell`)
    pub fn from_edit_as(s: &str) -> Option<Self> {
        match s {
            "twoCell" => Some(ObjectPosition::MoveAndSize),
            "oneCell" => Some(ObjectPosition::MoveOnly),
            "absolute" => Some(ObjectPosition::Absolute),
            _ => None,
        }
    }
}

/// An image anchored to a cell's top-left corner
#[derive(Debug, Clone, PartialEq)]
pub struct Picture {
    /// Anchor row (0-based)
    pub row: u32,
    /// Anchor column (0-based)
    pub col: u16,
    /// Horizontal offset from the anchor cell, in pixels
    pub x_offset: u32,
    /// Vertical offset from the anchor cell, in pixels
    pub y_offset: u32,
    /// Displayed width in pixels
    pub width: u32,
    /// Displayed height in pixels
    pub height: u32,
    /// Encoded image format
    pub format: PictureFormat,
    /// Encoded image bytes
    pub data: Vec<u8>,
    /// Placement behavior
    pub position: ObjectPosition,
    /// Alternative text (usually the source filename)
    pub description: Option<String>,
}

impl Picture {
    /// Create a picture from encoded bytes.
    ///
    /// The format is detected from the data; width and height are the pixel
    /// dimensions the picture is displayed at. The anchor defaults to A1 and is
    /// set when the picture is inserted into a worksheet.
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let format = PictureFormat::detect(&data)
            .ok_or_else(|| Error::InvalidPicture("unrecognized image data".into()))?;
        if width == 0 || height == 0 {
            return Err(Error::InvalidPicture(format!(
                "zero-sized picture ({}x{})",
                width, height
            )));
        }
        Ok(Self {
            row: 0,
            col: 0,
            x_offset: 0,
            y_offset: 0,
            width,
            height,
            format,
            data,
            position: ObjectPosition::default(),
            description: None,
        })
    }

    /// Set the pixel offset from the anchor cell's top-left corner
    pub fn with_offset(mut self, x: u32, y: u32) -> Self {
        self.x_offset = x;
        self.y_offset = y;
        self
    }

    /// Set the placement behavior
    pub fn with_position(mut self, position: ObjectPosition) -> Self {
        self.position = position;
        self
    }

    /// Set the alternative text
    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }
}
