//! Thumbnail generation

use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use log::debug;

use crate::config::{DEFAULT_CELL_SIZE, DEFAULT_MARGIN, DEFAULT_QUALITY};
use crate::error::{Error, Result};

/// How thumbnails are sized and encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailOptions {
    /// Side of the square box the thumbnail must fit in, in pixels
    pub max_size: u32,
    /// JPEG quality (1-100)
    pub quality: u8,
}

impl Default for ThumbnailOptions {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_CELL_SIZE - DEFAULT_MARGIN,
            quality: DEFAULT_QUALITY,
        }
    }
}

/// A JPEG-encoded, size-bounded copy of a source image
#[derive(Debug, Clone)]
pub struct Thumbnail {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl Thumbnail {
    /// Decode the image at `path` and build its thumbnail.
    ///
    /// The format is sniffed from the file contents, so a PNG named `x.jpg`
    /// decodes fine.
    pub fn from_path<P: AsRef<Path>>(path: P, options: &ThumbnailOptions) -> Result<Self> {
        let path = path.as_ref();
        let image = ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|source| Error::io(path, source))?
            .decode()
            .map_err(|source| Error::Decode {
                path: path.to_path_buf(),
                source,
            })?;

        debug!(
            "decoded {} ({}x{}, {:?})",
            path.display(),
            image.width(),
            image.height(),
            image.color()
        );

        Self::from_image(image, options)
    }

    /// Build a thumbnail from an already decoded image.
    ///
    /// Images larger than the box on either side are shrunk to fit, keeping
    /// their aspect ratio; smaller images keep their size. Anything other than
    /// 8-bit gray or RGB is converted to 8-bit RGB before encoding.
    pub fn from_image(image: DynamicImage, options: &ThumbnailOptions) -> Result<Self> {
        let max = options.max_size;
        let image = if image.width() > max || image.height() > max {
            image.resize(max, max, FilterType::Lanczos3)
        } else {
            image
        };

        let image = match image {
            DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => image,
            other => DynamicImage::ImageRgb8(other.to_rgb8()),
        };

        let mut data = Vec::new();
        image
            .write_with_encoder(JpegEncoder::new_with_quality(&mut data, options.quality))
            .map_err(Error::Encode)?;

        Ok(Self {
            data,
            width: image.width(),
            height: image.height(),
        })
    }

    /// Encoded JPEG bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Take the encoded JPEG bytes
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)` in pixels
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
