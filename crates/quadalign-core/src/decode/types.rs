//! Pixel buffer, resampling filters, and decode errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while decoding or resizing.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Empty input or an unrecognised format.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// The decoder rejected the data.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),

    /// The photo could not be read from disk.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Requested dimensions are empty.
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Filter used when resizing the crop canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    /// Nearest neighbour.
    Nearest,
    /// Bilinear interpolation.
    Bilinear,
    /// Catmull-Rom bicubic interpolation.
    #[default]
    Bicubic,
    /// Lanczos3 interpolation (slowest, sharpest).
    Lanczos3,
}

impl FilterType {
    /// Matching `image::imageops` filter.
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            FilterType::Nearest => image::imageops::FilterType::Nearest,
            FilterType::Bilinear => image::imageops::FilterType::Triangle,
            FilterType::Bicubic => image::imageops::FilterType::CatmullRom,
            FilterType::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// EXIF orientation values (1-8).
/// See: https://exiftool.org/TagNames/EXIF.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Orientation {
    #[default]
    Normal = 1,
    FlipHorizontal = 2,
    Rotate180 = 3,
    FlipVertical = 4,
    Transpose = 5,
    Rotate90CW = 6,
    Transverse = 7,
    Rotate270CW = 8,
}

impl From<u32> for Orientation {
    fn from(value: u32) -> Self {
        match value {
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90CW,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270CW,
            _ => Orientation::Normal,
        }
    }
}

/// An RGB8 image buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major RGB8 samples.
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Wrap an existing RGB buffer.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            width as usize * height as usize * 3,
            "Pixel buffer size mismatch"
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    /// A canvas filled with a single color.
    pub fn filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        let count = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(count * 3);
        for _ in 0..count {
            pixels.extend_from_slice(&color);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn from_rgb_image(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            pixels: img.into_raw(),
        }
    }

    /// Convert to an image::RgbImage, consuming the buffer.
    pub fn into_rgb_image(self) -> Option<image::RgbImage> {
        image::RgbImage::from_raw(self.width, self.height, self.pixels)
    }

    /// Pixel at integer coordinates, or `None` outside the image.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        Some([self.pixels[idx], self.pixels[idx + 1], self.pixels[idx + 2]])
    }

    #[inline]
    pub fn put_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        self.pixels[idx..idx + 3].copy_from_slice(&rgb);
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }
}
