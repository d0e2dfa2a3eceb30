//! JPEG decoding for source photos.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use exif::{In, Reader, Tag};
use image::ImageReader;

use super::{DecodeError, DecodedImage, Orientation};

/// Decode JPEG bytes into an RGB buffer, keeping the stored pixel grid.
///
/// # Errors
///
/// Returns `DecodeError::CorruptedFile` if the bytes cannot be decoded.
pub fn decode_jpeg(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::InvalidFormat);
    }

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    let img = reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    Ok(DecodedImage::from_rgb_image(img.into_rgb8()))
}

/// Read and decode a photo from disk.
///
/// Logs a warning when the file carries a non-trivial EXIF orientation,
/// since viewers may display it rotated relative to the annotated grid.
pub fn read_jpeg(path: &Path) -> Result<DecodedImage, DecodeError> {
    let bytes = fs::read(path)?;

    let orientation = get_orientation(&bytes);
    if orientation != Orientation::Normal {
        tracing::warn!(
            path = %path.display(),
            ?orientation,
            "EXIF orientation is ignored; corners refer to the stored pixel grid"
        );
    }

    let image = decode_jpeg(&bytes)?;
    tracing::trace!(
        path = %path.display(),
        width = image.width,
        height = image.height,
        "decoded photo"
    );
    Ok(image)
}

/// Extract EXIF orientation from JPEG bytes.
///
/// Returns `Orientation::Normal` if no EXIF data is found or orientation
/// cannot be determined.
pub fn get_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);
    Reader::new()
        .read_from_container(&mut cursor)
        .ok()
        .and_then(|exif| {
            exif.get_field(Tag::Orientation, In::PRIMARY)
                .and_then(|field| field.value.get_uint(0))
        })
        .map(Orientation::from)
        .unwrap_or_default()
}
