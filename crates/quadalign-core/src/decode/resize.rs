//! Downsampling of the crop canvas to the output size.

use super::{DecodeError, DecodedImage, FilterType};

/// Strategy for scaling a whole image to a new size.
pub trait Resizer {
    fn resize(
        &self,
        image: &DecodedImage,
        width: u32,
        height: u32,
    ) -> Result<DecodedImage, DecodeError>;
}

impl Resizer for FilterType {
    fn resize(
        &self,
        image: &DecodedImage,
        width: u32,
        height: u32,
    ) -> Result<DecodedImage, DecodeError> {
        resize(image, width, height, *self)
    }
}

/// Resize an image to exact dimensions.
///
/// # Errors
///
/// Returns `DecodeError::InvalidDimensions` for an empty target size and
/// `DecodeError::CorruptedFile` if the buffer does not match its dimensions.
pub fn resize(
    image: &DecodedImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<DecodedImage, DecodeError> {
    if width == 0 || height == 0 {
        return Err(DecodeError::InvalidDimensions { width, height });
    }

    // Fast path: if dimensions match, just clone
    if image.width == width && image.height == height {
        return Ok(image.clone());
    }

    let rgb_image = image
        .clone()
        .into_rgb_image()
        .ok_or_else(|| DecodeError::CorruptedFile("pixel buffer size mismatch".to_string()))?;

    let resized = image::imageops::resize(&rgb_image, width, height, filter.to_image_filter());

    Ok(DecodedImage::from_rgb_image(resized))
}
