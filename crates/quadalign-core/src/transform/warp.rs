//! Affine warp of a photo onto a fixed-size canvas.
//!
//! # Algorithm
//!
//! For every canvas pixel `q`, the source position is `inverse · (q + ½)`
//! and the photo is sampled there:
//!
//! ```text
//! src = inverse · (dst_x + 0.5, dst_y + 0.5)
//! out[dst] = sampler(photo, src) or BACKGROUND
//! ```

use crate::decode::DecodedImage;
use crate::geometry::{Matrix3, Point2};

use super::Sampler;

/// Fill color for canvas pixels that map outside the photo.
pub const BACKGROUND: [u8; 3] = [0, 0, 0];

/// Resample `image` onto a `width x height` canvas.
///
/// `inverse` maps canvas coordinates to source coordinates, i.e. it is the
/// inverse of the transform that places the photo on the canvas.
pub fn warp_affine<S: Sampler + ?Sized>(
    image: &DecodedImage,
    inverse: &Matrix3,
    width: u32,
    height: u32,
    sampler: &S,
) -> DecodedImage {
    let mut output = DecodedImage::filled(width, height, BACKGROUND);
    if image.is_empty() {
        return output;
    }

    let [a, b, c, d, e, f] = inverse.to_affine();
    for dst_y in 0..height {
        let cy = dst_y as f64 + 0.5;
        // Row origin; each step in x adds (a, d)
        let row = Point2::new(b * cy + c, e * cy + f);

        for dst_x in 0..width {
            let cx = dst_x as f64 + 0.5;
            let src_x = a * cx + row.x;
            let src_y = d * cx + row.y;

            if let Some(rgb) = sampler.sample(image, src_x, src_y) {
                output.put_pixel(dst_x, dst_y, rgb);
            }
        }
    }

    output
}
