//! Point sampling with nearest, bilinear, bicubic, and Lanczos3 kernels.
//!
//! All kernels clamp their taps to the image edge, so a position anywhere
//! inside the photo produces a value; positions outside return `None`.

use serde::{Deserialize, Serialize};

use crate::decode::DecodedImage;

/// Strategy for reading a color at a continuous source position.
pub trait Sampler {
    /// Sample at `(x, y)` in pixel-edge coordinates. Returns `None` when the
    /// position lies outside the image.
    fn sample(&self, image: &DecodedImage, x: f64, y: f64) -> Option<[u8; 3]>;
}

/// Interpolation kernel used when warping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationFilter {
    Nearest,
    Bilinear,
    /// Keys cubic convolution (a = -0.5).
    #[default]
    Bicubic,
    Lanczos3,
}

impl Sampler for InterpolationFilter {
    fn sample(&self, image: &DecodedImage, x: f64, y: f64) -> Option<[u8; 3]> {
        let (w, h) = (image.width as f64, image.height as f64);
        if !(x >= 0.0 && x < w && y >= 0.0 && y < h) {
            return None;
        }

        // Shift to pixel-centre coordinates
        let (u, v) = (x - 0.5, y - 0.5);
        let rgb = match self {
            InterpolationFilter::Nearest => nearest(image, x, y),
            InterpolationFilter::Bilinear => convolve(image, u, v, 1, triangle_weight),
            InterpolationFilter::Bicubic => convolve(image, u, v, 2, cubic_weight),
            InterpolationFilter::Lanczos3 => convolve(image, u, v, 3, lanczos3_weight),
        };
        Some(rgb)
    }
}

/// Get a pixel as [f64; 3], clamping coordinates to the image.
#[inline]
fn clamped_pixel(image: &DecodedImage, px: i64, py: i64) -> [f64; 3] {
    let px = px.clamp(0, image.width as i64 - 1) as usize;
    let py = py.clamp(0, image.height as i64 - 1) as usize;
    let idx = (py * image.width as usize + px) * 3;
    [
        image.pixels[idx] as f64,
        image.pixels[idx + 1] as f64,
        image.pixels[idx + 2] as f64,
    ]
}

fn nearest(image: &DecodedImage, x: f64, y: f64) -> [u8; 3] {
    let p = clamped_pixel(image, x.floor() as i64, y.floor() as i64);
    [p[0] as u8, p[1] as u8, p[2] as u8]
}

/// Separable convolution over a `2 * radius` square of taps around `(u, v)`.
fn convolve(image: &DecodedImage, u: f64, v: f64, radius: i64, kernel: fn(f64) -> f64) -> [u8; 3] {
    let x0 = u.floor() as i64;
    let y0 = v.floor() as i64;

    let mut sum = [0.0f64; 3];
    let mut weight_sum = 0.0;

    for ky in (1 - radius)..=radius {
        let py = y0 + ky;
        let wy = kernel(v - py as f64);
        if wy == 0.0 {
            continue;
        }
        for kx in (1 - radius)..=radius {
            let px = x0 + kx;
            let weight = kernel(u - px as f64) * wy;
            if weight == 0.0 {
                continue;
            }
            let pixel = clamped_pixel(image, px, py);
            sum[0] += pixel[0] * weight;
            sum[1] += pixel[1] * weight;
            sum[2] += pixel[2] * weight;
            weight_sum += weight;
        }
    }

    let mut result = [0u8; 3];
    if weight_sum != 0.0 {
        for (out, s) in result.iter_mut().zip(sum) {
            *out = (s / weight_sum).clamp(0.0, 255.0).round() as u8;
        }
    }
    result
}

fn triangle_weight(t: f64) -> f64 {
    (1.0 - t.abs()).max(0.0)
}

/// Keys cubic convolution kernel with a = -0.5.
fn cubic_weight(t: f64) -> f64 {
    const A: f64 = -0.5;
    let t = t.abs();
    if t <= 1.0 {
        ((A + 2.0) * t - (A + 3.0)) * t * t + 1.0
    } else if t < 2.0 {
        ((A * t - 5.0 * A) * t + 8.0 * A) * t - 4.0 * A
    } else {
        0.0
    }
}

/// Lanczos kernel: `sinc(t) * sinc(t / 3)` for `|t| < 3`.
fn lanczos3_weight(t: f64) -> f64 {
    const A: f64 = 3.0;
    if t.abs() < f64::EPSILON {
        return 1.0;
    }
    if t.abs() >= A {
        return 0.0;
    }
    let pi_t = std::f64::consts::PI * t;
    (A * pi_t.sin() * (pi_t / A).sin()) / (pi_t * pi_t)
}
