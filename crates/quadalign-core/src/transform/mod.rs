//! Resampling of source photos onto the crop canvas.
//!
//! # Coordinate System
//!
//! - Pixel `(i, j)` covers the square `[i, i+1) x [j, j+1)`; its centre is
//!   at `(i + 0.5, j + 0.5)`
//! - Canvas pixels are mapped back into the source through the inverse of
//!   the alignment transform and sampled there (inverse mapping)
//! - Samples whose source position lies outside the photo are black

mod sample;
mod warp;

pub use sample::{InterpolationFilter, Sampler};
pub use warp::{warp_affine, BACKGROUND};
