//! Source image decoding and resizing.
//!
//! Photos are decoded into [`DecodedImage`], a plain RGB8 buffer that the
//! rest of the pipeline treats as the abstract image. Decoding keeps the
//! stored pixel grid: EXIF orientation is reported, not applied, because the
//! corner annotations are recorded against the stored grid.
//!
//! # Examples
//!
//! ```ignore
//! use quadalign_core::decode::{read_jpeg, resize, FilterType};
//!
//! let image = read_jpeg("shoot/a.jpg".as_ref())?;
//! let small = resize(&image, 500, 500, FilterType::Bicubic)?;
//! ```

mod jpeg;
mod resize;
mod types;

pub use jpeg::{decode_jpeg, get_orientation, read_jpeg};
pub use resize::{resize, Resizer};
pub use types::{DecodeError, DecodedImage, FilterType, Orientation};
