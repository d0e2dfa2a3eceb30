//! Output encoding.
//!
//! Exported photos are written as baseline JPEG with configurable quality.
//!
//! # Examples
//!
//! ```ignore
//! use quadalign_core::encode::write_jpeg;
//!
//! write_jpeg("shoot/out/0.jpg".as_ref(), &canvas, 90)?;
//! ```

mod jpeg;

pub use jpeg::{encode_image, encode_jpeg, write_jpeg, EncodeError, DEFAULT_QUALITY};
