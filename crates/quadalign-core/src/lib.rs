//! quadalign core - photo alignment and export engine
//!
//! Aligns a batch of photographs of a planar object onto a common canvas.
//! Each photo carries four operator-marked corners; from them the crate
//! derives a rigid transform (rotation + translation) that centres and
//! straightens the object, resamples the photo onto a fixed crop canvas,
//! and downsamples the result to a uniform output size.
//!
//! # Module Structure
//!
//! - `geometry` - 3x3 homogeneous transforms and points
//! - `align` - corner polygon → forward/inverse transform
//! - `project` - project directory, `project.json`, crop configuration
//! - `session` - corner editing sessions for front ends
//! - `decode` - JPEG decoding and canvas resizing
//! - `transform` - point samplers and the affine warp
//! - `encode` - JPEG encoding
//! - `export` - the per-photo export pipeline

pub mod align;
pub mod decode;
pub mod encode;
pub mod export;
pub mod geometry;
pub mod project;
pub mod session;
pub mod transform;

pub use align::{forward_transform, AlignError, Alignment, AlignmentChecks, Polygon};
pub use decode::{DecodedImage, FilterType};
pub use export::{
    export_project, AnnotationPolicy, ExportError, ExportOptions, ExportProgress, ExportReport,
    Exporter,
};
pub use geometry::{compose, rotation, translation, Matrix3, Point2};
pub use project::{Crop, Photo, Project, ProjectError};
pub use session::{default_polygon, EditSession, ProjectSession};
pub use transform::{warp_affine, InterpolationFilter, Sampler};
