//! Batch export: align, warp, downsample, and write every photo.
//!
//! # Pipeline
//!
//! For each photo, in project order:
//! 1. Derive the alignment from its corners (before touching any pixels)
//! 2. Decode the source photo
//! 3. Warp it onto the `(left + right) x (top + bottom)` crop canvas through
//!    the inverse alignment
//! 4. Downsample the canvas to `width x round(width * canvas_h / canvas_w)`
//! 5. Write `<base>/out/<index>.jpg`
//!
//! The output directory is created once before the first photo. Any error
//! stops the run; files already written are left in place.

use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::align::{AlignError, Alignment, AlignmentChecks};
use crate::decode::{read_jpeg, DecodeError, DecodedImage, FilterType, Resizer};
use crate::encode::{write_jpeg, EncodeError, DEFAULT_QUALITY};
use crate::project::{output_size, Crop, Project, ProjectError};
use crate::transform::{warp_affine, InterpolationFilter, Sampler};

/// Errors that stop an export run.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("{path}: {source}")]
    Align {
        path: String,
        #[source]
        source: AlignError,
    },

    #[error("{path}: failed to decode: {source}")]
    Decode {
        path: String,
        #[source]
        source: DecodeError,
    },

    #[error("{path}: failed to resize: {source}")]
    Resize {
        path: String,
        #[source]
        source: DecodeError,
    },

    #[error("{path}: failed to write {}: {source}", .output.display())]
    Encode {
        path: String,
        output: PathBuf,
        #[source]
        source: EncodeError,
    },

    #[error("failed to create output directory {}: {source}", .path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("photo index {index} out of range ({total} photos)")]
    NoSuchPhoto { index: usize, total: usize },

    #[error(transparent)]
    Project(#[from] ProjectError),
}

impl ExportError {
    /// Path of the photo that caused the error, if any.
    pub fn photo(&self) -> Option<&str> {
        match self {
            ExportError::Align { path, .. }
            | ExportError::Decode { path, .. }
            | ExportError::Resize { path, .. }
            | ExportError::Encode { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// What to do with photos whose corners are missing or malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationPolicy {
    /// Abort the run.
    #[default]
    Fail,
    /// Log a warning, leave no output for the photo, and continue.
    Skip,
}

/// Export tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Kernel for warping the photo onto the crop canvas.
    pub interpolation: InterpolationFilter,
    /// Filter for downsampling the canvas to the output size.
    pub downsample: FilterType,
    /// JPEG quality (1-100).
    pub quality: u8,
    pub on_unannotated: AnnotationPolicy,
    pub checks: AlignmentChecks,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            interpolation: InterpolationFilter::Bicubic,
            downsample: FilterType::Bicubic,
            quality: DEFAULT_QUALITY,
            on_unannotated: AnnotationPolicy::Fail,
            checks: AlignmentChecks::default(),
        }
    }
}

/// Progress notification, sent before each photo is processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportProgress {
    /// Zero-based position in the project.
    pub index: usize,
    pub total: usize,
    pub path: String,
}

impl fmt::Display for ExportProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:2}/{:2}: {}", self.index + 1, self.total, self.path)
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    /// Files written, in project order.
    pub exported: Vec<PathBuf>,
    /// Photos skipped under [`AnnotationPolicy::Skip`].
    pub skipped: Vec<String>,
}

/// Export engine, parameterised over the warp and downsample strategies.
#[derive(Debug, Clone)]
pub struct Exporter<S = InterpolationFilter, R = FilterType> {
    sampler: S,
    resizer: R,
    quality: u8,
    policy: AnnotationPolicy,
    checks: AlignmentChecks,
}

impl Exporter {
    pub fn new(options: &ExportOptions) -> Self {
        Self::with_strategies(options.interpolation, options.downsample, options)
    }
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new(&ExportOptions::default())
    }
}

impl<S: Sampler, R: Resizer> Exporter<S, R> {
    /// Use custom resampling strategies; the filter fields of `options` are
    /// ignored.
    pub fn with_strategies(sampler: S, resizer: R, options: &ExportOptions) -> Self {
        Self {
            sampler,
            resizer,
            quality: options.quality,
            policy: options.on_unannotated,
            checks: options.checks,
        }
    }

    /// Warp `image` onto the crop canvas and downsample it to `width`.
    pub fn render(
        &self,
        image: &DecodedImage,
        alignment: &Alignment,
        crop: &Crop,
        width: u32,
    ) -> Result<DecodedImage, DecodeError> {
        let (canvas_w, canvas_h) = crop.canvas_size();
        let canvas = warp_affine(image, &alignment.inverse, canvas_w, canvas_h, &self.sampler);

        let (out_w, out_h) = output_size(crop, width);
        self.resizer.resize(&canvas, out_w, out_h)
    }

    /// Derive the alignment for the photo at `index`.
    pub fn align(&self, project: &Project, index: usize) -> Result<Alignment, ExportError> {
        let photo = project
            .photos
            .get(index)
            .ok_or(ExportError::NoSuchPhoto {
                index,
                total: project.photos.len(),
            })?;

        Alignment::from_annotation(photo.polygon.as_deref(), &project.crop, &self.checks).map_err(
            |source| ExportError::Align {
                path: photo.path.clone(),
                source,
            },
        )
    }

    /// Export the photo at `index` to `out/<index>.jpg`.
    ///
    /// The output directory must already exist.
    pub fn export_photo(&self, project: &Project, index: usize) -> Result<PathBuf, ExportError> {
        let alignment = self.align(project, index)?;
        let photo = &project.photos[index];

        let image = read_jpeg(&project.photo_path(photo)).map_err(|source| ExportError::Decode {
            path: photo.path.clone(),
            source,
        })?;

        let rendered = self
            .render(&image, &alignment, &project.crop, project.width)
            .map_err(|source| ExportError::Resize {
                path: photo.path.clone(),
                source,
            })?;

        let output = project.output_path(index);
        write_jpeg(&output, &rendered, self.quality).map_err(|source| ExportError::Encode {
            path: photo.path.clone(),
            output: output.clone(),
            source,
        })?;

        tracing::debug!(
            path = %photo.path,
            output = %output.display(),
            width = rendered.width,
            height = rendered.height,
            "wrote photo"
        );
        Ok(output)
    }

    /// Export every photo in project order.
    ///
    /// `progress` is called before each photo.
    pub fn export<F>(&self, project: &Project, mut progress: F) -> Result<ExportReport, ExportError>
    where
        F: FnMut(&ExportProgress),
    {
        project.validate()?;

        let out_dir = project.output_dir();
        fs::create_dir_all(&out_dir).map_err(|source| ExportError::OutputDir {
            path: out_dir.clone(),
            source,
        })?;

        let total = project.photos.len();
        let mut report = ExportReport::default();

        for (index, photo) in project.photos.iter().enumerate() {
            let update = ExportProgress {
                index,
                total,
                path: photo.path.clone(),
            };
            tracing::info!(index = index + 1, total, path = %photo.path, "exporting photo");
            progress(&update);

            match self.export_photo(project, index) {
                Ok(output) => report.exported.push(output),
                Err(ExportError::Align { path, source }) if self.should_skip(&source) => {
                    tracing::warn!(path = %path, reason = %source, "skipping photo");
                    report.skipped.push(path);
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            exported = report.exported.len(),
            skipped = report.skipped.len(),
            output = %out_dir.display(),
            "export complete"
        );
        Ok(report)
    }

    fn should_skip(&self, error: &AlignError) -> bool {
        self.policy == AnnotationPolicy::Skip
            && matches!(
                error,
                AlignError::MissingAnnotation | AlignError::MalformedPolygon { .. }
            )
    }
}

/// Export `project` with `options`, reporting progress only through logs.
pub fn export_project(
    project: &Project,
    options: &ExportOptions,
) -> Result<ExportReport, ExportError> {
    Exporter::new(options).export(project, |_| {})
}
