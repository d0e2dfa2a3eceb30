//! Export every photo of a project.

use std::path::PathBuf;

use anyhow::Context;
use quadalign_core::{export_project, AlignmentChecks, AnnotationPolicy, ExportOptions, Project};

use crate::args::FilterArg;

pub fn run(
    path: PathBuf,
    quality: u8,
    skip_unannotated: bool,
    warp_filter: FilterArg,
    resize_filter: FilterArg,
    max_tilt_divergence: f64,
) -> anyhow::Result<()> {
    let project = Project::open(&path)
        .with_context(|| format!("Failed to load project at {}", path.display()))?;

    let options = ExportOptions {
        interpolation: warp_filter.into(),
        downsample: resize_filter.into(),
        quality,
        on_unannotated: if skip_unannotated {
            AnnotationPolicy::Skip
        } else {
            AnnotationPolicy::Fail
        },
        checks: divergence_checks(max_tilt_divergence),
    };

    let (out_w, out_h) = project.output_size();
    println!("Exporting project at: {}", path.display());
    println!("  Photos: {}", project.photos.len());
    println!("  Output: {}", project.output_dir().display());
    println!("  Resolution: {out_w}x{out_h}");

    // Per-photo progress is reported by the exporter's log events
    let report = export_project(&project, &options).context("Export failed")?;

    println!(
        "Export complete: {} written, {} skipped",
        report.exported.len(),
        report.skipped.len()
    );
    for skipped in &report.skipped {
        println!("  skipped {skipped}");
    }
    Ok(())
}

/// Build the alignment checks for a divergence limit given in degrees.
/// A non-positive limit disables the divergence check.
fn divergence_checks(max_degrees: f64) -> AlignmentChecks {
    AlignmentChecks {
        max_tilt_divergence: (max_degrees > 0.0).then(|| max_degrees.to_radians()),
        ..AlignmentChecks::default()
    }
}
