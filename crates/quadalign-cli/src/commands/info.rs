//! Show project information.

use std::path::PathBuf;

use anyhow::Context;
use quadalign_core::{Crop, Point2, Project};
use serde::Serialize;

#[derive(Serialize)]
struct ProjectSummary<'a> {
    base: String,
    crop: Crop,
    width: u32,
    canvas: (u32, u32),
    output: (u32, u32),
    annotated: usize,
    photos: Vec<PhotoSummary<'a>>,
}

#[derive(Serialize)]
struct PhotoSummary<'a> {
    index: usize,
    path: &'a str,
    polygon: Option<&'a [Point2]>,
}

pub fn run(path: PathBuf, json: bool) -> anyhow::Result<()> {
    let project = Project::open(&path)
        .with_context(|| format!("Failed to load project at {}", path.display()))?;

    if json {
        let summary = summarize(&project);
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let crop = project.crop;
    let (canvas_w, canvas_h) = project.canvas_size();
    let (out_w, out_h) = project.output_size();

    println!("Project: {}", project.base.display());
    println!(
        "  Crop (T,R,B,L): {},{},{},{}",
        crop.top, crop.right, crop.bottom, crop.left
    );
    println!("  Canvas: {canvas_w}x{canvas_h}");
    println!("  Output: {out_w}x{out_h}");
    if let Err(e) = project.validate() {
        println!("  Warning: {e}");
    }
    println!();

    println!(
        "Photos: {} ({} annotated)",
        project.photos.len(),
        project.annotated_count()
    );
    for (index, photo) in project.photos.iter().enumerate() {
        match &photo.polygon {
            Some(points) => println!("  {index:3} {}  {}", photo.path, format_points(points)),
            None => println!("  {index:3} {}  (not annotated)", photo.path),
        }
    }

    Ok(())
}

fn summarize(project: &Project) -> ProjectSummary<'_> {
    ProjectSummary {
        base: project.base.display().to_string(),
        crop: project.crop,
        width: project.width,
        canvas: project.canvas_size(),
        output: project.output_size(),
        annotated: project.annotated_count(),
        photos: project
            .photos
            .iter()
            .enumerate()
            .map(|(index, photo)| PhotoSummary {
                index,
                path: &photo.path,
                polygon: photo.polygon.as_deref(),
            })
            .collect(),
    }
}

/// Format points the way `annotate --points` accepts them.
pub fn format_points(points: &[Point2]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ")
}
