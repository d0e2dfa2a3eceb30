//! Show or edit the corners of one photo.

use std::path::PathBuf;

use anyhow::Context;
use quadalign_core::decode::read_jpeg;
use quadalign_core::{default_polygon, EditSession, Polygon, Project, ProjectSession};

use crate::args::parse_points;
use crate::commands::info::format_points;

pub fn run(path: PathBuf, photo: String, points: Option<String>, clear: bool) -> anyhow::Result<()> {
    let mut project = Project::open(&path)
        .with_context(|| format!("Failed to load project at {}", path.display()))?;
    let mut session = ProjectSession::open_photo(&mut project, &photo)?;

    if clear {
        session.clear().context("Failed to save project")?;
        println!("Cleared annotation for {photo}");
        return Ok(());
    }

    if let Some(points) = points {
        let points = parse_points(&points)?;
        // Reject wrong corner counts here instead of at export time
        Polygon::try_from_points(&points).with_context(|| format!("Invalid corners for {photo}"))?;
        session.set_points(points).context("Failed to save project")?;
        println!("Saved annotation for {photo}");
        return Ok(());
    }

    match session.points() {
        Some(points) => println!("{photo}: {}", format_points(points)),
        None => {
            let source = session.project().photo_path(session.current());
            let image = read_jpeg(&source)
                .with_context(|| format!("Failed to read {}", source.display()))?;
            let proposed = default_polygon(image.width, image.height);
            println!("{photo}: not annotated");
            println!("  proposed: {}", format_points(&proposed));
        }
    }
    Ok(())
}
