//! Change crop margins or output width.

use std::path::PathBuf;

use anyhow::Context;
use quadalign_core::Project;

use crate::args::parse_crop;

pub fn run(path: PathBuf, crop: Option<String>, width: Option<u32>) -> anyhow::Result<()> {
    let mut project = Project::open(&path)
        .with_context(|| format!("Failed to load project at {}", path.display()))?;

    if let Some(crop) = crop {
        project.crop = parse_crop(&crop)?;
    }
    if let Some(width) = width {
        project.width = width;
    }

    project.validate()?;
    project.save().context("Failed to save project")?;

    let c = project.crop;
    let (out_w, out_h) = project.output_size();
    println!("Crop (T,R,B,L): {},{},{},{}", c.top, c.right, c.bottom, c.left);
    println!("Output: {out_w}x{out_h}");
    Ok(())
}
