//! Corner editing sessions.
//!
//! Front ends (a canvas editor, a terminal prompt, a test harness) edit one
//! photo's corners at a time through [`EditSession`]. [`ProjectSession`]
//! is the project-backed implementation: it walks the photos in export
//! order and saves `project.json` after every edit.

use crate::geometry::Point2;
use crate::project::{Photo, Project, ProjectError};

/// Read/write access to the corners of the photo being edited.
pub trait EditSession {
    /// Current corners, if the photo has been annotated.
    fn points(&self) -> Option<&[Point2]>;

    /// Replace the corners of the current photo.
    fn set_points(&mut self, points: Vec<Point2>) -> Result<(), ProjectError>;
}

/// Corners proposed for a photo that has not been annotated yet: a centred
/// rectangle spanning the middle half of the image, in corner order.
pub fn default_polygon(width: u32, height: u32) -> [Point2; 4] {
    let (w, h) = (width as f64, height as f64);
    [
        Point2::new(w / 4.0, h / 4.0),
        Point2::new(3.0 * w / 4.0, h / 4.0),
        Point2::new(3.0 * w / 4.0, 3.0 * h / 4.0),
        Point2::new(w / 4.0, 3.0 * h / 4.0),
    ]
}

/// Editing session over a project, positioned on one photo.
#[derive(Debug)]
pub struct ProjectSession<'a> {
    project: &'a mut Project,
    index: usize,
}

impl<'a> ProjectSession<'a> {
    /// Start on the first photo.
    pub fn new(project: &'a mut Project) -> Result<Self, ProjectError> {
        Self::at(project, 0)
    }

    /// Start on the photo at `index` (wrapping).
    pub fn at(project: &'a mut Project, index: usize) -> Result<Self, ProjectError> {
        if project.photos.is_empty() {
            return Err(ProjectError::UnknownPhoto(
                "project contains no photos".to_string(),
            ));
        }
        let index = index % project.photos.len();
        Ok(Self { project, index })
    }

    /// Start on the photo named `path`.
    pub fn open_photo(project: &'a mut Project, path: &str) -> Result<Self, ProjectError> {
        let index = project
            .find(path)
            .ok_or_else(|| ProjectError::UnknownPhoto(path.to_string()))?;
        Ok(Self { project, index })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> &Photo {
        &self.project.photos[self.index]
    }

    pub fn project(&self) -> &Project {
        self.project
    }

    /// Move to `index`, wrapping around the photo list in both directions.
    pub fn select(&mut self, index: isize) -> usize {
        let len = self.project.photos.len() as isize;
        self.index = index.rem_euclid(len) as usize;
        tracing::debug!(index = self.index, path = %self.current().path, "selected photo");
        self.index
    }

    pub fn next(&mut self) -> usize {
        self.select(self.index as isize + 1)
    }

    pub fn previous(&mut self) -> usize {
        self.select(self.index as isize - 1)
    }

    /// Remove the current photo's annotation and save.
    pub fn clear(&mut self) -> Result<(), ProjectError> {
        self.project.photos[self.index].polygon = None;
        self.project.save()
    }
}

impl EditSession for ProjectSession<'_> {
    fn points(&self) -> Option<&[Point2]> {
        self.current().polygon.as_deref()
    }

    fn set_points(&mut self, points: Vec<Point2>) -> Result<(), ProjectError> {
        tracing::debug!(path = %self.current().path, count = points.len(), "saving corners");
        self.project.photos[self.index].polygon = Some(points);
        self.project.save()
    }
}
