//! Project model: a directory of photos plus its `project.json` sidecar.
//!
//! # Layout
//!
//! ```text
//! <base>/
//!   project.json      crop, output width, per-photo polygons
//!   a.jpg, b.JPEG     source photos (sorted by name = export order)
//!   out/0.jpg ...     exported photos, named by sorted index
//! ```
//!
//! # Metadata Format
//!
//! ```text
//! {
//!   "photos": { "a.jpg": { "polygon": [[x, y], [x, y], [x, y], [x, y]] | null } },
//!   "crop": [top, right, bottom, left],
//!   "width": 1000
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::Point2;

/// Name of the metadata sidecar inside the project directory.
pub const METADATA_FILE: &str = "project.json";

/// Name of the export directory inside the project directory.
pub const OUTPUT_DIR: &str = "out";

/// Default margin on every side of the anchor, in pixels.
pub const DEFAULT_MARGIN: u32 = 1000;

/// Default output width, in pixels.
pub const DEFAULT_WIDTH: u32 = 1000;

/// Recognised photo extensions (compared case-insensitively).
const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg"];

/// Errors raised while loading, validating, or saving a project.
#[derive(Debug, Error)]
pub enum ProjectError {
    /// The directory or metadata file could not be read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The metadata file is not valid JSON or does not match the schema.
    #[error("Invalid project metadata in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Crop margins or width violate the project invariants.
    #[error("Invalid project configuration: {0}")]
    InvalidConfig(String),

    /// No photo with this path exists in the project.
    #[error("Unknown photo: {0}")]
    UnknownPhoto(String),
}

impl ProjectError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Margins around the anchor point, defining the crop canvas.
///
/// Serialized as `[top, right, bottom, left]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u32; 4]", into = "[u32; 4]")]
pub struct Crop {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl Default for Crop {
    fn default() -> Self {
        Self::uniform(DEFAULT_MARGIN)
    }
}

impl Crop {
    pub fn new(top: u32, right: u32, bottom: u32, left: u32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Same margin on every side.
    pub fn uniform(margin: u32) -> Self {
        Self::new(margin, margin, margin, margin)
    }

    /// Canvas dimensions `(left + right, top + bottom)`.
    pub fn canvas_size(&self) -> (u32, u32) {
        (
            self.left.saturating_add(self.right),
            self.top.saturating_add(self.bottom),
        )
    }

    fn validate(&self) -> Result<(), ProjectError> {
        if self.top == 0 || self.right == 0 || self.bottom == 0 || self.left == 0 {
            return Err(ProjectError::InvalidConfig(format!(
                "crop margins must all be positive, got [{}, {}, {}, {}]",
                self.top, self.right, self.bottom, self.left
            )));
        }
        Ok(())
    }
}

impl From<[u32; 4]> for Crop {
    fn from([top, right, bottom, left]: [u32; 4]) -> Self {
        Self::new(top, right, bottom, left)
    }
}

impl From<Crop> for [u32; 4] {
    fn from(c: Crop) -> Self {
        [c.top, c.right, c.bottom, c.left]
    }
}

/// Output dimensions for a canvas scaled to `width`, preserving aspect ratio.
pub fn output_size(crop: &Crop, width: u32) -> (u32, u32) {
    let (canvas_w, canvas_h) = crop.canvas_size();
    if canvas_w == 0 {
        return (width, 0);
    }
    let height = (width as f64 * canvas_h as f64 / canvas_w as f64).round() as u32;
    (width, height.max(1))
}

/// One source photo.
#[derive(Debug, Clone, PartialEq)]
pub struct Photo {
    /// File name relative to the project base.
    pub path: String,
    /// Corner annotation, or `None` until the photo is marked.
    pub polygon: Option<Vec<Point2>>,
}

impl Photo {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            polygon: None,
        }
    }

    pub fn is_annotated(&self) -> bool {
        self.polygon.is_some()
    }
}

/// Persisted per-photo record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PhotoMeta {
    #[serde(default)]
    polygon: Option<Vec<Point2>>,
}

/// Persisted `project.json` contents.
#[derive(Debug, Clone, Serialize)]
struct ProjectMeta {
    photos: BTreeMap<String, PhotoMeta>,
    crop: Crop,
    width: u32,
}

impl Default for ProjectMeta {
    fn default() -> Self {
        Self {
            photos: BTreeMap::new(),
            crop: Crop::default(),
            width: DEFAULT_WIDTH,
        }
    }
}

/// `project.json` as written by any tool: sizes are plain JSON numbers.
#[derive(Debug, Deserialize)]
struct StoredMeta {
    #[serde(default)]
    photos: BTreeMap<String, PhotoMeta>,
    #[serde(default)]
    crop: Option<[f64; 4]>,
    #[serde(default)]
    width: Option<f64>,
}

impl StoredMeta {
    fn into_meta(self) -> Result<ProjectMeta, ProjectError> {
        let crop = match self.crop {
            Some([top, right, bottom, left]) => Crop::new(
                whole_pixels("crop top", top)?,
                whole_pixels("crop right", right)?,
                whole_pixels("crop bottom", bottom)?,
                whole_pixels("crop left", left)?,
            ),
            None => Crop::default(),
        };
        let width = match self.width {
            Some(width) => whole_pixels("width", width)?,
            None => DEFAULT_WIDTH,
        };
        Ok(ProjectMeta {
            photos: self.photos,
            crop,
            width,
        })
    }
}

/// Convert a JSON number to a pixel count; `1000.0` is accepted, `10.5` is not.
fn whole_pixels(field: &str, value: f64) -> Result<u32, ProjectError> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
        return Err(ProjectError::InvalidConfig(format!(
            "{field} must be a whole number of pixels, got {value}"
        )));
    }
    Ok(value as u32)
}

/// An export job: base directory, canvas configuration, and ordered photos.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub base: PathBuf,
    pub crop: Crop,
    /// Output width after downsampling.
    pub width: u32,
    /// Photos sorted by file name.
    pub photos: Vec<Photo>,
}

impl Project {
    /// Build a project in memory without touching the filesystem.
    pub fn new(base: impl Into<PathBuf>, crop: Crop, width: u32, mut photos: Vec<Photo>) -> Self {
        photos.sort_by(|a, b| a.path.cmp(&b.path));
        Self {
            base: base.into(),
            crop,
            width,
            photos,
        }
    }

    /// Open the project in `base`: discover photos and merge saved metadata.
    ///
    /// A missing `project.json` yields an unannotated project with default
    /// crop and width. Saved entries for files that no longer exist are
    /// dropped.
    pub fn open(base: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let base = base.as_ref();
        let meta = read_metadata(&base.join(METADATA_FILE))?;
        let mut saved = meta.photos;

        let photos = discover_photos(base)?
            .into_iter()
            .map(|path| {
                let polygon = saved.remove(&path).and_then(|m| m.polygon);
                Photo { path, polygon }
            })
            .collect::<Vec<_>>();

        if !saved.is_empty() {
            tracing::debug!(
                stale = saved.len(),
                "ignoring metadata for photos not found on disk"
            );
        }

        tracing::debug!(
            base = %base.display(),
            photos = photos.len(),
            "opened project"
        );

        Ok(Self::new(base, meta.crop, meta.width, photos))
    }

    /// Write crop, width, and every photo's polygon to `project.json`.
    pub fn save(&self) -> Result<(), ProjectError> {
        let meta = ProjectMeta {
            photos: self
                .photos
                .iter()
                .map(|p| {
                    (
                        p.path.clone(),
                        PhotoMeta {
                            polygon: p.polygon.clone(),
                        },
                    )
                })
                .collect(),
            crop: self.crop,
            width: self.width,
        };

        let path = self.metadata_path();
        let json = serde_json::to_string_pretty(&meta).map_err(|source| ProjectError::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(|e| ProjectError::io(&path, e))
    }

    /// Check that the crop canvas and output width are non-empty.
    pub fn validate(&self) -> Result<(), ProjectError> {
        self.crop.validate()?;
        if self.width == 0 {
            return Err(ProjectError::InvalidConfig(
                "output width must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.base.join(METADATA_FILE)
    }

    /// Absolute path of a photo's source file.
    pub fn photo_path(&self, photo: &Photo) -> PathBuf {
        self.base.join(&photo.path)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.base.join(OUTPUT_DIR)
    }

    /// Output file for the photo at `index` in sorted order.
    pub fn output_path(&self, index: usize) -> PathBuf {
        self.output_dir().join(format!("{index}.jpg"))
    }

    /// Crop canvas size before downsampling.
    pub fn canvas_size(&self) -> (u32, u32) {
        self.crop.canvas_size()
    }

    /// Final output size after downsampling.
    pub fn output_size(&self) -> (u32, u32) {
        output_size(&self.crop, self.width)
    }

    pub fn find(&self, path: &str) -> Option<usize> {
        self.photos.iter().position(|p| p.path == path)
    }

    /// Replace the polygon of the photo at `path`.
    pub fn set_polygon(
        &mut self,
        path: &str,
        polygon: Option<Vec<Point2>>,
    ) -> Result<(), ProjectError> {
        let index = self
            .find(path)
            .ok_or_else(|| ProjectError::UnknownPhoto(path.to_string()))?;
        self.photos[index].polygon = polygon;
        Ok(())
    }

    pub fn annotated_count(&self) -> usize {
        self.photos.iter().filter(|p| p.is_annotated()).count()
    }
}

fn read_metadata(path: &Path) -> Result<ProjectMeta, ProjectError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(ProjectMeta::default()),
        Err(e) => return Err(ProjectError::io(path, e)),
    };
    let stored: StoredMeta =
        serde_json::from_str(&contents).map_err(|source| ProjectError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    stored.into_meta()
}

/// Returns true if `name` has a `.jpg`/`.jpeg` extension, in any case.
pub fn is_photo_file(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            PHOTO_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// List photo file names directly inside `base`, sorted.
fn discover_photos(base: &Path) -> Result<Vec<String>, ProjectError> {
    let entries = fs::read_dir(base).map_err(|e| ProjectError::io(base, e))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ProjectError::io(base, e))?;
        let is_file = entry
            .file_type()
            .map_err(|e| ProjectError::io(&entry.path(), e))?
            .is_file();
        if !is_file {
            continue;
        }
        let file_name = entry.file_name();
        match file_name.to_str() {
            Some(name) if is_photo_file(name) => names.push(name.to_string()),
            Some(_) => {}
            None => {
                if is_photo_file(&file_name.to_string_lossy()) {
                    tracing::warn!(
                        path = %entry.path().display(),
                        "skipping photo with a non UTF-8 file name"
                    );
                }
            }
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"").unwrap();
    }

    fn square(offset: f64) -> Vec<Point2> {
        vec![
            Point2::new(offset, offset),
            Point2::new(offset + 10.0, offset),
            Point2::new(offset + 10.0, offset + 10.0),
            Point2::new(offset, offset + 10.0),
        ]
    }

    #[test]
    fn test_crop_defaults() {
        let crop = Crop::default();
        assert_eq!(crop, Crop::uniform(1000));
        assert_eq!(crop.canvas_size(), (2000, 2000));
    }

    #[test]
    fn test_crop_serializes_as_trbl_array() {
        let crop = Crop::new(1, 2, 3, 4);
        assert_eq!(serde_json::to_string(&crop).unwrap(), "[1,2,3,4]");
        let parsed: Crop = serde_json::from_str("[10, 20, 30, 40]").unwrap();
        assert_eq!(parsed.top, 10);
        assert_eq!(parsed.right, 20);
        assert_eq!(parsed.bottom, 30);
        assert_eq!(parsed.left, 40);
    }

    #[test]
    fn test_canvas_size_uses_opposite_margins() {
        let crop = Crop::new(100, 300, 500, 200);
        assert_eq!(crop.canvas_size(), (500, 600));
    }

    #[test]
    fn test_output_size_preserves_aspect() {
        assert_eq!(output_size(&Crop::default(), 1000), (1000, 1000));
        // 2000 x 3000 canvas
        assert_eq!(output_size(&Crop::new(1500, 1000, 1500, 1000), 800), (800, 1200));
        // 3000 x 1000 canvas: 700 / 3 = 233.33
        assert_eq!(output_size(&Crop::new(500, 1500, 500, 1500), 700), (700, 233));
    }

    #[test]
    fn test_is_photo_file() {
        assert!(is_photo_file("a.jpg"));
        assert!(is_photo_file("B.JPG"));
        assert!(is_photo_file("c.Jpeg"));
        assert!(!is_photo_file("d.png"));
        assert!(!is_photo_file("jpg"));
        assert!(!is_photo_file("project.json"));
    }

    #[test]
    fn test_open_without_metadata() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.jpg");
        touch(dir.path(), "a.JPEG");
        touch(dir.path(), "notes.txt");
        fs::create_dir(dir.path().join("sub.jpg")).unwrap();

        let project = Project::open(dir.path()).unwrap();
        let names: Vec<_> = project.photos.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(names, ["a.JPEG", "b.jpg"]);
        assert!(project.photos.iter().all(|p| p.polygon.is_none()));
        assert_eq!(project.crop, Crop::default());
        assert_eq!(project.width, DEFAULT_WIDTH);
    }

    #[test]
    fn test_open_merges_polygons_and_ignores_stale_keys() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.jpg");
        touch(dir.path(), "b.jpg");
        fs::write(
            dir.path().join(METADATA_FILE),
            r#"{
                "photos": {
                    "a.jpg": {"polygon": [[1, 2], [3, 4], [5, 6], [7, 8]]},
                    "gone.jpg": {"polygon": [[0, 0], [1, 0], [1, 1], [0, 1]]}
                },
                "crop": [10, 20, 30, 40],
                "width": 500
            }"#,
        )
        .unwrap();

        let project = Project::open(dir.path()).unwrap();
        assert_eq!(project.photos.len(), 2);
        assert_eq!(project.photos[0].polygon.as_ref().unwrap()[3], Point2::new(7.0, 8.0));
        assert!(project.photos[1].polygon.is_none());
        assert_eq!(project.crop, Crop::new(10, 20, 30, 40));
        assert_eq!(project.width, 500);
    }

    #[test]
    fn test_open_accepts_null_polygon_and_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.jpg");
        fs::write(
            dir.path().join(METADATA_FILE),
            r#"{"photos": {"a.jpg": {"polygon": null}}}"#,
        )
        .unwrap();

        let project = Project::open(dir.path()).unwrap();
        assert!(project.photos[0].polygon.is_none());
        assert_eq!(project.crop, Crop::default());
        assert_eq!(project.width, DEFAULT_WIDTH);
    }

    #[test]
    fn test_open_accepts_whole_float_sizes() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.jpg");
        fs::write(
            dir.path().join(METADATA_FILE),
            r#"{"photos": {}, "width": 1000.0, "crop": [10.0, 20, 30, 40]}"#,
        )
        .unwrap();

        let project = Project::open(dir.path()).unwrap();
        assert_eq!(project.width, 1000);
        assert_eq!(project.crop, Crop::new(10, 20, 30, 40));
    }

    #[test]
    fn test_open_rejects_fractional_or_negative_sizes() {
        let dir = tempfile::tempdir().unwrap();
        let metadata = dir.path().join(METADATA_FILE);

        fs::write(&metadata, r#"{"width": 999.5}"#).unwrap();
        match Project::open(dir.path()) {
            Err(ProjectError::InvalidConfig(msg)) => assert!(msg.contains("width")),
            other => panic!("unexpected {:?}", other),
        }

        fs::write(&metadata, r#"{"crop": [10, -20, 30, 40]}"#).unwrap();
        match Project::open(dir.path()) {
            Err(ProjectError::InvalidConfig(msg)) => assert!(msg.contains("crop right")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_open_skips_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.jpg");
        fs::write(dir.path().join(OsStr::from_bytes(b"b\xff.jpg")), b"").unwrap();
        touch(dir.path(), "c.jpg");

        let project = Project::open(dir.path()).unwrap();
        let names: Vec<_> = project.photos.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(names, ["a.jpg", "c.jpg"]);
    }

    #[test]
    fn test_open_rejects_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(METADATA_FILE), "{not json").unwrap();
        assert!(matches!(
            Project::open(dir.path()),
            Err(ProjectError::Json { .. })
        ));
    }

    #[test]
    fn test_open_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            Project::open(&missing),
            Err(ProjectError::Io { .. })
        ));
    }

    #[test]
    fn test_save_then_open_keeps_annotations() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.jpg");
        touch(dir.path(), "b.jpg");

        let mut project = Project::open(dir.path()).unwrap();
        project.set_polygon("b.jpg", Some(square(5.0))).unwrap();
        project.crop = Crop::new(100, 200, 300, 400);
        project.width = 640;
        project.save().unwrap();

        let reopened = Project::open(dir.path()).unwrap();
        assert_eq!(reopened, project);

        // Unannotated photos are persisted with an explicit null
        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(project.metadata_path()).unwrap()).unwrap();
        assert!(raw["photos"]["a.jpg"]["polygon"].is_null());
        assert_eq!(raw["crop"], serde_json::json!([100, 200, 300, 400]));
        assert_eq!(raw["width"], 640);
    }

    #[test]
    fn test_set_polygon_unknown_photo() {
        let mut project = Project::new("/tmp/x", Crop::default(), 1000, vec![Photo::new("a.jpg")]);
        assert!(matches!(
            project.set_polygon("zzz.jpg", None),
            Err(ProjectError::UnknownPhoto(_))
        ));
    }

    #[test]
    fn test_validate() {
        let mut project = Project::new("/tmp/x", Crop::default(), 1000, vec![]);
        assert!(project.validate().is_ok());

        project.crop.bottom = 0;
        assert!(matches!(project.validate(), Err(ProjectError::InvalidConfig(_))));

        project.crop.bottom = 10;
        project.width = 0;
        assert!(matches!(project.validate(), Err(ProjectError::InvalidConfig(_))));
    }

    #[test]
    fn test_new_sorts_photos_and_paths() {
        let project = Project::new(
            "/data/shoot",
            Crop::default(),
            1000,
            vec![Photo::new("c.jpg"), Photo::new("a.jpg"), Photo::new("b.jpg")],
        );
        let names: Vec<_> = project.photos.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(names, ["a.jpg", "b.jpg", "c.jpg"]);
        assert_eq!(project.output_path(2), PathBuf::from("/data/shoot/out/2.jpg"));
        assert_eq!(
            project.photo_path(&project.photos[0]),
            PathBuf::from("/data/shoot/a.jpg")
        );
    }
}
