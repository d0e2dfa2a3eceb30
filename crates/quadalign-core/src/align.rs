//! Alignment of an annotated quadrilateral onto the crop canvas.
//!
//! The operator marks four corners per photo. Corners 0→3 and 1→2 are the
//! two "vertical" edges of the object; their direction is measured from the
//! vertical axis (`atan2(dx, dy)`), so an upright object has a tilt of zero.
//!
//! The forward transform is
//!
//! ```text
//! F = translate(crop.left, crop.top) · rotate(tilt) · translate(-cx, -cy)
//! ```
//!
//! which moves the centroid to the origin, cancels the tilt, and places the
//! centroid at the canvas anchor `(crop.left, crop.top)`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{Matrix3, Point2};
use crate::project::Crop;

/// Number of corners in an annotation.
pub const POLYGON_CORNERS: usize = 4;

/// Default limit on the disagreement between the two tilt estimates (30°).
pub const DEFAULT_MAX_TILT_DIVERGENCE: f64 = std::f64::consts::PI / 6.0;

/// Edges shorter than this are treated as collapsed.
const MIN_EDGE_LENGTH: f64 = 1e-9;

/// Errors raised while deriving a photo's alignment.
#[derive(Debug, Error, PartialEq)]
pub enum AlignError {
    /// The photo has no polygon yet.
    #[error("photo has not been annotated")]
    MissingAnnotation,

    /// The polygon does not have exactly four corners.
    #[error("polygon must have exactly 4 points, found {count}")]
    MalformedPolygon { count: usize },

    /// The polygon cannot produce a meaningful transform.
    #[error("degenerate polygon: {reason}")]
    DegenerateGeometry { reason: String },
}

impl AlignError {
    fn degenerate(reason: impl Into<String>) -> Self {
        Self::DegenerateGeometry {
            reason: reason.into(),
        }
    }
}

/// Four ordered corners of the photographed object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Polygon([Point2; POLYGON_CORNERS]);

impl Polygon {
    pub fn new(points: [Point2; POLYGON_CORNERS]) -> Self {
        Self(points)
    }

    /// Build a polygon from an untyped point list.
    pub fn try_from_points(points: &[Point2]) -> Result<Self, AlignError> {
        let corners: [Point2; POLYGON_CORNERS] =
            points.try_into().map_err(|_| AlignError::MalformedPolygon {
                count: points.len(),
            })?;
        Ok(Self(corners))
    }

    pub fn points(&self) -> &[Point2; POLYGON_CORNERS] {
        &self.0
    }

    /// Average of the four corners.
    pub fn centroid(&self) -> Point2 {
        let (sx, sy) = self
            .0
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        let n = POLYGON_CORNERS as f64;
        Point2::new(sx / n, sy / n)
    }

    /// Tilt of the 0→3 and 1→2 edges, measured from the vertical axis.
    pub fn tilt_estimates(&self) -> (f64, f64) {
        let [p0, p1, p2, p3] = self.0;
        let a1 = (p3.x - p0.x).atan2(p3.y - p0.y);
        let a2 = (p2.x - p1.x).atan2(p2.y - p1.y);
        (a1, a2)
    }

    /// Mean of the two tilt estimates.
    pub fn tilt(&self) -> f64 {
        let (a1, a2) = self.tilt_estimates();
        (a1 + a2) / 2.0
    }

    /// Returns true if every turn along the outline has the same orientation.
    pub fn is_convex(&self) -> bool {
        let mut sign = 0.0f64;
        for i in 0..POLYGON_CORNERS {
            let a = self.0[i];
            let b = self.0[(i + 1) % POLYGON_CORNERS];
            let c = self.0[(i + 2) % POLYGON_CORNERS];
            let cross = (b.x - a.x) * (c.y - b.y) - (b.y - a.y) * (c.x - b.x);
            if cross == 0.0 {
                continue;
            }
            if sign == 0.0 {
                sign = cross.signum();
            } else if cross.signum() != sign {
                return false;
            }
        }
        sign != 0.0
    }
}

impl TryFrom<&[Point2]> for Polygon {
    type Error = AlignError;

    fn try_from(points: &[Point2]) -> Result<Self, Self::Error> {
        Self::try_from_points(points)
    }
}

/// Checks applied before a transform is derived.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentChecks {
    /// Largest accepted difference between the two tilt estimates, in radians,
    /// when both edges lean the same way. Edges leaning apart (perspective
    /// keystone) are not limited. `None` accepts any difference.
    pub max_tilt_divergence: Option<f64>,
    /// Reject self-intersecting or concave outlines.
    pub require_convex: bool,
}

impl Default for AlignmentChecks {
    fn default() -> Self {
        Self {
            max_tilt_divergence: Some(DEFAULT_MAX_TILT_DIVERGENCE),
            require_convex: true,
        }
    }
}

impl AlignmentChecks {
    /// No validation beyond finiteness.
    pub fn permissive() -> Self {
        Self {
            max_tilt_divergence: None,
            require_convex: false,
        }
    }
}

/// Forward transform from source pixels to canvas coordinates.
///
/// Pure; performs no validation.
pub fn forward_transform(polygon: &Polygon, crop: &Crop) -> Matrix3 {
    let c = polygon.centroid();
    Matrix3::translation(crop.left as f64, crop.top as f64)
        * Matrix3::rotation(polygon.tilt())
        * Matrix3::translation(-c.x, -c.y)
}

/// A validated alignment for one photo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Alignment {
    /// Source pixel → canvas.
    pub forward: Matrix3,
    /// Canvas → source pixel.
    pub inverse: Matrix3,
    pub centroid: Point2,
    /// Rotation applied to cancel the measured tilt, in radians.
    pub tilt: f64,
}

impl Alignment {
    /// Derive the alignment for `polygon` onto the canvas described by `crop`.
    pub fn compute(
        polygon: &Polygon,
        crop: &Crop,
        checks: &AlignmentChecks,
    ) -> Result<Self, AlignError> {
        validate(polygon, checks)?;

        let forward = forward_transform(polygon, crop);
        if !forward.is_finite() {
            return Err(AlignError::degenerate("transform has non-finite entries"));
        }
        let inverse = forward
            .inverse()
            .ok_or_else(|| AlignError::degenerate("transform is not invertible"))?;

        let centroid = polygon.centroid();
        let tilt = polygon.tilt();
        tracing::debug!(
            cx = centroid.x,
            cy = centroid.y,
            tilt_degrees = tilt.to_degrees(),
            "derived alignment"
        );

        Ok(Self {
            forward,
            inverse,
            centroid,
            tilt,
        })
    }

    /// Derive the alignment from an optional, untyped annotation.
    pub fn from_annotation(
        points: Option<&[Point2]>,
        crop: &Crop,
        checks: &AlignmentChecks,
    ) -> Result<Self, AlignError> {
        let points = points.ok_or(AlignError::MissingAnnotation)?;
        let polygon = Polygon::try_from_points(points)?;
        Self::compute(&polygon, crop, checks)
    }
}

fn validate(polygon: &Polygon, checks: &AlignmentChecks) -> Result<(), AlignError> {
    let [p0, p1, p2, p3] = *polygon.points();

    if let Some(i) = polygon.points().iter().position(|p| !p.is_finite()) {
        return Err(AlignError::degenerate(format!(
            "corner {i} has non-finite coordinates"
        )));
    }
    if p0.distance(&p3) < MIN_EDGE_LENGTH {
        return Err(AlignError::degenerate("edge 0-3 has zero length"));
    }
    if p1.distance(&p2) < MIN_EDGE_LENGTH {
        return Err(AlignError::degenerate("edge 1-2 has zero length"));
    }

    if let Some(max) = checks.max_tilt_divergence {
        let (a1, a2) = polygon.tilt_estimates();
        let divergence = (a1 - a2).abs();
        // Edges leaning apart are a keystoned shot; the mean tilt still holds
        let keystone = (a1 < 0.0 && a2 > 0.0) || (a1 > 0.0 && a2 < 0.0);
        if !keystone && divergence > max {
            return Err(AlignError::degenerate(format!(
                "edge tilts disagree by {:.1}° (limit {:.1}°); check corner order",
                divergence.to_degrees(),
                max.to_degrees()
            )));
        }
    }

    if checks.require_convex && !polygon.is_convex() {
        return Err(AlignError::degenerate(
            "outline is not convex; corners may be out of order",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn polygon(points: [(f64, f64); 4]) -> Polygon {
        Polygon::new(points.map(Point2::from))
    }

    fn default_crop() -> Crop {
        Crop::uniform(1000)
    }

    fn reference_polygon() -> Polygon {
        polygon([(100.0, 100.0), (500.0, 100.0), (520.0, 600.0), (80.0, 600.0)])
    }

    #[test]
    fn test_centroid() {
        let c = reference_polygon().centroid();
        assert!((c.x - 300.0).abs() < EPS);
        assert!((c.y - 350.0).abs() < EPS);
    }

    #[test]
    fn test_reference_polygon_maps_centroid_to_anchor() {
        let align =
            Alignment::compute(&reference_polygon(), &default_crop(), &Default::default())
                .unwrap();

        // Symmetric trapezoid: the two edge tilts cancel out
        assert!(align.tilt.abs() < EPS);

        let anchor = align.forward.apply(align.centroid);
        assert!((anchor.x - 1000.0).abs() < EPS);
        assert!((anchor.y - 1000.0).abs() < EPS);
    }

    #[test]
    fn test_axis_aligned_rectangle_is_pure_translation() {
        let rect = polygon([(10.0, 20.0), (210.0, 20.0), (210.0, 320.0), (10.0, 320.0)]);
        let (a1, a2) = rect.tilt_estimates();
        assert!(a1.abs() < EPS);
        assert!(a2.abs() < EPS);

        let crop = Crop::new(50, 60, 70, 80);
        let f = forward_transform(&rect, &crop);
        // centroid (110, 170) -> (80, 50)
        let expected = Matrix3::translation(80.0 - 110.0, 50.0 - 170.0);
        for (row, exp) in f.0.iter().zip(expected.0.iter()) {
            for (v, e) in row.iter().zip(exp.iter()) {
                assert!((v - e).abs() < EPS, "{:?} != {:?}", f, expected);
            }
        }
    }

    #[test]
    fn test_tilt_cancels_rotation() {
        // Rectangle rotated by +0.2 rad around the origin measures a -0.2 tilt
        let theta: f64 = 0.2;
        let rot = Matrix3::rotation(theta);
        let base = [(-100.0, -150.0), (100.0, -150.0), (100.0, 150.0), (-100.0, 150.0)];
        let rotated = Polygon::new(base.map(|p| rot.apply(Point2::from(p))));

        let align = Alignment::compute(&rotated, &default_crop(), &Default::default()).unwrap();
        assert!((align.tilt + theta).abs() < EPS, "tilt was {}", align.tilt);

        // Aligned corners are axis-aligned around the anchor
        let mapped: Vec<Point2> = rotated.points().iter().map(|p| align.forward.apply(*p)).collect();
        assert!((mapped[0].x - 900.0).abs() < 1e-6);
        assert!((mapped[0].y - 850.0).abs() < 1e-6);
        assert!((mapped[2].x - 1100.0).abs() < 1e-6);
        assert!((mapped[2].y - 1150.0).abs() < 1e-6);
    }

    #[test]
    fn test_forward_is_rigid_and_invertible() {
        let align =
            Alignment::compute(&reference_polygon(), &default_crop(), &Default::default())
                .unwrap();
        assert!(align.forward.is_rigid(EPS));

        let p = Point2::new(321.0, 45.5);
        let back = align.inverse.apply(align.forward.apply(p));
        assert!(back.distance(&p) < EPS);
    }

    #[test]
    fn test_missing_annotation() {
        let err = Alignment::from_annotation(None, &default_crop(), &Default::default());
        assert_eq!(err, Err(AlignError::MissingAnnotation));
    }

    #[test]
    fn test_malformed_polygon() {
        let points = vec![Point2::new(0.0, 0.0); 3];
        let err = Alignment::from_annotation(Some(&points), &default_crop(), &Default::default());
        assert_eq!(err, Err(AlignError::MalformedPolygon { count: 3 }));

        let points = vec![Point2::new(0.0, 0.0); 5];
        assert!(matches!(
            Polygon::try_from(points.as_slice()),
            Err(AlignError::MalformedPolygon { count: 5 })
        ));
    }

    #[test]
    fn test_duplicate_points_are_degenerate() {
        let poly = polygon([(5.0, 5.0); 4]);
        let err = Alignment::compute(&poly, &default_crop(), &AlignmentChecks::permissive());
        assert!(matches!(err, Err(AlignError::DegenerateGeometry { .. })));
    }

    #[test]
    fn test_non_finite_point_is_degenerate() {
        let poly = polygon([(0.0, 0.0), (10.0, 0.0), (f64::NAN, 10.0), (0.0, 10.0)]);
        let err = Alignment::compute(&poly, &default_crop(), &AlignmentChecks::permissive());
        match err {
            Err(AlignError::DegenerateGeometry { reason }) => assert!(reason.contains("corner 2")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_crossed_corners_are_rejected() {
        // Corners 2 and 3 swapped: the outline crosses itself
        let poly = polygon([(100.0, 100.0), (500.0, 100.0), (100.0, 600.0), (500.0, 600.0)]);
        let err = Alignment::compute(&poly, &default_crop(), &Default::default());
        assert!(matches!(err, Err(AlignError::DegenerateGeometry { .. })));

        // Permissive checks follow the plain averaging rule
        assert!(Alignment::compute(&poly, &default_crop(), &AlignmentChecks::permissive()).is_ok());
    }

    #[test]
    fn test_divergence_limit_can_be_disabled() {
        // Convex, but the vertical edges lean 40° apart
        let poly = polygon([(100.0, 100.0), (500.0, 100.0), (500.0, 600.0), (-264.0, 600.0)]);
        let strict = AlignmentChecks::default();
        assert!(Alignment::compute(&poly, &default_crop(), &strict).is_err());

        let relaxed = AlignmentChecks {
            max_tilt_divergence: None,
            ..strict
        };
        assert!(Alignment::compute(&poly, &default_crop(), &relaxed).is_ok());
    }

    #[test]
    fn test_keystone_passes_default_checks() {
        // Trapezoid widening towards the bottom: edges lean 43.6° apart
        let poly = polygon([(200.0, 100.0), (400.0, 100.0), (600.0, 600.0), (0.0, 600.0)]);
        let (a1, a2) = poly.tilt_estimates();
        assert!((a1 - a2).abs().to_degrees() > 40.0);

        let alignment =
            Alignment::compute(&poly, &default_crop(), &AlignmentChecks::default()).unwrap();
        assert!(alignment.tilt.abs() < 1e-12);

        // Narrowing towards the bottom is accepted too
        let poly = polygon([(0.0, 100.0), (600.0, 100.0), (400.0, 600.0), (200.0, 600.0)]);
        assert!(Alignment::compute(&poly, &default_crop(), &AlignmentChecks::default()).is_ok());
    }

    #[test]
    fn test_edges_leaning_the_same_way_are_checked() {
        // Convex, both edges lean right but 43° apart
        let poly = polygon([(0.0, 0.0), (100.0, 0.0), (400.0, 300.0), (10.0, 300.0)]);
        assert!(poly.is_convex());
        let err = Alignment::compute(&poly, &default_crop(), &AlignmentChecks::default());
        match err {
            Err(AlignError::DegenerateGeometry { reason }) => assert!(reason.contains("disagree")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_convexity() {
        assert!(reference_polygon().is_convex());
        let dart = polygon([(0.0, 0.0), (10.0, 0.0), (2.0, 2.0), (0.0, 10.0)]);
        assert!(!dart.is_convex());
    }
}
