//! Homogeneous 2-D transforms.
//!
//! Matrices are 3x3, row-major, and always affine (last row `[0, 0, 1]`).
//! A point `p` is transformed as a column vector, so `a.compose(&b)`
//! applies `b` first and `a` second.
//!
//! # Coordinate System
//!
//! - Origin is the top-left corner of an image, x grows right, y grows down
//! - Rotation angles are in radians, `x' = x·cos θ − y·sin θ`,
//!   `y' = x·sin θ + y·cos θ`

use std::ops::Mul;

use serde::{Deserialize, Serialize};

/// A point in pixel coordinates.
///
/// Serialized as a `[x, y]` pair to match the project metadata format.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point2) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<[f64; 2]> for Point2 {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point2> for [f64; 2] {
    fn from(p: Point2) -> Self {
        [p.x, p.y]
    }
}

impl From<(f64, f64)> for Point2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// A 3x3 affine transform in homogeneous coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix3(pub [[f64; 3]; 3]);

impl Default for Matrix3 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix3 {
    pub fn identity() -> Self {
        Self([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
    }

    /// Matrix that adds `(dx, dy)` to a point.
    pub fn translation(dx: f64, dy: f64) -> Self {
        Self([[1.0, 0.0, dx], [0.0, 1.0, dy], [0.0, 0.0, 1.0]])
    }

    /// Matrix that rotates a point about the origin by `theta` radians.
    pub fn rotation(theta: f64) -> Self {
        let (s, c) = theta.sin_cos();
        Self([[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]])
    }

    /// Matrix product `self · other`; `other` is applied first.
    pub fn compose(&self, other: &Matrix3) -> Matrix3 {
        let (a, b) = (&self.0, &other.0);
        let mut out = [[0.0; 3]; 3];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j];
            }
        }
        Matrix3(out)
    }

    /// Transform a point.
    pub fn apply(&self, p: Point2) -> Point2 {
        let m = &self.0;
        Point2 {
            x: m[0][0] * p.x + m[0][1] * p.y + m[0][2],
            y: m[1][0] * p.x + m[1][1] * p.y + m[1][2],
        }
    }

    pub fn determinant(&self) -> f64 {
        let m = &self.0;
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// Inverse of an affine matrix, or `None` when the linear part is singular
    /// or the result is not finite.
    pub fn inverse(&self) -> Option<Matrix3> {
        let [a, b, c] = self.0[0];
        let [d, e, f] = self.0[1];

        let det = a * e - b * d;
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let inv_det = 1.0 / det;

        let ia = e * inv_det;
        let ib = -b * inv_det;
        let id = -d * inv_det;
        let ie = a * inv_det;
        let ic = -(ia * c + ib * f);
        let if_ = -(id * c + ie * f);

        let inv = Matrix3([[ia, ib, ic], [id, ie, if_], [0.0, 0.0, 1.0]]);
        inv.is_finite().then_some(inv)
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().flatten().all(|v| v.is_finite())
    }

    /// The six affine coefficients `[a, b, c, d, e, f]` of the top two rows.
    pub fn to_affine(&self) -> [f64; 6] {
        let m = &self.0;
        [m[0][0], m[0][1], m[0][2], m[1][0], m[1][1], m[1][2]]
    }

    /// Returns true when the linear part is a proper rotation (orthogonal,
    /// determinant 1) within `tolerance`.
    pub fn is_rigid(&self, tolerance: f64) -> bool {
        let m = &self.0;
        let (a, b, d, e) = (m[0][0], m[0][1], m[1][0], m[1][1]);
        (a * a + d * d - 1.0).abs() <= tolerance
            && (b * b + e * e - 1.0).abs() <= tolerance
            && (a * b + d * e).abs() <= tolerance
            && (a * e - b * d - 1.0).abs() <= tolerance
    }
}

impl Mul for Matrix3 {
    type Output = Matrix3;

    fn mul(self, rhs: Matrix3) -> Matrix3 {
        self.compose(&rhs)
    }
}

impl Mul<Point2> for Matrix3 {
    type Output = Point2;

    fn mul(self, rhs: Point2) -> Point2 {
        self.apply(rhs)
    }
}

/// Translation matrix, see [`Matrix3::translation`].
pub fn translation(dx: f64, dy: f64) -> Matrix3 {
    Matrix3::translation(dx, dy)
}

/// Rotation matrix, see [`Matrix3::rotation`].
pub fn rotation(theta: f64) -> Matrix3 {
    Matrix3::rotation(theta)
}

/// Matrix product `a · b`, see [`Matrix3::compose`].
pub fn compose(a: &Matrix3, b: &Matrix3) -> Matrix3 {
    a.compose(b)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn coord() -> impl Strategy<Value = f64> {
        -10_000.0f64..10_000.0
    }

    fn angle() -> impl Strategy<Value = f64> {
        -std::f64::consts::PI..std::f64::consts::PI
    }

    proptest! {
        /// Property: inverse undoes any rigid transform.
        #[test]
        fn prop_inverse_round_trip(
            tx in coord(), ty in coord(), theta in angle(), px in coord(), py in coord(),
        ) {
            let m = translation(tx, ty) * rotation(theta);
            let inv = m.inverse().unwrap();
            let p = Point2::new(px, py);
            let back = inv.apply(m.apply(p));
            prop_assert!(back.distance(&p) < 1e-9 * (1.0 + px.abs() + py.abs() + tx.abs() + ty.abs()));
        }

        /// Property: composition is associative.
        #[test]
        fn prop_compose_associative(
            tx in coord(), ty in coord(), theta in angle(), px in coord(), py in coord(),
        ) {
            let a = translation(tx, ty);
            let b = rotation(theta);
            let c = translation(-ty, tx);
            let p = Point2::new(px, py);
            let left = ((a * b) * c).apply(p);
            let right = (a * (b * c)).apply(p);
            prop_assert!(left.distance(&right) < 1e-6);
        }

        /// Property: rotations and translations stay rigid.
        #[test]
        fn prop_rigid_products(tx in coord(), ty in coord(), theta in angle()) {
            let m = translation(tx, ty) * rotation(theta) * translation(-tx, ty);
            prop_assert!(m.is_rigid(1e-9));
        }
    }
}
