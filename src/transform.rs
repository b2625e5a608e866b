use nalgebra::{Matrix2, Matrix3, Vector2, Vector3};
use serde::{Serialize, Serializer};

use crate::types::{Point, PointSet};

/// A 2D similarity transform (uniform scale, rotation, translation) stored as
/// a homogeneous 3x3 matrix with last row `[0, 0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform(Matrix3<f64>);

impl Transform {
    pub fn identity() -> Self {
        Self(Matrix3::identity())
    }

    /// `p -> scale * R(angle) * p + (tx, ty)`, angle in radians.
    pub fn similarity(scale: f64, angle: f64, tx: f64, ty: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        let rotation = Matrix2::new(cos, -sin, sin, cos);
        Self::from_parts(scale, &rotation, &Vector2::new(tx, ty))
    }

    pub(crate) fn from_parts(
        scale: f64,
        rotation: &Matrix2<f64>,
        translation: &Vector2<f64>,
    ) -> Self {
        let linear = rotation * scale;
        Self(Matrix3::new(
            linear[(0, 0)],
            linear[(0, 1)],
            translation.x,
            linear[(1, 0)],
            linear[(1, 1)],
            translation.y,
            0.0,
            0.0,
            1.0,
        ))
    }

    pub fn apply(&self, p: Point) -> Point {
        let v = self.0 * Vector3::new(p.x, p.y, 1.0);
        Point::new(v.x, v.y)
    }

    pub fn apply_all(&self, set: &PointSet) -> PointSet {
        set.map(|p| self.apply(p))
    }

    /// `None` when the linear part is singular (zero scale).
    pub fn inverse(&self) -> Option<Self> {
        self.0.try_inverse().map(Self)
    }

    /// The transform that applies `self` first and `next` second.
    pub fn then(&self, next: &Transform) -> Self {
        Self(next.0 * self.0)
    }

    pub fn scale(&self) -> f64 {
        let m = &self.0;
        (m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)]).abs().sqrt()
    }

    /// Rotation angle in radians, in (-pi, pi].
    pub fn rotation(&self) -> f64 {
        self.0[(1, 0)].atan2(self.0[(0, 0)])
    }

    pub fn translation(&self) -> Point {
        Point::new(self.0[(0, 2)], self.0[(1, 2)])
    }

    /// The top two rows, as passed to affine warping routines.
    pub fn to_affine(&self) -> [[f64; 3]; 2] {
        let m = &self.0;
        [
            [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
            [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
        ]
    }

    /// Element-wise comparison of the matrices.
    pub fn approx_eq(&self, other: &Transform, tol: f64) -> bool {
        self.0
            .iter()
            .zip(other.0.iter())
            .all(|(a, b)| (a - b).abs() <= tol)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Serialize for Transform {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_affine().serialize(serializer)
    }
}
