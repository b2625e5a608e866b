use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A 2D point in pixel coordinates (x right, y down).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// z component of the cross product `(a - self) x (b - self)`.
    pub fn cross(&self, a: &Point, b: &Point) -> f64 {
        (a.x - self.x) * (b.y - self.y) - (a.y - self.y) * (b.x - self.x)
    }
}

impl std::ops::Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::AddAssign for Point {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl std::ops::Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl std::ops::Mul<f64> for Point {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

/// A bounding box defined by top-left corner, width, and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Convert a point from normalized coordinates [0,1] to image coordinates
    /// within this bounding box.
    pub fn denormalize_point(&self, p: Point) -> Point {
        Point::new(self.x + p.x * self.width, self.y + p.y * self.height)
    }
}

/// Integer pixel rectangle, inclusive of both edge pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl PixelRect {
    /// Center with integer division, `(x + w / 2, y + h / 2)`.
    pub fn center(&self) -> (i64, i64) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }
}

/// An ordered set of landmark points.
///
/// Indices are significant: a face set follows the iBUG 68-point order
/// (see [`crate::FaceRegion`]) and every stage relies on it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "PointSetRepr")]
pub struct PointSet {
    pub points: Vec<Point>,
}

/// Accepted JSON layouts: `{"points": [{"x":..,"y":..}]}` or `[[x, y], ...]`.
#[derive(Deserialize)]
#[serde(untagged)]
enum PointSetRepr {
    Object { points: Vec<Point> },
    Pairs(Vec<[f64; 2]>),
}

impl From<PointSetRepr> for PointSet {
    fn from(repr: PointSetRepr) -> Self {
        match repr {
            PointSetRepr::Object { points } => Self { points },
            PointSetRepr::Pairs(pairs) => Self {
                points: pairs.iter().map(|p| Point::new(p[0], p[1])).collect(),
            },
        }
    }
}

impl PointSet {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Point> {
        self.points.iter()
    }

    /// Mean of the points, or `None` for an empty set.
    pub fn centroid(&self) -> Option<Point> {
        mean_point(&self.points)
    }

    /// Scalar standard deviation over all coordinates of the centered set.
    pub fn coordinate_std(&self) -> f64 {
        let Some(c) = self.centroid() else {
            return 0.0;
        };
        let sum_sq: f64 = self
            .points
            .iter()
            .map(|p| {
                let d = *p - c;
                d.x * d.x + d.y * d.y
            })
            .sum();
        (sum_sq / (2 * self.points.len()) as f64).sqrt()
    }

    /// Tight floating-point bounds, or `None` for an empty set.
    pub fn bounds(&self) -> Option<BoundingBox> {
        let first = self.points.first()?;
        let (mut min, mut max) = (*first, *first);
        for p in &self.points[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some(BoundingBox::new(min.x, min.y, max.x - min.x, max.y - min.y))
    }

    /// Integer bounding rectangle over the floored coordinates.
    pub fn pixel_rect(&self) -> Option<PixelRect> {
        let b = self.bounds()?;
        let (x0, y0) = (b.x.floor() as i64, b.y.floor() as i64);
        let (x1, y1) = ((b.x + b.width).floor() as i64, (b.y + b.height).floor() as i64);
        Some(PixelRect {
            x: x0,
            y: y0,
            width: x1 - x0 + 1,
            height: y1 - y0 + 1,
        })
    }

    /// Apply `f` to every point, keeping the order.
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(Point) -> Point,
    {
        Self {
            points: self.points.iter().map(|p| f(*p)).collect(),
        }
    }

    /// Read a point set from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Write the point set as pretty-printed JSON.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data).map_err(Error::from)
    }
}

impl std::ops::Index<usize> for PointSet {
    type Output = Point;

    fn index(&self, idx: usize) -> &Self::Output {
        &self.points[idx]
    }
}

impl From<Vec<Point>> for PointSet {
    fn from(points: Vec<Point>) -> Self {
        Self { points }
    }
}

pub(crate) fn mean_point(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let sum = points.iter().fold(Point::zero(), |acc, p| acc + *p);
    Some(sum * (1.0 / points.len() as f64))
}
