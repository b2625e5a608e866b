//! Convex hull of a landmark set and its rasterized binary mask.

use image::{GrayImage, Luma};

use crate::types::{PixelRect, Point, PointSet};

/// Convex hull in counter-clockwise order (with respect to `Point::cross`).
///
/// Duplicate and collinear points are dropped. Fewer than three input points,
/// or points on a single line, give a hull with fewer than three vertices.
pub fn convex_hull(points: &[Point]) -> Vec<Point> {
    let mut sorted: Vec<Point> = points
        .iter()
        .copied()
        .filter(|p| p.x.is_finite() && p.y.is_finite())
        .collect();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    sorted.dedup();
    if sorted.len() < 3 {
        return sorted;
    }

    let mut lower = half_hull(sorted.iter());
    let mut upper = half_hull(sorted.iter().rev());
    // The last point of each chain starts the other one.
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

fn half_hull<'a>(points: impl Iterator<Item = &'a Point>) -> Vec<Point> {
    let mut chain: Vec<Point> = Vec::new();
    for p in points {
        while chain.len() >= 2 && chain[chain.len() - 2].cross(&chain[chain.len() - 1], p) <= 0.0 {
            chain.pop();
        }
        chain.push(*p);
    }
    chain
}

/// Unsigned area enclosed by a simple polygon (shoelace sum), 0 for fewer than
/// three vertices.
pub fn polygon_area(polygon: &[Point]) -> f64 {
    if polygon.len() < 3 {
        return 0.0;
    }
    let edges = polygon.iter().zip(polygon.iter().cycle().skip(1));
    let twice: f64 = edges.map(|(p, q)| p.x * q.y - q.x * p.y).sum();
    twice.abs() * 0.5
}

/// Whether `q` lies inside or on a counter-clockwise convex polygon.
pub fn convex_contains(hull: &[Point], q: Point) -> bool {
    if hull.len() < 3 {
        return false;
    }
    (0..hull.len()).all(|i| hull[i].cross(&hull[(i + 1) % hull.len()], &q) >= 0.0)
}

/// Single-channel mask holding only the values 0 and 255.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask(GrayImage);

impl Mask {
    pub const ON: u8 = 255;
    pub const OFF: u8 = 0;

    pub fn empty(width: u32, height: u32) -> Self {
        Self(GrayImage::new(width, height))
    }

    /// Set every pixel whose center lies inside or on the convex `hull`.
    pub fn from_convex_polygon(width: u32, height: u32, hull: &[Point]) -> Self {
        let mut mask = Self::empty(width, height);
        if hull.len() < 3 || width == 0 || height == 0 {
            return mask;
        }

        let bounds = PointSet::new(hull.to_vec()).pixel_rect();
        let Some(rect) = bounds else {
            return mask;
        };
        let x0 = rect.x.max(0);
        let y0 = rect.y.max(0);
        let x1 = (rect.x + rect.width).min(width as i64);
        let y1 = (rect.y + rect.height).min(height as i64);

        for y in y0..y1 {
            for x in x0..x1 {
                if convex_contains(hull, Point::new(x as f64, y as f64)) {
                    mask.0.put_pixel(x as u32, y as u32, Luma([Self::ON]));
                }
            }
        }
        mask
    }

    /// Filled convex hull of a landmark set.
    pub fn from_landmarks(width: u32, height: u32, landmarks: &PointSet) -> Self {
        Self::from_convex_polygon(width, height, &convex_hull(&landmarks.points))
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    /// False for coordinates outside the mask.
    pub fn contains(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= self.width() as i64 || y >= self.height() as i64 {
            return false;
        }
        self.0.get_pixel(x as u32, y as u32).0[0] == Self::ON
    }

    /// Number of set pixels.
    pub fn area(&self) -> usize {
        self.0.pixels().filter(|p| p.0[0] == Self::ON).count()
    }

    /// Tight rectangle around the set pixels, `None` for an empty mask.
    pub fn bounding_box(&self) -> Option<PixelRect> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for (x, y, p) in self.0.enumerate_pixels() {
            if p.0[0] != Self::ON {
                continue;
            }
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }
        bounds.map(|(x0, y0, x1, y1)| PixelRect {
            x: x0 as i64,
            y: y0 as i64,
            width: (x1 - x0 + 1) as i64,
            height: (y1 - y0 + 1) as i64,
        })
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BoundingBox;

    fn polygon_centroid(points: &[Point]) -> Option<Point> {
        let n = points.len();
        let (mut a2, mut cx, mut cy) = (0.0, 0.0, 0.0);
        for i in 0..n {
            let (p, q) = (points[i], points[(i + 1) % n]);
            let w = p.x * q.y - q.x * p.y;
            a2 += w;
            cx += (p.x + q.x) * w;
            cy += (p.y + q.y) * w;
        }
        (n >= 3 && a2.abs() > f64::EPSILON).then(|| Point::new(cx / (3.0 * a2), cy / (3.0 * a2)))
    }

    fn square(x: f64, y: f64, side: f64) -> Vec<Point> {
        vec![
            Point::new(x, y),
            Point::new(x + side, y),
            Point::new(x + side, y + side),
            Point::new(x, y + side),
        ]
    }

    #[test]
    fn test_polygon_area_triangle() {
        let triangle = vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(2.0, 3.0),
        ];
        assert!((polygon_area(&triangle) - 6.0).abs() < 1e-12);
    }

    #[test]
    fn hull_drops_interior_and_collinear_points() {
        let mut pts = square(0.0, 0.0, 10.0);
        pts.push(Point::new(5.0, 5.0));
        pts.push(Point::new(5.0, 0.0));
        pts.push(Point::new(0.0, 0.0));

        let hull = convex_hull(&pts);
        assert_eq!(hull.len(), 4);
        assert!((polygon_area(&hull) - 100.0).abs() < 1e-12);
        for i in 0..hull.len() {
            let (a, b, c) = (hull[i], hull[(i + 1) % 4], hull[(i + 2) % 4]);
            assert!(a.cross(&b, &c) > 0.0);
        }
    }

    #[test]
    fn hull_of_degenerate_input() {
        assert!(convex_hull(&[]).is_empty());
        let line: Vec<Point> = (0..5).map(|i| Point::new(i as f64, 2.0 * i as f64)).collect();
        assert!(convex_hull(&line).len() < 3);
        assert_eq!(Mask::from_convex_polygon(10, 10, &convex_hull(&line)).area(), 0);
    }

    #[test]
    fn mask_of_square_is_inclusive() {
        let mask = Mask::from_convex_polygon(20, 20, &convex_hull(&square(2.0, 3.0, 5.0)));
        // Pixel centers 2..=7 by 3..=8.
        assert_eq!(mask.area(), 36);
        assert!(mask.contains(2, 3) && mask.contains(7, 8));
        assert!(!mask.contains(1, 3) && !mask.contains(8, 8));
        assert_eq!(
            mask.bounding_box(),
            Some(PixelRect {
                x: 2,
                y: 3,
                width: 6,
                height: 6
            })
        );
    }

    #[test]
    fn mask_is_binary_and_clipped() {
        let hull = convex_hull(&square(-10.0, -10.0, 25.0));
        let mask = Mask::from_convex_polygon(12, 8, &hull);
        assert_eq!(mask.dimensions(), (12, 8));
        assert!(mask
            .as_image()
            .pixels()
            .all(|p| p.0[0] == Mask::ON || p.0[0] == Mask::OFF));
        assert_eq!(mask.area(), 12 * 8);
    }

    #[test]
    fn face_mask_contains_centroid_and_nothing_outside() {
        let face = PointSet::mean_face(BoundingBox::new(30.0, 20.0, 90.0, 110.0));
        let hull = convex_hull(&face.points);
        let mask = Mask::from_landmarks(160, 160, &face);

        let c = polygon_centroid(&hull).unwrap();
        assert!(mask.contains(c.x.round() as i64, c.y.round() as i64));

        for y in 0..160 {
            for x in 0..160 {
                if mask.contains(x, y) {
                    assert!(convex_contains(&hull, Point::new(x as f64, y as f64)));
                }
            }
        }

        let area = mask.area() as f64;
        let exact = polygon_area(&hull);
        assert!((area - exact).abs() / exact < 0.05, "{area} vs {exact}");
    }
}
