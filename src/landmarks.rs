//! The iBUG 68-point landmark layout and the detector seam.
//!
//! Landmark detection itself lives outside this crate. Anything that can turn
//! an image into an ordered 68-point set plugs in through [`LandmarkDetector`].

use std::ops::Range;

use image::RgbImage;

use crate::error::{Error, ImageSide, Result};
use crate::types::{mean_point, BoundingBox, Point, PointSet};

/// Number of points in a face landmark set.
pub const FACE_LANDMARKS: usize = 68;

/// Facial regions of the 68-point scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceRegion {
    Jaw,
    RightBrow,
    LeftBrow,
    Nose,
    RightEye,
    LeftEye,
    Mouth,
}

impl FaceRegion {
    pub const ALL: [FaceRegion; 7] = [
        FaceRegion::Jaw,
        FaceRegion::RightBrow,
        FaceRegion::LeftBrow,
        FaceRegion::Nose,
        FaceRegion::RightEye,
        FaceRegion::LeftEye,
        FaceRegion::Mouth,
    ];

    /// Index range of the region within a 68-point set.
    pub const fn range(self) -> Range<usize> {
        match self {
            FaceRegion::Jaw => 0..17,
            FaceRegion::RightBrow => 17..22,
            FaceRegion::LeftBrow => 22..27,
            FaceRegion::Nose => 27..36,
            FaceRegion::RightEye => 36..42,
            FaceRegion::LeftEye => 42..48,
            FaceRegion::Mouth => 48..68,
        }
    }
}

/// Source of face landmarks for an image.
///
/// `None` means no face was found. Implementations return the first face
/// only; multi-face handling is up to the caller.
pub trait LandmarkDetector {
    fn detect(&self, image: &RgbImage) -> Option<PointSet>;
}

impl<F> LandmarkDetector for F
where
    F: Fn(&RgbImage) -> Option<PointSet>,
{
    fn detect(&self, image: &RgbImage) -> Option<PointSet> {
        self(image)
    }
}

impl PointSet {
    /// Check that this set is a usable face for `side`.
    pub fn validate_face(&self, side: ImageSide) -> Result<()> {
        if self.is_empty() {
            return Err(Error::NoFaceDetected { image: side });
        }
        if self.len() != FACE_LANDMARKS {
            return Err(Error::LandmarkCount {
                expected: FACE_LANDMARKS,
                actual: self.len(),
            });
        }
        if let Some(i) = self.iter().position(|p| !(p.x.is_finite() && p.y.is_finite())) {
            return Err(Error::IllConditionedInput(format!(
                "landmark {i} of {side} is not finite"
            )));
        }
        Ok(())
    }

    /// Mean position of a region, `None` when the set is too short.
    pub fn region_center(&self, region: FaceRegion) -> Option<Point> {
        self.points.get(region.range()).and_then(mean_point)
    }

    /// Distance between the two eye centers.
    pub fn interocular_distance(&self) -> Option<f64> {
        let right = self.region_center(FaceRegion::RightEye)?;
        let left = self.region_center(FaceRegion::LeftEye)?;
        Some(right.distance(&left))
    }

    /// The mean 68-point face layout placed inside `bbox`.
    pub fn mean_face(bbox: BoundingBox) -> Self {
        MEAN_FACE
            .iter()
            .map(|&(x, y)| bbox.denormalize_point(Point::new(x, y)))
            .collect::<Vec<_>>()
            .into()
    }
}

/// iBUG mean shape in normalized [0,1] coordinates.
const MEAN_FACE: [(f64, f64); FACE_LANDMARKS] = [
    // jaw
    (0.10, 0.35),
    (0.11, 0.45),
    (0.12, 0.55),
    (0.14, 0.65),
    (0.18, 0.73),
    (0.24, 0.80),
    (0.32, 0.85),
    (0.41, 0.88),
    (0.50, 0.89),
    (0.59, 0.88),
    (0.68, 0.85),
    (0.76, 0.80),
    (0.82, 0.73),
    (0.86, 0.65),
    (0.88, 0.55),
    (0.89, 0.45),
    (0.90, 0.35),
    // brows
    (0.20, 0.26),
    (0.25, 0.22),
    (0.32, 0.21),
    (0.38, 0.23),
    (0.43, 0.27),
    (0.57, 0.27),
    (0.62, 0.23),
    (0.68, 0.21),
    (0.75, 0.22),
    (0.80, 0.26),
    // nose
    (0.50, 0.32),
    (0.50, 0.40),
    (0.50, 0.48),
    (0.50, 0.55),
    (0.40, 0.58),
    (0.45, 0.60),
    (0.50, 0.62),
    (0.55, 0.60),
    (0.60, 0.58),
    // eyes
    (0.24, 0.32),
    (0.28, 0.29),
    (0.34, 0.29),
    (0.38, 0.33),
    (0.34, 0.35),
    (0.28, 0.35),
    (0.62, 0.33),
    (0.66, 0.29),
    (0.72, 0.29),
    (0.76, 0.32),
    (0.72, 0.35),
    (0.66, 0.35),
    // mouth
    (0.32, 0.72),
    (0.38, 0.68),
    (0.44, 0.66),
    (0.50, 0.67),
    (0.56, 0.66),
    (0.62, 0.68),
    (0.68, 0.72),
    (0.62, 0.78),
    (0.56, 0.80),
    (0.50, 0.81),
    (0.44, 0.80),
    (0.38, 0.78),
    (0.36, 0.72),
    (0.44, 0.70),
    (0.50, 0.70),
    (0.56, 0.70),
    (0.64, 0.72),
    (0.56, 0.74),
    (0.50, 0.75),
    (0.44, 0.74),
];
