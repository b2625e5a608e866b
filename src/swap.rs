//! Two-way face swap built from the alignment, warp, color and blend stages.

use std::fmt;

use image::{imageops, RgbImage};
use serde::Serialize;

use crate::align::{alignment_rms, estimate_similarity};
use crate::blend::{seamless_clone, CloneStats};
use crate::color::{blur_kernel_size, transfer_low_frequencies};
use crate::config::SwapOptions;
use crate::error::{ensure_dimensions, Error, ImageSide, Result};
use crate::mask::{convex_hull, polygon_area, Mask};
use crate::transform::Transform;
use crate::types::PointSet;
use crate::warp::warp_into;

/// Which frame receives the other image's face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    /// Image B's face composited into image A.
    IntoA,
    /// Image A's face composited into image B.
    IntoB,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::IntoA => write!(f, "B -> A"),
            Direction::IntoB => write!(f, "A -> B"),
        }
    }
}

/// Pipeline stage of one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Align,
    Warp,
    ColorCorrect,
    Composite,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Align => "align",
            Stage::Warp => "warp",
            Stage::ColorCorrect => "color correction",
            Stage::Composite => "composite",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Diagnostics of one direction.
#[derive(Debug, Clone, Serialize)]
pub struct DirectionReport {
    pub direction: Direction,
    /// Maps destination pixel coordinates to source pixel coordinates.
    pub transform: Transform,
    /// RMS landmark distance after alignment, in source pixels.
    pub alignment_rms: Option<f64>,
    /// Gaussian kernel size used for color correction, `None` when disabled.
    pub blur_kernel: Option<u32>,
    /// Rasterized face region, in pixels.
    pub mask_area: usize,
    /// Exact area of the landmark hull; close to `mask_area` unless the hull
    /// leaves the frame.
    pub hull_area: f64,
    pub clone: CloneStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct SwapReport {
    pub into_a: DirectionReport,
    pub into_b: DirectionReport,
}

/// Both composited images plus diagnostics.
#[derive(Debug, Clone)]
pub struct SwapResult {
    /// Image A's frame carrying image B's face.
    pub image_a: RgbImage,
    /// Image B's frame carrying image A's face.
    pub image_b: RgbImage,
    pub report: SwapReport,
}

impl SwapResult {
    /// Both outputs next to each other, A on the left, top-aligned.
    pub fn side_by_side(&self) -> RgbImage {
        let (wa, ha) = self.image_a.dimensions();
        let (wb, hb) = self.image_b.dimensions();
        let mut canvas = RgbImage::new(wa + wb, ha.max(hb));
        imageops::replace(&mut canvas, &self.image_a, 0, 0);
        imageops::replace(&mut canvas, &self.image_b, wa as i64, 0);
        canvas
    }
}

/// Runs swaps with a fixed set of options.
#[derive(Debug, Clone, Default)]
pub struct FaceSwapper {
    options: SwapOptions,
}

impl FaceSwapper {
    pub fn new(options: SwapOptions) -> Self {
        Self { options }
    }

    /// Swap the faces of two images.
    ///
    /// Missing or empty landmark sets fail with [`Error::NoFaceDetected`]
    /// before any pixel is touched. Either direction failing fails the whole
    /// call.
    pub fn swap(
        &self,
        image_a: &RgbImage,
        landmarks_a: Option<&PointSet>,
        image_b: &RgbImage,
        landmarks_b: Option<&PointSet>,
    ) -> Result<SwapResult> {
        let landmarks_a = require_face(landmarks_a, ImageSide::A)?;
        let landmarks_b = require_face(landmarks_b, ImageSide::B)?;

        let (image_a_out, into_a) =
            self.run(Direction::IntoA, image_a, landmarks_a, image_b, landmarks_b)?;
        let (image_b_out, into_b) =
            self.run(Direction::IntoB, image_b, landmarks_b, image_a, landmarks_a)?;

        Ok(SwapResult {
            image_a: image_a_out,
            image_b: image_b_out,
            report: SwapReport { into_a, into_b },
        })
    }

    fn run(
        &self,
        direction: Direction,
        destination: &RgbImage,
        dest_landmarks: &PointSet,
        source: &RgbImage,
        source_landmarks: &PointSet,
    ) -> Result<(RgbImage, DirectionReport)> {
        let mut stage = Stage::Align;
        let result = self.composite(
            direction,
            &mut stage,
            destination,
            dest_landmarks,
            source,
            source_landmarks,
        );
        match &result {
            Ok(_) => log::debug!("{direction}: {}", Stage::Done),
            Err(e) => log::warn!("{direction}: {} during {stage}: {e}", Stage::Failed),
        }
        result
    }

    fn composite(
        &self,
        direction: Direction,
        stage: &mut Stage,
        destination: &RgbImage,
        dest_landmarks: &PointSet,
        source: &RgbImage,
        source_landmarks: &PointSet,
    ) -> Result<(RgbImage, DirectionReport)> {
        let mut enter = |next: Stage| {
            log::debug!("{direction}: {next}");
            *stage = next;
        };

        enter(Stage::Align);
        let transform = estimate_similarity(dest_landmarks, source_landmarks)?;
        let rms = alignment_rms(&transform, dest_landmarks, source_landmarks);

        enter(Stage::Warp);
        let warped = warp_into(source, &transform, destination)?;
        ensure_dimensions(destination.dimensions(), warped.dimensions())?;

        enter(Stage::ColorCorrect);
        let (patch, blur_kernel) = if self.options.color_correction {
            let size = blur_kernel_size(dest_landmarks, self.options.blur_fraction);
            (transfer_low_frequencies(destination, &warped, size)?, Some(size))
        } else {
            (warped, None)
        };

        enter(Stage::Composite);
        let (width, height) = destination.dimensions();
        let hull = convex_hull(&dest_landmarks.points);
        let mask = Mask::from_convex_polygon(width, height, &hull);
        let anchor = mask.bounding_box().map(|r| r.center()).unwrap_or((0, 0));
        let blend = seamless_clone(
            destination,
            &patch,
            &mask,
            anchor,
            self.options.clone_mode,
            &self.options.solver,
        )?;

        let report = DirectionReport {
            direction,
            transform,
            alignment_rms: rms,
            blur_kernel,
            mask_area: mask.area(),
            hull_area: polygon_area(&hull),
            clone: blend.stats,
        };
        Ok((blend.image, report))
    }
}

/// Swap with default options.
pub fn swap(
    image_a: &RgbImage,
    landmarks_a: Option<&PointSet>,
    image_b: &RgbImage,
    landmarks_b: Option<&PointSet>,
) -> Result<SwapResult> {
    FaceSwapper::default().swap(image_a, landmarks_a, image_b, landmarks_b)
}

fn require_face(landmarks: Option<&PointSet>, side: ImageSide) -> Result<&PointSet> {
    let landmarks = landmarks.ok_or(Error::NoFaceDetected { image: side })?;
    landmarks.validate_face(side)?;
    Ok(landmarks)
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;
    use crate::types::{BoundingBox, Point};

    fn portrait(w: u32, h: u32, tint: [u8; 3]) -> RgbImage {
        RgbImage::from_fn(w, h, |x, y| {
            Rgb([
                tint[0].saturating_add((x % 17) as u8),
                tint[1].saturating_add((y % 13) as u8),
                tint[2].saturating_add(((x + y) % 7) as u8),
            ])
        })
    }

    #[test]
    fn missing_face_is_reported_before_image_work() {
        let face = PointSet::mean_face(BoundingBox::new(10.0, 10.0, 40.0, 40.0));
        // Zero-sized images would fail in the warp; validation comes first.
        let empty = RgbImage::new(0, 0);

        let err = swap(&empty, None, &empty, Some(&face)).unwrap_err();
        assert!(matches!(err, Error::NoFaceDetected { image: ImageSide::A }));

        let err = swap(&empty, Some(&face), &empty, Some(&PointSet::default())).unwrap_err();
        assert!(matches!(err, Error::NoFaceDetected { image: ImageSide::B }));

        let short = PointSet::new(face.points[..30].to_vec());
        let err = swap(&empty, Some(&short), &empty, Some(&face)).unwrap_err();
        assert!(matches!(err, Error::LandmarkCount { expected: 68, actual: 30 }));
    }

    #[test]
    fn non_finite_landmarks_are_rejected() {
        let img = portrait(64, 64, [90, 90, 90]);
        let face = PointSet::mean_face(BoundingBox::new(12.0, 12.0, 40.0, 40.0));
        let mut bad = face.clone();
        bad.points[5] = Point::new(f64::NAN, 3.0);

        let err = swap(&img, Some(&face), &img, Some(&bad)).unwrap_err();
        assert!(matches!(err, Error::IllConditionedInput(_)), "{err}");
        let err = swap(&img, Some(&bad), &img, Some(&face)).unwrap_err();
        assert!(matches!(err, Error::IllConditionedInput(_)), "{err}");
    }

    #[test]
    fn self_swap_is_identity() {
        let img = portrait(96, 96, [120, 90, 70]);
        let face = PointSet::mean_face(BoundingBox::new(20.0, 18.0, 56.0, 60.0));

        let result = swap(&img, Some(&face), &img, Some(&face)).unwrap();
        assert_eq!(result.image_a, img);
        assert_eq!(result.image_b, img);

        let report = &result.report.into_a;
        assert!(report.transform.approx_eq(&Transform::identity(), 1e-9));
        assert!(report.alignment_rms.unwrap() < 1e-9);
        assert!(report.mask_area > 0);
        let area = report.mask_area as f64;
        assert!((area - report.hull_area).abs() / report.hull_area < 0.1);
        assert_eq!(report.clone.iterations, 0);
    }

    #[test]
    fn disabled_color_correction_skips_blur() {
        let a = portrait(80, 80, [60, 60, 60]);
        let b = portrait(80, 80, [160, 100, 40]);
        let face_a = PointSet::mean_face(BoundingBox::new(15.0, 15.0, 50.0, 50.0));
        let face_b = PointSet::mean_face(BoundingBox::new(20.0, 10.0, 45.0, 55.0));

        let options = SwapOptions {
            color_correction: false,
            ..SwapOptions::default()
        };
        let result = FaceSwapper::new(options)
            .swap(&a, Some(&face_a), &b, Some(&face_b))
            .unwrap();
        assert_eq!(result.report.into_a.blur_kernel, None);

        let corrected = swap(&a, Some(&face_a), &b, Some(&face_b)).unwrap();
        assert!(corrected.report.into_a.blur_kernel.unwrap() >= 1);
        assert_eq!(corrected.report.into_a.direction, Direction::IntoA);
        assert_eq!(corrected.report.into_b.direction, Direction::IntoB);
    }

    #[test]
    fn side_by_side_places_a_then_b() {
        let a = portrait(70, 60, [10, 10, 10]);
        let b = portrait(50, 80, [200, 200, 200]);
        let face_a = PointSet::mean_face(BoundingBox::new(10.0, 10.0, 40.0, 40.0));
        let face_b = PointSet::mean_face(BoundingBox::new(8.0, 20.0, 35.0, 45.0));

        let result = swap(&a, Some(&face_a), &b, Some(&face_b)).unwrap();
        assert_eq!(result.image_a.dimensions(), (70, 60));
        assert_eq!(result.image_b.dimensions(), (50, 80));

        let montage = result.side_by_side();
        assert_eq!(montage.dimensions(), (120, 80));
        assert_eq!(montage.get_pixel(0, 0), result.image_a.get_pixel(0, 0));
        assert_eq!(montage.get_pixel(70, 79), result.image_b.get_pixel(0, 79));
        assert_eq!(montage.get_pixel(5, 70), &Rgb([0, 0, 0]));
    }

    #[test]
    fn report_serializes() {
        let img = portrait(64, 64, [90, 90, 90]);
        let face = PointSet::mean_face(BoundingBox::new(12.0, 12.0, 40.0, 40.0));
        let result = swap(&img, Some(&face), &img, Some(&face)).unwrap();

        let json = serde_json::to_value(&result.report).unwrap();
        assert_eq!(json["into_a"]["direction"], "IntoA");
        assert!(json["into_b"]["transform"].is_array());
        assert!(json["into_b"]["clone"]["unknowns"].as_u64().unwrap() > 0);
    }
}
