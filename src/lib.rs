//! # face-swap
//!
//! Pure Rust geometric face alignment and blending.
//!
//! Given two images and a 68-point landmark set for the face in each, the crate
//! puts each face into the other image:
//!
//! 1. Estimate the similarity transform between the two landmark sets
//!    (Procrustes analysis)
//! 2. Warp the source image into the destination frame (bicubic, edge
//!    replicated)
//! 3. Transfer the destination's low-frequency color onto the warped face
//! 4. Seamlessly clone the face region (convex hull of the landmarks) into the
//!    destination by solving a Poisson equation
//!
//! Landmark detection is not part of this crate; plug a detector in through
//! [`LandmarkDetector`] or load landmark sets from JSON.
//!
//! ## Quick Start
//!
//! ```rust
//! use face_swap::{swap, BoundingBox, PointSet, RgbImage};
//!
//! let image_a = RgbImage::from_fn(128, 128, |x, y| image::Rgb([x as u8, y as u8, 90]));
//! let image_b = RgbImage::from_fn(128, 128, |x, y| image::Rgb([90, x as u8, y as u8]));
//!
//! // Landmarks normally come from a detector.
//! let face_a = PointSet::mean_face(BoundingBox::new(30.0, 25.0, 64.0, 70.0));
//! let face_b = PointSet::mean_face(BoundingBox::new(20.0, 30.0, 80.0, 76.0));
//!
//! let result = swap(&image_a, Some(&face_a), &image_b, Some(&face_b)).unwrap();
//! assert_eq!(result.image_a.dimensions(), (128, 128));
//! println!("B -> A scale: {:.3}", result.report.into_a.transform.scale());
//! ```
//!
//! ## Options
//!
//! ```rust
//! use face_swap::{CloneMode, FaceSwapper, SwapOptions};
//!
//! let swapper = FaceSwapper::new(SwapOptions {
//!     clone_mode: CloneMode::Mixed,
//!     color_correction: false,
//!     ..SwapOptions::default()
//! });
//! # let _ = swapper;
//! ```

pub mod align;
pub mod blend;
pub mod color;
pub mod config;
mod error;
pub mod landmarks;
pub mod mask;
pub mod sampling;
pub mod swap;
mod transform;
mod types;
pub mod warp;
pub mod worker;

pub use align::estimate_similarity;
pub use blend::{seamless_clone, Blend, CloneStats};
pub use color::correct_colors;
pub use config::{load_options, CloneMode, SolverOptions, SwapOptions};
pub use error::{Error, ImageSide, Result};
pub use image::RgbImage;
pub use landmarks::{FaceRegion, LandmarkDetector, FACE_LANDMARKS};
pub use mask::{convex_hull, Mask};
pub use swap::{swap, Direction, DirectionReport, FaceSwapper, Stage, SwapReport, SwapResult};
pub use transform::Transform;
pub use types::{BoundingBox, PixelRect, Point, PointSet};
pub use warp::warp_affine;
pub use worker::{SwapJob, SwapWorker};
