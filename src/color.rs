//! Low-frequency color transfer between a warped patch and its destination.
//!
//! The patch keeps its own detail (everything above the blur cut-off) and takes
//! over the destination's lighting and color cast:
//!
//! ```text
//! out = clamp(patch + blur(destination) - blur(patch), 0, 255)
//! ```

use image::{Rgb, RgbImage};
use imageproc::filter::separable_filter_equal;

use crate::error::{ensure_dimensions, Result};
use crate::types::PointSet;

/// Fraction of the interocular distance used as blur kernel size.
pub const DEFAULT_BLUR_FRACTION: f64 = 0.4;

/// Odd Gaussian kernel size derived from the eye distance of `landmarks`.
///
/// `fraction * interocular` is truncated, even values are bumped to the next
/// odd one, and the result is never below 1 (closed or collapsed eyes).
pub fn blur_kernel_size(landmarks: &PointSet, fraction: f64) -> u32 {
    let amount = landmarks
        .interocular_distance()
        .map(|d| fraction * d)
        .filter(|a| a.is_finite() && *a > 0.0)
        .unwrap_or(0.0);
    let mut size = amount as u32;
    if size % 2 == 0 {
        size += 1;
    }
    size
}

/// Standard deviation used for a kernel of `size` taps.
pub fn gaussian_sigma(size: u32) -> f32 {
    0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

fn gaussian_kernel(size: u32) -> Vec<f32> {
    let radius = (size / 2) as i32;
    let sigma = gaussian_sigma(size);
    let denom = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (-radius..=radius)
        .map(|i| (-((i * i) as f32) / denom).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|w| *w /= sum);
    kernel
}

/// Gaussian blur with an explicit odd kernel size; borders are clamped.
pub fn gaussian_blur(image: &RgbImage, size: u32) -> RgbImage {
    if size <= 1 {
        return image.clone();
    }
    separable_filter_equal(image, &gaussian_kernel(size))
}

/// Match the low-frequency color of `patch` to `destination`, using the blur
/// size implied by the destination's own landmarks.
pub fn correct_colors(
    destination: &RgbImage,
    patch: &RgbImage,
    landmarks: &PointSet,
    fraction: f64,
) -> Result<RgbImage> {
    let size = blur_kernel_size(landmarks, fraction);
    transfer_low_frequencies(destination, patch, size)
}

/// `patch + blur(destination) - blur(patch)` per channel, saturated.
pub fn transfer_low_frequencies(
    destination: &RgbImage,
    patch: &RgbImage,
    kernel_size: u32,
) -> Result<RgbImage> {
    ensure_dimensions(destination.dimensions(), patch.dimensions())?;

    let dest_blur = gaussian_blur(destination, kernel_size);
    let patch_blur = gaussian_blur(patch, kernel_size);
    log::debug!(
        "color transfer with {}-tap kernel (sigma {:.2})",
        kernel_size,
        gaussian_sigma(kernel_size)
    );

    Ok(RgbImage::from_fn(patch.width(), patch.height(), |x, y| {
        let p = patch.get_pixel(x, y).0;
        let d = dest_blur.get_pixel(x, y).0;
        let b = patch_blur.get_pixel(x, y).0;
        let mut out = [0u8; 3];
        for c in 0..3 {
            let v = p[c] as i32 + d[c] as i32 - b[c] as i32;
            out[c] = v.clamp(0, 255) as u8;
        }
        Rgb(out)
    }))
}
