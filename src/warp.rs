//! Affine resampling of an image into another frame.
//!
//! Convention used throughout the crate: the transform handed to
//! [`warp_affine`] maps **output** pixel coordinates to **input** pixel
//! coordinates. To bring image B into image A's frame, pass the transform that
//! maps A's landmarks onto B's.

use image::{Rgb, RgbImage};

use crate::error::{Error, Result};
use crate::sampling::{sample_bicubic, to_u8};
use crate::transform::Transform;

/// Resample `image` into a `width` x `height` frame.
///
/// Every output pixel `p` takes the bicubic sample of `image` at
/// `transform(p)`; lookups outside the input replicate its border.
pub fn warp_affine(
    image: &RgbImage,
    transform: &Transform,
    width: u32,
    height: u32,
) -> Result<RgbImage> {
    if image.width() == 0 || image.height() == 0 || width == 0 || height == 0 {
        return Err(Error::EmptyImage);
    }

    let [[a, b, tx], [c, d, ty]] = transform.to_affine();
    let warped = RgbImage::from_fn(width, height, |x, y| {
        let (xf, yf) = (x as f64, y as f64);
        let sx = a * xf + b * yf + tx;
        let sy = c * xf + d * yf + ty;
        let s = sample_bicubic(image, sx, sy);
        Rgb([to_u8(s[0]), to_u8(s[1]), to_u8(s[2])])
    });

    log::debug!(
        "warped {}x{} into {}x{} frame",
        image.width(),
        image.height(),
        width,
        height
    );
    Ok(warped)
}

/// Resample `image` into the frame (size) of `frame`.
pub fn warp_into(image: &RgbImage, transform: &Transform, frame: &RgbImage) -> Result<RgbImage> {
    warp_affine(image, transform, frame.width(), frame.height())
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use super::*;

    fn pattern(w: u32, h: u32) -> RgbImage {
        RgbImage::from_fn(w, h, |x, y| {
            Rgb([
                (x * 37 % 256) as u8,
                (y * 53 % 256) as u8,
                ((x ^ y) * 11 % 256) as u8,
            ])
        })
    }

    #[test]
    fn identity_is_exact() {
        let img = pattern(33, 21);
        let out = warp_affine(&img, &Transform::identity(), 33, 21).unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn integer_shift_moves_content_and_replicates_edges() {
        let img = pattern(16, 12);
        // Output (x, y) reads input (x + 3, y - 2).
        let shift = Transform::similarity(1.0, 0.0, 3.0, -2.0);
        let out = warp_into(&img, &shift, &img).unwrap();

        assert_eq!(out.get_pixel(0, 5), img.get_pixel(3, 3));
        assert_eq!(out.get_pixel(10, 11), img.get_pixel(13, 9));
        // Right edge replicated from column 15, top rows from row 0.
        assert_eq!(out.get_pixel(14, 0), img.get_pixel(15, 0));
        assert_eq!(out.get_pixel(15, 1), img.get_pixel(15, 0));
    }

    #[test]
    fn half_turn_about_center() {
        let img = pattern(9, 9);
        let to_origin = Transform::similarity(1.0, 0.0, -4.0, -4.0);
        let rotate = Transform::similarity(1.0, PI, 0.0, 0.0);
        let back = Transform::similarity(1.0, 0.0, 4.0, 4.0);
        let t = to_origin.then(&rotate).then(&back);

        let out = warp_affine(&img, &t, 9, 9).unwrap();
        for (x, y) in [(0, 0), (2, 7), (8, 3), (4, 4)] {
            assert_eq!(out.get_pixel(x, y), img.get_pixel(8 - x, 8 - y));
        }
    }

    #[test]
    fn output_size_follows_request() {
        let img = pattern(10, 10);
        let t = Transform::similarity(0.5, 0.2, 1.0, 1.0);
        let out = warp_affine(&img, &t, 25, 7).unwrap();
        assert_eq!(out.dimensions(), (25, 7));
    }

    #[test]
    fn empty_inputs_are_rejected() {
        let img = pattern(4, 4);
        assert!(matches!(
            warp_affine(&img, &Transform::identity(), 0, 4),
            Err(Error::EmptyImage)
        ));
        assert!(matches!(
            warp_affine(&RgbImage::new(0, 0), &Transform::identity(), 4, 4),
            Err(Error::EmptyImage)
        ));
    }
}
