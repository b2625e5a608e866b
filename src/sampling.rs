use image::RgbImage;

/// Bicubic convolution parameter, matching the common `a = -0.75` kernel.
const CUBIC_A: f64 = -0.75;

/// Read a pixel with out-of-bounds coordinates clamped to the nearest edge.
#[inline]
pub fn pixel_clamped(image: &RgbImage, x: i64, y: i64) -> [f64; 3] {
    let cx = x.clamp(0, image.width() as i64 - 1) as u32;
    let cy = y.clamp(0, image.height() as i64 - 1) as u32;
    let p = image.get_pixel(cx, cy).0;
    [p[0] as f64, p[1] as f64, p[2] as f64]
}

/// Weights of the four taps at offsets -1, 0, 1, 2 for fractional position `t`.
#[inline]
fn cubic_weights(t: f64) -> [f64; 4] {
    let a = CUBIC_A;
    let w0 = ((a * (t + 1.0) - 5.0 * a) * (t + 1.0) + 8.0 * a) * (t + 1.0) - 4.0 * a;
    let w1 = ((a + 2.0) * t - (a + 3.0)) * t * t + 1.0;
    let w2 = ((a + 2.0) * (1.0 - t) - (a + 3.0)) * (1.0 - t) * (1.0 - t) + 1.0;
    [w0, w1, w2, 1.0 - w0 - w1 - w2]
}

/// Sample an RGB image at a sub-pixel position with bicubic interpolation.
///
/// Reads outside the image replicate the border. The result is not clamped:
/// the cubic kernel can overshoot slightly near sharp edges.
///
/// The image must be non-empty.
pub fn sample_bicubic(image: &RgbImage, x: f64, y: f64) -> [f64; 3] {
    let x0 = x.floor();
    let y0 = y.floor();
    let wx = cubic_weights(x - x0);
    let wy = cubic_weights(y - y0);
    let (x0, y0) = (x0 as i64, y0 as i64);

    let mut out = [0.0; 3];
    for (j, wy) in wy.iter().enumerate() {
        if *wy == 0.0 {
            continue;
        }
        let sy = y0 - 1 + j as i64;
        let mut row = [0.0; 3];
        for (i, wx) in wx.iter().enumerate() {
            if *wx == 0.0 {
                continue;
            }
            let p = pixel_clamped(image, x0 - 1 + i as i64, sy);
            for c in 0..3 {
                row[c] += wx * p[c];
            }
        }
        for c in 0..3 {
            out[c] += wy * row[c];
        }
    }
    out
}

/// Round and saturate to a byte.
#[inline]
pub fn to_u8(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
