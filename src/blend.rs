//! Gradient-domain (Poisson) compositing of a patch into a destination.
//!
//! Inside the mask the output solves `laplacian(f) = div(v)` where `v` is the
//! guidance gradient field, with `f` fixed to the destination on the mask
//! boundary. Outside the mask the destination is copied verbatim.

use image::{Rgb, RgbImage};
use serde::Serialize;

use crate::config::{CloneMode, SolverOptions};
use crate::error::{ensure_dimensions, Result};
use crate::mask::Mask;
use crate::sampling::{pixel_clamped, to_u8};

const NEIGHBORS: [(i64, i64); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const OUTSIDE: usize = usize::MAX;

/// Solver diagnostics of one clone.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CloneStats {
    /// Pixels solved for.
    pub unknowns: usize,
    /// Largest iteration count over the three channels.
    pub iterations: usize,
    /// Largest final relative residual over the three channels.
    pub residual: f64,
}

#[derive(Debug, Clone)]
pub struct Blend {
    pub image: RgbImage,
    pub stats: CloneStats,
}

/// Seamlessly clone `patch` into `destination`.
///
/// `destination`, `patch` and `mask` must have the same size. The patch is
/// placed so that the center of the mask's bounding box lands on `anchor`
/// (destination pixel coordinates). Mask pixels on the destination border
/// keep their destination values.
pub fn seamless_clone(
    destination: &RgbImage,
    patch: &RgbImage,
    mask: &Mask,
    anchor: (i64, i64),
    mode: CloneMode,
    solver: &SolverOptions,
) -> Result<Blend> {
    ensure_dimensions(destination.dimensions(), patch.dimensions())?;
    ensure_dimensions(destination.dimensions(), mask.dimensions())?;

    let Some(rect) = mask.bounding_box() else {
        return Ok(Blend {
            image: destination.clone(),
            stats: CloneStats::default(),
        });
    };
    let center = rect.center();
    let offset = (anchor.0 - center.0, anchor.1 - center.1);

    let region = Region::new(destination, mask, offset);
    if region.pixels.is_empty() {
        return Ok(Blend {
            image: destination.clone(),
            stats: CloneStats::default(),
        });
    }

    let mut output = destination.clone();
    let mut stats = CloneStats {
        unknowns: region.pixels.len(),
        ..CloneStats::default()
    };
    let mut solved = vec![[0.0f64; 3]; region.pixels.len()];

    for channel in 0..3 {
        let (b, guess) = region.system(destination, patch, offset, mode, channel);
        let (x, iterations, residual) = region.conjugate_gradient(&b, guess, solver);
        stats.iterations = stats.iterations.max(iterations);
        stats.residual = stats.residual.max(residual);
        for (value, out) in x.iter().zip(solved.iter_mut()) {
            out[channel] = *value;
        }
    }

    for (&(x, y), v) in region.pixels.iter().zip(solved.iter()) {
        output.put_pixel(x, y, Rgb([to_u8(v[0]), to_u8(v[1]), to_u8(v[2])]));
    }

    log::debug!(
        "seamless clone: {} unknowns, {} iterations, residual {:.2e}",
        stats.unknowns,
        stats.iterations,
        stats.residual
    );
    Ok(Blend { image: output, stats })
}

/// Unknown pixels in destination coordinates and their in-region neighbors.
struct Region {
    width: u32,
    pixels: Vec<(u32, u32)>,
    index: Vec<usize>,
}

impl Region {
    fn new(destination: &RgbImage, mask: &Mask, offset: (i64, i64)) -> Self {
        let (w, h) = destination.dimensions();
        let mut index = vec![OUTSIDE; (w as usize) * (h as usize)];
        let mut pixels = Vec::new();
        for y in 1..h.saturating_sub(1) {
            for x in 1..w.saturating_sub(1) {
                if mask.contains(x as i64 - offset.0, y as i64 - offset.1) {
                    index[(y * w + x) as usize] = pixels.len();
                    pixels.push((x, y));
                }
            }
        }
        Self {
            width: w,
            pixels,
            index,
        }
    }

    fn lookup(&self, x: i64, y: i64) -> usize {
        self.index[(y as usize) * (self.width as usize) + x as usize]
    }

    /// Right-hand side and initial guess (the placed patch) for one channel.
    fn system(
        &self,
        destination: &RgbImage,
        patch: &RgbImage,
        offset: (i64, i64),
        mode: CloneMode,
        channel: usize,
    ) -> (Vec<f64>, Vec<f64>) {
        let dest = |x: i64, y: i64| pixel_clamped(destination, x, y)[channel];
        let src = |x: i64, y: i64| pixel_clamped(patch, x - offset.0, y - offset.1)[channel];

        let mut b = Vec::with_capacity(self.pixels.len());
        let mut guess = Vec::with_capacity(self.pixels.len());
        for &(px, py) in &self.pixels {
            let (x, y) = (px as i64, py as i64);
            let mut rhs = 0.0;
            for (dx, dy) in NEIGHBORS {
                let (qx, qy) = (x + dx, y + dy);
                let g_src = src(x, y) - src(qx, qy);
                rhs += match mode {
                    CloneMode::Normal => g_src,
                    CloneMode::Mixed => {
                        let g_dst = dest(x, y) - dest(qx, qy);
                        if g_dst.abs() > g_src.abs() {
                            g_dst
                        } else {
                            g_src
                        }
                    }
                };
                if self.lookup(qx, qy) == OUTSIDE {
                    rhs += dest(qx, qy);
                }
            }
            b.push(rhs);
            guess.push(src(x, y));
        }
        (b, guess)
    }

    /// `4 f_p - sum of in-region neighbors`.
    fn apply_laplacian(&self, v: &[f64], out: &mut [f64]) {
        for (i, &(px, py)) in self.pixels.iter().enumerate() {
            let (x, y) = (px as i64, py as i64);
            let mut acc = 4.0 * v[i];
            for (dx, dy) in NEIGHBORS {
                let j = self.lookup(x + dx, y + dy);
                if j != OUTSIDE {
                    acc -= v[j];
                }
            }
            out[i] = acc;
        }
    }

    fn conjugate_gradient(
        &self,
        b: &[f64],
        mut x: Vec<f64>,
        solver: &SolverOptions,
    ) -> (Vec<f64>, usize, f64) {
        let n = b.len();
        let b_norm = dot(b, b).sqrt().max(1.0);
        let mut ap = vec![0.0; n];

        self.apply_laplacian(&x, &mut ap);
        let mut r: Vec<f64> = b.iter().zip(&ap).map(|(bi, ai)| bi - ai).collect();
        let mut p = r.clone();
        let mut rs = dot(&r, &r);

        let mut iterations = 0;
        while iterations < solver.max_iterations && rs.sqrt() > solver.tolerance * b_norm {
            self.apply_laplacian(&p, &mut ap);
            let p_ap = dot(&p, &ap);
            if p_ap <= 0.0 {
                break;
            }
            let alpha = rs / p_ap;
            for i in 0..n {
                x[i] += alpha * p[i];
                r[i] -= alpha * ap[i];
            }
            let rs_new = dot(&r, &r);
            let beta = rs_new / rs;
            for i in 0..n {
                p[i] = r[i] + beta * p[i];
            }
            rs = rs_new;
            iterations += 1;
        }
        (x, iterations, rs.sqrt() / b_norm)
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
