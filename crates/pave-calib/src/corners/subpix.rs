//! Iterative sub-pixel corner refinement.
//!
//! For a saddle point `q`, the image gradient at any nearby pixel `p` is
//! orthogonal to `p - q`. Summing `g gᵀ (p - q) = 0` over a Gaussian-weighted
//! window gives a 2x2 linear system for `q`, which is re-solved around each
//! new estimate until it stops moving.

use image::GrayImage;
use pave_core::{Pt2, Real};
use serde::{Deserialize, Serialize};

/// Termination criteria and window size for [`refine_corners`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubPixCriteria {
    /// Half side of the search window; the window is `2 * half_window + 1` wide.
    pub half_window: u32,
    pub max_iters: usize,
    /// Stop once an update moves the corner by less than this many pixels.
    pub epsilon: Real,
}

impl Default for SubPixCriteria {
    fn default() -> Self {
        Self {
            half_window: 5,
            max_iters: 30,
            epsilon: 0.001,
        }
    }
}

/// Refine `corners` in place.
///
/// A corner that would drift further than the half window from where it
/// started is left at its input position.
pub fn refine_corners(img: &GrayImage, corners: &mut [Pt2], criteria: &SubPixCriteria) {
    if img.width() == 0 || img.height() == 0 || criteria.half_window == 0 {
        return;
    }
    let win = criteria.half_window as i64;
    let mask = gaussian_mask(win);

    for corner in corners.iter_mut() {
        *corner = refine_one(img, *corner, win, &mask, criteria);
    }
}

fn gaussian_mask(win: i64) -> Vec<Real> {
    let side = (2 * win + 1) as usize;
    let w = win as Real;
    let mut mask = Vec::with_capacity(side * side);
    for i in -win..=win {
        for j in -win..=win {
            let (y, x) = (i as Real / w, j as Real / w);
            mask.push((-(x * x) - y * y).exp());
        }
    }
    mask
}

fn refine_one(
    img: &GrayImage,
    start: Pt2,
    win: i64,
    mask: &[Real],
    criteria: &SubPixCriteria,
) -> Pt2 {
    let (w, h) = (img.width() as Real, img.height() as Real);
    let eps2 = criteria.epsilon * criteria.epsilon;
    let mut c = start;

    for _ in 0..criteria.max_iters {
        let (mut a, mut b, mut cc) = (0.0, 0.0, 0.0);
        let (mut bb1, mut bb2) = (0.0, 0.0);

        let mut k = 0;
        for i in -win..=win {
            let py = i as Real;
            for j in -win..=win {
                let px = j as Real;
                let sx = c.x + px;
                let sy = c.y + py;
                let gx = sample(img, sx + 1.0, sy) - sample(img, sx - 1.0, sy);
                let gy = sample(img, sx, sy + 1.0) - sample(img, sx, sy - 1.0);
                let m = mask[k];
                k += 1;

                let gxx = gx * gx * m;
                let gxy = gx * gy * m;
                let gyy = gy * gy * m;
                a += gxx;
                b += gxy;
                cc += gyy;
                bb1 += gxx * px + gxy * py;
                bb2 += gxy * px + gyy * py;
            }
        }

        let det = a * cc - b * b;
        if det.abs() <= Real::EPSILON * Real::EPSILON {
            break;
        }
        let scale = 1.0 / det;
        let next = Pt2::new(
            c.x + cc * scale * bb1 - b * scale * bb2,
            c.y - b * scale * bb1 + a * scale * bb2,
        );
        let moved = (next - c).norm_squared();
        c = next;
        if c.x < 0.0 || c.x >= w || c.y < 0.0 || c.y >= h || moved <= eps2 {
            break;
        }
    }

    let limit = win as Real;
    if !c.x.is_finite()
        || !c.y.is_finite()
        || (c.x - start.x).abs() > limit
        || (c.y - start.y).abs() > limit
    {
        return start;
    }
    c
}

/// Bilinear sample with replicated border.
fn sample(img: &GrayImage, x: Real, y: Real) -> Real {
    let (w, h) = (img.width() as i64, img.height() as i64);
    let x0 = x.floor();
    let y0 = y.floor();
    let (fx, fy) = (x - x0, y - y0);
    let at = |xi: i64, yi: i64| -> Real {
        let xi = xi.clamp(0, w - 1) as u32;
        let yi = yi.clamp(0, h - 1) as u32;
        img.get_pixel(xi, yi)[0] as Real
    };
    let (xi, yi) = (x0 as i64, y0 as i64);
    let top = at(xi, yi) * (1.0 - fx) + at(xi + 1, yi) * fx;
    let bottom = at(xi, yi + 1) * (1.0 - fx) + at(xi + 1, yi + 1) * fx;
    top * (1.0 - fy) + bottom * fy
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    /// Anti-aliased X-junction at `(cx, cy)` in pixel-centre coordinates.
    fn saddle(size: u32, cx: Real, cy: Real) -> GrayImage {
        const SS: u32 = 8;
        GrayImage::from_fn(size, size, |x, y| {
            let mut acc = 0.0;
            for sy in 0..SS {
                for sx in 0..SS {
                    let px = x as Real - 0.5 + (sx as Real + 0.5) / SS as Real;
                    let py = y as Real - 0.5 + (sy as Real + 0.5) / SS as Real;
                    let dark = (px < cx) == (py < cy);
                    acc += if dark { 30.0 } else { 220.0 };
                }
            }
            Luma([(acc / (SS * SS) as Real).round() as u8])
        })
    }

    #[test]
    fn converges_to_saddle_point() {
        let img = saddle(48, 23.3, 22.6);
        let mut corners = [Pt2::new(24.0, 22.0), Pt2::new(22.4, 23.5)];
        refine_corners(&img, &mut corners, &SubPixCriteria::default());
        for c in corners {
            assert!((c - Pt2::new(23.3, 22.6)).norm() < 0.1, "refined to {c}");
        }
    }

    #[test]
    fn flat_image_leaves_corner_untouched() {
        let img = GrayImage::from_pixel(32, 32, Luma([128]));
        let mut corners = [Pt2::new(15.5, 12.25)];
        refine_corners(&img, &mut corners, &SubPixCriteria::default());
        assert_eq!(corners[0], Pt2::new(15.5, 12.25));
    }

    #[test]
    fn zero_window_is_a_no_op() {
        let img = saddle(32, 15.3, 15.7);
        let mut corners = [Pt2::new(16.0, 16.0)];
        let criteria = SubPixCriteria {
            half_window: 0,
            ..SubPixCriteria::default()
        };
        refine_corners(&img, &mut corners, &criteria);
        assert_eq!(corners[0], Pt2::new(16.0, 16.0));
    }

    #[test]
    fn criteria_deserialize_with_defaults() {
        let c: SubPixCriteria = serde_json::from_str(r#"{"half_window": 3}"#).unwrap();
        assert_eq!(c.half_window, 3);
        assert_eq!(c.max_iters, 30);
    }
}
