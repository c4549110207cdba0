//! New camera matrix that trades black borders against lost pixels.

use pave_core::{BrownConrady5, CameraIntrinsics, DistortionModel, Pt2, Real, Vec2};
use serde::{Deserialize, Serialize};

/// Pixel rectangle; `x + width` and `y + height` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roi {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Roi {
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Axis-aligned rectangle in continuous coordinates.
#[derive(Debug, Clone, Copy)]
struct Rect {
    x0: Real,
    y0: Real,
    x1: Real,
    y1: Real,
}

const GRID: usize = 9;
const ROUNDING_SLACK: Real = 1e-6;

/// Inscribed and circumscribed rectangles of the undistorted image border,
/// in normalised camera coordinates.
fn undistorted_rectangles(k: &CameraIntrinsics, dist: &BrownConrady5, w: u32, h: u32) -> (Rect, Rect) {
    let step_x = (w as Real - 1.0) / (GRID - 1) as Real;
    let step_y = (h as Real - 1.0) / (GRID - 1) as Real;

    let mut outer = Rect {
        x0: Real::MAX,
        y0: Real::MAX,
        x1: Real::MIN,
        y1: Real::MIN,
    };
    let mut inner = Rect {
        x0: Real::MIN,
        y0: Real::MIN,
        x1: Real::MAX,
        y1: Real::MAX,
    };

    for gy in 0..GRID {
        for gx in 0..GRID {
            let px = Pt2::new(gx as Real * step_x, gy as Real * step_y);
            let n: Vec2 = dist.undistort(&k.from_pixel(&px));

            outer.x0 = outer.x0.min(n.x);
            outer.y0 = outer.y0.min(n.y);
            outer.x1 = outer.x1.max(n.x);
            outer.y1 = outer.y1.max(n.y);

            if gx == 0 {
                inner.x0 = inner.x0.max(n.x);
            }
            if gx == GRID - 1 {
                inner.x1 = inner.x1.min(n.x);
            }
            if gy == 0 {
                inner.y0 = inner.y0.max(n.y);
            }
            if gy == GRID - 1 {
                inner.y1 = inner.y1.min(n.y);
            }
        }
    }
    (inner, outer)
}

/// Camera matrix for undistorting a `width x height` image, plus the region
/// of the undistorted image in which every pixel has a valid source.
///
/// `alpha = 0` zooms in until no invalid pixel is visible; `alpha = 1` keeps
/// every source pixel and leaves black borders. The valid region is the
/// inscribed rectangle under the returned camera, rounded inwards and
/// clipped to the image.
pub fn optimal_new_camera_matrix(
    k: &CameraIntrinsics,
    dist: &BrownConrady5,
    width: u32,
    height: u32,
    alpha: Real,
) -> (CameraIntrinsics, Roi) {
    let (inner, outer) = undistorted_rectangles(k, dist, width, height);
    let (wm1, hm1) = (width as Real - 1.0, height as Real - 1.0);

    let fx0 = wm1 / (inner.x1 - inner.x0);
    let fy0 = hm1 / (inner.y1 - inner.y0);
    let cx0 = -fx0 * inner.x0;
    let cy0 = -fy0 * inner.y0;

    let fx1 = wm1 / (outer.x1 - outer.x0);
    let fy1 = hm1 / (outer.y1 - outer.y0);
    let cx1 = -fx1 * outer.x0;
    let cy1 = -fy1 * outer.y0;

    let lerp = |a: Real, b: Real| a * (1.0 - alpha) + b * alpha;
    let k_new = CameraIntrinsics::new(lerp(fx0, fx1), lerp(fy0, fy1), lerp(cx0, cx1), lerp(cy0, cy1));

    let x0 = (k_new.fx * inner.x0 + k_new.cx - ROUNDING_SLACK).ceil().max(0.0);
    let y0 = (k_new.fy * inner.y0 + k_new.cy - ROUNDING_SLACK).ceil().max(0.0);
    let x1 = (k_new.fx * inner.x1 + k_new.cx + ROUNDING_SLACK).floor().min(wm1);
    let y1 = (k_new.fy * inner.y1 + k_new.cy + ROUNDING_SLACK).floor().min(hm1);

    let roi = if x1 >= x0 && y1 >= y0 && x0.is_finite() && y0.is_finite() {
        Roi {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0) as u32 + 1,
            height: (y1 - y0) as u32 + 1,
        }
    } else {
        Roi {
            x: 0,
            y: 0,
            width: 0,
            height: 0,
        }
    };
    (k_new, roi)
}
