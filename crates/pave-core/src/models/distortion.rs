use crate::{Real, Vec2};
use serde::{Deserialize, Serialize};

/// Lens distortion acting on normalized image-plane coordinates.
pub trait DistortionModel {
    /// Map ideal (undistorted) coordinates to where the lens images them.
    fn distort(&self, n_undist: &Vec2) -> Vec2;
    /// Invert [`DistortionModel::distort`].
    fn undistort(&self, n_dist: &Vec2) -> Vec2;
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct NoDistortion;

impl DistortionModel for NoDistortion {
    fn distort(&self, n_undist: &Vec2) -> Vec2 {
        *n_undist
    }

    fn undistort(&self, n_dist: &Vec2) -> Vec2 {
        *n_dist
    }
}

/// Brown-Conrady radial (k1, k2, k3) + tangential (p1, p2) distortion.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BrownConrady5 {
    pub k1: Real,
    pub k2: Real,
    pub k3: Real,
    pub p1: Real,
    pub p2: Real,
    /// Fixed-point iterations used by [`DistortionModel::undistort`].
    #[serde(default = "default_undistort_iters")]
    pub iters: u32,
}

fn default_undistort_iters() -> u32 {
    20
}

impl Default for BrownConrady5 {
    fn default() -> Self {
        Self {
            k1: 0.0,
            k2: 0.0,
            k3: 0.0,
            p1: 0.0,
            p2: 0.0,
            iters: default_undistort_iters(),
        }
    }
}

impl BrownConrady5 {
    /// Pure radial model with only `k1` set.
    pub fn radial_k1(k1: Real) -> Self {
        Self {
            k1,
            ..Self::default()
        }
    }

    /// Coefficients in OpenCV order `[k1, k2, p1, p2, k3]`.
    pub fn coefficients(&self) -> [Real; 5] {
        [self.k1, self.k2, self.p1, self.p2, self.k3]
    }

    pub fn is_zero(&self) -> bool {
        self.coefficients().iter().all(|c| *c == 0.0)
    }

    fn radial_factor(&self, r2: Real) -> Real {
        1.0 + r2 * (self.k1 + r2 * (self.k2 + r2 * self.k3))
    }

    fn tangential(&self, x: Real, y: Real, r2: Real) -> (Real, Real) {
        let xy = x * y;
        (
            2.0 * self.p1 * xy + self.p2 * (r2 + 2.0 * x * x),
            self.p1 * (r2 + 2.0 * y * y) + 2.0 * self.p2 * xy,
        )
    }
}

impl DistortionModel for BrownConrady5 {
    fn distort(&self, n_undist: &Vec2) -> Vec2 {
        let (x, y) = (n_undist.x, n_undist.y);
        let r2 = x * x + y * y;
        let radial = self.radial_factor(r2);
        let (dx, dy) = self.tangential(x, y, r2);
        Vec2::new(x * radial + dx, y * radial + dy)
    }

    fn undistort(&self, n_dist: &Vec2) -> Vec2 {
        let (x0, y0) = (n_dist.x, n_dist.y);
        let (mut x, mut y) = (x0, y0);

        let iters = if self.iters == 0 { 8 } else { self.iters };
        for _ in 0..iters {
            let r2 = x * x + y * y;
            let radial = self.radial_factor(r2);
            if radial <= 0.0 {
                // Past the fold of the polynomial; no meaningful inverse.
                return Vec2::new(x0, y0);
            }
            let (dx, dy) = self.tangential(x, y, r2);
            x = (x0 - dx) / radial;
            y = (y0 - dy) / radial;
        }
        Vec2::new(x, y)
    }
}
