use super::{BrownConrady5, CameraIntrinsics, DistortionModel};
use crate::{Iso3, Pt2, Pt3, Vec2};
use serde::{Deserialize, Serialize};

/// Pinhole camera with Brown-Conrady distortion.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PinholeCamera {
    pub k: CameraIntrinsics,
    pub dist: BrownConrady5,
}

impl PinholeCamera {
    pub fn new(k: CameraIntrinsics, dist: BrownConrady5) -> Self {
        Self { k, dist }
    }

    /// Project a point given in the camera frame. `None` behind the camera.
    pub fn project_point(&self, p_c: &Pt3) -> Option<Pt2> {
        if p_c.z <= 0.0 {
            return None;
        }
        let n_u = Vec2::new(p_c.x / p_c.z, p_c.y / p_c.z);
        let n_d = self.dist.distort(&n_u);
        Some(self.k.to_pixel(&n_d))
    }

    /// Project a target-frame point through `cam_from_target`.
    pub fn project_with_pose(&self, cam_from_target: &Iso3, p_t: &Pt3) -> Option<Pt2> {
        self.project_point(&cam_from_target.transform_point(p_t))
    }

    /// Undistorted normalized coordinates of a pixel.
    pub fn pixel_to_normalized(&self, px: &Pt2) -> Vec2 {
        self.dist.undistort(&self.k.from_pixel(px))
    }
}
