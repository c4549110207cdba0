//! Camera models handed from the calibrator to the rectifier.

use crate::{BrownConrady5, CameraIntrinsics, Iso3, Mat3, PinholeCamera, Real};
use serde::{Deserialize, Serialize};

/// Outcome of a successful calibration run.
///
/// Built once per run and only read afterwards: every rectification in the
/// run shares the same intrinsics and distortion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationResult {
    /// RMS reprojection error over all corners, in pixels.
    pub reprojection_error: Real,
    /// Intrinsics (zero skew) and distortion coefficients.
    pub camera: PinholeCamera,
    /// Board-to-camera pose of every calibration image that yielded a detection.
    pub poses: Vec<Iso3>,
    /// `[width, height]` of the calibration images.
    pub image_size: [u32; 2],
}

impl CalibrationResult {
    pub fn intrinsics(&self) -> &CameraIntrinsics {
        &self.camera.k
    }

    pub fn distortion(&self) -> &BrownConrady5 {
        &self.camera.dist
    }

    pub fn camera_matrix(&self) -> Mat3 {
        self.camera.k.k_matrix()
    }

    /// Number of correspondence pairs the solve used.
    pub fn num_views(&self) -> usize {
        self.poses.len()
    }
}

/// Fixed lens model used when calibration is deliberately skipped.
///
/// Focal lengths are tiny on purpose: with pixel offsets of hundreds, the
/// normalized radius becomes large enough for `k1` to produce a visible
/// barrel correction. Only the principal point depends on the image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyntheticDistortionModel {
    pub fx: Real,
    pub fy: Real,
    /// Radial coefficient; negative removes barrel distortion.
    pub k1: Real,
}

impl Default for SyntheticDistortionModel {
    fn default() -> Self {
        Self {
            fx: 3.1,
            fy: 4.0,
            k1: -1.0e-5,
        }
    }
}

impl SyntheticDistortionModel {
    /// Camera for an image of `width x height` pixels, principal point at the centre.
    pub fn camera_for(&self, width: u32, height: u32) -> PinholeCamera {
        PinholeCamera::new(
            CameraIntrinsics::new(
                self.fx,
                self.fy,
                width as Real / 2.0,
                height as Real / 2.0,
            ),
            BrownConrady5::radial_k1(self.k1),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_model_defaults() {
        let cam = SyntheticDistortionModel::default().camera_for(640, 480);
        assert_eq!(cam.k.fx, 3.1);
        assert_eq!(cam.k.fy, 4.0);
        assert_eq!((cam.k.cx, cam.k.cy), (320.0, 240.0));
        assert_eq!(cam.dist.coefficients(), [-1.0e-5, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn result_serialization() {
        let result = CalibrationResult {
            reprojection_error: 0.25,
            camera: PinholeCamera::new(
                CameraIntrinsics::new(800.0, 790.0, 320.0, 240.0),
                BrownConrady5::radial_k1(-0.1),
            ),
            poses: vec![Iso3::identity(); 2],
            image_size: [640, 480],
        };

        let json = serde_json::to_string(&result).unwrap();
        let restored: CalibrationResult = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.num_views(), 2);
        assert_eq!(restored.camera, result.camera);
        assert_eq!(restored.camera_matrix()[(0, 0)], 800.0);
    }
}
