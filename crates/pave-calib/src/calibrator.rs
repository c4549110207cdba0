//! Chessboard images in, [`CalibrationResult`] out.

use crate::chessboard::{ChessboardDetector, ChessboardParams};
use crate::corners::subpix::{refine_corners, SubPixCriteria};
use crate::linear::{
    dlt_homography, estimate_planar_pose, init_intrinsics, HomographyError, IntrinsicsInitError,
};
use crate::optim::{
    refine_planar_intrinsics, IntrinsicsMask, LmBackend, PlanarIntrinsicsProblem, SolveOptions,
};
use image::{imageops, GrayImage, RgbImage};
use log::{debug, info, warn};
use pave_core::{
    BoardGeometry, BrownConrady5, CalibrationResult, CorrespondenceView, Mat3, PinholeCamera, Pt2,
    Real,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalibrateError {
    #[error("no calibration images")]
    NoImages,
    #[error("no chessboard found in any of {0} calibration images")]
    NoDetections(usize),
    #[error("homography for view {view}: {source}")]
    Homography {
        view: usize,
        #[source]
        source: HomographyError,
    },
    #[error("intrinsics initialisation: {0}")]
    Intrinsics(#[from] IntrinsicsInitError),
    #[error("non-linear refinement did not produce a usable camera (rms {rms})")]
    Solve { rms: Real },
}

impl CalibrateError {
    /// No usable calibration input: the caller should fall back to the
    /// synthetic model.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::NoImages | Self::NoDetections(_))
    }
}

/// Everything the calibrator can be tuned with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibratorOptions {
    pub board: BoardGeometry,
    pub detector: ChessboardParams,
    pub subpix: SubPixCriteria,
    /// Keep the sixth-order radial term at zero.
    pub fix_k3: bool,
    /// Keep both tangential terms at zero.
    pub fix_tangential: bool,
    pub solve: SolveOptions,
}

impl Default for CalibratorOptions {
    fn default() -> Self {
        Self {
            board: BoardGeometry::default(),
            detector: ChessboardParams::default(),
            subpix: SubPixCriteria::default(),
            fix_k3: true,
            fix_tangential: false,
            solve: SolveOptions::default(),
        }
    }
}

/// A calibration image whose board was found.
#[derive(Debug, Clone)]
pub struct DetectedView {
    /// Position in the input sequence.
    pub index: usize,
    pub width: u32,
    pub height: u32,
    pub view: CorrespondenceView,
}

/// Detections of a calibration run and what was solved from them.
#[derive(Debug)]
pub struct CalibrationRun {
    pub views: Vec<DetectedView>,
    pub result: Result<CalibrationResult, CalibrateError>,
}

#[derive(Debug, Clone, Default)]
pub struct Calibrator {
    pub options: CalibratorOptions,
}

impl Calibrator {
    pub fn new(options: CalibratorOptions) -> Self {
        Self { options }
    }

    /// Calibrate from `images`, or `None` when no calibration can be made.
    pub fn calibrate(&self, images: &[RgbImage]) -> Option<CalibrationResult> {
        match self.try_calibrate(images) {
            Ok(result) => Some(result),
            Err(e) if e.is_unavailable() => {
                info!("calibration unavailable: {e}");
                None
            }
            Err(e) => {
                warn!("calibration failed: {e}");
                None
            }
        }
    }

    pub fn try_calibrate(&self, images: &[RgbImage]) -> Result<CalibrationResult, CalibrateError> {
        self.run(images).result
    }

    /// Detect the board in every image, then solve from the detections.
    ///
    /// The detections are kept alongside the outcome, also when the solve
    /// fails.
    pub fn run(&self, images: &[RgbImage]) -> CalibrationRun {
        if images.is_empty() {
            return CalibrationRun {
                views: Vec::new(),
                result: Err(CalibrateError::NoImages),
            };
        }
        let views = self.detect_views(images);
        info!(
            "chessboard found in {} of {} calibration images",
            views.len(),
            images.len()
        );
        let result = if views.is_empty() {
            Err(CalibrateError::NoDetections(images.len()))
        } else {
            self.calibrate_views(&views)
        };
        CalibrationRun { views, result }
    }

    /// Refined board corners of one image, in row-major board order.
    pub fn detect_corners(&self, image: &RgbImage) -> Option<Vec<Pt2>> {
        let gray: GrayImage = imageops::grayscale(image);
        let mut corners = ChessboardDetector::new(self.options.board, self.options.detector.clone())
            .detect(&gray)?;
        refine_corners(&gray, &mut corners, &self.options.subpix);
        Some(corners)
    }

    /// Detection results for every image where the full board was found.
    pub fn detect_views(&self, images: &[RgbImage]) -> Vec<DetectedView> {
        images
            .iter()
            .enumerate()
            .filter_map(|(index, image)| {
                let Some(corners) = self.detect_corners(image) else {
                    debug!("calibration image {index}: no chessboard");
                    return None;
                };
                let view = CorrespondenceView::from_board(&self.options.board, corners).ok()?;
                debug!("calibration image {index}: {} corners", view.len());
                Some(DetectedView {
                    index,
                    width: image.width(),
                    height: image.height(),
                    view,
                })
            })
            .collect()
    }

    /// Solve for intrinsics, distortion and one pose per view.
    ///
    /// The image size is taken from the first view.
    pub fn calibrate_views(&self, views: &[DetectedView]) -> Result<CalibrationResult, CalibrateError> {
        let first = views.first().ok_or(CalibrateError::NoDetections(0))?;
        let (width, height) = (first.width, first.height);

        let homographies = views
            .iter()
            .map(|v| {
                dlt_homography(&v.view.planar_points(), &v.view.points_2d).map_err(|source| {
                    CalibrateError::Homography {
                        view: v.index,
                        source,
                    }
                })
            })
            .collect::<Result<Vec<Mat3>, _>>()?;

        let k0 = init_intrinsics(&homographies, width, height)?;
        let kmtx = k0.k_matrix();
        let poses = homographies
            .iter()
            .map(|h| estimate_planar_pose(&kmtx, h).ok_or(IntrinsicsInitError::Degenerate))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            "initial intrinsics fx={:.2} fy={:.2} cx={:.2} cy={:.2}",
            k0.fx, k0.fy, k0.cx, k0.cy
        );

        let mask = IntrinsicsMask {
            fix_k3: self.options.fix_k3,
            fix_tangential: self.options.fix_tangential,
        };
        let problem = PlanarIntrinsicsProblem::new(
            views.iter().map(|v| v.view.clone()).collect(),
            mask,
            BrownConrady5::default(),
        );
        let init = PinholeCamera::new(k0, BrownConrady5::default());
        let est = refine_planar_intrinsics(&LmBackend, &problem, &init, &poses, &self.options.solve);
        debug!(
            "refinement: {} evaluations, cost {:.3e}, converged {}",
            est.report.evaluations, est.report.final_cost, est.report.converged
        );

        if !est.rms_error.is_finite() || !est.camera.k.is_invertible() {
            return Err(CalibrateError::Solve { rms: est.rms_error });
        }
        info!(
            "calibrated from {} views: fx={:.2} fy={:.2} cx={:.2} cy={:.2}, rms {:.4} px",
            views.len(),
            est.camera.k.fx,
            est.camera.k.fy,
            est.camera.k.cx,
            est.camera.k.cy,
            est.rms_error
        );

        Ok(CalibrationResult {
            reprojection_error: est.rms_error,
            camera: est.camera,
            poses: est.poses,
            image_size: [width, height],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_unavailable() {
        let cal = Calibrator::default();
        assert!(cal.calibrate(&[]).is_none());
        let err = cal.try_calibrate(&[]).unwrap_err();
        assert!(err.is_unavailable());
    }

    #[test]
    fn blank_images_are_unavailable() {
        let cal = Calibrator::default();
        let images = vec![RgbImage::from_pixel(160, 120, image::Rgb([90, 90, 90])); 3];
        match cal.try_calibrate(&images) {
            Err(CalibrateError::NoDetections(3)) => {}
            other => panic!("unexpected {other:?}"),
        }
        assert!(cal.calibrate(&images).is_none());

        let run = cal.run(&images);
        assert!(run.views.is_empty());
        assert!(run.result.unwrap_err().is_unavailable());
    }

    #[test]
    fn solve_errors_are_not_unavailable() {
        assert!(!CalibrateError::Solve { rms: Real::NAN }.is_unavailable());
        assert!(!CalibrateError::Intrinsics(IntrinsicsInitError::NoViews).is_unavailable());
    }

    #[test]
    fn options_round_trip_through_json() {
        let opts = CalibratorOptions::default();
        let json = serde_json::to_string(&opts).unwrap();
        let back: CalibratorOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back.board, opts.board);
        assert!(back.fix_k3);
        let partial: CalibratorOptions = serde_json::from_str(r#"{"fix_k3": false}"#).unwrap();
        assert!(!partial.fix_k3);
        assert_eq!(partial.board.columns, 9);
    }
}
