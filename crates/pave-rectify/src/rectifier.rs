use crate::optimal::optimal_new_camera_matrix;
use crate::remap::UndistortMap;
use crate::RectifyError;
use image::{imageops, RgbImage};
use log::debug;
use pave_core::{CalibrationResult, Real, SyntheticDistortionModel};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RectifierOptions {
    /// Free scaling for the calibrated path: 0 crops to valid pixels only,
    /// 1 keeps every source pixel.
    pub alpha: Real,
    /// Lens model used when calibration is requested but unavailable.
    pub synthetic: SyntheticDistortionModel,
}

impl Default for RectifierOptions {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            synthetic: SyntheticDistortionModel::default(),
        }
    }
}

/// Which of the three rectification paths an image takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RectifyMode {
    /// Output equals input.
    PassThrough,
    /// Real calibration, cropped to the valid region.
    Calibrated,
    /// Fixed synthetic lens model, full frame.
    Synthetic,
}

impl RectifyMode {
    pub fn select(use_calibration: bool, has_calibration: bool) -> Self {
        match (use_calibration, has_calibration) {
            (false, _) => Self::PassThrough,
            (true, true) => Self::Calibrated,
            (true, false) => Self::Synthetic,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Rectifier {
    pub options: RectifierOptions,
}

impl Rectifier {
    pub fn new(options: RectifierOptions) -> Self {
        Self { options }
    }

    /// Undistort `image` according to [`RectifyMode::select`].
    ///
    /// Pass-through and synthetic outputs keep the input dimensions; the
    /// calibrated output is cropped to the valid region and may be smaller.
    pub fn rectify(
        &self,
        image: &RgbImage,
        calibration: Option<&CalibrationResult>,
        use_calibration: bool,
    ) -> Result<RgbImage, RectifyError> {
        match (RectifyMode::select(use_calibration, calibration.is_some()), calibration) {
            (RectifyMode::Calibrated, Some(cal)) => self.rectify_calibrated(image, cal),
            (RectifyMode::Synthetic, _) => self.rectify_synthetic(image),
            _ => Ok(image.clone()),
        }
    }

    pub fn rectify_calibrated(
        &self,
        image: &RgbImage,
        calibration: &CalibrationResult,
    ) -> Result<RgbImage, RectifyError> {
        let (w, h) = image.dimensions();
        if w == 0 || h == 0 {
            return Err(RectifyError::EmptyImage);
        }
        let cam = &calibration.camera;
        let (k_new, roi) = optimal_new_camera_matrix(&cam.k, &cam.dist, w, h, self.options.alpha);
        if roi.is_empty() {
            return Err(RectifyError::EmptyValidRegion);
        }
        debug!(
            "{w}x{h}: new camera fx={:.2} fy={:.2} cx={:.2} cy={:.2}, valid {}x{}+{}+{}",
            k_new.fx, k_new.fy, k_new.cx, k_new.cy, roi.width, roi.height, roi.x, roi.y
        );

        let undistorted = UndistortMap::new(&cam.k, &cam.dist, &k_new, w, h)?.remap(image);
        Ok(imageops::crop_imm(&undistorted, roi.x, roi.y, roi.width, roi.height).to_image())
    }

    pub fn rectify_synthetic(&self, image: &RgbImage) -> Result<RgbImage, RectifyError> {
        let (w, h) = image.dimensions();
        if w == 0 || h == 0 {
            return Err(RectifyError::EmptyImage);
        }
        let cam = self.options.synthetic.camera_for(w, h);
        Ok(UndistortMap::new(&cam.k, &cam.dist, &cam.k, w, h)?.remap(image))
    }
}
