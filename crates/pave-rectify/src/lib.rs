//! Lens-distortion correction for single images.
//!
//! A [`Rectifier`] takes one image and the run's calibration decision and
//! returns the image unchanged, undistorted with the real calibration and
//! cropped to its valid region, or undistorted with the fixed
//! [`pave_core::SyntheticDistortionModel`] at full frame.

pub mod optimal;
pub mod rectifier;
pub mod remap;

pub use optimal::{optimal_new_camera_matrix, Roi};
pub use rectifier::{Rectifier, RectifierOptions, RectifyMode};
pub use remap::UndistortMap;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RectifyError {
    #[error("image has no pixels")]
    EmptyImage,
    #[error("undistorted image has no valid region")]
    EmptyValidRegion,
    #[error("new camera matrix is not invertible")]
    SingularCameraMatrix,
}
