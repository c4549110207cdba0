//! Core math and geometry primitives for the pavement rectification tools.
//!
//! This crate contains:
//! - linear algebra type aliases (`Real`, `Vec2`, `Pt3`, ...),
//! - the pinhole camera model with Brown-Conrady distortion,
//! - the calibration board layout and per-image correspondences,
//! - the [`CalibrationResult`] shared by the calibrator and the rectifier,
//! - the fixed [`SyntheticDistortionModel`] used when calibration is skipped.
//!
//! Camera pipeline:
//! `pixel = K ∘ distortion ∘ projection(point_c)`

/// Board layout and object-space grids.
pub mod board;
/// Output of a calibration run.
pub mod calibration;
/// Linear algebra type aliases and helpers.
pub mod math;
/// Camera models and distortion utilities.
pub mod models;
/// Synthetic scenes for tests and demos.
pub mod synthetic;
/// Canonical 2D-3D correspondence container.
pub mod types;

pub use board::*;
pub use calibration::*;
pub use math::*;
pub use models::*;
pub use types::*;
