//! Synthetic chessboard scenes.
//!
//! Used by the workspace test suites to exercise detection, calibration and
//! rectification on images whose ground truth is known exactly.

pub mod planar;
pub mod render;
