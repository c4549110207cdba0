//! Camera calibration from chessboard photographs.
//!
//! The [`Calibrator`] turns a set of calibration images into a
//! [`pave_core::CalibrationResult`]:
//!
//! 1. luminance conversion and ChESS corner detection ([`corners`]),
//! 2. lattice assembly into an ordered `columns x rows` grid ([`chessboard`]),
//! 3. sub-pixel refinement ([`corners::subpix`]),
//! 4. closed-form initialisation: homographies, focal lengths, poses ([`linear`]),
//! 5. joint Levenberg-Marquardt refinement of intrinsics, distortion and poses ([`optim`]).
//!
//! Images without a complete board are skipped. A run with no usable image
//! yields no calibration rather than an error the caller must unwind.

pub mod calibrator;
pub mod chessboard;
pub mod corners;
pub mod linear;
pub mod optim;

pub use calibrator::{CalibrateError, CalibrationRun, Calibrator, CalibratorOptions, DetectedView};
pub use chessboard::{draw_chessboard_corners, ChessboardDetector, ChessboardParams};
pub use corners::subpix::{refine_corners, SubPixCriteria};
