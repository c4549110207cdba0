//! Camera model building blocks.
//!
//! The pinhole pipeline is split in two stages:
//!
//! 1. `DistortionModel`: radial/tangential distortion in normalized space.
//! 2. `CameraIntrinsics`: map normalized coordinates to pixels (K matrix).
//!
//! [`PinholeCamera`] composes both with a perspective division:
//! `pixel = K(distort(x / z, y / z))`.

mod camera;
mod distortion;
mod intrinsics;

pub use camera::*;
pub use distortion::*;
pub use intrinsics::*;
