//! Closed-form initialisation: plane homographies, focal lengths and
//! per-view board poses.

pub mod homography;
pub mod intrinsics;
pub mod planar_pose;

pub use homography::{dlt_homography, normalize_points_2d, HomographyError};
pub use intrinsics::{init_intrinsics, IntrinsicsInitError};
pub use planar_pose::estimate_planar_pose;
