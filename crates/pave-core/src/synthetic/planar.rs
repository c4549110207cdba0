//! Board poses and ideal corner projections.

use crate::{BoardGeometry, Iso3, PinholeCamera, Pt2, Real};
use anyhow::Result;
use nalgebra::{Translation3, UnitQuaternion, Vector3};

/// Pose placing the board centre `distance` units in front of the camera,
/// tilted by `tilt_x` then `tilt_y` radians about the board centre.
pub fn board_facing_camera(
    board: &BoardGeometry,
    distance: Real,
    tilt_x: Real,
    tilt_y: Real,
) -> Iso3 {
    let center = Vector3::new(
        (board.columns as Real - 1.0) * board.square_size / 2.0,
        (board.rows as Real - 1.0) * board.square_size / 2.0,
        0.0,
    );
    let rotation = UnitQuaternion::from_scaled_axis(Vector3::x() * tilt_x)
        * UnitQuaternion::from_scaled_axis(Vector3::y() * tilt_y);
    let translation = Vector3::new(0.0, 0.0, distance) - rotation * center;
    Iso3::from_parts(Translation3::from(translation), rotation)
}

/// Pixel positions of every interior corner, in detection order.
///
/// # Errors
///
/// Fails if any corner lies behind the camera.
pub fn project_board(
    camera: &PinholeCamera,
    cam_from_board: &Iso3,
    board: &BoardGeometry,
) -> Result<Vec<Pt2>> {
    board
        .object_points()
        .iter()
        .enumerate()
        .map(|(idx, p)| {
            camera
                .project_with_pose(cam_from_board, p)
                .ok_or_else(|| anyhow::anyhow!("corner {idx} not projectable"))
        })
        .collect()
}
