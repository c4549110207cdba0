use nalgebra::{Matrix3, Rotation3, Translation3, UnitQuaternion, Vector3};
use pave_core::{Iso3, Mat3, Real};

/// Estimate the pose of a planar board (`Z = 0`) relative to the camera from
/// intrinsics `K` and the board-to-image homography `H`.
///
/// Returns `cam_from_board`, with the board in front of the camera, or `None`
/// when `K` is singular.
pub fn estimate_planar_pose(kmtx: &Mat3, hmtx: &Mat3) -> Option<Iso3> {
    let k_inv = kmtx.try_inverse()?;

    let k_inv_h1 = k_inv * hmtx.column(0);
    let k_inv_h2 = k_inv * hmtx.column(1);
    let k_inv_h3 = k_inv * hmtx.column(2);

    let scale = 0.5 * (k_inv_h1.norm() + k_inv_h2.norm());
    if scale <= Real::EPSILON {
        return None;
    }
    // H is defined up to sign; pick the one that puts the board at z > 0
    let sign = if k_inv_h3.z < 0.0 { -1.0 } else { 1.0 };
    let lambda = sign / scale;

    let r1 = lambda * k_inv_h1;
    let r2 = lambda * k_inv_h2;
    let r3 = r1.cross(&r2);

    let mut r_mat = Matrix3::<Real>::zeros();
    r_mat.set_column(0, &r1);
    r_mat.set_column(1, &r2);
    r_mat.set_column(2, &r3);

    // nearest rotation (polar decomposition)
    let svd = r_mat.svd(true, true);
    let mut u = svd.u?;
    let v_t = svd.v_t?;
    if (u * v_t).determinant() < 0.0 {
        u.column_mut(2).neg_mut();
    }
    let r_orth = u * v_t;

    let t: Vector3<Real> = lambda * k_inv_h3;
    let rot = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(r_orth));
    Some(Iso3::from_parts(Translation3::from(t), rot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Isometry3;
    use pave_core::CameraIntrinsics;

    fn kmtx() -> Mat3 {
        CameraIntrinsics::new(800.0, 780.0, 640.0, 360.0).k_matrix()
    }

    fn homography_of(k: &Mat3, pose: &Iso3) -> Mat3 {
        let r = pose.rotation.to_rotation_matrix();
        let mut h = Mat3::zeros();
        h.set_column(0, &(k * r.matrix().column(0)));
        h.set_column(1, &(k * r.matrix().column(1)));
        h.set_column(2, &(k * pose.translation.vector));
        h
    }

    fn rotation_angle(a: &Iso3, b: &Iso3) -> Real {
        a.rotation.angle_to(&b.rotation)
    }

    #[test]
    fn recovers_pose() {
        let k = kmtx();
        let rot = Rotation3::from_euler_angles(0.1, -0.05, 0.2);
        let gt = Isometry3::from_parts(Translation3::new(0.1, -0.05, 1.0), rot.into());

        let est = estimate_planar_pose(&k, &homography_of(&k, &gt)).unwrap();
        assert!((est.translation.vector - gt.translation.vector).norm() < 1e-9);
        assert!(rotation_angle(&est, &gt) < 1e-6);
    }

    #[test]
    fn negated_homography_gives_same_pose() {
        let k = kmtx();
        let rot = Rotation3::from_euler_angles(-0.2, 0.15, 0.0);
        let gt = Isometry3::from_parts(Translation3::new(-0.3, 0.2, 2.5), rot.into());

        let h = -homography_of(&k, &gt) * 3.0;
        let est = estimate_planar_pose(&k, &h).unwrap();
        assert!(est.translation.vector.z > 0.0);
        assert!((est.translation.vector - gt.translation.vector).norm() < 1e-9);
        assert!(rotation_angle(&est, &gt) < 1e-6);
    }

    #[test]
    fn singular_k_has_no_pose() {
        assert!(estimate_planar_pose(&Mat3::zeros(), &Mat3::identity()).is_none());
    }
}
