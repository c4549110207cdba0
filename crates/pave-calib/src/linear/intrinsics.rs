//! Closed-form focal length initialisation from plane homographies.
//!
//! With the principal point fixed at the image centre and zero skew, every
//! homography `H = K [r1 r2 t]` yields two linear constraints on
//! `(1/fx², 1/fy²)`: `r1 ⟂ r2` and `|r1| = |r2|`, the latter written as
//! `(r1 + r2) ⟂ (r1 - r2)`. A single tilted view therefore suffices.

use nalgebra::{DMatrix, DVector};
use pave_core::{CameraIntrinsics, Mat3, Real};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntrinsicsInitError {
    #[error("no homographies")]
    NoViews,
    #[error("image size must be non-zero, got {0}x{1}")]
    EmptyImage(u32, u32),
    #[error("degenerate view configuration (fronto-parallel boards?)")]
    Degenerate,
}

/// Estimate zero-skew intrinsics for an image of `width x height` pixels.
pub fn init_intrinsics(
    homographies: &[Mat3],
    width: u32,
    height: u32,
) -> Result<CameraIntrinsics, IntrinsicsInitError> {
    if homographies.is_empty() {
        return Err(IntrinsicsInitError::NoViews);
    }
    if width == 0 || height == 0 {
        return Err(IntrinsicsInitError::EmptyImage(width, height));
    }
    let cx = (width as Real - 1.0) * 0.5;
    let cy = (height as Real - 1.0) * 0.5;
    let shift = Mat3::new(1.0, 0.0, -cx, 0.0, 1.0, -cy, 0.0, 0.0, 1.0);

    let m = homographies.len();
    let mut a = DMatrix::<Real>::zeros(2 * m, 2);
    let mut b = DVector::<Real>::zeros(2 * m);

    for (k, h) in homographies.iter().enumerate() {
        let hc = shift * h;
        let h1 = hc.column(0).normalize();
        let h2 = hc.column(1).normalize();
        let d1 = (hc.column(0) + hc.column(1)).normalize();
        let d2 = (hc.column(0) - hc.column(1)).normalize();

        a[(2 * k, 0)] = h1[0] * h2[0];
        a[(2 * k, 1)] = h1[1] * h2[1];
        b[2 * k] = -h1[2] * h2[2];

        a[(2 * k + 1, 0)] = d1[0] * d2[0];
        a[(2 * k + 1, 1)] = d1[1] * d2[1];
        b[2 * k + 1] = -d1[2] * d2[2];
    }

    let f = a
        .svd(true, true)
        .solve(&b, 1e-12)
        .map_err(|_| IntrinsicsInitError::Degenerate)?;

    let fx = (1.0 / f[0]).abs().sqrt();
    let fy = (1.0 / f[1]).abs().sqrt();
    let k = CameraIntrinsics::new(fx, fy, cx, cy);
    if !k.is_invertible() {
        return Err(IntrinsicsInitError::Degenerate);
    }
    Ok(k)
}
