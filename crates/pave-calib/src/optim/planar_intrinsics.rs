use super::{NllsProblem, NllsSolverBackend, SolveOptions, SolveReport};
use nalgebra::{DVector, UnitQuaternion, Vector3};
use pave_core::{BrownConrady5, CameraIntrinsics, CorrespondenceView, Iso3, PinholeCamera, Real};

/// Residual assigned to a point that falls behind the camera.
const BEHIND_CAMERA_PENALTY: Real = 1e3;

/// Which distortion terms are optimised; fixed terms keep their initial value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntrinsicsMask {
    pub fix_k3: bool,
    pub fix_tangential: bool,
}

impl IntrinsicsMask {
    /// Parameters ahead of the per-view poses: `fx fy cx cy k1 k2 [p1 p2] [k3]`.
    pub fn dim(&self) -> usize {
        6 + if self.fix_tangential { 0 } else { 2 } + if self.fix_k3 { 0 } else { 1 }
    }
}

/// Joint refinement of zero-skew intrinsics, Brown-Conrady distortion and
/// one board pose per view.
#[derive(Debug, Clone)]
pub struct PlanarIntrinsicsProblem {
    views: Vec<CorrespondenceView>,
    mask: IntrinsicsMask,
    /// Source of the values of fixed distortion terms.
    fixed: BrownConrady5,
}

impl PlanarIntrinsicsProblem {
    pub fn new(views: Vec<CorrespondenceView>, mask: IntrinsicsMask, fixed: BrownConrady5) -> Self {
        Self { views, mask, fixed }
    }

    pub fn num_views(&self) -> usize {
        self.views.len()
    }

    /// Total number of observed points across all views.
    pub fn num_points(&self) -> usize {
        self.views.iter().map(CorrespondenceView::len).sum()
    }

    pub fn pack(&self, camera: &PinholeCamera, poses: &[Iso3]) -> DVector<Real> {
        let base = self.mask.dim();
        let mut x = DVector::zeros(base + 6 * poses.len());

        let (k, d) = (&camera.k, &camera.dist);
        let mut head = vec![k.fx, k.fy, k.cx, k.cy, d.k1, d.k2];
        if !self.mask.fix_tangential {
            head.extend([d.p1, d.p2]);
        }
        if !self.mask.fix_k3 {
            head.push(d.k3);
        }
        for (i, v) in head.into_iter().enumerate() {
            x[i] = v;
        }

        for (i, pose) in poses.iter().enumerate() {
            let idx = base + 6 * i;
            let w = pose.rotation.scaled_axis();
            let t = pose.translation.vector;
            x.rows_mut(idx, 6)
                .copy_from_slice(&[w.x, w.y, w.z, t.x, t.y, t.z]);
        }
        x
    }

    pub fn unpack(&self, x: &DVector<Real>) -> (PinholeCamera, Vec<Iso3>) {
        let mut it = x.iter().copied();
        let mut next = || it.next().unwrap_or(0.0);

        let k = CameraIntrinsics::new(next(), next(), next(), next());
        let mut dist = self.fixed;
        dist.k1 = next();
        dist.k2 = next();
        if !self.mask.fix_tangential {
            dist.p1 = next();
            dist.p2 = next();
        }
        if !self.mask.fix_k3 {
            dist.k3 = next();
        }

        let base = self.mask.dim();
        let poses = (0..self.num_views())
            .map(|i| {
                let p = x.rows(base + 6 * i, 6);
                let rot = UnitQuaternion::from_scaled_axis(Vector3::new(p[0], p[1], p[2]));
                Iso3::from_parts(Vector3::new(p[3], p[4], p[5]).into(), rot)
            })
            .collect();

        (PinholeCamera::new(k, dist), poses)
    }
}

impl NllsProblem for PlanarIntrinsicsProblem {
    fn num_params(&self) -> usize {
        self.mask.dim() + 6 * self.num_views()
    }

    fn num_residuals(&self) -> usize {
        2 * self.num_points()
    }

    fn residuals(&self, x: &DVector<Real>) -> DVector<Real> {
        let (camera, poses) = self.unpack(x);
        let mut r = DVector::zeros(self.num_residuals());
        let mut row = 0;
        for (view, pose) in self.views.iter().zip(&poses) {
            for (pw, meas) in view.points_3d.iter().zip(&view.points_2d) {
                match camera.project_with_pose(pose, pw) {
                    Some(proj) => {
                        r[row] = proj.x - meas.x;
                        r[row + 1] = proj.y - meas.y;
                    }
                    None => {
                        r[row] = BEHIND_CAMERA_PENALTY;
                        r[row + 1] = BEHIND_CAMERA_PENALTY;
                    }
                }
                row += 2;
            }
        }
        r
    }
}

/// Refined calibration and its quality.
#[derive(Debug, Clone)]
pub struct PlanarIntrinsicsEstimate {
    pub camera: PinholeCamera,
    pub poses: Vec<Iso3>,
    /// Root mean square pixel distance over all points.
    pub rms_error: Real,
    pub report: SolveReport,
}

/// Refine `camera` and `poses` against the observations in `problem`.
pub fn refine_planar_intrinsics<B: NllsSolverBackend>(
    backend: &B,
    problem: &PlanarIntrinsicsProblem,
    camera: &PinholeCamera,
    poses: &[Iso3],
    opts: &SolveOptions,
) -> PlanarIntrinsicsEstimate {
    let x0 = problem.pack(camera, poses);
    let (x, report) = backend.solve(problem, x0, opts);
    let rms_error = rms_reprojection_error(problem, &x);
    let (camera, poses) = problem.unpack(&x);
    PlanarIntrinsicsEstimate {
        camera,
        poses,
        rms_error,
        report,
    }
}

fn rms_reprojection_error(problem: &PlanarIntrinsicsProblem, x: &DVector<Real>) -> Real {
    let n = problem.num_points();
    if n == 0 {
        return 0.0;
    }
    (problem.residuals(x).norm_squared() / n as Real).sqrt()
}
