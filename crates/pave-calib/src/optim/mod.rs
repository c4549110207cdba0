//! Non-linear refinement of the closed-form calibration.

pub mod backend_lm;
pub mod planar_intrinsics;
pub mod traits;

pub use backend_lm::LmBackend;
pub use planar_intrinsics::{
    refine_planar_intrinsics, IntrinsicsMask, PlanarIntrinsicsEstimate, PlanarIntrinsicsProblem,
};
pub use traits::{NllsProblem, NllsSolverBackend, SolveOptions, SolveReport};
