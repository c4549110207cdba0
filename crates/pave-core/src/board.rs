//! Chessboard layout shared by detection and calibration.

use crate::{Pt2, Pt3, Real};
use serde::{Deserialize, Serialize};

/// Interior-corner grid of a planar chessboard.
///
/// Object points lie on the `Z = 0` plane of the board frame, `square_size`
/// apart, in row-major order: column index `i` varies fastest.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoardGeometry {
    /// Interior corners along the board's long axis.
    pub columns: u32,
    /// Interior corners along the board's short axis.
    pub rows: u32,
    /// Spacing between neighbouring corners in board units.
    #[serde(default = "default_square_size")]
    pub square_size: Real,
}

fn default_square_size() -> Real {
    1.0
}

impl Default for BoardGeometry {
    fn default() -> Self {
        Self {
            columns: 9,
            rows: 6,
            square_size: default_square_size(),
        }
    }
}

impl BoardGeometry {
    pub fn new(columns: u32, rows: u32) -> Self {
        Self {
            columns,
            rows,
            square_size: default_square_size(),
        }
    }

    /// Number of interior corners, `columns * rows`.
    pub fn corner_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    /// Grid index `(i, j)` of the corner at position `idx` in detection order.
    pub fn grid_index(&self, idx: usize) -> (u32, u32) {
        let cols = self.columns as usize;
        ((idx % cols) as u32, (idx / cols) as u32)
    }

    /// Board-frame 3D points (z = 0) in detection order.
    pub fn object_points(&self) -> Vec<Pt3> {
        self.planar_points()
            .into_iter()
            .map(|p| Pt3::new(p.x, p.y, 0.0))
            .collect()
    }

    /// Board-plane 2D points in detection order.
    pub fn planar_points(&self) -> Vec<Pt2> {
        let mut points = Vec::with_capacity(self.corner_count());
        for j in 0..self.rows {
            for i in 0..self.columns {
                points.push(Pt2::new(
                    i as Real * self.square_size,
                    j as Real * self.square_size,
                ));
            }
        }
        points
    }
}
