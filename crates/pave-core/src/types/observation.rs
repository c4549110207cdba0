//! Observation types for calibration data.

use crate::{BoardGeometry, Pt2, Pt3};
use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// One calibration image's correspondences: the board's object points
/// paired with the detected, refined pixel positions of the same corners.
///
/// Each view owns its own copy of the board grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrespondenceView {
    /// 3D points in the board frame (z = 0).
    pub points_3d: Vec<Pt3>,
    /// Corresponding 2D pixel observations.
    pub points_2d: Vec<Pt2>,
}

impl CorrespondenceView {
    /// # Errors
    ///
    /// Returns an error if the 3D and 2D point counts don't match.
    pub fn new(points_3d: Vec<Pt3>, points_2d: Vec<Pt2>) -> Result<Self> {
        ensure!(
            points_3d.len() == points_2d.len(),
            "3D / 2D point counts must match: {} vs {}",
            points_3d.len(),
            points_2d.len()
        );
        Ok(Self {
            points_3d,
            points_2d,
        })
    }

    /// Pair a full-board detection with the board grid.
    ///
    /// # Errors
    ///
    /// Returns an error unless `corners` holds exactly `columns * rows` points.
    pub fn from_board(board: &BoardGeometry, corners: Vec<Pt2>) -> Result<Self> {
        ensure!(
            corners.len() == board.corner_count(),
            "expected {} corners for a {}x{} board, got {}",
            board.corner_count(),
            board.columns,
            board.rows,
            corners.len()
        );
        Self::new(board.object_points(), corners)
    }

    pub fn planar_points(&self) -> Vec<Pt2> {
        self.points_3d
            .iter()
            .map(|p3| Pt2::new(p3.x, p3.y))
            .collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points_3d.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points_3d.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatched_counts_rejected() {
        let err = CorrespondenceView::new(vec![Pt3::origin()], vec![]).unwrap_err();
        assert!(err.to_string().contains("must match"));
    }

    #[test]
    fn from_board_requires_full_grid() {
        let board = BoardGeometry::new(3, 2);
        assert!(CorrespondenceView::from_board(&board, vec![Pt2::origin(); 5]).is_err());

        let view = CorrespondenceView::from_board(&board, vec![Pt2::origin(); 6]).unwrap();
        assert_eq!(view.len(), 6);
        assert_eq!(view.planar_points()[4], Pt2::new(1.0, 1.0));
    }
}
