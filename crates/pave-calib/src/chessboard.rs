//! Full-board chessboard detection.

use crate::corners::{assemble_grid, chess_response, find_candidates, CandidateParams, GridParams};
use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_line_segment_mut};
use log::debug;
use pave_core::{BoardGeometry, Pt2, Real};
use serde::{Deserialize, Serialize};

/// Detector tuning.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ChessboardParams {
    pub candidates: CandidateParams,
    /// Neighbours examined when growing the lattice.
    pub k_neighbors: usize,
    /// Relative tolerance on the predicted position of the next corner.
    pub step_tolerance: Real,
    /// Strongest candidates tried as growth seeds.
    pub max_seeds: usize,
}

impl Default for ChessboardParams {
    fn default() -> Self {
        let grid = GridParams::default();
        Self {
            candidates: CandidateParams::default(),
            k_neighbors: grid.k_neighbors,
            step_tolerance: grid.step_tolerance,
            max_seeds: grid.max_seeds,
        }
    }
}

impl ChessboardParams {
    fn grid(&self) -> GridParams {
        GridParams {
            k_neighbors: self.k_neighbors,
            step_tolerance: self.step_tolerance,
            max_seeds: self.max_seeds,
        }
    }
}

/// Finds every interior corner of a known board, or nothing.
#[derive(Clone, Debug, Default)]
pub struct ChessboardDetector {
    pub board: BoardGeometry,
    pub params: ChessboardParams,
}

impl ChessboardDetector {
    pub fn new(board: BoardGeometry, params: ChessboardParams) -> Self {
        Self { board, params }
    }

    /// Pixel-level corners in row-major board order, or `None` unless all
    /// `columns * rows` interior corners are found.
    pub fn detect(&self, gray: &GrayImage) -> Option<Vec<Pt2>> {
        let resp = chess_response(gray);
        let candidates = find_candidates(&resp, &self.params.candidates);
        debug!(
            "{}x{} image: {} corner candidates",
            gray.width(),
            gray.height(),
            candidates.len()
        );

        let points: Vec<Pt2> = candidates.iter().map(|c| c.position).collect();
        assemble_grid(
            &points,
            self.board.columns as usize,
            self.board.rows as usize,
            &self.params.grid(),
        )
    }
}

const ROW_COLORS: [[u8; 3]; 7] = [
    [255, 0, 0],
    [255, 128, 0],
    [200, 200, 0],
    [0, 255, 0],
    [0, 200, 200],
    [0, 0, 255],
    [255, 0, 255],
];

/// Overlay detected corners: a circle per corner, coloured by board row,
/// and a polyline through them in detection order.
pub fn draw_chessboard_corners(canvas: &mut RgbImage, board: &BoardGeometry, corners: &[Pt2]) {
    let cols = board.columns.max(1) as usize;
    let color_of = |idx: usize| Rgb(ROW_COLORS[(idx / cols) % ROW_COLORS.len()]);

    for (idx, pair) in corners.windows(2).enumerate() {
        draw_line_segment_mut(
            canvas,
            (pair[0].x as f32, pair[0].y as f32),
            (pair[1].x as f32, pair[1].y as f32),
            color_of(idx + 1),
        );
    }
    for (idx, p) in corners.iter().enumerate() {
        let center = (p.x.round() as i32, p.y.round() as i32);
        draw_hollow_circle_mut(canvas, center, 4, color_of(idx));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn blank_image_has_no_board() {
        let det = ChessboardDetector::default();
        assert!(det.detect(&GrayImage::from_pixel(320, 240, Luma([128]))).is_none());
    }

    #[test]
    fn params_default_when_fields_missing() {
        let p: ChessboardParams = serde_json::from_str(r#"{"max_seeds": 5}"#).unwrap();
        assert_eq!(p.max_seeds, 5);
        assert_eq!(p.k_neighbors, 8);
        assert_eq!(p.candidates.nms_radius, 3);
    }

    #[test]
    fn drawing_marks_corner_pixels() {
        let mut canvas = RgbImage::new(50, 50);
        let board = BoardGeometry::new(2, 2);
        let corners = [
            Pt2::new(10.0, 10.0),
            Pt2::new(30.0, 10.0),
            Pt2::new(10.0, 30.0),
            Pt2::new(30.0, 30.0),
        ];
        draw_chessboard_corners(&mut canvas, &board, &corners);
        // circle of radius 4 around the first corner
        assert_eq!(canvas.get_pixel(14, 10), &Rgb([255, 0, 0]));
        // second row uses the next colour
        assert_eq!(canvas.get_pixel(34, 30), &Rgb([255, 128, 0]));
        // segment between the first two corners
        assert_ne!(canvas.get_pixel(20, 10), &Rgb([0, 0, 0]));
    }
}
