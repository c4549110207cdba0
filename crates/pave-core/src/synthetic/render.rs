//! Ray-traced chessboard images.

use crate::{BoardGeometry, Iso3, PinholeCamera, Pt2, Pt3, Real, Vec3};
use image::{Rgb, RgbImage};

/// Appearance of a rendered board.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Width of the white border around the squares, in squares.
    pub margin_squares: Real,
    pub dark: u8,
    pub light: u8,
    /// Colour of everything outside the board.
    pub background: u8,
    /// Samples per pixel along each axis.
    pub supersample: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            margin_squares: 0.75,
            dark: 20,
            light: 235,
            background: 110,
            supersample: 3,
        }
    }
}

/// Render `board` seen by `camera` from `cam_from_board`.
///
/// The board has `columns + 1` by `rows + 1` squares so that its interior
/// corners sit on the object grid. Every pixel is traced back through the
/// lens model, so the image carries the camera's distortion.
pub fn render_chessboard(
    camera: &PinholeCamera,
    cam_from_board: &Iso3,
    board: &BoardGeometry,
    width: u32,
    height: u32,
    opts: &RenderOptions,
) -> RgbImage {
    let board_from_cam = cam_from_board.inverse();
    let origin = board_from_cam.transform_point(&Pt3::origin());
    let ss = opts.supersample.max(1);
    let step = 1.0 / ss as Real;

    RgbImage::from_fn(width, height, |u, v| {
        let mut acc = 0.0;
        for sy in 0..ss {
            for sx in 0..ss {
                let px = Pt2::new(
                    u as Real - 0.5 + step * (sx as Real + 0.5),
                    v as Real - 0.5 + step * (sy as Real + 0.5),
                );
                let n = camera.pixel_to_normalized(&px);
                let dir = board_from_cam.transform_vector(&Vec3::new(n.x, n.y, 1.0));
                acc += shade(board, opts, &origin, &dir);
            }
        }
        let value = (acc / (ss * ss) as Real).round().clamp(0.0, 255.0) as u8;
        Rgb([value, value, value])
    })
}

fn shade(board: &BoardGeometry, opts: &RenderOptions, origin: &Pt3, dir: &Vec3) -> Real {
    if dir.z.abs() < 1e-12 {
        return opts.background as Real;
    }
    let t = -origin.z / dir.z;
    if t <= 0.0 {
        return opts.background as Real;
    }
    let s = board.square_size;
    let x = (origin.x + t * dir.x) / s;
    let y = (origin.y + t * dir.y) / s;

    let cols = board.columns as Real;
    let rows = board.rows as Real;
    let m = opts.margin_squares;
    if x < -1.0 - m || y < -1.0 - m || x > cols + m || y > rows + m {
        return opts.background as Real;
    }
    if x < -1.0 || y < -1.0 || x > cols || y > rows {
        return opts.light as Real;
    }

    let a = (x + 1.0).floor() as i64;
    let b = (y + 1.0).floor() as i64;
    if (a + b) % 2 == 0 {
        opts.dark as Real
    } else {
        opts.light as Real
    }
}
