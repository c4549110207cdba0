//! Undistortion lookup tables and bilinear resampling.

use crate::RectifyError;
use image::{Rgb, RgbImage};
use pave_core::{CameraIntrinsics, DistortionModel, Pt2, Real, Vec2};

/// For every output pixel, the source position it samples.
#[derive(Debug, Clone)]
pub struct UndistortMap {
    width: u32,
    height: u32,
    map_x: Vec<f32>,
    map_y: Vec<f32>,
}

impl UndistortMap {
    /// Map for an undistorted `width x height` image seen through `k_new`,
    /// sampling a source taken by `k` with distortion `dist`.
    pub fn new<D: DistortionModel>(
        k: &CameraIntrinsics,
        dist: &D,
        k_new: &CameraIntrinsics,
        width: u32,
        height: u32,
    ) -> Result<Self, RectifyError> {
        if width == 0 || height == 0 {
            return Err(RectifyError::EmptyImage);
        }
        if !k_new.is_invertible() {
            return Err(RectifyError::SingularCameraMatrix);
        }

        let n = width as usize * height as usize;
        let mut map_x = Vec::with_capacity(n);
        let mut map_y = Vec::with_capacity(n);
        for v in 0..height {
            for u in 0..width {
                let ray: Vec2 = k_new.from_pixel(&Pt2::new(u as Real, v as Real));
                let src = k.to_pixel(&dist.distort(&ray));
                map_x.push(src.x as f32);
                map_y.push(src.y as f32);
            }
        }
        Ok(Self {
            width,
            height,
            map_x,
            map_y,
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Source position sampled by output pixel `(u, v)`.
    pub fn source(&self, u: u32, v: u32) -> (f32, f32) {
        let idx = v as usize * self.width as usize + u as usize;
        (self.map_x[idx], self.map_y[idx])
    }

    /// Resample `src`; positions outside it read as black.
    pub fn remap(&self, src: &RgbImage) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |u, v| {
            let (sx, sy) = self.source(u, v);
            sample_bilinear(src, sx, sy)
        })
    }
}

fn sample_bilinear(src: &RgbImage, x: f32, y: f32) -> Rgb<u8> {
    let (w, h) = (src.width() as i64, src.height() as i64);
    if !x.is_finite() || !y.is_finite() {
        return Rgb([0, 0, 0]);
    }
    let x0 = x.floor();
    let y0 = y.floor();
    let (fx, fy) = (x - x0, y - y0);
    let (xi, yi) = (x0 as i64, y0 as i64);
    if xi < -1 || yi < -1 || xi >= w || yi >= h {
        return Rgb([0, 0, 0]);
    }

    let at = |xx: i64, yy: i64, c: usize| -> f32 {
        if xx < 0 || yy < 0 || xx >= w || yy >= h {
            0.0
        } else {
            src.get_pixel(xx as u32, yy as u32)[c] as f32
        }
    };

    let mut out = [0u8; 3];
    for (c, o) in out.iter_mut().enumerate() {
        let top = at(xi, yi, c) * (1.0 - fx) + at(xi + 1, yi, c) * fx;
        let bottom = at(xi, yi + 1, c) * (1.0 - fx) + at(xi + 1, yi + 1, c) * fx;
        *o = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    Rgb(out)
}
