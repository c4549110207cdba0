//! Dense ChESS ("Chess-board Extraction by Subtraction and Summation") response.
//!
//! For every pixel, 16 samples on a radius-5 ring are compared:
//!
//! - the *sum* response rewards opposite samples agreeing while samples a
//!   quarter turn apart disagree (an X-junction),
//! - the *diff* response penalises opposite samples disagreeing (a straight edge),
//! - the mean term penalises a centre that differs from its ring (blobs, dots).
//!
//! Corners score strongly positive; edges, L-shaped board borders and flat
//! regions score zero or below.

use image::GrayImage;

/// Ring offsets `(dx, dy)` at radius 5, a quarter turn every 4 entries.
pub const RING5: [(i32, i32); 16] = [
    (5, 0),
    (5, 2),
    (4, 4),
    (2, 5),
    (0, 5),
    (-2, 5),
    (-4, 4),
    (-5, 2),
    (-5, 0),
    (-5, -2),
    (-4, -4),
    (-2, -5),
    (0, -5),
    (2, -5),
    (4, -4),
    (5, -2),
];

const RING_RADIUS: u32 = 5;

/// Dense response map in row-major layout.
#[derive(Clone, Debug)]
pub struct ResponseMap {
    pub w: usize,
    pub h: usize,
    pub data: Vec<f32>,
}

impl ResponseMap {
    #[inline]
    pub fn at(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.w + x]
    }

    pub fn max(&self) -> f32 {
        self.data.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }
}

/// ChESS response of every pixel; pixels closer than the ring radius (plus
/// one) to the border are left at zero.
pub fn chess_response(img: &GrayImage) -> ResponseMap {
    let (w, h) = (img.width() as usize, img.height() as usize);
    let mut data = vec![0.0f32; w * h];
    let border = RING_RADIUS as usize + 1;
    if w <= 2 * border || h <= 2 * border {
        return ResponseMap { w, h, data };
    }

    let raw = img.as_raw();
    let px = |x: usize, y: usize| raw[y * w + x] as f32;

    let mut ring = [0.0f32; 16];
    for y in border..h - border {
        for x in border..w - border {
            for (k, (dx, dy)) in RING5.iter().enumerate() {
                let sx = (x as i32 + dx) as usize;
                let sy = (y as i32 + dy) as usize;
                ring[k] = px(sx, sy);
            }

            let mut sum_resp = 0.0f32;
            for n in 0..4 {
                sum_resp += ((ring[n] + ring[n + 8]) - (ring[n + 4] + ring[n + 12])).abs();
            }
            let mut diff_resp = 0.0f32;
            for n in 0..8 {
                diff_resp += (ring[n] - ring[n + 8]).abs();
            }
            let ring_mean = ring.iter().sum::<f32>() / 16.0;
            let local_mean =
                (px(x, y) + px(x - 1, y) + px(x + 1, y) + px(x, y - 1) + px(x, y + 1)) / 5.0;

            data[y * w + x] = sum_resp - diff_resp - 16.0 * (ring_mean - local_mean).abs();
        }
    }

    ResponseMap { w, h, data }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn quadrants(size: u32, cx: u32, cy: u32) -> GrayImage {
        GrayImage::from_fn(size, size, |x, y| {
            let dark = (x < cx) == (y < cy);
            Luma([if dark { 20 } else { 230 }])
        })
    }

    #[test]
    fn ring_is_point_symmetric() {
        for n in 0..8 {
            let (a, b) = (RING5[n], RING5[n + 8]);
            assert_eq!((a.0, a.1), (-b.0, -b.1));
        }
    }

    #[test]
    fn x_junction_beats_edge_and_flat() {
        let img = quadrants(41, 20, 20);
        let resp = chess_response(&img);
        let corner = resp.at(20, 20).max(resp.at(19, 19));
        assert!(corner > 300.0, "corner response {corner}");
        // along the vertical edge, far from the junction
        assert!(resp.at(20, 8) <= 0.0);
        assert!(resp.at(8, 8) == 0.0);
    }

    #[test]
    fn l_corner_is_not_a_chess_corner() {
        let img = GrayImage::from_fn(41, 41, |x, y| {
            Luma([if x < 20 && y < 20 { 20 } else { 230 }])
        });
        let resp = chess_response(&img);
        assert!(resp.max() <= 1e-3, "max {}", resp.max());
    }

    #[test]
    fn tiny_images_give_empty_response() {
        let resp = chess_response(&GrayImage::new(8, 8));
        assert!(resp.data.iter().all(|v| *v == 0.0));
    }
}
