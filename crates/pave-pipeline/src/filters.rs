//! Cosmetic filters applied to source images before rectification.

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::contrast::{equalize_histogram, stretch_contrast_mut};
use imageproc::filter::median_filter;
use imageproc::morphology::{grayscale_dilate, Mask};
use serde::{Deserialize, Serialize};

/// Half-size of the square dilation kernel (7x7).
const SHADOW_DILATE_RADIUS: u8 = 3;
/// Half-size of the background median window (21x21).
const SHADOW_MEDIAN_RADIUS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    /// Flatten uneven illumination per colour channel.
    RemoveShadows,
    /// Move the mean brightness to mid-grey.
    GammaCorrection,
    /// Equalise the luma histogram, leaving chroma alone.
    HistogramEqualization,
}

impl Filter {
    pub fn apply(&self, image: &RgbImage) -> RgbImage {
        match self {
            Self::RemoveShadows => remove_shadows(image),
            Self::GammaCorrection => gamma_correction(image),
            Self::HistogramEqualization => equalize_luma(image),
        }
    }
}

/// Filters run in order on every source image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub chain: Vec<Filter>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            chain: vec![Filter::RemoveShadows],
        }
    }
}

impl FilterConfig {
    /// An empty chain: images pass through untouched.
    pub fn none() -> Self {
        Self { chain: Vec::new() }
    }

    pub fn apply(&self, image: &RgbImage) -> RgbImage {
        self.chain
            .iter()
            .fold(image.clone(), |img, filter| filter.apply(&img))
    }
}

fn split_channels(image: &RgbImage) -> [GrayImage; 3] {
    let (w, h) = image.dimensions();
    [0, 1, 2].map(|c| GrayImage::from_fn(w, h, |x, y| Luma([image.get_pixel(x, y)[c]])))
}

fn merge_channels(planes: &[GrayImage; 3]) -> RgbImage {
    let (w, h) = planes[0].dimensions();
    RgbImage::from_fn(w, h, |x, y| {
        Rgb([
            planes[0].get_pixel(x, y)[0],
            planes[1].get_pixel(x, y)[0],
            planes[2].get_pixel(x, y)[0],
        ])
    })
}

/// Stretch to the full `0..=255` range. A constant plane maps to zero.
fn normalize_min_max(plane: &mut GrayImage) {
    let (lo, hi) = plane
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));
    if hi <= lo {
        plane.pixels_mut().for_each(|p| p[0] = 0);
        return;
    }
    stretch_contrast_mut(plane, lo, hi, u8::MIN, u8::MAX);
}

/// Divide out a smooth background estimated by dilation and a wide median,
/// then stretch each channel to the full range.
pub fn remove_shadows(image: &RgbImage) -> RgbImage {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return image.clone();
    }
    let planes = split_channels(image).map(|plane| {
        let background = median_filter(
            &grayscale_dilate(&plane, &Mask::square(SHADOW_DILATE_RADIUS)),
            SHADOW_MEDIAN_RADIUS,
            SHADOW_MEDIAN_RADIUS,
        );
        let mut diff = GrayImage::from_fn(w, h, |x, y| {
            let p = plane.get_pixel(x, y)[0];
            let b = background.get_pixel(x, y)[0];
            Luma([255 - p.abs_diff(b)])
        });
        normalize_min_max(&mut diff);
        diff
    });
    merge_channels(&planes)
}

/// Raise the HSV value channel to `gamma = ln(127.5) / ln(mean value)`,
/// keeping hue and saturation.
///
/// Images whose mean value is too dark for a finite gamma are returned
/// unchanged.
pub fn gamma_correction(image: &RgbImage) -> RgbImage {
    let n = image.width() as u64 * image.height() as u64;
    if n == 0 {
        return image.clone();
    }
    let sum: u64 = image
        .pixels()
        .map(|p| p.0.iter().copied().max().unwrap_or(0) as u64)
        .sum();
    let mean = sum as f64 / n as f64;
    let gamma = (0.5 * 255.0f64).ln() / mean.ln();
    if mean <= 1.0 || !gamma.is_finite() {
        return image.clone();
    }

    let mut lut = [0u8; 256];
    for (v, out) in lut.iter_mut().enumerate() {
        *out = (v as f64).powf(gamma).clamp(0.0, 255.0) as u8;
    }

    let mut out = image.clone();
    for p in out.pixels_mut() {
        let value = p.0.iter().copied().max().unwrap_or(0);
        if value == 0 {
            continue;
        }
        // same hue and saturation: every channel scales with the value
        let scale = lut[value as usize] as f32 / value as f32;
        for c in p.0.iter_mut() {
            *c = (*c as f32 * scale).round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// Histogram-equalise the YCrCb luma channel.
pub fn equalize_luma(image: &RgbImage) -> RgbImage {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return image.clone();
    }
    let ycrcb: Vec<[f32; 3]> = image.pixels().map(|p| rgb_to_ycrcb(p.0)).collect();
    let luma = GrayImage::from_fn(w, h, |x, y| {
        let [yy, _, _] = ycrcb[(y * w + x) as usize];
        Luma([yy.round().clamp(0.0, 255.0) as u8])
    });
    let equalized = equalize_histogram(&luma);

    RgbImage::from_fn(w, h, |x, y| {
        let [_, cr, cb] = ycrcb[(y * w + x) as usize];
        Rgb(ycrcb_to_rgb([equalized.get_pixel(x, y)[0] as f32, cr, cb]))
    })
}

fn rgb_to_ycrcb([r, g, b]: [u8; 3]) -> [f32; 3] {
    let (r, g, b) = (r as f32, g as f32, b as f32);
    let y = 0.299 * r + 0.587 * g + 0.114 * b;
    [y, (r - y) * 0.713 + 128.0, (b - y) * 0.564 + 128.0]
}

fn ycrcb_to_rgb([y, cr, cb]: [f32; 3]) -> [u8; 3] {
    let (cr, cb) = (cr - 128.0, cb - 128.0);
    [
        y + 1.403 * cr,
        y - 0.714 * cr - 0.344 * cb,
        y + 1.773 * cb,
    ]
    .map(|c| c.round().clamp(0.0, 255.0) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shaded(w: u32, h: u32) -> RgbImage {
        RgbImage::from_fn(w, h, |x, y| {
            let shade = (x * 150 / w.max(1)) as u8;
            let mark = if (x / 6 + y / 6) % 5 == 0 { 60 } else { 0 };
            Rgb([90 + shade - mark, 80 + shade - mark, 70 + shade - mark])
        })
    }

    #[test]
    fn filters_preserve_dimensions() {
        let img = shaded(37, 23);
        for f in [
            Filter::RemoveShadows,
            Filter::GammaCorrection,
            Filter::HistogramEqualization,
        ] {
            assert_eq!(f.apply(&img).dimensions(), (37, 23), "{f:?}");
        }
        assert_eq!(FilterConfig::default().apply(&img).dimensions(), (37, 23));
    }

    #[test]
    fn shadow_removal_maps_constant_to_constant() {
        let img = RgbImage::from_pixel(30, 30, Rgb([120, 40, 200]));
        let out = remove_shadows(&img);
        let first = *out.get_pixel(0, 0);
        assert!(out.pixels().all(|p| *p == first));
    }

    #[test]
    fn shadow_removal_stretches_each_channel() {
        let out = remove_shadows(&shaded(60, 40));
        for c in 0..3 {
            let lo = out.pixels().map(|p| p[c]).min().unwrap();
            let hi = out.pixels().map(|p| p[c]).max().unwrap();
            assert_eq!((lo, hi), (0, 255), "channel {c}");
        }
    }

    #[test]
    fn normalization_spans_full_range() {
        let mut plane = GrayImage::from_fn(16, 1, |x, _| Luma([40 + x as u8 * 4]));
        normalize_min_max(&mut plane);
        assert_eq!(plane.get_pixel(0, 0)[0], 0);
        assert_eq!(plane.get_pixel(15, 0)[0], 255);
        assert!(plane.pixels().zip(plane.pixels().skip(1)).all(|(a, b)| a[0] < b[0]));

        let mut flat = GrayImage::from_pixel(4, 4, Luma([77]));
        normalize_min_max(&mut flat);
        assert!(flat.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn gamma_moves_mean_value_towards_mid_grey() {
        let dark = RgbImage::from_fn(40, 40, |x, _| {
            let v = 20 + (x % 20) as u8;
            Rgb([v, v / 2, v / 3])
        });
        let mean_value = |img: &RgbImage| {
            img.pixels().map(|p| *p.0.iter().max().unwrap() as f64).sum::<f64>()
                / (img.width() * img.height()) as f64
        };
        let out = gamma_correction(&dark);
        assert!(mean_value(&out) > 100.0, "{}", mean_value(&out));
        assert!(mean_value(&out) < 160.0, "{}", mean_value(&out));
    }

    #[test]
    fn gamma_leaves_black_image_alone() {
        let black = RgbImage::new(8, 8);
        assert_eq!(gamma_correction(&black), black);
    }

    #[test]
    fn equalization_spreads_luma() {
        let flat = RgbImage::from_fn(32, 32, |x, y| {
            let v = 100 + ((x + y) % 8) as u8;
            Rgb([v, v, v])
        });
        let out = equalize_luma(&flat);
        let lo = out.pixels().map(|p| p[0]).min().unwrap();
        let hi = out.pixels().map(|p| p[0]).max().unwrap();
        assert!(hi - lo > 200, "{lo}..{hi}");
    }

    #[test]
    fn ycrcb_round_trip_is_close() {
        for rgb in [[0, 0, 0], [255, 255, 255], [200, 30, 90], [12, 240, 128]] {
            let back = ycrcb_to_rgb(rgb_to_ycrcb(rgb));
            for c in 0..3 {
                assert!((back[c] as i32 - rgb[c] as i32).abs() <= 1, "{rgb:?} -> {back:?}");
            }
        }
    }

    #[test]
    fn empty_chain_is_identity() {
        let img = shaded(10, 10);
        assert_eq!(FilterConfig::none().apply(&img), img);
    }
}
