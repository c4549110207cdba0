//! Cropping, resizing and concatenation of RGB images.

use crate::config::SliceConfig;
use crate::error::PipelineError;
use image::imageops::{self, FilterType};
use image::RgbImage;

/// The bottom rows of `image` selected by `config`, full width.
pub fn slice_bottom(image: &RgbImage, config: &SliceConfig) -> RgbImage {
    let (w, h) = image.dimensions();
    let kept = config.kept_rows(h);
    imageops::crop_imm(image, 0, h - kept, w, kept).to_image()
}

/// Bicubic resize to exactly `width x height`. Same-size input is copied.
pub fn resize_bicubic(image: &RgbImage, width: u32, height: u32) -> RgbImage {
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    if image.width() == 0 || image.height() == 0 {
        return RgbImage::new(width, height);
    }
    imageops::resize(image, width, height, FilterType::CatmullRom)
}

/// `left` and `right` side by side.
pub fn hconcat(left: &RgbImage, right: &RgbImage) -> Result<RgbImage, PipelineError> {
    if left.height() != right.height() {
        return Err(PipelineError::ShapeMismatch {
            op: "concatenate horizontally with height",
            expected: left.height(),
            found: right.height(),
        });
    }
    let mut out = RgbImage::new(left.width() + right.width(), left.height());
    imageops::replace(&mut out, left, 0, 0);
    imageops::replace(&mut out, right, left.width() as i64, 0);
    Ok(out)
}

/// `images` top to bottom; all must share the first one's width.
pub fn vconcat<'a, I>(images: I) -> Result<RgbImage, PipelineError>
where
    I: IntoIterator<Item = &'a RgbImage>,
{
    let images: Vec<&RgbImage> = images.into_iter().collect();
    let Some(first) = images.first() else {
        return Ok(RgbImage::new(0, 0));
    };
    let width = first.width();
    if let Some(bad) = images.iter().find(|img| img.width() != width) {
        return Err(PipelineError::ShapeMismatch {
            op: "concatenate vertically with width",
            expected: width,
            found: bad.width(),
        });
    }

    let height = images.iter().map(|img| img.height()).sum();
    let mut out = RgbImage::new(width, height);
    let mut y = 0i64;
    for img in images {
        imageops::replace(&mut out, img, 0, y);
        y += img.height() as i64;
    }
    Ok(out)
}

/// Original on the left, `rectified` resized to the original's size on the
/// right.
pub fn comparison(original: &RgbImage, rectified: &RgbImage) -> Result<RgbImage, PipelineError> {
    let (w, h) = original.dimensions();
    hconcat(original, &resize_bicubic(rectified, w, h))
}

/// Slices stacked oldest on top. Slices narrower or wider than the first
/// are resized to its width, keeping their aspect ratio.
pub fn stack<'a, I>(slices: I) -> Result<RgbImage, PipelineError>
where
    I: IntoIterator<Item = &'a RgbImage>,
{
    let slices: Vec<&RgbImage> = slices.into_iter().collect();
    let Some(width) = slices.first().map(|s| s.width()) else {
        return Ok(RgbImage::new(0, 0));
    };
    let fitted: Vec<RgbImage> = slices
        .iter()
        .map(|s| {
            if s.width() == width || s.width() == 0 {
                (*s).clone()
            } else {
                let height =
                    ((s.height() as f64 * width as f64 / s.width() as f64).round() as u32).max(1);
                resize_bicubic(s, width, height)
            }
        })
        .collect();
    vconcat(&fitted)
}
