//! Reading and writing 8-bit RGB images.

use crate::error::PipelineError;
use image::RgbImage;
use std::path::Path;

/// Decode any supported format into 8-bit RGB.
pub fn decode(path: &Path) -> Result<RgbImage, PipelineError> {
    image::open(path)
        .map(|img| img.into_rgb8())
        .map_err(|source| PipelineError::Decode {
            path: path.to_path_buf(),
            source,
        })
}

/// Encode `image` in the format implied by the extension of `path`.
pub fn encode(image: &RgbImage, path: &Path) -> Result<(), PipelineError> {
    image.save(path).map_err(|source| PipelineError::Encode {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn png_round_trip_is_lossless() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        let img = RgbImage::from_fn(13, 7, |x, y| Rgb([x as u8 * 10, y as u8 * 30, 200]));
        encode(&img, &path).unwrap();
        assert_eq!(decode(&path).unwrap(), img);
    }

    #[test]
    fn missing_or_garbage_files_fail_to_decode() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.png");
        assert!(matches!(decode(&missing), Err(PipelineError::Decode { .. })));

        let garbage = dir.path().join("garbage.png");
        std::fs::write(&garbage, b"not an image").unwrap();
        assert!(matches!(decode(&garbage), Err(PipelineError::Decode { .. })));
    }

    #[test]
    fn unknown_extension_fails_to_encode() {
        let dir = tempfile::tempdir().unwrap();
        let img = RgbImage::new(2, 2);
        let err = encode(&img, &dir.path().join("out.unknown")).unwrap_err();
        assert!(matches!(err, PipelineError::Encode { .. }));
    }
}
