//! Windowing and concatenation laws of the batch compositor.

use image::{Rgb, RgbImage};
use pave_pipeline::{BatchCompositor, CompositorOptions};
use pave_rectify::{Rectifier, RectifyMode};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_image(w: u32, h: u32, seed: u64) -> RgbImage {
    let mut rng = StdRng::seed_from_u64(seed);
    RgbImage::from_fn(w, h, |_, _| Rgb([rng.gen(), rng.gen(), rng.gen()]))
}

fn batch(n: usize, w: u32, h: u32) -> Vec<(String, RgbImage)> {
    (0..n)
        .map(|i| (format!("img_{:02}.jpg", i + 1), random_image(w, h, i as u64)))
        .collect()
}

#[test]
fn five_images_without_rectification() {
    let images = batch(5, 100, 100);
    let mut compositor =
        BatchCompositor::new(CompositorOptions::default(), Rectifier::default(), None, false);
    assert_eq!(compositor.mode(), RectifyMode::PassThrough);

    let out = compositor.process(images.clone()).unwrap();
    assert_eq!(out.len(), 5);
    for (set, (name, original)) in out.iter().zip(&images) {
        assert_eq!(&set.name, name);
        assert_eq!(&set.rectified, original);
        // width x height: 100 wide, 75 tall
        assert_eq!(set.slice.dimensions(), (100, 75));
        assert_eq!(set.comparison.dimensions(), (200, 100));
        for (x, y) in [(0, 0), (57, 33), (99, 99)] {
            assert_eq!(set.comparison.get_pixel(x, y), original.get_pixel(x, y));
            assert_eq!(set.comparison.get_pixel(100 + x, y), original.get_pixel(x, y));
        }
    }

    let stacked: Vec<_> = out.iter().filter_map(|s| s.stacked.as_ref().map(|st| (&s.name, st))).collect();
    assert_eq!(stacked.len(), 1);
    let (name, stack) = stacked[0];
    assert_eq!(name, "img_03.jpg");
    assert_eq!(stack.dimensions(), (100, 225));
    // oldest slice on top: row 0 of the stack is row 25 of image 1
    assert_eq!(stack.get_pixel(10, 0), images[0].1.get_pixel(10, 25));
    assert_eq!(stack.get_pixel(10, 75), images[1].1.get_pixel(10, 25));
    assert_eq!(stack.get_pixel(10, 224), images[2].1.get_pixel(10, 99));
}

#[test]
fn stack_count_is_floor_of_n_over_three() {
    for n in 0..=10 {
        let mut compositor =
            BatchCompositor::new(CompositorOptions::default(), Rectifier::default(), None, false);
        let out = compositor.process(batch(n, 12, 8)).unwrap();
        let positions: Vec<usize> = out
            .iter()
            .enumerate()
            .filter(|(_, s)| s.stacked.is_some())
            .map(|(i, _)| i + 1)
            .collect();
        assert_eq!(positions.len(), n / 3, "n = {n}");
        assert!(positions.iter().all(|p| p % 3 == 0));
    }
}

#[test]
fn outputs_are_causal() {
    // artifacts of the first images do not change when more images follow
    let images = batch(6, 30, 20);
    let mut short = BatchCompositor::new(CompositorOptions::default(), Rectifier::default(), None, true);
    let mut long = short.clone();
    let a = short.process(images[..3].to_vec()).unwrap();
    let b = long.process(images).unwrap();
    for (x, y) in a.iter().zip(&b) {
        assert_eq!(x.rectified, y.rectified);
        assert_eq!(x.slice, y.slice);
        assert_eq!(x.stacked, y.stacked);
    }
}

#[test]
fn synthetic_rectification_keeps_slice_geometry() {
    let mut compositor =
        BatchCompositor::new(CompositorOptions::default(), Rectifier::default(), None, true);
    assert_eq!(compositor.mode(), RectifyMode::Synthetic);
    let out = compositor.process(batch(3, 64, 48)).unwrap();
    for set in &out {
        assert_eq!(set.rectified.dimensions(), (64, 48));
        assert_eq!(set.slice.dimensions(), (64, 36));
        assert_eq!(set.comparison.dimensions(), (128, 48));
    }
    assert_eq!(out[2].stacked.as_ref().unwrap().dimensions(), (64, 108));
}
