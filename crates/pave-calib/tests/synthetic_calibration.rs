//! End-to-end detection and calibration on rendered chessboards.
//!
//! Every image is ray-traced through a known distorted camera, so detected
//! corners and calibrated parameters can be compared against ground truth.

use image::{Rgb, RgbImage};
use pave_calib::{Calibrator, CalibratorOptions};
use pave_core::synthetic::planar::{board_facing_camera, project_board};
use pave_core::synthetic::render::{render_chessboard, RenderOptions};
use pave_core::{BoardGeometry, BrownConrady5, CameraIntrinsics, Iso3, PinholeCamera, Real};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const W: u32 = 640;
const H: u32 = 480;

fn truth_camera() -> PinholeCamera {
    PinholeCamera::new(
        CameraIntrinsics::new(700.0, 690.0, 322.0, 236.0),
        BrownConrady5 {
            k1: -0.2,
            k2: 0.05,
            ..BrownConrady5::default()
        },
    )
}

fn poses(board: &BoardGeometry) -> Vec<Iso3> {
    [
        (0.25, 0.1),
        (-0.2, 0.3),
        (0.1, -0.3),
        (-0.3, -0.15),
        (0.35, 0.0),
    ]
    .iter()
    .map(|&(tx, ty)| board_facing_camera(board, 20.0, tx, ty))
    .collect()
}

fn render(camera: &PinholeCamera, pose: &Iso3, board: &BoardGeometry) -> RgbImage {
    render_chessboard(camera, pose, board, W, H, &RenderOptions::default())
}

fn noise_image(seed: u64) -> RgbImage {
    let mut rng = StdRng::seed_from_u64(seed);
    RgbImage::from_fn(W, H, |_, _| {
        let v: u8 = rng.gen();
        Rgb([v, v, v])
    })
}

#[test]
fn detects_all_corners_in_board_order() {
    let board = BoardGeometry::default();
    let camera = truth_camera();
    let calibrator = Calibrator::default();

    for pose in poses(&board).iter().take(3) {
        let img = render(&camera, pose, &board);
        let truth = project_board(&camera, pose, &board).unwrap();

        let corners = calibrator.detect_corners(&img).expect("board not detected");
        assert_eq!(corners.len(), 54);
        for (idx, (c, t)) in corners.iter().zip(&truth).enumerate() {
            let err = (c - t).norm();
            assert!(err < 0.5, "corner {idx}: {c} vs {t} ({err:.3} px)");
        }
    }
}

#[test]
fn rejects_images_without_a_board() {
    let calibrator = Calibrator::default();
    assert!(calibrator
        .detect_corners(&RgbImage::from_pixel(W, H, Rgb([128, 128, 128])))
        .is_none());
    assert!(calibrator.detect_corners(&noise_image(7)).is_none());
}

#[test]
fn rejects_board_with_wrong_dimensions() {
    let rendered = BoardGeometry::new(7, 5);
    let camera = truth_camera();
    let img = render(&camera, &board_facing_camera(&rendered, 16.0, 0.2, 0.1), &rendered);

    let calibrator = Calibrator::default();
    assert!(calibrator.detect_corners(&img).is_none());

    let matching = Calibrator::new(CalibratorOptions {
        board: rendered,
        ..CalibratorOptions::default()
    });
    assert_eq!(matching.detect_corners(&img).map(|c| c.len()), Some(35));
}

#[test]
fn calibrates_distorted_camera() {
    let board = BoardGeometry::default();
    let camera = truth_camera();
    let images: Vec<RgbImage> = poses(&board)
        .iter()
        .map(|p| render(&camera, p, &board))
        .collect();

    let result = Calibrator::default()
        .calibrate(&images)
        .expect("calibration should succeed");

    assert_eq!(result.num_views(), 5);
    assert_eq!(result.image_size, [W, H]);
    assert!(
        result.reprojection_error < 0.3,
        "rms {}",
        result.reprojection_error
    );

    let k = result.intrinsics();
    let rel = |est: Real, gt: Real| (est - gt).abs() / gt;
    assert!(rel(k.fx, 700.0) < 0.03, "fx {}", k.fx);
    assert!(rel(k.fy, 690.0) < 0.03, "fy {}", k.fy);
    assert!((k.cx - 322.0).abs() < 15.0, "cx {}", k.cx);
    assert!((k.cy - 236.0).abs() < 15.0, "cy {}", k.cy);
    assert_eq!(k.skew, 0.0);
    assert!(result.distortion().k1 < 0.0, "k1 {}", result.distortion().k1);
    assert_eq!(result.distortion().k3, 0.0);
}

#[test]
fn only_detected_images_become_views() {
    let board = BoardGeometry::default();
    let camera = truth_camera();
    let ps = poses(&board);
    let images = vec![
        render(&camera, &ps[0], &board),
        RgbImage::from_pixel(W, H, Rgb([60, 60, 60])),
        render(&camera, &ps[1], &board),
        noise_image(11),
    ];

    let calibrator = Calibrator::default();
    let detected = calibrator.detect_views(&images);
    assert_eq!(
        detected.iter().map(|d| d.index).collect::<Vec<_>>(),
        vec![0, 2]
    );

    let result = calibrator.calibrate(&images).expect("two views suffice");
    assert_eq!(result.num_views(), 2);
    assert!(result.reprojection_error < 1.0);

    let run = calibrator.run(&images);
    assert_eq!(run.views.len(), 2);
    assert_eq!(run.views[1].index, 2);
    assert_eq!(run.result.unwrap().num_views(), 2);
}

#[test]
fn no_detection_means_no_calibration() {
    let images = vec![noise_image(1), noise_image(2)];
    assert!(Calibrator::default().calibrate(&images).is_none());
    assert!(Calibrator::default().calibrate(&[]).is_none());
}
