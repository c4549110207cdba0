//! One full pass over a project directory.

use crate::codec::{decode, encode};
use crate::compositor::{ArtifactSet, BatchCompositor};
use crate::config::PipelineConfig;
use crate::discovery::discover_images;
use crate::error::PipelineError;
use crate::layout::OutputLayout;
use anyhow::{Context, Result};
use image::RgbImage;
use log::{info, warn};
use pave_calib::{draw_chessboard_corners, Calibrator, CalibratorOptions};
use pave_core::{CalibrationResult, Real};
use pave_rectify::{Rectifier, RectifyMode};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// What to do when a single image cannot be read, processed or written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Stop the run at the first failing image.
    #[default]
    Abort,
    /// Log the failure and continue with the next image.
    Skip,
}

impl ErrorPolicy {
    fn handle(self, path: &Path, err: PipelineError, skipped: &mut Vec<PathBuf>) -> Result<()> {
        match self {
            Self::Abort => Err(err).with_context(|| format!("processing {}", path.display())),
            Self::Skip => {
                warn!("skipping {}: {err}", path.display());
                skipped.push(path.to_path_buf());
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub mode: RectifyMode,
    /// Calibration views used, when a calibration was made.
    pub calibration_views: Option<usize>,
    pub reprojection_error: Option<Real>,
    pub processed: usize,
    pub stacked: usize,
    pub skipped: Vec<PathBuf>,
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Calibrate from every image under `dir`.
///
/// Returns `Ok(None)` when the directory is missing or holds no image with a
/// detectable board. With `diagnostics` set, every detection is drawn onto a
/// copy of its image and written there under the source file name.
pub fn calibrate_directory(
    dir: &Path,
    options: &CalibratorOptions,
    diagnostics: Option<&Path>,
    policy: ErrorPolicy,
) -> Result<Option<CalibrationResult>> {
    if !dir.is_dir() {
        info!("no calibration directory at {}", dir.display());
        return Ok(None);
    }
    let mut skipped = Vec::new();
    let mut paths = Vec::new();
    let mut images = Vec::new();
    for path in discover_images(dir)? {
        match decode(&path) {
            Ok(img) => {
                paths.push(path);
                images.push(img);
            }
            Err(e) => policy.handle(&path, e, &mut skipped)?,
        }
    }
    if images.is_empty() {
        info!("no calibration images in {}", dir.display());
        return Ok(None);
    }

    let run = Calibrator::new(options.clone()).run(&images);

    if let Some(out_dir) = diagnostics {
        for view in &run.views {
            let mut canvas: RgbImage = images[view.index].clone();
            draw_chessboard_corners(&mut canvas, &options.board, &view.view.points_2d);
            let target = out_dir.join(file_name(&paths[view.index]));
            if let Err(e) = encode(&canvas, &target) {
                policy.handle(&target, e, &mut skipped)?;
            }
        }
    }

    match run.result {
        Ok(result) => Ok(Some(result)),
        Err(e) if e.is_unavailable() => {
            warn!("{e}, falling back to the synthetic lens model");
            Ok(None)
        }
        Err(e) => {
            warn!("calibration failed, falling back to the synthetic lens model: {e}");
            Ok(None)
        }
    }
}

/// Encode every artifact of `set`. On failure the files of this set written
/// so far are removed again.
fn write_artifacts(layout: &OutputLayout, set: &ArtifactSet) -> Result<(), PipelineError> {
    let mut targets = vec![
        (&set.filtered, layout.filtered.join(&set.name)),
        (&set.rectified, layout.rectified.join(&set.name)),
        (&set.comparison, layout.joined.join(&set.name)),
        (&set.slice, layout.sliced.join(&set.name)),
    ];
    if let Some(stacked) = &set.stacked {
        targets.push((stacked, layout.stacked.join(&set.name)));
    }

    for (done, (img, target)) in targets.iter().enumerate() {
        if let Err(e) = encode(img, target) {
            for (_, written) in &targets[..=done] {
                if written.is_file() {
                    if let Err(rm) = fs::remove_file(written) {
                        warn!("could not remove {}: {rm}", written.display());
                    }
                }
            }
            return Err(e);
        }
    }
    Ok(())
}

/// Calibrate, then filter, rectify, slice and stack every source image under
/// `root`, writing each artifact kind to its layout directory.
///
/// Artifacts are keyed by the source file's base name; two sources with the
/// same name in different subdirectories overwrite each other.
pub fn run_pipeline(root: &Path, config: &PipelineConfig) -> Result<RunSummary> {
    config.validate()?;
    let layout = config.layout.under(root);
    layout.create_dirs()?;

    let calibration = if config.use_calibration && config.calibrate {
        calibrate_directory(
            &layout.calibration,
            &config.calibrator,
            layout.diagnostics.as_deref(),
            config.error_policy,
        )?
    } else {
        None
    };
    let calibration_views = calibration.as_ref().map(CalibrationResult::num_views);
    let reprojection_error = calibration.as_ref().map(|c| c.reprojection_error);

    let sources = discover_images(&layout.source)
        .with_context(|| format!("listing source images in {}", layout.source.display()))?;

    let mut compositor = BatchCompositor::new(
        config.compositor,
        Rectifier::new(config.rectifier),
        calibration,
        config.use_calibration,
    )
    .with_filters(config.filters.clone());
    let mode = compositor.mode();
    info!("processing {} source images ({mode:?})", sources.len());

    let mut skipped = Vec::new();
    let mut stacked = 0;
    for path in &sources {
        let set = match decode(path).and_then(|img| compositor.derive(file_name(path), &img)) {
            Ok(set) => set,
            Err(e) => {
                config.error_policy.handle(path, e, &mut skipped)?;
                continue;
            }
        };
        if let Err(e) = write_artifacts(&layout, &set) {
            config.error_policy.handle(path, e, &mut skipped)?;
            continue;
        }
        compositor.commit(&set);
        stacked += usize::from(set.stacked.is_some());
    }

    let summary = RunSummary {
        mode,
        calibration_views,
        reprojection_error,
        processed: compositor.processed(),
        stacked,
        skipped,
    };
    info!(
        "processed {} images, {} stacks, {} skipped",
        summary.processed,
        summary.stacked,
        summary.skipped.len()
    );
    Ok(summary)
}
