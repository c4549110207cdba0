//! Run configuration, loadable from JSON with every field optional.

use crate::error::PipelineError;
use crate::filters::FilterConfig;
use crate::layout::OutputLayout;
use crate::runner::ErrorPolicy;
use pave_calib::CalibratorOptions;
use pave_core::Real;
use pave_rectify::RectifierOptions;
use serde::{Deserialize, Serialize};

/// Which rows of a rectified image make up its slice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliceConfig {
    /// Fraction of rows kept, counted from the bottom edge.
    pub keep_fraction: Real,
}

impl Default for SliceConfig {
    fn default() -> Self {
        Self {
            keep_fraction: 0.75,
        }
    }
}

impl SliceConfig {
    /// Rows kept from an image `height` rows tall.
    ///
    /// The dropped top band is rounded down, so the default keeps
    /// `height - height / 4` rows. Bands within `1e-9` of a whole row count
    /// as that row.
    pub fn kept_rows(&self, height: u32) -> u32 {
        let band = height as Real * (1.0 - self.keep_fraction);
        let dropped = (band + 1e-9).floor() as u32;
        height - dropped.min(height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositorOptions {
    pub slice: SliceConfig,
    /// A stacked composite is produced for every `stack_every`-th image,
    /// from that many most recent slices.
    pub stack_every: usize,
}

impl Default for CompositorOptions {
    fn default() -> Self {
        Self {
            slice: SliceConfig::default(),
            stack_every: 3,
        }
    }
}

impl CompositorOptions {
    pub fn validate(&self) -> Result<(), PipelineError> {
        let keep = self.slice.keep_fraction;
        if !(keep > 0.0 && keep <= 1.0) {
            return Err(PipelineError::Config(format!(
                "slice.keep_fraction must be in (0, 1], got {keep}"
            )));
        }
        if self.stack_every == 0 {
            return Err(PipelineError::Config("stack_every must be at least 1".into()));
        }
        Ok(())
    }
}

/// Everything a pipeline run can be tuned with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub calibrator: CalibratorOptions,
    pub rectifier: RectifierOptions,
    pub compositor: CompositorOptions,
    pub filters: FilterConfig,
    pub layout: OutputLayout,
    /// Rectify images at all; `false` passes them through unchanged.
    pub use_calibration: bool,
    /// Try to calibrate from the calibration directory. When disabled, or
    /// when no board is found, rectification uses the synthetic lens model.
    pub calibrate: bool,
    pub error_policy: ErrorPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            calibrator: CalibratorOptions::default(),
            rectifier: RectifierOptions::default(),
            compositor: CompositorOptions::default(),
            filters: FilterConfig::default(),
            layout: OutputLayout::default(),
            use_calibration: true,
            calibrate: true,
            error_policy: ErrorPolicy::default(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.compositor.validate()?;
        let alpha = self.rectifier.alpha;
        if !(0.0..=1.0).contains(&alpha) {
            return Err(PipelineError::Config(format!(
                "rectifier.alpha must be in [0, 1], got {alpha}"
            )));
        }
        let board = &self.calibrator.board;
        if board.columns < 2 || board.rows < 2 {
            return Err(PipelineError::Config(format!(
                "board must have at least 2x2 interior corners, got {}x{}",
                board.columns, board.rows
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::Filter;

    #[test]
    fn default_slice_keeps_bottom_three_quarters() {
        let s = SliceConfig::default();
        assert_eq!(s.kept_rows(100), 75);
        assert_eq!(s.kept_rows(4), 3);
        assert_eq!(s.kept_rows(3), 3);
        assert_eq!(s.kept_rows(101), 101 - 101 / 4);
        assert_eq!(s.kept_rows(0), 0);
    }

    #[test]
    fn full_slice_keeps_everything() {
        let s = SliceConfig { keep_fraction: 1.0 };
        assert_eq!(s.kept_rows(57), 57);
    }

    #[test]
    fn decimal_fractions_keep_exact_row_counts() {
        let s = SliceConfig { keep_fraction: 0.9 };
        assert_eq!(s.kept_rows(100), 90);
        assert_eq!(s.kept_rows(10), 9);
        let s = SliceConfig { keep_fraction: 0.7 };
        assert_eq!(s.kept_rows(10), 7);
        assert_eq!(s.kept_rows(1000), 700);
        let s = SliceConfig { keep_fraction: 0.3 };
        assert_eq!(s.kept_rows(100), 30);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: PipelineConfig = serde_json::from_str(
            r#"{
                "use_calibration": false,
                "compositor": { "stack_every": 4 },
                "filters": { "chain": ["gamma_correction", "histogram_equalization"] }
            }"#,
        )
        .unwrap();
        assert!(!cfg.use_calibration);
        assert!(cfg.calibrate);
        assert_eq!(cfg.compositor.stack_every, 4);
        assert_eq!(cfg.compositor.slice, SliceConfig::default());
        assert_eq!(
            cfg.filters.chain,
            vec![Filter::GammaCorrection, Filter::HistogramEqualization]
        );
        assert_eq!(cfg.error_policy, ErrorPolicy::Abort);
        cfg.validate().unwrap();
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut cfg = PipelineConfig::default();
        cfg.compositor.stack_every = 0;
        assert!(matches!(cfg.validate(), Err(PipelineError::Config(_))));

        let mut cfg = PipelineConfig::default();
        cfg.compositor.slice.keep_fraction = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = PipelineConfig::default();
        cfg.rectifier.alpha = 1.5;
        assert!(cfg.validate().is_err());

        let mut cfg = PipelineConfig::default();
        cfg.calibrator.board.rows = 1;
        assert!(cfg.validate().is_err());
    }
}
