//! Where a run reads its inputs and writes its artifacts.

use crate::error::PipelineError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory of every input and artifact kind.
///
/// Paths are relative to the project root until [`OutputLayout::under`]
/// resolves them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputLayout {
    pub source: PathBuf,
    pub calibration: PathBuf,
    pub filtered: PathBuf,
    pub rectified: PathBuf,
    pub joined: PathBuf,
    pub sliced: PathBuf,
    pub stacked: PathBuf,
    /// Detected-corner overlays of the calibration images; not written
    /// when unset.
    pub diagnostics: Option<PathBuf>,
}

impl Default for OutputLayout {
    fn default() -> Self {
        Self {
            source: "res/0_source".into(),
            calibration: "res/calibration".into(),
            filtered: "res/1_filter".into(),
            rectified: "res/2_distor".into(),
            joined: "res/3_joined".into(),
            sliced: "res/4_sliced".into(),
            stacked: "res/5_concat".into(),
            diagnostics: None,
        }
    }
}

impl OutputLayout {
    /// The same layout with every relative directory joined onto `root`.
    pub fn under(&self, root: &Path) -> Self {
        Self {
            source: root.join(&self.source),
            calibration: root.join(&self.calibration),
            filtered: root.join(&self.filtered),
            rectified: root.join(&self.rectified),
            joined: root.join(&self.joined),
            sliced: root.join(&self.sliced),
            stacked: root.join(&self.stacked),
            diagnostics: self.diagnostics.as_ref().map(|d| root.join(d)),
        }
    }

    /// Directories the pipeline writes into.
    pub fn output_dirs(&self) -> impl Iterator<Item = &Path> {
        [
            &self.filtered,
            &self.rectified,
            &self.joined,
            &self.sliced,
            &self.stacked,
        ]
        .into_iter()
        .chain(self.diagnostics.as_ref())
        .map(PathBuf::as_path)
    }

    pub fn create_dirs(&self) -> Result<(), PipelineError> {
        for dir in self.output_dirs() {
            fs::create_dir_all(dir).map_err(|e| PipelineError::io(dir, e))?;
        }
        Ok(())
    }

    /// Delete the files left in the output directories by a previous run.
    ///
    /// Hidden files (name starting with `.`) and the directories themselves
    /// are kept. Returns the number of files removed.
    pub fn clean(&self) -> Result<usize, PipelineError> {
        let mut removed = 0;
        for dir in self.output_dirs() {
            if dir.is_dir() {
                removed += clean_dir(dir)?;
            }
        }
        Ok(removed)
    }
}

fn clean_dir(dir: &Path) -> Result<usize, PipelineError> {
    let mut removed = 0;
    for entry in fs::read_dir(dir).map_err(|e| PipelineError::io(dir, e))? {
        let path = entry.map_err(|e| PipelineError::io(dir, e))?.path();
        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.'));
        if path.is_dir() {
            removed += clean_dir(&path)?;
        } else if !hidden {
            fs::remove_file(&path).map_err(|e| PipelineError::io(&path, e))?;
            debug!("removed {}", path.display());
            removed += 1;
        }
    }
    Ok(removed)
}
