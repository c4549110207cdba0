use crate::compose::{comparison, slice_bottom, stack};
use crate::config::CompositorOptions;
use crate::error::PipelineError;
use crate::filters::FilterConfig;
use crate::window::SliceWindow;
use image::RgbImage;
use log::debug;
use pave_core::CalibrationResult;
use pave_rectify::{Rectifier, RectifyMode};
use std::iter;

/// Everything derived from one source image.
#[derive(Debug, Clone)]
pub struct ArtifactSet {
    /// Base file name of the source image; every artifact is written under it.
    pub name: String,
    /// Source after the cosmetic filters.
    pub filtered: RgbImage,
    /// Filtered image after rectification.
    pub rectified: RgbImage,
    /// Unfiltered source beside the rectified image resized to match it.
    pub comparison: RgbImage,
    pub slice: RgbImage,
    /// Most recent slices stacked oldest first, on every
    /// `stack_every`-th image.
    pub stacked: Option<RgbImage>,
}

/// Rectifies an ordered image stream and assembles the windowed outputs.
///
/// The calibration decision is made once at construction and shared by
/// every image. Outputs for image `n` depend only on images `1..=n`.
#[derive(Debug, Clone)]
pub struct BatchCompositor {
    options: CompositorOptions,
    rectifier: Rectifier,
    filters: FilterConfig,
    calibration: Option<CalibrationResult>,
    use_calibration: bool,
    window: SliceWindow,
    processed: usize,
}

impl BatchCompositor {
    /// A compositor with an empty filter chain.
    pub fn new(
        options: CompositorOptions,
        rectifier: Rectifier,
        calibration: Option<CalibrationResult>,
        use_calibration: bool,
    ) -> Self {
        Self {
            window: SliceWindow::new(options.stack_every),
            options,
            rectifier,
            filters: FilterConfig::none(),
            calibration,
            use_calibration,
            processed: 0,
        }
    }

    pub fn with_filters(mut self, filters: FilterConfig) -> Self {
        self.filters = filters;
        self
    }

    /// Rectification path every image of this batch takes.
    pub fn mode(&self) -> RectifyMode {
        RectifyMode::select(self.use_calibration, self.calibration.is_some())
    }

    /// Images processed so far.
    pub fn processed(&self) -> usize {
        self.processed
    }

    /// Images between two stacked composites; a zero `stack_every` counts
    /// as one.
    fn stack_period(&self) -> usize {
        self.window.capacity()
    }

    /// Derive the artifacts the next image in the stream would produce,
    /// without advancing the stream.
    ///
    /// Pass the result to [`BatchCompositor::commit`] once it has been
    /// accepted.
    pub fn derive(
        &self,
        name: impl Into<String>,
        image: &RgbImage,
    ) -> Result<ArtifactSet, PipelineError> {
        let name = name.into();
        let filtered = self.filters.apply(image);
        let rectified =
            self.rectifier
                .rectify(&filtered, self.calibration.as_ref(), self.use_calibration)?;
        let comparison = comparison(image, &rectified)?;
        let slice = slice_bottom(&rectified, &self.options.slice);

        let period = self.stack_period();
        let position = self.processed + 1;
        let stacked = if position % period == 0 && self.window.len() + 1 >= period {
            let older = self.window.iter().skip(self.window.len() + 1 - period);
            Some(stack(older.chain(iter::once(&slice)))?)
        } else {
            None
        };
        debug!(
            "{name}: rectified {}x{}, slice {}x{}{}",
            rectified.width(),
            rectified.height(),
            slice.width(),
            slice.height(),
            if stacked.is_some() { ", stacked" } else { "" }
        );

        Ok(ArtifactSet {
            name,
            filtered,
            rectified,
            comparison,
            slice,
            stacked,
        })
    }

    /// Advance the stream past `set`, making its slice part of later stacks.
    pub fn commit(&mut self, set: &ArtifactSet) {
        self.window.push(set.slice.clone());
        self.processed += 1;
    }

    /// Derive and commit the next image in the stream.
    ///
    /// A failed image leaves the window and the position counter untouched.
    pub fn process_one(
        &mut self,
        name: impl Into<String>,
        image: &RgbImage,
    ) -> Result<ArtifactSet, PipelineError> {
        let set = self.derive(name, image)?;
        self.commit(&set);
        Ok(set)
    }

    /// Process `images` in order, stopping at the first failure.
    pub fn process<I, S>(&mut self, images: I) -> Result<Vec<ArtifactSet>, PipelineError>
    where
        I: IntoIterator<Item = (S, RgbImage)>,
        S: Into<String>,
    {
        images
            .into_iter()
            .map(|(name, image)| self.process_one(name, &image))
            .collect()
    }
}
