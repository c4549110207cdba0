//! Batch processing of pavement image sequences.
//!
//! The [`BatchCompositor`] runs every image through the cosmetic filters and
//! the [`pave_rectify::Rectifier`], and derives the per-image artifacts:
//! a side-by-side comparison, the bottom slice, and every `stack_every`-th
//! image a vertical stack of the most recent slices.
//!
//! The rest of the crate is the file-level plumbing around it: image
//! discovery, decoding and encoding, the on-disk output layout, the run
//! configuration and [`run_pipeline`], which ties it all together.

pub mod codec;
pub mod compose;
pub mod compositor;
pub mod config;
pub mod discovery;
pub mod error;
pub mod filters;
pub mod layout;
pub mod runner;
pub mod window;

pub use compositor::{ArtifactSet, BatchCompositor};
pub use config::{CompositorOptions, PipelineConfig, SliceConfig};
pub use discovery::discover_images;
pub use error::PipelineError;
pub use filters::{Filter, FilterConfig};
pub use layout::OutputLayout;
pub use runner::{calibrate_directory, run_pipeline, ErrorPolicy, RunSummary};
pub use window::SliceWindow;
