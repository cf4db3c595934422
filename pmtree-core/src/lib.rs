//! Parametric 2-D tree generator with shape-descriptor statistics.
//!
//! Main components:
//! - [`params`] — the 19-field parameter record, sampling and clamping.
//! - [`shape`] — silhouette and taper functions.
//! - [`pose`] — the drawing cursor and emitted quads.
//! - [`generator`] — stem / segment recursion.
//! - [`stats`] — density and curvature grids, histograms, export vectors.
//! - [`tree`] — [`tree::TreeModel`], the entry point tying the above together.
//! - [`sampler`] — reject-and-resample loop over seeds.
//! - [`record`] — text form of persisted samples.
//! - [`config`] — fixed generation settings.
//! - [`error`] — error types.

pub mod config;
pub mod error;
pub mod generator;
pub mod params;
pub mod pose;
pub mod record;
pub mod sampler;
pub mod shape;
pub mod stats;
pub mod tree;

pub use params::TreeParameters;
pub use stats::StatisticsKind;
pub use tree::TreeModel;
