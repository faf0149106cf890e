//! Confusion-matrix heatmap with a color legend and a metrics table.
//!
//! [`report::render_report`] drives the whole pipeline: it computes the
//! metrics, builds the shared color scale, draws the grid and legend onto SVG
//! surfaces and renders the metrics table.

pub mod color;
pub mod error;
pub mod helper_functions;
pub mod metrics;
pub mod models;
pub mod render;
pub mod report;
pub mod scales;

#[cfg(feature = "png_export")]
pub mod export;

pub use error::{RenderError, Result};
pub use metrics::compute_metrics;
pub use models::{ClassLabels, ConfusionMatrix, Layout, Margin, Metrics};
pub use report::{render_report, render_to_dir, MatrixOptions, RenderedReport, ReportConfig};
pub use scales::ColorScale;
