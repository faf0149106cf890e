//! Error type shared by every stage of a render.

use thiserror::Error;

/// Everything that can stop a confusion-matrix render.
///
/// Shape and label problems are raised before anything is drawn, so a failed
/// render never leaves a half-finished surface behind.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Matrix is not a non-empty, square, two-dimensional array of
    /// non-negative integers.
    #[error("invalid matrix: {0}")]
    InvalidMatrix(String),

    /// Number of class labels differs from the matrix dimension.
    #[error("expected {expected} class labels, got {actual}")]
    LabelCountMismatch { expected: usize, actual: usize },

    /// Color string that is not `#rgb` or `#rrggbb`.
    #[error("invalid color {0:?}")]
    InvalidColor(String),

    /// Canvas size that is not positive, or a negative margin.
    #[error("invalid layout: {0}")]
    InvalidLayout(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Rasterising an SVG document failed.
    #[error("export error: {0}")]
    Export(String),
}

pub type Result<T> = std::result::Result<T, RenderError>;
