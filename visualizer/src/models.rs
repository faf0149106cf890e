use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RenderError, Result};

const SHAPE_RULE: &str =
    "must be a non-empty square two-dimensional array of non-negative integers";

/// Square grid of counts: `rows[actual][predicted]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConfusionMatrix {
    rows: Vec<Vec<u64>>,
    #[serde(skip)]
    total: u64,
}

impl ConfusionMatrix {
    /// Validate and wrap a row-major grid.
    pub fn new(rows: Vec<Vec<u64>>) -> Result<Self> {
        if rows.is_empty() || rows[0].is_empty() {
            return Err(RenderError::InvalidMatrix(format!("matrix is empty; {SHAPE_RULE}")));
        }
        let width = rows[0].len();
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(RenderError::InvalidMatrix(format!(
                "row {i} has {} columns but row 0 has {width}; {SHAPE_RULE}",
                row.len()
            )));
        }
        if width != rows.len() {
            return Err(RenderError::InvalidMatrix(format!(
                "matrix is {}x{width}; {SHAPE_RULE}",
                rows.len()
            )));
        }
        // every row, column and diagonal sum is bounded by the total
        let total = rows
            .iter()
            .flatten()
            .try_fold(0u64, |acc, &v| acc.checked_add(v))
            .ok_or_else(|| {
                RenderError::InvalidMatrix(format!("sum of all cells exceeds {}", u64::MAX))
            })?;
        Ok(Self { rows, total })
    }

    /// Validate an untyped JSON array of arrays, as found in config files.
    pub fn from_json(value: &Value) -> Result<Self> {
        let outer = value.as_array().ok_or_else(|| {
            RenderError::InvalidMatrix(format!("expected an array of rows; {SHAPE_RULE}"))
        })?;

        let mut rows = Vec::with_capacity(outer.len());
        for (i, row) in outer.iter().enumerate() {
            let cells = row.as_array().ok_or_else(|| {
                RenderError::InvalidMatrix(format!("row {i} is not an array; {SHAPE_RULE}"))
            })?;
            let parsed = cells
                .iter()
                .enumerate()
                .map(|(j, cell)| {
                    cell.as_u64().ok_or_else(|| {
                        RenderError::InvalidMatrix(format!(
                            "cell [{i}][{j}] = {cell} is not a count; {SHAPE_RULE}"
                        ))
                    })
                })
                .collect::<Result<Vec<u64>>>()?;
            rows.push(parsed);
        }
        Self::new(rows)
    }

    /// Built-in matrices that are known to satisfy the shape rule.
    pub(crate) fn from_validated(rows: Vec<Vec<u64>>) -> Self {
        debug_assert!(Self::new(rows.clone()).is_ok());
        let total = rows.iter().flatten().sum();
        Self { rows, total }
    }

    pub fn dimension(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Vec<u64>] {
        &self.rows
    }

    pub fn get(&self, actual: usize, predicted: usize) -> u64 {
        self.rows[actual][predicted]
    }

    pub fn min_value(&self) -> u64 {
        self.rows.iter().flatten().copied().min().unwrap_or(0)
    }

    pub fn max_value(&self) -> u64 {
        self.rows.iter().flatten().copied().max().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Sum of the diagonal (correct predictions).
    pub fn trace(&self) -> u64 {
        (0..self.dimension()).map(|i| self.rows[i][i]).sum()
    }

    /// Samples whose actual class is `class`.
    pub fn support(&self, class: usize) -> u64 {
        self.rows[class].iter().sum()
    }
}

/// Class names; index `i` labels row `i` and column `i`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassLabels(pub Vec<String>);

impl ClassLabels {
    pub fn new<S: Into<String>>(labels: impl IntoIterator<Item = S>) -> Self {
        Self(labels.into_iter().map(Into::into).collect())
    }

    /// Fails unless there is exactly one label per matrix row.
    pub fn check_against(&self, matrix: &ConfusionMatrix) -> Result<()> {
        if self.0.len() != matrix.dimension() {
            return Err(RenderError::LabelCountMismatch {
                expected: matrix.dimension(),
                actual: self.0.len(),
            });
        }
        Ok(())
    }
}

impl std::ops::Deref for ClassLabels {
    type Target = [String];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Derived classification metrics, each rounded to 2 decimals or NaN when
/// its denominator is zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// One end of a two-stop linear gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub value: f64,
    pub color: RGBColor,
}

/// Pixel rectangle of one grid cell plus the anchor of its count label,
/// relative to the grid origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellGeometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub text_x: f64,
    pub text_y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margin {
    fn default() -> Self {
        Self { top: 50.0, right: 50.0, bottom: 100.0, left: 100.0 }
    }
}

/// Canvas size of the grid (margins excluded) and the legend strip width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub width: f64,
    pub height: f64,
    pub margin: Margin,
    pub legend_width: f64,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            width: 250.0,
            height: 250.0,
            margin: Margin::default(),
            legend_width: 100.0,
        }
    }
}

impl Layout {
    /// Canvas sizes must be finite and positive, margins finite and
    /// non-negative.
    pub fn validate(&self) -> Result<()> {
        let sizes = [
            ("width", self.width),
            ("height", self.height),
            ("legend_width", self.legend_width),
        ];
        for (name, value) in sizes {
            if !value.is_finite() || value <= 0.0 {
                return Err(RenderError::InvalidLayout(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        let margins = [
            ("margin.top", self.margin.top),
            ("margin.right", self.margin.right),
            ("margin.bottom", self.margin.bottom),
            ("margin.left", self.margin.left),
        ];
        for (name, value) in margins {
            if !value.is_finite() || value < 0.0 {
                return Err(RenderError::InvalidLayout(format!(
                    "{name} must be zero or more, got {value}"
                )));
            }
        }
        Ok(())
    }

    pub fn outer_width(&self) -> f64 {
        self.width + self.margin.left + self.margin.right
    }

    pub fn outer_height(&self) -> f64 {
        self.height + self.margin.top + self.margin.bottom
    }
}
