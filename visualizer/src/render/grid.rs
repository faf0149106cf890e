//! Heatmap grid: one colored cell per matrix entry, count labels, and class
//! names along the left and bottom edges.

use plotters::style::{RGBColor, BLACK, WHITE};
use svg::node::element::{Group, Line, Rectangle, Text};
use tracing::debug;

use crate::color::to_hex;
use crate::error::Result;
use crate::models::{CellGeometry, ClassLabels, ConfusionMatrix, Layout};
use crate::render::surface::Surface;
use crate::scales::{BandScale, ColorScale};

const TICK_LENGTH: f64 = 5.0;
const COLUMN_LABEL_ANGLE: f64 = -60.0;

/// Scales resolved for one matrix on one canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    x: BandScale,
    y: BandScale,
    colors: ColorScale,
    max_value: f64,
}

impl Grid {
    pub fn new(matrix: &ConfusionMatrix, layout: &Layout, colors: ColorScale) -> Self {
        let n = matrix.dimension();
        Self {
            x: BandScale::new(n, layout.width),
            y: BandScale::new(n, layout.height),
            colors,
            max_value: matrix.max_value() as f64,
        }
    }

    pub fn x(&self) -> &BandScale {
        &self.x
    }

    pub fn y(&self) -> &BandScale {
        &self.y
    }

    pub fn colors(&self) -> &ColorScale {
        &self.colors
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<CellGeometry> {
        let x = self.x.position(col)?;
        let y = self.y.position(row)?;
        let (width, height) = (self.x.bandwidth(), self.y.bandwidth());
        Some(CellGeometry {
            x,
            y,
            width,
            height,
            text_x: x + width / 2.0,
            text_y: y + height / 2.0,
        })
    }

    pub fn fill(&self, value: u64) -> RGBColor {
        self.colors.color(value as f64)
    }

    /// White on the darker upper half of the value range, black below it.
    pub fn text_color(&self, value: u64) -> RGBColor {
        if value as f64 >= self.max_value / 2.0 {
            WHITE
        } else {
            BLACK
        }
    }
}

fn translate(x: f64, y: f64) -> String {
    format!("translate({x},{y})")
}

fn tick(x1: f64, y1: f64, x2: f64, y2: f64) -> Line {
    Line::new()
        .set("x1", x1)
        .set("y1", y1)
        .set("x2", x2)
        .set("y2", y2)
        .set("style", "stroke: black; stroke-width: 1px")
}

/// Append one complete rendering of `matrix` to `surface`.
///
/// Nothing is drawn when the labels do not fit the matrix. Calling this twice
/// on the same surface stacks two renderings; clear the surface first to
/// replace one.
pub fn draw_grid(
    surface: &mut Surface,
    matrix: &ConfusionMatrix,
    labels: &ClassLabels,
    colors: &ColorScale,
    layout: &Layout,
) -> Result<Grid> {
    labels.check_against(matrix)?;

    let grid = Grid::new(matrix, layout, *colors);
    let (bw, bh) = (grid.x.bandwidth(), grid.y.bandwidth());
    debug!(
        "Drawing {n}x{n} grid on '{}' with {bw:.1}x{bh:.1} px cells",
        surface.container(),
        n = matrix.dimension()
    );

    let mut root = Group::new()
        .set("transform", translate(layout.margin.left, layout.margin.top))
        .add(
            Rectangle::new()
                .set("class", "background")
                .set("width", layout.width)
                .set("height", layout.height)
                .set("fill", "none")
                .set("style", "stroke: black; stroke-width: 2px"),
        );

    for (r, values) in matrix.rows().iter().enumerate() {
        let mut row = Group::new()
            .set("class", "row")
            .set("transform", translate(0.0, grid.y.position(r).unwrap_or_default()));

        for (c, &value) in values.iter().enumerate() {
            let cell = Group::new()
                .set("class", "cell")
                .set("transform", translate(grid.x.position(c).unwrap_or_default(), 0.0))
                .add(
                    Rectangle::new()
                        .set("width", bw)
                        .set("height", bh)
                        .set("fill", to_hex(grid.fill(value)))
                        .set("style", "stroke-width: 0"),
                )
                .add(
                    Text::new(value.to_string())
                        .set("dy", ".32em")
                        .set("x", bw / 2.0)
                        .set("y", bh / 2.0)
                        .set("text-anchor", "middle")
                        .set("fill", to_hex(grid.text_color(value))),
                );
            row = row.add(cell);
        }
        root = root.add(row);
    }

    let mut label_layer = Group::new().set("class", "labels");

    for (i, label) in labels.iter().enumerate() {
        let x = grid.x.position(i).unwrap_or_default();
        label_layer = label_layer.add(
            Group::new()
                .set("class", "column-label")
                .set("transform", translate(x, layout.height))
                .add(tick(bw / 2.0, 0.0, bw / 2.0, TICK_LENGTH))
                .add(
                    Text::new(label.as_str())
                        .set("x", 30)
                        .set("y", bh / 2.0)
                        .set("dy", ".22em")
                        .set("text-anchor", "end")
                        .set("transform", format!("rotate({COLUMN_LABEL_ANGLE})")),
                ),
        );
    }

    for (i, label) in labels.iter().enumerate() {
        let y = grid.y.position(i).unwrap_or_default();
        label_layer = label_layer.add(
            Group::new()
                .set("class", "row-label")
                .set("transform", translate(0.0, y))
                .add(tick(0.0, bh / 2.0, -TICK_LENGTH, bh / 2.0))
                .add(
                    Text::new(label.as_str())
                        .set("x", -8)
                        .set("y", bh / 2.0)
                        .set("dy", ".32em")
                        .set("text-anchor", "end"),
                ),
        );
    }

    surface.append(root.add(label_layer));
    Ok(grid)
}
