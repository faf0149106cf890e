//! Gradient key for the heatmap: a vertical bar running from the start color
//! (domain minimum, bottom) to the end color (domain maximum, top) with a
//! numeric axis on its right edge.

use plotters::style::RGBColor;
use svg::node::element::{Definitions, Group, Line, LinearGradient, Rectangle, Stop, Text};
use tracing::debug;

use crate::color::to_hex;
use crate::models::{ColorStop, Layout};
use crate::render::surface::Surface;
use crate::scales::{format_ticks, gradient_color, ColorScale, LinearScale};

const TICK_SIZE: f64 = 6.0;
const TICK_PADDING: f64 = 3.0;
const TICK_COUNT: usize = 10;

/// Resolved legend geometry. Built from the grid's [`ColorScale`] so the two
/// always show the same color for the same value.
#[derive(Debug, Clone, PartialEq)]
pub struct Legend {
    stops: [ColorStop; 2],
    axis: LinearScale,
    ticks: Vec<f64>,
    bar_width: f64,
    bar_height: f64,
    top: f64,
}

impl Legend {
    pub fn new(colors: &ColorScale, layout: &Layout) -> Self {
        let axis = LinearScale::new(colors.domain(), (layout.height, 0.0));
        Self {
            stops: colors.stops(),
            ticks: axis.ticks(TICK_COUNT),
            axis,
            bar_width: (layout.legend_width / 2.0 - 10.0).max(0.0),
            bar_height: layout.height,
            top: layout.margin.top,
        }
    }

    pub fn ticks(&self) -> &[f64] {
        &self.ticks
    }

    pub fn bar_size(&self) -> (f64, f64) {
        (self.bar_width, self.bar_height)
    }

    /// Horizontal position of the axis line, one pixel past the bar.
    pub fn axis_offset(&self) -> f64 {
        self.bar_width + 1.0
    }

    /// Vertical pixel (relative to the bar top) where `value` sits.
    pub fn position(&self, value: f64) -> f64 {
        self.axis.map(value)
    }

    /// Color the gradient shows for `value`.
    pub fn color_at(&self, value: f64) -> RGBColor {
        gradient_color(&self.stops, value)
    }

    pub fn top_color(&self) -> RGBColor {
        self.stops[1].color
    }

    pub fn bottom_color(&self) -> RGBColor {
        self.stops[0].color
    }
}

/// `<container>-gradient`, with every byte outside `[A-Za-z0-9-]` written as
/// `_xx` hex. `_` itself is escaped, so distinct containers get distinct ids.
fn gradient_id(container: &str) -> String {
    let mut id = String::with_capacity(container.len() + 9);
    for byte in container.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            id.push(byte as char);
        } else {
            id.push_str(&format!("_{byte:02x}"));
        }
    }
    id.push_str("-gradient");
    id
}

/// Append the gradient bar and its axis to `surface`.
pub fn draw_legend(surface: &mut Surface, legend: &Legend) {
    let id = gradient_id(surface.container());
    debug!(
        "Drawing legend '{}' with {} ticks over {:?}",
        surface.container(),
        legend.ticks.len(),
        legend.axis.domain()
    );

    // offset 0% is the top of the bar
    let gradient = LinearGradient::new()
        .set("id", id.as_str())
        .set("x1", "100%")
        .set("y1", "0%")
        .set("x2", "100%")
        .set("y2", "100%")
        .set("spreadMethod", "pad")
        .add(
            Stop::new()
                .set("offset", "0%")
                .set("stop-color", to_hex(legend.top_color()))
                .set("stop-opacity", 1),
        )
        .add(
            Stop::new()
                .set("offset", "100%")
                .set("stop-color", to_hex(legend.bottom_color()))
                .set("stop-opacity", 1),
        );

    let bar = Rectangle::new()
        .set("width", legend.bar_width)
        .set("height", legend.bar_height)
        .set("fill", format!("url(#{id})"))
        .set("transform", format!("translate(0,{})", legend.top));

    let mut axis = Group::new()
        .set("class", "y axis")
        .set("transform", format!("translate({},{})", legend.axis_offset(), legend.top))
        .set("fill", "none")
        .set("text-anchor", "start")
        .add(
            Line::new()
                .set("class", "domain")
                .set("x1", 0)
                .set("y1", legend.bar_height)
                .set("x2", 0)
                .set("y2", 0)
                .set("stroke", "currentColor"),
        );

    let labels = format_ticks(&legend.ticks);
    for (value, label) in legend.ticks.iter().zip(labels) {
        axis = axis.add(
            Group::new()
                .set("class", "tick")
                .set("transform", format!("translate(0,{})", legend.position(*value)))
                .add(Line::new().set("x2", TICK_SIZE).set("stroke", "currentColor"))
                .add(
                    Text::new(label)
                        .set("x", TICK_SIZE + TICK_PADDING)
                        .set("dy", ".32em")
                        .set("fill", "currentColor"),
                ),
        );
    }

    surface.append(
        Group::new()
            .set("class", "legend")
            .add(Definitions::new().add(gradient))
            .add(bar)
            .add(axis),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConfusionMatrix;
    use crate::render::grid::Grid;

    const START: RGBColor = RGBColor(255, 255, 255);
    const END: RGBColor = RGBColor(0xe6, 0x7e, 0x22);

    fn golden() -> (ConfusionMatrix, ColorScale) {
        let matrix = ConfusionMatrix::new(vec![vec![169, 10], vec![7, 46]]).unwrap();
        let colors = ColorScale::for_matrix(&matrix, START, END);
        (matrix, colors)
    }

    #[test]
    fn legend_and_grid_agree_on_every_value() {
        let (matrix, colors) = golden();
        let layout = Layout::default();
        let grid = Grid::new(&matrix, &layout, colors);
        let legend = Legend::new(&colors, &layout);

        for v in 0..=200u64 {
            assert_eq!(legend.color_at(v as f64), grid.fill(v), "value {v}");
        }
    }

    #[test]
    fn end_color_on_top_and_max_at_top() {
        let (_, colors) = golden();
        let legend = Legend::new(&colors, &Layout::default());
        assert_eq!(legend.top_color(), END);
        assert_eq!(legend.bottom_color(), START);
        assert_eq!(legend.position(169.0), 0.0);
        assert_eq!(legend.position(7.0), 250.0);
        assert_eq!(legend.bar_size(), (40.0, 250.0));
    }

    #[test]
    fn tick_positions_decrease_as_values_grow() {
        let (_, colors) = golden();
        let legend = Legend::new(&colors, &Layout::default());
        let positions: Vec<f64> = legend.ticks().iter().map(|t| legend.position(*t)).collect();
        assert!(positions.len() >= 2);
        assert!(positions.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn draws_gradient_bar_and_axis() {
        let (_, colors) = golden();
        let layout = Layout::default();
        let legend = Legend::new(&colors, &layout);
        let mut surface = Surface::for_legend("legend", &layout);
        draw_legend(&mut surface, &legend);

        let svg = surface.to_svg_string();
        assert!(svg.contains("linearGradient"));
        assert!(svg.contains("url(#legend-gradient)"));
        assert_eq!(svg.matches("<stop").count(), 2);
        assert_eq!(svg.matches("class=\"tick\"").count(), legend.ticks().len());
        assert_eq!(surface.size(), (100.0, 400.0));
    }

    #[test]
    fn degenerate_domain_still_draws() {
        let matrix = ConfusionMatrix::new(vec![vec![5, 5], vec![5, 5]]).unwrap();
        let colors = ColorScale::for_matrix(&matrix, START, END);
        let legend = Legend::new(&colors, &Layout::default());
        assert_eq!(legend.ticks(), &[5.0]);
        assert_eq!(legend.color_at(5.0), END);

        let mut surface = Surface::for_legend("legend", &Layout::default());
        draw_legend(&mut surface, &legend);
        assert_eq!(surface.layer_count(), 1);
    }

    #[test]
    fn gradient_ids_are_per_container() {
        assert_eq!(gradient_id("legend"), "legend-gradient");
        assert_eq!(gradient_id("#key 2"), "_23key_202-gradient");

        let containers = ["a b", "a-b", "a_b", "a_20b", "a.b", "é"];
        let ids: Vec<String> = containers.iter().map(|c| gradient_id(c)).collect();
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn axis_sits_on_bar_edge_for_any_legend_width() {
        let (_, colors) = golden();
        let default = Legend::new(&colors, &Layout::default());
        assert_eq!(default.axis_offset(), 41.0);

        let layout = Layout { legend_width: 200.0, ..Layout::default() };
        let wide = Legend::new(&colors, &layout);
        assert_eq!(wide.bar_size().0, 90.0);
        assert_eq!(wide.axis_offset(), 91.0);

        let mut surface = Surface::for_legend("legend", &layout);
        draw_legend(&mut surface, &wide);
        assert!(surface.to_svg_string().contains("translate(91,50)"));
    }
}
