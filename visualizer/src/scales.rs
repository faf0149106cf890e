//! Index → pixel, value → color and value → pixel mappings shared by the grid
//! and the legend.

use plotters::coord::ranged1d::Ranged;
use plotters::coord::types::RangedCoordf64;
use plotters::style::RGBColor;

use crate::color::interpolate;
use crate::models::{ColorStop, ConfusionMatrix};

/// Splits `[0, extent]` into `count` equal, unpadded bands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandScale {
    count: usize,
    extent: f64,
}

impl BandScale {
    pub fn new(count: usize, extent: f64) -> Self {
        Self { count, extent }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn bandwidth(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.extent / self.count as f64
    }

    /// Start offset of band `index`, `None` outside the domain.
    pub fn position(&self, index: usize) -> Option<f64> {
        (index < self.count).then(|| index as f64 * self.bandwidth())
    }
}

/// Two-stop linear gradient over the matrix value range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    min: f64,
    max: f64,
    start: RGBColor,
    end: RGBColor,
}

impl ColorScale {
    pub fn new(min: f64, max: f64, start: RGBColor, end: RGBColor) -> Self {
        Self { min, max, start, end }
    }

    /// Domain is the global minimum and maximum over all cells.
    pub fn for_matrix(matrix: &ConfusionMatrix, start: RGBColor, end: RGBColor) -> Self {
        Self::new(matrix.min_value() as f64, matrix.max_value() as f64, start, end)
    }

    pub fn domain(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    pub fn is_degenerate(&self) -> bool {
        self.min == self.max
    }

    pub fn stops(&self) -> [ColorStop; 2] {
        [
            ColorStop { value: self.min, color: self.start },
            ColorStop { value: self.max, color: self.end },
        ]
    }

    /// Every value maps to the end color when the domain is a single point.
    pub fn color(&self, value: f64) -> RGBColor {
        gradient_color(&self.stops(), value)
    }
}

/// Color at `value` on the gradient spanned by two stops.
pub(crate) fn gradient_color(stops: &[ColorStop; 2], value: f64) -> RGBColor {
    let [from, to] = stops;
    if from.value == to.value {
        return to.color;
    }
    interpolate(from.color, to.color, (value - from.value) / (to.value - from.value))
}

/// Continuous value → pixel mapping. The range may be inverted, as on a
/// vertical axis where larger values sit higher.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    /// A degenerate domain maps everything to the middle of the range.
    pub fn map(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if d0 == d1 {
            return (r0 + r1) / 2.0;
        }
        r0 + (value - d0) / (d1 - d0) * (r1 - r0)
    }

    pub fn invert(&self, pixel: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if r0 == r1 {
            return d0;
        }
        d0 + (pixel - r0) / (r1 - r0) * (d1 - d0)
    }

    /// Human-readable ticks inside the domain, at most `count` of them.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (lo, hi) = (self.domain.0.min(self.domain.1), self.domain.0.max(self.domain.1));
        if lo == hi {
            return vec![lo];
        }
        let slack = (hi - lo) * 1e-9;
        let coord: RangedCoordf64 = (lo..hi).into();
        coord
            .key_points(count.max(2))
            .into_iter()
            .filter(|v| *v >= lo - slack && *v <= hi + slack)
            .collect()
    }
}

/// Labels for a set of ticks, using just enough decimals to tell
/// neighbouring ticks apart.
pub fn format_ticks(ticks: &[f64]) -> Vec<String> {
    let step = ticks
        .windows(2)
        .map(|w| (w[1] - w[0]).abs())
        .fold(f64::INFINITY, f64::min);

    let decimals = if step.is_finite() && step > 0.0 && step < 1.0 {
        (-step.log10() - 1e-9).ceil().clamp(0.0, 10.0) as usize
    } else if !step.is_finite() && ticks.iter().any(|t| t.fract() != 0.0) {
        2
    } else {
        0
    };

    ticks.iter().map(|t| format!("{:.*}", decimals, t)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: RGBColor = RGBColor(255, 255, 255);
    const ORANGE: RGBColor = RGBColor(0xe6, 0x7e, 0x22);

    #[test]
    fn band_width_divides_extent() {
        let x = BandScale::new(2, 250.0);
        assert_eq!(x.bandwidth(), 125.0);
        assert_eq!(x.position(0), Some(0.0));
        assert_eq!(x.position(1), Some(125.0));
        assert_eq!(x.position(2), None);
    }

    #[test]
    fn bands_are_contiguous_and_cover_extent() {
        for k in 1..=12 {
            let scale = BandScale::new(k, 250.0);
            let bw = scale.bandwidth();
            assert!((bw - 250.0 / k as f64).abs() < 1e-12);

            let mut covered = 0.0;
            for i in 0..k {
                let start = scale.position(i).unwrap();
                assert!((start - covered).abs() < 1e-9, "gap before band {i} of {k}");
                covered = start + bw;
            }
            assert!((covered - 250.0).abs() < 1e-9);
        }
    }

    #[test]
    fn empty_band_scale_has_no_positions() {
        let scale = BandScale::new(0, 100.0);
        assert_eq!(scale.bandwidth(), 0.0);
        assert_eq!(scale.position(0), None);
    }

    #[test]
    fn color_scale_endpoints_round_trip() {
        let scale = ColorScale::new(7.0, 169.0, WHITE, ORANGE);
        assert_eq!(scale.color(7.0), WHITE);
        assert_eq!(scale.color(169.0), ORANGE);
        assert!(!scale.is_degenerate());
    }

    #[test]
    fn color_scale_interpolates_linearly() {
        let scale = ColorScale::new(0.0, 100.0, RGBColor(0, 0, 0), RGBColor(200, 100, 40));
        assert_eq!(scale.color(50.0), RGBColor(100, 50, 20));
        assert_eq!(scale.color(25.0), RGBColor(50, 25, 10));
    }

    #[test]
    fn degenerate_domain_maps_to_end_color() {
        let cm = ConfusionMatrix::new(vec![vec![5, 5], vec![5, 5]]).unwrap();
        let scale = ColorScale::for_matrix(&cm, WHITE, ORANGE);
        assert!(scale.is_degenerate());
        for row in cm.rows() {
            for &v in row {
                assert_eq!(scale.color(v as f64), ORANGE);
            }
        }
    }

    #[test]
    fn inverted_axis_puts_max_on_top() {
        let axis = LinearScale::new((7.0, 169.0), (250.0, 0.0));
        assert_eq!(axis.map(7.0), 250.0);
        assert_eq!(axis.map(169.0), 0.0);
        assert!((axis.invert(axis.map(88.0)) - 88.0).abs() < 1e-9);
    }

    #[test]
    fn ticks_are_sorted_and_inside_domain() {
        let axis = LinearScale::new((7.0, 169.0), (250.0, 0.0));
        let ticks = axis.ticks(10);
        assert!(ticks.len() >= 2 && ticks.len() <= 10, "{ticks:?}");
        assert!(ticks.windows(2).all(|w| w[0] < w[1]));
        assert!(ticks.iter().all(|t| *t >= 7.0 - 1e-6 && *t <= 169.0 + 1e-6));
    }

    #[test]
    fn degenerate_axis_has_single_tick() {
        let axis = LinearScale::new((5.0, 5.0), (250.0, 0.0));
        assert_eq!(axis.ticks(10), vec![5.0]);
        assert_eq!(axis.map(5.0), 125.0);
    }

    #[test]
    fn tick_labels_use_step_precision() {
        assert_eq!(format_ticks(&[20.0, 40.0, 60.0]), vec!["20", "40", "60"]);
        assert_eq!(format_ticks(&[0.1, 0.2, 0.30000000000000004]), vec!["0.1", "0.2", "0.3"]);
        assert_eq!(format_ticks(&[5.0]), vec!["5"]);
    }
}
