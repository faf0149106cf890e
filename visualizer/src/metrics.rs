//! Classification metrics derived from a confusion matrix.
//!
//! A 2x2 matrix is read as `[[tp, fn], [fp, tn]]` with class 0 as the positive
//! class. Larger matrices are reduced one class at a time (one-vs-rest) and
//! the overall record is the macro average of the per-class values.

use serde_json::{Map, Number, Value};
use tracing::debug;

use crate::helper_functions::round_to;
use crate::models::{ConfusionMatrix, Metrics};

/// Column order of the metrics table.
pub const METRIC_COLUMNS: [&str; 4] = ["F1", "PRECISION", "RECALL", "ACCURACY"];

/// Binary outcome counts for one positive class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryCounts {
    pub tp: u64,
    pub fn_: u64,
    pub fp: u64,
    pub tn: u64,
}

impl BinaryCounts {
    /// Treat `class` as positive and every other class as negative.
    pub fn one_vs_rest(matrix: &ConfusionMatrix, class: usize) -> Self {
        let n = matrix.dimension();
        let tp = matrix.get(class, class);
        let fn_: u64 = (0..n).filter(|&j| j != class).map(|j| matrix.get(class, j)).sum();
        let fp: u64 = (0..n).filter(|&i| i != class).map(|i| matrix.get(i, class)).sum();
        let tn = matrix.total() - tp - fn_ - fp;
        Self { tp, fn_, fp, tn }
    }
}

fn ratio(numerator: u128, denominator: u128) -> f64 {
    if denominator == 0 {
        return f64::NAN;
    }
    numerator as f64 / denominator as f64
}

/// JSON form of a metric; NaN becomes `null`.
pub fn metric_value(value: f64) -> Value {
    Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
}

fn round_metric(value: f64) -> f64 {
    // NaN passes through unrounded
    round_to(value, 2)
}

impl Metrics {
    /// Unrounded metrics; a zero denominator yields NaN for that metric only.
    pub fn raw_from_counts(c: BinaryCounts) -> Self {
        // widened so that 2 * tp and the sums cannot overflow
        let (tp, fn_, fp, tn) = (
            u128::from(c.tp),
            u128::from(c.fn_),
            u128::from(c.fp),
            u128::from(c.tn),
        );
        let p = tp + fn_;
        let n = fp + tn;
        Self {
            accuracy: ratio(tp + tn, p + n),
            precision: ratio(tp, tp + fp),
            recall: ratio(tp, tp + fn_),
            f1: ratio(2 * tp, 2 * tp + fp + fn_),
        }
    }

    pub fn from_counts(c: BinaryCounts) -> Self {
        Self::raw_from_counts(c).rounded()
    }

    pub fn rounded(self) -> Self {
        Self {
            accuracy: round_metric(self.accuracy),
            precision: round_metric(self.precision),
            recall: round_metric(self.recall),
            f1: round_metric(self.f1),
        }
    }

    pub fn is_defined(&self) -> bool {
        [self.accuracy, self.precision, self.recall, self.f1]
            .iter()
            .all(|v| !v.is_nan())
    }

    /// Row record keyed by [`METRIC_COLUMNS`].
    pub fn to_record(&self) -> Map<String, Value> {
        let mut record = Map::new();
        record.insert("F1".into(), metric_value(self.f1));
        record.insert("PRECISION".into(), metric_value(self.precision));
        record.insert("RECALL".into(), metric_value(self.recall));
        record.insert("ACCURACY".into(), metric_value(self.accuracy));
        record
    }
}

/// Metrics for the whole matrix.
///
/// Up to 2x2 this is the binary calculation with class 0 positive. Beyond
/// that, accuracy is `trace / total` and precision, recall and F1 are macro
/// averages of the unrounded one-vs-rest values.
pub fn compute_metrics(matrix: &ConfusionMatrix) -> Metrics {
    if matrix.dimension() <= 2 {
        let counts = BinaryCounts::one_vs_rest(matrix, 0);
        debug!(?counts, "binary confusion counts");
        return Metrics::from_counts(counts);
    }

    let per_class: Vec<Metrics> = (0..matrix.dimension())
        .map(|c| Metrics::raw_from_counts(BinaryCounts::one_vs_rest(matrix, c)))
        .collect();
    let k = per_class.len() as f64;
    let mean = |f: fn(&Metrics) -> f64| per_class.iter().map(f).sum::<f64>() / k;

    Metrics {
        accuracy: ratio(matrix.trace().into(), matrix.total().into()),
        precision: mean(|m| m.precision),
        recall: mean(|m| m.recall),
        f1: mean(|m| m.f1),
    }
    .rounded()
}

/// Rounded one-vs-rest metrics for every class, in row order.
pub fn per_class_metrics(matrix: &ConfusionMatrix) -> Vec<Metrics> {
    (0..matrix.dimension())
        .map(|c| Metrics::from_counts(BinaryCounts::one_vs_rest(matrix, c)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cm(rows: Vec<Vec<u64>>) -> ConfusionMatrix {
        ConfusionMatrix::new(rows).unwrap()
    }

    #[test]
    fn golden_binary_matrix() {
        let m = compute_metrics(&cm(vec![vec![169, 10], vec![7, 46]]));
        // 215 / 232 = 0.9267
        assert_eq!(m.accuracy, 0.93);
        assert_eq!(m.precision, 0.96);
        assert_eq!(m.recall, 0.94);
        assert_eq!(m.f1, 0.95);
    }

    #[test]
    fn binary_counts_follow_cell_convention() {
        let counts = BinaryCounts::one_vs_rest(&cm(vec![vec![169, 10], vec![7, 46]]), 0);
        assert_eq!(counts, BinaryCounts { tp: 169, fn_: 10, fp: 7, tn: 46 });
    }

    #[test]
    fn uniform_matrix_gives_one_half() {
        let m = compute_metrics(&cm(vec![vec![5, 5], vec![5, 5]]));
        assert_eq!(m, Metrics { accuracy: 0.5, precision: 0.5, recall: 0.5, f1: 0.5 });
    }

    #[test]
    fn metrics_stay_in_unit_interval() {
        for tp in 0..6u64 {
            for fn_ in 0..6u64 {
                for fp in 0..6u64 {
                    for tn in 0..6u64 {
                        if tp == 0 {
                            continue;
                        }
                        let m = Metrics::from_counts(BinaryCounts { tp, fn_, fp, tn });
                        for v in [m.accuracy, m.precision, m.recall, m.f1] {
                            assert!((0.0..=1.0).contains(&v), "{tp} {fn_} {fp} {tn} -> {m:?}");
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn zero_denominators_yield_nan_per_metric() {
        let empty = compute_metrics(&cm(vec![vec![0, 0], vec![0, 0]]));
        assert!(empty.accuracy.is_nan());
        assert!(empty.precision.is_nan());
        assert!(empty.recall.is_nan());
        assert!(empty.f1.is_nan());
        assert!(!empty.is_defined());

        // no predicted positives: precision undefined, the rest defined
        let m = compute_metrics(&cm(vec![vec![0, 3], vec![0, 4]]));
        assert!(m.precision.is_nan());
        assert_eq!(m.recall, 0.0);
        assert_eq!(m.f1, 0.0);
        assert_eq!(m.accuracy, 0.57);
    }

    #[test]
    fn nan_metric_becomes_null_in_record() {
        let record = compute_metrics(&cm(vec![vec![0, 3], vec![0, 4]])).to_record();
        assert_eq!(record["PRECISION"], Value::Null);
        assert_eq!(record["ACCURACY"], serde_json::json!(0.57));
        let keys: Vec<&str> = record.keys().map(String::as_str).collect();
        for col in METRIC_COLUMNS {
            assert!(keys.contains(&col));
        }
    }

    #[test]
    fn multiclass_uses_macro_average() {
        let matrix = cm(vec![vec![5, 0, 0], vec![0, 3, 2], vec![0, 1, 4]]);
        let m = compute_metrics(&matrix);
        // accuracy 12/15, precision (1 + .75 + .6667)/3, recall (1 + .6 + .8)/3
        assert_eq!(m.accuracy, 0.8);
        assert_eq!(m.precision, 0.81);
        assert_eq!(m.recall, 0.8);

        let per_class = per_class_metrics(&matrix);
        assert_eq!(per_class.len(), 3);
        assert_eq!(per_class[0].f1, 1.0);
        assert_eq!(per_class[1].precision, 0.75);
        assert_eq!(per_class[2].recall, 0.8);
    }

    #[test]
    fn counts_near_u64_max_do_not_overflow() {
        let m = compute_metrics(&cm(vec![vec![u64::MAX - 1, 1], vec![0, 0]]));
        assert_eq!(m.accuracy, 1.0);
        assert_eq!(m.precision, 1.0);
        assert_eq!(m.recall, 1.0);
        assert_eq!(m.f1, 1.0);

        let wide = cm(vec![
            vec![u64::MAX / 4, 0, 1],
            vec![0, u64::MAX / 4, 0],
            vec![1, 0, u64::MAX / 4],
        ]);
        let m = compute_metrics(&wide);
        assert_eq!(m.accuracy, 1.0);
        assert_eq!(per_class_metrics(&wide).len(), 3);
    }

    #[test]
    fn one_vs_rest_counts_sum_to_total() {
        let matrix = cm(vec![vec![5, 1, 0], vec![2, 3, 2], vec![0, 1, 4]]);
        for c in 0..3 {
            let b = BinaryCounts::one_vs_rest(&matrix, c);
            assert_eq!(b.tp + b.fn_ + b.fp + b.tn, matrix.total());
        }
    }
}
