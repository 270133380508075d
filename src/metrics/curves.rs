//! Threshold curves and area under curve
//!
//! References:
//! - Davis & Goadrich (2006): The relationship between precision-recall and ROC curves
//! - Fawcett (2006): An introduction to ROC analysis

use super::Metric;
use crate::{Error, Result};

/// Points of a threshold curve, ordered as produced by the curve function.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    /// x coordinates (false positive rate, or recall).
    pub x: Vec<f64>,
    /// y coordinates (true positive rate, or precision).
    pub y: Vec<f64>,
    /// Score thresholds, one per computed point.
    pub thresholds: Vec<f64>,
}

/// Area under a curve using the trapezoidal rule.
///
/// `x` must be monotonic, either non-decreasing or non-increasing.
///
/// ```rust
/// use tsad_bench::metrics::auc;
///
/// let area = auc(&[0.0, 0.5, 1.0], &[0.0, 1.0, 1.0]).unwrap();
/// assert!((area - 0.75).abs() < 1e-12);
/// ```
///
/// # Errors
///
/// Returns `Error::Metric` for fewer than two points, mismatched lengths or
/// non-monotonic `x`.
pub fn auc(x: &[f64], y: &[f64]) -> Result<f64> {
    if x.len() != y.len() {
        return Err(Error::Metric(format!(
            "x and y must have the same length, got {} and {}",
            x.len(),
            y.len()
        )));
    }
    if x.len() < 2 {
        return Err(Error::Metric(format!(
            "at least 2 points are needed to compute area under curve, but x has {} point(s)",
            x.len()
        )));
    }

    let steps = || x.windows(2).map(|w| w[1] - w[0]);
    let direction = if steps().all(|dx| dx >= 0.0) {
        1.0
    } else if steps().all(|dx| dx <= 0.0) {
        -1.0
    } else {
        return Err(Error::Metric(
            "x is neither increasing nor decreasing".to_string(),
        ));
    };

    let area: f64 = x
        .windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[0] + ys[1]) / 2.0)
        .sum();
    Ok(direction * area)
}

/// Cumulative false and true positive counts per distinct score, high to low.
struct ClassifierCounts {
    fps: Vec<f64>,
    tps: Vec<f64>,
    thresholds: Vec<f64>,
}

fn binary_clf_curve(y_true: &[f64], y_score: &[f64]) -> ClassifierCounts {
    let mut order: Vec<usize> = (0..y_score.len()).collect();
    order.sort_by(|&a, &b| y_score[b].total_cmp(&y_score[a]));

    let mut counts = ClassifierCounts {
        fps: Vec::new(),
        tps: Vec::new(),
        thresholds: Vec::new(),
    };
    let mut tp = 0.0;
    let mut seen = 0.0;
    for (position, &index) in order.iter().enumerate() {
        seen += 1.0;
        if y_true[index] != 0.0 {
            tp += 1.0;
        }
        let last_of_value = order
            .get(position + 1)
            .map_or(true, |&next| y_score[next] != y_score[index]);
        if last_of_value {
            counts.tps.push(tp);
            counts.fps.push(seen - tp);
            counts.thresholds.push(y_score[index]);
        }
    }
    counts
}

/// Receiver operating characteristic: x = false positive rate, y = true positive rate.
///
/// # Errors
///
/// Returns `Error::Metric` if the labels contain only one class.
pub fn roc_curve(y_true: &[f64], y_score: &[f64]) -> Result<Curve> {
    let counts = binary_clf_curve(y_true, y_score);
    let total_tp = counts.tps.last().copied().unwrap_or(0.0);
    let total_fp = counts.fps.last().copied().unwrap_or(0.0);
    if total_tp == 0.0 || total_fp == 0.0 {
        return Err(Error::Metric(
            "ROC curve is undefined unless y_true contains both classes".to_string(),
        ));
    }

    let mut curve = Curve {
        x: vec![0.0],
        y: vec![0.0],
        thresholds: vec![f64::INFINITY],
    };
    curve.x.extend(counts.fps.iter().map(|fp| fp / total_fp));
    curve.y.extend(counts.tps.iter().map(|tp| tp / total_tp));
    curve.thresholds.extend(counts.thresholds);
    Ok(curve)
}

/// Precision-recall curve: x = recall (decreasing), y = precision.
///
/// The final point `(recall = 0, precision = 1)` has no threshold.
///
/// # Errors
///
/// Returns `Error::Metric` if `y_true` has no positive label.
pub fn precision_recall_curve(y_true: &[f64], y_score: &[f64]) -> Result<Curve> {
    let counts = binary_clf_curve(y_true, y_score);
    let total_tp = counts.tps.last().copied().unwrap_or(0.0);
    if total_tp == 0.0 {
        return Err(Error::Metric(
            "precision-recall curve is undefined without positive labels in y_true".to_string(),
        ));
    }

    let mut recall: Vec<f64> = counts.tps.iter().map(|tp| tp / total_tp).collect();
    let mut precision: Vec<f64> = counts
        .tps
        .iter()
        .zip(&counts.fps)
        .map(|(tp, fp)| tp / (tp + fp))
        .collect();
    let mut thresholds = counts.thresholds;

    recall.reverse();
    precision.reverse();
    thresholds.reverse();
    recall.push(0.0);
    precision.push(1.0);

    Ok(Curve {
        x: recall,
        y: precision,
        thresholds,
    })
}

/// Area under the ROC curve.
#[derive(Debug, Clone, Copy, Default)]
pub struct RocAuc;

impl Metric for RocAuc {
    fn name(&self) -> String {
        "ROC_AUC".to_string()
    }

    fn supports_continuous_scorings(&self) -> bool {
        true
    }

    fn score(&self, y_true: &[f64], y_score: &[f64]) -> Result<f64> {
        let curve = roc_curve(y_true, y_score)?;
        auc(&curve.x, &curve.y)
    }
}

/// Area under the precision-recall curve (trapezoidal).
#[derive(Debug, Clone, Copy, Default)]
pub struct PrAuc;

impl Metric for PrAuc {
    fn name(&self) -> String {
        "PR_AUC".to_string()
    }

    fn supports_continuous_scorings(&self) -> bool {
        true
    }

    fn score(&self, y_true: &[f64], y_score: &[f64]) -> Result<f64> {
        let curve = precision_recall_curve(y_true, y_score)?;
        auc(&curve.x, &curve.y)
    }
}

/// Average precision: precision weighted by recall increments over all thresholds.
#[derive(Debug, Clone, Copy, Default)]
pub struct AveragePrecision;

impl Metric for AveragePrecision {
    fn name(&self) -> String {
        "AVERAGE_PRECISION".to_string()
    }

    fn supports_continuous_scorings(&self) -> bool {
        true
    }

    fn score(&self, y_true: &[f64], y_score: &[f64]) -> Result<f64> {
        let curve = precision_recall_curve(y_true, y_score)?;
        let ap = curve
            .x
            .windows(2)
            .zip(&curve.y)
            .map(|(recall, precision)| (recall[0] - recall[1]) * precision)
            .sum();
        Ok(ap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_auc_both_directions() {
        let up = auc(&[0.0, 1.0, 2.0], &[1.0, 1.0, 3.0]).unwrap();
        assert!((up - 3.0).abs() < EPS);
        let down = auc(&[2.0, 1.0, 0.0], &[3.0, 1.0, 1.0]).unwrap();
        assert!((down - 3.0).abs() < EPS);
    }

    #[test]
    fn test_auc_rejects_non_monotonic_and_short() {
        assert!(auc(&[0.0, 1.0, 0.5], &[0.0, 1.0, 1.0]).is_err());
        assert!(auc(&[0.0], &[1.0]).is_err());
        assert!(auc(&[0.0, 1.0], &[1.0]).is_err());
    }

    #[test]
    fn test_roc_auc_hand_computed() {
        // Classic example: one inversion out of four positive/negative pairs
        let y_true = [0.0, 0.0, 1.0, 1.0];
        let y_score = [0.1, 0.4, 0.35, 0.8];
        let score = RocAuc.score(&y_true, &y_score).unwrap();
        assert!((score - 0.75).abs() < EPS);
    }

    #[test]
    fn test_roc_auc_ties_count_half() {
        let score = RocAuc.score(&[0.0, 1.0], &[0.5, 0.5]).unwrap();
        assert!((score - 0.5).abs() < EPS);
    }

    #[test]
    fn test_roc_requires_both_classes() {
        assert!(matches!(
            RocAuc.score(&[1.0, 1.0], &[0.2, 0.3]),
            Err(Error::Metric(_))
        ));
    }

    #[test]
    fn test_precision_recall_curve_shape() {
        let y_true = [0.0, 0.0, 1.0, 1.0];
        let y_score = [0.1, 0.4, 0.35, 0.8];
        let curve = precision_recall_curve(&y_true, &y_score).unwrap();
        assert_eq!(curve.x, vec![1.0, 1.0, 0.5, 0.5, 0.0]);
        assert!((curve.y[0] - 0.5).abs() < EPS);
        assert!((curve.y[1] - 2.0 / 3.0).abs() < EPS);
        assert!((curve.y[2] - 0.5).abs() < EPS);
        assert!((curve.y[3] - 1.0).abs() < EPS);
        assert_eq!(curve.y[4], 1.0);
        assert_eq!(curve.thresholds, vec![0.1, 0.35, 0.4, 0.8]);
    }

    #[test]
    fn test_average_precision_hand_computed() {
        let y_true = [0.0, 0.0, 1.0, 1.0];
        let y_score = [0.1, 0.4, 0.35, 0.8];
        // 0.5 * 1.0 + 0.5 * 2/3
        let ap = AveragePrecision.score(&y_true, &y_score).unwrap();
        assert!((ap - (0.5 + 1.0 / 3.0)).abs() < EPS);
    }

    #[test]
    fn test_pr_auc_perfect_ranking() {
        let y_true = [0.0, 0.0, 1.0, 1.0];
        let y_score = [0.1, 0.2, 0.8, 0.9];
        let score = PrAuc.score(&y_true, &y_score).unwrap();
        assert!((score - 1.0).abs() < EPS);
    }
}
