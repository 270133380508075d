//! Area under the range-based precision-recall curve
//!
//! Evaluating range precision and recall at every distinct score is too slow
//! for high-resolution scorings, so the thresholds are subsampled to at most
//! `max_samples` values. The top threshold is always kept.

use super::curves::{auc, Curve};
use super::range::{range_precision, range_recall, Cardinality, PositionalBias};
use super::Metric;
use crate::{Error, Result};

/// Range-based PR-AUC over sampled thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangePrAuc {
    max_samples: usize,
    r_alpha: f64,
    p_alpha: f64,
    cardinality: Cardinality,
    bias: PositionalBias,
}

impl Default for RangePrAuc {
    fn default() -> Self {
        Self {
            max_samples: 100,
            r_alpha: 0.5,
            p_alpha: 0.0,
            cardinality: Cardinality::Reciprocal,
            bias: PositionalBias::Flat,
        }
    }
}

impl RangePrAuc {
    /// Default configuration (100 samples, `r_alpha = 0.5`, reciprocal cardinality, flat bias).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum number of thresholds evaluated (at least 2).
    #[must_use]
    pub const fn with_max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = max_samples;
        self
    }

    /// Existence reward weight for recall.
    #[must_use]
    pub const fn with_r_alpha(mut self, r_alpha: f64) -> Self {
        self.r_alpha = r_alpha;
        self
    }

    /// Existence reward weight for precision.
    #[must_use]
    pub const fn with_p_alpha(mut self, p_alpha: f64) -> Self {
        self.p_alpha = p_alpha;
        self
    }

    /// Fragment discount.
    #[must_use]
    pub const fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = cardinality;
        self
    }

    /// Positional bias for both precision and recall.
    #[must_use]
    pub const fn with_bias(mut self, bias: PositionalBias) -> Self {
        self.bias = bias;
        self
    }

    /// Maximum number of evaluated thresholds.
    #[must_use]
    pub const fn max_samples(&self) -> usize {
        self.max_samples
    }

    /// Candidate thresholds: distinct scores above the minimum, subsampled.
    fn thresholds(&self, y_score: &[f64]) -> Vec<f64> {
        let mut distinct = y_score.to_vec();
        distinct.sort_by(f64::total_cmp);
        distinct.dedup();
        let candidates = distinct.get(1..).unwrap_or_default();

        if candidates.len() <= self.max_samples {
            return candidates.to_vec();
        }
        let stride = candidates.len() / (self.max_samples - 1);
        let mut sampled: Vec<f64> = candidates.iter().step_by(stride).copied().collect();
        if let Some(&top) = candidates.last() {
            if sampled.last() != Some(&top) {
                sampled.push(top);
            }
        }
        sampled
    }

    /// Range-based precision-recall curve, x = recall (decreasing), y = precision.
    ///
    /// Starts at `(recall = 1, precision = prevalence)` and ends at
    /// `(recall = 0, precision = 1)`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Metric` if `max_samples < 2` or `y_true` has no anomaly.
    #[allow(clippy::cast_precision_loss)]
    pub fn curve(&self, y_true: &[f64], y_score: &[f64]) -> Result<Curve> {
        if self.max_samples < 2 {
            return Err(Error::Metric(format!(
                "max_samples must be at least 2, got {}",
                self.max_samples
            )));
        }

        let thresholds = self.thresholds(y_score);
        let mut points = Vec::with_capacity(thresholds.len());
        let mut y_pred = vec![0.0; y_score.len()];
        for &threshold in &thresholds {
            for (pred, &score) in y_pred.iter_mut().zip(y_score) {
                *pred = if score >= threshold { 1.0 } else { 0.0 };
            }
            let recall = range_recall(y_true, &y_pred, self.r_alpha, self.cardinality, self.bias)?;
            let precision =
                range_precision(y_true, &y_pred, self.p_alpha, self.cardinality, self.bias);
            points.push((recall, precision));
        }

        // descending recall; equal recalls keep reverse threshold order
        let mut order: Vec<usize> = (0..points.len()).collect();
        order.sort_by(|&a, &b| points[a].0.total_cmp(&points[b].0));
        order.reverse();

        let positives = y_true.iter().filter(|&&label| label != 0.0).count();
        let prevalence = if y_true.is_empty() {
            0.0
        } else {
            positives as f64 / y_true.len() as f64
        };

        let mut x = Vec::with_capacity(points.len() + 2);
        let mut y = Vec::with_capacity(points.len() + 2);
        x.push(1.0);
        y.push(prevalence);
        for index in order {
            x.push(points[index].0);
            y.push(points[index].1);
        }
        x.push(0.0);
        y.push(1.0);

        Ok(Curve { x, y, thresholds })
    }
}

impl Metric for RangePrAuc {
    fn name(&self) -> String {
        "RANGE_PR_AUC".to_string()
    }

    fn supports_continuous_scorings(&self) -> bool {
        true
    }

    fn score(&self, y_true: &[f64], y_score: &[f64]) -> Result<f64> {
        let curve = self.curve(y_true, y_score)?;
        auc(&curve.x, &curve.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_series() -> (Vec<f64>, Vec<f64>) {
        let mut y_true = vec![0.0; 20];
        let mut y_score = vec![0.1; 20];
        for i in 8..11 {
            y_true[i] = 1.0;
            y_score[i] = 0.9;
        }
        (y_true, y_score)
    }

    #[test]
    fn test_perfect_separation_scores_one() {
        let (y_true, y_score) = step_series();
        let score = RangePrAuc::new().score(&y_true, &y_score).unwrap();
        assert!((score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_curve_closing_points() {
        let (y_true, y_score) = step_series();
        let curve = RangePrAuc::new().curve(&y_true, &y_score).unwrap();
        assert_eq!(curve.thresholds, vec![0.9]);
        assert_eq!(curve.x, vec![1.0, 1.0, 0.0]);
        assert!((curve.y[0] - 0.15).abs() < 1e-12);
        assert_eq!(curve.y[1..], [1.0, 1.0]);
    }

    #[test]
    fn test_noisy_scores_in_unit_interval() {
        let (y_true, _) = step_series();
        let y_score: Vec<f64> = (0..20)
            .map(|i| f64::from((i * 7) % 11) / 10.0 + if (8..11).contains(&i) { 0.3 } else { 0.0 })
            .collect();
        let score = RangePrAuc::new().score(&y_true, &y_score).unwrap();
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn test_sampling_keeps_top_threshold() {
        let y_score: Vec<f64> = (0..11).map(f64::from).collect();
        let metric = RangePrAuc::new().with_max_samples(4);
        // candidates 1..=10, stride 10 / 3 = 3 -> 1, 4, 7, 10
        assert_eq!(metric.thresholds(&y_score), vec![1.0, 4.0, 7.0, 10.0]);

        let y_score: Vec<f64> = (0..12).map(f64::from).collect();
        // candidates 1..=11, stride 11 / 3 = 3 -> 1, 4, 7, 10, then 11 appended
        assert_eq!(
            metric.thresholds(&y_score),
            vec![1.0, 4.0, 7.0, 10.0, 11.0]
        );
    }

    #[test]
    fn test_constant_scores_use_closing_points_only() {
        let y_true = [0.0, 1.0, 0.0, 0.0];
        let score = RangePrAuc::new().score(&y_true, &[0.5; 4]).unwrap();
        assert!((score - (0.25 + 1.0) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_max_samples_below_two_fails() {
        let (y_true, y_score) = step_series();
        let err = RangePrAuc::new()
            .with_max_samples(1)
            .score(&y_true, &y_score)
            .unwrap_err();
        assert!(err.to_string().contains("max_samples"));
    }
}
