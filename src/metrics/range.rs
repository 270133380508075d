//! Range-based precision and recall for time series
//!
//! Anomalies are ranges (maximal runs of positive points) rather than
//! independent points. Each range earns an existence reward for being hit at
//! all and an overlap reward for how much of it is covered, shaped by a
//! positional bias and discounted by the number of fragments that hit it.
//!
//! References:
//! - Tatbul et al. (2018): Precision and Recall for Time Series (`NeurIPS`)

use serde::{Deserialize, Serialize};

use super::Metric;
use crate::{Error, Result};

/// Inclusive index range `[start, end]` of consecutive positive points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnomalyRange {
    /// First index.
    pub start: usize,
    /// Last index (inclusive).
    pub end: usize,
}

impl AnomalyRange {
    /// Number of points covered.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// Always `false`; a range covers at least one point.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }
}

/// Maximal runs of non-zero entries.
#[must_use]
pub fn anomaly_ranges(labels: &[f64]) -> Vec<AnomalyRange> {
    let mut ranges = Vec::new();
    let mut open: Option<usize> = None;
    for (index, &value) in labels.iter().enumerate() {
        match (value != 0.0, open) {
            (true, None) => open = Some(index),
            (false, Some(start)) => {
                ranges.push(AnomalyRange {
                    start,
                    end: index - 1,
                });
                open = None;
            }
            _ => {}
        }
    }
    if let Some(start) = open {
        ranges.push(AnomalyRange {
            start,
            end: labels.len() - 1,
        });
    }
    ranges
}

/// Discount applied to the overlap reward of a range hit by several fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// No discount.
    One,
    /// Divide by the number of overlapping fragments.
    #[default]
    Reciprocal,
}

impl Cardinality {
    #[allow(clippy::cast_precision_loss)]
    fn factor(self, overlaps: usize) -> f64 {
        match self {
            Self::One => 1.0,
            Self::Reciprocal if overlaps > 1 => 1.0 / overlaps as f64,
            Self::Reciprocal => 1.0,
        }
    }
}

/// Weight of each position inside a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionalBias {
    /// Every position counts the same.
    #[default]
    Flat,
    /// Early positions count more.
    Front,
    /// Central positions count more.
    Middle,
    /// Late positions count more.
    Back,
}

impl PositionalBias {
    /// Weight of 1-based position `position` in a range of `length` points.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn delta(self, position: usize, length: usize) -> f64 {
        let weight = match self {
            Self::Flat => 1,
            Self::Front => length - position + 1,
            Self::Back => position,
            Self::Middle if 2 * position <= length => position,
            Self::Middle => length - position + 1,
        };
        weight as f64
    }
}

/// Parameters of one range-based score.
#[derive(Debug, Clone, Copy, PartialEq)]
struct RangeScoring {
    alpha: f64,
    cardinality: Cardinality,
    bias: PositionalBias,
}

impl RangeScoring {
    /// Mean reward over `targets`, each judged against the overlapping `others`.
    #[allow(clippy::cast_precision_loss)]
    fn mean_reward(&self, targets: &[AnomalyRange], others: &[AnomalyRange]) -> f64 {
        let total: f64 = targets
            .iter()
            .map(|target| self.reward(*target, others))
            .sum();
        total / targets.len() as f64
    }

    fn reward(&self, target: AnomalyRange, others: &[AnomalyRange]) -> f64 {
        let first = others.partition_point(|other| other.end < target.start);
        let overlapping = others[first..]
            .iter()
            .take_while(|other| other.start <= target.end);

        let length = target.len();
        let max_value: f64 = (1..=length).map(|i| self.bias.delta(i, length)).sum();

        let mut count = 0;
        let mut omega = 0.0;
        for other in overlapping {
            count += 1;
            let from = other.start.max(target.start) - target.start + 1;
            let to = other.end.min(target.end) - target.start + 1;
            let covered: f64 = (from..=to).map(|i| self.bias.delta(i, length)).sum();
            omega += covered / max_value;
        }

        let existence = if count > 0 { 1.0 } else { 0.0 };
        let overlap = self.cardinality.factor(count) * omega;
        self.alpha.mul_add(existence, (1.0 - self.alpha) * overlap)
    }
}

/// Range-based recall of binary predictions.
///
/// # Errors
///
/// Returns `Error::Metric` if `y_true` contains no anomaly.
pub fn range_recall(
    y_true: &[f64],
    y_pred: &[f64],
    alpha: f64,
    cardinality: Cardinality,
    bias: PositionalBias,
) -> Result<f64> {
    let real = anomaly_ranges(y_true);
    if real.is_empty() {
        return Err(Error::Metric(
            "range-based recall is undefined without anomalies in y_true".to_string(),
        ));
    }
    let predicted = anomaly_ranges(y_pred);
    let scoring = RangeScoring {
        alpha,
        cardinality,
        bias,
    };
    Ok(scoring.mean_reward(&real, &predicted))
}

/// Range-based precision of binary predictions; 0 when nothing is predicted.
#[must_use]
pub fn range_precision(
    y_true: &[f64],
    y_pred: &[f64],
    alpha: f64,
    cardinality: Cardinality,
    bias: PositionalBias,
) -> f64 {
    let predicted = anomaly_ranges(y_pred);
    if predicted.is_empty() {
        return 0.0;
    }
    let real = anomaly_ranges(y_true);
    let scoring = RangeScoring {
        alpha,
        cardinality,
        bias,
    };
    scoring.mean_reward(&predicted, &real)
}

/// Range-based precision of thresholded predictions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RangePrecision {
    /// Existence reward weight.
    pub alpha: f64,
    /// Fragment discount.
    pub cardinality: Cardinality,
    /// Positional bias.
    pub bias: PositionalBias,
}

impl Metric for RangePrecision {
    fn name(&self) -> String {
        "RANGE_PRECISION".to_string()
    }

    fn supports_continuous_scorings(&self) -> bool {
        false
    }

    fn score(&self, y_true: &[f64], y_score: &[f64]) -> Result<f64> {
        Ok(range_precision(
            y_true,
            y_score,
            self.alpha,
            self.cardinality,
            self.bias,
        ))
    }
}

/// Range-based recall of thresholded predictions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RangeRecall {
    /// Existence reward weight.
    pub alpha: f64,
    /// Fragment discount.
    pub cardinality: Cardinality,
    /// Positional bias.
    pub bias: PositionalBias,
}

impl Metric for RangeRecall {
    fn name(&self) -> String {
        "RANGE_RECALL".to_string()
    }

    fn supports_continuous_scorings(&self) -> bool {
        false
    }

    fn score(&self, y_true: &[f64], y_score: &[f64]) -> Result<f64> {
        range_recall(y_true, y_score, self.alpha, self.cardinality, self.bias)
    }
}

/// Weighted harmonic mean of range-based precision and recall.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeFScore {
    /// Weight of recall relative to precision.
    pub beta: f64,
    /// Existence reward weight for precision.
    pub p_alpha: f64,
    /// Existence reward weight for recall.
    pub r_alpha: f64,
    /// Fragment discount.
    pub cardinality: Cardinality,
    /// Positional bias for precision.
    pub p_bias: PositionalBias,
    /// Positional bias for recall.
    pub r_bias: PositionalBias,
}

impl RangeFScore {
    /// F-score with the given `beta` and default range parameters.
    #[must_use]
    pub const fn with_beta(beta: f64) -> Self {
        Self {
            beta,
            p_alpha: 0.0,
            r_alpha: 0.5,
            cardinality: Cardinality::Reciprocal,
            p_bias: PositionalBias::Flat,
            r_bias: PositionalBias::Flat,
        }
    }
}

impl Default for RangeFScore {
    fn default() -> Self {
        Self::with_beta(1.0)
    }
}

impl Metric for RangeFScore {
    fn name(&self) -> String {
        format!("RANGE_F{:.1}_SCORE", self.beta)
    }

    fn supports_continuous_scorings(&self) -> bool {
        false
    }

    fn score(&self, y_true: &[f64], y_score: &[f64]) -> Result<f64> {
        let precision = range_precision(
            y_true,
            y_score,
            self.p_alpha,
            self.cardinality,
            self.p_bias,
        );
        let recall = range_recall(
            y_true,
            y_score,
            self.r_alpha,
            self.cardinality,
            self.r_bias,
        )?;
        if precision + recall == 0.0 {
            return Ok(0.0);
        }
        let beta2 = self.beta * self.beta;
        Ok((1.0 + beta2) * precision * recall / beta2.mul_add(precision, recall))
    }
}
