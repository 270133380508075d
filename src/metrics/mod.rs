//! Quality metrics for anomaly scorings
//!
//! Every metric validates its input the same way before scoring:
//! - labels and scores are 1-D and of equal length
//! - continuous metrics need floating-point scores, discrete metrics need
//!   thresholded integer predictions
//! - non-finite scores are sanitized according to a `NonFinitePolicy`
//!
//! # Example
//!
//! ```rust
//! use tsad_bench::metrics::{Metric, NumericArray, RangePrAuc};
//!
//! let y_true = NumericArray::integers(vec![0, 0, 1, 1, 0, 0]);
//! let y_score = NumericArray::floats(vec![0.0, 0.0, 0.9, 0.9, 0.0, 0.0]);
//!
//! let score = RangePrAuc::new().evaluate(&y_true, &y_score).unwrap();
//! assert!((score - 1.0).abs() < 1e-12);
//! ```

mod array;
mod curves;
mod range;
mod range_pr_auc;
mod validation;

pub use array::{NumericArray, NumericData};
pub use curves::{auc, precision_recall_curve, roc_curve, AveragePrecision, Curve, PrAuc, RocAuc};
pub use range::{
    anomaly_ranges, range_precision, range_recall, AnomalyRange, Cardinality, PositionalBias,
    RangeFScore, RangePrecision, RangeRecall,
};
pub use range_pr_auc::RangePrAuc;
pub use validation::{validate_scores, NonFinitePolicy, ValidatedScores};

use std::fmt;
use std::sync::Arc;

use crate::Result;

/// Scores a prediction against ground truth.
///
/// Implementors provide `score` on validated data; callers use `evaluate`.
pub trait Metric: Send + Sync + fmt::Debug {
    /// Column name of this metric in result tables.
    fn name(&self) -> String;

    /// Whether the metric accepts continuous scores (otherwise it needs binary predictions).
    fn supports_continuous_scorings(&self) -> bool;

    /// Score validated, finite, equally long label and score vectors.
    ///
    /// # Errors
    ///
    /// Returns `Error::Metric` if the metric is undefined for the input.
    fn score(&self, y_true: &[f64], y_score: &[f64]) -> Result<f64>;

    /// Validate with the default non-finite policy, then score.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for malformed input, or the error of `score`.
    fn evaluate(&self, y_true: &NumericArray, y_score: &NumericArray) -> Result<f64> {
        self.evaluate_with(y_true, y_score, NonFinitePolicy::default())
    }

    /// Validate with an explicit non-finite policy, then score.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for malformed input, or the error of `score`.
    fn evaluate_with(
        &self,
        y_true: &NumericArray,
        y_score: &NumericArray,
        policy: NonFinitePolicy,
    ) -> Result<f64> {
        let validated =
            validate_scores(y_true, y_score, self.supports_continuous_scorings(), policy)?;
        self.score(validated.y_true(), validated.y_score())
    }
}

/// Preconfigured metrics.
pub struct DefaultMetrics;

impl DefaultMetrics {
    /// Area under the ROC curve.
    #[must_use]
    pub const fn roc_auc() -> RocAuc {
        RocAuc
    }

    /// Area under the precision-recall curve.
    #[must_use]
    pub const fn pr_auc() -> PrAuc {
        PrAuc
    }

    /// Range-based PR-AUC tuned for point-wise recall (50 samples, no existence reward,
    /// no fragment discount).
    #[must_use]
    pub fn range_pr_auc() -> RangePrAuc {
        RangePrAuc::new()
            .with_max_samples(50)
            .with_r_alpha(0.0)
            .with_cardinality(Cardinality::One)
            .with_bias(PositionalBias::Flat)
    }

    /// Range-based PR-AUC with its default configuration.
    #[must_use]
    pub fn fixed_range_pr_auc() -> RangePrAuc {
        RangePrAuc::default()
    }

    /// Average precision.
    #[must_use]
    pub const fn average_precision() -> AveragePrecision {
        AveragePrecision
    }

    /// Range-based precision.
    #[must_use]
    pub const fn range_precision() -> RangePrecision {
        RangePrecision {
            alpha: 0.0,
            cardinality: Cardinality::Reciprocal,
            bias: PositionalBias::Flat,
        }
    }

    /// Range-based recall.
    #[must_use]
    pub const fn range_recall() -> RangeRecall {
        RangeRecall {
            alpha: 0.0,
            cardinality: Cardinality::Reciprocal,
            bias: PositionalBias::Flat,
        }
    }

    /// Range-based F1 score.
    #[must_use]
    pub const fn range_f1() -> RangeFScore {
        RangeFScore::with_beta(1.0)
    }

    /// The metric used when none is configured.
    #[must_use]
    pub fn default_metric() -> Arc<dyn Metric> {
        Arc::new(Self::roc_auc())
    }

    /// The metric list used when none is configured.
    #[must_use]
    pub fn default_list() -> Vec<Arc<dyn Metric>> {
        vec![Self::default_metric()]
    }
}
