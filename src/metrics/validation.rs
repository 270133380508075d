//! Input validation shared by all metrics
//!
//! Guarantees handed to `Metric::score`:
//! - both arrays are 1-D (or single columns) of equal length
//! - labels are finite
//! - scores are finite; non-finite entries were replaced according to
//!   `NonFinitePolicy`, and entries excluded by the policy were replaced
//!   with the complement of their label so they always count as wrong

use serde::{Deserialize, Serialize};

use super::array::NumericArray;
use crate::{Error, Result};

/// Replacement policy for non-finite scores.
///
/// A `false` flag penalizes the affected entries instead: they are replaced
/// with the complement of the corresponding label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonFinitePolicy {
    /// Replace `+inf` with 1.
    pub inf_is_1: bool,
    /// Replace `-inf` with 0.
    pub neginf_is_0: bool,
    /// Replace `NaN` with 0.
    pub nan_is_0: bool,
}

impl Default for NonFinitePolicy {
    fn default() -> Self {
        Self {
            inf_is_1: true,
            neginf_is_0: true,
            nan_is_0: true,
        }
    }
}

/// Labels and scores that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedScores {
    y_true: Vec<f64>,
    y_score: Vec<f64>,
}

impl ValidatedScores {
    /// Ground-truth labels (non-zero = anomalous).
    #[must_use]
    pub fn y_true(&self) -> &[f64] {
        &self.y_true
    }

    /// Sanitized scores.
    #[must_use]
    pub fn y_score(&self) -> &[f64] {
        &self.y_score
    }
}

/// Validate and sanitize a label/score pair.
///
/// # Errors
///
/// Returns `Error::Validation` on shape or length mismatch, non-finite labels,
/// or a score type that does not fit `continuous`.
pub fn validate_scores(
    y_true: &NumericArray,
    y_score: &NumericArray,
    continuous: bool,
    policy: NonFinitePolicy,
) -> Result<ValidatedScores> {
    if y_true.is_float() && y_score.is_integer() {
        tracing::warn!(
            "assuming y_true and y_score were permuted because of their element types; \
             y_true should be an integer array and y_score a float array"
        );
        return validate_scores(y_score, y_true, continuous, policy);
    }

    ensure_column_or_1d("y_true", y_true)?;
    let labels = y_true.to_f64();
    if labels.iter().any(|v| !v.is_finite()) {
        return Err(Error::Validation(
            "y_true contains NaN or infinity".to_string(),
        ));
    }

    ensure_column_or_1d("y_score", y_score)?;
    if labels.len() != y_score.len() {
        return Err(Error::Validation(format!(
            "found input variables with inconsistent numbers of samples: [{}, {}]",
            labels.len(),
            y_score.len()
        )));
    }

    if continuous {
        if !y_score.is_float() {
            return Err(Error::Validation(
                "continuous scoring metrics need floating-point scores".to_string(),
            ));
        }
    } else if !y_score.is_integer() {
        return Err(Error::Validation(
            "this metric needs discrete scores (integers in {0, 1}), as do Precision, Recall \
             or F1-Score; apply a threshold to the scores first"
                .to_string(),
        ));
    }

    let scores = sanitize(&labels, y_score.to_f64(), policy);
    if scores.iter().any(|v| !v.is_finite()) {
        return Err(Error::Validation(
            "y_score still contains NaN or infinity after sanitization".to_string(),
        ));
    }

    Ok(ValidatedScores {
        y_true: labels,
        y_score: scores,
    })
}

fn ensure_column_or_1d(name: &str, array: &NumericArray) -> Result<()> {
    if array.is_column_or_1d() {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "{name} should be a 1d array, got an array of shape {:?} instead",
            array.shape()
        )))
    }
}

fn sanitize(labels: &[f64], mut scores: Vec<f64>, policy: NonFinitePolicy) -> Vec<f64> {
    for (score, &label) in scores.iter_mut().zip(labels) {
        let penalty = if label == 0.0 { 1.0 } else { 0.0 };
        if score.is_nan() {
            *score = if policy.nan_is_0 { 0.0 } else { penalty };
        } else if *score == f64::INFINITY {
            *score = if policy.inf_is_1 { 1.0 } else { penalty };
        } else if *score == f64::NEG_INFINITY {
            *score = if policy.neginf_is_0 { 0.0 } else { penalty };
        }
    }
    scores
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_sanitizes() {
        let labels = NumericArray::integers(vec![0, 1, 1, 0]);
        let scores = NumericArray::floats(vec![f64::INFINITY, f64::NEG_INFINITY, f64::NAN, 0.3]);
        let validated =
            validate_scores(&labels, &scores, true, NonFinitePolicy::default()).unwrap();
        assert_eq!(validated.y_score(), &[1.0, 0.0, 0.0, 0.3]);
    }

    #[test]
    fn test_penalize_nan_on_positive_label() {
        let labels = NumericArray::integers(vec![1, 0]);
        let scores = NumericArray::floats(vec![f64::NAN, f64::NAN]);
        let policy = NonFinitePolicy {
            nan_is_0: false,
            ..NonFinitePolicy::default()
        };
        let validated = validate_scores(&labels, &scores, true, policy).unwrap();
        assert_eq!(validated.y_score(), &[0.0, 1.0]);
    }

    #[test]
    fn test_penalize_infinities() {
        let labels = NumericArray::integers(vec![0, 1]);
        let scores = NumericArray::floats(vec![f64::INFINITY, f64::NEG_INFINITY]);
        let policy = NonFinitePolicy {
            inf_is_1: false,
            neginf_is_0: false,
            nan_is_0: true,
        };
        let validated = validate_scores(&labels, &scores, true, policy).unwrap();
        // +inf on a normal point would be a hit if mapped to 1; penalized it stays wrong
        assert_eq!(validated.y_score(), &[1.0, 0.0]);
    }

    #[test]
    fn test_swapped_arguments_are_corrected() {
        let scores = NumericArray::floats(vec![0.1, 0.9]);
        let labels = NumericArray::integers(vec![0, 1]);
        let validated =
            validate_scores(&scores, &labels, true, NonFinitePolicy::default()).unwrap();
        assert_eq!(validated.y_true(), &[0.0, 1.0]);
        assert_eq!(validated.y_score(), &[0.1, 0.9]);
    }

    #[test]
    fn test_length_mismatch() {
        let err = validate_scores(
            &NumericArray::integers(vec![0, 1, 0]),
            &NumericArray::floats(vec![0.1, 0.2]),
            true,
            NonFinitePolicy::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("[3, 2]"));
    }

    #[test]
    fn test_two_dimensional_rejected() {
        let scores = NumericArray::floats(vec![0.1; 4]).reshape(vec![2, 2]).unwrap();
        let err = validate_scores(
            &NumericArray::integers(vec![0, 1, 0, 1]),
            &scores,
            true,
            NonFinitePolicy::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("1d array"));
    }

    #[test]
    fn test_non_finite_labels_rejected() {
        let err = validate_scores(
            &NumericArray::floats(vec![0.0, f64::NAN]),
            &NumericArray::floats(vec![0.1, 0.2]),
            true,
            NonFinitePolicy::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_discrete_metric_requires_integer_scores() {
        let err = validate_scores(
            &NumericArray::integers(vec![0, 1]),
            &NumericArray::floats(vec![0.1, 0.9]),
            false,
            NonFinitePolicy::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("threshold"));
    }

    #[test]
    fn test_continuous_metric_requires_float_scores() {
        let err = validate_scores(
            &NumericArray::integers(vec![0, 1]),
            &NumericArray::integers(vec![0, 1]),
            true,
            NonFinitePolicy::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("floating-point"));
    }
}
