//! Metric validation, sanitization and scoring through the public API

use tsad_bench::metrics::{
    validate_scores, AveragePrecision, DefaultMetrics, Metric, NonFinitePolicy, NumericArray,
    RangePrAuc, RocAuc,
};
use tsad_bench::Error;

use std::sync::Arc;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// ============================================================================
// Validation and Sanitization
// ============================================================================

#[test]
fn test_non_finite_scores_default_mapping() {
    let y_true = NumericArray::integers(vec![0, 1, 1]);
    let y_score = NumericArray::floats(vec![f64::INFINITY, f64::NEG_INFINITY, f64::NAN]);
    let validated = validate_scores(&y_true, &y_score, true, NonFinitePolicy::default()).unwrap();
    assert_eq!(validated.y_score(), &[1.0, 0.0, 0.0]);
    assert_eq!(validated.y_true(), &[0.0, 1.0, 1.0]);
}

#[test]
fn test_nan_penalty_is_label_complement() {
    let policy = NonFinitePolicy {
        nan_is_0: false,
        ..NonFinitePolicy::default()
    };
    let y_true = NumericArray::integers(vec![0, 1]);
    let y_score = NumericArray::floats(vec![f64::NAN, f64::NAN]);
    let validated = validate_scores(&y_true, &y_score, true, policy).unwrap();
    assert_eq!(validated.y_score(), &[1.0, 0.0]);
}

#[test]
fn test_permuted_arguments_are_swapped() {
    let scores = NumericArray::floats(vec![0.1, 0.9, 0.2, 0.8]);
    let labels = NumericArray::integers(vec![0, 1, 0, 1]);
    let swapped = RocAuc.evaluate(&scores, &labels).unwrap();
    let regular = RocAuc.evaluate(&labels, &scores).unwrap();
    assert!(close(swapped, regular));
    assert!(close(regular, 1.0));
}

#[test]
fn test_length_mismatch() {
    let error = RocAuc
        .evaluate(
            &NumericArray::integers(vec![0, 1, 0]),
            &NumericArray::floats(vec![0.5, 0.5]),
        )
        .unwrap_err();
    assert!(matches!(error, Error::Validation(_)));
    assert!(error.to_string().contains("[3, 2]"));
}

#[test]
fn test_two_dimensional_scores_rejected() {
    let y_score = NumericArray::floats(vec![0.1, 0.2, 0.3, 0.4])
        .reshape(vec![2, 2])
        .unwrap();
    let error = RocAuc
        .evaluate(&NumericArray::integers(vec![0, 1, 0, 1]), &y_score)
        .unwrap_err();
    assert!(error.to_string().contains("1d array"));

    let column = NumericArray::floats(vec![0.1, 0.9]).reshape(vec![2, 1]).unwrap();
    assert!(RocAuc
        .evaluate(&NumericArray::integers(vec![0, 1]), &column)
        .is_ok());
}

#[test]
fn test_discrete_metric_rejects_continuous_scores() {
    let error = DefaultMetrics::range_precision()
        .evaluate(
            &NumericArray::integers(vec![0, 1, 1, 0]),
            &NumericArray::floats(vec![0.1, 0.9, 0.8, 0.2]),
        )
        .unwrap_err();
    assert!(error.to_string().contains("threshold"));
}

#[test]
fn test_continuous_metric_rejects_integer_scores() {
    let error = RocAuc
        .evaluate(
            &NumericArray::integers(vec![0, 1, 1, 0]),
            &NumericArray::integers(vec![0, 1, 1, 0]),
        )
        .unwrap_err();
    assert!(error.to_string().contains("floating-point"));
}

// ============================================================================
// Point-wise Metrics
// ============================================================================

#[test]
fn test_roc_and_average_precision_hand_computed() {
    let y_true = NumericArray::integers(vec![0, 0, 1, 1]);
    let y_score = NumericArray::floats(vec![0.1, 0.4, 0.35, 0.8]);
    assert!(close(RocAuc.evaluate(&y_true, &y_score).unwrap(), 0.75));
    assert!(close(
        AveragePrecision.evaluate(&y_true, &y_score).unwrap(),
        0.833_333_333_333_333_4
    ));
}

#[test]
fn test_single_class_is_metric_error() {
    let error = RocAuc
        .evaluate(
            &NumericArray::integers(vec![0, 0, 0]),
            &NumericArray::floats(vec![0.1, 0.2, 0.3]),
        )
        .unwrap_err();
    assert!(matches!(error, Error::Metric(_)));
}

// ============================================================================
// Range-based Metrics
// ============================================================================

#[test]
fn test_range_metrics_on_binary_predictions() {
    let y_true = NumericArray::integers(vec![0, 1, 1, 1, 0, 0, 1, 1, 0, 0]);
    let y_pred = NumericArray::integers(vec![0, 1, 1, 1, 0, 0, 1, 1, 0, 0]);
    assert!(close(DefaultMetrics::range_recall().evaluate(&y_true, &y_pred).unwrap(), 1.0));
    assert!(close(DefaultMetrics::range_precision().evaluate(&y_true, &y_pred).unwrap(), 1.0));
    assert!(close(DefaultMetrics::range_f1().evaluate(&y_true, &y_pred).unwrap(), 1.0));

    let nothing = NumericArray::integers(vec![0; 10]);
    assert!(close(DefaultMetrics::range_precision().evaluate(&y_true, &nothing).unwrap(), 0.0));
    assert!(close(DefaultMetrics::range_recall().evaluate(&y_true, &nothing).unwrap(), 0.0));
}

#[test]
fn test_range_pr_auc_perfect_separation() {
    let y_true = NumericArray::integers(vec![0, 0, 1, 1, 1, 0, 0, 0, 1, 1, 0, 0]);
    let y_score = NumericArray::floats(vec![
        0.1, 0.1, 0.9, 0.9, 0.9, 0.1, 0.1, 0.1, 0.9, 0.9, 0.1, 0.1,
    ]);
    for metric in [
        RangePrAuc::new(),
        DefaultMetrics::range_pr_auc(),
        DefaultMetrics::fixed_range_pr_auc(),
    ] {
        let score = metric.evaluate(&y_true, &y_score).unwrap();
        assert!(close(score, 1.0), "{metric:?} gave {score}");
    }
}

#[test]
fn test_range_pr_auc_bounded_for_noisy_scores() {
    let y_true = NumericArray::integers(vec![0, 1, 1, 0, 0, 1, 0, 0, 1, 1, 1, 0]);
    let y_score = NumericArray::floats(vec![
        0.3, 0.1, 0.8, 0.6, 0.2, 0.9, 0.4, 0.7, 0.5, 0.05, 0.65, 0.35,
    ]);
    let score = RangePrAuc::new().evaluate(&y_true, &y_score).unwrap();
    assert!((0.0..=1.0).contains(&score));
    let sampled = RangePrAuc::new()
        .with_max_samples(3)
        .evaluate(&y_true, &y_score)
        .unwrap();
    assert!((0.0..=1.0).contains(&sampled));
}

#[test]
fn test_metric_names() {
    let metrics: [Arc<dyn Metric>; 4] = [
        DefaultMetrics::default_metric(),
        Arc::new(DefaultMetrics::range_pr_auc()),
        Arc::new(DefaultMetrics::range_f1()),
        Arc::new(DefaultMetrics::average_precision()),
    ];
    let names: Vec<String> = metrics.iter().map(|metric| metric.name()).collect();
    assert_eq!(
        names,
        vec!["ROC_AUC", "RANGE_PR_AUC", "RANGE_F1.0_SCORE", "AVERAGE_PRECISION"]
    );
    assert_eq!(DefaultMetrics::default_list().len(), 1);
}
