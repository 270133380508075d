//! A single unit of work and its evaluation
//!
//! Evaluation order:
//! 1. Validate configuration and load inputs (nothing is written yet)
//! 2. Train (trainable algorithms only), then execute
//! 3. Min-max scale the scores
//! 4. Compute every metric independently, keeping successes and failures
//! 5. Persist scores, metrics and parameters
//! 6. Escalate only if every metric failed

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::adapters::{AdapterInput, CallArgs};
use crate::algorithm::Algorithm;
use crate::data_types::TrainingType;
use crate::dataset::{extract_features, load_dataset, load_labels_only, Dataset};
use crate::metrics::{Metric, NumericArray};
use crate::params::{dump_params, hash_params, Params};
use crate::resource_constraints::ResourceConstraints;
use crate::times::Times;
use crate::{Error, Result};

use super::layout::{
    append_lines, generate_experiment_path, write_scores, write_single_row_csv,
    ANOMALY_SCORES_TS, EXECUTION_LOG, HYPER_PARAMETERS, METRICS_CSV,
};
use super::result::ResultRecord;
use super::stage::{ExperimentStage, StageTracker};

/// One (algorithm, parameters, dataset, repetition) combination.
///
/// Created by `Experiments`; never constructed directly.
#[derive(Debug, Clone)]
pub struct Experiment {
    dataset: Dataset,
    algorithm: Arc<Algorithm>,
    params: Params,
    params_id: String,
    repetition: usize,
    base_results_dir: PathBuf,
    resource_constraints: ResourceConstraints,
    metrics: Vec<Arc<dyn Metric>>,
    resolved_test_dataset_path: PathBuf,
    resolved_train_dataset_path: Option<PathBuf>,
}

/// Metric outcomes of one scoring pass.
#[derive(Debug, Default)]
struct MetricOutcome {
    scores: Vec<(String, f64)>,
    failures: Vec<(String, Error)>,
}

impl MetricOutcome {
    /// The error to raise when no metric succeeded: the last failure with a message.
    fn into_escalation(self, configured: usize) -> Option<Error> {
        if configured == 0 || self.failures.len() < configured {
            return None;
        }
        self.failures
            .into_iter()
            .rev()
            .map(|(_, error)| error)
            .find(|error| !error.message().is_empty())
    }
}

impl Experiment {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        dataset: Dataset,
        algorithm: Arc<Algorithm>,
        params: Params,
        repetition: usize,
        base_results_dir: PathBuf,
        resource_constraints: ResourceConstraints,
        metrics: Vec<Arc<dyn Metric>>,
        resolved_test_dataset_path: PathBuf,
        resolved_train_dataset_path: Option<PathBuf>,
    ) -> Result<Self> {
        let params_id = hash_params(&params)?;
        Ok(Self {
            dataset,
            algorithm,
            params,
            params_id,
            repetition,
            base_results_dir,
            resource_constraints,
            metrics,
            resolved_test_dataset_path,
            resolved_train_dataset_path,
        })
    }

    /// `"{algorithm}-{collection}-{dataset}"`.
    #[must_use]
    pub fn name(&self) -> String {
        format!(
            "{}-{}-{}",
            self.algorithm.name(),
            self.dataset.collection_name(),
            self.dataset.name()
        )
    }

    /// Evaluated dataset.
    #[must_use]
    pub const fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Evaluated algorithm.
    #[must_use]
    pub fn algorithm(&self) -> &Algorithm {
        &self.algorithm
    }

    /// Resolved hyper-parameters.
    #[must_use]
    pub const fn params(&self) -> &Params {
        &self.params
    }

    /// Hex SHA-256 of the canonical JSON of `params`.
    #[must_use]
    pub fn params_id(&self) -> &str {
        &self.params_id
    }

    /// Repetition index, starting at 1.
    #[must_use]
    pub const fn repetition(&self) -> usize {
        self.repetition
    }

    /// Resource budget.
    #[must_use]
    pub const fn resource_constraints(&self) -> &ResourceConstraints {
        &self.resource_constraints
    }

    /// Metrics computed on the scores.
    #[must_use]
    pub fn metrics(&self) -> &[Arc<dyn Metric>] {
        &self.metrics
    }

    /// Test split file.
    #[must_use]
    pub fn resolved_test_dataset_path(&self) -> &Path {
        &self.resolved_test_dataset_path
    }

    /// Training split file, if the algorithm trains and one exists.
    #[must_use]
    pub fn resolved_train_dataset_path(&self) -> Option<&Path> {
        self.resolved_train_dataset_path.as_deref()
    }

    /// Directory receiving the artifacts of this experiment.
    #[must_use]
    pub fn results_path(&self) -> PathBuf {
        generate_experiment_path(
            &self.base_results_dir,
            self.algorithm.name(),
            &self.params_id,
            self.dataset.collection_name(),
            self.dataset.name(),
            self.repetition,
        )
    }

    /// Context handed to the adapter and transforms.
    #[must_use]
    pub fn build_args(&self) -> CallArgs {
        CallArgs {
            results_path: self.results_path(),
            resource_constraints: self.resource_constraints.clone(),
            hyper_params: self.params.clone(),
            dataset: self.dataset.clone(),
        }
    }

    /// Train, execute, score and persist.
    ///
    /// Returns the timing columns followed by the score of every metric that
    /// succeeded. Metric failures are logged and skipped; only when all metrics
    /// fail is the last failure returned, after the artifacts were written.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` (before anything is written) for a
    /// missing training split, an adapter without training support or an
    /// unexpected dataset shape; adapter, timeout and I/O errors as they occur.
    pub fn evaluate(&self) -> Result<ResultRecord> {
        let span = tracing::info_span!(
            "experiment",
            algorithm = %self.algorithm.name(),
            collection = %self.dataset.collection_name(),
            dataset = %self.dataset.name(),
            params_id = %self.params_id,
            repetition = self.repetition,
        );
        let _entered = span.enter();

        let train_input = self.training_input()?;
        let test_input = self.execution_input()?;

        let results_path = self.results_path();
        std::fs::create_dir_all(&results_path)?;

        let mut tracker = StageTracker::new();
        let outcome = self.run(&mut tracker, train_input, test_input, &results_path);
        if let Err(error) = &outcome {
            tracker.advance(ExperimentStage::Failed);
            tracker.log(format!("Experiment failed: {error}"));
            tracing::error!(error = %error, "experiment failed");
        }

        if let Err(error) = append_lines(&results_path.join(EXECUTION_LOG), &tracker.take_log()) {
            tracing::warn!(error = %error, "could not write execution log");
        }
        outcome
    }

    fn training_input(&self) -> Result<Option<AdapterInput>> {
        if self.algorithm.training_type() == TrainingType::Unsupervised {
            return Ok(None);
        }
        let Some(train_path) = &self.resolved_train_dataset_path else {
            return Err(Error::Configuration(format!(
                "no training dataset was provided for {} algorithm {}; it cannot be trained",
                self.algorithm.training_type(),
                self.algorithm.name()
            )));
        };
        if !self.algorithm.main().supports_training() {
            return Err(Error::Configuration(format!(
                "{} algorithm {} has an adapter without training support",
                self.algorithm.training_type(),
                self.algorithm.name()
            )));
        }

        if self.algorithm.data_as_file() {
            Ok(Some(AdapterInput::Path(train_path.clone())))
        } else {
            let frame = load_dataset(train_path)?;
            Ok(Some(AdapterInput::Array(frame.to_matrix()?)))
        }
    }

    fn execution_input(&self) -> Result<AdapterInput> {
        let path = &self.resolved_test_dataset_path;
        if self.algorithm.data_as_file() {
            return Ok(AdapterInput::Path(path.clone()));
        }

        let frame = load_dataset(path)?;
        let (rows, columns) = frame.shape();
        if columns < 3 {
            return Err(Error::Configuration(format!(
                "dataset '{}' has a shape that was not expected: ({rows}, {columns})",
                path.file_name().map_or_else(
                    || path.display().to_string(),
                    |name| name.to_string_lossy().into_owned()
                )
            )));
        }
        Ok(AdapterInput::Array(extract_features(&frame)?))
    }

    fn run(
        &self,
        tracker: &mut StageTracker,
        train_input: Option<AdapterInput>,
        test_input: AdapterInput,
        results_path: &Path,
    ) -> Result<ResultRecord> {
        let args = self.build_args();
        let mut record = ResultRecord::new();

        if let Some(input) = train_input {
            tracker.advance(ExperimentStage::Training);
            tracker.log(format!(
                "Performing training for {} algorithm {}",
                self.algorithm.training_type(),
                self.algorithm.name()
            ));
            let times = Times::from_train_algorithm(&self.algorithm, input, &args)?;
            record.extend(times.columns());
        }

        tracker.advance(ExperimentStage::Executing);
        tracker.log(format!(
            "Performing execution for {} algorithm {}",
            self.algorithm.training_type(),
            self.algorithm.name()
        ));
        let (scores, times) = Times::from_execute_algorithm(&self.algorithm, test_input, &args)?;
        record.extend(times.columns());
        let scores = min_max_scale(scores);

        tracker.advance(ExperimentStage::Scoring);
        let names: Vec<String> = self.metrics.iter().map(|metric| metric.name()).collect();
        tracker.log(format!(
            "Scoring algorithm {} with {} metrics",
            self.algorithm.name(),
            names.join(",")
        ));
        let y_true = load_labels_only(&self.resolved_test_dataset_path)?;
        let y_score = NumericArray::floats(scores);
        let outcome = self.score_metrics(tracker, &y_true, &y_score);
        for (name, score) in &outcome.scores {
            record.insert(name.clone(), Some(*score));
        }

        write_scores(&results_path.join(ANOMALY_SCORES_TS), &y_score.to_f64())?;
        write_single_row_csv(&results_path.join(METRICS_CSV), record.columns())?;
        dump_params(&self.params, &results_path.join(HYPER_PARAMETERS))?;

        if let Some(error) = outcome.into_escalation(self.metrics.len()) {
            return Err(error);
        }
        tracker.advance(ExperimentStage::Persisted);
        tracing::info!(columns = record.len(), "experiment finished");
        Ok(record)
    }

    fn score_metrics(
        &self,
        tracker: &mut StageTracker,
        y_true: &NumericArray,
        y_score: &NumericArray,
    ) -> MetricOutcome {
        let mut outcome = MetricOutcome::default();
        for metric in &self.metrics {
            let name = metric.name();
            tracker.log(format!("Calculating {name}"));
            match metric.evaluate(y_true, y_score) {
                Ok(score) => outcome.scores.push((name, score)),
                Err(error) => {
                    tracker.log(format!("Exception while computing metric {name}: {error}"));
                    tracing::warn!(metric = %name, error = %error, "metric failed");
                    outcome.failures.push((name, error));
                }
            }
        }
        outcome
    }
}

/// Scale finite scores to [0, 1]; a constant scoring becomes all zeros.
///
/// Non-finite entries are left untouched for metric sanitization.
#[must_use]
pub fn min_max_scale(mut scores: Vec<f64>) -> Vec<f64> {
    let (min, max) = scores
        .iter()
        .filter(|score| score.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &score| {
            (lo.min(score), hi.max(score))
        });
    if min > max {
        return scores;
    }
    let range = max - min;
    for score in scores.iter_mut().filter(|score| score.is_finite()) {
        *score = if range > 0.0 {
            (*score - min) / range
        } else {
            0.0
        };
    }
    scores
}
