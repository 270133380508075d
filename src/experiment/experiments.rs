//! Deterministic enumeration of experiments
//!
//! Experiments are produced in the order algorithms → parameter points →
//! datasets → repetitions. Nothing is materialized up front: `iter()` walks
//! explicit indices, so the collection can be iterated any number of times
//! and always yields the same sequence.

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use crate::algorithm::Algorithm;
use crate::data_types::{InputDimensionality, TrainingType};
use crate::dataset::{Dataset, DatasetResolver};
use crate::heuristics::inject_heuristic_values;
use crate::metrics::{DefaultMetrics, Metric};
use crate::params::Params;
use crate::resource_constraints::ResourceConstraints;
use crate::{Error, Result};

use super::evaluate::Experiment;

/// Lazy producer of `Experiment`s over algorithms × parameters × datasets × repetitions.
pub struct Experiments {
    resolver: Arc<dyn DatasetResolver>,
    datasets: Vec<Dataset>,
    algorithms: Vec<Arc<Algorithm>>,
    base_result_path: PathBuf,
    resource_constraints: ResourceConstraints,
    repetitions: usize,
    metrics: Vec<Arc<dyn Metric>>,
    skip_invalid_combinations: bool,
    force_training_type_match: bool,
    force_dimensionality_match: bool,
    len: OnceLock<usize>,
}

impl Experiments {
    /// Create a builder.
    #[must_use]
    pub fn builder(
        resolver: Arc<dyn DatasetResolver>,
        datasets: Vec<Dataset>,
        algorithms: Vec<Algorithm>,
        base_result_path: impl Into<PathBuf>,
    ) -> ExperimentsBuilder {
        ExperimentsBuilder {
            resolver,
            datasets,
            algorithms,
            base_result_path: base_result_path.into(),
            resource_constraints: None,
            repetitions: 1,
            metrics: None,
            skip_invalid_combinations: false,
            force_training_type_match: false,
            force_dimensionality_match: false,
        }
    }

    /// Whether `algorithm` can be evaluated on `dataset`.
    ///
    /// Always true when filtering is disabled. Otherwise training types must
    /// match for supervised and semi-supervised algorithms (or for all when
    /// `force_training_type_match` is set), and a univariate algorithm never
    /// gets a multivariate dataset (or dimensionalities must match exactly
    /// when `force_dimensionality_match` is set).
    #[must_use]
    pub fn is_compatible(&self, dataset: &Dataset, algorithm: &Algorithm) -> bool {
        if !self.skip_invalid_combinations {
            return true;
        }
        let training_compatible = if self.force_training_type_match
            || algorithm.training_type() != TrainingType::Unsupervised
        {
            algorithm.training_type() == dataset.training_type()
        } else {
            true
        };
        let dimensionality_compatible = if self.force_dimensionality_match {
            algorithm.input_dimensionality() == dataset.input_dimensionality()
        } else {
            !(algorithm.input_dimensionality() == InputDimensionality::Univariate
                && dataset.input_dimensionality() == InputDimensionality::Multivariate)
        };
        training_compatible && dimensionality_compatible
    }

    /// Number of experiments `iter()` yields when no resolution error occurs.
    ///
    /// Computed once; with filtering enabled this walks the combinations.
    pub fn len(&self) -> usize {
        *self.len.get_or_init(|| {
            let combinations: usize = self
                .algorithms
                .iter()
                .map(|algorithm| {
                    let datasets = self
                        .datasets
                        .iter()
                        .filter(|dataset| self.is_compatible(dataset, algorithm))
                        .count();
                    algorithm.param_grid().len() * datasets
                })
                .sum();
            combinations * self.repetitions
        })
    }

    /// Whether no experiment would be produced.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over the experiments from the start.
    #[must_use]
    pub const fn iter(&self) -> ExperimentIter<'_> {
        ExperimentIter {
            experiments: self,
            algorithm: 0,
            point: 0,
            dataset: 0,
            current: None,
            repetition: 0,
            done: false,
        }
    }

    /// Datasets to evaluate.
    #[must_use]
    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    /// Algorithms to evaluate.
    #[must_use]
    pub fn algorithms(&self) -> &[Arc<Algorithm>] {
        &self.algorithms
    }

    /// Directory all experiment paths are rooted at.
    #[must_use]
    pub const fn base_result_path(&self) -> &PathBuf {
        &self.base_result_path
    }

    /// Resource budget handed to every experiment.
    #[must_use]
    pub const fn resource_constraints(&self) -> &ResourceConstraints {
        &self.resource_constraints
    }

    /// Repetitions per combination.
    #[must_use]
    pub const fn repetitions(&self) -> usize {
        self.repetitions
    }

    /// Metrics computed for every experiment.
    #[must_use]
    pub fn metrics(&self) -> &[Arc<dyn Metric>] {
        &self.metrics
    }

    /// Resolve paths and heuristics of one (algorithm, point, dataset) combination.
    fn resolve(&self, algorithm: &Algorithm, point: Params, dataset: &Dataset) -> Result<Resolved> {
        let test_path = self.resolver.resolve_path(dataset.id(), false)?;
        let train_path = if algorithm.training_type() == TrainingType::Unsupervised {
            None
        } else {
            match self.resolver.resolve_path(dataset.id(), true) {
                Ok(path) => Some(path),
                Err(Error::DatasetNotFound { .. }) => None,
                Err(error) => return Err(error),
            }
        };
        let params = inject_heuristic_values(&point, algorithm, dataset, &test_path)?;
        Ok(Resolved {
            params,
            test_path,
            train_path,
        })
    }
}

impl std::fmt::Debug for Experiments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Experiments")
            .field("datasets", &self.datasets.len())
            .field("algorithms", &self.algorithms.len())
            .field("base_result_path", &self.base_result_path)
            .field("repetitions", &self.repetitions)
            .field("skip_invalid_combinations", &self.skip_invalid_combinations)
            .finish_non_exhaustive()
    }
}

impl<'a> IntoIterator for &'a Experiments {
    type Item = Result<Experiment>;
    type IntoIter = ExperimentIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Builder for `Experiments`.
pub struct ExperimentsBuilder {
    resolver: Arc<dyn DatasetResolver>,
    datasets: Vec<Dataset>,
    algorithms: Vec<Algorithm>,
    base_result_path: PathBuf,
    resource_constraints: Option<ResourceConstraints>,
    repetitions: usize,
    metrics: Option<Vec<Arc<dyn Metric>>>,
    skip_invalid_combinations: bool,
    force_training_type_match: bool,
    force_dimensionality_match: bool,
}

impl ExperimentsBuilder {
    /// Resource budget (default: probed host without explicit limits).
    #[must_use]
    pub fn resource_constraints(mut self, constraints: ResourceConstraints) -> Self {
        self.resource_constraints = Some(constraints);
        self
    }

    /// Repetitions per combination (default 1).
    #[must_use]
    pub const fn repetitions(mut self, repetitions: usize) -> Self {
        self.repetitions = repetitions;
        self
    }

    /// Metrics to compute (default: `DefaultMetrics::default_list()`).
    #[must_use]
    pub fn metrics(mut self, metrics: Vec<Arc<dyn Metric>>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Skip incompatible algorithm/dataset pairs (default false).
    #[must_use]
    pub const fn skip_invalid_combinations(mut self, skip: bool) -> Self {
        self.skip_invalid_combinations = skip;
        self
    }

    /// Require equal training types for every algorithm (implies filtering).
    #[must_use]
    pub const fn force_training_type_match(mut self, force: bool) -> Self {
        self.force_training_type_match = force;
        self
    }

    /// Require equal input dimensionalities (implies filtering).
    #[must_use]
    pub const fn force_dimensionality_match(mut self, force: bool) -> Self {
        self.force_dimensionality_match = force;
        self
    }

    /// Build the experiment collection.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if `repetitions` is 0, or
    /// `Error::HostProbe` if no constraints were given and the host cannot
    /// be probed.
    pub fn build(self) -> Result<Experiments> {
        if self.repetitions == 0 {
            return Err(Error::Configuration(
                "repetitions must be at least 1".to_string(),
            ));
        }
        let resource_constraints = match self.resource_constraints {
            Some(constraints) => constraints,
            None => ResourceConstraints::no_constraints()?,
        };
        let skip_invalid_combinations = self.skip_invalid_combinations
            || self.force_training_type_match
            || self.force_dimensionality_match;
        let algorithms: Vec<Arc<Algorithm>> = self.algorithms.into_iter().map(Arc::new).collect();

        let len = OnceLock::new();
        if !skip_invalid_combinations {
            let points: usize = algorithms.iter().map(|a| a.param_grid().len()).sum();
            let _ = len.set(points * self.datasets.len() * self.repetitions);
        }

        Ok(Experiments {
            resolver: self.resolver,
            datasets: self.datasets,
            algorithms,
            base_result_path: self.base_result_path,
            resource_constraints,
            repetitions: self.repetitions,
            metrics: self.metrics.unwrap_or_else(DefaultMetrics::default_list),
            skip_invalid_combinations,
            force_training_type_match: self.force_training_type_match,
            force_dimensionality_match: self.force_dimensionality_match,
            len,
        })
    }
}

#[derive(Debug, Clone)]
struct Resolved {
    params: Params,
    test_path: PathBuf,
    train_path: Option<PathBuf>,
}

/// Iterator over `Experiments`; fused after the first error.
pub struct ExperimentIter<'a> {
    experiments: &'a Experiments,
    algorithm: usize,
    point: usize,
    dataset: usize,
    current: Option<Resolved>,
    repetition: usize,
    done: bool,
}

impl ExperimentIter<'_> {
    fn experiment(&self, resolved: &Resolved) -> Result<Experiment> {
        let experiments = self.experiments;
        let algorithm = &experiments.algorithms[self.algorithm];
        Experiment::new(
            experiments.datasets[self.dataset].clone(),
            Arc::clone(algorithm),
            resolved.params.clone(),
            self.repetition,
            experiments.base_result_path.clone(),
            experiments.resource_constraints.clone(),
            experiments.metrics.clone(),
            resolved.test_path.clone(),
            resolved.train_path.clone(),
        )
    }

    fn fail(&mut self, error: Error) -> Option<Result<Experiment>> {
        self.done = true;
        self.current = None;
        Some(Err(error))
    }
}

impl Iterator for ExperimentIter<'_> {
    type Item = Result<Experiment>;

    fn next(&mut self) -> Option<Self::Item> {
        let experiments = self.experiments;
        loop {
            if self.done {
                return None;
            }

            if let Some(resolved) = self.current.take() {
                if self.repetition < experiments.repetitions {
                    self.repetition += 1;
                    let experiment = self.experiment(&resolved);
                    self.current = Some(resolved);
                    return match experiment {
                        Ok(experiment) => Some(Ok(experiment)),
                        Err(error) => self.fail(error),
                    };
                }
                self.dataset += 1;
                continue;
            }

            let Some(algorithm) = experiments.algorithms.get(self.algorithm) else {
                self.done = true;
                return None;
            };
            let Some(point) = algorithm.param_grid().get(self.point) else {
                self.algorithm += 1;
                self.point = 0;
                self.dataset = 0;
                continue;
            };
            let Some(dataset) = experiments.datasets.get(self.dataset) else {
                self.point += 1;
                self.dataset = 0;
                continue;
            };
            if !experiments.is_compatible(dataset, algorithm) {
                tracing::debug!(
                    algorithm = %algorithm.name(),
                    dataset = %dataset.id(),
                    "skipping incompatible combination"
                );
                self.dataset += 1;
                continue;
            }

            match experiments.resolve(algorithm, point, dataset) {
                Ok(resolved) => {
                    self.current = Some(resolved);
                    self.repetition = 0;
                }
                Err(error) => return self.fail(error),
            }
        }
    }
}

impl std::iter::FusedIterator for ExperimentIter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::Adapter;
    use crate::dataset::{DatasetId, DatasetRegistry};
    use crate::resource_constraints::{HostResources, GIB};

    fn constraints() -> ResourceConstraints {
        ResourceConstraints::builder()
            .host(HostResources::new(9 * GIB, 8))
            .build()
            .unwrap()
    }

    fn dataset(name: &str, training: TrainingType, dim: InputDimensionality) -> Dataset {
        Dataset::new(DatasetId::new("test", name), training, dim)
    }

    fn algorithm(name: &str, training: TrainingType, dim: InputDimensionality) -> Algorithm {
        Algorithm::builder(name, Adapter::function(|_, _| Ok(vec![])))
            .training_type(training)
            .input_dimensionality(dim)
            .build()
            .unwrap()
    }

    fn builder(datasets: Vec<Dataset>, algorithms: Vec<Algorithm>) -> ExperimentsBuilder {
        let mut registry = DatasetRegistry::new("/data");
        for dataset in &datasets {
            registry.register(dataset.clone(), format!("{}.csv", dataset.name()), None);
        }
        Experiments::builder(Arc::new(registry), datasets, algorithms, "/results")
            .resource_constraints(constraints())
    }

    #[test]
    fn test_semi_supervised_algorithm_needs_matching_dataset() {
        let experiments = builder(vec![], vec![])
            .skip_invalid_combinations(true)
            .build()
            .unwrap();
        let algo = algorithm("a", TrainingType::SemiSupervised, InputDimensionality::Univariate);
        let matching = dataset("d", TrainingType::SemiSupervised, InputDimensionality::Univariate);
        let unsupervised = dataset("d", TrainingType::Unsupervised, InputDimensionality::Univariate);
        assert!(experiments.is_compatible(&matching, &algo));
        assert!(!experiments.is_compatible(&unsupervised, &algo));
    }

    #[test]
    fn test_univariate_algorithm_rejects_multivariate_dataset() {
        let experiments = builder(vec![], vec![])
            .skip_invalid_combinations(true)
            .build()
            .unwrap();
        let uni = algorithm("a", TrainingType::Unsupervised, InputDimensionality::Univariate);
        let multi = algorithm("b", TrainingType::Unsupervised, InputDimensionality::Multivariate);
        let multi_data = dataset("d", TrainingType::Unsupervised, InputDimensionality::Multivariate);
        let uni_data = dataset("e", TrainingType::Supervised, InputDimensionality::Univariate);
        assert!(!experiments.is_compatible(&multi_data, &uni));
        assert!(experiments.is_compatible(&multi_data, &multi));
        assert!(experiments.is_compatible(&uni_data, &multi));
    }

    #[test]
    fn test_force_flags() {
        let experiments = builder(vec![], vec![])
            .skip_invalid_combinations(false)
            .force_dimensionality_match(true)
            .force_training_type_match(true)
            .build()
            .unwrap();
        let multi = algorithm("b", TrainingType::Unsupervised, InputDimensionality::Multivariate);
        let uni_data = dataset("e", TrainingType::Unsupervised, InputDimensionality::Univariate);
        let supervised = dataset("f", TrainingType::Supervised, InputDimensionality::Multivariate);
        assert!(!experiments.is_compatible(&uni_data, &multi));
        assert!(!experiments.is_compatible(&supervised, &multi));
    }

    #[test]
    fn test_no_filtering_accepts_everything() {
        let experiments = builder(vec![], vec![])
            .skip_invalid_combinations(false)
            .build()
            .unwrap();
        let uni = algorithm("a", TrainingType::Supervised, InputDimensionality::Univariate);
        let multi_data = dataset("d", TrainingType::Unsupervised, InputDimensionality::Multivariate);
        assert!(experiments.is_compatible(&multi_data, &uni));
    }

    #[test]
    fn test_zero_repetitions_rejected() {
        assert!(builder(vec![], vec![]).repetitions(0).build().is_err());
    }

    #[test]
    fn test_len_matches_iteration() {
        let datasets = vec![
            dataset("uni", TrainingType::Unsupervised, InputDimensionality::Univariate),
            dataset("multi", TrainingType::Unsupervised, InputDimensionality::Multivariate),
        ];
        let algorithms = vec![
            algorithm("a", TrainingType::Unsupervised, InputDimensionality::Univariate),
            algorithm("b", TrainingType::Unsupervised, InputDimensionality::Multivariate),
        ];
        let experiments = builder(datasets.clone(), algorithms.clone())
            .skip_invalid_combinations(true)
            .repetitions(2)
            .build()
            .unwrap();
        assert_eq!(experiments.len(), 6);
        assert_eq!(experiments.iter().count(), 6);
        assert_eq!(experiments.iter().count(), 6);

        let unfiltered = builder(datasets, algorithms).repetitions(2).build().unwrap();
        assert_eq!(unfiltered.len(), 8);
        assert_eq!(unfiltered.iter().count(), 8);
    }

    #[test]
    fn test_filtering_off_by_default() {
        let experiments = builder(vec![], vec![]).build().unwrap();
        let uni = algorithm("a", TrainingType::Supervised, InputDimensionality::Univariate);
        let multi_data = dataset("d", TrainingType::Unsupervised, InputDimensionality::Multivariate);
        assert!(experiments.is_compatible(&multi_data, &uni));
    }
}
