//! Benchmark driver
//!
//! Builds the experiment collection for one run, evaluates every experiment
//! and writes the aggregated `results.csv` into a timestamped run directory:
//!
//! ```text
//! <results_path>/<%Y_%m_%d_%H_%M_%S>/
//!     results.csv
//!     <algorithm>/<params_id>/<collection>/<dataset>/<repetition>/...
//! ```
//!
//! Two run modes exist:
//! - `Local`: experiments run one after another; `tasks_per_host` is forced to 1
//! - `Pool`: experiments run on a worker pool sized by `tasks_per_host`
//!   (feature `parallel`)

mod config;
mod results;

pub use config::BenchmarkConfig;
pub use results::{AggregateRow, ResultRow, ResultsTable, Status};

use std::path::{Path, PathBuf};
use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::algorithm::Algorithm;
use crate::dataset::{Dataset, DatasetResolver};
use crate::experiment::{Experiment, Experiments, RESULTS_CSV, RUN_DIR_FORMAT};
use crate::metrics::Metric;
use crate::resource_constraints::ResourceConstraints;
#[cfg(not(feature = "parallel"))]
use crate::Error;
use crate::Result;

/// How experiments are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Sequentially on the calling thread.
    Local,
    /// Concurrently on `workers` threads.
    Pool {
        /// Worker thread count.
        workers: usize,
    },
}

/// A configured benchmark run.
#[derive(Debug)]
pub struct Benchmark {
    experiments: Experiments,
    run_dir: PathBuf,
    mode: RunMode,
}

impl Benchmark {
    /// Create a builder over the given datasets and algorithms.
    #[must_use]
    pub fn builder(
        resolver: Arc<dyn DatasetResolver>,
        datasets: Vec<Dataset>,
        algorithms: Vec<Algorithm>,
    ) -> BenchmarkBuilder {
        BenchmarkBuilder {
            resolver,
            datasets,
            algorithms,
            config: BenchmarkConfig::default(),
            resource_constraints: None,
            metrics: None,
        }
    }

    /// Experiments of this run.
    #[must_use]
    pub const fn experiments(&self) -> &Experiments {
        &self.experiments
    }

    /// Timestamped directory receiving all artifacts of this run.
    #[must_use]
    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Scheduling mode.
    #[must_use]
    pub const fn mode(&self) -> RunMode {
        self.mode
    }

    /// Evaluate every experiment and write `results.csv`.
    ///
    /// Failed experiments become rows with status `ERROR` or `TIMEOUT`.
    ///
    /// # Errors
    ///
    /// Returns the first enumeration error (e.g. an unresolvable test split),
    /// which halts the run, or an I/O error while writing `results.csv`.
    pub fn run(&self) -> Result<ResultsTable> {
        let span = tracing::info_span!(
            "benchmark",
            run_dir = %self.run_dir.display(),
            experiments = self.experiments.len(),
        );
        let _entered = span.enter();
        tracing::info!(mode = ?self.mode, "starting benchmark run");

        let rows = match self.mode {
            RunMode::Local => self.run_local()?,
            RunMode::Pool { workers } => self.run_pool(workers)?,
        };
        let table = ResultsTable::from_rows(rows);

        std::fs::create_dir_all(&self.run_dir)?;
        table.write_csv(&self.run_dir.join(RESULTS_CSV))?;
        tracing::info!(
            rows = table.len(),
            failed = table.len() - table.with_status(Status::Ok).count(),
            "benchmark run finished"
        );
        Ok(table)
    }

    fn run_local(&self) -> Result<Vec<ResultRow>> {
        let mut rows = Vec::with_capacity(self.experiments.len());
        for experiment in &self.experiments {
            rows.push(run_experiment(&experiment?));
        }
        Ok(rows)
    }

    #[cfg(feature = "parallel")]
    fn run_pool(&self, workers: usize) -> Result<Vec<ResultRow>> {
        let experiments = self.experiments.iter().collect::<Result<Vec<_>>>()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("tsad-bench-{index}"))
            .build()
            .map_err(|e| crate::Error::Configuration(format!("cannot start worker pool: {e}")))?;
        Ok(pool.install(|| experiments.par_iter().map(run_experiment).collect()))
    }

    #[cfg(not(feature = "parallel"))]
    fn run_pool(&self, _workers: usize) -> Result<Vec<ResultRow>> {
        Err(Error::Configuration(
            "pool mode needs the `parallel` feature".to_string(),
        ))
    }
}

fn run_experiment(experiment: &Experiment) -> ResultRow {
    let outcome = experiment.evaluate();
    if let Err(error) = &outcome {
        tracing::error!(
            algorithm = %experiment.algorithm().name(),
            dataset = %experiment.dataset().id(),
            params_id = %experiment.params_id(),
            repetition = experiment.repetition(),
            error = %error,
            "experiment failed"
        );
    }
    ResultRow::from_outcome(experiment, &outcome)
}

/// Builder for `Benchmark`.
pub struct BenchmarkBuilder {
    resolver: Arc<dyn DatasetResolver>,
    datasets: Vec<Dataset>,
    algorithms: Vec<Algorithm>,
    config: BenchmarkConfig,
    resource_constraints: Option<ResourceConstraints>,
    metrics: Option<Vec<Arc<dyn Metric>>>,
}

impl BenchmarkBuilder {
    /// Apply a whole configuration, replacing earlier settings.
    #[must_use]
    pub fn config(mut self, config: BenchmarkConfig) -> Self {
        self.config = config;
        self
    }

    /// Directory receiving the run directory.
    #[must_use]
    pub fn results_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.results_path = path.into();
        self
    }

    /// Repetitions per combination.
    #[must_use]
    pub const fn repetitions(mut self, repetitions: usize) -> Self {
        self.config.repetitions = repetitions;
        self
    }

    /// Use a worker pool instead of running sequentially.
    #[must_use]
    pub const fn distributed(mut self, distributed: bool) -> Self {
        self.config.distributed = distributed;
        self
    }

    /// Skip incompatible algorithm/dataset pairs.
    #[must_use]
    pub const fn skip_invalid_combinations(mut self, skip: bool) -> Self {
        self.config.skip_invalid_combinations = skip;
        self
    }

    /// Require equal training types for every algorithm.
    #[must_use]
    pub const fn force_training_type_match(mut self, force: bool) -> Self {
        self.config.force_training_type_match = force;
        self
    }

    /// Require equal input dimensionalities.
    #[must_use]
    pub const fn force_dimensionality_match(mut self, force: bool) -> Self {
        self.config.force_dimensionality_match = force;
        self
    }

    /// Explicit resource constraints; the limits of the configuration are ignored.
    #[must_use]
    pub fn resource_constraints(mut self, constraints: ResourceConstraints) -> Self {
        self.resource_constraints = Some(constraints);
        self
    }

    /// Metrics to compute (default: ROC AUC).
    #[must_use]
    pub fn metrics(mut self, metrics: Vec<Arc<dyn Metric>>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Resolve constraints and run mode and build the experiment collection.
    ///
    /// # Errors
    ///
    /// Returns `Error::HostProbe` if the host must be probed and cannot be,
    /// or `Error::Configuration` for invalid settings.
    pub fn build(self) -> Result<Benchmark> {
        let config = self.config;
        let constraints = match self.resource_constraints {
            Some(constraints) => constraints,
            None => config.resource_constraints(None)?,
        };

        let (constraints, mode) = if config.distributed {
            let workers = constraints.tasks_per_host();
            (constraints, RunMode::Pool { workers })
        } else {
            if constraints.tasks_per_host() > 1 {
                tracing::warn!(
                    tasks_per_host = constraints.tasks_per_host(),
                    "local execution runs one task at a time, forcing tasks_per_host = 1"
                );
            }
            (constraints.with_tasks_per_host(1), RunMode::Local)
        };

        let run_dir = config
            .results_path
            .join(chrono::Local::now().format(RUN_DIR_FORMAT).to_string());

        let mut experiments =
            Experiments::builder(self.resolver, self.datasets, self.algorithms, run_dir.clone())
                .resource_constraints(constraints)
                .repetitions(config.repetitions)
                .skip_invalid_combinations(config.skip_invalid_combinations)
                .force_training_type_match(config.force_training_type_match)
                .force_dimensionality_match(config.force_dimensionality_match);
        if let Some(metrics) = self.metrics {
            experiments = experiments.metrics(metrics);
        }

        Ok(Benchmark {
            experiments: experiments.build()?,
            run_dir,
            mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DatasetRegistry;
    use crate::resource_constraints::{HostResources, GIB};

    fn builder() -> BenchmarkBuilder {
        Benchmark::builder(Arc::new(DatasetRegistry::new("/data")), vec![], vec![])
            .results_path("/results")
    }

    fn constraints(tasks: usize) -> ResourceConstraints {
        ResourceConstraints::builder()
            .host(HostResources::new(9 * GIB, 8))
            .tasks_per_host(tasks)
            .build()
            .unwrap()
    }

    #[test]
    fn test_local_mode_forces_single_task() {
        let benchmark = builder().resource_constraints(constraints(4)).build().unwrap();
        assert_eq!(benchmark.mode(), RunMode::Local);
        let resolved = benchmark.experiments().resource_constraints();
        assert_eq!(resolved.tasks_per_host(), 1);
        assert_eq!(resolved.get_resource_limits(None, None), (8 * GIB, 8.0));
    }

    #[test]
    fn test_pool_mode_keeps_tasks_per_host() {
        let benchmark = builder()
            .distributed(true)
            .resource_constraints(constraints(4))
            .build()
            .unwrap();
        assert_eq!(benchmark.mode(), RunMode::Pool { workers: 4 });
        assert_eq!(benchmark.experiments().resource_constraints().tasks_per_host(), 4);
    }

    #[test]
    fn test_run_dir_is_timestamped() {
        let benchmark = builder().resource_constraints(constraints(1)).build().unwrap();
        let name = benchmark.run_dir().file_name().unwrap().to_string_lossy().into_owned();
        assert!(benchmark.run_dir().starts_with("/results"));
        assert!(chrono::NaiveDateTime::parse_from_str(&name, RUN_DIR_FORMAT).is_ok());
    }
}
