//! Algorithm adapters
//!
//! An adapter is how the benchmark reaches an anomaly detector. Three
//! execution strategies exist, modelled as variants of `Adapter`:
//! - `Function`: in-process closures over a path or a decoded matrix
//! - `Process`: an external executable following the algorithm interface
//! - `Docker`: a container image following the same interface
//!
//! Every strategy offers `execute`; `train` is an optional capability.

mod docker;
mod process;

pub use docker::DockerAdapter;
pub use process::{read_scores, AlgorithmInterface, ProcessAdapter, MODEL_FILE_NAME};

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::data_types::ExecutionPhase;
use crate::experiment::ANOMALY_SCORES_TS;
use crate::dataset::{DataMatrix, Dataset};
use crate::params::Params;
use crate::resource_constraints::ResourceConstraints;
use crate::{Error, Result};

/// Data handed to an adapter: a dataset file or its decoded value channels.
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterInput {
    /// Path to the dataset CSV file.
    Path(PathBuf),
    /// Decoded value channels (timestamp and label columns removed for execution).
    Array(DataMatrix),
}

impl AdapterInput {
    /// The dataset path, if this input is a path.
    #[must_use]
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Path(path) => Some(path),
            Self::Array(_) => None,
        }
    }

    /// The decoded matrix, if this input is an array.
    #[must_use]
    pub const fn as_array(&self) -> Option<&DataMatrix> {
        match self {
            Self::Path(_) => None,
            Self::Array(matrix) => Some(matrix),
        }
    }
}

/// Context passed to every adapter and transform call.
#[derive(Debug, Clone)]
pub struct CallArgs {
    /// Directory receiving the artifacts of this experiment.
    pub results_path: PathBuf,
    /// Resource budget of this experiment.
    pub resource_constraints: ResourceConstraints,
    /// Resolved hyper-parameters.
    pub hyper_params: Params,
    /// Descriptor of the evaluated dataset.
    pub dataset: Dataset,
}

/// Training closure of a function adapter.
pub type TrainFn = Arc<dyn Fn(&AdapterInput, &CallArgs) -> anyhow::Result<()> + Send + Sync>;

/// Scoring closure of a function adapter.
pub type ExecuteFn =
    Arc<dyn Fn(&AdapterInput, &CallArgs) -> anyhow::Result<Vec<f64>> + Send + Sync>;

/// In-process adapter built from closures.
#[derive(Clone)]
pub struct FunctionAdapter {
    execute: ExecuteFn,
    train: Option<TrainFn>,
}

impl FunctionAdapter {
    /// Adapter scoring with `execute`; no training capability.
    pub fn new<F>(execute: F) -> Self
    where
        F: Fn(&AdapterInput, &CallArgs) -> anyhow::Result<Vec<f64>> + Send + Sync + 'static,
    {
        Self {
            execute: Arc::new(execute),
            train: None,
        }
    }

    /// Add a training step.
    #[must_use]
    pub fn with_train<F>(mut self, train: F) -> Self
    where
        F: Fn(&AdapterInput, &CallArgs) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.train = Some(Arc::new(train));
        self
    }
}

impl fmt::Debug for FunctionAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionAdapter")
            .field("supports_training", &self.train.is_some())
            .finish_non_exhaustive()
    }
}

/// Execution strategy of an algorithm.
#[derive(Debug, Clone)]
pub enum Adapter {
    /// In-process closures.
    Function(FunctionAdapter),
    /// External executable.
    Process(ProcessAdapter),
    /// Container image.
    Docker(DockerAdapter),
}

impl Adapter {
    /// Function adapter from a scoring closure.
    pub fn function<F>(execute: F) -> Self
    where
        F: Fn(&AdapterInput, &CallArgs) -> anyhow::Result<Vec<f64>> + Send + Sync + 'static,
    {
        Self::Function(FunctionAdapter::new(execute))
    }

    /// Whether `train` can be called.
    #[must_use]
    pub const fn supports_training(&self) -> bool {
        match self {
            Self::Function(adapter) => adapter.train.is_some(),
            Self::Process(adapter) => adapter.supports_training(),
            Self::Docker(adapter) => adapter.supports_training(),
        }
    }

    /// Run the training step.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if the adapter cannot train, `Error::Timeout`
    /// if the training timeout elapsed, or `Error::Adapter` if training failed.
    pub fn train(&self, input: &AdapterInput, args: &CallArgs) -> Result<()> {
        match self {
            Self::Function(FunctionAdapter {
                train: Some(train), ..
            }) => train(input, args).map_err(Error::Adapter),
            Self::Process(adapter) if adapter.supports_training() => {
                adapter.run(ExecutionPhase::Train, input, args)
            }
            Self::Docker(adapter) if adapter.supports_training() => {
                adapter.run(ExecutionPhase::Train, input, args)
            }
            _ => Err(Error::Configuration(
                "the algorithm adapter does not support training".to_string(),
            )),
        }
    }

    /// Run the scoring step and return one anomaly score per time step.
    ///
    /// # Errors
    ///
    /// Returns `Error::Timeout` if the execution timeout elapsed, or
    /// `Error::Adapter` if execution failed or produced no readable scores.
    pub fn execute(&self, input: &AdapterInput, args: &CallArgs) -> Result<Vec<f64>> {
        match self {
            Self::Function(adapter) => (adapter.execute)(input, args).map_err(Error::Adapter),
            Self::Process(adapter) => {
                adapter.run(ExecutionPhase::Execute, input, args)?;
                read_scores(&args.results_path.join(ANOMALY_SCORES_TS))
            }
            Self::Docker(adapter) => {
                adapter.run(ExecutionPhase::Execute, input, args)?;
                read_scores(&args.results_path.join(ANOMALY_SCORES_TS))
            }
        }
    }
}

impl From<FunctionAdapter> for Adapter {
    fn from(adapter: FunctionAdapter) -> Self {
        Self::Function(adapter)
    }
}

impl From<ProcessAdapter> for Adapter {
    fn from(adapter: ProcessAdapter) -> Self {
        Self::Process(adapter)
    }
}

impl From<DockerAdapter> for Adapter {
    fn from(adapter: DockerAdapter) -> Self {
        Self::Docker(adapter)
    }
}
