//! Algorithm descriptors
//!
//! An `Algorithm` bundles an adapter with its parameter schema, the grid of
//! parameter points to evaluate, optional pre/post-processing transforms and
//! the training type and input dimensionality it supports.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::adapters::{Adapter, AdapterInput, CallArgs};
use crate::data_types::{InputDimensionality, TrainingType};
use crate::params::ParameterGrid;
use crate::{Error, Result};

/// Input transform applied before training and execution.
pub type PreprocessFn =
    Arc<dyn Fn(AdapterInput, &CallArgs) -> anyhow::Result<AdapterInput> + Send + Sync>;

/// Score transform applied after execution.
pub type PostprocessFn =
    Arc<dyn Fn(Vec<f64>, &CallArgs) -> anyhow::Result<Vec<f64>> + Send + Sync>;

/// Declared hyper-parameter of an algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Default value, used by heuristics that scale it.
    #[serde(rename = "defaultValue", default)]
    pub default_value: Option<Value>,
    /// Declared type (`"int"`, `"float"`, `"boolean"`, ...).
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
}

impl ParameterSpec {
    /// Parameter with a default value.
    #[must_use]
    pub fn new(default_value: impl Into<Value>, kind: impl Into<String>) -> Self {
        Self {
            default_value: Some(default_value.into()),
            kind: kind.into(),
            description: String::new(),
        }
    }

    /// Attach a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// An anomaly detector under benchmark.
#[derive(Clone)]
pub struct Algorithm {
    name: String,
    main: Adapter,
    preprocess: Option<PreprocessFn>,
    postprocess: Option<PostprocessFn>,
    params: BTreeMap<String, ParameterSpec>,
    param_grid: ParameterGrid,
    data_as_file: bool,
    training_type: TrainingType,
    input_dimensionality: InputDimensionality,
}

impl Algorithm {
    /// Create a builder for an algorithm named `name` running `main`.
    #[must_use]
    pub fn builder(name: impl Into<String>, main: impl Into<Adapter>) -> AlgorithmBuilder {
        AlgorithmBuilder {
            name: name.into(),
            main: main.into(),
            preprocess: None,
            postprocess: None,
            params: BTreeMap::new(),
            param_grid: ParameterGrid::default(),
            data_as_file: false,
            training_type: TrainingType::Unsupervised,
            input_dimensionality: InputDimensionality::Univariate,
        }
    }

    /// Algorithm name (first path component of its results).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adapter running the detector.
    #[must_use]
    pub const fn main(&self) -> &Adapter {
        &self.main
    }

    /// Input transform, if any.
    #[must_use]
    pub const fn preprocess(&self) -> Option<&PreprocessFn> {
        self.preprocess.as_ref()
    }

    /// Score transform, if any.
    #[must_use]
    pub const fn postprocess(&self) -> Option<&PostprocessFn> {
        self.postprocess.as_ref()
    }

    /// Declared parameter schema.
    #[must_use]
    pub const fn params(&self) -> &BTreeMap<String, ParameterSpec> {
        &self.params
    }

    /// Parameter points to evaluate.
    #[must_use]
    pub const fn param_grid(&self) -> &ParameterGrid {
        &self.param_grid
    }

    /// Whether the adapter receives a dataset path instead of a decoded matrix.
    #[must_use]
    pub const fn data_as_file(&self) -> bool {
        self.data_as_file
    }

    /// Supported training type.
    #[must_use]
    pub const fn training_type(&self) -> TrainingType {
        self.training_type
    }

    /// Supported input dimensionality.
    #[must_use]
    pub const fn input_dimensionality(&self) -> InputDimensionality {
        self.input_dimensionality
    }
}

impl fmt::Debug for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Algorithm")
            .field("name", &self.name)
            .field("main", &self.main)
            .field("preprocess", &self.preprocess.is_some())
            .field("postprocess", &self.postprocess.is_some())
            .field("params", &self.params)
            .field("param_grid", &self.param_grid.len())
            .field("data_as_file", &self.data_as_file)
            .field("training_type", &self.training_type)
            .field("input_dimensionality", &self.input_dimensionality)
            .finish()
    }
}

/// Builder for `Algorithm`.
pub struct AlgorithmBuilder {
    name: String,
    main: Adapter,
    preprocess: Option<PreprocessFn>,
    postprocess: Option<PostprocessFn>,
    params: BTreeMap<String, ParameterSpec>,
    param_grid: ParameterGrid,
    data_as_file: bool,
    training_type: TrainingType,
    input_dimensionality: InputDimensionality,
}

impl AlgorithmBuilder {
    /// Transform applied to the input before training and execution.
    #[must_use]
    pub fn preprocess<F>(mut self, transform: F) -> Self
    where
        F: Fn(AdapterInput, &CallArgs) -> anyhow::Result<AdapterInput> + Send + Sync + 'static,
    {
        self.preprocess = Some(Arc::new(transform));
        self
    }

    /// Transform applied to the raw scores after execution.
    #[must_use]
    pub fn postprocess<F>(mut self, transform: F) -> Self
    where
        F: Fn(Vec<f64>, &CallArgs) -> anyhow::Result<Vec<f64>> + Send + Sync + 'static,
    {
        self.postprocess = Some(Arc::new(transform));
        self
    }

    /// Declare a parameter.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, spec: ParameterSpec) -> Self {
        self.params.insert(name.into(), spec);
        self
    }

    /// Parameter points to evaluate (defaults to a single empty point).
    #[must_use]
    pub fn param_grid(mut self, grid: ParameterGrid) -> Self {
        self.param_grid = grid;
        self
    }

    /// Pass dataset paths instead of decoded matrices to the adapter.
    #[must_use]
    pub const fn data_as_file(mut self, data_as_file: bool) -> Self {
        self.data_as_file = data_as_file;
        self
    }

    /// Supported training type (defaults to unsupervised).
    #[must_use]
    pub const fn training_type(mut self, training_type: TrainingType) -> Self {
        self.training_type = training_type;
        self
    }

    /// Supported input dimensionality (defaults to univariate).
    #[must_use]
    pub const fn input_dimensionality(mut self, input_dimensionality: InputDimensionality) -> Self {
        self.input_dimensionality = input_dimensionality;
        self
    }

    /// Build the algorithm.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if the name is empty or is not a single path component.
    pub fn build(self) -> Result<Algorithm> {
        if self.name.is_empty() || self.name.contains(['/', '\\']) || self.name == ".." {
            return Err(Error::Configuration(format!(
                "algorithm name {:?} must be a non-empty single path component",
                self.name
            )));
        }
        Ok(Algorithm {
            name: self.name,
            main: self.main,
            preprocess: self.preprocess,
            postprocess: self.postprocess,
            params: self.params,
            param_grid: self.param_grid,
            data_as_file: self.data_as_file,
            training_type: self.training_type,
            input_dimensionality: self.input_dimensionality,
        })
    }
}
