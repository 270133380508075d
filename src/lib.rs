//! # tsad-bench: Time-Series Anomaly Detection Benchmarking
//!
//! tsad-bench evaluates anomaly detectors against labeled time-series
//! datasets. Every (algorithm × hyper-parameter point × dataset × repetition)
//! combination becomes an `Experiment` that trains (if needed), scores,
//! computes quality metrics and persists its artifacts in a collision-free
//! directory layout.
//!
//! ## Design Principles
//!
//! - **Deterministic enumeration**: experiments are produced lazily in a fixed order
//! - **Partial failure**: one failing metric never discards the others
//! - **Reproducible layout**: result paths depend only on the experiment identity
//! - **Explicit resources**: the host is probed once, limits are plain data
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tsad_bench::adapters::Adapter;
//! use tsad_bench::algorithm::Algorithm;
//! use tsad_bench::benchmark::Benchmark;
//! use tsad_bench::data_types::{InputDimensionality, TrainingType};
//! use tsad_bench::dataset::{Dataset, DatasetId, DatasetRegistry};
//! use tsad_bench::metrics::{DefaultMetrics, Metric};
//!
//! let dataset = Dataset::new(
//!     DatasetId::new("nab", "art_daily"),
//!     TrainingType::Unsupervised,
//!     InputDimensionality::Univariate,
//! );
//! let mut registry = DatasetRegistry::new("data");
//! registry.register(dataset.clone(), "nab/art_daily.test.csv", None);
//!
//! let magnitude = Algorithm::builder(
//!     "magnitude",
//!     Adapter::function(|input, _| {
//!         let matrix = input.as_array().ok_or_else(|| anyhow::anyhow!("expected an array"))?;
//!         Ok(matrix.column(0).into_iter().map(f64::abs).collect())
//!     }),
//! )
//! .build()?;
//!
//! let benchmark = Benchmark::builder(Arc::new(registry), vec![dataset], vec![magnitude])
//!     .results_path("results")
//!     .repetitions(3)
//!     .metrics(vec![
//!         DefaultMetrics::default_metric(),
//!         Arc::new(DefaultMetrics::range_pr_auc()) as Arc<dyn Metric>,
//!     ])
//!     .build()?;
//! let table = benchmark.run()?;
//! for row in table.aggregate() {
//!     println!("{} {:?}", row.algorithm, row.mean);
//! }
//! # Ok::<(), tsad_bench::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod adapters;
pub mod algorithm;
pub mod benchmark;
pub mod data_types;
pub mod dataset;
pub mod error;
pub mod experiment;
pub mod heuristics;
pub mod logging;
pub mod metrics;
pub mod params;
pub mod resource_constraints;
pub mod times;

pub use error::{Error, Result};
