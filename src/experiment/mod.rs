//! Experiments: enumeration, evaluation and result layout
//!
//! ## Overview
//!
//! ```text
//! Experiments (algorithms × params × datasets × repetitions)
//!      │ iter()
//!      ▼
//! Experiment ── evaluate() ──> ResultRecord
//!      │
//!      └── <base>/<algorithm>/<params_id>/<collection>/<dataset>/<repetition>/
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tsad_bench::adapters::Adapter;
//! use tsad_bench::algorithm::Algorithm;
//! use tsad_bench::data_types::{InputDimensionality, TrainingType};
//! use tsad_bench::dataset::{Dataset, DatasetId, DatasetRegistry};
//! use tsad_bench::experiment::Experiments;
//!
//! let dataset = Dataset::new(
//!     DatasetId::new("nab", "art"),
//!     TrainingType::Unsupervised,
//!     InputDimensionality::Univariate,
//! );
//! let mut registry = DatasetRegistry::new("data");
//! registry.register(dataset.clone(), "nab/art.test.csv", None);
//!
//! let algorithm = Algorithm::builder("zeros", Adapter::function(|input, _| {
//!     Ok(vec![0.0; input.as_array().map_or(0, |m| m.rows())])
//! }))
//! .build()?;
//!
//! let experiments =
//!     Experiments::builder(Arc::new(registry), vec![dataset], vec![algorithm], "results")
//!         .build()?;
//! for experiment in &experiments {
//!     let record = experiment?.evaluate()?;
//!     println!("{:?}", record.get("ROC_AUC"));
//! }
//! # Ok::<(), tsad_bench::Error>(())
//! ```

mod evaluate;
mod experiments;
mod layout;
mod result;
mod stage;

pub use evaluate::{min_max_scale, Experiment};
pub use experiments::{ExperimentIter, Experiments, ExperimentsBuilder};
pub use layout::{
    append_lines, generate_experiment_path, path_segment, write_scores, write_single_row_csv,
    ANOMALY_SCORES_TS, EXECUTION_LOG, HYPER_PARAMETERS, METRICS_CSV, RESULTS_CSV, RUN_DIR_FORMAT,
};
pub use result::ResultRecord;
pub use stage::ExperimentStage;
