//! Tabular benchmark results
//!
//! One `ResultRow` per evaluated experiment, in enumeration order. The table
//! is written as `results.csv` with the descriptive columns first, then the
//! timing and metric columns (union over all rows, first-seen order), then
//! status and parameter columns.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray, UInt64Array};
use arrow::csv::WriterBuilder;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};

use crate::data_types::{InputDimensionality, TrainingType};
use crate::experiment::{Experiment, ResultRecord};
use crate::params::canonical_json;
use crate::{Error, Result};

/// Outcome of one experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    /// Evaluated and at least one metric computed.
    Ok,
    /// Failed with an error other than a timeout.
    Error,
    /// The adapter exceeded its time budget.
    Timeout,
}

impl Status {
    /// Upper-case name as written to `results.csv`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Error => "ERROR",
            Self::Timeout => "TIMEOUT",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one experiment as recorded by the driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    /// Algorithm name.
    pub algorithm: String,
    /// Dataset collection name.
    pub collection: String,
    /// Dataset name.
    pub dataset: String,
    /// Training type of the algorithm.
    pub algo_training_type: TrainingType,
    /// Input dimensionality of the algorithm.
    pub algo_input_dimensionality: InputDimensionality,
    /// Training type of the dataset.
    pub dataset_training_type: TrainingType,
    /// Input dimensionality of the dataset.
    pub dataset_input_dimensionality: InputDimensionality,
    /// Outcome.
    pub status: Status,
    /// Error message of a failed experiment.
    pub error_message: Option<String>,
    /// Repetition index, starting at 1.
    pub repetition: usize,
    /// Canonical JSON of the hyper-parameters.
    pub hyper_params: String,
    /// Hash of `hyper_params`.
    pub hyper_params_id: String,
    /// Timing columns and metric scores; empty for failed experiments.
    pub values: ResultRecord,
}

impl ResultRow {
    /// Row describing `experiment` and the outcome of its evaluation.
    #[must_use]
    pub fn from_outcome(experiment: &Experiment, outcome: &Result<ResultRecord>) -> Self {
        let (status, error_message, values) = match outcome {
            Ok(record) => (Status::Ok, None, record.clone()),
            Err(error) => {
                let status = if error.is_timeout() {
                    Status::Timeout
                } else {
                    Status::Error
                };
                (status, Some(error.to_string()), ResultRecord::new())
            }
        };
        let algorithm = experiment.algorithm();
        let dataset = experiment.dataset();
        Self {
            algorithm: algorithm.name().to_string(),
            collection: dataset.collection_name().to_string(),
            dataset: dataset.name().to_string(),
            algo_training_type: algorithm.training_type(),
            algo_input_dimensionality: algorithm.input_dimensionality(),
            dataset_training_type: dataset.training_type(),
            dataset_input_dimensionality: dataset.input_dimensionality(),
            status,
            error_message,
            repetition: experiment.repetition(),
            hyper_params: canonical_json(experiment.params()).unwrap_or_default(),
            hyper_params_id: experiment.params_id().to_string(),
            values,
        }
    }
}

/// Mean and standard deviation of the numeric columns of one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    /// Algorithm name.
    pub algorithm: String,
    /// Dataset collection name.
    pub collection: String,
    /// Dataset name.
    pub dataset: String,
    /// Hash of the hyper-parameters.
    pub hyper_params_id: String,
    /// Rows in the group (including failed repetitions).
    pub repetitions: usize,
    /// Mean per column over the rows that have a value.
    pub mean: Vec<(String, Option<f64>)>,
    /// Sample standard deviation per column; `None` with fewer than two values.
    pub std: Vec<(String, Option<f64>)>,
}

/// Rows of a benchmark run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultsTable {
    rows: Vec<ResultRow>,
}

impl ResultsTable {
    /// Table over `rows`, kept in order.
    #[must_use]
    pub const fn from_rows(rows: Vec<ResultRow>) -> Self {
        Self { rows }
    }

    /// All rows.
    #[must_use]
    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows with the given status.
    pub fn with_status(&self, status: Status) -> impl Iterator<Item = &ResultRow> {
        self.rows.iter().filter(move |row| row.status == status)
    }

    /// Names of the timing and metric columns, in first-seen order.
    #[must_use]
    pub fn value_columns(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for row in &self.rows {
            for name in row.values.names() {
                if !names.iter().any(|existing| existing == name) {
                    names.push(name.to_string());
                }
            }
        }
        names
    }

    /// Group rows by (algorithm, collection, dataset, hyper_params_id), sorted by key.
    #[must_use]
    pub fn aggregate(&self) -> Vec<AggregateRow> {
        let columns = self.value_columns();
        let mut groups: BTreeMap<(&str, &str, &str, &str), Vec<&ResultRow>> = BTreeMap::new();
        for row in &self.rows {
            groups
                .entry((
                    row.algorithm.as_str(),
                    row.collection.as_str(),
                    row.dataset.as_str(),
                    row.hyper_params_id.as_str(),
                ))
                .or_default()
                .push(row);
        }

        groups
            .into_iter()
            .map(|((algorithm, collection, dataset, hyper_params_id), rows)| {
                let mut mean = Vec::with_capacity(columns.len());
                let mut std = Vec::with_capacity(columns.len());
                for column in &columns {
                    let values: Vec<f64> =
                        rows.iter().filter_map(|row| row.values.get(column)).collect();
                    let (column_mean, column_std) = mean_and_std(&values);
                    mean.push((column.clone(), column_mean));
                    std.push((column.clone(), column_std));
                }
                AggregateRow {
                    algorithm: algorithm.to_string(),
                    collection: collection.to_string(),
                    dataset: dataset.to_string(),
                    hyper_params_id: hyper_params_id.to_string(),
                    repetitions: rows.len(),
                    mean,
                    std,
                }
            })
            .collect()
    }

    /// Write the table as CSV with a header row.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch cannot be built or written.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let batch = self.to_record_batch()?;
        let file = std::fs::File::create(path)?;
        let mut writer = WriterBuilder::new().with_header(true).build(file);
        writer.write(&batch)?;
        Ok(())
    }

    fn to_record_batch(&self) -> Result<RecordBatch> {
        let mut fields = Vec::new();
        let mut arrays: Vec<ArrayRef> = Vec::new();
        let mut push_text = |name: &str, values: Vec<Option<&str>>| {
            fields.push(Field::new(name, DataType::Utf8, true));
            arrays.push(Arc::new(StringArray::from(values)));
        };

        push_text("algorithm", self.texts(|row| Some(row.algorithm.as_str())));
        push_text("collection", self.texts(|row| Some(row.collection.as_str())));
        push_text("dataset", self.texts(|row| Some(row.dataset.as_str())));
        push_text(
            "algo_training_type",
            self.texts(|row| Some(row.algo_training_type.as_str())),
        );
        push_text(
            "algo_input_dimensionality",
            self.texts(|row| Some(row.algo_input_dimensionality.as_str())),
        );
        push_text(
            "dataset_training_type",
            self.texts(|row| Some(row.dataset_training_type.as_str())),
        );
        push_text(
            "dataset_input_dimensionality",
            self.texts(|row| Some(row.dataset_input_dimensionality.as_str())),
        );

        for column in self.value_columns() {
            let values: Vec<Option<f64>> =
                self.rows.iter().map(|row| row.values.get(&column)).collect();
            fields.push(Field::new(&column, DataType::Float64, true));
            arrays.push(Arc::new(Float64Array::from(values)));
        }

        let statuses = self.texts(|row| Some(row.status.as_str()));
        let messages = self.texts(|row| row.error_message.as_deref());
        fields.push(Field::new("status", DataType::Utf8, false));
        arrays.push(Arc::new(StringArray::from(statuses)));
        fields.push(Field::new("error_message", DataType::Utf8, true));
        arrays.push(Arc::new(StringArray::from(messages)));

        let repetitions = self
            .rows
            .iter()
            .map(|row| u64::try_from(row.repetition))
            .collect::<std::result::Result<Vec<u64>, _>>()
            .map_err(|e| Error::Storage(format!("repetition out of range: {e}")))?;
        fields.push(Field::new("repetition", DataType::UInt64, false));
        arrays.push(Arc::new(UInt64Array::from(repetitions)));

        let hyper_params = self.texts(|row| Some(row.hyper_params.as_str()));
        let hyper_params_ids = self.texts(|row| Some(row.hyper_params_id.as_str()));
        fields.push(Field::new("hyper_params", DataType::Utf8, false));
        arrays.push(Arc::new(StringArray::from(hyper_params)));
        fields.push(Field::new("hyper_params_id", DataType::Utf8, false));
        arrays.push(Arc::new(StringArray::from(hyper_params_ids)));

        Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
    }

    fn texts<'a, F>(&'a self, field: F) -> Vec<Option<&'a str>>
    where
        F: Fn(&'a ResultRow) -> Option<&'a str>,
    {
        self.rows.iter().map(field).collect()
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean_and_std(values: &[f64]) -> (Option<f64>, Option<f64>) {
    if values.is_empty() {
        return (None, None);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() < 2 {
        return (Some(mean), None);
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (Some(mean), Some(variance.sqrt()))
}
