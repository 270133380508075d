//! Result directory layout and artifact writers
//!
//! ```text
//! <base>/<algorithm>/<params_id>/<collection>/<dataset>/<repetition>/
//!     anomaly_scores.ts    one score per line, no trailing newline
//!     metrics.csv          header row + one value row
//!     hyper_params.json    canonical JSON of the parameters
//!     execution.log        stage messages
//! ```

use std::borrow::Cow;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array};
use arrow::csv::WriterBuilder;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use crate::Result;

/// Stage messages of one experiment.
pub const EXECUTION_LOG: &str = "execution.log";
/// Min-max scaled anomaly scores.
pub const ANOMALY_SCORES_TS: &str = "anomaly_scores.ts";
/// Timing columns and metric scores of one experiment.
pub const METRICS_CSV: &str = "metrics.csv";
/// Resolved hyper-parameters.
pub const HYPER_PARAMETERS: &str = "hyper_params.json";
/// Aggregated table of a benchmark run.
pub const RESULTS_CSV: &str = "results.csv";
/// `chrono` format of benchmark run directory names.
pub const RUN_DIR_FORMAT: &str = "%Y_%m_%d_%H_%M_%S";

/// Results directory of one experiment.
///
/// Pure: identical inputs give identical paths, and each component lands in
/// its own path segment (see `path_segment`).
#[must_use]
pub fn generate_experiment_path(
    base_results_dir: &Path,
    algorithm_name: &str,
    params_id: &str,
    dataset_collection: &str,
    dataset_name: &str,
    repetition: usize,
) -> PathBuf {
    base_results_dir
        .join(path_segment(algorithm_name).as_ref())
        .join(path_segment(params_id).as_ref())
        .join(path_segment(dataset_collection).as_ref())
        .join(path_segment(dataset_name).as_ref())
        .join(repetition.to_string())
}

/// Encode a name as exactly one path segment.
///
/// `%`, `/` and `\` are percent-encoded, and names consisting only of dots
/// (or empty names) have every character encoded, so distinct names always
/// map to distinct segments. Ordinary names are returned unchanged.
#[must_use]
pub fn path_segment(name: &str) -> Cow<'_, str> {
    if name.is_empty() {
        return Cow::Borrowed("%00");
    }
    if name.chars().all(|c| c == '.') {
        return Cow::Owned("%2E".repeat(name.len()));
    }
    if !name.contains(['%', '/', '\\']) {
        return Cow::Borrowed(name);
    }
    let mut encoded = String::with_capacity(name.len() + 8);
    for c in name.chars() {
        match c {
            '%' => encoded.push_str("%25"),
            '/' => encoded.push_str("%2F"),
            '\\' => encoded.push_str("%5C"),
            _ => encoded.push(c),
        }
    }
    Cow::Owned(encoded)
}

/// Write scores one per line, without a trailing newline.
///
/// # Errors
///
/// Returns `Error::Io` if the write fails.
pub fn write_scores(path: &Path, scores: &[f64]) -> Result<()> {
    let text = scores
        .iter()
        .map(|score| format!("{score:?}"))
        .collect::<Vec<_>>()
        .join("\n");
    std::fs::write(path, text)?;
    Ok(())
}

/// Write a single-row CSV table of nullable floats.
///
/// # Errors
///
/// Returns an error if the batch cannot be built or written.
pub fn write_single_row_csv(path: &Path, columns: &[(String, Option<f64>)]) -> Result<()> {
    let fields: Vec<Field> = columns
        .iter()
        .map(|(name, _)| Field::new(name, DataType::Float64, true))
        .collect();
    let arrays: Vec<ArrayRef> = columns
        .iter()
        .map(|(_, value)| Arc::new(Float64Array::from(vec![*value])) as ArrayRef)
        .collect();
    let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?;

    let file = std::fs::File::create(path)?;
    let mut writer = WriterBuilder::new().with_header(true).build(file);
    writer.write(&batch)?;
    Ok(())
}

/// Append lines to a log file, creating it if needed.
///
/// # Errors
///
/// Returns `Error::Io` if the file cannot be opened or written.
pub fn append_lines(path: &Path, lines: &[String]) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    for line in lines {
        writeln!(file, "{line}")?;
    }
    Ok(())
}
