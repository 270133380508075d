//! Dataset CSV loading (Arrow CSV reader)
//!
//! Dataset files have a header row; the first column is the timestamp, the
//! last column is the integer anomaly label, and everything in between is a
//! value channel.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, Float64Array, Int64Array};
use arrow::compute::{cast, concat_batches};
use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;

use crate::metrics::NumericArray;
use crate::{Error, Result};

/// Dense row-major matrix of value channels.
#[derive(Debug, Clone, PartialEq)]
pub struct DataMatrix {
    rows: usize,
    columns: usize,
    values: Vec<f64>,
}

impl DataMatrix {
    /// Create a matrix from row-major values.
    ///
    /// # Errors
    ///
    /// Returns `Error::Storage` if `values.len() != rows * columns`.
    pub fn new(rows: usize, columns: usize, values: Vec<f64>) -> Result<Self> {
        if rows * columns != values.len() {
            return Err(Error::Storage(format!(
                "matrix of shape ({rows}, {columns}) cannot hold {} values",
                values.len()
            )));
        }
        Ok(Self {
            rows,
            columns,
            values,
        })
    }

    /// Single-channel matrix from a series.
    #[must_use]
    pub fn from_series(series: Vec<f64>) -> Self {
        Self {
            rows: series.len(),
            columns: 1,
            values: series,
        }
    }

    /// Row-major matrix from equally long columns.
    ///
    /// # Errors
    ///
    /// Returns `Error::Storage` if a column does not have `rows` entries.
    pub fn from_columns(rows: usize, columns: &[Vec<f64>]) -> Result<Self> {
        if let Some(short) = columns.iter().find(|column| column.len() != rows) {
            return Err(Error::Storage(format!(
                "column of length {} does not match {rows} rows",
                short.len()
            )));
        }
        let mut values = Vec::with_capacity(rows * columns.len());
        for row in 0..rows {
            values.extend(columns.iter().map(|column| column[row]));
        }
        Self::new(rows, columns.len(), values)
    }

    /// Number of rows (time steps).
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (channels).
    #[must_use]
    pub const fn columns(&self) -> usize {
        self.columns
    }

    /// All values in row-major order.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Values of one row.
    #[must_use]
    pub fn row(&self, index: usize) -> &[f64] {
        &self.values[index * self.columns..(index + 1) * self.columns]
    }

    /// Copy of one column.
    #[must_use]
    pub fn column(&self, index: usize) -> Vec<f64> {
        self.values
            .iter()
            .skip(index)
            .step_by(self.columns.max(1))
            .copied()
            .collect()
    }
}

/// A decoded dataset file.
#[derive(Debug, Clone)]
pub struct DatasetFrame {
    batch: RecordBatch,
}

impl DatasetFrame {
    /// Wrap an existing record batch.
    #[must_use]
    pub const fn new(batch: RecordBatch) -> Self {
        Self { batch }
    }

    /// `(rows, columns)` including timestamp and label columns.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.batch.num_rows(), self.batch.num_columns())
    }

    /// Column names from the header row.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|field| field.name().clone())
            .collect()
    }

    /// Underlying record batch.
    #[must_use]
    pub const fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Column converted to `f64`; missing values become NaN.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range or the column is not numeric.
    pub fn column_f64(&self, index: usize) -> Result<Vec<f64>> {
        let column = self.checked_column(index)?;
        let converted = cast(column, &DataType::Float64)?;
        let values = converted
            .as_any()
            .downcast_ref::<Float64Array>()
            .ok_or_else(|| Error::Storage(format!("column {index} is not numeric")))?;
        Ok(values.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }

    /// Column converted to `i64`.
    ///
    /// # Errors
    ///
    /// Returns an error if the column contains missing or non-integral entries.
    pub fn column_i64(&self, index: usize) -> Result<Vec<i64>> {
        let column = self.checked_column(index)?;
        let converted = cast(column, &DataType::Int64)?;
        let values = converted
            .as_any()
            .downcast_ref::<Int64Array>()
            .ok_or_else(|| Error::Storage(format!("column {index} is not integral")))?;
        if values.null_count() > 0 {
            return Err(Error::Storage(format!(
                "column {index} contains {} missing or non-integral entries",
                values.null_count()
            )));
        }
        Ok(values.values().to_vec())
    }

    /// All columns (timestamp and label included) as a matrix.
    ///
    /// # Errors
    ///
    /// Returns an error if a column is not numeric.
    pub fn to_matrix(&self) -> Result<DataMatrix> {
        let (rows, columns) = self.shape();
        let channels = (0..columns)
            .map(|index| self.column_f64(index))
            .collect::<Result<Vec<_>>>()?;
        DataMatrix::from_columns(rows, &channels)
    }

    fn checked_column(&self, index: usize) -> Result<&Arc<dyn Array>> {
        if index >= self.batch.num_columns() {
            return Err(Error::Storage(format!(
                "column index {index} out of bounds (dataset has {} columns)",
                self.batch.num_columns()
            )));
        }
        Ok(self.batch.column(index))
    }
}

/// Read a dataset CSV file.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or parsed.
pub fn load_dataset(path: &Path) -> Result<DatasetFrame> {
    let open = || {
        File::open(path).map_err(|e| {
            Error::Storage(format!("failed to open dataset {}: {e}", path.display()))
        })
    };

    let format = Format::default().with_header(true);
    let (schema, _) = format.infer_schema(open()?, None)?;
    let schema = Arc::new(schema);

    let reader = ReaderBuilder::new(Arc::clone(&schema))
        .with_header(true)
        .build(open()?)?;
    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    let batch = concat_batches(&schema, &batches)?;

    tracing::trace!(path = %path.display(), rows = batch.num_rows(), "loaded dataset");
    Ok(DatasetFrame::new(batch))
}

/// Value channels of a dataset (all columns except the first and the last).
///
/// # Errors
///
/// Returns `Error::Configuration` if the frame has fewer than three columns.
pub fn extract_features(frame: &DatasetFrame) -> Result<DataMatrix> {
    let (rows, columns) = frame.shape();
    if columns < 3 {
        return Err(Error::Configuration(format!(
            "dataset has shape ({rows}, {columns}); expected timestamp, value and label columns"
        )));
    }

    let channels = (1..columns - 1)
        .map(|index| frame.column_f64(index))
        .collect::<Result<Vec<_>>>()?;
    DataMatrix::from_columns(rows, &channels)
}

/// Anomaly labels (last column) of a dataset file as an integer array.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the label column is not integral.
pub fn load_labels_only(path: &Path) -> Result<NumericArray> {
    let frame = load_dataset(path)?;
    let (_, columns) = frame.shape();
    if columns == 0 {
        return Err(Error::Storage(format!(
            "dataset {} has no columns",
            path.display()
        )));
    }
    Ok(NumericArray::integers(frame.column_i64(columns - 1)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_and_extract() {
        let file = write_csv("timestamp,a,b,is_anomaly\n0,1.0,10,0\n1,2.0,20,1\n2,3.5,30,0\n");
        let frame = load_dataset(file.path()).unwrap();
        assert_eq!(frame.shape(), (3, 4));
        assert_eq!(frame.column_names()[1], "a");

        let features = extract_features(&frame).unwrap();
        assert_eq!(features.rows(), 3);
        assert_eq!(features.columns(), 2);
        assert_eq!(features.row(1), &[2.0, 20.0]);
        assert_eq!(features.column(0), vec![1.0, 2.0, 3.5]);

        let full = frame.to_matrix().unwrap();
        assert_eq!(full.columns(), 4);
        assert_eq!(full.row(2), &[2.0, 3.5, 30.0, 0.0]);
    }

    #[test]
    fn test_labels_only() {
        let file = write_csv("timestamp,value,is_anomaly\n0,0.5,0\n1,0.7,1\n");
        let labels = load_labels_only(file.path()).unwrap();
        assert!(labels.is_integer());
        assert_eq!(labels.len(), 2);
    }

    #[test]
    fn test_too_few_columns() {
        let file = write_csv("timestamp,is_anomaly\n0,0\n1,1\n");
        let frame = load_dataset(file.path()).unwrap();
        assert!(matches!(
            extract_features(&frame),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = load_dataset(Path::new("/nonexistent/dataset.csv")).unwrap_err();
        assert!(err.to_string().contains("failed to open dataset"));
    }

    #[test]
    fn test_matrix_shape_mismatch() {
        assert!(DataMatrix::new(2, 2, vec![1.0; 3]).is_err());
        let matrix = DataMatrix::from_series(vec![1.0, 2.0]);
        assert_eq!(matrix.columns(), 1);
    }
}
