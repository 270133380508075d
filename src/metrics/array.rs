//! Typed numeric arrays handed to metrics
//!
//! Metrics validate their inputs by element type (integral labels versus
//! floating-point scores) and by shape, so both travel with the data.

use crate::{Error, Result};

/// Element storage of a `NumericArray`.
#[derive(Debug, Clone, PartialEq)]
pub enum NumericData {
    /// Integral values (labels, thresholded predictions).
    Integer(Vec<i64>),
    /// Floating-point values (continuous scores).
    Float(Vec<f64>),
}

/// A numeric array with an element type and a shape.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericArray {
    data: NumericData,
    shape: Vec<usize>,
}

impl NumericArray {
    /// One-dimensional integer array.
    #[must_use]
    pub fn integers(values: Vec<i64>) -> Self {
        let shape = vec![values.len()];
        Self {
            data: NumericData::Integer(values),
            shape,
        }
    }

    /// One-dimensional floating-point array.
    #[must_use]
    pub fn floats(values: Vec<f64>) -> Self {
        let shape = vec![values.len()];
        Self {
            data: NumericData::Float(values),
            shape,
        }
    }

    /// Reinterpret the array with another shape.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if the shape does not cover exactly the stored elements.
    pub fn reshape(mut self, shape: Vec<usize>) -> Result<Self> {
        let size: usize = shape.iter().product();
        if size != self.len() {
            return Err(Error::Validation(format!(
                "cannot reshape array of size {} into shape {shape:?}",
                self.len()
            )));
        }
        self.shape = shape;
        Ok(self)
    }

    /// Element storage.
    #[must_use]
    pub const fn data(&self) -> &NumericData {
        &self.data
    }

    /// Array shape.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.data {
            NumericData::Integer(values) => values.len(),
            NumericData::Float(values) => values.len(),
        }
    }

    /// Whether the array has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether elements are integral.
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self.data, NumericData::Integer(_))
    }

    /// Whether elements are floating-point.
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self.data, NumericData::Float(_))
    }

    /// Whether the array is a vector or a single column (`(n,)` or `(n, 1)`).
    #[must_use]
    pub fn is_column_or_1d(&self) -> bool {
        match self.shape.as_slice() {
            [_] => true,
            [_, 1] => true,
            _ => false,
        }
    }

    /// Copy of the elements as `f64`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_f64(&self) -> Vec<f64> {
        match &self.data {
            NumericData::Integer(values) => values.iter().map(|&v| v as f64).collect(),
            NumericData::Float(values) => values.clone(),
        }
    }
}

impl From<Vec<f64>> for NumericArray {
    fn from(values: Vec<f64>) -> Self {
        Self::floats(values)
    }
}

impl From<Vec<i64>> for NumericArray {
    fn from(values: Vec<i64>) -> Self {
        Self::integers(values)
    }
}
