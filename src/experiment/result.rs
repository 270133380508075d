//! Result row of one evaluated experiment

use serde::{Deserialize, Serialize};

/// Ordered named values: timing columns first, then succeeded metric scores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    columns: Vec<(String, Option<f64>)>,
}

impl ResultRecord {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column; a column with the same name is replaced in place.
    pub fn insert(&mut self, name: impl Into<String>, value: Option<f64>) {
        let name = name.into();
        match self.columns.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.columns.push((name, value)),
        }
    }

    /// Append several columns in order.
    pub fn extend<I>(&mut self, columns: I)
    where
        I: IntoIterator<Item = (String, Option<f64>)>,
    {
        for (name, value) in columns {
            self.insert(name, value);
        }
    }

    /// Value of a column; `None` if absent or null.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.columns
            .iter()
            .find(|(existing, _)| existing == name)
            .and_then(|(_, value)| *value)
    }

    /// Whether a column with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|(existing, _)| existing == name)
    }

    /// Column names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// All columns in order.
    #[must_use]
    pub fn columns(&self) -> &[(String, Option<f64>)] {
        &self.columns
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the record has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
