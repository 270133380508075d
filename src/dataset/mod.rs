//! Dataset descriptors and path resolution
//!
//! Dataset acquisition and profiling live outside this crate. The benchmark
//! only needs an immutable descriptor per dataset and a resolver that maps a
//! `DatasetId` to the file of its test (or training) split.

mod io;

pub use io::{extract_features, load_dataset, load_labels_only, DataMatrix, DatasetFrame};

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data_types::{InputDimensionality, TrainingType};
use crate::{Error, Result};

/// Identity of a dataset: (collection name, dataset name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DatasetId {
    collection: String,
    name: String,
}

impl DatasetId {
    /// Create a dataset identifier.
    #[must_use]
    pub fn new(collection: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            name: name.into(),
        }
    }

    /// Collection name.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Dataset name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.name)
    }
}

/// Immutable dataset descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    id: DatasetId,
    training_type: TrainingType,
    input_dimensionality: InputDimensionality,
    length: Option<usize>,
}

impl Dataset {
    /// Create a dataset descriptor.
    #[must_use]
    pub const fn new(
        id: DatasetId,
        training_type: TrainingType,
        input_dimensionality: InputDimensionality,
    ) -> Self {
        Self {
            id,
            training_type,
            input_dimensionality,
            length: None,
        }
    }

    /// Attach the length (number of points) of the test split.
    #[must_use]
    pub const fn with_length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    /// Dataset identity.
    #[must_use]
    pub const fn id(&self) -> &DatasetId {
        &self.id
    }

    /// Collection name.
    #[must_use]
    pub fn collection_name(&self) -> &str {
        self.id.collection()
    }

    /// Dataset name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.id.name()
    }

    /// Training type of the dataset.
    #[must_use]
    pub const fn training_type(&self) -> TrainingType {
        self.training_type
    }

    /// Input dimensionality of the dataset.
    #[must_use]
    pub const fn input_dimensionality(&self) -> InputDimensionality {
        self.input_dimensionality
    }

    /// Length of the test split, if known.
    #[must_use]
    pub const fn length(&self) -> Option<usize> {
        self.length
    }
}

/// Maps dataset identities to files on disk.
pub trait DatasetResolver: Send + Sync {
    /// Resolve the path of the training (`train = true`) or test split.
    ///
    /// # Errors
    ///
    /// Returns `Error::DatasetNotFound` if no such split exists.
    fn resolve_path(&self, id: &DatasetId, train: bool) -> Result<PathBuf>;
}

#[derive(Debug, Clone)]
struct RegistryEntry {
    dataset: Dataset,
    test_path: PathBuf,
    train_path: Option<PathBuf>,
}

/// In-memory dataset index rooted at a directory.
///
/// Relative split paths are resolved against the root directory.
#[derive(Debug, Clone)]
pub struct DatasetRegistry {
    root: PathBuf,
    entries: BTreeMap<DatasetId, RegistryEntry>,
}

impl DatasetRegistry {
    /// Create an empty registry rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Register (or replace) a dataset with its test and optional training split.
    pub fn register(
        &mut self,
        dataset: Dataset,
        test_path: impl Into<PathBuf>,
        train_path: Option<PathBuf>,
    ) {
        self.entries.insert(
            dataset.id().clone(),
            RegistryEntry {
                dataset,
                test_path: test_path.into(),
                train_path,
            },
        );
    }

    /// Number of registered datasets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no dataset is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Descriptor of a registered dataset.
    #[must_use]
    pub fn get(&self, id: &DatasetId) -> Option<&Dataset> {
        self.entries.get(id).map(|entry| &entry.dataset)
    }

    /// Descriptors matching `filter`, ordered by identity.
    pub fn select<F>(&self, filter: F) -> Vec<Dataset>
    where
        F: Fn(&Dataset) -> bool,
    {
        self.entries
            .values()
            .map(|entry| &entry.dataset)
            .filter(|dataset| filter(dataset))
            .cloned()
            .collect()
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl DatasetResolver for DatasetRegistry {
    fn resolve_path(&self, id: &DatasetId, train: bool) -> Result<PathBuf> {
        let not_found = || Error::DatasetNotFound {
            collection: id.collection().to_string(),
            name: id.name().to_string(),
            split: if train { "train" } else { "test" },
        };

        let entry = self.entries.get(id).ok_or_else(not_found)?;
        let path = if train {
            entry.train_path.as_deref().ok_or_else(not_found)?
        } else {
            entry.test_path.as_path()
        };
        Ok(self.absolute(path))
    }
}
