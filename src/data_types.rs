//! Shared enumerations describing algorithms and datasets

use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether (and how) an algorithm or dataset involves a training phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingType {
    /// No training phase; scores are computed directly on the test series.
    Unsupervised,
    /// Trained on anomaly-free data.
    SemiSupervised,
    /// Trained on labeled data.
    Supervised,
}

impl TrainingType {
    /// Whether a training phase (and a training split) is required.
    #[must_use]
    pub const fn requires_training(self) -> bool {
        !matches!(self, Self::Unsupervised)
    }

    /// Snake-case name as used in result tables.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unsupervised => "unsupervised",
            Self::SemiSupervised => "semi_supervised",
            Self::Supervised => "supervised",
        }
    }
}

impl fmt::Display for TrainingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Number of value channels an algorithm accepts or a dataset provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputDimensionality {
    /// Single value channel.
    Univariate,
    /// Multiple value channels.
    Multivariate,
}

impl InputDimensionality {
    /// Lower-case name as used in result tables.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Univariate => "univariate",
            Self::Multivariate => "multivariate",
        }
    }
}

impl fmt::Display for InputDimensionality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Adapter invocation phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionPhase {
    /// Model fitting on the training split.
    Train,
    /// Scoring of the test split.
    Execute,
}

impl ExecutionPhase {
    /// Lower-case name, used as timing column prefix.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Execute => "execute",
        }
    }
}

impl fmt::Display for ExecutionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
