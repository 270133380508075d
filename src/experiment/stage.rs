//! Lifecycle of one experiment evaluation

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stage of an experiment evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentStage {
    /// Created, nothing done yet.
    Pending,
    /// Algorithm is being trained.
    Training,
    /// Algorithm is producing scores.
    Executing,
    /// Metrics are being computed.
    Scoring,
    /// Artifacts are written.
    Persisted,
    /// Evaluation stopped with an error.
    Failed,
}

impl ExperimentStage {
    /// Whether moving from `self` to `next` is a legal transition.
    ///
    /// Training is optional. Any stage before `Persisted` may fail.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Training | Self::Executing)
                | (Self::Training, Self::Executing)
                | (Self::Executing, Self::Scoring)
                | (Self::Scoring, Self::Persisted)
                | (
                    Self::Pending | Self::Training | Self::Executing | Self::Scoring,
                    Self::Failed
                )
        )
    }

    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Persisted | Self::Failed)
    }

    /// Lowercase stage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Training => "training",
            Self::Executing => "executing",
            Self::Scoring => "scoring",
            Self::Persisted => "persisted",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ExperimentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks the stage of one evaluation and collects its log lines.
#[derive(Debug, Clone)]
pub(crate) struct StageTracker {
    stage: ExperimentStage,
    started_at: DateTime<Utc>,
    log: Vec<String>,
}

impl StageTracker {
    pub(crate) fn new() -> Self {
        Self {
            stage: ExperimentStage::Pending,
            started_at: Utc::now(),
            log: Vec::new(),
        }
    }

    pub(crate) const fn stage(&self) -> ExperimentStage {
        self.stage
    }

    /// Move to `next`; illegal transitions are logged and ignored.
    pub(crate) fn advance(&mut self, next: ExperimentStage) {
        if self.stage.can_transition_to(next) {
            tracing::debug!(from = %self.stage, to = %next, "experiment stage transition");
            self.stage = next;
        } else {
            tracing::warn!(from = %self.stage, to = %next, "ignoring illegal stage transition");
        }
    }

    /// Record a line for `execution.log`.
    pub(crate) fn log(&mut self, message: impl Into<String>) {
        let elapsed = (Utc::now() - self.started_at).num_milliseconds();
        self.log
            .push(format!("[{} +{elapsed}ms] {}", self.stage, message.into()));
    }

    /// Drain the recorded lines.
    pub(crate) fn take_log(&mut self) -> Vec<String> {
        std::mem::take(&mut self.log)
    }
}
