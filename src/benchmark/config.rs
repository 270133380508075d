//! Serializable benchmark configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::resource_constraints::{HostResources, ResourceConstraints};
use crate::Result;

/// Benchmark settings loadable from a JSON file.
///
/// Every field is optional in the file; missing fields take the defaults.
///
/// ```rust
/// use tsad_bench::benchmark::BenchmarkConfig;
///
/// let config: BenchmarkConfig =
///     serde_json::from_str(r#"{"repetitions": 3, "execute_timeout_secs": 60}"#).unwrap();
/// assert_eq!(config.repetitions, 3);
/// assert!(config.skip_invalid_combinations);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    /// Directory receiving the timestamped run directories.
    pub results_path: PathBuf,
    /// Repetitions per (algorithm, parameters, dataset) combination.
    pub repetitions: usize,
    /// Run experiments on a worker pool sized by `tasks_per_host`.
    pub distributed: bool,
    /// Skip incompatible algorithm/dataset pairs.
    pub skip_invalid_combinations: bool,
    /// Require equal training types for every algorithm.
    pub force_training_type_match: bool,
    /// Require equal input dimensionalities.
    pub force_dimensionality_match: bool,
    /// Per-task memory limit in bytes.
    pub task_memory_limit: Option<u64>,
    /// Per-task CPU limit in cores.
    pub task_cpu_limit: Option<f64>,
    /// Concurrent tasks per host (forced to 1 unless `distributed`).
    pub tasks_per_host: Option<usize>,
    /// Training timeout in seconds.
    pub train_timeout_secs: Option<u64>,
    /// Execution timeout in seconds.
    pub execute_timeout_secs: Option<u64>,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            results_path: PathBuf::from("results"),
            repetitions: 1,
            distributed: false,
            skip_invalid_combinations: true,
            force_training_type_match: false,
            force_dimensionality_match: false,
            task_memory_limit: None,
            task_cpu_limit: None,
            tasks_per_host: None,
            train_timeout_secs: None,
            execute_timeout_secs: None,
        }
    }
}

impl BenchmarkConfig {
    /// Read a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read or `Error::Json` if it
    /// is not a valid configuration.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Resource constraints described by this configuration.
    ///
    /// The host is probed unless `host` is given.
    ///
    /// # Errors
    ///
    /// Returns `Error::HostProbe` if probing fails, or `Error::Configuration`
    /// for invalid limits.
    pub fn resource_constraints(&self, host: Option<HostResources>) -> Result<ResourceConstraints> {
        let mut builder = ResourceConstraints::builder();
        if let Some(bytes) = self.task_memory_limit {
            builder = builder.task_memory_limit(bytes);
        }
        if let Some(cores) = self.task_cpu_limit {
            builder = builder.task_cpu_limit(cores);
        }
        if let Some(tasks) = self.tasks_per_host {
            builder = builder.tasks_per_host(tasks);
        }
        if let Some(secs) = self.train_timeout_secs {
            builder = builder.train_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = self.execute_timeout_secs {
            builder = builder.execute_timeout(Duration::from_secs(secs));
        }
        if let Some(host) = host {
            builder = builder.host(host);
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource_constraints::GIB;

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("benchmark.json");
        std::fs::write(
            &path,
            r#"{"results_path": "out", "distributed": true, "tasks_per_host": 2, "train_timeout_secs": 30}"#,
        )
        .unwrap();
        let config = BenchmarkConfig::from_json_file(&path).unwrap();
        assert_eq!(config.results_path, PathBuf::from("out"));
        assert!(config.distributed);
        assert_eq!(config.repetitions, 1);

        let constraints = config
            .resource_constraints(Some(HostResources::new(5 * GIB, 4)))
            .unwrap();
        assert_eq!(constraints.tasks_per_host(), 2);
        assert_eq!(
            constraints.get_train_timeout(None),
            Some(Duration::from_secs(30))
        );
        assert_eq!(constraints.get_execute_timeout(None), None);
        assert_eq!(constraints.get_resource_limits(None, None), (2 * GIB, 2.0));
    }

    #[test]
    fn test_unknown_json_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("benchmark.json");
        std::fs::write(&path, "repetitions = 3").unwrap();
        assert!(BenchmarkConfig::from_json_file(&path).is_err());
    }
}
