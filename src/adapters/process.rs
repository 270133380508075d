//! External executables following the algorithm interface
//!
//! The executable receives a single JSON document as its last argument and
//! writes one score per line to `dataOutput`. Runs are bounded by the
//! phase timeout of the experiment's resource constraints; the child is
//! killed when the timeout elapses.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use serde::Serialize;
use tokio::process::Command;

use super::{AdapterInput, CallArgs};
use crate::data_types::ExecutionPhase;
use crate::experiment::ANOMALY_SCORES_TS;
use crate::params::Params;
use crate::{Error, Result};

/// File name of the model written by training and read by execution.
pub const MODEL_FILE_NAME: &str = "model.pkl";

/// JSON document passed to external algorithms.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlgorithmInterface {
    /// Dataset file to read.
    pub data_input: PathBuf,
    /// Scores file to write.
    pub data_output: PathBuf,
    /// Model file to read during execution.
    pub model_input: PathBuf,
    /// Model file to write during training.
    pub model_output: PathBuf,
    /// `"train"` or `"execute"`.
    pub execution_type: ExecutionPhase,
    /// Resolved hyper-parameters.
    pub custom_parameters: Params,
}

impl AlgorithmInterface {
    /// Interface with data and results rooted at the given directories.
    #[must_use]
    pub fn new(
        data_input: PathBuf,
        results_dir: &Path,
        execution_type: ExecutionPhase,
        custom_parameters: Params,
    ) -> Self {
        let model = results_dir.join(MODEL_FILE_NAME);
        Self {
            data_input,
            data_output: results_dir.join(ANOMALY_SCORES_TS),
            model_input: model.clone(),
            model_output: model,
            execution_type,
            custom_parameters,
        }
    }

    /// Serialize into the command-line argument.
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` if a parameter cannot be serialized.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// External executable adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessAdapter {
    program: PathBuf,
    args: Vec<String>,
    supports_training: bool,
}

impl ProcessAdapter {
    /// Adapter running `program`; no training capability.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            supports_training: false,
        }
    }

    /// Arguments placed before the interface document.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Declare that the executable also implements the training phase.
    #[must_use]
    pub const fn with_training(mut self, supports_training: bool) -> Self {
        self.supports_training = supports_training;
        self
    }

    /// Whether the executable implements the training phase.
    #[must_use]
    pub const fn supports_training(&self) -> bool {
        self.supports_training
    }

    pub(super) fn command(
        &self,
        phase: ExecutionPhase,
        input: &AdapterInput,
        args: &CallArgs,
    ) -> Result<Command> {
        let data_input = absolute(require_path(input, "process")?)?;
        let results_dir = absolute(&args.results_path)?;
        let interface =
            AlgorithmInterface::new(data_input, &results_dir, phase, args.hyper_params.clone());

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(interface.to_json_string()?)
            .current_dir(results_dir);
        Ok(command)
    }

    pub(super) fn run(
        &self,
        phase: ExecutionPhase,
        input: &AdapterInput,
        args: &CallArgs,
    ) -> Result<()> {
        let command = self.command(phase, input, args)?;
        run_to_completion(command, phase, phase_timeout(phase, args))
    }
}

pub(super) fn require_path<'a>(input: &'a AdapterInput, kind: &str) -> Result<&'a Path> {
    input.as_path().ok_or_else(|| {
        Error::Configuration(format!(
            "{kind} adapters cannot handle in-memory arrays; set data_as_file on the algorithm"
        ))
    })
}

pub(super) fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

pub(super) fn phase_timeout(phase: ExecutionPhase, args: &CallArgs) -> Option<Duration> {
    match phase {
        ExecutionPhase::Train => args.resource_constraints.get_train_timeout(None),
        ExecutionPhase::Execute => args.resource_constraints.get_execute_timeout(None),
    }
}

const fn phase_label(phase: ExecutionPhase) -> &'static str {
    match phase {
        ExecutionPhase::Train => "training",
        ExecutionPhase::Execute => "execution",
    }
}

/// Run `command` on a private current-thread runtime, killing it on timeout.
pub(super) fn run_to_completion(
    mut command: Command,
    phase: ExecutionPhase,
    timeout: Option<Duration>,
) -> Result<()> {
    let program = command.as_std().get_program().to_string_lossy().into_owned();
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let output = runtime.block_on(async move {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, command.output())
                .await
                .map_err(|_| Error::Timeout {
                    phase: phase_label(phase),
                    after: limit,
                }),
            None => Ok(command.output().await),
        }
    })?;

    let output = output
        .map_err(|e| Error::Adapter(anyhow::anyhow!("failed to spawn {program}: {e}")))?;

    tracing::debug!(
        program = %program,
        phase = phase.as_str(),
        status = %output.status,
        "external algorithm finished"
    );

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Adapter(anyhow::anyhow!(
            "{program} failed during {} ({}): {}",
            phase_label(phase),
            output.status,
            stderr.trim()
        )));
    }
    Ok(())
}

/// Read a scores file (whitespace-separated floats).
///
/// # Errors
///
/// Returns `Error::Adapter` if the file is missing or contains a non-numeric token.
pub fn read_scores(path: &Path) -> Result<Vec<f64>> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        Error::Adapter(anyhow::anyhow!(
            "algorithm produced no readable scores at {}: {e}",
            path.display()
        ))
    })?;
    contents
        .split_whitespace()
        .map(|token| {
            token.parse::<f64>().map_err(|e| {
                Error::Adapter(anyhow::anyhow!(
                    "invalid score {token:?} in {}: {e}",
                    path.display()
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::tests::call_args;
    use crate::adapters::Adapter;
    use crate::dataset::DataMatrix;
    use crate::resource_constraints::{HostResources, ResourceConstraints, GIB};

    #[test]
    fn test_interface_json_keys() {
        let mut params = Params::new();
        params.insert("window".to_string(), 5.into());
        let interface = AlgorithmInterface::new(
            PathBuf::from("/data/test.csv"),
            Path::new("/results"),
            ExecutionPhase::Execute,
            params,
        );
        let value: serde_json::Value =
            serde_json::from_str(&interface.to_json_string().unwrap()).unwrap();
        assert_eq!(value["dataInput"], "/data/test.csv");
        assert_eq!(value["dataOutput"], "/results/anomaly_scores.ts");
        assert_eq!(value["modelOutput"], "/results/model.pkl");
        assert_eq!(value["executionType"], "execute");
        assert_eq!(value["customParameters"]["window"], 5);
    }

    #[test]
    fn test_read_scores() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ANOMALY_SCORES_TS);
        std::fs::write(&path, "0.5\n1\n-2.25").unwrap();
        assert_eq!(read_scores(&path).unwrap(), vec![0.5, 1.0, -2.25]);
        std::fs::write(&path, "0.5\nabc").unwrap();
        assert!(read_scores(&path).is_err());
        assert!(read_scores(&dir.path().join("missing.ts")).is_err());
    }

    #[test]
    fn test_array_input_rejected() {
        let adapter = Adapter::from(ProcessAdapter::new("true"));
        let input = AdapterInput::Array(DataMatrix::from_series(vec![1.0]));
        let err = adapter
            .execute(&input, &call_args(PathBuf::from("/tmp")))
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_process_writes_scores() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = Adapter::from(ProcessAdapter::new("sh").with_args([
            "-c",
            "printf '0.1\\n0.9\\n0.3' > anomaly_scores.ts",
            "_",
        ]));
        let input = AdapterInput::Path(PathBuf::from("/data/test.csv"));
        let scores = adapter
            .execute(&input, &call_args(dir.path().to_path_buf()))
            .unwrap();
        assert_eq!(scores, vec![0.1, 0.9, 0.3]);
    }

    #[cfg(unix)]
    #[test]
    fn test_process_failure_reports_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = Adapter::from(ProcessAdapter::new("sh").with_args([
            "-c",
            "echo 'out of memory' >&2; exit 3",
            "_",
        ]));
        let input = AdapterInput::Path(PathBuf::from("/data/test.csv"));
        let err = adapter
            .execute(&input, &call_args(dir.path().to_path_buf()))
            .unwrap_err();
        assert!(err.to_string().contains("out of memory"));
    }

    #[cfg(unix)]
    #[test]
    fn test_process_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = call_args(dir.path().to_path_buf());
        args.resource_constraints = ResourceConstraints::builder()
            .host(HostResources::new(5 * GIB, 4))
            .execute_timeout(Duration::from_millis(200))
            .build()
            .unwrap();
        let adapter = Adapter::from(ProcessAdapter::new("sh").with_args(["-c", "sleep 5", "_"]));
        let input = AdapterInput::Path(PathBuf::from("/data/test.csv"));

        let started = std::time::Instant::now();
        let err = adapter.execute(&input, &args).unwrap_err();
        assert!(err.is_timeout());
        assert!(err.to_string().contains("execution timed out"));
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
