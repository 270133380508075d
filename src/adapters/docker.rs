//! Containerized algorithms
//!
//! The dataset directory is mounted read-only at `/data`, the results
//! directory read-write at `/results`. Memory and CPU limits come from the
//! experiment's resource constraints.

use std::path::Path;

use tokio::process::Command;

use super::process::{absolute, phase_timeout, require_path, run_to_completion};
use super::{AdapterInput, AlgorithmInterface, CallArgs};
use crate::data_types::ExecutionPhase;
use crate::{Error, Result};

const DATASET_TARGET_PATH: &str = "/data";
const RESULTS_TARGET_PATH: &str = "/results";

/// Docker image adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerAdapter {
    image_name: String,
    tag: String,
    docker_binary: String,
    supports_training: bool,
}

impl DockerAdapter {
    /// Adapter for `image_name:latest`.
    #[must_use]
    pub fn new(image_name: impl Into<String>) -> Self {
        Self {
            image_name: image_name.into(),
            tag: "latest".to_string(),
            docker_binary: "docker".to_string(),
            supports_training: false,
        }
    }

    /// Image tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Docker CLI executable.
    #[must_use]
    pub fn with_docker_binary(mut self, binary: impl Into<String>) -> Self {
        self.docker_binary = binary.into();
        self
    }

    /// Declare that the image also implements the training phase.
    #[must_use]
    pub const fn with_training(mut self, supports_training: bool) -> Self {
        self.supports_training = supports_training;
        self
    }

    /// Whether the image implements the training phase.
    #[must_use]
    pub const fn supports_training(&self) -> bool {
        self.supports_training
    }

    /// `image:tag` reference.
    #[must_use]
    pub fn image(&self) -> String {
        format!("{}:{}", self.image_name, self.tag)
    }

    fn command(&self, phase: ExecutionPhase, input: &AdapterInput, args: &CallArgs) -> Result<Command> {
        let dataset_path = absolute(require_path(input, "docker")?)?;
        let (dataset_dir, file_name) = match (dataset_path.parent(), dataset_path.file_name()) {
            (Some(dir), Some(name)) => (dir, name),
            _ => {
                return Err(Error::Configuration(format!(
                    "dataset path {} has no file name",
                    dataset_path.display()
                )))
            }
        };
        let results_dir = absolute(&args.results_path)?;
        let (memory, cpus) = args.resource_constraints.get_resource_limits(None, None);

        let interface = AlgorithmInterface::new(
            Path::new(DATASET_TARGET_PATH).join(file_name),
            Path::new(RESULTS_TARGET_PATH),
            phase,
            args.hyper_params.clone(),
        );

        let mut command = Command::new(&self.docker_binary);
        command
            .arg("run")
            .arg("--rm")
            .arg("-v")
            .arg(format!("{}:{DATASET_TARGET_PATH}:ro", dataset_dir.display()))
            .arg("-v")
            .arg(format!("{}:{RESULTS_TARGET_PATH}:rw", results_dir.display()))
            .arg(format!("--memory={memory}b"))
            .arg(format!("--cpus={cpus}"))
            .arg(self.image())
            .arg(interface.to_json_string()?);
        Ok(command)
    }

    pub(super) fn run(
        &self,
        phase: ExecutionPhase,
        input: &AdapterInput,
        args: &CallArgs,
    ) -> Result<()> {
        let command = self.command(phase, input, args)?;
        tracing::info!(image = %self.image(), phase = phase.as_str(), "running container");
        run_to_completion(command, phase, phase_timeout(phase, args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::tests::call_args;
    use std::path::PathBuf;

    fn arguments(command: &Command) -> Vec<String> {
        command
            .as_std()
            .get_args()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_container_command_line() {
        let adapter = DockerAdapter::new("registry/lof").with_tag("1.0");
        let args = call_args(PathBuf::from("/results/lof/abc/test/dataset/1"));
        let input = AdapterInput::Path(PathBuf::from("/datasets/test/dataset.csv"));
        let command = adapter.command(ExecutionPhase::Execute, &input, &args).unwrap();
        let argv = arguments(&command);

        assert_eq!(argv[0], "run");
        assert!(argv.contains(&"/datasets/test:/data:ro".to_string()));
        assert!(argv.contains(&"/results/lof/abc/test/dataset/1:/results:rw".to_string()));
        // 5 GiB host minus 1 GiB reservation, 4 cores, one task per host
        assert!(argv.contains(&format!("--memory={}b", 4 * crate::resource_constraints::GIB)));
        assert!(argv.contains(&"--cpus=4".to_string()));
        assert_eq!(argv[argv.len() - 2], "registry/lof:1.0");

        let interface: serde_json::Value = serde_json::from_str(&argv[argv.len() - 1]).unwrap();
        assert_eq!(interface["dataInput"], "/data/dataset.csv");
        assert_eq!(interface["dataOutput"], "/results/anomaly_scores.ts");
        assert_eq!(interface["executionType"], "execute");
    }

    #[test]
    fn test_training_capability() {
        let adapter = DockerAdapter::new("registry/lstm-ad").with_training(true);
        assert!(adapter.supports_training());
        assert_eq!(adapter.image(), "registry/lstm-ad:latest");
    }
}
