//! Resource budget for a single unit of work
//!
//! The host is probed exactly once (at construction) and the result is
//! threaded through as plain data; `get_resource_limits` is pure afterwards.
//!
//! Resolution order per quantity (memory and CPU are independent):
//! 1. call-time overwrite
//! 2. explicit per-task limit
//! 3. usable host resource ÷ `tasks_per_host`

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};

use crate::{Error, Result};

/// One gibibyte in bytes.
pub const GIB: u64 = 1024 * 1024 * 1024;

/// Memory reserved for the operating system and other software.
pub const OS_MEMORY_RESERVATION: u64 = GIB;

/// Snapshot of the host's capacity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HostResources {
    total_memory: u64,
    cpus: usize,
}

impl HostResources {
    /// Create a host snapshot from explicit values (useful for tests and remote hosts).
    #[must_use]
    pub const fn new(total_memory: u64, cpus: usize) -> Self {
        Self { total_memory, cpus }
    }

    /// Read total physical memory and the logical CPU count of this machine.
    ///
    /// # Errors
    ///
    /// Returns `Error::HostProbe` if the platform reports no memory or no CPUs.
    pub fn probe() -> Result<Self> {
        let system = System::new_with_specifics(
            RefreshKind::nothing()
                .with_memory(MemoryRefreshKind::nothing().with_ram())
                .with_cpu(CpuRefreshKind::nothing()),
        );

        let total_memory = system.total_memory();
        if total_memory == 0 {
            return Err(Error::HostProbe("total physical memory reported as 0".to_string()));
        }

        let cpus = match system.cpus().len() {
            0 => std::thread::available_parallelism()
                .map(std::num::NonZeroUsize::get)
                .map_err(|e| Error::HostProbe(format!("logical CPU count unavailable: {e}")))?,
            n => n,
        };

        tracing::debug!(total_memory, cpus, "probed host resources");
        Ok(Self { total_memory, cpus })
    }

    /// Total physical memory in bytes.
    #[must_use]
    pub const fn total_memory(&self) -> u64 {
        self.total_memory
    }

    /// Logical CPU count.
    #[must_use]
    pub const fn cpus(&self) -> usize {
        self.cpus
    }

    /// Memory available to benchmark tasks (total minus the OS reservation).
    #[must_use]
    pub const fn usable_memory(&self) -> u64 {
        self.total_memory.saturating_sub(OS_MEMORY_RESERVATION)
    }

    /// CPUs available to benchmark tasks.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn usable_cpus(&self) -> f64 {
        self.cpus as f64
    }
}

/// Memory/CPU/time budget assigned to each experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceConstraints {
    task_memory_limit: Option<u64>,
    task_cpu_limit: Option<f64>,
    tasks_per_host: usize,
    train_timeout: Option<Duration>,
    execute_timeout: Option<Duration>,
    host: HostResources,
}

impl ResourceConstraints {
    /// Constraints without explicit limits: every task gets the whole usable host.
    ///
    /// # Errors
    ///
    /// Returns `Error::HostProbe` if the host cannot be probed.
    pub fn no_constraints() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a builder for constructing resource constraints.
    #[must_use]
    pub fn builder() -> ResourceConstraintsBuilder {
        ResourceConstraintsBuilder::default()
    }

    /// Number of tasks scheduled concurrently on one host.
    #[must_use]
    pub const fn tasks_per_host(&self) -> usize {
        self.tasks_per_host
    }

    /// Explicit per-task memory limit in bytes, if any.
    #[must_use]
    pub const fn task_memory_limit(&self) -> Option<u64> {
        self.task_memory_limit
    }

    /// Explicit per-task CPU limit in cores, if any.
    #[must_use]
    pub const fn task_cpu_limit(&self) -> Option<f64> {
        self.task_cpu_limit
    }

    /// Host snapshot taken at construction.
    #[must_use]
    pub const fn host(&self) -> &HostResources {
        &self.host
    }

    /// Copy of these constraints with a different `tasks_per_host` (minimum 1).
    #[must_use]
    pub fn with_tasks_per_host(&self, tasks_per_host: usize) -> Self {
        Self {
            tasks_per_host: tasks_per_host.max(1),
            ..self.clone()
        }
    }

    /// Resolve the memory (bytes) and CPU (cores) budget for one task.
    ///
    /// Overwrites take precedence over explicit limits, which take precedence
    /// over the host-derived share. Memory and CPU are resolved independently.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn get_resource_limits(
        &self,
        memory_overwrite: Option<u64>,
        cpu_overwrite: Option<f64>,
    ) -> (u64, f64) {
        let tasks = self.tasks_per_host as u64;
        let memory = memory_overwrite
            .or(self.task_memory_limit)
            .unwrap_or_else(|| self.host.usable_memory() / tasks);
        let cpus = cpu_overwrite
            .or(self.task_cpu_limit)
            .unwrap_or_else(|| self.host.usable_cpus() / self.tasks_per_host as f64);
        (memory, cpus)
    }

    /// Time budget for the training phase (`None` = unlimited).
    #[must_use]
    pub fn get_train_timeout(&self, overwrite: Option<Duration>) -> Option<Duration> {
        overwrite.or(self.train_timeout)
    }

    /// Time budget for the execution phase (`None` = unlimited).
    #[must_use]
    pub fn get_execute_timeout(&self, overwrite: Option<Duration>) -> Option<Duration> {
        overwrite.or(self.execute_timeout)
    }
}

/// Builder for `ResourceConstraints`.
#[derive(Debug, Default)]
pub struct ResourceConstraintsBuilder {
    task_memory_limit: Option<u64>,
    task_cpu_limit: Option<f64>,
    tasks_per_host: Option<usize>,
    train_timeout: Option<Duration>,
    execute_timeout: Option<Duration>,
    host: Option<HostResources>,
}

impl ResourceConstraintsBuilder {
    /// Set an explicit per-task memory limit in bytes.
    #[must_use]
    pub const fn task_memory_limit(mut self, bytes: u64) -> Self {
        self.task_memory_limit = Some(bytes);
        self
    }

    /// Set an explicit per-task CPU limit in cores.
    #[must_use]
    pub const fn task_cpu_limit(mut self, cores: f64) -> Self {
        self.task_cpu_limit = Some(cores);
        self
    }

    /// Set the number of tasks sharing one host.
    #[must_use]
    pub const fn tasks_per_host(mut self, tasks: usize) -> Self {
        self.tasks_per_host = Some(tasks);
        self
    }

    /// Set the training phase timeout.
    #[must_use]
    pub const fn train_timeout(mut self, timeout: Duration) -> Self {
        self.train_timeout = Some(timeout);
        self
    }

    /// Set the execution phase timeout.
    #[must_use]
    pub const fn execute_timeout(mut self, timeout: Duration) -> Self {
        self.execute_timeout = Some(timeout);
        self
    }

    /// Use an explicit host snapshot instead of probing this machine.
    #[must_use]
    pub const fn host(mut self, host: HostResources) -> Self {
        self.host = Some(host);
        self
    }

    /// Build the constraints, probing the host if no snapshot was supplied.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` for `tasks_per_host == 0`, or
    /// `Error::HostProbe` if probing fails.
    pub fn build(self) -> Result<ResourceConstraints> {
        let tasks_per_host = self.tasks_per_host.unwrap_or(1);
        if tasks_per_host == 0 {
            return Err(Error::Configuration(
                "tasks_per_host must be a positive integer".to_string(),
            ));
        }

        let host = match self.host {
            Some(host) => host,
            None => HostResources::probe()?,
        };

        Ok(ResourceConstraints {
            task_memory_limit: self.task_memory_limit,
            task_cpu_limit: self.task_cpu_limit,
            tasks_per_host,
            train_timeout: self.train_timeout,
            execute_timeout: self.execute_timeout,
            host,
        })
    }
}
