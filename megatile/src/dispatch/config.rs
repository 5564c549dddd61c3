//! Dispatcher configuration.

use std::fmt;

use crate::engine::WorkerSignals;
use crate::grid::ConfigError;

/// What the dispatcher does when the engine fails on a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Keep rendering; failed tiles are listed in the report.
    #[default]
    Record,
    /// Stop the run at the first failed tile.
    Abort,
}

impl FailurePolicy {
    /// The name used in the config file and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::Record => "record",
            FailurePolicy::Abort => "abort",
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Number of workers used when none is configured: one per available core.
pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(4)
}

/// Configuration handed to the worker pool when it is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    jobs: usize,
    failure_policy: FailurePolicy,
    worker_signals: WorkerSignals,
}

impl DispatchConfig {
    /// Creates a configuration for a pool of `jobs` workers.
    pub fn new(jobs: usize) -> Result<Self, ConfigError> {
        if jobs == 0 {
            return Err(ConfigError::ZeroJobs);
        }
        Ok(Self {
            jobs,
            failure_policy: FailurePolicy::default(),
            worker_signals: WorkerSignals::default(),
        })
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_worker_signals(mut self, signals: WorkerSignals) -> Self {
        self.worker_signals = signals;
        self
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    pub fn worker_signals(&self) -> WorkerSignals {
        self.worker_signals
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            jobs: default_jobs(),
            failure_policy: FailurePolicy::default(),
            worker_signals: WorkerSignals::default(),
        }
    }
}
