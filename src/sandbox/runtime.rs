//! Container runtime abstraction used by the executor
//!
//! The executor only needs a handful of primitives: check/pull an image, launch
//! a container detached, poll its status, read its logs, stop it and remove it.
//! [`DockerRuntime`](super::DockerRuntime) implements them against the Docker
//! Engine; tests substitute a recording fake.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

/// Label applied to every sandbox container for tracking
pub const MANAGED_LABEL: &str = "chatgate.managed";

/// Error type for container runtime operations
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("Docker error: {0}")]
    Docker(#[from] bollard::errors::Error),
    #[error("Failed to pull image {image}: {reason}")]
    ImagePull { image: String, reason: String },
    #[error("Container {0} has no state information")]
    NoState(String),
    #[error("{0}")]
    Runtime(String),
}

/// Resource limits applied to each sandbox container
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceLimits {
    /// Number of CPU cores (can be fractional, e.g., 0.5 for half a core)
    pub cpu_cores: f64,

    /// Memory limit in bytes
    pub memory_bytes: u64,
}

impl ResourceLimits {
    /// Limits for a small sandbox (1 core, 512MB RAM)
    pub fn small() -> Self {
        Self {
            cpu_cores: 1.0,
            memory_bytes: 512 * 1024 * 1024,
        }
    }

    /// Create custom limits
    pub fn custom(cpu_cores: f64, memory_mb: u64) -> Self {
        Self {
            cpu_cores,
            memory_bytes: memory_mb * 1024 * 1024,
        }
    }

    /// CPU quota in units of 1e-9 CPUs, as the Docker API expects
    pub fn nano_cpus(&self) -> i64 {
        (self.cpu_cores * 1_000_000_000.0) as i64
    }
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self::small()
    }
}

/// Everything needed to launch one sandbox container
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerSpec {
    pub image: String,
    pub command: Vec<String>,
    pub limits: ResourceLimits,
    pub labels: HashMap<String, String>,
}

impl ContainerSpec {
    pub fn new(image: impl Into<String>, command: Vec<String>, limits: ResourceLimits) -> Self {
        let labels = HashMap::from([(MANAGED_LABEL.to_string(), "true".to_string())]);
        Self {
            image: image.into(),
            command,
            limits,
            labels,
        }
    }
}

/// Lifecycle state reported by the runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Created,
    Running,
    Paused,
    Restarting,
    Removing,
    Exited,
    Dead,
    Unknown,
}

impl ContainerState {
    /// Parse the Docker status string ("running", "exited", ...)
    pub fn from_docker(status: &str) -> Self {
        match status {
            "created" => ContainerState::Created,
            "running" => ContainerState::Running,
            "paused" => ContainerState::Paused,
            "restarting" => ContainerState::Restarting,
            "removing" => ContainerState::Removing,
            "exited" => ContainerState::Exited,
            "dead" => ContainerState::Dead,
            _ => ContainerState::Unknown,
        }
    }

    /// The container will not run any further
    pub fn is_terminal(&self) -> bool {
        matches!(self, ContainerState::Exited | ContainerState::Dead)
    }
}

/// Snapshot of a container's state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerStatus {
    pub state: ContainerState,
    /// Exit code, meaningful once the state is terminal
    pub exit_code: Option<i64>,
}

/// Primitives the executor needs from a container runtime
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Whether `image` is present locally
    async fn image_exists(&self, image: &str) -> Result<bool, SandboxError>;

    /// Pull `image` from its registry
    async fn pull_image(&self, image: &str) -> Result<(), SandboxError>;

    /// Create and start a container without waiting for it; returns its id.
    ///
    /// If the container was created but could not be started, the
    /// implementation removes it before returning the error.
    async fn run_detached(&self, spec: &ContainerSpec) -> Result<String, SandboxError>;

    /// Current state and exit code
    async fn inspect(&self, id: &str) -> Result<ContainerStatus, SandboxError>;

    /// Combined stdout/stderr collected so far
    async fn logs(&self, id: &str) -> Result<String, SandboxError>;

    /// Stop the container, killing it after `grace`
    async fn stop(&self, id: &str, grace: Duration) -> Result<(), SandboxError>;

    /// Remove the container, forcibly if still running
    async fn remove(&self, id: &str) -> Result<(), SandboxError>;
}
