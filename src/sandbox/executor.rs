//! Bounded-time code execution in a disposable container
//!
//! `execute` never fails: image pulls, launch errors, timeouts and non-zero
//! exits are all folded into an [`ExecutionResult`]. Once a container has been
//! launched it is removed exactly once, whatever happened in between.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};

use super::runtime::{ContainerRuntime, ContainerSpec, ResourceLimits, SandboxError};
use super::{DEFAULT_IMAGE, DEFAULT_TIMEOUT};
use crate::metrics::{EXECUTIONS_TOTAL, EXECUTION_DURATION, IMAGE_PULLS};

/// Interval between container status polls
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Grace period given to a timed-out container before it is killed
pub const STOP_GRACE: Duration = Duration::from_secs(5);

/// Longest time a single execution may run; larger requests are clamped
pub const MAX_TIMEOUT: Duration = Duration::from_secs(3600);

/// What to run and where
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionRequest {
    pub code: String,
    pub image: String,
    pub packages: Vec<String>,
    pub timeout: Duration,
}

impl ExecutionRequest {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            image: DEFAULT_IMAGE.to_string(),
            packages: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    pub fn packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.packages = packages.into_iter().map(Into::into).collect();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Outcome of one execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub output: String,
    pub error: String,
    pub exit_code: i64,
}

impl ExecutionResult {
    /// Logs go to `output` on exit 0 and to `error` otherwise
    pub fn from_exit(exit_code: i64, logs: String) -> Self {
        if exit_code == 0 {
            Self {
                output: logs,
                error: String::new(),
                exit_code,
            }
        } else {
            Self {
                output: String::new(),
                error: logs,
                exit_code,
            }
        }
    }

    pub fn timed_out(timeout: Duration) -> Self {
        Self {
            output: String::new(),
            error: format!("Execution timed out after {} seconds", timeout.as_secs()),
            exit_code: -1,
        }
    }

    pub fn fault(error: impl std::fmt::Display) -> Self {
        Self {
            output: String::new(),
            error: format!("Unexpected error: {}", error),
            exit_code: -1,
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Quote `s` as a single POSIX shell word
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Build the container command for `request`.
///
/// Packages are installed quietly first; a failed install reports itself on
/// stderr and exits 1 without running the code.
pub fn build_command(request: &ExecutionRequest) -> Vec<String> {
    let mut script = String::new();

    if !request.packages.is_empty() {
        let quoted: Vec<String> = request.packages.iter().map(|p| shell_quote(p)).collect();
        let notice = shell_quote(&format!(
            "Package installation failed: {}",
            request.packages.join(" ")
        ));
        script.push_str(&format!(
            "pip install --quiet --no-cache-dir {} > /dev/null 2>&1 || {{ echo {} >&2; exit 1; }}; ",
            quoted.join(" "),
            notice
        ));
    }

    script.push_str(&format!("python -c {}", shell_quote(&request.code)));

    vec!["sh".to_string(), "-c".to_string(), script]
}

/// How a supervised execution ended
enum Outcome {
    Exited { exit_code: i64, logs: String },
    TimedOut,
    Fault(SandboxError),
}

impl Outcome {
    fn status_label(&self) -> &'static str {
        match self {
            Outcome::Exited { exit_code: 0, .. } => "success",
            Outcome::Exited { .. } => "error",
            Outcome::TimedOut => "timeout",
            Outcome::Fault(_) => "fault",
        }
    }

    fn into_result(self, timeout: Duration) -> ExecutionResult {
        match self {
            Outcome::Exited { exit_code, logs } => ExecutionResult::from_exit(exit_code, logs),
            Outcome::TimedOut => ExecutionResult::timed_out(timeout),
            Outcome::Fault(e) => ExecutionResult::fault(e),
        }
    }
}

/// Runs code in containers obtained from a [`ContainerRuntime`]
///
/// Cheap to share: executions are independent and may run concurrently.
pub struct SandboxExecutor {
    runtime: Arc<dyn ContainerRuntime>,
    limits: ResourceLimits,
    poll_interval: Duration,
    stop_grace: Duration,
}

impl SandboxExecutor {
    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self {
            runtime,
            limits: ResourceLimits::default(),
            poll_interval: POLL_INTERVAL,
            stop_grace: STOP_GRACE,
        }
    }

    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Run `request` to completion, timeout or failure
    pub async fn execute(&self, mut request: ExecutionRequest) -> ExecutionResult {
        if request.timeout > MAX_TIMEOUT {
            warn!(
                requested_secs = request.timeout.as_secs(),
                max_secs = MAX_TIMEOUT.as_secs(),
                "Timeout clamped"
            );
            request.timeout = MAX_TIMEOUT;
        }

        let span = info_span!(
            "sandbox_execute",
            image = %request.image,
            packages = request.packages.len(),
            timeout_secs = request.timeout.as_secs(),
        );

        let started = Instant::now();
        let outcome = self.run(&request).instrument(span).await;

        EXECUTION_DURATION.observe(started.elapsed().as_secs_f64());
        EXECUTIONS_TOTAL
            .with_label_values(&[outcome.status_label()])
            .inc();

        if let Outcome::Fault(e) = &outcome {
            warn!(image = %request.image, error = %e, "Execution failed");
        }
        outcome.into_result(request.timeout)
    }

    async fn run(&self, request: &ExecutionRequest) -> Outcome {
        if let Err(e) = self.ensure_image(&request.image).await {
            return Outcome::Fault(e);
        }

        let spec = ContainerSpec::new(&request.image, build_command(request), self.limits);
        let container_id = match self.runtime.run_detached(&spec).await {
            Ok(id) => id,
            Err(e) => return Outcome::Fault(e),
        };
        info!(container_id = %container_id, "Container launched");

        let outcome = self.supervise(&container_id, request.timeout).await;

        match self.runtime.remove(&container_id).await {
            Ok(()) => debug!(container_id = %container_id, "Container removed"),
            Err(e) => warn!(container_id = %container_id, error = %e, "Failed to remove container"),
        }

        outcome
    }

    async fn ensure_image(&self, image: &str) -> Result<(), SandboxError> {
        if self.runtime.image_exists(image).await? {
            return Ok(());
        }

        match self.runtime.pull_image(image).await {
            Ok(()) => {
                IMAGE_PULLS.with_label_values(&["ok"]).inc();
                Ok(())
            }
            Err(e) => {
                IMAGE_PULLS.with_label_values(&["error"]).inc();
                Err(e)
            }
        }
    }

    /// Poll until the container stops or `timeout` elapses since launch
    async fn supervise(&self, container_id: &str, timeout: Duration) -> Outcome {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return Outcome::Fault(SandboxError::Runtime(format!(
                "timeout of {}s is out of range",
                timeout.as_secs()
            )));
        };

        loop {
            let status = match self.runtime.inspect(container_id).await {
                Ok(status) => status,
                Err(e) => return Outcome::Fault(e),
            };

            if status.state.is_terminal() {
                let exit_code = status.exit_code.unwrap_or(-1);
                return match self.runtime.logs(container_id).await {
                    Ok(logs) => {
                        info!(container_id = %container_id, exit_code, "Container exited");
                        Outcome::Exited { exit_code, logs }
                    }
                    Err(e) => Outcome::Fault(e),
                };
            }

            if Instant::now() >= deadline {
                warn!(container_id = %container_id, timeout_secs = timeout.as_secs(), "Execution timed out, stopping container");
                if let Err(e) = self.runtime.stop(container_id, self.stop_grace).await {
                    warn!(container_id = %container_id, error = %e, "Failed to stop container");
                }
                return Outcome::TimedOut;
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request = ExecutionRequest::new("print(1)");
        assert_eq!(request.image, "python:3.11-slim");
        assert!(request.packages.is_empty());
        assert_eq!(request.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_shell_quote_escapes_single_quotes() {
        assert_eq!(shell_quote("abc"), "'abc'");
        assert_eq!(shell_quote("print('hi')"), r"'print('\''hi'\'')'");
    }

    #[test]
    fn test_command_without_packages() {
        let command = build_command(&ExecutionRequest::new("print(2 + 2)"));
        assert_eq!(command, vec!["sh", "-c", "python -c 'print(2 + 2)'"]);
    }

    #[test]
    fn test_command_with_packages_reports_install_failure() {
        let request = ExecutionRequest::new("import numpy").packages(["numpy", "pandas"]);
        let command = build_command(&request);
        assert_eq!(
            command[2],
            "pip install --quiet --no-cache-dir 'numpy' 'pandas' > /dev/null 2>&1 \
             || { echo 'Package installation failed: numpy pandas' >&2; exit 1; }; \
             python -c 'import numpy'"
        );
    }

    #[test]
    fn test_result_shapes() {
        let ok = ExecutionResult::from_exit(0, "4\n".to_string());
        assert!(ok.is_success());
        assert_eq!(ok.output, "4\n");
        assert!(ok.error.is_empty());

        let failed = ExecutionResult::from_exit(1, "Traceback".to_string());
        assert!(failed.output.is_empty());
        assert_eq!(failed.error, "Traceback");

        let timed_out = ExecutionResult::timed_out(Duration::from_secs(2));
        assert_eq!(timed_out.error, "Execution timed out after 2 seconds");
        assert_eq!(timed_out.exit_code, -1);

        let fault = ExecutionResult::fault("daemon gone");
        assert_eq!(fault.error, "Unexpected error: daemon gone");
    }

    #[test]
    fn test_max_timeout_fits_a_deadline() {
        assert!(Instant::now().checked_add(MAX_TIMEOUT).is_some());
    }
}
