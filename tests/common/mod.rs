//! Test doubles shared by the integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream;

use chatgate::agent::{Agent, AgentError, FragmentStream};
use chatgate::relay::Event;
use chatgate::sandbox::{
    ContainerRuntime, ContainerSpec, ContainerState, ContainerStatus, SandboxError,
};

// ─────────────────────────────────────────────────────────────────────────────
// Scripted agent
// ─────────────────────────────────────────────────────────────────────────────

/// One item the scripted agent yields
#[derive(Debug, Clone)]
pub enum Step {
    Text(Option<&'static str>),
    Fail(&'static str),
}

/// Agent that replays a fixed script and records the messages it receives
pub struct ScriptedAgent {
    steps: Vec<Step>,
    start_error: Option<&'static str>,
    messages: Mutex<Vec<String>>,
}

impl ScriptedAgent {
    pub fn replying(fragments: &[&'static str]) -> Self {
        Self::with_steps(fragments.iter().map(|f| Step::Text(Some(*f))).collect())
    }

    pub fn with_steps(steps: Vec<Step>) -> Self {
        Self {
            steps,
            start_error: None,
            messages: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_to_start(message: &'static str) -> Self {
        Self {
            steps: Vec::new(),
            start_error: Some(message),
            messages: Mutex::new(Vec::new()),
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    fn record(&self, message: &str) -> Result<(), AgentError> {
        self.messages.lock().unwrap().push(message.to_string());
        match self.start_error {
            Some(error) => Err(AgentError::failed(error)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Agent for ScriptedAgent {
    async fn run(&self, message: &str) -> Result<String, AgentError> {
        self.record(message)?;
        let mut reply = String::new();
        for step in &self.steps {
            match step {
                Step::Text(Some(text)) => reply.push_str(text),
                Step::Text(None) => {}
                Step::Fail(error) => return Err(AgentError::failed(*error)),
            }
        }
        Ok(reply)
    }

    async fn run_stream(&self, message: &str) -> Result<FragmentStream, AgentError> {
        self.record(message)?;
        let items: Vec<Result<Option<String>, AgentError>> = self
            .steps
            .iter()
            .map(|step| match step {
                Step::Text(text) => Ok(text.map(str::to_string)),
                Step::Fail(error) => Err(AgentError::failed(*error)),
            })
            .collect();
        Ok(Box::pin(stream::iter(items)))
    }
}

/// The `type` names of `events`, in order
pub fn event_types(events: &[Event]) -> Vec<&'static str> {
    events.iter().map(Event::event_type).collect()
}

/// Deltas of the content events, in order
pub fn deltas(events: &[Event]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::TextMessageContent { delta, .. } => Some(delta.clone()),
            _ => None,
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Recording container runtime
// ─────────────────────────────────────────────────────────────────────────────

/// Container runtime fake that records every call it receives
pub struct MockRuntime {
    image_present: bool,
    pull_error: Option<String>,
    start_error: Option<String>,
    inspect_error: Option<String>,
    logs_error: Option<String>,
    stop_error: Option<String>,
    /// Inspections reporting "running" before the container exits; `None` runs forever
    polls_until_exit: Option<usize>,
    exit_code: i64,
    logs: String,
    calls: Mutex<Vec<String>>,
    specs: Mutex<VecDeque<ContainerSpec>>,
    launched: AtomicUsize,
    inspections: AtomicUsize,
}

impl MockRuntime {
    pub fn exiting(exit_code: i64, logs: &str) -> Self {
        Self {
            image_present: true,
            pull_error: None,
            start_error: None,
            inspect_error: None,
            logs_error: None,
            stop_error: None,
            polls_until_exit: Some(1),
            exit_code,
            logs: logs.to_string(),
            calls: Mutex::new(Vec::new()),
            specs: Mutex::new(VecDeque::new()),
            launched: AtomicUsize::new(0),
            inspections: AtomicUsize::new(0),
        }
    }

    pub fn never_exiting() -> Self {
        Self {
            polls_until_exit: None,
            ..Self::exiting(0, "")
        }
    }

    /// Report "running" until the `polls`-th inspection
    pub fn exiting_after(mut self, polls: usize) -> Self {
        self.polls_until_exit = Some(polls);
        self
    }

    pub fn without_image(mut self) -> Self {
        self.image_present = false;
        self
    }

    pub fn pull_failing(mut self, reason: &str) -> Self {
        self.image_present = false;
        self.pull_error = Some(reason.to_string());
        self
    }

    pub fn start_failing(mut self, reason: &str) -> Self {
        self.start_error = Some(reason.to_string());
        self
    }

    pub fn inspect_failing(mut self, reason: &str) -> Self {
        self.inspect_error = Some(reason.to_string());
        self
    }

    pub fn logs_failing(mut self, reason: &str) -> Self {
        self.logs_error = Some(reason.to_string());
        self
    }

    pub fn stop_failing(mut self, reason: &str) -> Self {
        self.stop_error = Some(reason.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded calls to `operation`
    pub fn count(&self, operation: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.split(':').next() == Some(operation))
            .count()
    }

    pub fn specs(&self) -> Vec<ContainerSpec> {
        self.specs.lock().unwrap().iter().cloned().collect()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ContainerRuntime for MockRuntime {
    async fn image_exists(&self, image: &str) -> Result<bool, SandboxError> {
        self.record(format!("image_exists:{}", image));
        Ok(self.image_present)
    }

    async fn pull_image(&self, image: &str) -> Result<(), SandboxError> {
        self.record(format!("pull_image:{}", image));
        match &self.pull_error {
            Some(reason) => Err(SandboxError::ImagePull {
                image: image.to_string(),
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    async fn run_detached(&self, spec: &ContainerSpec) -> Result<String, SandboxError> {
        self.record("run_detached".to_string());
        if let Some(reason) = &self.start_error {
            return Err(SandboxError::Runtime(reason.clone()));
        }
        self.specs.lock().unwrap().push_back(spec.clone());
        let n = self.launched.fetch_add(1, Ordering::SeqCst);
        Ok(format!("container-{}", n))
    }

    async fn inspect(&self, id: &str) -> Result<ContainerStatus, SandboxError> {
        self.record(format!("inspect:{}", id));
        if let Some(reason) = &self.inspect_error {
            return Err(SandboxError::Runtime(reason.clone()));
        }
        let seen = self.inspections.fetch_add(1, Ordering::SeqCst);
        let exited = matches!(self.polls_until_exit, Some(n) if seen + 1 >= n);
        Ok(if exited {
            ContainerStatus {
                state: ContainerState::Exited,
                exit_code: Some(self.exit_code),
            }
        } else {
            ContainerStatus {
                state: ContainerState::Running,
                exit_code: None,
            }
        })
    }

    async fn logs(&self, id: &str) -> Result<String, SandboxError> {
        self.record(format!("logs:{}", id));
        match &self.logs_error {
            Some(reason) => Err(SandboxError::Runtime(reason.clone())),
            None => Ok(self.logs.clone()),
        }
    }

    async fn stop(&self, id: &str, grace: Duration) -> Result<(), SandboxError> {
        self.record(format!("stop:{}:{}", id, grace.as_secs()));
        match &self.stop_error {
            Some(reason) => Err(SandboxError::Runtime(reason.clone())),
            None => Ok(()),
        }
    }

    async fn remove(&self, id: &str) -> Result<(), SandboxError> {
        self.record(format!("remove:{}", id));
        Ok(())
    }
}
