//! HTTP surface for the relay and the executor
//!
//! Routes:
//! - `POST /chat/stream` - one run as Server-Sent Events
//! - `GET /ws/chat` - persistent WebSocket, one run per inbound frame
//! - `POST /chat`, `POST /chat/form` - complete reply as JSON
//! - `POST /execute` - sandboxed code execution
//! - `GET /health`, `GET /metrics`

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use futures_util::StreamExt;
use serde_json::json;

use crate::agent::Agent;
use crate::metrics::{self, FRAGMENTS_RELAYED, RUNS_TOTAL, RUN_DURATION};
use crate::relay::{Event, EventStream};
use crate::sandbox::{SandboxExecutor, DEFAULT_IMAGE, DEFAULT_TIMEOUT};

pub mod chat;
pub mod execute;
pub mod sse;
pub mod ws;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<dyn Agent>,
    /// `None` when no container runtime was reachable at startup
    pub executor: Option<Arc<SandboxExecutor>>,
    pub sandbox_image: String,
    pub sandbox_timeout: Duration,
}

impl AppState {
    pub fn new(agent: Arc<dyn Agent>) -> Self {
        Self {
            agent,
            executor: None,
            sandbox_image: DEFAULT_IMAGE.to_string(),
            sandbox_timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_executor(mut self, executor: Arc<SandboxExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn with_sandbox_defaults(mut self, image: impl Into<String>, timeout: Duration) -> Self {
        self.sandbox_image = image.into();
        self.sandbox_timeout = timeout;
        self
    }
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/chat/stream", post(sse::chat_stream))
        .route("/ws/chat", get(ws::ws_chat))
        .route("/chat", post(chat::chat))
        .route("/chat/form", post(chat::chat_form))
        .route("/execute", post(execute::execute))
        .route("/health", get(health))
        .route("/metrics", get(metrics_text))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Prometheus text exposition
async fn metrics_text() -> impl IntoResponse {
    match metrics::gather_text() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// Record relay metrics for `events` as they pass to `transport`
///
/// Run counters only move once RUN_STARTED has passed, so frames rejected
/// before a run began are not counted as runs.
pub(crate) fn observe(events: EventStream, transport: &'static str) -> EventStream {
    let mut started: Option<Instant> = None;
    Box::pin(events.inspect(move |event| match event {
        Event::RunStarted { .. } => started = Some(Instant::now()),
        Event::TextMessageContent { .. } => {
            FRAGMENTS_RELAYED.with_label_values(&[transport]).inc();
        }
        Event::RunFinished { .. } | Event::RunError { .. } => {
            let Some(started) = started.take() else {
                return;
            };
            let outcome = if matches!(event, Event::RunFinished { .. }) {
                "finished"
            } else {
                "error"
            };
            RUNS_TOTAL.with_label_values(&[transport, outcome]).inc();
            RUN_DURATION
                .with_label_values(&[transport])
                .observe(started.elapsed().as_secs_f64());
        }
        _ => {}
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::run::reject;

    #[tokio::test]
    async fn test_rejected_frame_is_not_counted_as_run() {
        let errors = RUNS_TOTAL.with_label_values(&["rejected", "error"]);
        let durations = RUN_DURATION.with_label_values(&["rejected"]);

        let events: Vec<Event> = observe(reject("Invalid JSON"), "rejected").collect().await;

        assert_eq!(events.len(), 1);
        assert_eq!(errors.get(), 0.0);
        assert_eq!(durations.get_sample_count(), 0);
    }

    #[tokio::test]
    async fn test_started_run_error_is_counted() {
        let errors = RUNS_TOTAL.with_label_values(&["observed", "error"]);
        let events = futures_util::stream::iter(vec![
            Event::run_started("thread", "run", None),
            Event::run_error("backend down"),
        ]);

        let _: Vec<Event> = observe(Box::pin(events), "observed").collect().await;

        assert_eq!(errors.get(), 1.0);
        assert_eq!(RUN_DURATION.with_label_values(&["observed"]).get_sample_count(), 1);
    }
}
