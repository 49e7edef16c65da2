//! Prometheus metrics for relay and sandbox observability
//!
//! All metrics live in the default registry and are exposed in text format
//! by the `/metrics` route.

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge, register_histogram, register_histogram_vec,
    CounterVec, Encoder, Gauge, Histogram, HistogramVec, TextEncoder,
};

lazy_static! {
    // ─────────────────────────────────────────────────────────────────────────────
    // Relay Metrics
    // ─────────────────────────────────────────────────────────────────────────────

    /// Completed runs by terminal outcome.
    ///
    /// Labels:
    /// - transport: "sse" or "ws"
    /// - outcome: "finished" or "error"
    pub static ref RUNS_TOTAL: CounterVec = register_counter_vec!(
        "chatgate_runs_total",
        "Agent runs relayed, by transport and terminal outcome",
        &["transport", "outcome"]
    ).expect("failed to register RUNS_TOTAL metric");

    /// Content fragments forwarded to clients as TEXT_MESSAGE_CONTENT events.
    pub static ref FRAGMENTS_RELAYED: CounterVec = register_counter_vec!(
        "chatgate_fragments_relayed_total",
        "Non-empty agent fragments relayed as content events",
        &["transport"]
    ).expect("failed to register FRAGMENTS_RELAYED metric");

    /// Time from request receipt to the terminal event.
    pub static ref RUN_DURATION: HistogramVec = register_histogram_vec!(
        "chatgate_run_duration_seconds",
        "Wall-clock duration of a relayed run",
        &["transport"],
        vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]
    ).expect("failed to register RUN_DURATION metric");

    /// Currently open WebSocket connections.
    pub static ref ACTIVE_CONNECTIONS: Gauge = register_gauge!(
        "chatgate_active_connections",
        "Open persistent chat connections"
    ).expect("failed to register ACTIVE_CONNECTIONS metric");

    // ─────────────────────────────────────────────────────────────────────────────
    // Sandbox Metrics
    // ─────────────────────────────────────────────────────────────────────────────

    /// Sandbox executions by status.
    ///
    /// Labels:
    /// - status: "success", "error", "timeout" or "fault"
    pub static ref EXECUTIONS_TOTAL: CounterVec = register_counter_vec!(
        "chatgate_sandbox_executions_total",
        "Sandboxed code executions by status",
        &["status"]
    ).expect("failed to register EXECUTIONS_TOTAL metric");

    /// Execution wall time, launch to result.
    pub static ref EXECUTION_DURATION: Histogram = register_histogram!(
        "chatgate_sandbox_execution_duration_seconds",
        "Duration of sandboxed executions",
        vec![0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0]
    ).expect("failed to register EXECUTION_DURATION metric");

    /// Image pulls triggered because the image was missing locally.
    pub static ref IMAGE_PULLS: CounterVec = register_counter_vec!(
        "chatgate_sandbox_image_pulls_total",
        "Container image pulls by result",
        &["result"]
    ).expect("failed to register IMAGE_PULLS metric");
}

/// Encode every registered metric in the Prometheus text format.
pub fn gather_text() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buf = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
