//! `POST /chat/stream`: one run relayed as Server-Sent Events

use std::convert::Infallible;

use axum::{
    extract::State,
    http::{header, HeaderName},
    response::{
        sse::{Event as SseEvent, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use futures_util::StreamExt;
use serde::Deserialize;
use tracing::debug;

use super::{observe, AppState};
use crate::relay::{relay_run, RunRequest};

fn default_user_id() -> String {
    "default".to_string()
}

/// Body of a streaming chat request. Missing ids are generated.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default = "default_user_id")]
    pub user_id: String,
    pub message: String,
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub parent_run_id: Option<String>,
}

impl ChatRequest {
    pub fn into_run_request(self) -> RunRequest {
        let mut request = RunRequest::new(self.message).with_parent_run_id(self.parent_run_id);
        if let Some(thread_id) = self.thread_id {
            request = request.with_thread_id(thread_id);
        }
        if let Some(run_id) = self.run_id {
            request = request.with_run_id(run_id);
        }
        request
    }
}

pub async fn chat_stream(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> impl IntoResponse {
    debug!(user_id = %body.user_id, "Streaming chat request");

    let events = observe(relay_run(state.agent.clone(), body.into_run_request()), "sse");
    let frames = events.filter_map(|event| async move {
        SseEvent::default()
            .json_data(&event)
            .ok()
            .map(Ok::<_, Infallible>)
    });

    (
        [
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
            (HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        Sse::new(frames).keep_alive(KeepAlive::default()),
    )
}
