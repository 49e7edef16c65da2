//! `POST /execute`: run code in the sandbox
//!
//! Always answers 200; failures are carried in the result body.

use std::time::Duration;

use axum::{extract::State, Json};
use serde::Deserialize;

use super::AppState;
use crate::sandbox::{ExecutionRequest, ExecutionResult};

#[derive(Debug, Deserialize)]
pub struct ExecuteBody {
    pub code: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub packages: Option<Vec<String>>,
    /// Seconds
    #[serde(default)]
    pub timeout: Option<u64>,
}

pub async fn execute(
    State(state): State<AppState>,
    Json(body): Json<ExecuteBody>,
) -> Json<ExecutionResult> {
    let Some(executor) = state.executor.as_ref() else {
        return Json(ExecutionResult::fault("container runtime unavailable"));
    };

    let request = ExecutionRequest::new(body.code)
        .image(body.image.unwrap_or_else(|| state.sandbox_image.clone()))
        .packages(body.packages.unwrap_or_default())
        .timeout(
            body.timeout
                .map(Duration::from_secs)
                .unwrap_or(state.sandbox_timeout),
        );

    Json(executor.execute(request).await)
}
