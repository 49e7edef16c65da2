//! `POST /chat` and `POST /chat/form`: the whole reply in one JSON body

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::AppState;
use crate::agent::AgentError;

fn default_user_id() -> String {
    "default".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ChatForm {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatFormWithUser {
    pub message: String,
    #[serde(default = "default_user_id")]
    pub user_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

/// Agent failure reported as `500 {"detail": "..."}`
#[derive(Debug)]
pub struct ApiError(AgentError);

impl From<AgentError> for ApiError {
    fn from(e: AgentError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(error = %self.0, "Chat request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "detail": self.0.to_string() })),
        )
            .into_response()
    }
}

pub async fn chat(
    State(state): State<AppState>,
    Form(form): Form<ChatForm>,
) -> Result<Json<ChatReply>, ApiError> {
    let reply = state.agent.run(&form.message).await?;
    Ok(Json(ChatReply { reply }))
}

pub async fn chat_form(
    State(state): State<AppState>,
    Form(form): Form<ChatFormWithUser>,
) -> Result<Json<ChatReply>, ApiError> {
    debug!(user_id = %form.user_id, "Form chat request");
    let reply = state.agent.run(&form.message).await?;
    Ok(Json(ChatReply { reply }))
}
