//! `GET /ws/chat`: persistent connection, one run per inbound text frame
//!
//! Each frame is `{"message": "...", "user_id": "..."}`. Runs on a connection
//! are strictly sequential and share the connection's thread id. Malformed
//! frames get a single RUN_ERROR and the connection stays open. Frames that
//! arrive during a run are queued; a close during a run drops it.

use std::collections::VecDeque;
use std::fmt::Display;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tracing::{debug, info, warn};

use super::{observe, AppState};
use crate::agent::Agent;
use crate::metrics::ACTIVE_CONNECTIONS;
use crate::relay::Connection;

pub async fn ws_chat(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| async move {
        let (outgoing, incoming) = socket.split();
        serve_connection(incoming, outgoing, state.agent).await;
    })
}

/// Keeps ACTIVE_CONNECTIONS accurate even if the connection task is dropped
struct ConnectionGauge;

impl ConnectionGauge {
    fn open() -> Self {
        ACTIVE_CONNECTIONS.inc();
        ConnectionGauge
    }
}

impl Drop for ConnectionGauge {
    fn drop(&mut self) {
        ACTIVE_CONNECTIONS.dec();
    }
}

/// Drive one connection until the client closes it or a send fails
pub async fn serve_connection<S, K, E>(mut incoming: S, mut outgoing: K, agent: Arc<dyn Agent>)
where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
    K: Sink<Message> + Unpin,
    K::Error: Display,
{
    let _gauge = ConnectionGauge::open();
    let mut connection = Connection::open();
    info!(thread_id = %connection.thread_id(), "Connection opened");

    let mut queued: VecDeque<String> = VecDeque::new();

    'frames: loop {
        let text = match queued.pop_front() {
            Some(text) => text,
            None => match incoming.next().await {
                Some(Ok(Message::Text(text))) => text,
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    debug!(thread_id = %connection.thread_id(), error = %e, "Receive failed");
                    break;
                }
            },
        };

        let mut events = observe(connection.handle_frame(agent.clone(), &text), "ws");
        loop {
            tokio::select! {
                biased;

                event = events.next() => {
                    let Some(event) = event else {
                        break;
                    };
                    let payload = match serde_json::to_string(&event) {
                        Ok(payload) => payload,
                        Err(e) => {
                            warn!(error = %e, "Failed to encode event");
                            continue;
                        }
                    };
                    if let Err(e) = outgoing.send(Message::Text(payload)).await {
                        debug!(thread_id = %connection.thread_id(), error = %e, "Client went away mid-run");
                        break 'frames;
                    }
                }

                frame = incoming.next() => match frame {
                    Some(Ok(Message::Text(text))) => queued.push_back(text),
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(thread_id = %connection.thread_id(), "Client closed mid-run");
                        break 'frames;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(thread_id = %connection.thread_id(), error = %e, "Receive failed mid-run");
                        break 'frames;
                    }
                },
            }
        }
    }

    info!(
        thread_id = %connection.thread_id(),
        runs = connection.runs_started(),
        "Connection closed"
    );
}
