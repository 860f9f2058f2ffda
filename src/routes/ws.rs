//! WebSocket upgrade + message loop. Each connection owns one `Session`; client
//! messages are handled in order and answered with a single JSON message each.
//! The current challenge is pushed right after connecting.
//!
//! Every message that may touch SQLite is handled on the blocking pool: the
//! session moves into the blocking task and comes back with the reply.

use std::sync::Arc;

use axum::{
  extract::{
    ws::{Message, WebSocket},
    Query, State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use serde::Deserialize;
use tracing::{debug, error, info, instrument};

use crate::logic::highlight;
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::session::Session;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
  /// Deep-link token from the page URL, e.g. `challenge=2`.
  pub hash: Option<String>,
}

#[instrument(level = "info", skip(ws, state))]
pub async fn ws_upgrade(
  ws: WebSocketUpgrade,
  State(state): State<Arc<AppState>>,
  Query(q): Query<WsQuery>,
) -> impl IntoResponse {
  info!(target: "sql_trainer", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state, q.hash))
}

async fn send(socket: &mut WebSocket, msg: &ServerWsMessage) -> bool {
  let out = serde_json::to_string(msg).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
  });
  if let Err(e) = socket.send(Message::Text(out)).await {
    error!(target: "sql_trainer", error = %e, "WS send error");
    return false;
  }
  true
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>, hash: Option<String>) {
  let worker = state.clone();
  let opened = tokio::task::spawn_blocking(move || {
    let mut session = Session::start(&worker, hash.as_deref());
    let first = ServerWsMessage::Challenge { challenge: session.view() };
    (session, first)
  })
  .await;
  let (mut session, first) = match opened {
    Ok(pair) => pair,
    Err(e) => {
      error!(target: "sql_trainer", error = %e, "Session start failed");
      return;
    }
  };
  info!(target: "sql_trainer", session = %session.id, "WebSocket connected");
  if !send(&mut socket, &first).await {
    return;
  }

  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let reply = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "sql_trainer", session = %session.id, "WS received: {:?}", &incoming);
            let id = session.id;
            let worker = state.clone();
            let handled = tokio::task::spawn_blocking(move || {
              let reply = handle_client_ws(incoming, &worker, &mut session);
              (session, reply)
            })
            .await;
            match handled {
              Ok((back, reply)) => {
                session = back;
                reply
              }
              Err(e) => {
                error!(target: "sql_trainer", session = %id, error = %e, "WS handler failed; closing");
                return;
              }
            }
          }
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };
        if !send(&mut socket, &reply).await {
          break;
        }
      }
      Message::Ping(payload) => {
        let _ = socket.send(Message::Pong(payload)).await;
      }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "sql_trainer", session = %session.id, "WebSocket disconnected");
}

/// Navigation replies always carry the challenge view, including when the move was a
/// boundary no-op, so the client can resync its controls and URL.
fn handle_client_ws(msg: ClientWsMessage, state: &AppState, session: &mut Session) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::Start { hash } => {
      *session = Session::start(state, hash.as_deref());
      ServerWsMessage::Challenge { challenge: session.view() }
    }

    ClientWsMessage::Previous => {
      let moved = session.previous();
      info!(target: "challenge", session = %session.id, moved, index = session.navigation().current(), "WS previous");
      ServerWsMessage::Challenge { challenge: session.view() }
    }

    ClientWsMessage::Next => {
      let moved = session.next();
      info!(target: "challenge", session = %session.id, moved, index = session.navigation().current(), "WS next");
      ServerWsMessage::Challenge { challenge: session.view() }
    }

    ClientWsMessage::Jump { index } => {
      if session.jump(index) {
        info!(target: "challenge", session = %session.id, index, "WS jump");
        ServerWsMessage::Challenge { challenge: session.view() }
      } else {
        ServerWsMessage::Error { message: format!("Unknown challenge index: {}", index) }
      }
    }

    ClientWsMessage::Run { sql } => ServerWsMessage::Verdict { verdict: session.run(&sql) },

    ClientWsMessage::Highlight { sql } => ServerWsMessage::Highlight { spans: highlight(&sql) },

    ClientWsMessage::Reset => {
      session.reload();
      ServerWsMessage::Challenge { challenge: session.view() }
    }
  }
}
