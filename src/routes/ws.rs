//! WebSocket upgrade + message loop. Each connection owns one quiz session,
//! announced right after the upgrade. Every client message gets exactly one
//! JSON reply.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument};

use crate::protocol::{to_answer_out, to_session_out, ClientWsMessage, ServerWsMessage};
use crate::state::{Advance, AppState};

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "conjuga_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

async fn send(socket: &mut WebSocket, msg: &ServerWsMessage) -> bool {
  let out = serde_json::to_string(msg).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
  });
  match socket.send(Message::Text(out)).await {
    Ok(()) => true,
    Err(e) => {
      error!(target: "conjuga_backend", error = %e, "WS send error");
      false
    }
  }
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  let (mut session_id, first) = state.start_session().await;
  info!(target: "conjuga_backend", session = %session_id, "WebSocket connected");

  let hello = ServerWsMessage::Session { session: to_session_out(&session_id, &first, &state.config) };
  if !send(&mut socket, &hello).await {
    state.end_session(&session_id).await;
    return;
  }

  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let reply = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "conjuga_backend", bytes = txt.len(), "WS message received");
            handle_client_ws(incoming, &state, &mut session_id).await
          }
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };
        if !send(&mut socket, &reply).await {
          break;
        }
      }
      Message::Ping(payload) => {
        if let Err(e) = socket.send(Message::Pong(payload)).await {
          error!(target: "conjuga_backend", error = %e, "WS pong send error");
          break;
        }
      }
      Message::Close(_) => break,
      _ => {}
    }
  }
  state.end_session(&session_id).await;
  info!(target: "conjuga_backend", session = %session_id, "WebSocket disconnected");
}

#[instrument(level = "info", skip(msg, state))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState, session_id: &mut String) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::SubmitAnswer { answer } => match state.submit_answer(session_id, &answer).await {
      Some(outcome) => {
        info!(target: "quiz", session = %session_id, correct = outcome.correct, verdict = ?outcome.verdict, "WS submit_answer evaluated");
        ServerWsMessage::AnswerResult { result: to_answer_out(session_id, &outcome, &state.config) }
      }
      None => ServerWsMessage::Error { message: "Session expired; send restart.".into() },
    },

    ClientWsMessage::Next => match state.advance(session_id).await {
      Some(Advance::Moved(s)) => ServerWsMessage::Session { session: to_session_out(session_id, &s, &state.config) },
      Some(Advance::Pending(_)) => ServerWsMessage::Error { message: "Answer the current prompt before moving on.".into() },
      None => ServerWsMessage::Error { message: "Session expired; send restart.".into() },
    },

    ClientWsMessage::Review => ServerWsMessage::Review { entries: state.review().await },

    ClientWsMessage::Restart => {
      state.end_session(session_id).await;
      let (id, s) = state.start_session().await;
      *session_id = id;
      ServerWsMessage::Session { session: to_session_out(session_id, &s, &state.config) }
    }
  }
}
