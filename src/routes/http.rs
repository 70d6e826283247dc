//! HTTP endpoint handlers. These are thin wrappers that forward to `AppState`.
//! Each handler is instrumented and logs identifiers and basic result info.

use std::sync::Arc;
use axum::{
  extract::{Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use tracing::{info, instrument};

use crate::protocol::*;
use crate::state::{Advance, AppState};

fn error(status: StatusCode, message: impl Into<String>) -> Response {
  (status, Json(ErrorOut { message: message.into() })).into_response()
}

fn unknown_session(id: &str) -> Response {
  error(StatusCode::NOT_FOUND, format!("Unknown sessionId: {}", id))
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_start_session(State(state): State<Arc<AppState>>) -> Response {
  let (id, session) = state.start_session().await;
  info!(target: "quiz", session = %id, "HTTP session started");
  Json(to_session_out(&id, &session, &state.config)).into_response()
}

#[instrument(level = "info", skip(state), fields(%q.session_id))]
pub async fn http_get_session(
  State(state): State<Arc<AppState>>,
  Query(q): Query<SessionQuery>,
) -> Response {
  match state.session(&q.session_id).await {
    Some(s) => Json(to_session_out(&q.session_id, &s, &state.config)).into_response(),
    None => unknown_session(&q.session_id),
  }
}

#[instrument(level = "info", skip(state), fields(%q.session_id))]
pub async fn http_end_session(
  State(state): State<Arc<AppState>>,
  Query(q): Query<SessionQuery>,
) -> Response {
  if state.end_session(&q.session_id).await {
    info!(target: "quiz", session = %q.session_id, "HTTP session ended");
    StatusCode::NO_CONTENT.into_response()
  } else {
    unknown_session(&q.session_id)
  }
}

#[instrument(level = "info", skip(state, body), fields(%body.session_id, answer_len = body.answer.len()))]
pub async fn http_post_answer(
  State(state): State<Arc<AppState>>,
  Json(body): Json<AnswerIn>,
) -> Response {
  match state.submit_answer(&body.session_id, &body.answer).await {
    Some(outcome) => {
      info!(target: "quiz", session = %body.session_id, correct = outcome.correct, verdict = ?outcome.verdict, "HTTP submit_answer evaluated");
      Json(to_answer_out(&body.session_id, &outcome, &state.config)).into_response()
    }
    None => unknown_session(&body.session_id),
  }
}

#[instrument(level = "info", skip(state, body), fields(%body.session_id))]
pub async fn http_post_next(
  State(state): State<Arc<AppState>>,
  Json(body): Json<NextIn>,
) -> Response {
  match state.advance(&body.session_id).await {
    Some(Advance::Moved(s)) => Json(to_session_out(&body.session_id, &s, &state.config)).into_response(),
    Some(Advance::Pending(_)) => error(StatusCode::CONFLICT, "Answer the current prompt before moving on."),
    None => unknown_session(&body.session_id),
  }
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_review(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let entries = state.review().await;
  info!(target: "quiz", entries = entries.len(), "HTTP review served");
  Json(ReviewOut { entries })
}
