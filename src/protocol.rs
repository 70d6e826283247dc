//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::config::QuizConfig;
use crate::domain::{Mode, Prompt, SessionState, VerbClass};
use crate::ledger::ReviewEntry;
use crate::logic::{Milestone, Outcome, Verdict};

/// Messages the client can send over WebSocket. The connection owns one session.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    SubmitAnswer { answer: String },
    Next,
    Review,
    /// Drop the current session and start over (score and streak reset).
    Restart,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Session { session: SessionOut },
    AnswerResult { result: AnswerOut },
    Review { entries: Vec<ReviewEntry> },
    Error { message: String },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptOut {
    pub verb: String,
    pub verb_class: VerbClass,
    pub tense: String,
    pub pronoun: String,
}

/// Everything the presentation needs to draw the current round.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOut {
    pub session_id: String,
    pub prompt: PromptOut,
    pub mode: Mode,
    pub strikes: u8,
    pub strike_limit: u8,
    pub streak: u32,
    pub score: u32,
    pub resolved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentence_template: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOut {
    pub correct: bool,
    pub verdict: Verdict,
    pub feedback: String,
    /// Expected form, only once the round reveals it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<Milestone>,
    pub session: SessionOut,
}

pub fn to_prompt_out(p: &Prompt) -> PromptOut {
    PromptOut {
        verb: p.verb.infinitive.to_string(),
        verb_class: p.verb.class,
        tense: p.tense.name().to_string(),
        pronoun: p.pronoun.label().to_string(),
    }
}

/// Convert internal session state to the public DTO.
pub fn to_session_out(id: &str, s: &SessionState, cfg: &QuizConfig) -> SessionOut {
    SessionOut {
        session_id: id.to_string(),
        prompt: to_prompt_out(&s.prompt),
        mode: s.mode,
        strikes: s.strikes,
        strike_limit: cfg.strike_limit,
        streak: s.streak,
        score: s.score,
        resolved: s.resolved,
        sentence_template: s.sentence_template.clone(),
    }
}

pub fn to_answer_out(id: &str, o: &Outcome, cfg: &QuizConfig) -> AnswerOut {
    AnswerOut {
        correct: o.correct,
        verdict: o.verdict,
        feedback: o.feedback.clone(),
        expected: o.revealed.map(str::to_string),
        milestone: o.milestone.clone(),
        session: to_session_out(id, &o.state, cfg),
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

#[derive(Deserialize)]
pub struct AnswerIn {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub answer: String,
}

#[derive(Deserialize)]
pub struct NextIn {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

#[derive(Serialize)]
pub struct ReviewOut {
    pub entries: Vec<ReviewEntry>,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub message: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
