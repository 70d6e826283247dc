//! Answer evaluation and the session/mode state machine.
//!
//! Both transitions are pure: they take the current `SessionState` (plus the
//! ledger record for the prompt) and return the next state together with
//! everything the caller must apply or show. Persisting `Outcome::ledger_write`
//! is the caller's job.
//!
//! Transitions:
//!   - conjugation, wrong, strikes below limit  -> retry, no reveal
//!   - conjugation, wrong, strike limit reached -> reveal, failure written
//!   - conjugation, correct                     -> reveal, success written
//!   - conjugation, correct, fresh mastery      -> sentence mode, no reveal
//!   - sentence, any submission                 -> resolved
//!   - resolved, advance                        -> new prompt in conjugation mode

use serde::Serialize;
use tracing::debug;

use crate::config::QuizConfig;
use crate::domain::{MasteryRecord, Mode, SessionState};
use crate::generator::{generate_prompt, sentence_template, RandomSource};
use crate::ledger::ledger_key;
use crate::util::normalize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
  /// Right conjugation; round resolved with the answer shown.
  Correct,
  /// Wrong conjugation with strikes left; same prompt, nothing shown.
  Strike,
  /// Strike limit reached; answer shown.
  Revealed,
  /// Right conjugation that just mastered the item; bonus round begins.
  MasteryUnlocked,
  SentencePassed,
  SentenceMissed,
  /// Submission after the round was resolved; nothing changed.
  AlreadyResolved,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
  pub streak: u32,
  pub message: String,
  /// The presentation hides the notice after this delay.
  pub clear_after_ms: u64,
}

/// Ledger mutation produced by a transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerWrite {
  pub key: String,
  pub record: MasteryRecord,
}

#[derive(Clone, Debug)]
pub struct Outcome {
  pub state: SessionState,
  pub verdict: Verdict,
  pub correct: bool,
  /// Expected form, when this transition shows it.
  pub revealed: Option<&'static str>,
  pub feedback: String,
  pub ledger_write: Option<LedgerWrite>,
  pub milestone: Option<Milestone>,
}

/// Conjugation mode: exact match after normalization.
pub fn matches_conjugation(answer: &str, expected: &str) -> bool {
  normalize(answer) == normalize(expected)
}

/// Sentence mode: the normalized expected form must appear inside the
/// normalized answer.
pub fn contains_conjugation(answer: &str, expected: &str) -> bool {
  let expected = normalize(expected);
  !expected.is_empty() && normalize(answer).contains(&expected)
}

/// Evaluate one submission. `prior` is the ledger record for the current
/// prompt (zero record if never attempted).
pub fn submit_answer(
  state: &SessionState,
  prior: MasteryRecord,
  answer: &str,
  cfg: &QuizConfig,
  rng: &mut dyn RandomSource,
) -> Outcome {
  if state.resolved {
    return Outcome {
      state: state.clone(),
      verdict: Verdict::AlreadyResolved,
      correct: false,
      revealed: None,
      feedback: "Round finished. Press next for a new verb.".into(),
      ledger_write: None,
      milestone: None,
    };
  }
  match state.mode {
    Mode::Conjugation => submit_conjugation(state, prior, answer, cfg, rng),
    Mode::Sentence => submit_sentence(state, answer),
  }
}

fn submit_conjugation(
  state: &SessionState,
  prior: MasteryRecord,
  answer: &str,
  cfg: &QuizConfig,
  rng: &mut dyn RandomSource,
) -> Outcome {
  let expected = state.prompt.expected();
  let key = ledger_key(&state.prompt);
  let mut next = state.clone();

  if !matches_conjugation(answer, expected) {
    let strikes = state.strikes.saturating_add(1);
    if strikes < cfg.strike_limit {
      next.strikes = strikes;
      debug!(target: "quiz", %key, strikes, "Strike recorded");
      return Outcome {
        state: next,
        verdict: Verdict::Strike,
        correct: false,
        revealed: None,
        feedback: format!("⚠️ Strike {}! Try again.", strikes),
        ledger_write: None,
        milestone: None,
      };
    }

    let mut record = prior;
    record.record_failure();
    next.strikes = 0;
    next.streak = 0;
    next.resolved = true;
    debug!(target: "quiz", %key, total_attempts = record.total_attempts, "Strike limit reached; answer revealed");
    return Outcome {
      state: next,
      verdict: Verdict::Revealed,
      correct: false,
      revealed: Some(expected),
      feedback: format!("❌ Incorrecto. Correct answer: {}", expected),
      ledger_write: Some(LedgerWrite { key, record }),
      milestone: None,
    };
  }

  let mut record = prior;
  let newly_mastered = record.record_success(cfg.mastery_threshold);
  next.strikes = 0;
  next.score += 1;
  next.streak += 1;

  let milestone = (cfg.milestone_every > 0 && next.streak % cfg.milestone_every == 0).then(|| Milestone {
    streak: next.streak,
    message: format!("🔥 Streak: {}!", next.streak),
    clear_after_ms: cfg.milestone_clear_ms,
  });

  if newly_mastered {
    next.mode = Mode::Sentence;
    next.sentence_template = Some(sentence_template(state.prompt.pronoun, &cfg.contexts, rng));
    debug!(target: "quiz", %key, correct_count = record.correct_count, "Mastery unlocked; entering sentence mode");
    return Outcome {
      state: next,
      verdict: Verdict::MasteryUnlocked,
      correct: true,
      revealed: None,
      feedback: "🎉 Mastered! Fill in the blank:".into(),
      ledger_write: Some(LedgerWrite { key, record }),
      milestone,
    };
  }

  next.resolved = true;
  debug!(target: "quiz", %key, correct_count = record.correct_count, streak = next.streak, "Correct conjugation");
  Outcome {
    state: next,
    verdict: Verdict::Correct,
    correct: true,
    revealed: Some(expected),
    feedback: "✅ ¡Correcto!".into(),
    ledger_write: Some(LedgerWrite { key, record }),
    milestone,
  }
}

fn submit_sentence(state: &SessionState, answer: &str) -> Outcome {
  let expected = state.prompt.expected();
  let passed = contains_conjugation(answer, expected);
  let mut next = state.clone();
  next.resolved = true;
  if passed {
    next.score += 1;
  }
  debug!(target: "quiz", verb = state.prompt.verb.infinitive, passed, "Bonus round graded");
  Outcome {
    state: next,
    verdict: if passed { Verdict::SentencePassed } else { Verdict::SentenceMissed },
    correct: passed,
    revealed: Some(expected),
    feedback: if passed {
      "🧠 ¡Perfecto! You've used the verb correctly in context.".into()
    } else {
      format!("🧐 Not quite. The sentence needed \"{}\".", expected)
    },
    ledger_write: None,
    milestone: None,
  }
}

/// Move to a fresh prompt. Refused (`None`) until the round is resolved.
pub fn advance(state: &SessionState, rng: &mut dyn RandomSource) -> Option<SessionState> {
  if !state.resolved {
    return None;
  }
  Some(SessionState {
    prompt: generate_prompt(rng),
    strikes: 0,
    mode: Mode::Conjugation,
    streak: state.streak,
    score: state.score,
    resolved: false,
    sentence_template: None,
  })
}
