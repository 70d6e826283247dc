//! Loading quiz configuration (rules, ledger location, sentence places) from TOML.
//!
//! Every field has a default, so an absent or partial file is fine.
//! `LEDGER_DIR` overrides `ledger_dir` after the file is read.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{error, info};

use crate::seeds::CONTEXTS;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct QuizConfig {
  /// Correct answers needed before an item counts as mastered.
  pub mastery_threshold: u32,
  /// Wrong answers allowed per prompt before the answer is revealed.
  pub strike_limit: u8,
  /// Streak interval for milestone notices; 0 disables them.
  pub milestone_every: u32,
  pub milestone_clear_ms: u64,
  /// Review listing marks items at or above this count as "learning".
  pub learning_threshold: u32,
  pub ledger_dir: PathBuf,
  pub ledger_slot: String,
  /// Fixed seed for prompt generation (replayable sessions).
  pub rng_seed: Option<u64>,
  /// Places used by the bonus-round template.
  pub contexts: Vec<String>,
  /// Sessions untouched for this long are dropped when a new one starts.
  pub session_idle_secs: u64,
}

impl Default for QuizConfig {
  fn default() -> Self {
    Self {
      mastery_threshold: 7,
      strike_limit: 2,
      milestone_every: 5,
      milestone_clear_ms: 3000,
      learning_threshold: 3,
      ledger_dir: PathBuf::from("./data"),
      ledger_slot: "spanishVerbGameProgress".into(),
      rng_seed: None,
      contexts: CONTEXTS.iter().map(|c| c.to_string()).collect(),
      session_idle_secs: 1800,
    }
  }
}

impl QuizConfig {
  /// Parse TOML and repair values the engine cannot work with.
  pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
    let cfg: QuizConfig = toml::from_str(s)?;
    Ok(cfg.sanitized())
  }

  fn sanitized(mut self) -> Self {
    self.strike_limit = self.strike_limit.max(1);
    self.mastery_threshold = self.mastery_threshold.max(1);
    self.contexts.retain(|c| !c.trim().is_empty());
    if self.contexts.is_empty() {
      self.contexts = QuizConfig::default().contexts;
    }
    self
  }
}

/// Load config from QUIZ_CONFIG_PATH (defaults on any IO/parse error), then
/// apply env overrides.
pub fn load_quiz_config_from_env() -> QuizConfig {
  let mut cfg = match std::env::var("QUIZ_CONFIG_PATH") {
    Ok(path) => match std::fs::read_to_string(&path) {
      Ok(s) => match QuizConfig::from_toml_str(&s) {
        Ok(cfg) => {
          info!(target: "conjuga_backend", %path, "Loaded quiz config (TOML)");
          cfg
        }
        Err(e) => {
          error!(target: "conjuga_backend", %path, error = %e, "Failed to parse TOML config; using defaults");
          QuizConfig::default()
        }
      },
      Err(e) => {
        error!(target: "conjuga_backend", %path, error = %e, "Failed to read TOML config file; using defaults");
        QuizConfig::default()
      }
    },
    Err(_) => QuizConfig::default(),
  };

  if let Ok(dir) = std::env::var("LEDGER_DIR") {
    if !dir.trim().is_empty() {
      cfg.ledger_dir = PathBuf::from(dir);
    }
  }
  cfg
}
