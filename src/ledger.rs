//! Mastery ledger: per `(verb, tense, pronoun)` progress, serialized as one
//! JSON object into a single storage slot.
//!
//! Keys are `verb-tense-pronoun` (e.g. `comer-Pretérito-tú`). Records are kept
//! in a `BTreeMap` so encoding is deterministic: decode-then-encode of a value
//! this module wrote is byte-identical.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::domain::{MasteryRecord, Prompt};
use crate::storage::StorageError;
use crate::util::trunc_for_log;

/// Ledger key for a prompt.
pub fn ledger_key(prompt: &Prompt) -> String {
  format!("{}-{}-{}", prompt.verb.infinitive, prompt.tense.name(), prompt.pronoun.label())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
  Mastered,
  Learning,
  NeedsWork,
}

/// One line of the verb review listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewEntry {
  pub key: String,
  pub verb: String,
  pub tense: String,
  pub pronoun: String,
  pub status: ReviewStatus,
  pub correct_count: u32,
  pub total_attempts: u32,
  /// Correct answers needed for mastery, shown as `correct_count/threshold`.
  pub threshold: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MasteryLedger {
  records: BTreeMap<String, MasteryRecord>,
}

impl MasteryLedger {
  /// Build from the raw slot. Absent or unparseable slots give an empty ledger.
  pub fn decode(raw: Option<&str>) -> Self {
    let Some(raw) = raw else {
      return Self::default();
    };
    match serde_json::from_str::<BTreeMap<String, MasteryRecord>>(raw) {
      Ok(records) => Self { records },
      Err(e) => {
        warn!(target: "quiz", error = %e, raw = %trunc_for_log(raw, 80), "Unreadable ledger slot; starting empty");
        Self::default()
      }
    }
  }

  pub fn encode(&self) -> Result<String, StorageError> {
    Ok(serde_json::to_string(&self.records)?)
  }

  /// Record for `key`, or the zero record if the key was never attempted.
  pub fn get(&self, key: &str) -> MasteryRecord {
    self.records.get(key).copied().unwrap_or_default()
  }

  pub fn put(&mut self, key: impl Into<String>, record: MasteryRecord) {
    self.records.insert(key.into(), record);
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn mastered_count(&self) -> usize {
    self.records.values().filter(|r| r.mastered).count()
  }

  /// Every attempted item, sorted by key.
  pub fn review(&self, threshold: u32, learning_threshold: u32) -> Vec<ReviewEntry> {
    self
      .records
      .iter()
      .map(|(key, r)| {
        let mut parts = key.splitn(3, '-');
        let verb = parts.next().unwrap_or_default().to_string();
        let tense = parts.next().unwrap_or_default().to_string();
        let pronoun = parts.next().unwrap_or_default().to_string();
        let status = if r.mastered {
          ReviewStatus::Mastered
        } else if r.correct_count >= learning_threshold {
          ReviewStatus::Learning
        } else {
          ReviewStatus::NeedsWork
        };
        ReviewEntry {
          key: key.clone(),
          verb,
          tense,
          pronoun,
          status,
          correct_count: r.correct_count,
          total_attempts: r.total_attempts,
          threshold,
        }
      })
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{Pronoun, Tense};
  use crate::seeds::verb_by_infinitive;

  fn rec(c: u32, t: u32, m: bool) -> MasteryRecord {
    MasteryRecord { correct_count: c, total_attempts: t, mastered: m }
  }

  #[test]
  fn key_joins_verb_tense_pronoun() {
    let p = Prompt {
      verb: verb_by_infinitive("comer").expect("comer"),
      tense: Tense::Preterito,
      pronoun: Pronoun::Tu,
    };
    assert_eq!(ledger_key(&p), "comer-Pretérito-tú");
  }

  #[test]
  fn absent_or_corrupt_slot_is_empty() {
    assert_eq!(MasteryLedger::decode(None).len(), 0);
    assert_eq!(MasteryLedger::decode(Some("{not json")).len(), 0);
    assert_eq!(MasteryLedger::decode(Some("[1,2,3]")).len(), 0);
  }

  #[test]
  fn missing_key_reads_as_zero_record() {
    let ledger = MasteryLedger::default();
    assert_eq!(ledger.get("hablar-Presente-yo"), rec(0, 0, false));
  }

  #[test]
  fn decodes_camel_case_slot() {
    let raw = r#"{"vivir-Futuro-yo":{"correctCount":7,"totalAttempts":9,"mastered":true}}"#;
    let ledger = MasteryLedger::decode(Some(raw));
    assert_eq!(ledger.get("vivir-Futuro-yo"), rec(7, 9, true));
    assert_eq!(ledger.mastered_count(), 1);
  }

  #[test]
  fn replay_is_byte_identical() {
    let mut ledger = MasteryLedger::default();
    ledger.put("vivir-Presente-nosotros/as", rec(2, 3, false));
    ledger.put("comer-Pretérito-tú", rec(7, 7, true));
    ledger.put("hablar-Presente-yo", rec(1, 1, false));
    let saved = ledger.encode().expect("encode");

    let reloaded = MasteryLedger::decode(Some(&saved));
    assert_eq!(reloaded, ledger);
    assert_eq!(reloaded.encode().expect("encode"), saved);
  }

  #[test]
  fn review_lists_status_per_key() {
    let mut ledger = MasteryLedger::default();
    ledger.put("hablar-Presente-yo", rec(1, 4, false));
    ledger.put("comer-Pretérito-tú", rec(7, 8, true));
    ledger.put("vivir-Futuro-él/ella/usted", rec(3, 3, false));

    let review = ledger.review(7, 3);
    let got: Vec<(&str, ReviewStatus)> = review.iter().map(|e| (e.key.as_str(), e.status)).collect();
    assert_eq!(
      got,
      vec![
        ("comer-Pretérito-tú", ReviewStatus::Mastered),
        ("hablar-Presente-yo", ReviewStatus::NeedsWork),
        ("vivir-Futuro-él/ella/usted", ReviewStatus::Learning),
      ]
    );
    let vivir = &review[2];
    assert_eq!((vivir.verb.as_str(), vivir.tense.as_str(), vivir.pronoun.as_str()), ("vivir", "Futuro", "él/ella/usted"));
    assert_eq!(vivir.threshold, 7);
  }
}
