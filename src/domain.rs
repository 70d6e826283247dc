//! Domain models used by the quiz engine: verbs, tenses, pronouns, prompts,
//! mastery records and the per-session state.

use serde::{Deserialize, Serialize};

/// Conjugation family of a regular verb.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerbClass {
  Ar,
  Er,
  Ir,
}

/// Tenses covered by the catalog. The declaration order is the index into
/// `Verb::conjugations`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tense {
  Presente,
  Preterito,
  Imperfecto,
  Futuro,
}

impl Tense {
  pub const ALL: [Tense; 4] = [Tense::Presente, Tense::Preterito, Tense::Imperfecto, Tense::Futuro];

  pub fn index(self) -> usize {
    self as usize
  }

  /// Display name, also used inside ledger keys.
  pub fn name(self) -> &'static str {
    match self {
      Tense::Presente => "Presente",
      Tense::Preterito => "Pretérito",
      Tense::Imperfecto => "Imperfecto",
      Tense::Futuro => "Futuro",
    }
  }
}

/// The six pronoun slots, in the order the form tables use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pronoun {
  Yo,
  Tu,
  El,
  Nosotros,
  Vosotros,
  Ellos,
}

impl Pronoun {
  pub const ALL: [Pronoun; 6] = [
    Pronoun::Yo,
    Pronoun::Tu,
    Pronoun::El,
    Pronoun::Nosotros,
    Pronoun::Vosotros,
    Pronoun::Ellos,
  ];

  pub fn index(self) -> usize {
    self as usize
  }

  pub fn label(self) -> &'static str {
    match self {
      Pronoun::Yo => "yo",
      Pronoun::Tu => "tú",
      Pronoun::El => "él/ella/usted",
      Pronoun::Nosotros => "nosotros/as",
      Pronoun::Vosotros => "vosotros/as",
      Pronoun::Ellos => "ellos/ellas/ustedes",
    }
  }
}

/// Immutable catalog entry. `conjugations[tense.index()][pronoun.index()]`
/// is the canonical form for that slot.
#[derive(Debug, PartialEq, Eq)]
pub struct Verb {
  pub infinitive: &'static str,
  pub class: VerbClass,
  pub conjugations: [[&'static str; 6]; 4],
}

impl Verb {
  pub fn tenses(&self) -> &'static [Tense] {
    &Tense::ALL
  }

  pub fn form(&self, tense: Tense, pronoun: Pronoun) -> &'static str {
    self.conjugations[tense.index()][pronoun.index()]
  }
}

/// One round of the quiz. Fully determines the expected answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Prompt {
  pub verb: &'static Verb,
  pub tense: Tense,
  pub pronoun: Pronoun,
}

impl Prompt {
  pub fn expected(&self) -> &'static str {
    self.verb.form(self.tense, self.pronoun)
  }
}

/// Quiz mode of the current prompt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
  #[default]
  Conjugation,
  /// Bonus round unlocked by a fresh mastery.
  Sentence,
}

/// Per-item progress persisted in the ledger slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryRecord {
  pub correct_count: u32,
  pub total_attempts: u32,
  pub mastered: bool,
}

impl MasteryRecord {
  /// Count a correct answer. Returns true only when this answer flips the
  /// record from not-mastered to mastered.
  pub fn record_success(&mut self, threshold: u32) -> bool {
    let was_mastered = self.mastered;
    self.correct_count = self.correct_count.saturating_add(1);
    self.total_attempts = self.total_attempts.saturating_add(1);
    self.mastered = self.correct_count >= threshold;
    self.mastered && !was_mastered
  }

  /// Count a failed round (two strikes). Mastery is revoked.
  pub fn record_failure(&mut self) {
    self.total_attempts = self.total_attempts.saturating_add(1);
    self.mastered = false;
  }
}

/// State of one quiz session, threaded through `logic::submit_answer` and
/// `logic::advance`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionState {
  pub prompt: Prompt,
  pub strikes: u8,
  pub mode: Mode,
  pub streak: u32,
  pub score: u32,
  /// Answer shown; only `advance` moves the session on.
  pub resolved: bool,
  /// Fill-in template presented while in `Mode::Sentence`.
  pub sentence_template: Option<String>,
}

impl SessionState {
  pub fn new(prompt: Prompt) -> Self {
    Self {
      prompt,
      strikes: 0,
      mode: Mode::Conjugation,
      streak: 0,
      score: 0,
      resolved: false,
      sentence_template: None,
    }
  }
}
