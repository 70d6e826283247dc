//! Built-in content: the verb catalog and the places used by bonus-round
//! sentence templates.

use crate::domain::{Verb, VerbClass};

/// The fixed catalog. Rows follow `Tense::ALL`, columns follow `Pronoun::ALL`.
pub static VERBS: [Verb; 3] = [
  Verb {
    infinitive: "hablar",
    class: VerbClass::Ar,
    conjugations: [
      ["hablo", "hablas", "habla", "hablamos", "habláis", "hablan"],
      ["hablé", "hablaste", "habló", "hablamos", "hablasteis", "hablaron"],
      ["hablaba", "hablabas", "hablaba", "hablábamos", "hablabais", "hablaban"],
      ["hablaré", "hablarás", "hablará", "hablaremos", "hablaréis", "hablarán"],
    ],
  },
  Verb {
    infinitive: "comer",
    class: VerbClass::Er,
    conjugations: [
      ["como", "comes", "come", "comemos", "coméis", "comen"],
      ["comí", "comiste", "comió", "comimos", "comisteis", "comieron"],
      ["comía", "comías", "comía", "comíamos", "comíais", "comían"],
      ["comeré", "comerás", "comerá", "comeremos", "comeréis", "comerán"],
    ],
  },
  Verb {
    infinitive: "vivir",
    class: VerbClass::Ir,
    conjugations: [
      ["vivo", "vives", "vive", "vivimos", "vivís", "viven"],
      ["viví", "viviste", "vivió", "vivimos", "vivisteis", "vivieron"],
      ["vivía", "vivías", "vivía", "vivíamos", "vivíais", "vivían"],
      ["viviré", "vivirás", "vivirá", "viviremos", "viviréis", "vivirán"],
    ],
  },
];

/// Places for the "<Pronoun> ____ en <place>." fill-in template.
pub const CONTEXTS: [&str; 10] = [
  "el parque",
  "la escuela",
  "la casa",
  "el restaurante",
  "la tienda",
  "la biblioteca",
  "el cine",
  "el trabajo",
  "la cafetería",
  "el aeropuerto",
];

pub fn verb_by_infinitive(infinitive: &str) -> Option<&'static Verb> {
  VERBS.iter().find(|v| v.infinitive == infinitive)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn catalog_holds_72_forms() {
    let forms: usize = VERBS
      .iter()
      .map(|v| v.conjugations.iter().map(|row| row.len()).sum::<usize>())
      .sum();
    assert_eq!(forms, 72);
  }

  #[test]
  fn lookup_by_infinitive() {
    assert_eq!(verb_by_infinitive("vivir").map(|v| v.class), Some(VerbClass::Ir));
    assert!(verb_by_infinitive("ser").is_none());
  }
}
