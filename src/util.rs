//! Small utility helpers used across modules.

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Grading form of a string: lowercase, diacritics dropped (NFD, combining
/// marks removed), anything but letters/digits/whitespace removed, trimmed.
///
/// "¡HABLÉ!" and "hable" both become "hable".
pub fn normalize(s: &str) -> String {
  let folded: String = s
    .to_lowercase()
    .nfd()
    .filter(|c| !is_combining_mark(*c))
    .filter(|c| c.is_alphanumeric() || c.is_whitespace())
    .collect();
  folded.trim().to_string()
}

/// Log-safe truncation for large strings.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  match s.char_indices().nth(max) {
    None => s.to_string(),
    Some((cut, _)) => format!("{}… ({} bytes total)", &s[..cut], s.len()),
  }
}
