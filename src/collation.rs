//! Locale-style string ordering for challenge titles.
//!
//! Comparison runs in levels, like a dictionary:
//!   1. base letters, case and accents ignored (whitespace < punctuation < digits < letters)
//!   2. accents ("e" before "é")
//!   3. case (lowercase first)
//!   4. raw text, so that the order is total
//!
//! Only the Latin-1 accented letters are folded; other scripts compare by lowercase code point.

use std::cmp::Ordering;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum CharClass {
  Whitespace,
  Symbol,
  Digit,
  Letter,
}

#[derive(Clone, Copy, Debug)]
struct Element {
  primary: (CharClass, char),
  accent: u8,
  upper: bool,
}

/// Splits an accented Latin-1 letter into its base letter and an accent rank.
fn fold_accent(c: char) -> (char, u8) {
  match c {
    'á' => ('a', 1), 'à' => ('a', 2), 'â' => ('a', 3), 'ä' => ('a', 4), 'ã' => ('a', 5), 'å' => ('a', 6),
    'é' => ('e', 1), 'è' => ('e', 2), 'ê' => ('e', 3), 'ë' => ('e', 4),
    'í' => ('i', 1), 'ì' => ('i', 2), 'î' => ('i', 3), 'ï' => ('i', 4),
    'ó' => ('o', 1), 'ò' => ('o', 2), 'ô' => ('o', 3), 'ö' => ('o', 4), 'õ' => ('o', 5), 'ø' => ('o', 7),
    'ú' => ('u', 1), 'ù' => ('u', 2), 'û' => ('u', 3), 'ü' => ('u', 4),
    'ý' => ('y', 1), 'ÿ' => ('y', 4),
    'ñ' => ('n', 5),
    'ç' => ('c', 8),
    other => (other, 0),
  }
}

fn element(c: char) -> Element {
  let lower = c.to_lowercase().next().unwrap_or(c);
  let (base, accent) = fold_accent(lower);
  let class = if c.is_whitespace() {
    CharClass::Whitespace
  } else if c.is_numeric() {
    CharClass::Digit
  } else if c.is_alphabetic() {
    CharClass::Letter
  } else {
    CharClass::Symbol
  };
  Element { primary: (class, base), accent, upper: c.is_uppercase() }
}

fn elements(s: &str) -> impl Iterator<Item = Element> + '_ {
  s.chars().map(element)
}

/// Total order over strings that reads like a dictionary rather than a byte dump.
pub fn compare(a: &str, b: &str) -> Ordering {
  elements(a)
    .map(|e| e.primary)
    .cmp(elements(b).map(|e| e.primary))
    .then_with(|| elements(a).map(|e| e.accent).cmp(elements(b).map(|e| e.accent)))
    .then_with(|| elements(a).map(|e| e.upper).cmp(elements(b).map(|e| e.upper)))
    .then_with(|| a.cmp(b))
}
