//! SQL token classifier used to highlight answer steps.
//!
//! The scanner walks the input once. At every cursor each matcher reports its
//! earliest match at or after the cursor; the earliest start wins and ties go to
//! the matcher declared first (keyword, string, function, comment, operator).
//! Whatever lies between matches is emitted as plain text, so joining the span
//! texts always gives back the input.
//!
//! This is lexical only: no grammar, no validation.
//!
//! A `'` without a closing quote is not a string literal. It stays plain text and
//! scanning carries on after it.

use serde::Serialize;

const KEYWORDS: &[&str] = &[
  "SELECT", "FROM", "WHERE", "JOIN", "ON", "AS", "GROUP BY", "ORDER BY", "INSERT INTO", "VALUES",
  "UPDATE", "SET", "DELETE",
];

const FUNCTIONS: &[&str] = &["SUM", "COUNT", "AVG", "MIN", "MAX"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
  Keyword,
  StringLiteral,
  Function,
  Comment,
  Operator,
  PlainText,
}

impl TokenKind {
  /// Class name the front end styles the span with. Plain text is left unstyled.
  pub fn css_class(self) -> Option<&'static str> {
    match self {
      TokenKind::Keyword => Some("sql-keyword"),
      TokenKind::StringLiteral => Some("sql-string"),
      TokenKind::Function => Some("sql-function"),
      TokenKind::Comment => Some("sql-comment"),
      TokenKind::Operator => Some("sql-operator"),
      TokenKind::PlainText => None,
    }
  }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TokenSpan {
  pub kind: TokenKind,
  pub text: String,
}

impl TokenSpan {
  fn new(kind: TokenKind, text: &str) -> Self {
    Self { kind, text: text.to_string() }
  }
}

/// Matchers in priority order.
#[derive(Clone, Copy, Debug)]
enum Matcher {
  Keyword,
  StringLiteral,
  Function,
  Comment,
  Operator,
}

const MATCHERS: [Matcher; 5] = [
  Matcher::Keyword,
  Matcher::StringLiteral,
  Matcher::Function,
  Matcher::Comment,
  Matcher::Operator,
];

impl Matcher {
  fn kind(self) -> TokenKind {
    match self {
      Matcher::Keyword => TokenKind::Keyword,
      Matcher::StringLiteral => TokenKind::StringLiteral,
      Matcher::Function => TokenKind::Function,
      Matcher::Comment => TokenKind::Comment,
      Matcher::Operator => TokenKind::Operator,
    }
  }

  /// Earliest match starting at or after `from`, as a `start..end` byte range.
  fn find(self, src: &[u8], from: usize) -> Option<(usize, usize)> {
    match self {
      Matcher::Keyword => find_word(src, from, KEYWORDS),
      Matcher::Function => find_word(src, from, FUNCTIONS),
      Matcher::StringLiteral => {
        let open = from + src[from..].iter().position(|&b| b == b'\'')?;
        let close = open + 1 + src[open + 1..].iter().position(|&b| b == b'\'')?;
        Some((open, close + 1))
      }
      Matcher::Comment => {
        let start = from + src[from..].windows(2).position(|w| w == b"--")?;
        let end = src[start..]
          .iter()
          .position(|&b| b == b'\n')
          .map_or(src.len(), |n| start + n);
        Some((start, end))
      }
      Matcher::Operator => {
        let start = from + src[from..].iter().position(|&b| is_operator(b))?;
        let len = src[start..].iter().take_while(|&&b| is_operator(b)).count();
        Some((start, start + len))
      }
    }
  }
}

fn is_operator(b: u8) -> bool {
  matches!(b, b'=' | b'>' | b'<')
}

fn is_word(b: u8) -> bool {
  b.is_ascii_alphanumeric() || b == b'_'
}

/// Case-insensitive whole-word search over a vocabulary. The first vocabulary entry that
/// fits at a position wins.
fn find_word(src: &[u8], from: usize, vocabulary: &[&str]) -> Option<(usize, usize)> {
  (from..src.len())
    .filter(|&p| src[p].is_ascii_alphabetic() && (p == 0 || !is_word(src[p - 1])))
    .find_map(|p| {
      vocabulary.iter().find_map(|w| {
        let end = p + w.len();
        let fits = end <= src.len()
          && src[p..end].eq_ignore_ascii_case(w.as_bytes())
          && (end == src.len() || !is_word(src[end]));
        fits.then_some((p, end))
      })
    })
}

/// Splits `sql` into typed spans. Never fails; see the module docs for the rules.
pub fn classify(sql: &str) -> Vec<TokenSpan> {
  let src = sql.as_bytes();
  let mut spans = Vec::new();
  // Per matcher: None = must (re)scan, Some(None) = no further match anywhere.
  let mut next: [Option<Option<(usize, usize)>>; MATCHERS.len()] = [None; MATCHERS.len()];
  let mut cursor = 0;

  while cursor < src.len() {
    let mut best: Option<(usize, usize, Matcher)> = None;
    for (slot, matcher) in next.iter_mut().zip(MATCHERS) {
      let stale = match slot {
        None => true,
        Some(Some((start, _))) => *start < cursor,
        Some(None) => false,
      };
      if stale {
        *slot = Some(matcher.find(src, cursor));
      }
      if let Some(Some((start, end))) = *slot {
        if best.map_or(true, |(best_start, _, _)| start < best_start) {
          best = Some((start, end, matcher));
        }
      }
    }

    let Some((start, end, matcher)) = best else { break };
    if start > cursor {
      spans.push(TokenSpan::new(TokenKind::PlainText, &sql[cursor..start]));
    }
    spans.push(TokenSpan::new(matcher.kind(), &sql[start..end]));
    cursor = end;
  }

  if cursor < src.len() {
    spans.push(TokenSpan::new(TokenKind::PlainText, &sql[cursor..]));
  }
  spans
}
