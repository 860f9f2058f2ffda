//! Ordered navigation over the challenge catalogue.
//!
//! Challenges keep their catalogue position ("original index") forever. The
//! traversal order groups them by level: the canonical levels first, in their
//! fixed order, then any other level sorted by name. Titles are sorted inside a
//! level with `collation::compare`; equal titles keep catalogue order.
//!
//! The current position survives reloads through a deep-link token
//! `challenge=<original index>`.

use std::collections::HashMap;

use serde::Serialize;

use crate::collation;
use crate::domain::Challenge;

/// Levels shown first, in this order, when present.
pub const LEVEL_ORDER: [&str; 3] = ["Beginner", "Intermediate", "Advanced"];

const DEEP_LINK_KEY: &str = "challenge=";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GroupEntry {
  pub index: usize,
  pub title: String,
}

/// One level run of the traversal order, as listed by the challenge selector.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LevelGroup {
  pub level: String,
  pub entries: Vec<GroupEntry>,
}

#[derive(Clone, Debug)]
pub struct NavigationIndex {
  groups: Vec<LevelGroup>,
  /// Original indices in traversal order.
  order: Vec<usize>,
  /// Inverse of `order`: original index -> logical position.
  positions: Vec<usize>,
  current: usize,
}

impl NavigationIndex {
  /// Builds the traversal order. Returns `None` for an empty catalogue.
  /// The current challenge starts at original index 0.
  pub fn build(challenges: &[Challenge]) -> Option<Self> {
    if challenges.is_empty() {
      return None;
    }

    let mut by_level: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, c) in challenges.iter().enumerate() {
      by_level.entry(c.level_label()).or_default().push(i);
    }

    let mut extra: Vec<&str> = by_level
      .keys()
      .copied()
      .filter(|l| !LEVEL_ORDER.contains(l))
      .collect();
    extra.sort_unstable();
    let levels: Vec<&str> = LEVEL_ORDER
      .iter()
      .copied()
      .filter(|l| by_level.contains_key(l))
      .chain(extra)
      .collect();

    let mut groups = Vec::with_capacity(levels.len());
    for level in levels {
      let mut members = by_level.remove(level).unwrap_or_default();
      // Stable: members are in catalogue order, so equal titles stay that way.
      members.sort_by(|&a, &b| collation::compare(&challenges[a].title, &challenges[b].title));
      groups.push(LevelGroup {
        level: level.to_string(),
        entries: members
          .into_iter()
          .map(|index| GroupEntry { index, title: challenges[index].title.clone() })
          .collect(),
      });
    }

    let order: Vec<usize> = groups.iter().flat_map(|g| g.entries.iter().map(|e| e.index)).collect();
    let mut positions = vec![usize::MAX; order.len()];
    for (logical, &original) in order.iter().enumerate() {
      positions[original] = logical;
    }
    debug_assert!(positions.iter().all(|&p| p != usize::MAX), "order must be a permutation");

    Some(Self { groups, order, positions, current: 0 })
  }

  pub fn len(&self) -> usize {
    self.order.len()
  }

  /// Original indices in traversal order.
  pub fn order(&self) -> &[usize] {
    &self.order
  }

  pub fn groups(&self) -> &[LevelGroup] {
    &self.groups
  }

  /// Original index of the challenge on display.
  pub fn current(&self) -> usize {
    self.current
  }

  /// Position of an original index in the traversal order.
  pub fn logical_position_of(&self, original: usize) -> Option<usize> {
    self.positions.get(original).copied()
  }

  pub fn current_logical(&self) -> Option<usize> {
    self.logical_position_of(self.current)
  }

  pub fn has_previous(&self) -> bool {
    matches!(self.current_logical(), Some(pos) if pos > 0)
  }

  pub fn has_next(&self) -> bool {
    matches!(self.current_logical(), Some(pos) if pos + 1 < self.order.len())
  }

  /// Steps back one entry. Returns false (and changes nothing) at the first entry.
  pub fn go_previous(&mut self) -> bool {
    match self.current_logical() {
      Some(pos) if pos > 0 => {
        self.current = self.order[pos - 1];
        true
      }
      _ => false,
    }
  }

  /// Steps forward one entry. Returns false (and changes nothing) at the last entry.
  pub fn go_next(&mut self) -> bool {
    match self.current_logical() {
      Some(pos) if pos + 1 < self.order.len() => {
        self.current = self.order[pos + 1];
        true
      }
      _ => false,
    }
  }

  /// Selects an original index directly. Out-of-range indices are ignored.
  pub fn jump_to(&mut self, original: usize) -> bool {
    if original >= self.order.len() {
      return false;
    }
    self.current = original;
    true
  }

  /// Token to write back after navigating, e.g. `challenge=3`.
  pub fn deep_link(&self) -> String {
    format!("{DEEP_LINK_KEY}{}", self.current)
  }
}

/// Resolves a deep-link token such as `#challenge=2` to an original index.
/// Anything absent, malformed or out of range resolves to 0.
pub fn resolve_deep_link(token: Option<&str>, challenge_count: usize) -> usize {
  token
    .and_then(parse_deep_link)
    .filter(|&i| i < challenge_count)
    .unwrap_or(0)
}

/// First `challenge=<digits>` in the token. Digit runs too large for `usize` become `usize::MAX`.
fn parse_deep_link(token: &str) -> Option<usize> {
  token.match_indices(DEEP_LINK_KEY).find_map(|(at, key)| {
    let rest = &token[at + key.len()..];
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    (digits > 0).then(|| rest[..digits].parse::<usize>().unwrap_or(usize::MAX))
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn challenge(title: &str, level: Option<&str>) -> Challenge {
    Challenge { title: title.into(), level: level.map(String::from), ..Default::default() }
  }

  fn titles(nav: &NavigationIndex, challenges: &[Challenge]) -> Vec<String> {
    nav.order().iter().map(|&i| challenges[i].title.clone()).collect()
  }

  fn sample() -> Vec<Challenge> {
    vec![
      challenge("Window functions", Some("Advanced")),
      challenge("Select columns", Some("Beginner")),
      challenge("Filter rows", Some("Beginner")),
      challenge("Group totals", Some("Intermediate")),
    ]
  }

  #[test]
  fn groups_follow_canonical_level_order() {
    let challenges = sample();
    let nav = NavigationIndex::build(&challenges).expect("index");
    assert_eq!(nav.order(), &[2, 1, 3, 0]);
    assert_eq!(
      titles(&nav, &challenges),
      vec!["Filter rows", "Select columns", "Group totals", "Window functions"]
    );
    let levels: Vec<&str> = nav.groups().iter().map(|g| g.level.as_str()).collect();
    assert_eq!(levels, vec!["Beginner", "Intermediate", "Advanced"]);
  }

  #[test]
  fn unknown_levels_come_last_sorted_by_name() {
    let challenges = vec![
      challenge("Recursive CTEs", Some("Expert")),
      challenge("Loose end", None),
      challenge("Basics", Some("Beginner")),
      challenge("Tuning", Some("Advanced")),
      challenge("Triggers", Some("Expert")),
      challenge("Archive", Some("Bonus")),
    ];
    let nav = NavigationIndex::build(&challenges).expect("index");
    let levels: Vec<&str> = nav.groups().iter().map(|g| g.level.as_str()).collect();
    assert_eq!(levels, vec!["Beginner", "Advanced", "Bonus", "Expert", "Unspecified"]);
    assert_eq!(nav.order(), &[2, 3, 5, 0, 4, 1]);
  }

  #[test]
  fn titles_use_collation_and_ties_keep_catalogue_order() {
    let challenges = vec![
      challenge("beta", Some("Beginner")),
      challenge("Alpha", Some("Beginner")),
      challenge("alpha", Some("Beginner")),
      challenge("beta", Some("Beginner")),
    ];
    let nav = NavigationIndex::build(&challenges).expect("index");
    assert_eq!(nav.order(), &[2, 1, 0, 3]);
  }

  #[test]
  fn order_is_a_permutation() {
    let challenges: Vec<Challenge> = (0..40)
      .map(|i| {
        let level = ["Beginner", "Advanced", "Expert", ""][i % 4];
        challenge(&format!("Challenge {}", (i * 7) % 13), Some(level))
      })
      .collect();
    let nav = NavigationIndex::build(&challenges).expect("index");
    let mut seen = nav.order().to_vec();
    seen.sort_unstable();
    assert_eq!(seen, (0..40).collect::<Vec<_>>());
    for (logical, &original) in nav.order().iter().enumerate() {
      assert_eq!(nav.logical_position_of(original), Some(logical));
    }
    assert_eq!(nav.logical_position_of(40), None);
  }

  #[test]
  fn empty_catalogue_has_no_index() {
    assert!(NavigationIndex::build(&[]).is_none());
  }

  #[test]
  fn previous_and_next_stop_at_the_boundaries() {
    let challenges = sample();
    let mut nav = NavigationIndex::build(&challenges).expect("index");

    assert!(nav.jump_to(2));
    assert_eq!(nav.current_logical(), Some(0));
    assert!(!nav.has_previous());
    assert!(!nav.go_previous());
    assert_eq!(nav.current(), 2);

    assert!(nav.go_next());
    assert_eq!(nav.current(), 1);
    assert!(nav.go_next());
    assert!(nav.go_next());
    assert_eq!(nav.current(), 0);
    assert!(!nav.has_next());
    assert!(!nav.go_next());
    assert_eq!(nav.current(), 0);

    assert!(nav.go_previous());
    assert_eq!(nav.current(), 3);
  }

  #[test]
  fn jump_ignores_out_of_range() {
    let mut nav = NavigationIndex::build(&sample()).expect("index");
    assert!(nav.jump_to(3));
    assert!(!nav.jump_to(4));
    assert_eq!(nav.current(), 3);
    assert_eq!(nav.deep_link(), "challenge=3");
  }

  #[test]
  fn deep_link_resolution() {
    assert_eq!(resolve_deep_link(Some("challenge=2"), 5), 2);
    assert_eq!(resolve_deep_link(Some("#challenge=4"), 5), 4);
    assert_eq!(resolve_deep_link(Some("challenge=99"), 5), 0);
    assert_eq!(resolve_deep_link(Some("challenge=5"), 5), 0);
    assert_eq!(resolve_deep_link(None, 5), 0);
    assert_eq!(resolve_deep_link(Some("challenge=x"), 5), 0);
    assert_eq!(resolve_deep_link(Some("challenge=-1"), 5), 0);
    assert_eq!(resolve_deep_link(Some("challenge=abc&challenge=3"), 5), 3);
    assert_eq!(resolve_deep_link(Some("challenge=99999999999999999999999"), 5), 0);
  }

  #[test]
  fn starts_from_deep_link() {
    let challenges = sample();
    let mut nav = NavigationIndex::build(&challenges).expect("index");
    assert!(nav.jump_to(resolve_deep_link(Some("challenge=3"), challenges.len())));
    assert_eq!(nav.current(), 3);
    assert_eq!(nav.current_logical(), Some(2));
    assert!(nav.jump_to(resolve_deep_link(Some("challenge=12"), challenges.len())));
    assert_eq!(nav.current(), 0);
  }
}
