/*!

A `Substitution` holds the bindings accumulated during a match: variable name → captured value.
A dot-class variable captures a single expression; a sequence variable captures either an
ordered sequence (inside a non-commutative operation) or a multiset (inside a commutative one).

Binding a name twice requires the second value to be equivalent to the first. `Single` values
only equal `Single` values — a lone expression and the one-element sequence containing it are
distinct captures, made by wildcards of different classes. A `Sequence` and a `Multiset` are
equivalent iff they agree as multisets; when such a pair merges, the ordered form wins, since it
carries strictly more information.

*/

use std::{
  collections::HashMap,
  fmt::{Debug, Display, Formatter},
};

use crate::{
  abstractions::{join_string, IString, Multiset},
  api::expression::RcExpression,
};

#[derive(Clone, PartialEq, Eq)]
pub enum Binding {
  /// A single expression, captured by a fixed-size-one wildcard.
  Single(RcExpression),
  /// An ordered capture from a sequence wildcard in a non-commutative context.
  Sequence(Vec<RcExpression>),
  /// An unordered capture from a sequence wildcard under a commutative operator.
  Multiset(Multiset<RcExpression>),
}

impl Binding {
  /// Binding equivalence, as used by the consistency check.
  pub fn equivalent(&self, other: &Binding) -> bool {
    match (self, other) {
      (Binding::Single(left), Binding::Single(right)) => left == right,
      (Binding::Sequence(left), Binding::Sequence(right)) => left == right,
      (Binding::Multiset(left), Binding::Multiset(right)) => left == right,
      (Binding::Sequence(sequence), Binding::Multiset(multiset))
      | (Binding::Multiset(multiset), Binding::Sequence(sequence)) => {
        sequence.len() == multiset.len() && sequence.iter().cloned().collect::<Multiset<_>>() == *multiset
      }
      _ => false,
    }
  }
}

impl Display for Binding {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Binding::Single(expression) => write!(f, "{}", expression),
      Binding::Sequence(sequence) => write!(f, "({})", join_string(sequence.iter(), ", ")),
      Binding::Multiset(multiset) => write!(f, "{}", multiset),
    }
  }
}

impl Debug for Binding {
  fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
    Display::fmt(self, f)
  }
}

#[derive(Clone, PartialEq, Eq, Default)]
pub struct Substitution {
  bindings: HashMap<IString, Binding>,
}

impl Substitution {
  pub fn new() -> Self {
    Self::default()
  }

  #[inline(always)]
  pub fn len(&self) -> usize {
    self.bindings.len()
  }

  #[inline(always)]
  pub fn is_empty(&self) -> bool {
    self.bindings.is_empty()
  }

  #[inline(always)]
  pub fn contains(&self, name: &IString) -> bool {
    self.bindings.contains_key(name)
  }

  #[inline(always)]
  pub fn get(&self, name: &IString) -> Option<&Binding> {
    self.bindings.get(name)
  }

  /// Bind `name` to `value`. Returns `false` on a conflict with an existing, inequivalent
  /// binding; the substitution is unchanged in that case.
  pub fn try_add(&mut self, name: IString, value: Binding) -> bool {
    match self.bindings.get(&name) {
      None => {
        self.bindings.insert(name, value);
        true
      }
      Some(existing) if existing.equivalent(&value) => {
        // Keep the ordered form when an unordered capture meets an ordered one.
        if matches!(existing, Binding::Multiset(_)) && matches!(value, Binding::Sequence(_)) {
          self.bindings.insert(name, value);
        }
        true
      }
      Some(_) => false,
    }
  }

  /// The union of two consistent substitutions, `None` when any shared name binds inequivalent
  /// values.
  pub fn merged(&self, other: &Substitution) -> Option<Substitution> {
    let mut merged = self.clone();
    for (name, value) in &other.bindings {
      if !merged.try_add(name.clone(), value.clone()) {
        return None;
      }
    }
    Some(merged)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&IString, &Binding)> {
    self.bindings.iter()
  }

  pub fn names(&self) -> impl Iterator<Item = &IString> {
    self.bindings.keys()
  }
}

impl Display for Substitution {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let mut entries: Vec<_> = self.bindings.iter().collect();
    entries.sort_by(|(left, _), (right, _)| (&***left).cmp(&***right));
    let body = join_string(
      entries.into_iter().map(|(name, value)| format!("{} → {}", name, value)),
      ", ",
    );
    write!(f, "{{{}}}", body)
  }
}

impl Debug for Substitution {
  fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
    Display::fmt(self, f)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::test_fixtures::{a, b, name};

  #[test]
  fn rebinding_requires_equivalence() {
    let mut substitution = Substitution::new();
    assert!(substitution.try_add(name("x"), Binding::Single(a())));
    assert!(substitution.try_add(name("x"), Binding::Single(a())));
    assert!(!substitution.try_add(name("x"), Binding::Single(b())));
    assert_eq!(substitution.len(), 1);
  }

  #[test]
  fn single_is_not_a_one_element_sequence() {
    let mut substitution = Substitution::new();
    assert!(substitution.try_add(name("x"), Binding::Single(a())));
    assert!(!substitution.try_add(name("x"), Binding::Sequence(vec![a()])));
  }

  #[test]
  fn sequences_and_multisets_agree_as_multisets() {
    let ordered = Binding::Sequence(vec![a(), b()]);
    let unordered = Binding::Multiset([b(), a()].into_iter().collect());
    assert!(ordered.equivalent(&unordered));

    let mut substitution = Substitution::new();
    assert!(substitution.try_add(name("x"), unordered));
    assert!(substitution.try_add(name("x"), ordered.clone()));
    // The ordered form replaced the multiset.
    assert_eq!(substitution.get(&name("x")), Some(&ordered));
  }

  #[test]
  fn merge_is_consistent_union() {
    let mut left = Substitution::new();
    left.try_add(name("x"), Binding::Single(a()));
    let mut right = Substitution::new();
    right.try_add(name("y"), Binding::Single(b()));

    let merged = left.merged(&right).unwrap();
    assert_eq!(merged.len(), 2);

    let mut conflicting = Substitution::new();
    conflicting.try_add(name("x"), Binding::Single(b()));
    assert!(left.merged(&conflicting).is_none());
  }
}
