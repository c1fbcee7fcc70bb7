/*!

Constraints are opaque boolean predicates over substitutions. A pattern node may carry one; a
branch of the match survives only if every constraint it passes through accepts the accumulated
substitution.

Each constraint declares the set of variable names it inspects. That set is authoritative: the
matchers use it to run the constraint as early as possible, and they never invoke a constraint
before all of its named variables are bound. Predicates are assumed total; a panic from one
propagates to the caller unchanged.

Constraint values are shared through `RcConstraint` handles and compared by handle identity.
The exception is `MultiConstraint`, the conjunction combinator, which compares by member set so
that independently-built conjunctions of the same members are equal.

*/

use std::rc::Rc;

use crate::{
  abstractions::{IString, Set},
  api::substitution::Substitution,
};

pub trait Constraint {
  /// Decide the predicate under the given substitution.
  fn check(&self, substitution: &Substitution) -> bool;

  /// The set of variable names the predicate inspects. Must be complete: the matchers schedule
  /// evaluation from this set alone.
  fn variables(&self) -> Set<IString> {
    Set::new()
  }

  /// Downcast hook for the conjunction combinator.
  fn as_multi(&self) -> Option<&MultiConstraint> {
    None
  }
}

pub type RcConstraint = Rc<dyn Constraint>;

/// The conjunction of its member constraints; its variable set is the union of theirs.
pub struct MultiConstraint {
  members: Vec<RcConstraint>,
}

impl MultiConstraint {
  /// Build the conjunction of `constraints`. Nested multi-constraints are flattened and
  /// members are de-duplicated by handle identity. An empty conjunction is `None` and a
  /// singleton conjunction is the member itself.
  pub fn create(constraints: impl IntoIterator<Item = RcConstraint>) -> Option<RcConstraint> {
    let mut members: Vec<RcConstraint> = Vec::new();
    for constraint in constraints {
      let nested = constraint.as_multi().map(|multi| multi.members.clone());
      match nested {
        Some(inner) => {
          for member in inner {
            push_unique(&mut members, member);
          }
        }
        None => push_unique(&mut members, constraint),
      }
    }

    match members.len() {
      0 => None,
      1 => members.pop(),
      _ => Some(Rc::new(MultiConstraint { members })),
    }
  }

  pub fn members(&self) -> &[RcConstraint] {
    &self.members
  }
}

impl Constraint for MultiConstraint {
  fn check(&self, substitution: &Substitution) -> bool {
    self.members.iter().all(|member| member.check(substitution))
  }

  fn variables(&self) -> Set<IString> {
    let mut variables = Set::new();
    for member in &self.members {
      variables.extend(member.variables());
    }
    variables
  }

  fn as_multi(&self) -> Option<&MultiConstraint> {
    Some(self)
  }
}

fn push_unique(members: &mut Vec<RcConstraint>, constraint: RcConstraint) {
  if !members.iter().any(|member| Rc::ptr_eq(member, &constraint)) {
    members.push(constraint);
  }
}

/// Handle equality: pointer identity, or member-set equality between two multi-constraints.
pub(crate) fn constraint_eq(left: &RcConstraint, right: &RcConstraint) -> bool {
  if Rc::ptr_eq(left, right) {
    return true;
  }
  match (left.as_multi(), right.as_multi()) {
    (Some(a), Some(b)) => {
      // Members are flat and unique, so set equality is containment plus equal length.
      a.members.len() == b.members.len()
        && a.members.iter().all(|member| b.members.iter().any(|other| Rc::ptr_eq(member, other)))
    }
    _ => false,
  }
}

pub(crate) fn constraints_eq(left: &Option<RcConstraint>, right: &Option<RcConstraint>) -> bool {
  match (left, right) {
    (None, None) => true,
    (Some(a), Some(b)) => constraint_eq(a, b),
    _ => false,
  }
}

/// Merge two optional constraints into at most one, conjoining when both are present.
pub(crate) fn merge_constraints(left: Option<RcConstraint>, right: Option<RcConstraint>) -> Option<RcConstraint> {
  match (left, right) {
    (None, None) => None,
    (Some(c), None) | (None, Some(c)) => Some(c),
    (Some(a), Some(b)) => MultiConstraint::create([a, b]),
  }
}

/// True when all of `constraint`'s variables are bound in `substitution`.
pub(crate) fn is_ready(constraint: &RcConstraint, substitution: &Substitution) -> bool {
  constraint.variables().iter().all(|name| substitution.contains(name))
}

/// Evaluate an optional constraint if it is ready; an unevaluable constraint does not veto.
pub(crate) fn passes(constraint: &Option<RcConstraint>, substitution: &Substitution) -> bool {
  match constraint {
    None => true,
    Some(constraint) => !is_ready(constraint, substitution) || constraint.check(substitution),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::test_fixtures::accepting;

  #[test]
  fn create_collapses_trivial_conjunctions() {
    assert!(MultiConstraint::create([]).is_none());

    let lone = accepting();
    let combined = MultiConstraint::create([lone.clone()]).unwrap();
    assert!(Rc::ptr_eq(&lone, &combined));
  }

  #[test]
  fn create_flattens_and_deduplicates() {
    let first = accepting();
    let second = accepting();

    let nested = MultiConstraint::create([first.clone(), second.clone()]).unwrap();
    let flattened = MultiConstraint::create([nested.clone(), first.clone()]).unwrap();

    let multi = flattened.as_multi().unwrap();
    assert_eq!(multi.members().len(), 2);
  }

  #[test]
  fn conjunctions_compare_by_member_set() {
    let first = accepting();
    let second = accepting();

    let forward = MultiConstraint::create([first.clone(), second.clone()]).unwrap();
    let backward = MultiConstraint::create([second.clone(), first.clone()]).unwrap();
    assert!(constraint_eq(&forward, &backward));
    assert!(!constraint_eq(&forward, &first));
  }

  #[test]
  fn conjunction_checks_all_members() {
    use crate::api::substitution::Substitution;
    use crate::api::test_fixtures::rejecting;

    let substitution = Substitution::new();
    let all = MultiConstraint::create([accepting(), accepting()]).unwrap();
    assert!(all.check(&substitution));

    let vetoed = MultiConstraint::create([accepting(), rejecting()]).unwrap();
    assert!(!vetoed.check(&substitution));
  }
}
