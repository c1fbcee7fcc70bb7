/*!

The commutative matcher: a multiset of pattern operands against a multiset of subject operands,
under a commutative (possibly also associative) operator.

The match proceeds in phases, each consuming part of the subject residual:

1. Constant patterns must be literally present with at least their multiplicity and are removed
   by counted subtraction.
2. Patterns spanning exactly one subject — composite subpatterns, symbol wildcards, and
   dot-class wildcards when the operator is not associative — are paired with subjects by
   recursive bipartite assignment, trying the pattern with the fewest candidates first.
3. Anonymous fixed multi-length wildcards select a sub-multiset of their size. (The named form
   is the documented unsupported shape; the entry points reject it before matching starts, and
   a defensive guard here keeps the answer sound if it ever slips through.)
4. Sequence slots — star/plus wildcards, and dot-class wildcards when the operator is
   associative — split the rest by multiset-partition enumeration. Star/plus variables bind
   their part as a multiset; an associative dot variable binds the element itself or the
   operator-wrapped part.

Substitutions merge fail-fast across phases, and every enumeration is lazy.

*/

use std::rc::Rc;

use crate::{
  abstractions::{IString, Multiset},
  api::{
    constraint::{merge_constraints, passes, RcConstraint},
    expression::{Expression, RcExpression},
    matching::{no_matches, one_match, one_to_one::match_expression, MatchIterator},
    operator::Operator,
    substitution::{Binding, Substitution},
  },
  core::compositions::{multiset_partitions, multiset_selections},
  warning,
};

/// A phase-4 slot: a sequence wildcard, or a dot-class wildcard flexed by associativity.
struct SequenceSlot {
  name:       Option<IString>,
  min:        usize,
  /// A dot-class capture: bind the lone element, or the operator-wrapped part.
  wrap:       bool,
  constraint: Option<RcConstraint>,
}

/// The pattern multiset partitioned into phases.
struct Phases {
  constants:  Vec<RcExpression>,
  singles:    Vec<RcExpression>,
  selections: Vec<(usize, Option<RcConstraint>)>,
  sequences:  Vec<SequenceSlot>,
}

fn partition_patterns(patterns: &[RcExpression], associative: bool) -> Option<Phases> {
  let mut phases = Phases {
    constants:  Vec::new(),
    singles:    Vec::new(),
    selections: Vec::new(),
    sequences:  Vec::new(),
  };

  for pattern in patterns {
    if pattern.is_constant() {
      phases.constants.push(pattern.clone());
      continue;
    }

    match &**pattern {
      Expression::Wildcard(wildcard) => {
        let dot_class = wildcard.fixed_size && wildcard.min_count == 1;
        if dot_class && !associative {
          phases.singles.push(pattern.clone());
        } else if wildcard.fixed_size && !dot_class {
          phases.selections.push((wildcard.min_count, wildcard.constraint.clone()));
        } else {
          phases.sequences.push(SequenceSlot {
            name:       None,
            min:        wildcard.min_count,
            wrap:       dot_class,
            constraint: wildcard.constraint.clone(),
          });
        }
      }

      Expression::Variable(variable) => match &*variable.inner {
        Expression::Wildcard(wildcard) => {
          let dot_class = wildcard.fixed_size && wildcard.min_count == 1;
          if dot_class && !associative {
            phases.singles.push(pattern.clone());
          } else if wildcard.fixed_size && !dot_class {
            // The unsupported shape; the entry points reject it up front.
            return None;
          } else {
            phases.sequences.push(SequenceSlot {
              name:       Some(variable.name.clone()),
              min:        wildcard.min_count,
              wrap:       dot_class,
              constraint: merge_constraints(variable.constraint.clone(), wildcard.constraint.clone()),
            });
          }
        }
        _ => phases.singles.push(pattern.clone()),
      },

      _ => phases.singles.push(pattern.clone()),
    }
  }

  Some(phases)
}

/// A cheap feasibility test used to order the bipartite assignment; the recursive matcher makes
/// the real decision.
fn could_match(pattern: &RcExpression, subject: &RcExpression) -> bool {
  match &**pattern {
    Expression::Symbol(symbol) => matches!(&**subject, Expression::Symbol(other) if other == symbol),
    Expression::Operation(operation) => {
      matches!(&**subject, Expression::Operation(other) if other.operator == operation.operator)
    }
    Expression::SymbolWildcard(wildcard) => symbol_of_class(subject, &wildcard.class),
    Expression::Variable(variable) => match &*variable.inner {
      Expression::SymbolWildcard(wildcard) => symbol_of_class(subject, &wildcard.class),
      _ => true,
    },
    _ => true,
  }
}

pub(crate) fn symbol_of_class(subject: &RcExpression, class: &Option<IString>) -> bool {
  match &**subject {
    Expression::Symbol(symbol) => match class {
      None => true,
      Some(class) => symbol.class.as_ref() == Some(class),
    },
    _ => false,
  }
}

pub(crate) fn match_commutative(
  patterns: &[RcExpression],
  subjects: &[RcExpression],
  substitution: &Substitution,
  operator: &Operator,
) -> MatchIterator {
  let Some(mut phases) = partition_patterns(patterns, operator.is_associative()) else {
    warning!(
      "fixed multi-length variable under commutative operator {} reached the matcher; yielding nothing",
      operator
    );
    return no_matches();
  };

  // Phase 1: constants.
  let mut residual: Multiset<RcExpression> = subjects.iter().cloned().collect();
  for constant in &phases.constants {
    if !residual.remove(constant) {
      return no_matches();
    }
  }

  // Fewest candidates first.
  phases
    .singles
    .sort_by_key(|pattern| residual.distinct().filter(|subject| could_match(pattern, subject)).count());

  let singles = Rc::new(phases.singles);
  let selections = Rc::new(phases.selections);
  let sequences = Rc::new(phases.sequences);
  let operator = Rc::new(operator.clone());

  let assigned = assign_singles(singles, 0, residual, substitution.clone());
  let selected = Box::new(assigned.flat_map(move |(extended, residual)| {
    assign_selections(selections.clone(), 0, residual, extended)
  }));
  Box::new(selected.flat_map(move |(extended, residual)| {
    assign_sequences(sequences.clone(), residual, extended, operator.clone())
  }))
}

/// A lazy stream of (substitution, remaining subjects) pairs.
type PhaseIter = Box<dyn Iterator<Item = (Substitution, Multiset<RcExpression>)>>;

/// Phase 2: pair each single-subject pattern with a distinct subject occurrence, consistently.
fn assign_singles(
  patterns: Rc<Vec<RcExpression>>,
  index: usize,
  residual: Multiset<RcExpression>,
  substitution: Substitution,
) -> PhaseIter {
  if index == patterns.len() {
    return Box::new(std::iter::once((substitution, residual)));
  }

  let pattern = patterns[index].clone();
  let candidates: Vec<RcExpression> = residual
      .distinct()
      .filter(|subject| could_match(&pattern, subject))
      .cloned()
      .collect();

  Box::new(candidates.into_iter().flat_map(move |subject| {
    let mut remaining = residual.clone();
    remaining.remove(&subject);
    let patterns = patterns.clone();
    match_expression(subject, pattern.clone(), substitution.clone())
        .flat_map(move |extended| assign_singles(patterns.clone(), index + 1, remaining.clone(), extended))
  }))
}

/// Phase 3: anonymous fixed multi-length wildcards pick a sub-multiset of their size.
fn assign_selections(
  selections: Rc<Vec<(usize, Option<RcConstraint>)>>,
  index: usize,
  residual: Multiset<RcExpression>,
  substitution: Substitution,
) -> PhaseIter {
  if index == selections.len() {
    return Box::new(std::iter::once((substitution, residual)));
  }

  let (size, constraint) = selections[index].clone();
  if !passes(&constraint, &substitution) {
    return Box::new(std::iter::empty());
  }

  Box::new(multiset_selections(residual.counted_vec(), size).flat_map(move |selection| {
    let mut remaining = residual.clone();
    // The selection was drawn from the residual, so subtraction cannot fail.
    if !remaining.remove_all(&selection) {
      return Box::new(std::iter::empty()) as PhaseIter;
    }
    assign_selections(selections.clone(), index + 1, remaining, substitution.clone())
  }))
}

/// Phase 4: split the rest across the sequence slots.
fn assign_sequences(
  slots: Rc<Vec<SequenceSlot>>,
  residual: Multiset<RcExpression>,
  substitution: Substitution,
  operator: Rc<Operator>,
) -> MatchIterator {
  if slots.is_empty() {
    return if residual.is_empty() { one_match(substitution) } else { no_matches() };
  }

  Box::new(multiset_partitions(residual.counted_vec(), slots.len()).filter_map(move |partition| {
    let mut extended = substitution.clone();
    for (slot, part) in slots.iter().zip(partition) {
      if part.len() < slot.min {
        return None;
      }

      if let Some(name) = &slot.name {
        let binding = if slot.wrap {
          let mut elements = part.elements();
          if elements.len() == 1 {
            // A lone element is the capture itself; larger parts wrap in the operator.
            match elements.pop() {
              Some(element) => Binding::Single(element),
              None => return None,
            }
          } else {
            match operator.apply(elements) {
              Ok(wrapped) => Binding::Single(wrapped),
              Err(_) => return None,
            }
          }
        } else {
          Binding::Multiset(part)
        };
        if !extended.try_add(name.clone(), binding) {
          return None;
        }
      }

      if !passes(&slot.constraint, &extended) {
        return None;
      }
    }
    Some(extended)
  }))
}
