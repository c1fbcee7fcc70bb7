/*!

The sequence matcher: a linear sequence of pattern operands against a linear sequence of subject
operands, under a non-commutative operator.

Every pattern operand is a slot spanning some number of adjacent subjects. Ordinary subpatterns
and dot-class wildcards span exactly one; a fixed multi-length wildcard spans exactly its count;
star and plus wildcards are flexible. When the operator is associative, dot-class slots become
flexible too, and a multi-term capture is bound wrapped in the operator: `x_` against `a, b`
under associative `f` binds `x → f(a, b)`.

The leftover subject count is distributed over the flexible slots by weak-composition
enumeration (lexicographic); within a distribution, slots match left to right, merging
substitutions and running constraints as soon as they can be evaluated. Failures backtrack to
the next distribution. The whole search is a lazy iterator.

*/

use std::rc::Rc;

use crate::{
  abstractions::IString,
  api::{
    constraint::{merge_constraints, passes, RcConstraint},
    expression::{Expression, RcExpression},
    matching::{no_matches, one_match, one_to_one::match_expression, MatchIterator},
    operator::Operator,
    substitution::{Binding, Substitution},
  },
  core::compositions::WeakCompositions,
};

/// How a slot consumes and binds its span of subjects.
enum SlotKind {
  /// An ordinary subpattern spanning one subject; delegates to the recursive matcher.
  Subpattern(RcExpression),
  /// An anonymous wildcard: consumes its span, binds nothing.
  Anonymous,
  /// A dot-class variable: binds the single subject, or the operator-wrapped span under an
  /// associative operator.
  Single { name: IString },
  /// A fixed multi-length or sequence variable: binds the span as an ordered sequence.
  Sequence { name: IString },
}

struct Slot {
  kind:       SlotKind,
  min:        usize,
  flexible:   bool,
  constraint: Option<RcConstraint>,
}

/// Classify one pattern operand. Only wildcard slots can flex; ordinary subpatterns always span
/// exactly one subject, associativity notwithstanding.
fn classify(pattern: &RcExpression, associative: bool) -> Slot {
  match &**pattern {
    Expression::Wildcard(wildcard) => {
      let dot_class = wildcard.fixed_size && wildcard.min_count == 1;
      Slot {
        kind:       SlotKind::Anonymous,
        min:        wildcard.min_count,
        flexible:   !wildcard.fixed_size || (associative && dot_class),
        constraint: wildcard.constraint.clone(),
      }
    }
    Expression::Variable(variable) => {
      if let Expression::Wildcard(wildcard) = &*variable.inner {
        let dot_class = wildcard.fixed_size && wildcard.min_count == 1;
        let kind = if dot_class {
          SlotKind::Single { name: variable.name.clone() }
        } else {
          SlotKind::Sequence { name: variable.name.clone() }
        };
        Slot {
          kind,
          min: wildcard.min_count,
          flexible: !wildcard.fixed_size || (associative && dot_class),
          constraint: merge_constraints(variable.constraint.clone(), wildcard.constraint.clone()),
        }
      } else {
        // A symbol-wildcard variable spans exactly one subject; the recursive matcher handles
        // the class check and the binding.
        Slot {
          kind:       SlotKind::Subpattern(pattern.clone()),
          min:        1,
          flexible:   false,
          constraint: None,
        }
      }
    }
    _ => Slot {
      kind:       SlotKind::Subpattern(pattern.clone()),
      min:        1,
      flexible:   false,
      constraint: None,
    },
  }
}

pub(crate) fn match_sequence(
  patterns: &[RcExpression],
  subjects: &[RcExpression],
  substitution: &Substitution,
  operator: &Operator,
) -> MatchIterator {
  let slots: Vec<Slot> = patterns.iter().map(|pattern| classify(pattern, operator.is_associative())).collect();

  let needed: usize = slots.iter().map(|slot| slot.min).sum();
  if subjects.len() < needed {
    return no_matches();
  }
  let leftover = subjects.len() - needed;
  let flexible: Vec<usize> = slots
      .iter()
      .enumerate()
      .filter_map(|(index, slot)| slot.flexible.then_some(index))
      .collect();
  if flexible.is_empty() && leftover != 0 {
    return no_matches();
  }

  let slots: Rc<Vec<Slot>> = Rc::new(slots);
  let subjects: Rc<Vec<RcExpression>> = Rc::new(subjects.to_vec());
  let operator = Rc::new(operator.clone());
  let substitution = substitution.clone();

  Box::new(WeakCompositions::new(leftover, flexible.len()).flat_map(move |spread| {
    let mut spans: Vec<usize> = slots.iter().map(|slot| slot.min).collect();
    for (slot_index, extra) in flexible.iter().zip(&spread) {
      spans[*slot_index] += extra;
    }
    match_spans(
      slots.clone(),
      Rc::new(spans),
      subjects.clone(),
      0,
      0,
      substitution.clone(),
      operator.clone(),
    )
  }))
}

/// Match slot `index` against its span of subjects starting at `offset`, then continue with the
/// rest. Lazy at every level.
fn match_spans(
  slots: Rc<Vec<Slot>>,
  spans: Rc<Vec<usize>>,
  subjects: Rc<Vec<RcExpression>>,
  index: usize,
  offset: usize,
  substitution: Substitution,
  operator: Rc<Operator>,
) -> MatchIterator {
  if index == slots.len() {
    return one_match(substitution);
  }

  let span = spans[index];
  let slot = &slots[index];

  match &slot.kind {
    SlotKind::Subpattern(pattern) => {
      let continuation = (slots.clone(), spans.clone(), subjects.clone(), operator.clone());
      let nested = match_expression(subjects[offset].clone(), pattern.clone(), substitution);
      Box::new(nested.flat_map(move |extended| {
        let (slots, spans, subjects, operator) = continuation.clone();
        match_spans(slots, spans, subjects, index + 1, offset + 1, extended, operator)
      }))
    }

    SlotKind::Anonymous => {
      if !passes(&slot.constraint, &substitution) {
        return no_matches();
      }
      match_spans(slots.clone(), spans, subjects.clone(), index + 1, offset + span, substitution, operator)
    }

    SlotKind::Single { name } => {
      let captured = if span == 1 {
        subjects[offset].clone()
      } else {
        // Multi-term span under an associative operator: wrap in the operator.
        match operator.apply(subjects[offset..offset + span].to_vec()) {
          Ok(wrapped) => wrapped,
          Err(_) => return no_matches(),
        }
      };
      let mut extended = substitution;
      if !extended.try_add(name.clone(), Binding::Single(captured)) {
        return no_matches();
      }
      if !passes(&slot.constraint, &extended) {
        return no_matches();
      }
      match_spans(slots.clone(), spans, subjects.clone(), index + 1, offset + span, extended, operator)
    }

    SlotKind::Sequence { name } => {
      let captured = subjects[offset..offset + span].to_vec();
      let mut extended = substitution;
      if !extended.try_add(name.clone(), Binding::Sequence(captured)) {
        return no_matches();
      }
      if !passes(&slot.constraint, &extended) {
        return no_matches();
      }
      match_spans(slots.clone(), spans, subjects.clone(), index + 1, offset + span, extended, operator)
    }
  }
}
