/*!

The one-to-one matcher: every way a single pattern matches a subject, as a lazy stream of
substitutions. This is the recursive driver the other matchers lean on: it dispatches on the
pattern variant and delegates operand matching to the sequence or commutative matcher.

Constraints run twice: eagerly at the merge point where their variables first become bound, to
prune the search, and once more in the end-of-match filter, which is the authoritative check. A
constraint whose variables never all bind is never invoked.

*/

use crate::api::{
  constraint::{is_ready, passes, RcConstraint},
  error::MatchError,
  expression::{Expression, RcExpression},
  matching::{
    commutative::{match_commutative, symbol_of_class},
    no_matches,
    one_match,
    sequence::match_sequence,
    MatchIterator,
  },
  substitution::{Binding, Substitution},
};

/// All ways `pattern` matches `subject`. "No match" is an empty stream; the only error is the
/// unsupported commutative pattern shape, raised before enumeration begins.
pub fn match_(subject: &RcExpression, pattern: &RcExpression) -> Result<MatchIterator, MatchError> {
  ensure_supported(pattern)?;

  let constraints = collect_constraints(pattern);
  let matches = match_expression(subject.clone(), pattern.clone(), Substitution::new());
  Ok(Box::new(matches.filter(move |substitution| {
    constraints
        .iter()
        .all(|constraint| !is_ready(constraint, substitution) || constraint.check(substitution))
  })))
}

/// Reject the documented unsupported shape: a named fixed multi-length wildcard directly under
/// a commutative operator.
pub(crate) fn ensure_supported(pattern: &RcExpression) -> Result<(), MatchError> {
  for (subterm, _) in pattern.preorder_iter() {
    let Expression::Operation(operation) = subterm else {
      continue;
    };
    if !operation.operator.is_commutative() {
      continue;
    }
    for operand in &operation.operands {
      if let Expression::Variable(variable) = &**operand {
        if let Expression::Wildcard(wildcard) = &*variable.inner {
          if wildcard.fixed_size && wildcard.min_count > 1 {
            return Err(MatchError::UnsupportedCommutativePattern {
              operator: operation.operator.name.clone(),
              name:     variable.name.clone(),
            });
          }
        }
      }
    }
  }
  Ok(())
}

/// Every constraint in the pattern, in preorder.
pub(crate) fn collect_constraints(pattern: &RcExpression) -> Vec<RcConstraint> {
  pattern
      .preorder_iter()
      .filter_map(|(subterm, _)| subterm.constraint().cloned())
      .collect()
}

/// The recursive core: extend `substitution` with every way `pattern` matches the single
/// subject term.
pub(crate) fn match_expression(subject: RcExpression, pattern: RcExpression, substitution: Substitution) -> MatchIterator {
  match &*pattern {
    Expression::Symbol(symbol) => match &*subject {
      Expression::Symbol(other) if other == symbol => one_match(substitution),
      _ => no_matches(),
    },

    Expression::SymbolWildcard(wildcard) => {
      if symbol_of_class(&subject, &wildcard.class) && passes(&wildcard.constraint, &substitution) {
        one_match(substitution)
      } else {
        no_matches()
      }
    }

    Expression::Wildcard(wildcard) => {
      // A lone subject satisfies any span that admits length one.
      let fits = if wildcard.fixed_size {
        wildcard.min_count == 1
      } else {
        wildcard.min_count <= 1
      };
      if fits && passes(&wildcard.constraint, &substitution) {
        one_match(substitution)
      } else {
        no_matches()
      }
    }

    Expression::Variable(variable) => {
      let binding = match &*variable.inner {
        Expression::Wildcard(wildcard) => {
          let fits = if wildcard.fixed_size {
            wildcard.min_count == 1
          } else {
            wildcard.min_count <= 1
          };
          if !fits {
            return no_matches();
          }
          if wildcard.fixed_size {
            Binding::Single(subject.clone())
          } else {
            Binding::Sequence(vec![subject.clone()])
          }
        }
        Expression::SymbolWildcard(wildcard) => {
          if !symbol_of_class(&subject, &wildcard.class) {
            return no_matches();
          }
          Binding::Single(subject.clone())
        }
        // Construction never lets anything else inside a variable.
        _ => return no_matches(),
      };

      if !passes(&variable.inner.constraint().cloned(), &substitution) {
        return no_matches();
      }
      let mut extended = substitution;
      if !extended.try_add(variable.name.clone(), binding) {
        return no_matches();
      }
      if !passes(&variable.constraint, &extended) {
        return no_matches();
      }
      one_match(extended)
    }

    Expression::Operation(pattern_operation) => {
      let Expression::Operation(subject_operation) = &*subject else {
        return no_matches();
      };
      if subject_operation.operator != pattern_operation.operator {
        return no_matches();
      }

      let matches = if pattern_operation.operator.is_commutative() {
        match_commutative(
          &pattern_operation.operands,
          &subject_operation.operands,
          &substitution,
          &pattern_operation.operator,
        )
      } else {
        match_sequence(
          &pattern_operation.operands,
          &subject_operation.operands,
          &substitution,
          &pattern_operation.operator,
        )
      };

      match &pattern_operation.constraint {
        None => matches,
        Some(constraint) => {
          let constraint = Some(constraint.clone());
          Box::new(matches.filter(move |extended| passes(&constraint, extended)))
        }
      }
    }
  }
}
