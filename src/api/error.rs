/*!

Error types surfaced by construction, subterm access, and matching. Construction errors are
raised immediately, so an invalid expression tree never exists. Matching never errors on "no
match" (that is an empty iterator); the only matching error is the documented
unsupported-pattern signal.

*/

use std::{
  error::Error,
  fmt::{Debug, Display, Formatter},
};

use crate::{abstractions::IString, api::Arity};

/// Coarse classification of an `ExpressionError`, mirroring the traditional split between value
/// errors (bad data) and type errors (combinations that do not type-check).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ErrorKind {
  Value,
  Type,
}

pub enum ExpressionError {
  /// The name is not identifier-like, or is a reserved word.
  InvalidName { name: IString },

  /// The operand list cannot satisfy the operator's arity.
  ArityMismatch {
    operator: IString,
    arity:    Arity,
    operands: usize,
  },

  /// A wildcard with `min_count == 0` must not be fixed-size.
  InvalidWildcard { min_count: usize, fixed_size: bool },

  /// A variable may only wrap a wildcard or a symbol wildcard.
  VariableOverNonWildcard { name: IString },

  /// The same variable name is used with wildcards of different fixed-size classes under a
  /// fixed-arity operator, e.g. `f(x_, x___)` for binary `f`.
  ConflictingVariableClasses { operator: IString, name: IString },

  /// The operator attribute combination does not type-check.
  InvalidAttributes {
    operator: IString,
    reason:   &'static str,
  },

  /// A symbol class tag must be identifier-like.
  InvalidSymbolClass { class: IString },
}

impl ExpressionError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      ExpressionError::InvalidName { .. }
      | ExpressionError::ArityMismatch { .. }
      | ExpressionError::InvalidWildcard { .. }
      | ExpressionError::VariableOverNonWildcard { .. }
      | ExpressionError::ConflictingVariableClasses { .. } => ErrorKind::Value,

      ExpressionError::InvalidAttributes { .. } | ExpressionError::InvalidSymbolClass { .. } => ErrorKind::Type,
    }
  }
}

impl Display for ExpressionError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      ExpressionError::InvalidName { name } => {
        write!(f, "\"{}\" is not a valid name: names are identifier-like and not reserved words.", name)
      }

      ExpressionError::ArityMismatch { operator, arity, operands } => {
        write!(
          f,
          "operator {} with arity {} cannot be applied to {} operand(s).",
          operator, arity, operands
        )
      }

      ExpressionError::InvalidWildcard { min_count, fixed_size } => {
        write!(
          f,
          "a wildcard with min_count {} and fixed_size {} is not a valid wildcard.",
          min_count, fixed_size
        )
      }

      ExpressionError::VariableOverNonWildcard { name } => {
        write!(f, "variable \"{}\" must wrap a wildcard or a symbol wildcard.", name)
      }

      ExpressionError::ConflictingVariableClasses { operator, name } => {
        write!(
          f,
          "variable \"{}\" occurs under fixed-arity operator {} with wildcards of different fixed-size classes.",
          name, operator
        )
      }

      ExpressionError::InvalidAttributes { operator, reason } => {
        write!(f, "invalid attributes for operator {}: {}.", operator, reason)
      }

      ExpressionError::InvalidSymbolClass { class } => {
        write!(f, "\"{}\" is not a valid symbol class tag.", class)
      }
    } // end match on `ExpressionError`
  }
}

impl Debug for ExpressionError {
  fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
    Display::fmt(self, f)
  }
}

impl Error for ExpressionError {}

/// Indexed subterm access with a position path that leaves the tree.
pub enum PositionError {
  OutOfRange { position: Vec<usize> },
}

impl Display for PositionError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      PositionError::OutOfRange { position } => {
        write!(f, "position {:?} does not exist in the expression.", position)
      }
    }
  }
}

impl Debug for PositionError {
  fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
    Display::fmt(self, f)
  }
}

impl Error for PositionError {}

/// The single error matching can raise, before enumeration begins. A named fixed multi-length
/// wildcard directly under a commutative operator is not supported by the commutative matcher.
pub enum MatchError {
  UnsupportedCommutativePattern { operator: IString, name: IString },
}

impl Display for MatchError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      MatchError::UnsupportedCommutativePattern { operator, name } => {
        write!(
          f,
          "variable \"{}\" is a fixed multi-length wildcard under commutative operator {}, which the matcher does not support.",
          name, operator
        )
      }
    }
  }
}

impl Debug for MatchError {
  fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
    Display::fmt(self, f)
  }
}

impl Error for MatchError {}
