#![allow(dead_code)]
/*!

`acmatch` is a pattern matcher for symbolic expressions. Patterns are tree-shaped expressions
containing variables and wildcards; matching one against a concrete subject yields every
substitution (variable → subterm binding) under which they agree. Operators may be declared
associative, commutative, and one-identity, and the matchers honor those axioms — the
NP-hardness of matching modulo associativity and commutativity is why the enumeration machinery
is the heart of the crate.

The pieces, bottom up:

- the expression algebra (`api::expression`): immutable term trees, normalized at construction
  (associative flattening, commutative sorting, one-identity collapse) with cached structural
  attributes;
- substitutions (`api::substitution`) with consistent merging, and opaque constraints
  (`api::constraint`) that prune match branches;
- the one-to-one matcher (`api::matching::match_`) and the many-to-one discrimination net
  (`api::matching::ManyToOneMatcher`), both exposing matches as lazy pull-based iterators.

*/

pub mod abstractions;
pub mod api;
mod core;

// We re-export abstractions that are meant to be used publicly.
pub use abstractions::{log, IString, Multiset};
pub use api::{
  match_,
  Arity,
  Binding,
  Constraint,
  ErrorKind,
  Expression,
  ExpressionError,
  Head,
  ManyToOneMatcher,
  MatchError,
  MatchIterator,
  MultiConstraint,
  Operation,
  Operator,
  OperatorAttribute,
  OperatorAttributes,
  PatternMatchIterator,
  Position,
  PositionError,
  RcConstraint,
  RcExpression,
  Substitution,
  Symbol,
  SymbolWildcard,
  Variable,
  Wildcard,
};
