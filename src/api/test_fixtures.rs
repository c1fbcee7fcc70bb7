/*!

Shared fixtures for the algebra and matcher tests: the standard operator menagerie (`f` plain
variadic, `f_a` associative, `f_c` commutative, `f_ac` both, `f_i` one-identity), a few symbols,
the usual wildcard and variable shorthands, a mock constraint, and set-comparison helpers for
match results (enumeration order is unspecified, so tests compare result sets).

*/

use std::rc::Rc;

use enumflags2::make_bitflags;

use crate::{
  abstractions::{IString, Set},
  api::{
    constraint::{Constraint, RcConstraint},
    expression::{Expression, RcExpression, SymbolWildcard, Variable, Wildcard},
    operator::{Operator, OperatorAttribute},
    substitution::{Binding, Substitution},
    Arity,
  },
};

// region Operators and symbols

pub(crate) fn f() -> Operator {
  Operator::new("f", Arity::VARIADIC).unwrap()
}

pub(crate) fn f_a() -> Operator {
  Operator::with_attributes("f_a", Arity::VARIADIC, make_bitflags!(OperatorAttribute::{Associative})).unwrap()
}

pub(crate) fn f_c() -> Operator {
  Operator::with_attributes("f_c", Arity::VARIADIC, make_bitflags!(OperatorAttribute::{Commutative})).unwrap()
}

pub(crate) fn f_ac() -> Operator {
  Operator::with_attributes(
    "f_ac",
    Arity::VARIADIC,
    make_bitflags!(OperatorAttribute::{Associative | Commutative}),
  )
  .unwrap()
}

pub(crate) fn f_i() -> Operator {
  Operator::with_attributes("f_i", Arity::VARIADIC, make_bitflags!(OperatorAttribute::{OneIdentity})).unwrap()
}

pub(crate) fn apply(operator: &Operator, operands: Vec<RcExpression>) -> RcExpression {
  operator.apply(operands).unwrap()
}

pub(crate) fn sym(name: &str) -> RcExpression {
  Expression::symbol(name).unwrap()
}

pub(crate) fn a() -> RcExpression {
  sym("a")
}

pub(crate) fn b() -> RcExpression {
  sym("b")
}

pub(crate) fn c() -> RcExpression {
  sym("c")
}

pub(crate) fn name(text: &str) -> IString {
  IString::from(text)
}

// endregion Operators and symbols

// region Wildcards and variables

pub(crate) fn dot() -> RcExpression {
  Wildcard::dot()
}

pub(crate) fn plus() -> RcExpression {
  Wildcard::plus()
}

pub(crate) fn star() -> RcExpression {
  Wildcard::star()
}

pub(crate) fn x_() -> RcExpression {
  Variable::dot("x").unwrap()
}

pub(crate) fn y_() -> RcExpression {
  Variable::dot("y").unwrap()
}

pub(crate) fn x__() -> RcExpression {
  Variable::plus("x").unwrap()
}

pub(crate) fn x___() -> RcExpression {
  Variable::star("x").unwrap()
}

pub(crate) fn y___() -> RcExpression {
  Variable::star("y").unwrap()
}

pub(crate) fn s_() -> RcExpression {
  Variable::symbol("s", Some("special")).unwrap()
}

pub(crate) fn _s() -> RcExpression {
  SymbolWildcard::of_class("special").unwrap()
}

// endregion Wildcards and variables

// region Constraints

/// A constraint with a fixed verdict, recording nothing. The empty variable set makes it
/// evaluable from the first merge on.
pub(crate) struct MockConstraint {
  pub verdict:   bool,
  pub inspected: Set<IString>,
}

impl Constraint for MockConstraint {
  fn check(&self, _substitution: &Substitution) -> bool {
    self.verdict
  }

  fn variables(&self) -> Set<IString> {
    self.inspected.clone()
  }
}

pub(crate) fn constraint(verdict: bool, inspected: &[&str]) -> RcConstraint {
  Rc::new(MockConstraint {
    verdict,
    inspected: inspected.iter().map(|text| IString::from(*text)).collect(),
  })
}

pub(crate) fn accepting() -> RcConstraint {
  constraint(true, &[])
}

pub(crate) fn rejecting() -> RcConstraint {
  constraint(false, &[])
}

// endregion Constraints

// region Match-result helpers

/// Build a substitution from (name, binding) pairs.
pub(crate) fn subst(pairs: Vec<(&str, Binding)>) -> Substitution {
  let mut substitution = Substitution::new();
  for (variable, value) in pairs {
    assert!(substitution.try_add(IString::from(variable), value));
  }
  substitution
}

pub(crate) fn single(expression: RcExpression) -> Binding {
  Binding::Single(expression)
}

pub(crate) fn sequence(expressions: Vec<RcExpression>) -> Binding {
  Binding::Sequence(expressions)
}

pub(crate) fn multiset(expressions: Vec<RcExpression>) -> Binding {
  Binding::Multiset(expressions.into_iter().collect())
}

/// Compare match results as sets: enumeration order is unspecified and duplicates carry no
/// information.
pub(crate) fn assert_match_results(actual: Vec<Substitution>, expected: Vec<Substitution>) {
  for wanted in &expected {
    assert!(
      actual.iter().any(|found| found == wanted),
      "missing result {} in {:?}",
      wanted,
      actual
    );
  }
  for found in &actual {
    assert!(
      expected.iter().any(|wanted| wanted == found),
      "unexpected result {} not in {:?}",
      found,
      expected
    );
  }
}

// endregion Match-result helpers
