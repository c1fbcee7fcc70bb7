/*!

Operator heads. An `Operator` names an n-ary operation and carries its arity together with its
theory attributes: associativity, commutativity, one-identity, and the cosmetic infix flag.
Applying an operator to an operand list (`Operator::apply`) is the only way to build an
operation expression, and it is where all construction-time normalization runs.

Attribute combinations that make no sense for the declared arity are rejected when the operator
is declared, so an operator value in hand is always coherent.

*/

use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

use enumflags2::{bitflags, make_bitflags, BitFlags};

use crate::{
  abstractions::IString,
  api::{
    constraint::RcConstraint,
    error::ExpressionError,
    expression::{Operation, RcExpression},
    symbol::validate_name,
    Arity,
  },
};

#[bitflags]
#[repr(u8)]
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum OperatorAttribute {
  // Theory attributes
  Associative,
  Commutative,
  OneIdentity,

  // Syntactic attributes
  Infix,
}

pub type OperatorAttributes = BitFlags<OperatorAttribute, u8>;

impl OperatorAttribute {
  //	Conjunctions
  #![allow(non_upper_case_globals)]

  /// Theory axioms that participate in construction-time normalization.
  pub const Axioms: OperatorAttributes = make_bitflags!(
    OperatorAttribute::{
      Associative
      | Commutative
      | OneIdentity
    }
  );
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Operator {
  pub name:       IString,
  pub arity:      Arity,
  pub attributes: OperatorAttributes,
}

impl Operator {
  pub fn new(name: &str, arity: Arity) -> Result<Operator, ExpressionError> {
    Operator::with_attributes(name, arity, OperatorAttributes::default())
  }

  /// Declare an operator, rejecting invalid names and attribute combinations that do not
  /// type-check against the arity.
  pub fn with_attributes(name: &str, arity: Arity, attributes: OperatorAttributes) -> Result<Operator, ExpressionError> {
    let name = validate_name(name)?;

    if attributes.contains(OperatorAttribute::OneIdentity) && (arity.fixed_size || arity.min_count > 1) {
      return Err(ExpressionError::InvalidAttributes {
        operator: name,
        reason:   "one-identity needs an arity that admits a lone operand and is not fixed",
      });
    }
    if attributes.contains(OperatorAttribute::Associative) && arity.fixed_size && arity.min_count < 2 {
      return Err(ExpressionError::InvalidAttributes {
        operator: name,
        reason:   "associativity needs an arity that admits two operands",
      });
    }
    if attributes.contains(OperatorAttribute::Infix) && arity.fixed_size && arity.min_count != 2 {
      return Err(ExpressionError::InvalidAttributes {
        operator: name,
        reason:   "infix notation needs a binary-capable arity",
      });
    }

    Ok(Operator { name, arity, attributes })
  }

  #[inline(always)]
  pub fn is_associative(&self) -> bool {
    self.attributes.contains(OperatorAttribute::Associative)
  }

  #[inline(always)]
  pub fn is_commutative(&self) -> bool {
    self.attributes.contains(OperatorAttribute::Commutative)
  }

  #[inline(always)]
  pub fn has_one_identity(&self) -> bool {
    self.attributes.contains(OperatorAttribute::OneIdentity)
  }

  #[inline(always)]
  pub fn is_infix(&self) -> bool {
    self.attributes.contains(OperatorAttribute::Infix)
  }

  /// Apply the operator to an operand list, running normalization. The result is not
  /// necessarily an operation: one-identity can collapse it to the lone operand.
  pub fn apply(&self, operands: Vec<RcExpression>) -> Result<RcExpression, ExpressionError> {
    Operation::make(self.clone(), operands, None)
  }

  /// As `apply`, attaching a constraint to the operation.
  pub fn apply_constrained(
    &self,
    operands: Vec<RcExpression>,
    constraint: Option<RcConstraint>,
  ) -> Result<RcExpression, ExpressionError> {
    Operation::make(self.clone(), operands, constraint)
  }

  /// Name-major comparison used by the total order on expressions; arity and attributes break
  /// ties between unrelated operators that happen to share a name.
  pub(crate) fn compare(&self, other: &Operator) -> Ordering {
    (&*self.name, self.arity.min_count, self.arity.fixed_size, self.attributes.bits()).cmp(&(
      &*other.name,
      other.arity.min_count,
      other.arity.fixed_size,
      other.attributes.bits(),
    ))
  }
}

impl Display for Operator {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.name)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::error::ErrorKind;

  #[test]
  fn reserved_and_punctuation_names_are_rejected() {
    assert!(matches!(
      Operator::new("if", Arity::VARIADIC),
      Err(ExpressionError::InvalidName { .. })
    ));
    assert!(matches!(
      Operator::new("+", Arity::VARIADIC),
      Err(ExpressionError::InvalidName { .. })
    ));
  }

  #[test]
  fn one_identity_needs_a_collapsible_arity() {
    for arity in [Arity::UNARY, Arity::BINARY, Arity::POLYADIC] {
      let error = Operator::with_attributes("g", arity, make_bitflags!(OperatorAttribute::{OneIdentity})).unwrap_err();
      assert_eq!(error.kind(), ErrorKind::Type);
    }
    assert!(Operator::with_attributes("g", Arity::VARIADIC, make_bitflags!(OperatorAttribute::{OneIdentity})).is_ok());
  }

  #[test]
  fn associativity_needs_two_operands() {
    let error =
      Operator::with_attributes("g", Arity::UNARY, make_bitflags!(OperatorAttribute::{Associative})).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Type);
    assert!(Operator::with_attributes("g", Arity::BINARY, make_bitflags!(OperatorAttribute::{Associative})).is_ok());
    assert!(Operator::with_attributes("g", Arity::VARIADIC, make_bitflags!(OperatorAttribute::{Associative})).is_ok());
  }

  #[test]
  fn infix_needs_a_binary_capable_arity() {
    let error = Operator::with_attributes("g", Arity::UNARY, make_bitflags!(OperatorAttribute::{Infix})).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Type);
    assert!(Operator::with_attributes("g", Arity::BINARY, make_bitflags!(OperatorAttribute::{Infix})).is_ok());
    assert!(Operator::with_attributes("g", Arity::VARIADIC, make_bitflags!(OperatorAttribute::{Infix})).is_ok());
  }
}
