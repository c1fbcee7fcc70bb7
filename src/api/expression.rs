/*!

An `Expression` is a node in a term tree: a symbol, an operation applying an operator to
operands, a wildcard, a symbol wildcard, or a variable capturing what its wrapped wildcard
matches. Expressions are immutable value objects shared through `RcExpression` handles; every
transformation returns a new tree.

All normalization runs at construction, in this order: arity check, associative flattening,
one-identity collapse, commutative sorting, constraint merging. An expression in hand therefore
always satisfies the algebra's invariants, and construction is idempotent on already-normalized
children. The closed set of variants is an enum rather than a trait hierarchy: every algorithm
in the matchers dispatches with a `match` on the variant.

*/

use std::{
  cmp::Ordering,
  collections::HashMap,
  fmt::{Debug, Display, Formatter},
  hash::{Hash, Hasher},
  rc::Rc,
};

use enumflags2::{bitflags, BitFlags};

use crate::{
  abstractions::{join_string, IString, Multiset},
  api::{
    constraint::{constraints_eq, merge_constraints, MultiConstraint, RcConstraint},
    error::ExpressionError,
    operator::Operator,
    symbol::{is_valid_name, validate_name, Symbol},
  },
};

pub type RcExpression = Rc<Expression>;

/// Structural facts about a subtree, computed once at construction.
#[bitflags]
#[repr(u8)]
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ExpressionAttribute {
  /// No wildcards or variables anywhere in the subtree.
  Constant,

  /// No associative or commutative operations and no non-fixed-size wildcards; syntactic
  /// subtrees match by plain structural recursion.
  Syntactic,

  /// No variable name occurs twice in the subtree.
  Linear,
}

pub type ExpressionAttributes = BitFlags<ExpressionAttribute, u8>;

#[derive(Clone)]
pub struct Operation {
  pub operator:   Operator,
  pub operands:   Vec<RcExpression>,
  pub constraint: Option<RcConstraint>,
  attributes:     ExpressionAttributes,
}

#[derive(Clone)]
pub struct Wildcard {
  /// The least number of terms the wildcard spans.
  pub min_count:  usize,
  /// A fixed-size wildcard spans exactly `min_count` terms.
  pub fixed_size: bool,
  pub constraint: Option<RcConstraint>,
}

#[derive(Clone)]
pub struct SymbolWildcard {
  /// Matches only symbols of this class; `None` matches every symbol.
  pub class:      Option<IString>,
  pub constraint: Option<RcConstraint>,
}

#[derive(Clone)]
pub struct Variable {
  pub name:       IString,
  /// Always a `Wildcard` or `SymbolWildcard`; enforced at construction.
  pub inner:      RcExpression,
  pub constraint: Option<RcConstraint>,
}

#[derive(Clone)]
pub enum Expression {
  Symbol(Symbol),
  Operation(Operation),
  Wildcard(Wildcard),
  SymbolWildcard(SymbolWildcard),
  Variable(Variable),
}

/// The head of an expression: an operation's operator, or a symbol itself. Wildcards and
/// variables have no head — they stand for anything.
#[derive(Copy, Clone, PartialEq)]
pub enum Head<'a> {
  Symbol(&'a Symbol),
  Operator(&'a Operator),
}

// region Construction

impl Expression {
  pub fn symbol(name: &str) -> Result<RcExpression, ExpressionError> {
    Ok(Rc::new(Expression::Symbol(Symbol::new(name)?)))
  }

  pub fn classed_symbol(name: &str, class: &str) -> Result<RcExpression, ExpressionError> {
    Ok(Rc::new(Expression::Symbol(Symbol::with_class(name, class)?)))
  }
}

impl Wildcard {
  /// The dot wildcard `_`: exactly one term.
  pub fn dot() -> RcExpression {
    Rc::new(Expression::Wildcard(Wildcard {
      min_count:  1,
      fixed_size: true,
      constraint: None,
    }))
  }

  /// The plus wildcard `__`: one or more terms.
  pub fn plus() -> RcExpression {
    Rc::new(Expression::Wildcard(Wildcard {
      min_count:  1,
      fixed_size: false,
      constraint: None,
    }))
  }

  /// The star wildcard `___`: zero or more terms.
  pub fn star() -> RcExpression {
    Rc::new(Expression::Wildcard(Wildcard {
      min_count:  0,
      fixed_size: false,
      constraint: None,
    }))
  }

  pub fn new(min_count: usize, fixed_size: bool) -> Result<RcExpression, ExpressionError> {
    Wildcard::with_constraint(min_count, fixed_size, None)
  }

  pub fn with_constraint(
    min_count: usize,
    fixed_size: bool,
    constraint: Option<RcConstraint>,
  ) -> Result<RcExpression, ExpressionError> {
    if min_count == 0 && fixed_size {
      return Err(ExpressionError::InvalidWildcard { min_count, fixed_size });
    }
    Ok(Rc::new(Expression::Wildcard(Wildcard {
      min_count,
      fixed_size,
      constraint,
    })))
  }
}

impl SymbolWildcard {
  /// Matches any symbol.
  pub fn any() -> RcExpression {
    Rc::new(Expression::SymbolWildcard(SymbolWildcard {
      class:      None,
      constraint: None,
    }))
  }

  /// Matches symbols of the given class only.
  pub fn of_class(class: &str) -> Result<RcExpression, ExpressionError> {
    SymbolWildcard::with_constraint(Some(class), None)
  }

  pub fn with_constraint(
    class: Option<&str>,
    constraint: Option<RcConstraint>,
  ) -> Result<RcExpression, ExpressionError> {
    let class = match class {
      None => None,
      Some(class) if is_valid_name(class) => Some(IString::from(class)),
      Some(class) => return Err(ExpressionError::InvalidSymbolClass { class: IString::from(class) }),
    };
    Ok(Rc::new(Expression::SymbolWildcard(SymbolWildcard { class, constraint })))
  }
}

impl Variable {
  /// Wrap a wildcard, capturing what it matches under `name`. Anything other than a wildcard or
  /// symbol wildcard is rejected.
  pub fn new(name: &str, inner: RcExpression, constraint: Option<RcConstraint>) -> Result<RcExpression, ExpressionError> {
    let name = validate_name(name)?;
    match &*inner {
      Expression::Wildcard(_) | Expression::SymbolWildcard(_) => {}
      _ => return Err(ExpressionError::VariableOverNonWildcard { name }),
    }
    Ok(Rc::new(Expression::Variable(Variable { name, inner, constraint })))
  }

  /// `x_`: captures exactly one term.
  pub fn dot(name: &str) -> Result<RcExpression, ExpressionError> {
    Variable::new(name, Wildcard::dot(), None)
  }

  /// `x__`: captures a sequence of one or more terms.
  pub fn plus(name: &str) -> Result<RcExpression, ExpressionError> {
    Variable::new(name, Wildcard::plus(), None)
  }

  /// `x___`: captures a sequence of zero or more terms.
  pub fn star(name: &str) -> Result<RcExpression, ExpressionError> {
    Variable::new(name, Wildcard::star(), None)
  }

  /// Captures a sequence of exactly `count` terms.
  pub fn fixed(name: &str, count: usize) -> Result<RcExpression, ExpressionError> {
    Variable::new(name, Wildcard::new(count, true)?, None)
  }

  /// Captures a single symbol, optionally restricted to a class.
  pub fn symbol(name: &str, class: Option<&str>) -> Result<RcExpression, ExpressionError> {
    Variable::new(name, SymbolWildcard::with_constraint(class, None)?, None)
  }
}

impl Operation {
  /// The operation constructor; reached through `Operator::apply`. Runs the full normalization
  /// pipeline, so the result may collapse to something other than an operation.
  pub(crate) fn make(
    operator: Operator,
    operands: Vec<RcExpression>,
    constraint: Option<RcConstraint>,
  ) -> Result<RcExpression, ExpressionError> {
    check_arity(&operator, &operands)?;
    check_wildcard_classes(&operator, &operands)?;

    let (mut operands, constraint) = if operator.is_associative() {
      flatten(&operator, operands, constraint)
    } else {
      (operands, constraint)
    };

    if operator.has_one_identity() && operands.len() == 1 {
      if let Some(collapsed) = collapse_lone_operand(&operands[0], constraint.clone()) {
        return Ok(collapsed);
      }
    }

    if operator.is_commutative() {
      operands.sort();
    }

    let attributes = compute_attributes(&operator, &operands);
    Ok(Rc::new(Expression::Operation(Operation {
      operator,
      operands,
      constraint,
      attributes,
    })))
  }
}

/// The possible operand counts must intersect the operator's declared range. Each ordinary
/// operand stands for exactly one term; wildcards widen the range.
fn check_arity(operator: &Operator, operands: &[RcExpression]) -> Result<(), ExpressionError> {
  let mut minimum = 0usize;
  let mut bounded = true;
  for operand in operands {
    let (min, fixed) = operand.multiplicity();
    minimum += min;
    bounded &= fixed;
  }

  let arity = operator.arity;
  let acceptable = if bounded {
    minimum >= arity.min_count && (!arity.fixed_size || minimum == arity.min_count)
  } else {
    !arity.fixed_size || minimum <= arity.min_count
  };

  if acceptable {
    Ok(())
  } else {
    Err(ExpressionError::ArityMismatch {
      operator: operator.name.clone(),
      arity,
      operands: operands.len(),
    })
  }
}

/// Under a fixed-arity operator the operand count each name consumes is determined, so one name
/// may not mix wildcards of different fixed-size classes: `f(x_, x___)` is rejected for binary
/// `f`.
fn check_wildcard_classes(operator: &Operator, operands: &[RcExpression]) -> Result<(), ExpressionError> {
  if !operator.arity.fixed_size {
    return Ok(());
  }

  let mut classes: HashMap<IString, (usize, bool)> = HashMap::new();
  for operand in operands {
    if let Expression::Variable(variable) = &**operand {
      if let Expression::Wildcard(wildcard) = &*variable.inner {
        let class = (wildcard.min_count, wildcard.fixed_size);
        match classes.get(&variable.name) {
          Some(existing) if *existing != class => {
            return Err(ExpressionError::ConflictingVariableClasses {
              operator: operator.name.clone(),
              name:     variable.name.clone(),
            });
          }
          _ => {
            classes.insert(variable.name.clone(), class);
          }
        }
      }
    }
  }
  Ok(())
}

/// Splice same-operator children into the operand list. A spliced child's constraint survives
/// by merging into the parent's.
fn flatten(
  operator: &Operator,
  operands: Vec<RcExpression>,
  constraint: Option<RcConstraint>,
) -> (Vec<RcExpression>, Option<RcConstraint>) {
  let mut flattened = Vec::with_capacity(operands.len());
  let mut constraints: Vec<RcConstraint> = constraint.into_iter().collect();
  for operand in operands {
    match &*operand {
      Expression::Operation(child) if child.operator == *operator => {
        flattened.extend(child.operands.iter().cloned());
        if let Some(child_constraint) = &child.constraint {
          constraints.push(child_constraint.clone());
        }
      }
      _ => flattened.push(operand),
    }
  }
  (flattened, MultiConstraint::create(constraints))
}

/// One-identity collapse of `f(e)` to `e`, when `e` always stands for exactly one term and can
/// absorb the operation's constraint. A `Symbol` cannot carry a constraint, so a constrained
/// application over a symbol stays an operation.
fn collapse_lone_operand(operand: &RcExpression, constraint: Option<RcConstraint>) -> Option<RcExpression> {
  if !operand.fits_one_term() {
    return None;
  }
  match constraint {
    None => Some(operand.clone()),
    Some(extra) => operand.with_merged_constraint(extra),
  }
}

fn compute_attributes(operator: &Operator, operands: &[RcExpression]) -> ExpressionAttributes {
  let mut attributes = ExpressionAttribute::Constant | ExpressionAttribute::Syntactic | ExpressionAttribute::Linear;
  if operator.is_associative() || operator.is_commutative() {
    attributes.remove(ExpressionAttribute::Syntactic);
  }

  let mut variables = Multiset::new();
  for operand in operands {
    if !operand.is_constant() {
      attributes.remove(ExpressionAttribute::Constant);
    }
    if !operand.is_syntactic() {
      attributes.remove(ExpressionAttribute::Syntactic);
    }
    operand.collect_variables(&mut variables);
  }
  if variables.counted().any(|(_, count)| count > 1) {
    attributes.remove(ExpressionAttribute::Linear);
  }

  attributes
}

// endregion Construction

// region Structural queries

impl Expression {
  /// No wildcards or variables anywhere in the subtree.
  pub fn is_constant(&self) -> bool {
    match self {
      Expression::Symbol(_) => true,
      Expression::Operation(operation) => operation.attributes.contains(ExpressionAttribute::Constant),
      Expression::Wildcard(_) | Expression::SymbolWildcard(_) | Expression::Variable(_) => false,
    }
  }

  /// No associative/commutative operations and no non-fixed-size wildcards.
  pub fn is_syntactic(&self) -> bool {
    match self {
      Expression::Symbol(_) | Expression::SymbolWildcard(_) => true,
      Expression::Operation(operation) => operation.attributes.contains(ExpressionAttribute::Syntactic),
      Expression::Wildcard(wildcard) => wildcard.fixed_size,
      Expression::Variable(variable) => variable.inner.is_syntactic(),
    }
  }

  /// No variable name occurs twice in the subtree.
  pub fn is_linear(&self) -> bool {
    match self {
      Expression::Operation(operation) => operation.attributes.contains(ExpressionAttribute::Linear),
      _ => true,
    }
  }

  /// The multiset of symbol names occurring in the subtree, operator heads included.
  pub fn symbols(&self) -> Multiset<IString> {
    let mut symbols = Multiset::new();
    self.collect_symbols(&mut symbols);
    symbols
  }

  /// The multiset of variable names occurring in the subtree.
  pub fn variables(&self) -> Multiset<IString> {
    let mut variables = Multiset::new();
    self.collect_variables(&mut variables);
    variables
  }

  pub fn head(&self) -> Option<Head<'_>> {
    match self {
      Expression::Symbol(symbol) => Some(Head::Symbol(symbol)),
      Expression::Operation(operation) => Some(Head::Operator(&operation.operator)),
      _ => None,
    }
  }

  pub fn constraint(&self) -> Option<&RcConstraint> {
    match self {
      Expression::Symbol(_) => None,
      Expression::Operation(operation) => operation.constraint.as_ref(),
      Expression::Wildcard(wildcard) => wildcard.constraint.as_ref(),
      Expression::SymbolWildcard(wildcard) => wildcard.constraint.as_ref(),
      Expression::Variable(variable) => variable.constraint.as_ref(),
    }
  }

  /// How many terms this pattern spans as an operand: the least count, and whether the count is
  /// exact.
  pub(crate) fn multiplicity(&self) -> (usize, bool) {
    match self {
      Expression::Wildcard(wildcard) => (wildcard.min_count, wildcard.fixed_size),
      Expression::Variable(variable) => variable.inner.multiplicity(),
      _ => (1, true),
    }
  }

  /// Whether this pattern always stands for exactly one term.
  pub(crate) fn fits_one_term(&self) -> bool {
    let (min, fixed) = self.multiplicity();
    min == 1 && fixed
  }

  fn collect_symbols(&self, symbols: &mut Multiset<IString>) {
    match self {
      Expression::Symbol(symbol) => symbols.insert(symbol.name.clone()),
      Expression::Operation(operation) => {
        symbols.insert(operation.operator.name.clone());
        for operand in &operation.operands {
          operand.collect_symbols(symbols);
        }
      }
      _ => {}
    }
  }

  fn collect_variables(&self, variables: &mut Multiset<IString>) {
    match self {
      Expression::Variable(variable) => variables.insert(variable.name.clone()),
      Expression::Operation(operation) => {
        for operand in &operation.operands {
          operand.collect_variables(variables);
        }
      }
      _ => {}
    }
  }
}

// endregion Structural queries

// region Transformations

impl Expression {
  /// An equal tree with every constraint stripped.
  pub fn without_constraints(&self) -> RcExpression {
    match self {
      Expression::Symbol(symbol) => Rc::new(Expression::Symbol(symbol.clone())),
      Expression::Wildcard(wildcard) => Rc::new(Expression::Wildcard(Wildcard {
        min_count:  wildcard.min_count,
        fixed_size: wildcard.fixed_size,
        constraint: None,
      })),
      Expression::SymbolWildcard(wildcard) => Rc::new(Expression::SymbolWildcard(SymbolWildcard {
        class:      wildcard.class.clone(),
        constraint: None,
      })),
      Expression::Variable(variable) => Rc::new(Expression::Variable(Variable {
        name:       variable.name.clone(),
        inner:      variable.inner.without_constraints(),
        constraint: None,
      })),
      Expression::Operation(operation) => {
        let operands: Vec<RcExpression> = operation.operands.iter().map(|o| o.without_constraints()).collect();
        rebuild_operation(&operation.operator, operands, None)
      }
    }
  }

  /// Substitute variable names using `renaming`; unmapped names stay. Constraints are carried
  /// over unchanged — they are opaque and their variable sets are fixed at creation.
  pub fn with_renamed_vars(&self, renaming: &HashMap<IString, IString>) -> RcExpression {
    match self {
      Expression::Symbol(symbol) => Rc::new(Expression::Symbol(symbol.clone())),
      Expression::Wildcard(wildcard) => Rc::new(Expression::Wildcard(wildcard.clone())),
      Expression::SymbolWildcard(wildcard) => Rc::new(Expression::SymbolWildcard(wildcard.clone())),
      Expression::Variable(variable) => {
        let name = renaming.get(&variable.name).cloned().unwrap_or_else(|| variable.name.clone());
        Rc::new(Expression::Variable(Variable {
          name,
          inner: variable.inner.with_renamed_vars(renaming),
          constraint: variable.constraint.clone(),
        }))
      }
      Expression::Operation(operation) => {
        let operands: Vec<RcExpression> = operation.operands.iter().map(|o| o.with_renamed_vars(renaming)).collect();
        rebuild_operation(&operation.operator, operands, operation.constraint.clone())
      }
    }
  }

  /// A copy carrying `extra` conjoined with the existing constraint; `None` when this node kind
  /// cannot hold a constraint.
  fn with_merged_constraint(&self, extra: RcConstraint) -> Option<RcExpression> {
    match self {
      Expression::Symbol(_) => None,
      Expression::Operation(operation) => Some(Rc::new(Expression::Operation(Operation {
        operator:   operation.operator.clone(),
        operands:   operation.operands.clone(),
        constraint: merge_constraints(operation.constraint.clone(), Some(extra)),
        attributes: operation.attributes,
      }))),
      Expression::Wildcard(wildcard) => Some(Rc::new(Expression::Wildcard(Wildcard {
        min_count:  wildcard.min_count,
        fixed_size: wildcard.fixed_size,
        constraint: merge_constraints(wildcard.constraint.clone(), Some(extra)),
      }))),
      Expression::SymbolWildcard(wildcard) => Some(Rc::new(Expression::SymbolWildcard(SymbolWildcard {
        class:      wildcard.class.clone(),
        constraint: merge_constraints(wildcard.constraint.clone(), Some(extra)),
      }))),
      Expression::Variable(variable) => Some(Rc::new(Expression::Variable(Variable {
        name:       variable.name.clone(),
        inner:      variable.inner.clone(),
        constraint: merge_constraints(variable.constraint.clone(), Some(extra)),
      }))),
    }
  }
}

/// Renormalize a transformed operand list. Transformations of valid trees cannot introduce new
/// construction errors; if one slips through, the shape is preserved with refreshed attributes.
fn rebuild_operation(operator: &Operator, operands: Vec<RcExpression>, constraint: Option<RcConstraint>) -> RcExpression {
  match Operation::make(operator.clone(), operands.clone(), constraint.clone()) {
    Ok(expression) => expression,
    Err(_) => {
      let attributes = compute_attributes(operator, &operands);
      Rc::new(Expression::Operation(Operation {
        operator: operator.clone(),
        operands,
        constraint,
        attributes,
      }))
    }
  }
}

// endregion Transformations

// region Equality, hashing, and the total order

impl PartialEq for Expression {
  fn eq(&self, other: &Expression) -> bool {
    match (self, other) {
      (Expression::Symbol(left), Expression::Symbol(right)) => left == right,
      (Expression::Operation(left), Expression::Operation(right)) => {
        left.operator == right.operator
          && left.operands == right.operands
          && constraints_eq(&left.constraint, &right.constraint)
      }
      (Expression::Wildcard(left), Expression::Wildcard(right)) => {
        left.min_count == right.min_count
          && left.fixed_size == right.fixed_size
          && constraints_eq(&left.constraint, &right.constraint)
      }
      (Expression::SymbolWildcard(left), Expression::SymbolWildcard(right)) => {
        left.class == right.class && constraints_eq(&left.constraint, &right.constraint)
      }
      (Expression::Variable(left), Expression::Variable(right)) => {
        left.name == right.name && left.inner == right.inner && constraints_eq(&left.constraint, &right.constraint)
      }
      _ => false,
    }
  }
}

impl Eq for Expression {}

/// Consistent with equality; constraints do not contribute, which is sound because equal
/// expressions have equal constraint-free parts.
impl Hash for Expression {
  fn hash<H: Hasher>(&self, state: &mut H) {
    std::mem::discriminant(self).hash(state);
    match self {
      Expression::Symbol(symbol) => symbol.hash(state),
      Expression::Operation(operation) => {
        operation.operator.hash(state);
        operation.operands.hash(state);
      }
      Expression::Wildcard(wildcard) => {
        wildcard.min_count.hash(state);
        wildcard.fixed_size.hash(state);
      }
      Expression::SymbolWildcard(wildcard) => wildcard.class.hash(state),
      Expression::Variable(variable) => {
        variable.name.hash(state);
        variable.inner.hash(state);
      }
    }
  }
}

#[inline(always)]
fn kind_rank(expression: &Expression) -> u8 {
  match expression {
    Expression::Symbol(_) => 0,
    Expression::Variable(_) => 1,
    Expression::Wildcard(_) | Expression::SymbolWildcard(_) => 2,
    Expression::Operation(_) => 3,
  }
}

/// Sort key shared by the two wildcard kinds: least count first, fixed before non-fixed, plain
/// wildcards before symbol wildcards, then by class.
fn wildcard_rank(expression: &Expression) -> (usize, u8, u8, Option<&str>) {
  match expression {
    Expression::Wildcard(wildcard) => (wildcard.min_count, (!wildcard.fixed_size) as u8, 0, None),
    Expression::SymbolWildcard(wildcard) => (1, 0, 1, wildcard.class.as_deref()),
    _ => (0, 0, 0, None),
  }
}

/// The total order on expressions, used for commutative sorting and reproducible tie-breaks.
/// Constraints are ignored by the order.
impl Ord for Expression {
  fn cmp(&self, other: &Expression) -> Ordering {
    let by_kind = kind_rank(self).cmp(&kind_rank(other));
    if by_kind != Ordering::Equal {
      return by_kind;
    }

    match (self, other) {
      (Expression::Symbol(left), Expression::Symbol(right)) => left.compare(right),

      (Expression::Variable(left), Expression::Variable(right)) => left
        .inner
        .cmp(&right.inner)
        .then_with(|| (&*left.name).cmp(&*right.name)),

      (
        Expression::Wildcard(_) | Expression::SymbolWildcard(_),
        Expression::Wildcard(_) | Expression::SymbolWildcard(_),
      ) => wildcard_rank(self).cmp(&wildcard_rank(other)),

      (Expression::Operation(left), Expression::Operation(right)) => left
        .operator
        .compare(&right.operator)
        .then_with(|| left.operands.len().cmp(&right.operands.len()))
        .then_with(|| left.operands.cmp(&right.operands)),

      // Unreachable: the kind ranks already agreed.
      _ => Ordering::Equal,
    }
  }
}

impl PartialOrd for Expression {
  fn partial_cmp(&self, other: &Expression) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

// endregion Equality, hashing, and the total order

// region Display

impl Display for Expression {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Expression::Symbol(symbol) => write!(f, "{}", symbol),
      Expression::Operation(operation) => write!(f, "{}", operation),
      Expression::Wildcard(wildcard) => write!(f, "{}", wildcard),
      Expression::SymbolWildcard(wildcard) => write!(f, "{}", wildcard),
      Expression::Variable(variable) => write!(f, "{}{}", variable.name, variable.inner),
    }
  }
}

impl Display for Operation {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    if self.operator.is_infix() && self.operands.len() >= 2 {
      let separator = format!(" {} ", self.operator);
      write!(f, "({})", join_string(self.operands.iter(), &separator))
    } else {
      write!(f, "{}({})", self.operator, join_string(self.operands.iter(), ", "))
    }
  }
}

impl Display for Wildcard {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match (self.min_count, self.fixed_size) {
      (1, true) => write!(f, "_"),
      (1, false) => write!(f, "__"),
      (0, false) => write!(f, "___"),
      (count, true) => write!(f, "_[{}]", count),
      (count, false) => write!(f, "_[{}+]", count),
    }
  }
}

impl Display for SymbolWildcard {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match &self.class {
      None => write!(f, "_s"),
      Some(class) => write!(f, "_{}", class),
    }
  }
}

impl Debug for Expression {
  fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
    Display::fmt(self, f)
  }
}

// endregion Display

#[cfg(test)]
mod tests {
  use std::{
    collections::HashMap,
    hash::{DefaultHasher, Hasher},
  };

  use enumflags2::make_bitflags;

  use super::*;
  use crate::api::{
    error::{ErrorKind, ExpressionError},
    operator::OperatorAttribute,
    test_fixtures::*,
    Arity,
  };

  fn hash_of(expression: &RcExpression) -> u64 {
    let mut hasher = DefaultHasher::new();
    expression.hash(&mut hasher);
    hasher.finish()
  }

  // region Normalization

  #[test]
  fn one_identity_collapses_single_term_operands() {
    let f_i = f_i();
    assert_eq!(apply(&f_i, vec![a()]), a());
    assert_eq!(apply(&f_i, vec![dot()]), dot());
    assert_eq!(apply(&f_i, vec![x_()]), x_());
    assert_eq!(apply(&f_i, vec![_s()]), _s());
  }

  #[test]
  fn one_identity_keeps_sequence_operands_wrapped() {
    let f_i = f_i();
    for operand in [plus(), star(), x__(), x___()] {
      let kept = apply(&f_i, vec![operand.clone()]);
      match &*kept {
        Expression::Operation(operation) => assert_eq!(operation.operands, vec![operand]),
        other => panic!("expected an operation, got {}", other),
      }
    }
    // Multiple operands never collapse.
    let kept = apply(&f_i, vec![a(), b()]);
    assert!(matches!(&*kept, Expression::Operation(_)));
  }

  #[test]
  fn one_identity_collapse_absorbs_the_constraint() {
    let verdict = accepting();
    let collapsed = f_i().apply_constrained(vec![x_()], Some(verdict.clone())).unwrap();
    match &*collapsed {
      Expression::Variable(variable) => {
        assert!(variable.constraint.is_some());
        assert_eq!(variable.name, name("x"));
      }
      other => panic!("expected the variable, got {}", other),
    }
  }

  #[test]
  fn one_identity_collapse_never_drops_a_constraint() {
    // A symbol cannot carry the constraint, so the application stays.
    let kept = f_i().apply_constrained(vec![a()], Some(accepting())).unwrap();
    assert!(matches!(&*kept, Expression::Operation(operation) if operation.operands == vec![a()]));
  }

  #[test]
  fn associative_children_are_flattened() {
    let f_a = f_a();
    assert_eq!(apply(&f_a, vec![apply(&f_a, vec![a()])]), apply(&f_a, vec![a()]));
    assert_eq!(apply(&f_a, vec![apply(&f_a, vec![a(), b()])]), apply(&f_a, vec![a(), b()]));
    assert_eq!(apply(&f_a, vec![a(), apply(&f_a, vec![b()])]), apply(&f_a, vec![a(), b()]));
    assert_eq!(apply(&f_a, vec![apply(&f_a, vec![a()]), b()]), apply(&f_a, vec![a(), b()]));

    // A different operator does not splice.
    let nested = apply(&f_a, vec![apply(&f(), vec![a()])]);
    match &*nested {
      Expression::Operation(operation) => assert_eq!(operation.operands.len(), 1),
      other => panic!("expected an operation, got {}", other),
    }
  }

  #[test]
  fn commutative_operands_are_sorted() {
    assert_eq!(apply(&f_c(), vec![b(), a()]), apply(&f_c(), vec![a(), b()]));

    let sorted = apply(&f_c(), vec![x_(), b(), apply(&f(), vec![a()]), a()]);
    match &*sorted {
      Expression::Operation(operation) => {
        // Symbols, then variables, then operations.
        assert_eq!(operation.operands, vec![a(), b(), x_(), apply(&f(), vec![a()])]);
      }
      other => panic!("expected an operation, got {}", other),
    }
  }

  #[test]
  fn flattening_merges_the_spliced_constraint() {
    let first = accepting();
    let second = accepting();
    let f_a = f_a();

    let child = f_a.apply_constrained(vec![b()], Some(first.clone())).unwrap();
    let spliced = f_a.apply(vec![a(), child.clone()]).unwrap();
    assert_eq!(spliced, f_a.apply_constrained(vec![a(), b()], Some(first.clone())).unwrap());

    let both = f_a.apply_constrained(vec![a(), child], Some(second.clone())).unwrap();
    let expected = f_a
        .apply_constrained(vec![a(), b()], MultiConstraint::create([first, second]))
        .unwrap();
    assert_eq!(both, expected);
  }

  #[test]
  fn construction_is_idempotent_on_normalized_children() {
    let once = apply(&f_ac(), vec![b(), a(), apply(&f_ac(), vec![c(), a()])]);
    match &*once {
      Expression::Operation(operation) => {
        let again = Operation::make(operation.operator.clone(), operation.operands.clone(), operation.constraint.clone())
            .unwrap();
        assert_eq!(once, again);
      }
      other => panic!("expected an operation, got {}", other),
    }
  }

  // endregion Normalization

  // region Construction errors

  #[test]
  fn arity_violations_are_value_errors() {
    let unary = Operator::new("u", Arity::UNARY).unwrap();
    for operands in [vec![], vec![a(), b()]] {
      let error = unary.apply(operands).unwrap_err();
      assert!(matches!(error, ExpressionError::ArityMismatch { .. }));
      assert_eq!(error.kind(), ErrorKind::Value);
    }
    assert!(unary.apply(vec![a()]).is_ok());

    let variadic = f();
    for operands in [vec![], vec![a()], vec![a(), b()]] {
      assert!(variadic.apply(operands).is_ok());
    }

    let binary_associative =
      Operator::with_attributes("g", Arity::BINARY, make_bitflags!(OperatorAttribute::{Associative})).unwrap();
    assert!(binary_associative.apply(vec![a(), a(), b()]).is_err());
    assert!(binary_associative.apply(vec![a(), b()]).is_ok());
  }

  #[test]
  fn wildcards_widen_the_acceptable_count() {
    let binary = Operator::new("g", Arity::BINARY).unwrap();
    assert!(binary.apply(vec![x_(), x_()]).is_ok());
    // One dot plus a star can still make two operands.
    assert!(binary.apply(vec![y_(), x___()]).is_ok());
    // Three fixed-size operands cannot.
    assert!(binary.apply(vec![x_(), y_(), a()]).is_err());
  }

  #[test]
  fn conflicting_wildcard_classes_are_rejected_on_fixed_arity() {
    let binary = Operator::new("g", Arity::BINARY).unwrap();
    let error = binary.apply(vec![x_(), x___()]).unwrap_err();
    assert!(matches!(error, ExpressionError::ConflictingVariableClasses { .. }));
    assert_eq!(error.kind(), ErrorKind::Value);

    // The same shapes are fine on a variadic operator, and same-class repetition is fine
    // anywhere.
    assert!(f().apply(vec![x_(), x___()]).is_ok());
    assert!(binary.apply(vec![x_(), x_()]).is_ok());
  }

  #[test]
  fn wildcard_parameters_are_validated() {
    let error = Wildcard::new(0, true).unwrap_err();
    assert!(matches!(error, ExpressionError::InvalidWildcard { .. }));
    assert_eq!(error.kind(), ErrorKind::Value);

    assert!(Wildcard::new(0, false).is_ok());
    assert!(Wildcard::new(3, true).is_ok());
  }

  #[test]
  fn variables_wrap_only_wildcards() {
    assert!(matches!(
      Variable::new("x", a(), None),
      Err(ExpressionError::VariableOverNonWildcard { .. })
    ));
    assert!(matches!(
      Variable::new("x", Variable::fixed("y", 2).unwrap(), None),
      Err(ExpressionError::VariableOverNonWildcard { .. })
    ));
    assert!(matches!(
      Variable::new("x", apply(&f(), vec![dot()]), None),
      Err(ExpressionError::VariableOverNonWildcard { .. })
    ));

    assert!(Variable::new("x", Wildcard::dot(), None).is_ok());
    assert!(Variable::new("x", SymbolWildcard::any(), None).is_ok());
  }

  // endregion Construction errors

  // region Derived attributes

  #[test]
  fn constantness_means_no_wildcards_anywhere() {
    for (expression, expected) in [
      (a(), true),
      (x_(), false),
      (dot(), false),
      (apply(&f(), vec![a()]), true),
      (apply(&f(), vec![a(), b()]), true),
      (apply(&f(), vec![x_()]), false),
    ] {
      assert_eq!(expression.is_constant(), expected, "for {}", expression);
    }
  }

  #[test]
  fn syntacticness_excludes_sequences_and_axioms() {
    for (expression, expected) in [
      (a(), true),
      (x_(), true),
      (dot(), true),
      (x___(), false),
      (star(), false),
      (x__(), false),
      (plus(), false),
      (apply(&f(), vec![a(), b()]), true),
      (apply(&f(), vec![x_()]), true),
      (apply(&f(), vec![x__()]), false),
      (apply(&f_a(), vec![a()]), false),
      (apply(&f_a(), vec![x_()]), false),
      (apply(&f_c(), vec![a(), b()]), false),
      (apply(&f_ac(), vec![x__()]), false),
    ] {
      assert_eq!(expression.is_syntactic(), expected, "for {}", expression);
    }
  }

  #[test]
  fn linearity_means_no_repeated_names() {
    for (expression, expected) in [
      (a(), true),
      (x_(), true),
      (apply(&f(), vec![x_()]), true),
      (apply(&f(), vec![x_(), x_()]), false),
      (apply(&f(), vec![x_(), y_()]), true),
      (apply(&f(), vec![x_(), dot()]), true),
      (apply(&f(), vec![dot(), dot()]), true),
      (apply(&f(), vec![x_(), apply(&f(), vec![x_()])]), false),
      (apply(&f(), vec![x_(), a(), apply(&f(), vec![x_()])]), false),
    ] {
      assert_eq!(expression.is_linear(), expected, "for {}", expression);
    }
  }

  #[test]
  fn symbols_count_heads_and_leaves() {
    let expression = apply(&f(), vec![apply(&f(), vec![a()]), apply(&f(), vec![b(), c()])]);
    let expected: Multiset<IString> = ["f", "f", "f", "a", "b", "c"].into_iter().map(IString::from).collect();
    assert_eq!(expression.symbols(), expected);

    assert!(x_().symbols().is_empty());
    assert_eq!(apply(&f(), vec![x_()]).symbols(), [IString::from("f")].into_iter().collect());
  }

  #[test]
  fn variables_count_every_occurrence() {
    let expression = apply(&f(), vec![apply(&f(), vec![x_()]), apply(&f(), vec![b(), x_()])]);
    let expected: Multiset<IString> = ["x", "x"].into_iter().map(IString::from).collect();
    assert_eq!(expression.variables(), expected);

    assert!(a().variables().is_empty());
    assert!(dot().variables().is_empty());
    assert_eq!(
      apply(&f(), vec![x_(), a(), y_()]).variables(),
      ["x", "y"].into_iter().map(IString::from).collect()
    );
  }

  // endregion Derived attributes

  // region Order, equality, hashing

  #[test]
  fn the_total_order_ranks_kinds_then_details() {
    let pairs = [
      // Within symbols: by name.
      (a(), b()),
      // Symbols before variables before wildcards before operations.
      (a(), x_()),
      (x_(), dot()),
      (a(), dot()),
      (a(), apply(&f(), vec![a()])),
      (x_(), apply(&f(), vec![a()])),
      (dot(), apply(&f(), vec![a()])),
      // Variables: by inner wildcard, then name.
      (x_(), y_()),
      (x_(), x__()),
      // Wildcards: by count, fixed first.
      (dot(), plus()),
      (star(), dot()),
      // Operations: by name, then operand count, then operands.
      (apply(&f(), vec![a()]), apply(&f(), vec![b()])),
      (apply(&f(), vec![b()]), apply(&f(), vec![a(), a()])),
      (apply(&f(), vec![a(), a()]), apply(&f(), vec![a(), b()])),
    ];
    for (smaller, bigger) in pairs {
      assert!(smaller < bigger, "{} < {} should hold", smaller, bigger);
      assert!(!(bigger < smaller), "{} < {} should not hold", bigger, smaller);
    }

    for expression in [a(), x_(), dot(), apply(&f(), vec![a()])] {
      assert!(!(expression < expression.clone()), "{} is not below itself", expression);
    }
  }

  #[test]
  fn equal_expressions_hash_equal() {
    let expressions = [
      a(),
      b(),
      apply(&f(), vec![a(), b()]),
      x_(),
      x__(),
      star(),
      dot(),
      s_(),
      _s(),
      apply(&f_c(), vec![a(), b()]),
    ];
    for left in &expressions {
      for right in &expressions {
        if left == right {
          assert_eq!(hash_of(left), hash_of(right), "hash({}) != hash({})", left, right);
        } else {
          assert_ne!(hash_of(left), hash_of(right), "hash({}) == hash({})", left, right);
        }
      }
    }
  }

  #[test]
  fn normalized_forms_are_equal_and_hash_equal() {
    let left = apply(&f_c(), vec![b(), a()]);
    let right = apply(&f_c(), vec![a(), b()]);
    assert_eq!(left, right);
    assert_eq!(hash_of(&left), hash_of(&right));
  }

  #[test]
  fn clones_are_equal() {
    for expression in [a(), apply(&f(), vec![a(), b()]), x___(), _s()] {
      let copied = Rc::new((*expression).clone());
      assert_eq!(expression, copied);
      assert!(!Rc::ptr_eq(&expression, &copied));
    }
  }

  // endregion Order, equality, hashing

  // region Transformations

  #[test]
  fn without_constraints_strips_recursively() {
    let verdict = accepting();
    let constrained_x = Variable::new("x", Wildcard::dot(), Some(verdict.clone())).unwrap();

    for (expression, expected) in [
      (a(), a()),
      (x_(), x_()),
      (constrained_x.clone(), x_()),
      (
        SymbolWildcard::with_constraint(None, Some(verdict.clone())).unwrap(),
        SymbolWildcard::any(),
      ),
      (f().apply_constrained(vec![a()], Some(verdict.clone())).unwrap(), apply(&f(), vec![a()])),
      (apply(&f(), vec![constrained_x.clone()]), apply(&f(), vec![x_()])),
      (
        f().apply_constrained(vec![constrained_x], Some(verdict)).unwrap(),
        apply(&f(), vec![x_()]),
      ),
    ] {
      assert_eq!(expression.without_constraints(), expected);
    }
  }

  #[test]
  fn renaming_substitutes_variable_names() {
    let rename_x: HashMap<IString, IString> = [(name("x"), name("y"))].into_iter().collect();
    let empty: HashMap<IString, IString> = HashMap::new();

    assert_eq!(a().with_renamed_vars(&empty), a());
    assert_eq!(a().with_renamed_vars(&rename_x), a());
    assert_eq!(x_().with_renamed_vars(&empty), x_());
    assert_eq!(x_().with_renamed_vars(&rename_x), y_());
    assert_eq!(SymbolWildcard::any().with_renamed_vars(&rename_x), SymbolWildcard::any());
    assert_eq!(apply(&f(), vec![x_()]).with_renamed_vars(&rename_x), apply(&f(), vec![y_()]));
  }

  #[test]
  fn renaming_keeps_constraints() {
    let verdict = accepting();
    let rename_x: HashMap<IString, IString> = [(name("x"), name("y"))].into_iter().collect();

    let constrained = Variable::new("x", Wildcard::dot(), Some(verdict.clone())).unwrap();
    let renamed = constrained.with_renamed_vars(&rename_x);
    assert_eq!(renamed, Variable::new("y", Wildcard::dot(), Some(verdict.clone())).unwrap());

    let operation = f().apply_constrained(vec![x_()], Some(verdict.clone())).unwrap();
    assert_eq!(
      operation.with_renamed_vars(&rename_x),
      f().apply_constrained(vec![y_()], Some(verdict)).unwrap()
    );
  }

  #[test]
  fn renaming_restores_commutative_order() {
    // Renaming x to z moves the variable after y in the total order.
    let rename: HashMap<IString, IString> = [(name("x"), name("z"))].into_iter().collect();
    let expression = apply(&f_c(), vec![x_(), y_()]);
    let renamed = expression.with_renamed_vars(&rename);
    match &*renamed {
      Expression::Operation(operation) => {
        assert_eq!(operation.operands, vec![y_(), Variable::dot("z").unwrap()]);
      }
      other => panic!("expected an operation, got {}", other),
    }
  }

  // endregion Transformations

  // region Display

  #[test]
  fn rendering_follows_the_wildcard_conventions() {
    assert_eq!(a().to_string(), "a");
    assert_eq!(apply(&f(), vec![a(), b()]).to_string(), "f(a, b)");
    assert_eq!(dot().to_string(), "_");
    assert_eq!(plus().to_string(), "__");
    assert_eq!(star().to_string(), "___");
    assert_eq!(x_().to_string(), "x_");
    assert_eq!(x__().to_string(), "x__");
    assert_eq!(x___().to_string(), "x___");
    assert_eq!(Variable::fixed("x", 2).unwrap().to_string(), "x_[2]");
    assert_eq!(_s().to_string(), "_special");
    assert_eq!(s_().to_string(), "s_special");
  }

  #[test]
  fn infix_operators_render_between_operands() {
    let joined = Operator::with_attributes("plus", Arity::VARIADIC, make_bitflags!(OperatorAttribute::{Infix})).unwrap();
    assert_eq!(joined.apply(vec![a(), b(), c()]).unwrap().to_string(), "(a plus b plus c)");
    assert_eq!(joined.apply(vec![a()]).unwrap().to_string(), "plus(a)");
  }

  // endregion Display
}
