/*!

Position paths and preorder traversal. A position is the sequence of child indices leading from
the root to a subterm; the empty position is the root itself. An operation's children are its
operands, and a variable's only child (index 0) is its inner wildcard.

The iterator keeps an explicit stack of pending subtrees rather than recursing, so traversal is
lazy and can be abandoned at any point.

*/

use smallvec::SmallVec;

use crate::api::{
  error::PositionError,
  expression::{Expression, RcExpression},
};

/// A path of child indices from the root. Small paths stay inline.
pub type Position = SmallVec<[usize; 8]>;

impl Expression {
  /// The direct children of this node.
  pub fn children(&self) -> &[RcExpression] {
    match self {
      Expression::Operation(operation) => &operation.operands,
      Expression::Variable(variable) => std::slice::from_ref(&variable.inner),
      _ => &[],
    }
  }

  /// The subterm at `position`, or an error when the path leaves the tree.
  pub fn subexpression(&self, position: &[usize]) -> Result<&Expression, PositionError> {
    let mut current: &Expression = self;
    for &index in position {
      current = match current.children().get(index) {
        Some(child) => child,
        None => {
          return Err(PositionError::OutOfRange {
            position: position.to_vec(),
          })
        }
      };
    }
    Ok(current)
  }

  /// Lazy preorder traversal yielding every subterm with its position.
  pub fn preorder_iter(&self) -> PreorderIter<'_> {
    PreorderIter {
      stack: vec![(self, Position::new())],
    }
  }

  /// Preorder traversal filtered by a predicate. Non-matching subtrees are still descended
  /// into; the predicate only filters what is yielded.
  pub fn preorder_iter_filtered<'a, P>(&'a self, predicate: P) -> impl Iterator<Item = (&'a Expression, Position)>
  where
    P: Fn(&Expression) -> bool + 'a,
  {
    self.preorder_iter().filter(move |(expression, _)| predicate(expression))
  }
}

pub struct PreorderIter<'a> {
  stack: Vec<(&'a Expression, Position)>,
}

impl<'a> Iterator for PreorderIter<'a> {
  type Item = (&'a Expression, Position);

  fn next(&mut self) -> Option<Self::Item> {
    let (expression, position) = self.stack.pop()?;
    for (index, child) in expression.children().iter().enumerate().rev() {
      let mut child_position = position.clone();
      child_position.push(index);
      self.stack.push((child, child_position));
    }
    Some((expression, position))
  }
}

#[cfg(test)]
mod tests {
  use smallvec::smallvec;

  use super::*;
  use crate::api::{
    expression::Head,
    test_fixtures::{a, apply, b, dot, f, x_},
  };

  // f(a, f(x_, b), _)
  fn indexed_expression() -> RcExpression {
    let f = f();
    let inner = apply(&f, vec![x_(), b()]);
    apply(&f, vec![a(), inner, dot()])
  }

  #[test]
  fn subexpression_by_position() {
    let expression = indexed_expression();
    let f = f();
    assert_eq!(*expression.subexpression(&[]).unwrap(), *expression);
    assert_eq!(*expression.subexpression(&[0]).unwrap(), *a());
    assert_eq!(*expression.subexpression(&[1]).unwrap(), *apply(&f, vec![x_(), b()]));
    assert_eq!(*expression.subexpression(&[1, 0]).unwrap(), *x_());
    // A variable's inner wildcard is its child 0.
    assert_eq!(*expression.subexpression(&[1, 0, 0]).unwrap(), *dot());
    assert_eq!(*expression.subexpression(&[1, 1]).unwrap(), *b());
    assert_eq!(*expression.subexpression(&[2]).unwrap(), *dot());
  }

  #[test]
  fn subexpression_rejects_bad_positions() {
    let expression = indexed_expression();
    for position in [vec![0, 0], vec![1, 0, 1], vec![1, 1, 0], vec![1, 2], vec![3]] {
      assert!(expression.subexpression(&position).is_err(), "position {:?} should fail", position);
    }
  }

  #[test]
  fn preorder_yields_positions() {
    // f(a, x_)
    let expression = apply(&f(), vec![a(), x_()]);
    let visited: Vec<(String, Position)> = expression
        .preorder_iter()
        .map(|(subterm, position)| (subterm.to_string(), position))
        .collect();

    let expected: Vec<(String, Position)> = vec![
      ("f(a, x_)".into(), smallvec![]),
      ("a".into(), smallvec![0]),
      ("x_".into(), smallvec![1]),
      ("_".into(), smallvec![1, 0]),
    ];
    assert_eq!(visited, expected);
  }

  #[test]
  fn filtered_preorder_descends_everywhere() {
    // f(a, f(x_))
    let f = f();
    let expression = apply(&f, vec![a(), apply(&f, vec![x_()])]);

    // Headless subterms: the variable and its wildcard, both inside the inner operation.
    let headless: Vec<Position> = expression
        .preorder_iter_filtered(|subterm| subterm.head().is_none())
        .map(|(_, position)| position)
        .collect();
    let expected_headless: Vec<Position> = vec![smallvec![1, 0], smallvec![1, 0, 0]];
    assert_eq!(headless, expected_headless);

    // Subterms headed by `f`.
    let f_headed: Vec<Position> = expression
        .preorder_iter_filtered(|subterm| matches!(subterm.head(), Some(Head::Operator(op)) if *op == f))
        .map(|(_, position)| position)
        .collect();
    let expected_f_headed: Vec<Position> = vec![smallvec![], smallvec![1]];
    assert_eq!(f_headed, expected_f_headed);
  }
}
