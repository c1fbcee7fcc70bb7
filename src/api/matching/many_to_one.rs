/*!

The many-to-one matcher: a discrimination net compiled from a set of patterns.

A discrimination net is a data structure that optimizes matching many patterns at once. Each
pattern compiles to a linear trace of tokens — its preorder traversal with explicit operation
brackets — and the traces are merged into a trie. Subjects walk the trie once; a prefix shared
by many patterns is tested once instead of once per pattern. Internal states carry the
transitions still possible; accepting states carry the set of pattern indices whose trace ends
there.

Two pattern shapes keep the walk from being a plain deterministic scan. Wildcard tokens branch
over the number of subject terms they span, enumerated lazily exactly as the sequence matcher
does. Commutative subpatterns compile to a single opaque token holding the subpattern — states
under a commutative operator would not share profitably, so commutative matching runs per
accepting branch by delegating to the commutative matcher.

Matching walks the subject with an explicit frame stack (one operand cursor per operation
level) and produces a lazy stream of (pattern, substitution) pairs. Each pattern's constraints
are checked when its accepting state is reached.

*/

use std::rc::Rc;

use crate::{
  abstractions::{IString, NatSet},
  api::{
    constraint::{is_ready, RcConstraint},
    error::MatchError,
    expression::{Expression, RcExpression},
    matching::{
      commutative::{match_commutative, symbol_of_class},
      one_to_one::{collect_constraints, ensure_supported},
      PatternMatchIterator,
    },
    operator::Operator,
    substitution::{Binding, Substitution},
    symbol::Symbol,
  },
  debug,
};

// region Compilation

/// One step of a pattern's preorder trace.
#[derive(Clone, PartialEq)]
enum Token {
  /// Exactly this symbol.
  Symbol(Symbol),
  /// Any symbol of the class.
  AnySymbol(Option<IString>),
  /// Enter a non-commutative operation with this operator.
  Open(Operator),
  /// Leave the current operation; the operand cursor must be exhausted.
  Close,
  /// One subject term; `wrap` lets the span grow under an associative parent, binding the
  /// operator-wrapped span.
  Single { wrap: bool },
  /// Exactly this many terms, bound as an ordered sequence.
  Fixed(usize),
  /// At least `min` terms, bound as an ordered sequence.
  Sequence { min: usize },
  /// An entire commutative subpattern, held in the net's subproblem table.
  Commutative(usize),
}

#[derive(Clone, PartialEq)]
struct Edge {
  token:   Token,
  /// The variable name capturing this token's span, if any.
  capture: Option<IString>,
}

#[derive(Clone, Default)]
struct State {
  transitions: Vec<(Edge, usize)>,
  /// Patterns whose trace ends here.
  accepts:     NatSet,
}

#[derive(Clone)]
struct Net {
  states:      Vec<State>,
  /// Commutative subpatterns referenced by `Token::Commutative`.
  subproblems: Vec<RcExpression>,
  patterns:    Vec<RcExpression>,
  /// Per pattern, its constraints in preorder.
  constraints: Vec<Rc<Vec<RcConstraint>>>,
}

/// Compiles patterns into a discrimination net and streams every (pattern, substitution) match
/// for a subject. The net is built once and is read-only during matching.
pub struct ManyToOneMatcher {
  net: Rc<Net>,
}

impl ManyToOneMatcher {
  pub fn new(patterns: impl IntoIterator<Item = RcExpression>) -> Result<ManyToOneMatcher, MatchError> {
    let mut matcher = ManyToOneMatcher {
      net: Rc::new(Net {
        states:      vec![State::default()],
        subproblems: Vec::new(),
        patterns:    Vec::new(),
        constraints: Vec::new(),
      }),
    };
    for pattern in patterns {
      matcher.add(pattern)?;
    }
    Ok(matcher)
  }

  /// Insert another pattern, returning its index. Rejects the unsupported commutative shape.
  pub fn add(&mut self, pattern: RcExpression) -> Result<usize, MatchError> {
    ensure_supported(&pattern)?;

    let net = Rc::make_mut(&mut self.net);
    let index = net.patterns.len();

    let mut trace = Vec::new();
    compile(&pattern, false, &mut net.subproblems, &mut trace, None);

    let mut state = 0;
    for edge in trace {
      let existing = net.states[state]
          .transitions
          .iter()
          .find(|(known, _)| *known == edge)
          .map(|(_, next)| *next);
      state = match existing {
        Some(next) => next,
        None => {
          let next = net.states.len();
          net.states.push(State::default());
          net.states[state].transitions.push((edge, next));
          next
        }
      };
    }
    net.states[state].accepts.insert(index);

    net.constraints.push(Rc::new(collect_constraints(&pattern)));
    net.patterns.push(pattern);
    debug!(
      2,
      "discrimination net holds {} patterns in {} states",
      net.patterns.len(),
      net.states.len()
    );
    Ok(index)
  }

  pub fn patterns(&self) -> &[RcExpression] {
    &self.net.patterns
  }

  /// Every (pattern, substitution) pair matching `subject`, lazily.
  pub fn match_(&self, subject: &RcExpression) -> PatternMatchIterator {
    let net = self.net.clone();
    let stack = vec![Frame {
      operator: None,
      items:    Rc::new(vec![subject.clone()]),
      cursor:   0,
    }];
    let emitting = net.clone();
    Box::new(
      walk(net, 0, stack, Substitution::new())
          .map(move |(pattern, substitution)| (emitting.patterns[pattern].clone(), substitution)),
    )
  }

  #[cfg(test)]
  pub(crate) fn state_count(&self) -> usize {
    self.net.states.len()
  }
}

/// Append `pattern`'s trace to `trace`. `parent_associative` governs whether dot-class
/// wildcards may flex; `capture` is the name of the enclosing variable, if any.
fn compile(
  pattern: &RcExpression,
  parent_associative: bool,
  subproblems: &mut Vec<RcExpression>,
  trace: &mut Vec<Edge>,
  capture: Option<IString>,
) {
  match &**pattern {
    Expression::Symbol(symbol) => trace.push(Edge {
      token: Token::Symbol(symbol.clone()),
      capture,
    }),

    Expression::SymbolWildcard(wildcard) => trace.push(Edge {
      token: Token::AnySymbol(wildcard.class.clone()),
      capture,
    }),

    Expression::Wildcard(wildcard) => {
      let token = if wildcard.fixed_size && wildcard.min_count == 1 {
        Token::Single { wrap: parent_associative }
      } else if wildcard.fixed_size {
        Token::Fixed(wildcard.min_count)
      } else {
        Token::Sequence { min: wildcard.min_count }
      };
      trace.push(Edge { token, capture });
    }

    Expression::Variable(variable) => {
      compile(&variable.inner, parent_associative, subproblems, trace, Some(variable.name.clone()));
    }

    Expression::Operation(operation) => {
      if operation.operator.is_commutative() {
        let index = match subproblems.iter().position(|known| known == pattern) {
          Some(index) => index,
          None => {
            subproblems.push(pattern.clone());
            subproblems.len() - 1
          }
        };
        trace.push(Edge {
          token: Token::Commutative(index),
          capture,
        });
      } else {
        trace.push(Edge {
          token: Token::Open(operation.operator.clone()),
          capture,
        });
        for operand in &operation.operands {
          compile(operand, operation.operator.is_associative(), subproblems, trace, None);
        }
        trace.push(Edge {
          token:   Token::Close,
          capture: None,
        });
      }
    }
  }
}

// endregion Compilation

// region Matching

/// One operation level of the subject: its operand list and how far the walk has consumed it.
#[derive(Clone)]
struct Frame {
  /// The operator of this level; `None` at the root pseudo-level.
  operator: Option<Operator>,
  items:    Rc<Vec<RcExpression>>,
  cursor:   usize,
}

type WalkIter = Box<dyn Iterator<Item = (usize, Substitution)>>;

fn no_walks() -> WalkIter {
  Box::new(std::iter::empty())
}

/// The lazy walk: accept at this state if the subject is consumed, then try every transition.
fn walk(net: Rc<Net>, state: usize, stack: Vec<Frame>, substitution: Substitution) -> WalkIter {
  let consumed = stack.len() == 1 && stack[0].cursor == stack[0].items.len();

  let accepted: WalkIter = if consumed && !net.states[state].accepts.is_empty() {
    let accepts: Vec<usize> = net.states[state].accepts.iter().collect();
    let net = net.clone();
    let substitution = substitution.clone();
    Box::new(accepts.into_iter().filter_map(move |pattern| {
      let passes = net.constraints[pattern]
          .iter()
          .all(|constraint| !is_ready(constraint, &substitution) || constraint.check(&substitution));
      passes.then(|| (pattern, substitution.clone()))
    }))
  } else {
    no_walks()
  };

  let transitions = net.states[state].transitions.clone();
  let explored = transitions
      .into_iter()
      .flat_map(move |(edge, next)| step(net.clone(), next, edge, &stack, &substitution));

  Box::new(accepted.chain(explored))
}

/// Try one edge against the current subject cursor.
fn step(net: Rc<Net>, next: usize, edge: Edge, stack: &[Frame], substitution: &Substitution) -> WalkIter {
  let Some(frame) = stack.last() else {
    return no_walks();
  };

  match &edge.token {
    Token::Close => {
      // Leave the level only once it is fully consumed.
      if frame.cursor != frame.items.len() || stack.len() < 2 {
        return no_walks();
      }
      let mut popped = stack.to_vec();
      popped.pop();
      if let Some(parent) = popped.last_mut() {
        parent.cursor += 1;
      }
      walk(net, next, popped, substitution.clone())
    }

    Token::Symbol(symbol) => {
      let Some(subject) = frame.items.get(frame.cursor) else {
        return no_walks();
      };
      if !matches!(&**subject, Expression::Symbol(other) if other == symbol) {
        return no_walks();
      }
      advance(net, next, stack, substitution.clone(), 1, None)
    }

    Token::AnySymbol(class) => {
      let Some(subject) = frame.items.get(frame.cursor) else {
        return no_walks();
      };
      if !symbol_of_class(subject, class) {
        return no_walks();
      }
      let binding = edge.capture.map(|name| (name, Binding::Single(subject.clone())));
      advance(net, next, stack, substitution.clone(), 1, binding)
    }

    Token::Open(operator) => {
      let Some(subject) = frame.items.get(frame.cursor) else {
        return no_walks();
      };
      let Expression::Operation(operation) = &**subject else {
        return no_walks();
      };
      if operation.operator != *operator {
        return no_walks();
      }
      let mut pushed = stack.to_vec();
      pushed.push(Frame {
        operator: Some(operator.clone()),
        items:    Rc::new(operation.operands.clone()),
        cursor:   0,
      });
      walk(net, next, pushed, substitution.clone())
    }

    Token::Single { wrap } => {
      let remaining = frame.items.len() - frame.cursor;
      if remaining < 1 {
        return no_walks();
      }
      let longest = if *wrap { remaining } else { 1 };
      let net = net.clone();
      let stack = stack.to_vec();
      let substitution = substitution.clone();
      let capture = edge.capture.clone();
      Box::new((1..=longest).flat_map(move |span| {
        let frame = &stack[stack.len() - 1];
        let binding = match &capture {
          None => None,
          Some(name) => {
            if span == 1 {
              Some((name.clone(), Binding::Single(frame.items[frame.cursor].clone())))
            } else {
              // Multi-term span under an associative parent: wrap in the operator.
              let Some(operator) = &frame.operator else {
                return no_walks();
              };
              let span_items = frame.items[frame.cursor..frame.cursor + span].to_vec();
              match operator.apply(span_items) {
                Ok(wrapped) => Some((name.clone(), Binding::Single(wrapped))),
                Err(_) => return no_walks(),
              }
            }
          }
        };
        advance(net.clone(), next, &stack, substitution.clone(), span, binding)
      }))
    }

    Token::Fixed(count) => {
      let remaining = frame.items.len() - frame.cursor;
      if remaining < *count {
        return no_walks();
      }
      let span_items = frame.items[frame.cursor..frame.cursor + count].to_vec();
      let binding = edge.capture.map(|name| (name, Binding::Sequence(span_items)));
      advance(net, next, stack, substitution.clone(), *count, binding)
    }

    Token::Sequence { min } => {
      let remaining = frame.items.len() - frame.cursor;
      if remaining < *min {
        return no_walks();
      }
      let min = *min;
      let net = net.clone();
      let stack = stack.to_vec();
      let substitution = substitution.clone();
      let capture = edge.capture.clone();
      Box::new((min..=remaining).flat_map(move |span| {
        let frame = &stack[stack.len() - 1];
        let binding = capture.as_ref().map(|name| {
          let span_items = frame.items[frame.cursor..frame.cursor + span].to_vec();
          (name.clone(), Binding::Sequence(span_items))
        });
        advance(net.clone(), next, &stack, substitution.clone(), span, binding)
      }))
    }

    Token::Commutative(index) => {
      let Some(subject) = frame.items.get(frame.cursor) else {
        return no_walks();
      };
      let Expression::Operation(operation) = &**subject else {
        return no_walks();
      };
      let Expression::Operation(subpattern) = &*net.subproblems[*index] else {
        return no_walks();
      };
      if operation.operator != subpattern.operator {
        return no_walks();
      }

      let solutions = match_commutative(&subpattern.operands, &operation.operands, substitution, &subpattern.operator);
      let net = net.clone();
      let stack = stack.to_vec();
      Box::new(solutions.flat_map(move |solved| advance(net.clone(), next, &stack, solved, 1, None)))
    }
  }
}

/// Consume `span` items at the current level, apply the capture, and continue the walk.
fn advance(
  net: Rc<Net>,
  next: usize,
  stack: &[Frame],
  substitution: Substitution,
  span: usize,
  binding: Option<(IString, Binding)>,
) -> WalkIter {
  let mut extended = substitution;
  if let Some((name, value)) = binding {
    if !extended.try_add(name, value) {
      return no_walks();
    }
  }
  let mut advanced = stack.to_vec();
  if let Some(frame) = advanced.last_mut() {
    frame.cursor += span;
  }
  walk(net, next, advanced, extended)
}

// endregion Matching
