/*!

The matchers. `match_` answers "in how many ways does this one pattern match this subject?";
[`ManyToOneMatcher`] compiles a whole pattern set into a discrimination net and answers the same
question for every pattern at once, sharing the work their common structure allows.

Matching is exposed as lazy pull-based iterators of substitutions: callers pull results one at a
time, the matcher retains only the enumeration cursors needed to resume, and dropping the
iterator abandons the rest of the search. Nothing here ever errors on "no match" — that is an
empty iterator. The single matching error, raised before enumeration begins, is the documented
unsupported commutative pattern shape.

*/

mod commutative;
mod many_to_one;
mod one_to_one;
mod sequence;


pub use many_to_one::ManyToOneMatcher;
pub use one_to_one::match_;

use crate::api::{expression::RcExpression, substitution::Substitution};

/// A lazy stream of substitutions.
pub type MatchIterator = Box<dyn Iterator<Item = Substitution>>;

/// A lazy stream of (pattern, substitution) pairs from the many-to-one matcher.
pub type PatternMatchIterator = Box<dyn Iterator<Item = (RcExpression, Substitution)>>;

#[inline(always)]
pub(crate) fn no_matches() -> MatchIterator {
  Box::new(std::iter::empty())
}

#[inline(always)]
pub(crate) fn one_match(substitution: Substitution) -> MatchIterator {
  Box::new(std::iter::once(substitution))
}
