#![allow(unused)]
/*!

Types/type aliases that abstract over the implementing backing type.

The motivating example is the `IString` type, an interned string. Several external crates could
provide this functionality; this module redirects to whichever implementation is chosen. Today
`IString` aliases `string_cache::DefaultAtom`, and retargeting the whole crate to, say, the
`ustr` crate is a one-line change here. The same goes for `NatSet` (a set of small natural
numbers, currently `bit_set::BitSet`) and `Set` (currently `std::collections::HashSet`).

Infrastructure with a wider interface than a type alias gets a real abstraction layer instead.
The `log` module exposes only `set_global_logging_threshold()`/`get_global_logging_threshold()`
and the logging macros `critical!`, `error!`, `warning!`, `info!`, `debug!`, and `trace!`; the
backing implementation (currently the `tracing` crate) is private to the module.

*/

mod multiset;
mod string_join;

// Logging
pub mod log;

// Interned string. `DefaultAtom` uses a global cache that can be shared across threads.
pub use string_cache::DefaultAtom as IString;

// A multiset with counted occurrences. Public because substitutions bind multisets of
// expressions in commutative contexts.
pub use multiset::Multiset;

// region Items meant to be used only internally

// A set of (small) natural numbers.
pub(crate) use bit_set::BitSet as NatSet;

// Join sequences of displayable things with a separator.
pub(crate) use string_join::join_string;

// endregion

/// The default hash set used throughout the crate.
pub type Set<T> = std::collections::HashSet<T>;
