/*!

Cursor-style enumerators for the combinatorial families the matchers branch over:

- weak compositions — every way to write `total` as an ordered sum of `parts` non-negative
  summands, used to distribute leftover subject terms across flexible wildcard slots;
- sub-multiset selections of a given size, used for fixed multi-length wildcards under a
  commutative operator;
- labeled multiset partitions, used to split a commutative residual across sequence wildcards.

All three are pull-based: the matchers hold one as a cursor and backtrack by advancing it, so a
match with exponentially many distributions never materializes them.

*/

use std::hash::Hash;

use crate::abstractions::Multiset;

/// Weak compositions of `total` into `parts` summands, in lexicographic order: `(0, …, 0,
/// total)` first, `(total, 0, …, 0)` last. With zero parts there is exactly one composition of
/// zero (the empty one) and none of anything else.
pub(crate) struct WeakCompositions {
  current: Vec<usize>,
  total:   usize,
  started: bool,
  done:    bool,
}

impl WeakCompositions {
  pub fn new(total: usize, parts: usize) -> Self {
    WeakCompositions {
      current: vec![0; parts],
      total,
      started: false,
      done: parts == 0 && total > 0,
    }
  }
}

impl Iterator for WeakCompositions {
  type Item = Vec<usize>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.done {
      return None;
    }

    if !self.started {
      self.started = true;
      if let Some(last) = self.current.last_mut() {
        *last = self.total;
      }
      return Some(self.current.clone());
    }

    let parts = self.current.len();

    // Find the rightmost summand (other than the last) with mass anywhere to its right, move
    // one unit onto it, and flush the rest of that mass to the end.
    let mut mass = 0;
    for pivot in (0..parts.saturating_sub(1)).rev() {
      mass += self.current[pivot + 1];
      if mass > 0 {
        self.current[pivot] += 1;
        for slot in pivot + 1..parts {
          self.current[slot] = 0;
        }
        self.current[parts - 1] = mass - 1;
        return Some(self.current.clone());
      }
    }

    self.done = true;
    None
  }
}

/// All sub-multisets of size `wanted` drawn from the counted snapshot `pool`, lazily.
pub(crate) fn multiset_selections<T>(pool: Vec<(T, usize)>, wanted: usize) -> Box<dyn Iterator<Item = Multiset<T>>>
where
  T: Eq + Hash + Clone + 'static,
{
  if wanted == 0 {
    return Box::new(std::iter::once(Multiset::new()));
  }
  let Some((value, available)) = pool.first().cloned() else {
    return Box::new(std::iter::empty());
  };
  let rest: Vec<(T, usize)> = pool[1..].to_vec();

  Box::new((0..=available.min(wanted)).flat_map(move |taken| {
    let value = value.clone();
    multiset_selections(rest.clone(), wanted - taken).map(move |mut selection| {
      selection.insert_n(value.clone(), taken);
      selection
    })
  }))
}

/// All ways to split the counted snapshot `pool` into `slots` labeled multisets, lazily. Each
/// distinct value's multiplicity is distributed independently, so the enumeration is the
/// product of weak compositions over distinct values.
pub(crate) fn multiset_partitions<T>(pool: Vec<(T, usize)>, slots: usize) -> Box<dyn Iterator<Item = Vec<Multiset<T>>>>
where
  T: Eq + Hash + Clone + 'static,
{
  let Some((value, multiplicity)) = pool.first().cloned() else {
    return Box::new(std::iter::once(vec![Multiset::new(); slots]));
  };
  let rest: Vec<(T, usize)> = pool[1..].to_vec();

  Box::new(WeakCompositions::new(multiplicity, slots).flat_map(move |spread| {
    let value = value.clone();
    multiset_partitions(rest.clone(), slots).map(move |mut partition| {
      for (slot, count) in partition.iter_mut().zip(&spread) {
        slot.insert_n(value.clone(), *count);
      }
      partition
    })
  }))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn compositions_cover_every_distribution() {
    let found: Vec<Vec<usize>> = WeakCompositions::new(2, 3).collect();
    let expected = vec![
      vec![0, 0, 2],
      vec![0, 1, 1],
      vec![0, 2, 0],
      vec![1, 0, 1],
      vec![1, 1, 0],
      vec![2, 0, 0],
    ];
    assert_eq!(found, expected);
  }

  #[test]
  fn compositions_degenerate_cases() {
    assert_eq!(WeakCompositions::new(0, 0).collect::<Vec<_>>(), vec![Vec::<usize>::new()]);
    assert_eq!(WeakCompositions::new(3, 0).count(), 0);
    assert_eq!(WeakCompositions::new(0, 3).collect::<Vec<_>>(), vec![vec![0, 0, 0]]);
    assert_eq!(WeakCompositions::new(4, 1).collect::<Vec<_>>(), vec![vec![4]]);
    // C(total + parts - 1, parts - 1) = C(6, 2) = 15
    assert_eq!(WeakCompositions::new(5, 3).count(), 15);
  }

  #[test]
  fn selections_respect_multiplicities() {
    // {a, a, b}: the 2-selections are {a, a}, {a, b}.
    let pool = vec![("a", 2), ("b", 1)];
    let found: Vec<Multiset<&str>> = multiset_selections(pool, 2).collect();
    assert_eq!(found.len(), 2);
    assert!(found.contains(&["a", "a"].into_iter().collect()));
    assert!(found.contains(&["a", "b"].into_iter().collect()));

    assert_eq!(multiset_selections(vec![("a", 1)], 2).count(), 0);
  }

  #[test]
  fn partitions_multiply_per_value_spreads() {
    // {a, a, b} into 2 slots: 3 spreads of a × 2 spreads of b.
    let pool = vec![("a", 2), ("b", 1)];
    let found: Vec<Vec<Multiset<&str>>> = multiset_partitions(pool, 2).collect();
    assert_eq!(found.len(), 6);
    for partition in &found {
      let total: usize = partition.iter().map(Multiset::len).sum();
      assert_eq!(total, 3);
    }
    // Splitting into zero slots only works for an empty pool.
    assert_eq!(multiset_partitions(vec![("a", 1)], 0).count(), 0);
    assert_eq!(multiset_partitions(Vec::<(&str, usize)>::new(), 0).count(), 1);
  }
}
