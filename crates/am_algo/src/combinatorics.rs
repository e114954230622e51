//! Tie enumeration helpers.
//!
//! - `unique_permutations`: every distinct ordering of a multiset, in
//!   lexicographic order, without duplicates from equal elements.
//! - `combinations`: cartesian product picking one alternative per group,
//!   preserving group order.
//!
//! Both are pure, lazy and restartable (`Clone`); neither touches its input.

/// Lazy sequence of the distinct permutations of a multiset.
#[derive(Clone, Debug)]
pub struct UniquePermutations<T> {
    current: Vec<T>,
    done: bool,
}

/// Distinct permutations of `items`, starting from the sorted arrangement.
///
/// An empty input yields exactly one (empty) permutation.
pub fn unique_permutations<T: Ord + Clone>(items: &[T]) -> UniquePermutations<T> {
    let mut current = items.to_vec();
    current.sort();
    UniquePermutations { current, done: false }
}

impl<T: Ord + Clone> Iterator for UniquePermutations<T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let out = self.current.clone();
        self.done = !next_permutation(&mut self.current);
        Some(out)
    }
}

/// Rearrange into the next lexicographically greater permutation.
/// Returns `false` (leaving `xs` untouched) when `xs` is the last one.
fn next_permutation<T: Ord>(xs: &mut [T]) -> bool {
    if xs.len() < 2 {
        return false;
    }
    let mut i = xs.len() - 1;
    while i > 0 && xs[i - 1] >= xs[i] {
        i -= 1;
    }
    if i == 0 {
        return false;
    }
    let mut j = xs.len() - 1;
    while xs[j] <= xs[i - 1] {
        j -= 1;
    }
    xs.swap(i - 1, j);
    xs[i..].reverse();
    true
}

/// Every way to hand `seats` seats to `candidates` tied entries, one seat
/// each at most: 0/1 vectors with exactly `seats` ones.
pub fn seat_outcomes(candidates: usize, seats: usize) -> UniquePermutations<u32> {
    let seats = seats.min(candidates);
    let mut items = vec![0u32; candidates - seats];
    items.extend(std::iter::repeat(1u32).take(seats));
    unique_permutations(&items)
}

/* ---------------------------------------------------------------------------- */

/// Lazy cartesian product over independent groups of alternatives.
#[derive(Clone, Debug)]
pub struct Combinations<'a, T> {
    groups: &'a [Vec<T>],
    cursor: Vec<usize>,
    done: bool,
}

/// One pick per group, odometer order (last group varies fastest).
///
/// No groups yields one empty combination; any empty group yields none.
pub fn combinations<T: Clone>(groups: &[Vec<T>]) -> Combinations<'_, T> {
    Combinations {
        groups,
        cursor: vec![0; groups.len()],
        done: groups.iter().any(Vec::is_empty),
    }
}

impl<'a, T: Clone> Iterator for Combinations<'a, T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let out: Vec<T> = self
            .groups
            .iter()
            .zip(&self.cursor)
            .map(|(g, &i)| g[i].clone())
            .collect();

        // advance
        let mut pos = self.groups.len();
        loop {
            if pos == 0 {
                self.done = true;
                break;
            }
            pos -= 1;
            self.cursor[pos] += 1;
            if self.cursor[pos] < self.groups[pos].len() {
                break;
            }
            self.cursor[pos] = 0;
        }
        Some(out)
    }
}
