//! A reversible sparse-set domain of integers, where every value additionally carries a weight
//! (its marginal belief).
//!
//! The members of the domain are kept in the prefix `values[..size]` of a permutation of all
//! values of the initial range; `indices` is the inverse permutation. Removing a value swaps it
//! just past the prefix and shrinks `size`, which is the only piece of membership information
//! that has to be reversible: restoring `size` brings back exactly the values which were swapped
//! out after the snapshot, as swaps only ever happen inside the current prefix.
//!
//! # Bibliography
//! \[1\] V. le C. de Saint-Marcq, P. Schaus, C. Solnon, and C. Lecoutre, ‘Sparse-sets for domain
//! implementation’, in CP workshop on Techniques foR Implementing Constraint programming Systems
//! (TRICS), 2013, pp. 1–10.
use std::fmt::Display;

use itertools::Itertools;

use crate::basic_types::Random;
use crate::cpbp_assert_moderate;
use crate::cpbp_assert_simple;
use crate::state::ReversibleCell;
use crate::state::ReversibleFloat;
use crate::state::ReversibleInt;
use crate::state::ReversibleStore;

/// Error returned by a domain operation which would remove the last value of a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EmptyDomain;

/// Receives the events caused by a domain operation.
///
/// A single operation can fire several events; e.g. removing the minimum of `{1, 2}` fires
/// [`DomainListener::change`], [`DomainListener::bind`] and [`DomainListener::change_min`].
pub trait DomainListener {
    /// The operation would have emptied the domain; it is reported as [`EmptyDomain`].
    fn empty(&mut self);
    /// The domain now contains a single value.
    fn bind(&mut self);
    /// At least one value was removed.
    fn change(&mut self);
    fn change_min(&mut self);
    fn change_max(&mut self);
}

/// A [`DomainListener`] which ignores all events.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SilentListener;

impl DomainListener for SilentListener {
    fn empty(&mut self) {}
    fn bind(&mut self) {}
    fn change(&mut self) {}
    fn change_min(&mut self) {}
    fn change_max(&mut self) {}
}

#[derive(Debug, Clone)]
pub struct SparseDomain {
    /// The smallest value of the initial domain; values are stored relative to it.
    offset: i32,
    values: Box<[u32]>,
    indices: Box<[u32]>,
    size: ReversibleInt,
    min: ReversibleInt,
    max: ReversibleInt,
    /// The marginal of each value of the initial range, indexed by `value - offset`.
    weights: Box<[ReversibleFloat]>,
}

impl SparseDomain {
    /// Creates the domain `[lower_bound, upper_bound]` with uniform marginals.
    pub fn new(lower_bound: i32, upper_bound: i32, store: &mut impl ReversibleStore) -> Self {
        cpbp_assert_simple!(
            lower_bound <= upper_bound,
            "The domain [{lower_bound}, {upper_bound}] is empty"
        );

        let span = upper_bound as i64 - lower_bound as i64 + 1;
        cpbp_assert_simple!(
            span <= u32::MAX as i64,
            "The domain [{lower_bound}, {upper_bound}] has too many values to be represented"
        );
        let num_values = span as u32;
        let initial_weight = 1.0 / num_values as f64;

        SparseDomain {
            offset: lower_bound,
            values: (0..num_values).collect(),
            indices: (0..num_values).collect(),
            size: store.new_int(span),
            min: store.new_int(lower_bound as i64),
            max: store.new_int(upper_bound as i64),
            weights: (0..num_values)
                .map(|_| store.new_float(initial_weight))
                .collect(),
        }
    }

    /// Creates a domain containing exactly the given values, with uniform marginals.
    pub fn new_sparse(values: &[i32], store: &mut impl ReversibleStore) -> Self {
        cpbp_assert_simple!(!values.is_empty(), "A domain needs at least one value");

        let mut sorted = values.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let lower_bound = sorted[0];
        let upper_bound = sorted[sorted.len() - 1];
        let mut domain = SparseDomain::new(lower_bound, upper_bound, store);

        for value in lower_bound..=upper_bound {
            if sorted.binary_search(&value).is_err() {
                // The bounds are members, so this can never empty the domain.
                let _ = domain.remove(value, store, &mut SilentListener);
            }
        }

        domain.reset_marginals(store);
        domain.normalize_marginals(store);

        domain
    }

    fn position(&self, value: i32) -> Option<usize> {
        let position = value as i64 - self.offset as i64;
        (0..self.values.len() as i64)
            .contains(&position)
            .then_some(position as usize)
    }

    /// Swaps the values at indices `a` and `b` of the permutation.
    fn exchange(&mut self, a: usize, b: usize) {
        let value_a = self.values[a];
        let value_b = self.values[b];
        self.values[a] = value_b;
        self.values[b] = value_a;
        self.indices[value_a as usize] = b as u32;
        self.indices[value_b as usize] = a as u32;
    }

    fn value_at(&self, index: usize) -> i32 {
        (self.values[index] as i64 + self.offset as i64) as i32
    }

    /// The bounds of the domain at creation; no value outside them is ever a member.
    pub fn initial_bounds(&self) -> (i32, i32) {
        (
            self.offset,
            (self.offset as i64 + self.values.len() as i64 - 1) as i32,
        )
    }

    pub fn size(&self, store: &impl ReversibleStore) -> usize {
        self.size.get(store) as usize
    }

    pub fn min(&self, store: &impl ReversibleStore) -> i32 {
        self.min.get(store) as i32
    }

    pub fn max(&self, store: &impl ReversibleStore) -> i32 {
        self.max.get(store) as i32
    }

    pub fn is_bound(&self, store: &impl ReversibleStore) -> bool {
        self.size(store) == 1
    }

    pub fn contains(&self, value: i32, store: &impl ReversibleStore) -> bool {
        self.position(value)
            .is_some_and(|position| (self.indices[position] as usize) < self.size(store))
    }

    /// Iterates over the members in an unspecified order, which is stable as long as the domain
    /// does not change.
    pub fn iter(&self, store: &impl ReversibleStore) -> DomainIter<'_> {
        DomainIter {
            values: self.values[..self.size(store)].iter(),
            offset: self.offset,
        }
    }

    /// Writes the members into `destination` (in the same order as [`SparseDomain::iter`]) and
    /// returns how many were written.
    pub fn fill_array(&self, destination: &mut [i32], store: &impl ReversibleStore) -> usize {
        let size = self.size(store);
        cpbp_assert_simple!(
            destination.len() >= size,
            "The destination can hold {} values but the domain has {size}",
            destination.len()
        );

        for (slot, index) in destination.iter_mut().zip(0..size) {
            *slot = self.value_at(index);
        }

        size
    }

    /// The smallest member which is at least `from`; the caller guarantees one exists.
    fn smallest_member_from(&self, from: i32, store: &impl ReversibleStore) -> i32 {
        let size = self.size(store);
        let max = self.max(store);

        if (size as i64) < max as i64 - from as i64 {
            (0..size)
                .map(|index| self.value_at(index))
                .filter(|&value| value >= from)
                .min()
                .unwrap_or(max)
        } else {
            (from..=max)
                .find(|&value| self.contains(value, store))
                .unwrap_or(max)
        }
    }

    /// The largest member which is at most `from`; the caller guarantees one exists.
    fn largest_member_from(&self, from: i32, store: &impl ReversibleStore) -> i32 {
        let size = self.size(store);
        let min = self.min(store);

        if (size as i64) < from as i64 - min as i64 {
            (0..size)
                .map(|index| self.value_at(index))
                .filter(|&value| value <= from)
                .max()
                .unwrap_or(min)
        } else {
            (min..=from)
                .rev()
                .find(|&value| self.contains(value, store))
                .unwrap_or(min)
        }
    }

    /// Removes `value`; this is a no-op if it is not a member.
    pub fn remove(
        &mut self,
        value: i32,
        store: &mut impl ReversibleStore,
        listener: &mut impl DomainListener,
    ) -> Result<(), EmptyDomain> {
        let Some(position) = self.position(value) else {
            return Ok(());
        };
        let size = self.size(store);
        let index = self.indices[position] as usize;
        if index >= size {
            return Ok(());
        }
        if size == 1 {
            listener.empty();
            return Err(EmptyDomain);
        }

        self.exchange(index, size - 1);
        self.size.set(store, size as i64 - 1);
        listener.change();
        if size - 1 == 1 {
            listener.bind();
        }

        if value == self.min(store) {
            let new_min = self.smallest_member_from(value + 1, store);
            self.min.set(store, new_min as i64);
            listener.change_min();
        }
        if value == self.max(store) {
            let new_max = self.largest_member_from(value - 1, store);
            self.max.set(store, new_max as i64);
            listener.change_max();
        }

        Ok(())
    }

    /// Removes every value except `value`, which must be a member.
    pub fn remove_all_but(
        &mut self,
        value: i32,
        store: &mut impl ReversibleStore,
        listener: &mut impl DomainListener,
    ) -> Result<(), EmptyDomain> {
        let size = self.size(store);
        let Some(index) = self
            .position(value)
            .map(|position| self.indices[position] as usize)
            .filter(|&index| index < size)
        else {
            listener.empty();
            return Err(EmptyDomain);
        };
        if size == 1 {
            return Ok(());
        }

        let previous_min = self.min(store);
        let previous_max = self.max(store);

        self.exchange(index, 0);
        self.size.set(store, 1);
        self.min.set(store, value as i64);
        self.max.set(store, value as i64);

        listener.change();
        listener.bind();
        if value != previous_min {
            listener.change_min();
        }
        if value != previous_max {
            listener.change_max();
        }

        Ok(())
    }

    /// Removes every value strictly smaller than `value`.
    pub fn remove_below(
        &mut self,
        value: i32,
        store: &mut impl ReversibleStore,
        listener: &mut impl DomainListener,
    ) -> Result<(), EmptyDomain> {
        let min = self.min(store);
        if value <= min {
            return Ok(());
        }
        if value > self.max(store) {
            listener.empty();
            return Err(EmptyDomain);
        }

        let mut size = self.size(store);
        if (size as i64) < value as i64 - min as i64 {
            // Fewer members than candidate values: sweep the members.
            let mut index = 0;
            while index < size {
                if self.value_at(index) < value {
                    self.exchange(index, size - 1);
                    size -= 1;
                } else {
                    index += 1;
                }
            }
        } else {
            for removed in min..value {
                if let Some(position) = self.position(removed) {
                    let index = self.indices[position] as usize;
                    if index < size {
                        self.exchange(index, size - 1);
                        size -= 1;
                    }
                }
            }
        }
        cpbp_assert_moderate!(size >= 1, "The maximum is never removed");

        self.size.set(store, size as i64);
        let new_min = self.smallest_member_from(value, store);
        self.min.set(store, new_min as i64);

        listener.change();
        listener.change_min();
        if size == 1 {
            listener.bind();
        }

        Ok(())
    }

    /// Removes every value strictly larger than `value`.
    pub fn remove_above(
        &mut self,
        value: i32,
        store: &mut impl ReversibleStore,
        listener: &mut impl DomainListener,
    ) -> Result<(), EmptyDomain> {
        let max = self.max(store);
        if value >= max {
            return Ok(());
        }
        if value < self.min(store) {
            listener.empty();
            return Err(EmptyDomain);
        }

        let mut size = self.size(store);
        if (size as i64) < max as i64 - value as i64 {
            let mut index = 0;
            while index < size {
                if self.value_at(index) > value {
                    self.exchange(index, size - 1);
                    size -= 1;
                } else {
                    index += 1;
                }
            }
        } else {
            for removed in (value + 1)..=max {
                if let Some(position) = self.position(removed) {
                    let index = self.indices[position] as usize;
                    if index < size {
                        self.exchange(index, size - 1);
                        size -= 1;
                    }
                }
            }
        }
        cpbp_assert_moderate!(size >= 1, "The minimum is never removed");

        self.size.set(store, size as i64);
        let new_max = self.largest_member_from(value, store);
        self.max.set(store, new_max as i64);

        listener.change();
        listener.change_max();
        if size == 1 {
            listener.bind();
        }

        Ok(())
    }
}

/// Operations on the marginals (weights) of the members.
impl SparseDomain {
    /// The marginal of `value`; values which are not members have marginal zero.
    pub fn marginal(&self, value: i32, store: &impl ReversibleStore) -> f64 {
        if !self.contains(value, store) {
            return 0.0;
        }
        self.position(value)
            .map_or(0.0, |position| self.weights[position].get(store))
    }

    pub fn set_marginal(&self, value: i32, marginal: f64, store: &mut impl ReversibleStore) {
        cpbp_assert_moderate!(
            (0.0..=1.0).contains(&marginal),
            "Marginal {marginal} of value {value} lies outside [0, 1]"
        );
        if let Some(position) = self.position(value) {
            self.weights[position].set(store, marginal);
        }
    }

    /// Sets the weight of every member to 1.
    pub fn reset_marginals(&self, store: &mut impl ReversibleStore) {
        for index in 0..self.size(store) {
            self.weights[self.values[index] as usize].set(store, 1.0);
        }
    }

    /// Divides the weight of every member by the sum of the weights of all members.
    ///
    /// A bound domain gets weight 1 for its value. If all weights are zero this is a no-op;
    /// this happens transiently during message passing.
    pub fn normalize_marginals(&self, store: &mut impl ReversibleStore) {
        let size = self.size(store);
        if size == 1 {
            self.weights[self.values[0] as usize].set(store, 1.0);
            return;
        }

        let sum = (0..size)
            .map(|index| self.weights[self.values[index] as usize].get(store))
            .sum::<f64>();
        if sum == 0.0 {
            return;
        }

        for index in 0..size {
            let weight = self.weights[self.values[index] as usize];
            let normalized = weight.get(store) / sum;
            weight.set(store, normalized);
        }
    }

    /// The members paired with their marginal.
    fn weighted_members<'a>(
        &'a self,
        store: &'a impl ReversibleStore,
    ) -> impl Iterator<Item = (i32, f64)> + 'a {
        (0..self.size(store)).map(move |index| {
            let value = self.value_at(index);
            (value, self.weights[self.values[index] as usize].get(store))
        })
    }

    /// The member with the highest marginal; ties are broken towards the smaller value.
    pub fn value_with_max_marginal(&self, store: &impl ReversibleStore) -> i32 {
        self.weighted_members(store)
            .fold(None, |best: Option<(i32, f64)>, (value, weight)| match best {
                Some((best_value, best_weight))
                    if best_weight > weight || (best_weight == weight && best_value < value) =>
                {
                    best
                }
                _ => Some((value, weight)),
            })
            .map_or(self.min(store), |(value, _)| value)
    }

    /// The member with the lowest marginal; ties are broken towards the smaller value.
    pub fn value_with_min_marginal(&self, store: &impl ReversibleStore) -> i32 {
        self.weighted_members(store)
            .fold(None, |best: Option<(i32, f64)>, (value, weight)| match best {
                Some((best_value, best_weight))
                    if best_weight < weight || (best_weight == weight && best_value < value) =>
                {
                    best
                }
                _ => Some((value, weight)),
            })
            .map_or(self.min(store), |(value, _)| value)
    }

    pub fn max_marginal(&self, store: &impl ReversibleStore) -> f64 {
        self.weighted_members(store)
            .map(|(_, weight)| weight)
            .fold(0.0, f64::max)
    }

    /// The difference between the highest and the second-highest marginal.
    pub fn max_marginal_regret(&self, store: &impl ReversibleStore) -> f64 {
        let (first, second) = self.weighted_members(store).fold(
            (0.0, 0.0),
            |(first, second): (f64, f64), (_, weight)| {
                if weight > first {
                    (weight, first)
                } else {
                    (first, second.max(weight))
                }
            },
        );
        first - second
    }

    /// The Shannon entropy `-Σ p ln p` of the marginals of the members.
    pub fn entropy(&self, store: &impl ReversibleStore) -> f64 {
        -self
            .weighted_members(store)
            .map(|(_, weight)| weight)
            .filter(|&weight| weight > 0.0)
            .map(|weight| weight * weight.ln())
            .sum::<f64>()
    }

    /// A member chosen uniformly at random.
    pub fn random_value(&self, random: &mut dyn Random, store: &impl ReversibleStore) -> i32 {
        let index = random.generate_usize_in_range(0..self.size(store));
        self.value_at(index)
    }

    /// A member chosen with probability proportional to its marginal, using stochastic
    /// acceptance: a uniformly drawn member is accepted with probability
    /// `marginal / max_marginal`.
    ///
    /// Falls back to [`SparseDomain::random_value`] if all marginals are zero.
    pub fn biased_wheel_value(&self, random: &mut dyn Random, store: &impl ReversibleStore) -> i32 {
        let max_marginal = self.max_marginal(store);
        if max_marginal <= 0.0 {
            return self.random_value(random, store);
        }

        loop {
            let index = random.generate_usize_in_range(0..self.size(store));
            let weight = self.weights[self.values[index] as usize].get(store);
            if random.generate_f64() < weight / max_marginal {
                return self.value_at(index);
            }
        }
    }
}

impl SparseDomain {
    /// Displays the members in increasing order, e.g. `{1, 3, 4}`.
    pub fn display(&self, store: &impl ReversibleStore) -> DomainDisplay {
        let mut members = self.iter(store).collect::<Vec<_>>();
        members.sort_unstable();
        DomainDisplay { members }
    }
}

/// See [`SparseDomain::display`].
#[derive(Debug, Clone)]
pub struct DomainDisplay {
    members: Vec<i32>,
}

impl Display for DomainDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}", self.members.iter().join(", "))
    }
}

/// Iterator over the members of a [`SparseDomain`].
#[derive(Debug, Clone)]
pub struct DomainIter<'a> {
    values: std::slice::Iter<'a, u32>,
    offset: i32,
}

impl Iterator for DomainIter<'_> {
    type Item = i32;

    fn next(&mut self) -> Option<i32> {
        self.values
            .next()
            .map(|&value| (value as i64 + self.offset as i64) as i32)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.values.size_hint()
    }
}

impl ExactSizeIterator for DomainIter<'_> {}
