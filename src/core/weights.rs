/// Weighted multiset of continuation tokens.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize, Serializer};
use std::hash::Hash;

use crate::core::error::MarkovError;
use crate::core::sampler::Sampler;

/// Token → non-negative weight, the value stored for every chain state.
///
/// ## Invariants
/// - Each token appears once
/// - Every weight is finite and `>= 0`
/// - At least one weight is strictly positive, so the multiset can always
///   be sampled
/// - `slots[token]` is the position of `token` in `entries`
///
/// Entries keep the order in which tokens were first seen. Equality
/// ignores that order.
#[derive(Debug, Clone)]
pub struct Weights<T> {
    entries: Vec<(T, f64)>,
    slots: FxHashMap<T, usize>,
}

impl<T: Clone + Eq + Hash> Weights<T> {
    fn empty() -> Self {
        Self {
            entries: Vec::new(),
            slots: FxHashMap::default(),
        }
    }

    /// Convert any collection of `(token, weight)` pairs into a multiset.
    ///
    /// Repeated tokens have their weights summed. This is the one conversion
    /// used at every mutation boundary of a chain.
    ///
    /// # Errors
    /// `InvalidValue` if a weight is negative or non-finite, or if no weight
    /// is strictly positive (which includes the empty input).
    pub fn from_counts<I, W>(pairs: I) -> Result<Self, MarkovError>
    where
        I: IntoIterator<Item = (T, W)>,
        W: Into<f64>,
    {
        let mut weights = Self::empty();
        for (token, weight) in pairs {
            let weight = weight.into();
            if !weight.is_finite() || weight < 0.0 {
                return Err(MarkovError::InvalidValue(format!(
                    "weight {} is not a finite non-negative number",
                    weight
                )));
            }
            weights.increment(token, weight);
        }

        if !weights.is_drawable() {
            return Err(MarkovError::InvalidValue(
                "at least one continuation needs a positive weight".to_string(),
            ));
        }
        Ok(weights)
    }

    /// Count occurrences of each token, like a counter over the sequence.
    pub fn from_tokens<I>(tokens: I) -> Result<Self, MarkovError>
    where
        I: IntoIterator<Item = T>,
    {
        Self::from_counts(tokens.into_iter().map(|token| (token, 1u32)))
    }

    pub(crate) fn single(token: T) -> Self {
        let mut weights = Self::empty();
        weights.increment(token, 1.0);
        weights
    }

    /// Add `by` to the weight of `token`, inserting it when absent.
    pub(crate) fn increment(&mut self, token: T, by: f64) {
        match self.slots.get(&token) {
            Some(&slot) => self.entries[slot].1 += by,
            None => {
                self.slots.insert(token.clone(), self.entries.len());
                self.entries.push((token, by));
            }
        }
    }

    pub(crate) fn remove(&mut self, token: &T) -> Option<f64> {
        let slot = self.slots.remove(token)?;
        let (_, weight) = self.entries.remove(slot);
        for (moved, _) in &self.entries[slot..] {
            if let Some(index) = self.slots.get_mut(moved) {
                *index -= 1;
            }
        }
        Some(weight)
    }

    /// Sum of two multisets; tokens present in both get summed weights.
    pub(crate) fn merged(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        for (token, weight) in &other.entries {
            merged.increment(token.clone(), *weight);
        }
        merged
    }

    pub fn get(&self, token: &T) -> Option<f64> {
        self.slots.get(token).map(|&slot| self.entries[slot].1)
    }

    pub fn contains(&self, token: &T) -> bool {
        self.slots.contains_key(token)
    }

    /// Build a sampler over the tokens, ordered by ascending weight.
    ///
    /// Ties keep first-seen order, so the result is deterministic for a
    /// given multiset.
    pub fn sampler(&self) -> Result<Sampler<T>, MarkovError> {
        let mut ordered: Vec<(T, f64)> = self.entries.clone();
        ordered.sort_by(|a, b| a.1.total_cmp(&b.1));
        Sampler::new(ordered)
    }
}

impl<T> Weights<T> {
    pub(crate) fn is_drawable(&self) -> bool {
        self.entries.iter().any(|(_, weight)| *weight > 0.0)
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, weight)| weight).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&T, f64)> {
        self.entries.iter().map(|(token, weight)| (token, *weight))
    }

    pub fn tokens(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(token, _)| token)
    }
}

impl<T: Clone + Eq + Hash> PartialEq for Weights<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|(token, weight)| other.get(token) == Some(*weight))
    }
}

impl<T: Serialize> Serialize for Weights<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(&self.entries)
    }
}

impl<'de, T> Deserialize<'de> for Weights<T>
where
    T: Deserialize<'de> + Clone + Eq + Hash,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let entries: Vec<(T, f64)> = Vec::deserialize(deserializer)?;
        Self::from_counts(entries).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_aggregates_tokens() {
        let weights = Weights::from_tokens("aab".chars()).unwrap();
        assert_eq!(weights.get(&'a'), Some(2.0));
        assert_eq!(weights.get(&'b'), Some(1.0));
        assert_eq!(weights.len(), 2);
        assert_eq!(weights.total(), 3.0);
    }

    #[test]
    fn duplicate_pairs_are_summed() {
        let weights = Weights::from_counts([("x", 1.5), ("y", 1.0), ("x", 0.5)]).unwrap();
        assert_eq!(weights.get(&"x"), Some(2.0));
        assert_eq!(weights.len(), 2);
    }

    #[test]
    fn integer_weights_convert() {
        let weights = Weights::from_counts([("a", 4u32)]).unwrap();
        assert_eq!(weights.get(&"a"), Some(4.0));
    }

    #[test]
    fn rejects_negative_and_empty() {
        assert!(matches!(
            Weights::from_counts([("a", -1i32)]),
            Err(MarkovError::InvalidValue(_))
        ));
        assert!(matches!(
            Weights::from_counts([("a", f64::NAN)]),
            Err(MarkovError::InvalidValue(_))
        ));
        assert!(matches!(
            Weights::<&str>::from_counts(Vec::<(&str, f64)>::new()),
            Err(MarkovError::InvalidValue(_))
        ));
        assert!(matches!(
            Weights::from_counts([("a", 0.0)]),
            Err(MarkovError::InvalidValue(_))
        ));
    }

    #[test]
    fn zero_weights_allowed_beside_positive() {
        let weights = Weights::from_counts([("a", 0.0), ("b", 1.0)]).unwrap();
        assert_eq!(weights.get(&"a"), Some(0.0));
    }

    #[test]
    fn equality_ignores_entry_order() {
        let left = Weights::from_counts([("a", 1), ("b", 2)]).unwrap();
        let right = Weights::from_counts([("b", 2), ("a", 1)]).unwrap();
        assert_eq!(left, right);

        let other = Weights::from_counts([("a", 1), ("b", 3)]).unwrap();
        assert_ne!(left, other);
    }

    #[test]
    fn sampler_orders_by_weight() {
        // a:2, b:1 → b comes first in weight order.
        let weights = Weights::from_tokens("aab".chars()).unwrap();
        let sampler = weights.sampler().unwrap();
        assert_eq!(*sampler.choose(0.0), 'b');
        assert_eq!(*sampler.choose(0.999), 'a');

        let weights = Weights::from_counts([("a", 1), ("b", 2)]).unwrap();
        let sampler = weights.sampler().unwrap();
        assert_eq!(*sampler.choose(0.0), "a");
        assert_eq!(*sampler.choose(0.999), "b");
    }

    #[test]
    fn merged_sums_shared_tokens() {
        let left = Weights::from_counts([("a", 1), ("b", 2)]).unwrap();
        let right = Weights::from_counts([("b", 3), ("c", 1)]).unwrap();
        let merged = left.merged(&right);
        assert_eq!(merged.get(&"a"), Some(1.0));
        assert_eq!(merged.get(&"b"), Some(5.0));
        assert_eq!(merged.get(&"c"), Some(1.0));
    }

    #[test]
    fn remove_token() {
        let mut weights = Weights::from_counts([("a", 1), ("b", 2)]).unwrap();
        assert_eq!(weights.remove(&"b"), Some(2.0));
        assert_eq!(weights.remove(&"b"), None);
        assert!(!weights.contains(&"b"));
    }

    #[test]
    fn remove_keeps_lookup_and_order_of_later_tokens() {
        let mut weights = Weights::from_counts([("a", 1), ("b", 2), ("c", 3), ("d", 4)]).unwrap();
        assert_eq!(weights.remove(&"b"), Some(2.0));
        assert_eq!(weights.get(&"a"), Some(1.0));
        assert_eq!(weights.get(&"c"), Some(3.0));
        assert_eq!(weights.get(&"d"), Some(4.0));
        assert_eq!(weights.tokens().copied().collect::<Vec<_>>(), vec!["a", "c", "d"]);

        weights.increment("b", 5.0);
        assert_eq!(weights.get(&"b"), Some(5.0));
        assert_eq!(weights.get(&"d"), Some(4.0));
    }

    #[test]
    fn wide_multiset_counts_every_token() {
        let fanout = 20_000u32;
        let weights = Weights::from_tokens((0..fanout).chain(0..fanout)).unwrap();
        assert_eq!(weights.len(), fanout as usize);
        assert_eq!(weights.get(&0), Some(2.0));
        assert_eq!(weights.get(&(fanout - 1)), Some(2.0));
        assert_eq!(weights.tokens().next(), Some(&0));
    }

    #[test]
    fn serializes_as_pair_list() {
        let weights = Weights::from_counts([("a", 1), ("b", 2)]).unwrap();
        let text = ron::to_string(&weights).unwrap();
        assert!(text.starts_with('['));
        assert!(!text.contains("slots"));
        let back: Weights<String> = ron::from_str(&text).unwrap();
        assert_eq!(back.get(&"b".to_string()), Some(2.0));
    }
}
