/// Transition table — states of `order` tokens mapped to weighted
/// continuations, built incrementally or from a corpus.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::VecDeque;
use std::fmt;
use std::hash::Hash;

use crate::core::error::MarkovError;
use crate::core::sampler::{Draw, RngDraw};
use crate::core::walker::Walker;
use crate::core::weights::Weights;

/// A fixed-order Markov chain.
///
/// Each state is a window of exactly `order` tokens; its value counts the
/// tokens observed right after that window. A state that is absent has no
/// known continuation, and a walk that reaches it stops there.
///
/// # Invariants
/// - `order >= 1` and never changes after construction
/// - Every key has length `order`
/// - Every value is a drawable `Weights` (non-empty, one positive weight)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    into = "ChainRecord<T>",
    try_from = "ChainRecord<T>",
    bound(
        serialize = "T: Serialize + Clone + Eq + Hash",
        deserialize = "T: Deserialize<'de> + Clone + Eq + Hash"
    )
)]
pub struct Chain<T> {
    order: usize,
    states: FxHashMap<Vec<T>, Weights<T>>,
}

/// On-disk shape of a chain. Loading goes back through `Chain::from_states`
/// so a hand-edited file cannot break the invariants.
#[derive(Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de> + Clone + Eq + Hash"))]
struct ChainRecord<T> {
    order: usize,
    states: Vec<(Vec<T>, Weights<T>)>,
}

impl<T> Chain<T> {
    pub fn order(&self) -> usize {
        self.order
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// All states with their continuations, in table order.
    pub fn states(&self) -> impl Iterator<Item = (&[T], &Weights<T>)> {
        self.states
            .iter()
            .map(|(state, weights)| (state.as_slice(), weights))
    }

    /// Whether both chains have the same order.
    ///
    /// This is only a compatibility check: two chains of the same order are
    /// compatible whatever their contents.
    pub fn same_order(&self, other: &Self) -> bool {
        self.order == other.order
    }

    fn check_compatible(&self, other: &Self) -> Result<(), MarkovError> {
        if self.same_order(other) {
            Ok(())
        } else {
            Err(MarkovError::IncompatibleOrder {
                left: self.order,
                right: other.order,
            })
        }
    }

    fn check_key(&self, len: usize) -> Result<(), MarkovError> {
        if len == self.order {
            Ok(())
        } else {
            Err(MarkovError::InvalidKey {
                expected: self.order,
                actual: len,
            })
        }
    }
}

impl<T: Clone + Eq + Hash> Chain<T> {
    /// Creates an empty chain of the given order.
    ///
    /// # Errors
    /// `InvalidOrder` if `order` is zero.
    pub fn new(order: usize) -> Result<Self, MarkovError> {
        if order == 0 {
            return Err(MarkovError::InvalidOrder(order));
        }
        Ok(Self {
            order,
            states: FxHashMap::default(),
        })
    }

    /// Creates a chain from prepared states.
    ///
    /// # Errors
    /// `InvalidOrder`, or `InvalidKey` for the first state of the wrong
    /// length.
    pub fn from_states<I>(order: usize, states: I) -> Result<Self, MarkovError>
    where
        I: IntoIterator<Item = (Vec<T>, Weights<T>)>,
    {
        let mut chain = Self::new(order)?;
        for (state, weights) in states {
            chain.insert(state, weights)?;
        }
        Ok(chain)
    }

    /// Learns a chain of the given order from a token sequence.
    pub fn from_corpus<I>(corpus: I, order: usize) -> Result<Self, MarkovError>
    where
        I: IntoIterator<Item = T>,
    {
        let mut chain = Self::new(order)?;
        chain.learn(corpus)?;
        Ok(chain)
    }

    /// Like `from_corpus`, with `begin_with` logically prepended to the
    /// corpus. Passing `order` placeholder tokens gives generation a
    /// well-defined start state.
    pub fn from_corpus_with<I, B>(corpus: I, order: usize, begin_with: B) -> Result<Self, MarkovError>
    where
        I: IntoIterator<Item = T>,
        B: IntoIterator<Item = T>,
    {
        Self::from_corpus(begin_with.into_iter().chain(corpus), order)
    }

    /// Adds the transitions observed in `corpus` to this chain.
    ///
    /// A window of `order + 1` tokens slides over the corpus: the first
    /// `order` tokens are the state and the last one has its count raised by
    /// one. The corpus is streamed, never collected.
    ///
    /// Returns the number of windows recorded.
    ///
    /// # Errors
    /// `CorpusTooShort` if the corpus has fewer than `order + 1` tokens, in
    /// which case the chain is left untouched.
    pub fn learn<I>(&mut self, corpus: I) -> Result<usize, MarkovError>
    where
        I: IntoIterator<Item = T>,
    {
        let width = self.order + 1;
        let mut window: VecDeque<T> = VecDeque::with_capacity(width);
        let mut seen = 0;
        let mut recorded = 0;

        for token in corpus {
            seen += 1;
            if window.len() == width {
                window.pop_front();
            }
            window.push_back(token);
            if window.len() < width {
                continue;
            }

            let state: Vec<T> = window.iter().take(self.order).cloned().collect();
            let next = window[self.order].clone();
            match self.states.entry(state) {
                Entry::Occupied(mut entry) => entry.get_mut().increment(next, 1.0),
                Entry::Vacant(entry) => {
                    entry.insert(Weights::single(next));
                }
            }
            recorded += 1;
        }

        if recorded == 0 {
            return Err(MarkovError::CorpusTooShort {
                needed: width,
                got: seen,
            });
        }

        log::debug!(
            "learned {} windows from {} tokens, chain now has {} states",
            recorded,
            seen,
            self.states.len()
        );
        Ok(recorded)
    }

    /// Sets the continuations of `state`, replacing any previous value.
    ///
    /// `next` is any collection of `(token, weight)` pairs; repeated tokens
    /// are summed.
    ///
    /// # Errors
    /// `InvalidKey` if `state` does not have `order` tokens, `InvalidValue`
    /// if the weights cannot form a drawable multiset.
    pub fn set<I, W>(&mut self, state: Vec<T>, next: I) -> Result<(), MarkovError>
    where
        I: IntoIterator<Item = (T, W)>,
        W: Into<f64>,
    {
        self.check_key(state.len())?;
        let weights = Weights::from_counts(next)?;
        self.states.insert(state, weights);
        Ok(())
    }

    /// Stores an already converted multiset, returning the previous one.
    pub fn insert(&mut self, state: Vec<T>, weights: Weights<T>) -> Result<Option<Weights<T>>, MarkovError> {
        self.check_key(state.len())?;
        Ok(self.states.insert(state, weights))
    }

    /// Continuations of `state`, if it was ever set or learned.
    pub fn get(&self, state: &[T]) -> Option<&Weights<T>> {
        self.states.get(state)
    }

    /// Removes exactly `state`.
    ///
    /// # Errors
    /// `InvalidKey` if `state` does not have `order` tokens.
    pub fn delete(&mut self, state: &[T]) -> Result<Option<Weights<T>>, MarkovError> {
        self.check_key(state.len())?;
        Ok(self.states.remove(state))
    }

    pub fn contains_state(&self, state: &[T]) -> bool {
        self.states.contains_key(state)
    }

    /// Whether `token` appears in any state.
    pub fn contains_token(&self, token: &T) -> bool {
        self.states.keys().any(|state| state.contains(token))
    }

    /// Removes `token` from the chain entirely.
    ///
    /// Every state containing `token` is dropped. `token` is then removed
    /// from the continuations of the remaining states, and a state left
    /// with nothing to draw is dropped as well. Each entry is visited once.
    ///
    /// Returns the number of states dropped.
    pub fn remove_keyword(&mut self, token: &T) -> usize {
        let before = self.states.len();
        self.states.retain(|state, weights| {
            if state.contains(token) {
                return false;
            }
            weights.remove(token);
            weights.is_drawable()
        });

        let dropped = before - self.states.len();
        log::debug!("keyword removal dropped {} of {} states", dropped, before);
        dropped
    }

    /// States containing `query` as a contiguous run of tokens.
    ///
    /// - Same length as `order`: the state itself, if present
    /// - Shorter: every state with `query` at any offset
    /// - Longer: every state equal to some `order`-wide window of `query`,
    ///   in the order the windows occur
    /// - Empty: every state
    ///
    /// Each matching state is reported once.
    pub fn search(&self, query: &[T]) -> Vec<&[T]> {
        if query.is_empty() {
            return self.states.keys().map(Vec::as_slice).collect();
        }

        match query.len().cmp(&self.order) {
            Ordering::Equal => self
                .states
                .get_key_value(query)
                .map(|(state, _)| state.as_slice())
                .into_iter()
                .collect(),
            Ordering::Less => self
                .states
                .keys()
                .filter(|state| state.windows(query.len()).any(|run| run == query))
                .map(Vec::as_slice)
                .collect(),
            Ordering::Greater => {
                let mut found: Vec<&[T]> = Vec::new();
                for run in query.windows(self.order) {
                    if let Some((state, _)) = self.states.get_key_value(run) {
                        if !found.contains(&state.as_slice()) {
                            found.push(state.as_slice());
                        }
                    }
                }
                found
            }
        }
    }

    /// Whether every state of `self` is also a state of `other`.
    ///
    /// # Errors
    /// `IncompatibleOrder` if the orders differ.
    pub fn is_subset_of(&self, other: &Self) -> Result<bool, MarkovError> {
        self.check_compatible(other)?;
        Ok(self.states.keys().all(|state| other.states.contains_key(state)))
    }

    pub fn is_proper_subset_of(&self, other: &Self) -> Result<bool, MarkovError> {
        Ok(self.is_subset_of(other)? && self.len() < other.len())
    }

    pub fn is_superset_of(&self, other: &Self) -> Result<bool, MarkovError> {
        other.is_subset_of(self)
    }

    pub fn is_proper_superset_of(&self, other: &Self) -> Result<bool, MarkovError> {
        other.is_proper_subset_of(self)
    }

    /// States of either chain. A state present in both gets the sum of both
    /// continuation weights.
    pub fn union(&self, other: &Self) -> Result<Self, MarkovError> {
        self.check_compatible(other)?;
        let mut states = self.states.clone();
        for (state, weights) in &other.states {
            match states.entry(state.clone()) {
                Entry::Occupied(mut entry) => {
                    let merged = entry.get().merged(weights);
                    entry.insert(merged);
                }
                Entry::Vacant(entry) => {
                    entry.insert(weights.clone());
                }
            }
        }
        Ok(self.with_states(states))
    }

    /// States present in both chains, with summed continuation weights.
    pub fn intersection(&self, other: &Self) -> Result<Self, MarkovError> {
        self.check_compatible(other)?;
        let states = self
            .states
            .iter()
            .filter_map(|(state, weights)| {
                let theirs = other.states.get(state)?;
                Some((state.clone(), weights.merged(theirs)))
            })
            .collect();
        Ok(self.with_states(states))
    }

    /// States of `self` that `other` does not have.
    pub fn difference(&self, other: &Self) -> Result<Self, MarkovError> {
        self.check_compatible(other)?;
        let states = self
            .states
            .iter()
            .filter(|(state, _)| !other.states.contains_key(*state))
            .map(|(state, weights)| (state.clone(), weights.clone()))
            .collect();
        Ok(self.with_states(states))
    }

    /// States present in exactly one of the two chains.
    pub fn symmetric_difference(&self, other: &Self) -> Result<Self, MarkovError> {
        let mut left = self.difference(other)?;
        let right = other.difference(self)?;
        left.states.extend(right.states);
        Ok(left)
    }

    fn with_states(&self, states: FxHashMap<Vec<T>, Weights<T>>) -> Self {
        Self {
            order: self.order,
            states,
        }
    }

    /// Starts a walk from a random state, drawing from operating system
    /// entropy.
    pub fn walk(&self) -> Result<Walker<T, RngDraw>, MarkovError> {
        Walker::new(self, RngDraw::from_entropy(), None)
    }

    /// Starts a walk with an explicit draw source and optional start state.
    pub fn walk_with<D: Draw>(&self, draw: D, start: Option<&[T]>) -> Result<Walker<T, D>, MarkovError> {
        Walker::new(self, draw, start)
    }
}

impl<T> fmt::Display for Chain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Chain(order={}, states={})", self.order, self.states.len())
    }
}

impl<T> From<Chain<T>> for ChainRecord<T> {
    fn from(chain: Chain<T>) -> Self {
        Self {
            order: chain.order,
            states: chain.states.into_iter().collect(),
        }
    }
}

impl<T: Clone + Eq + Hash> TryFrom<ChainRecord<T>> for Chain<T> {
    type Error = MarkovError;

    fn try_from(record: ChainRecord<T>) -> Result<Self, Self::Error> {
        Chain::from_states(record.order, record.states)
    }
}
