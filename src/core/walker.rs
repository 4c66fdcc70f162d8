/// Chain walker — stateful generation over a frozen snapshot of a chain.

use rustc_hash::FxHashMap;
use std::fmt;
use std::hash::Hash;
use std::iter;

use crate::core::chain::Chain;
use crate::core::error::MarkovError;
use crate::core::sampler::{Draw, RngDraw, Sampler};

/// Lifecycle of a walker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// A state is chosen but nothing has been emitted from it yet.
    Fresh,
    /// At least one token has been emitted.
    Running,
    /// The last emitted token led into a state with no continuation.
    Exhausted,
}

/// Walks a chain, emitting one token per step.
///
/// A sampler is built for every state when the walker is created, and the
/// walker keeps its own copy of them: mutating or dropping the chain
/// afterwards does not affect a walk in progress.
///
/// When a step moves into a state the snapshot does not know, the token is
/// still returned and the walker becomes `Exhausted`; only the following
/// step fails. A chain without such a dead end walks forever.
pub struct Walker<T, D = RngDraw> {
    states: Vec<Vec<T>>,
    samplers: Vec<Sampler<T>>,
    index: FxHashMap<Vec<T>, usize>,
    current: usize,
    phase: Phase,
    draw: D,
}

impl<T: Clone + Eq + Hash, D: Draw> Walker<T, D> {
    /// Snapshot `chain` and position the walker at `start`, or at a random
    /// state when `start` is `None`.
    ///
    /// # Errors
    /// `EmptyChain` if there is nothing to walk, `UnknownStartState` if
    /// `start` is not a state of the chain. Callers wanting a random state
    /// instead should use `new_or_random`.
    pub fn new(chain: &Chain<T>, draw: D, start: Option<&[T]>) -> Result<Self, MarkovError> {
        let mut walker = Self::snapshot(chain, draw)?;
        match start {
            Some(state) => walker.reset(state)?,
            None => walker.reset_random(),
        }
        Ok(walker)
    }

    /// Like `new`, but an unknown `start` falls back to a random state.
    pub fn new_or_random(chain: &Chain<T>, draw: D, start: Option<&[T]>) -> Result<Self, MarkovError> {
        let mut walker = Self::snapshot(chain, draw)?;
        match start.and_then(|state| walker.index.get(state).copied()) {
            Some(slot) => walker.enter(slot),
            None => {
                if start.is_some() {
                    log::debug!("start state unknown, walking from a random state");
                }
                walker.reset_random();
            }
        }
        Ok(walker)
    }

    fn snapshot(chain: &Chain<T>, draw: D) -> Result<Self, MarkovError> {
        if chain.is_empty() {
            return Err(MarkovError::EmptyChain);
        }

        let mut states = Vec::with_capacity(chain.len());
        let mut samplers = Vec::with_capacity(chain.len());
        let mut index = FxHashMap::default();
        for (slot, (state, weights)) in chain.states().enumerate() {
            samplers.push(weights.sampler()?);
            index.insert(state.to_vec(), slot);
            states.push(state.to_vec());
        }

        Ok(Self {
            states,
            samplers,
            index,
            current: 0,
            phase: Phase::Fresh,
            draw,
        })
    }

    /// Restart at `start`, keeping the samplers.
    ///
    /// # Errors
    /// `UnknownStartState` if `start` is not in the snapshot; the walker is
    /// left as it was.
    pub fn reset(&mut self, start: &[T]) -> Result<(), MarkovError> {
        let slot = *self
            .index
            .get(start)
            .ok_or(MarkovError::UnknownStartState)?;
        self.enter(slot);
        Ok(())
    }

    /// Restart at a state picked uniformly with the draw source.
    pub fn reset_random(&mut self) {
        let count = self.states.len();
        let slot = ((self.draw.draw() * count as f64) as usize).min(count - 1);
        self.enter(slot);
    }

    fn enter(&mut self, slot: usize) {
        self.current = slot;
        self.phase = Phase::Fresh;
    }

    /// Emit the next token.
    ///
    /// # Errors
    /// `Exhausted` once the previous token led into a dead end.
    pub fn advance(&mut self) -> Result<T, MarkovError> {
        if self.phase == Phase::Exhausted {
            return Err(MarkovError::Exhausted);
        }

        let token = self.samplers[self.current]
            .sample(&mut self.draw)
            .clone();

        let next_state: Vec<T> = self.states[self.current][1..]
            .iter()
            .cloned()
            .chain(iter::once(token.clone()))
            .collect();

        match self.index.get(&next_state) {
            Some(&slot) => {
                log::trace!("walker moved to state slot {}", slot);
                self.current = slot;
                self.phase = Phase::Running;
            }
            None => {
                log::debug!("walker reached a state with no continuation");
                self.phase = Phase::Exhausted;
            }
        }

        Ok(token)
    }
}

impl<T, D> Walker<T, D> {
    /// The state the next token will be drawn from. After exhaustion this
    /// is the last state that had a continuation.
    pub fn state(&self) -> &[T] {
        &self.states[self.current]
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_exhausted(&self) -> bool {
        self.phase == Phase::Exhausted
    }

    /// Number of states in the snapshot.
    pub fn state_count(&self) -> usize {
        self.states.len()
    }
}

impl<T: Clone + Eq + Hash, D: Draw> Iterator for Walker<T, D> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.advance().ok()
    }
}

impl<T: fmt::Debug, D> fmt::Debug for Walker<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Walker")
            .field("states", &self.states.len())
            .field("state", &self.state())
            .field("phase", &self.phase)
            .finish()
    }
}

/// Builder for a walker drawing from `rand`. Created by `Chain::walker()`.
pub struct WalkerBuilder<'a, T> {
    chain: &'a Chain<T>,
    seed: Option<u64>,
    start: Option<Vec<T>>,
    fallback_to_random: bool,
}

impl<'a, T: Clone + Eq + Hash> WalkerBuilder<'a, T> {
    pub fn new(chain: &'a Chain<T>) -> Self {
        Self {
            chain,
            seed: None,
            start: None,
            fallback_to_random: false,
        }
    }

    /// Reproducible walks. Without a seed the generator uses OS entropy.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn start(mut self, state: &[T]) -> Self {
        self.start = Some(state.to_vec());
        self
    }

    /// Start from a random state when the requested one is unknown, instead
    /// of failing with `UnknownStartState`.
    pub fn fallback_to_random(mut self, fallback: bool) -> Self {
        self.fallback_to_random = fallback;
        self
    }

    pub fn build(self) -> Result<Walker<T, RngDraw>, MarkovError> {
        let draw = match self.seed {
            Some(seed) => RngDraw::seeded(seed),
            None => RngDraw::from_entropy(),
        };
        let start = self.start.as_deref();
        if self.fallback_to_random {
            Walker::new_or_random(self.chain, draw, start)
        } else {
            Walker::new(self.chain, draw, start)
        }
    }
}

impl<T: Clone + Eq + Hash> Chain<T> {
    /// Configure a walk over this chain.
    pub fn walker(&self) -> WalkerBuilder<'_, T> {
        WalkerBuilder::new(self)
    }
}
