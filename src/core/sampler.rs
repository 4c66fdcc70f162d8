/// Weighted random choice over a cumulative-weight table, and the draw
/// sources that feed it.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::error::MarkovError;

/// A source of uniform draws in `[0, 1)`.
///
/// Every sampling operation takes its randomness from a `Draw`, so tests can
/// substitute a fixed sequence for a real generator.
pub trait Draw {
    fn draw(&mut self) -> f64;
}

impl<F> Draw for F
where
    F: FnMut() -> f64,
{
    fn draw(&mut self) -> f64 {
        self()
    }
}

/// Draw source backed by a `rand` generator.
#[derive(Debug, Clone)]
pub struct RngDraw<R = StdRng> {
    rng: R,
}

impl RngDraw<StdRng> {
    /// Seeded from operating system entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible draws for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> RngDraw<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> Draw for RngDraw<R> {
    fn draw(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// A frozen weighted choice over a list of values.
///
/// The running totals are computed once; each pick is a binary search.
/// Values are distinct outcomes per entry, even when equal: callers that
/// want per-value aggregation must aggregate first (see `Weights`).
#[derive(Debug, Clone)]
pub struct Sampler<V> {
    values: Vec<V>,
    cumulative: Vec<f64>,
    total: f64,
    /// Highest index with a positive weight, used when a draw rounds up to
    /// the grand total.
    last_drawable: usize,
}

impl<V> Sampler<V> {
    /// Build a sampler from `(value, weight)` pairs, in the given order.
    ///
    /// # Errors
    /// `InvalidWeights` if the input is empty, any weight is negative or
    /// non-finite, or no weight is strictly positive.
    pub fn new<I>(items: I) -> Result<Self, MarkovError>
    where
        I: IntoIterator<Item = (V, f64)>,
    {
        let mut values = Vec::new();
        let mut cumulative = Vec::new();
        let mut total = 0.0;
        let mut last_drawable = None;

        for (value, weight) in items {
            if !weight.is_finite() || weight < 0.0 {
                return Err(MarkovError::InvalidWeights);
            }
            if weight > 0.0 {
                last_drawable = Some(values.len());
            }
            total += weight;
            values.push(value);
            cumulative.push(total);
        }

        let last_drawable = last_drawable.ok_or(MarkovError::InvalidWeights)?;

        Ok(Self {
            values,
            cumulative,
            total,
            last_drawable,
        })
    }

    /// Index of the bucket selected by draw `u`.
    ///
    /// Right-biased: returns the first index whose running total strictly
    /// exceeds `u * total`, so a draw landing on a boundary goes to the next
    /// bucket and zero-weight entries are never selected. Draws outside
    /// `[0, 1)` are clamped; NaN counts as `0`.
    pub fn index(&self, u: f64) -> usize {
        let u = if u.is_nan() { 0.0 } else { u.clamp(0.0, 1.0) };
        let target = u * self.total;
        self.cumulative
            .partition_point(|&running| running <= target)
            .min(self.last_drawable)
    }

    /// Value selected by draw `u`.
    pub fn choose(&self, u: f64) -> &V {
        &self.values[self.index(u)]
    }

    /// Draw a value using `draw`.
    pub fn sample<D: Draw + ?Sized>(&self, draw: &mut D) -> &V {
        self.choose(draw.draw())
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
