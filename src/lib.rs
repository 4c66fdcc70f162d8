//! Markov Chains — fixed-order transition tables over token streams.
//!
//! Learns how often each token follows every window of `order` tokens in a
//! corpus, then generates new sequences by walking those counts with
//! weighted random choice. Randomness is always injected, so walks can be
//! made fully reproducible.

pub mod core;
