/// Error taxonomy shared by every chain operation.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarkovError {
    #[error("order must be a positive integer, got {0}")]
    InvalidOrder(usize),
    #[error("corpus too short: need at least {needed} tokens, got {got}")]
    CorpusTooShort { needed: usize, got: usize },
    #[error("state must have length {expected}, {actual} given")]
    InvalidKey { expected: usize, actual: usize },
    #[error("invalid continuation weights: {0}")]
    InvalidValue(String),
    #[error("weights must be finite, non-negative and contain a positive entry")]
    InvalidWeights,
    #[error("incompatible chains: order {left} vs order {right}")]
    IncompatibleOrder { left: usize, right: usize },
    #[error("start state is not present in the chain")]
    UnknownStartState,
    #[error("walker exhausted: reached a state with no known continuation")]
    Exhausted,
    #[error("chain has no states to walk")]
    EmptyChain,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("RON serialization error: {0}")]
    RonEncode(#[from] ron::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_report_lengths() {
        let err = MarkovError::InvalidKey {
            expected: 2,
            actual: 3,
        };
        assert_eq!(err.to_string(), "state must have length 2, 3 given");

        let err = MarkovError::CorpusTooShort { needed: 3, got: 1 };
        assert!(err.to_string().contains("need at least 3"));
    }
}
