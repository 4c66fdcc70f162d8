pub mod chain;
pub mod error;
pub mod sampler;
pub mod store;
pub mod text;
pub mod walker;
pub mod weights;
