//! Random-variate machinery: inverse CDFs, synchronized uniform streams for
//! antithetic pairing, and the per-run sampler that ties them to the model's
//! draw menu.

pub mod quantile;
pub mod sampler;
pub mod streams;

pub use sampler::Sampler;
pub use streams::{
    antithetic_pair, interarrival_pair, pair_base_seeds, validate_pair_count, StreamBudgets,
    StreamKind, UniformStreams,
};
