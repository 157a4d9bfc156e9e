//! Unbiased bounded sampling from a cryptographically secure entropy source.

mod sampler;

pub use sampler::{EntropySource, OsEntropy, SampleError, SecureSampler};
