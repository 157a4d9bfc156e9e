//! Fairdice Core Library
//!
//! This crate provides the cryptographic primitives, unbiased sampling, and
//! commit-reveal protocol logic for the fair dice game.

pub mod crypto;
pub mod games;
pub mod protocol;
pub mod rng;

pub use crypto::{Commitment, CommitmentError, SecretKey};
pub use games::{Die, DieError};
pub use protocol::{CommitNotice, FairRandomRound, ProtocolError, RevealNotice, RoundId};
pub use rng::{EntropySource, OsEntropy, SampleError, SecureSampler};
