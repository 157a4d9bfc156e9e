//! Cryptographic primitives for the fair dice protocol.
//!
//! This module provides:
//! - SecretKey generated fresh per protocol round
//! - Commitment, a keyed MAC binding a value to that key

mod commitment;

pub use commitment::{Commitment, CommitmentError, SecretKey, KEY_LEN};
