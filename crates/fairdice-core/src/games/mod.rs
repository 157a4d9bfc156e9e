//! Game definitions.

mod dice;

pub use dice::{Die, DieError};
