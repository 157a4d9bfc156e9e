//! Commit-reveal protocol types and messages.

mod fair_random;
mod messages;
mod types;

pub use fair_random::{FairRandomRound, ProtocolError};
pub use messages::{CommitNotice, RevealNotice};
pub use types::RoundId;
