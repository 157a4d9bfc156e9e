//! Commit-reveal round yielding a value neither party can bias alone.

use crate::crypto::{Commitment, SecretKey};
use crate::protocol::{CommitNotice, RevealNotice, RoundId};
use crate::rng::{EntropySource, SampleError, SecureSampler};
use thiserror::Error;

/// Errors from the commit-reveal state machine
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Round already finalized")]
    AlreadyFinalized,

    #[error("Key and committed value stay hidden until the round is finalized")]
    NotRevealed,

    #[error("Sampling failed: {0}")]
    Sample(#[from] SampleError),
}

/// Reveal-gated round state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Committed,
    Revealed { counterpart: u64, result: u64 },
}

/// One fair random exchange: commit, take the counterpart's number, reveal.
///
/// Construction atomically draws a fresh key, samples the hidden value, and
/// computes the commitment, so there is no observable state in which the
/// committing party could still change its mind. The key and hidden value
/// become readable only after [`finalize`](Self::finalize) fixes the
/// counterpart's contribution; requesting them earlier is an ordering bug
/// surfaced as [`ProtocolError::NotRevealed`].
#[derive(Debug)]
pub struct FairRandomRound {
    id: RoundId,
    range: u64,
    key: SecretKey,
    hidden: u64,
    commitment: Commitment,
    phase: Phase,
}

impl FairRandomRound {
    /// Start a round over `[0, range)` and commit immediately
    pub fn new<S: EntropySource>(
        range: u64,
        sampler: &mut SecureSampler<S>,
    ) -> Result<Self, ProtocolError> {
        let key = SecretKey::random();
        let hidden = sampler.sample(range)?;
        let commitment = Commitment::over(&key, hidden);

        Ok(Self {
            id: RoundId::new(),
            range,
            key,
            hidden,
            commitment,
            phase: Phase::Committed,
        })
    }

    /// Round identifier
    pub fn id(&self) -> RoundId {
        self.id
    }

    /// Size of the sample space
    pub fn range(&self) -> u64 {
        self.range
    }

    /// The commitment, safe to publish before the counterpart answers
    pub fn commitment(&self) -> Commitment {
        self.commitment
    }

    /// Commit-phase message for the counterpart
    pub fn commit_notice(&self) -> CommitNotice {
        CommitNotice {
            round_id: self.id,
            range: self.range,
            commitment: self.commitment,
        }
    }

    /// Fix the counterpart's number and compute the fair result.
    ///
    /// The result is `(hidden + counterpart) mod range`; the sum is taken in
    /// 128 bits so an adversarial counterpart value cannot overflow.
    pub fn finalize(&mut self, counterpart: u64) -> Result<u64, ProtocolError> {
        if matches!(self.phase, Phase::Revealed { .. }) {
            return Err(ProtocolError::AlreadyFinalized);
        }

        let result =
            ((u128::from(self.hidden) + u128::from(counterpart)) % u128::from(self.range)) as u64;
        self.phase = Phase::Revealed {
            counterpart,
            result,
        };
        Ok(result)
    }

    /// The key, readable once the round is finalized
    pub fn reveal_key(&self) -> Result<&SecretKey, ProtocolError> {
        match self.phase {
            Phase::Revealed { .. } => Ok(&self.key),
            Phase::Committed => Err(ProtocolError::NotRevealed),
        }
    }

    /// The hidden value, readable once the round is finalized
    pub fn committed_value(&self) -> Result<u64, ProtocolError> {
        match self.phase {
            Phase::Revealed { .. } => Ok(self.hidden),
            Phase::Committed => Err(ProtocolError::NotRevealed),
        }
    }

    /// The counterpart's number as fixed at finalize time
    pub fn counterpart_value(&self) -> Result<u64, ProtocolError> {
        match self.phase {
            Phase::Revealed { counterpart, .. } => Ok(counterpart),
            Phase::Committed => Err(ProtocolError::NotRevealed),
        }
    }

    /// The fair result, readable once the round is finalized
    pub fn result(&self) -> Result<u64, ProtocolError> {
        match self.phase {
            Phase::Revealed { result, .. } => Ok(result),
            Phase::Committed => Err(ProtocolError::NotRevealed),
        }
    }

    /// Reveal-phase message letting the counterpart recheck the commitment
    pub fn reveal_notice(&self) -> Result<RevealNotice, ProtocolError> {
        Ok(RevealNotice {
            round_id: self.id,
            key: self.reveal_key()?.clone(),
            value: self.committed_value()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::OsEntropy;

    fn sampler() -> SecureSampler<OsEntropy> {
        SecureSampler::new()
    }

    #[test]
    fn test_zero_range_fails_at_init() {
        assert_eq!(
            FairRandomRound::new(0, &mut sampler()).unwrap_err(),
            ProtocolError::Sample(SampleError::InvalidRange)
        );
    }

    #[test]
    fn test_reveal_before_finalize_fails() {
        let round = FairRandomRound::new(6, &mut sampler()).unwrap();

        assert_eq!(round.reveal_key().unwrap_err(), ProtocolError::NotRevealed);
        assert_eq!(
            round.committed_value().unwrap_err(),
            ProtocolError::NotRevealed
        );
        assert_eq!(round.result().unwrap_err(), ProtocolError::NotRevealed);
        assert_eq!(
            round.reveal_notice().unwrap_err(),
            ProtocolError::NotRevealed
        );
    }

    #[test]
    fn test_double_finalize_fails() {
        let mut round = FairRandomRound::new(6, &mut sampler()).unwrap();

        round.finalize(3).unwrap();
        assert_eq!(round.finalize(3).unwrap_err(), ProtocolError::AlreadyFinalized);
    }

    #[test]
    fn test_result_is_modular_sum() {
        let mut round = FairRandomRound::new(6, &mut sampler()).unwrap();
        let result = round.finalize(4).unwrap();

        let hidden = round.committed_value().unwrap();
        assert_eq!(result, (hidden + 4) % 6);
        assert_eq!(round.result().unwrap(), result);
        assert_eq!(round.counterpart_value().unwrap(), 4);
    }

    #[test]
    fn test_oversized_counterpart_wraps() {
        let mut round = FairRandomRound::new(2, &mut sampler()).unwrap();
        let result = round.finalize(u64::MAX).unwrap();

        assert!(result < 2);
    }

    #[test]
    fn test_commitment_verifies_after_reveal() {
        let mut round = FairRandomRound::new(6, &mut sampler()).unwrap();
        let commitment = round.commitment();
        round.finalize(2).unwrap();

        let key = round.reveal_key().unwrap();
        let value = round.committed_value().unwrap();
        assert!(commitment.verify(key, value));
    }

    #[test]
    fn test_commitment_unchanged_by_finalize() {
        let mut round = FairRandomRound::new(6, &mut sampler()).unwrap();
        let before = round.commitment();
        round.finalize(5).unwrap();

        assert_eq!(before, round.commitment());
    }

    #[test]
    fn test_parity_outcomes_are_unbiased() {
        const TRIALS: u64 = 10_000;
        let mut sampler = sampler();

        let mut ones = 0u64;
        for trial in 0..TRIALS {
            let mut round = FairRandomRound::new(2, &mut sampler).unwrap();
            // Alternate counterpart contributions across trials
            ones += round.finalize(trial % 2).unwrap();
        }

        // Expect ~5000; 10 sigma tolerance keeps this test deterministic in
        // practice while still catching a stuck bit
        let deviation = ones.abs_diff(TRIALS / 2);
        assert!(deviation < 500, "parity bias: {} ones", ones);
    }

    #[test]
    fn test_fresh_key_per_round() {
        let mut sampler = sampler();
        let mut round1 = FairRandomRound::new(6, &mut sampler).unwrap();
        let mut round2 = FairRandomRound::new(6, &mut sampler).unwrap();
        round1.finalize(0).unwrap();
        round2.finalize(0).unwrap();

        assert_ne!(
            round1.reveal_key().unwrap().as_bytes(),
            round2.reveal_key().unwrap().as_bytes()
        );
    }
}
