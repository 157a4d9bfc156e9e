//! Rejection-sampling over a substitutable entropy source.

use rand::RngCore;
use thiserror::Error;

/// Rejected draws allowed before the sampler gives up on its source.
const MAX_DRAWS: u32 = 128;

/// Errors from sampling
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SampleError {
    #[error("Invalid range: must be at least 1")]
    InvalidRange,

    #[error("Entropy source exhausted: {draws} draws rejected in a row")]
    EntropyExhausted { draws: u32 },

    #[error("Entropy source failure: {0}")]
    SourceFailure(String),
}

/// Source of cryptographically strong random bytes.
///
/// Injected into [`SecureSampler`] at construction so tests can substitute a
/// scripted source for the operating system CSPRNG.
pub trait EntropySource {
    /// Fill `dest` with random bytes.
    fn fill(&mut self, dest: &mut [u8]) -> Result<(), SampleError>;
}

/// Default entropy source backed by the operating system CSPRNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&mut self, dest: &mut [u8]) -> Result<(), SampleError> {
        rand::rngs::OsRng
            .try_fill_bytes(dest)
            .map_err(|e| SampleError::SourceFailure(e.to_string()))
    }
}

/// Uniform sampler over `[0, range)` with no modulo bias.
///
/// Draws the minimal number of bytes covering the range, masks the excess
/// bits of the leading byte, and rejects candidates at or above the range.
/// Masking keeps the acceptance probability above one half, so the expected
/// number of draws is below two for any range.
pub struct SecureSampler<S: EntropySource = OsEntropy> {
    source: S,
}

impl SecureSampler<OsEntropy> {
    /// Create a sampler over the operating system CSPRNG
    pub fn new() -> Self {
        Self { source: OsEntropy }
    }
}

impl Default for SecureSampler<OsEntropy> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: EntropySource> SecureSampler<S> {
    /// Create a sampler over a caller-supplied entropy source
    pub fn with_source(source: S) -> Self {
        Self { source }
    }

    /// Sample a uniform integer in `[0, range)`.
    ///
    /// `range == 0` is invalid input. A source that keeps producing rejected
    /// candidates fails with [`SampleError::EntropyExhausted`] after a
    /// bounded number of draws instead of looping forever.
    pub fn sample(&mut self, range: u64) -> Result<u64, SampleError> {
        if range == 0 {
            return Err(SampleError::InvalidRange);
        }
        if range == 1 {
            return Ok(0);
        }

        let bits = 64 - (range - 1).leading_zeros();
        let width = ((bits + 7) / 8) as usize;
        let mask: u8 = if bits % 8 == 0 {
            0xff
        } else {
            (1u8 << (bits % 8)) - 1
        };

        let mut buf = [0u8; 8];
        for _ in 0..MAX_DRAWS {
            self.source.fill(&mut buf[..width])?;
            buf[0] &= mask;

            let mut candidate: u64 = 0;
            for &byte in &buf[..width] {
                candidate = (candidate << 8) | u64::from(byte);
            }

            if candidate < range {
                return Ok(candidate);
            }
        }

        Err(SampleError::EntropyExhausted { draws: MAX_DRAWS })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scripted source that replays a fixed byte sequence
    struct ScriptedEntropy {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl ScriptedEntropy {
        fn new(bytes: Vec<u8>) -> Self {
            Self { bytes, pos: 0 }
        }
    }

    impl EntropySource for ScriptedEntropy {
        fn fill(&mut self, dest: &mut [u8]) -> Result<(), SampleError> {
            for slot in dest.iter_mut() {
                *slot = self.bytes[self.pos % self.bytes.len()];
                self.pos += 1;
            }
            Ok(())
        }
    }

    /// Source whose every byte is 0xff, so every masked candidate for a
    /// non-power-of-two range is rejected
    struct SaturatedEntropy;

    impl EntropySource for SaturatedEntropy {
        fn fill(&mut self, dest: &mut [u8]) -> Result<(), SampleError> {
            dest.fill(0xff);
            Ok(())
        }
    }

    #[test]
    fn test_sample_zero_range_fails() {
        let mut sampler = SecureSampler::new();
        assert_eq!(sampler.sample(0), Err(SampleError::InvalidRange));
    }

    #[test]
    fn test_sample_range_one_is_always_zero() {
        let mut sampler = SecureSampler::new();
        for _ in 0..100 {
            assert_eq!(sampler.sample(1).unwrap(), 0);
        }
    }

    #[test]
    fn test_samples_stay_in_range() {
        let mut sampler = SecureSampler::new();
        for range in [2, 3, 6, 7, 100, 255, 256, 257, 1000, u64::from(u32::MAX) + 1] {
            for _ in 0..1000 {
                let sample = sampler.sample(range).unwrap();
                assert!(sample < range, "sample {} out of range {}", sample, range);
            }
        }
    }

    #[test]
    fn test_scripted_source_is_deterministic() {
        // 0x05 masked to 3 bits is 5, accepted for range 6
        let mut sampler = SecureSampler::with_source(ScriptedEntropy::new(vec![0x05]));
        assert_eq!(sampler.sample(6).unwrap(), 5);
    }

    #[test]
    fn test_rejection_redraws_until_in_range() {
        // range 6 needs 3 bits; 0x07 masks to 7 (rejected), 0xfe masks to 6
        // (rejected), 0x02 masks to 2 (accepted)
        let mut sampler = SecureSampler::with_source(ScriptedEntropy::new(vec![0x07, 0xfe, 0x02]));
        assert_eq!(sampler.sample(6).unwrap(), 2);
    }

    #[test]
    fn test_multi_byte_range_big_endian() {
        // range 1000 needs 10 bits over two bytes; 0x01 0xf4 is 500
        let mut sampler = SecureSampler::with_source(ScriptedEntropy::new(vec![0x01, 0xf4]));
        assert_eq!(sampler.sample(1000).unwrap(), 500);
    }

    #[test]
    fn test_saturated_source_exhausts() {
        let mut sampler = SecureSampler::with_source(SaturatedEntropy);
        assert_eq!(
            sampler.sample(6),
            Err(SampleError::EntropyExhausted { draws: MAX_DRAWS })
        );
    }

    #[test]
    fn test_power_of_two_range_never_rejects() {
        // For range 256 every byte is a valid candidate, even all-ones
        let mut sampler = SecureSampler::with_source(SaturatedEntropy);
        assert_eq!(sampler.sample(256).unwrap(), 255);
    }

    #[test]
    fn test_uniformity_chi_square() {
        let mut sampler = SecureSampler::new();
        const TRIALS: u64 = 100_000;
        const RANGE: usize = 6;

        let mut counts = [0u64; RANGE];
        for _ in 0..TRIALS {
            counts[sampler.sample(RANGE as u64).unwrap() as usize] += 1;
        }

        let expected = TRIALS as f64 / RANGE as f64;
        let chi_square: f64 = counts
            .iter()
            .map(|&observed| {
                let diff = observed as f64 - expected;
                diff * diff / expected
            })
            .sum();

        // df = 5; 40.0 corresponds to p < 1e-6, far beyond random flakiness
        assert!(chi_square < 40.0, "chi-square too high: {}", chi_square);
    }
}
