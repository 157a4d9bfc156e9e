//! Dice with arbitrary integer faces.

use crate::rng::{EntropySource, SampleError, SecureSampler};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors from die construction
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DieError {
    #[error("A die needs at least one face")]
    Empty,

    #[error("Malformed face list {input:?}: {reason}")]
    Malformed { input: String, reason: String },
}

/// A die with an ordered, immutable list of integer faces.
///
/// Faces may repeat; rolling picks a uniform index, so a repeated face is
/// proportionally more likely. Each roll is an independent sample with no
/// state carried between rolls.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<i64>", into = "Vec<i64>")]
pub struct Die {
    faces: Vec<i64>,
}

impl TryFrom<Vec<i64>> for Die {
    type Error = DieError;

    fn try_from(faces: Vec<i64>) -> Result<Self, Self::Error> {
        Self::new(faces)
    }
}

impl From<Die> for Vec<i64> {
    fn from(die: Die) -> Self {
        die.faces
    }
}

impl Die {
    /// Create a die from its face list
    pub fn new(faces: Vec<i64>) -> Result<Self, DieError> {
        if faces.is_empty() {
            return Err(DieError::Empty);
        }
        Ok(Self { faces })
    }

    /// The face list
    pub fn faces(&self) -> &[i64] {
        &self.faces
    }

    /// Number of faces
    pub fn face_count(&self) -> u64 {
        self.faces.len() as u64
    }

    /// Face at a sampled or protocol-agreed index
    pub fn face(&self, index: u64) -> Option<i64> {
        self.faces.get(index as usize).copied()
    }

    /// Roll the die: one independent uniform sample over the faces
    pub fn roll<S: EntropySource>(
        &self,
        sampler: &mut SecureSampler<S>,
    ) -> Result<i64, SampleError> {
        let index = sampler.sample(self.face_count())?;
        Ok(self.faces[index as usize])
    }
}

impl FromStr for Die {
    type Err = DieError;

    /// Parse a comma-separated face list such as `2,2,4,4,9,9`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let faces = s
            .split(',')
            .map(|face| {
                face.trim().parse::<i64>().map_err(|e| DieError::Malformed {
                    input: s.to_string(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(faces)
    }
}

impl fmt::Display for Die {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.faces.iter().map(|face| face.to_string()).collect();
        write!(f, "[{}]", rendered.join(","))
    }
}
