//! Protocol messages.
//!
//! The hex-encoded key and digest are the protocol's only wire surface; the
//! serde forms here match what the collaborator layer prints.

use crate::crypto::{Commitment, SecretKey};
use crate::protocol::RoundId;
use serde::{Deserialize, Serialize};

/// Commit phase: published before the counterpart's number is known
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitNotice {
    pub round_id: RoundId,
    pub range: u64,
    #[serde(with = "commitment_hex")]
    pub commitment: Commitment,
}

/// Reveal phase: lets the counterpart recompute and check the commitment
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealNotice {
    pub round_id: RoundId,
    #[serde(with = "key_hex")]
    pub key: SecretKey,
    pub value: u64,
}

impl RevealNotice {
    /// Recompute the commitment and check it against the commit notice
    pub fn verifies(&self, notice: &CommitNotice) -> bool {
        self.round_id == notice.round_id && notice.commitment.verify(&self.key, self.value)
    }
}

mod commitment_hex {
    use crate::crypto::Commitment;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(commitment: &Commitment, s: S) -> Result<S::Ok, S::Error> {
        hex::encode(commitment.as_bytes()).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Commitment, D::Error> {
        let hex_str = String::deserialize(d)?;
        let bytes = hex::decode(&hex_str).map_err(serde::de::Error::custom)?;
        if bytes.len() != 32 {
            return Err(serde::de::Error::custom("expected 32 bytes"));
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Commitment::from_bytes(arr))
    }
}

mod key_hex {
    use crate::crypto::SecretKey;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(key: &SecretKey, s: S) -> Result<S::Ok, S::Error> {
        key.to_hex().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<SecretKey, D::Error> {
        let hex_str = String::deserialize(d)?;
        SecretKey::from_hex(&hex_str).map_err(serde::de::Error::custom)
    }
}
