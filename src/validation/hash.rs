//! Content hashing for validation cache keys

use prost::Message;
use sha2::{Digest, Sha256};

use crate::errors::{Result, TranslatorError};

/// Deterministic 64-bit digest of an artifact.
///
/// Semantically equal artifacts must hash equal. Failing to hash is a bug,
/// never a property of user input.
pub trait ContentHash {
    fn content_hash(&self) -> Result<u64>;
}

/// First eight bytes of `digest`, big-endian.
pub fn truncate_digest(digest: &[u8]) -> Result<u64> {
    let prefix: [u8; 8] = digest
        .get(..8)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or_else(|| {
            TranslatorError::hashing(format!(
                "digest of {} bytes is too short for a 64-bit key",
                digest.len()
            ))
        })?;
    Ok(u64::from_be_bytes(prefix))
}

/// SHA-256 of the message encoding, truncated to 64 bits.
///
/// Only stable for messages whose encoding is deterministic, i.e. without
/// `HashMap` fields.
pub fn hash_message<M: Message>(msg: &M) -> Result<u64> {
    truncate_digest(&Sha256::digest(msg.encode_to_vec()))
}
