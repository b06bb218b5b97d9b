//! # Condition Generation and Verification
//!
//! Cryptographic operations for escrow crypto-conditions: fresh random
//! preimages, SHA-256 condition hashes and fulfillment verification.

use crate::domain::{ConditionTriple, Fulfillment};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Generate a cryptographically secure random preimage.
pub fn generate_preimage() -> [u8; 32] {
    let mut preimage = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut preimage);
    preimage
}

/// Hash a preimage into its condition with SHA-256.
pub fn condition_for(preimage: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(preimage);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// Generate a fresh condition triple for one escrow.
///
/// A new random preimage is drawn per call; triples are never reused
/// across escrows. Both hex encodings are uppercase, the form the
/// ledger expects.
pub fn generate_condition_triple() -> ConditionTriple {
    let preimage = generate_preimage();
    let condition = hex::encode_upper(condition_for(&preimage));
    let fulfillment = Fulfillment::new(hex::encode_upper(preimage));
    ConditionTriple::new(preimage, condition, fulfillment)
}

/// Verify that a fulfillment satisfies a condition.
///
/// Decodes both hex strings and compares SHA-256 of the preimage with
/// the condition hash. Case-insensitive on the hex, false on any
/// malformed input.
pub fn verify_fulfillment(fulfillment_hex: &str, condition_hex: &str) -> bool {
    let Ok(preimage) = hex::decode(fulfillment_hex) else {
        return false;
    };
    let Ok(condition) = hex::decode(condition_hex) else {
        return false;
    };
    condition_for(&preimage).as_slice() == condition
}
