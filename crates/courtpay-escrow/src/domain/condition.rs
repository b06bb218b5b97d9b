//! # Condition Types
//!
//! The crypto-condition triple that gates escrow release, and the
//! zeroizing wrapper for the fulfillment half of it.
//!
//! ## Security
//!
//! The fulfillment is a capability: whoever presents it can release the
//! escrowed funds. It must never appear in logs or status responses, and
//! it should not linger in memory after use. The wrapper zeroizes on
//! drop and redacts itself from `Debug` output.

use zeroize::{Zeroize, ZeroizeOnDrop};

/// The secret half of a crypto-condition, as uppercase hex.
///
/// # Security
///
/// This type implements `Zeroize` and `ZeroizeOnDrop` so the hex string
/// is wiped when the value is dropped. It deliberately has no serde
/// implementations; fields holding it are skipped during serialization.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Fulfillment {
    /// Uppercase hex encoding of the 32-byte preimage.
    inner: String,
}

impl Fulfillment {
    /// Wrap an already-encoded fulfillment string.
    ///
    /// No format check happens here: callers hand the value to the
    /// ledger verbatim and the ledger is the authority on whether it
    /// satisfies the condition.
    pub fn new(hex: impl Into<String>) -> Self {
        Self { inner: hex.into() }
    }

    /// Get the hex string (use carefully!).
    ///
    /// # Security
    ///
    /// Avoid keeping references to the returned slice.
    /// Use immediately and let go.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Decode back to preimage bytes, if the string is valid hex.
    pub fn preimage_bytes(&self) -> Option<Vec<u8>> {
        hex::decode(&self.inner).ok()
    }
}

impl std::fmt::Debug for Fulfillment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the actual fulfillment
        f.write_str("Fulfillment(***)")
    }
}

/// A freshly generated crypto-condition: preimage, its hash, and the
/// hex fulfillment derived from it.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ConditionTriple {
    /// Random 32-byte preimage.
    preimage: [u8; 32],
    /// SHA-256 of the preimage, uppercase hex. Safe to share.
    #[zeroize(skip)]
    pub condition: String,
    /// Uppercase hex of the preimage. Release capability.
    pub fulfillment: Fulfillment,
}

impl ConditionTriple {
    /// Assemble a triple from already-derived parts.
    pub fn new(preimage: [u8; 32], condition: String, fulfillment: Fulfillment) -> Self {
        Self {
            preimage,
            condition,
            fulfillment,
        }
    }

    /// Get the preimage bytes (use carefully!).
    pub fn preimage(&self) -> &[u8; 32] {
        &self.preimage
    }
}

impl std::fmt::Debug for ConditionTriple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionTriple")
            .field("condition", &self.condition)
            .field("fulfillment", &self.fulfillment)
            .finish_non_exhaustive()
    }
}
