//! # Domain Errors
//!
//! Error types for the booking-payment escrow workflow.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, EscrowError>;

/// Escrow workflow error types.
#[derive(Debug, Error)]
pub enum EscrowError {
    /// Booking or escrow request failed validation.
    ///
    /// Carries every message collected in one pass, not just the first.
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Address does not match the ledger address grammar.
    #[error("Invalid {field} address: {value}")]
    InvalidAddress {
        /// Which transaction field held the address.
        field: &'static str,
        /// The rejected value.
        value: String,
    },

    /// Amount failed to parse or convert to minor units.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Signing gateway could not be reached or returned a transport error.
    #[error("Signing gateway unavailable: {0}")]
    GatewayUnavailable(String),

    /// The signer explicitly declined the signing request.
    #[error("Signature request rejected by signer")]
    SignatureRejected,

    /// The signing request expired at the gateway before resolution.
    #[error("Signature request expired")]
    SignatureExpired,

    /// No resolution arrived within the polling deadline.
    #[error("Timed out waiting for signature after {waited_secs}s")]
    SignatureTimeout {
        /// Seconds waited before giving up.
        waited_secs: u64,
    },

    /// No workflow is stored under the given booking ID.
    #[error("Workflow not found")]
    WorkflowNotFound,

    /// Workflow has no escrow contract to finalize or cancel.
    #[error("Workflow has no escrow contract")]
    NoEscrowContract,

    /// Ledger rejected the transaction at submission time.
    #[error("Ledger submission failed: {0}")]
    Submission(String),

    /// Invalid workflow step transition.
    #[error("Invalid workflow transition: {from} -> {to}")]
    InvalidTransition {
        /// Current step
        from: String,
        /// Attempted step
        to: String,
    },

    /// Workflow was modified by another task between read and write.
    #[error("Concurrent modification of workflow {0}")]
    Conflict(String),

    /// Configuration failed validation at startup.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl EscrowError {
    /// True when the failure is transient and the workflow should stay at
    /// its last successful step so the caller can retry.
    ///
    /// Everything else cancels the workflow.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EscrowError::GatewayUnavailable(_) | EscrowError::SignatureTimeout { .. }
        )
    }
}
