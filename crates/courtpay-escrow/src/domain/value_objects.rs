//! # Domain Value Objects
//!
//! Immutable value types for the booking-payment escrow workflow: the
//! workflow step machine, escrow and payment status enums, ledger address
//! grammar, and minor-unit money conversion.

use super::errors::{EscrowError, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Minor units per whole ledger currency unit.
pub const MINOR_UNITS_PER_MAJOR: u64 = 1_000_000;

/// Maximum decimal places an amount may carry before minor-unit
/// conversion would truncate.
pub const MAX_AMOUNT_SCALE: u32 = 6;

/// How a booking is paid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    /// Funds held in a conditional escrow until the session completes.
    #[default]
    Escrow,
    /// Immediate ledger payment, no escrow.
    Direct,
}

/// Booking workflow state machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStep {
    /// Booking received, nothing submitted yet.
    #[default]
    Booking,
    /// Escrow transaction being built and submitted.
    EscrowCreation,
    /// Escrow on the ledger, awaiting session.
    EscrowPending,
    /// Session confirmed on the calendar.
    SessionScheduled,
    /// Escrow finish in flight.
    EscrowFinalization,
    /// Funds released, workflow done.
    Completed,
    /// Aborted with an error recorded.
    Cancelled,
    /// Escrow returned to the payer.
    Refunded,
}

impl WorkflowStep {
    /// Check if transition is valid.
    pub fn can_transition_to(&self, next: WorkflowStep) -> bool {
        // Cancellation and refund are reachable from any non-terminal step.
        if !self.is_terminal() && matches!(next, Self::Cancelled | Self::Refunded) {
            return true;
        }
        match (self, next) {
            (Self::Booking, Self::EscrowCreation) => true,
            (Self::EscrowCreation, Self::EscrowPending) => true,
            // Direct payments skip the escrow-pending step.
            (Self::EscrowCreation, Self::SessionScheduled) => true,
            (Self::EscrowPending, Self::SessionScheduled) => true,
            (Self::SessionScheduled, Self::EscrowFinalization) => true,
            // A transient finalize failure steps back for retry.
            (Self::EscrowFinalization, Self::SessionScheduled) => true,
            (Self::EscrowFinalization, Self::Completed) => true,
            _ => false,
        }
    }

    /// Check if terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Refunded)
    }
}

/// On-ledger escrow contract status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscrowStatus {
    /// Escrow exists on the ledger, funds locked.
    #[default]
    Created,
    /// Finish submitted, awaiting ledger confirmation.
    PendingCompletion,
    /// Condition met, funds released to the payee.
    Completed,
    /// Escrow cancelled, funds returned to the payer.
    Cancelled,
    /// Past its expiry without resolution.
    Expired,
}

impl EscrowStatus {
    /// Check if transition is valid.
    pub fn can_transition_to(&self, next: EscrowStatus) -> bool {
        match (self, next) {
            (Self::Created, Self::PendingCompletion) => true,
            (Self::Created, Self::Completed) => true,
            (Self::Created, Self::Cancelled) => true,
            (Self::Created, Self::Expired) => true,
            (Self::PendingCompletion, Self::Completed) => true,
            (Self::PendingCompletion, Self::Cancelled) => true,
            _ => false,
        }
    }

    /// Check if terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Expired)
    }
}

/// What a recorded payment transaction did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    /// Plain ledger payment.
    Payment,
    /// Escrow creation (funds locked).
    EscrowCreate,
    /// Escrow finish (funds released).
    EscrowFinish,
    /// Escrow cancel (funds returned).
    EscrowCancel,
    /// Compensating transfer for a direct payment.
    Refund,
}

/// Settlement status of a recorded payment transaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Submitted, not yet validated by the ledger.
    #[default]
    Pending,
    /// Signed through the gateway, ledger validation not yet observed.
    PendingSignature,
    /// Validated by the ledger.
    Confirmed,
    /// Rejected or abandoned.
    Failed,
}

/// Base58 alphabet used by ledger addresses. Excludes 0, O, I and l.
const ADDRESS_ALPHABET: &str = "rpshnaf39wBUDNEGHJKLM4PQRST7VWXYZ2bcdeCg65jkm8oFqi1tuvAxyz";

/// Check a string against the ledger address grammar: leading `r`,
/// 25 to 35 characters, base58 alphabet throughout.
pub fn is_valid_address(value: &str) -> bool {
    if !value.starts_with('r') {
        return false;
    }
    if value.len() < 25 || value.len() > 35 {
        return false;
    }
    value.chars().all(|c| ADDRESS_ALPHABET.contains(c))
}

/// Parse a decimal amount string.
///
/// Rejects anything that is not a finite positive decimal.
pub fn parse_amount(value: &str) -> Result<Decimal> {
    let amount = Decimal::from_str(value.trim())
        .map_err(|_| EscrowError::InvalidAmount(format!("not a decimal number: {value}")))?;
    if amount <= Decimal::ZERO {
        return Err(EscrowError::InvalidAmount(format!(
            "amount must be positive: {value}"
        )));
    }
    Ok(amount)
}

/// Convert a whole-currency amount to ledger minor units.
///
/// Fails on overflow and on precision finer than one minor unit. Amounts
/// are never silently truncated.
pub fn to_minor_units(amount: Decimal) -> Result<u64> {
    let scaled = amount
        .checked_mul(Decimal::from(MINOR_UNITS_PER_MAJOR))
        .ok_or_else(|| EscrowError::InvalidAmount(format!("amount out of range: {amount}")))?;
    if !scaled.fract().is_zero() {
        return Err(EscrowError::InvalidAmount(format!(
            "more than {MAX_AMOUNT_SCALE} decimal places: {amount}"
        )));
    }
    scaled
        .to_u64()
        .ok_or_else(|| EscrowError::InvalidAmount(format!("amount out of range: {amount}")))
}
