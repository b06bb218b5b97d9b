//! # Domain Entities
//!
//! Core entities for the booking-payment escrow workflow.

use super::condition::Fulfillment;
use super::errors::EscrowError;
use super::value_objects::{EscrowStatus, PaymentKind, PaymentStatus, PaymentType, WorkflowStep};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A booking request as submitted by the client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BookingRequest {
    /// Coach being booked.
    pub coach_id: String,
    /// When the session starts.
    pub session_start: DateTime<Utc>,
    /// Session length in minutes.
    pub duration_minutes: u32,
    /// Court or venue identifier.
    pub court: String,
    /// Price as a decimal string, kept verbatim.
    pub amount: String,
    /// Escrow or direct settlement.
    pub payment_type: PaymentType,
    /// Optional free-text memo carried onto the ledger.
    pub memo: Option<String>,
}

/// A payment or escrow request handed to the transaction builder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Receiving ledger address.
    pub destination: String,
    /// Amount as a decimal string.
    pub amount: String,
    /// Optional free-text memo.
    pub memo: Option<String>,
}

/// A scheduled coaching session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier.
    pub session_id: String,
    /// Coach delivering the session.
    pub coach_id: String,
    /// When the session starts.
    pub scheduled_at: DateTime<Utc>,
    /// Session length in minutes.
    pub duration_minutes: u32,
    /// Court or venue identifier.
    pub court: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// When the session ends.
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.scheduled_at + Duration::minutes(i64::from(self.duration_minutes))
    }
}

/// An escrow contract held on the ledger.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EscrowContract {
    /// Booking this escrow pays for.
    pub booking_id: String,
    /// What the funds are for, free text.
    pub purpose: Option<String>,
    /// Funding address (the payer).
    pub owner: String,
    /// Receiving address (the payee).
    pub destination: String,
    /// Amount as originally quoted, kept verbatim.
    pub amount: String,
    /// Amount in ledger minor units.
    pub amount_minor: u64,
    /// Release condition: SHA-256 of the preimage, uppercase hex.
    pub condition: String,
    /// Release capability. Never serialized; status queries strip it.
    #[serde(skip)]
    pub fulfillment: Option<Fulfillment>,
    /// Ledger sequence number identifying this escrow for finish/cancel.
    pub offer_sequence: u32,
    /// Current status.
    pub status: EscrowStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// After this instant the escrow may be reclaimed by the owner.
    pub expires_at: DateTime<Utc>,
}

/// Parameters for creating an escrow contract.
#[derive(Clone, Debug)]
pub struct EscrowContractParams {
    /// Booking this escrow pays for.
    pub booking_id: String,
    /// What the funds are for, free text.
    pub purpose: Option<String>,
    /// Funding address.
    pub owner: String,
    /// Receiving address.
    pub destination: String,
    /// Amount as a decimal string.
    pub amount: String,
    /// Amount in ledger minor units.
    pub amount_minor: u64,
    /// Release condition hash, uppercase hex.
    pub condition: String,
    /// Release capability.
    pub fulfillment: Option<Fulfillment>,
    /// Ledger sequence number.
    pub offer_sequence: u32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Reclaim instant.
    pub expires_at: DateTime<Utc>,
}

impl EscrowContract {
    /// Create a new escrow contract in the `Created` status.
    pub fn new(params: EscrowContractParams) -> Self {
        Self {
            booking_id: params.booking_id,
            purpose: params.purpose,
            owner: params.owner,
            destination: params.destination,
            amount: params.amount,
            amount_minor: params.amount_minor,
            condition: params.condition,
            fulfillment: params.fulfillment,
            offer_sequence: params.offer_sequence,
            status: EscrowStatus::Created,
            created_at: params.created_at,
            expires_at: params.expires_at,
        }
    }

    /// Check if the reclaim window has opened.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Transition to a new status.
    pub fn transition_to(&mut self, next: EscrowStatus) -> Result<(), EscrowError> {
        if !self.status.can_transition_to(next) {
            return Err(EscrowError::InvalidTransition {
                from: format!("{:?}", self.status),
                to: format!("{:?}", next),
            });
        }
        self.status = next;
        Ok(())
    }
}

/// A recorded ledger transaction tied to a session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaymentTransaction {
    /// Internal record identifier.
    pub tx_id: String,
    /// Session this transaction settles.
    pub session_id: String,
    /// Paying address.
    pub payer: String,
    /// Receiving address.
    pub payee: String,
    /// Amount as a decimal string.
    pub amount: String,
    /// What the transaction did.
    #[serde(rename = "type")]
    pub kind: PaymentKind,
    /// Settlement status.
    pub status: PaymentStatus,
    /// Ledger transaction hash once known.
    pub tx_hash: Option<String>,
    /// Signing gateway request that produced the signature, if any.
    pub signing_request_id: Option<String>,
    /// Optional free-text memo.
    pub memo: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Parameters for recording a payment transaction.
#[derive(Clone, Debug)]
pub struct PaymentTransactionParams {
    /// Internal record identifier.
    pub tx_id: String,
    /// Session this transaction settles.
    pub session_id: String,
    /// Paying address.
    pub payer: String,
    /// Receiving address.
    pub payee: String,
    /// Amount as a decimal string.
    pub amount: String,
    /// What the transaction did.
    pub kind: PaymentKind,
    /// Settlement status.
    pub status: PaymentStatus,
    /// Ledger transaction hash once known.
    pub tx_hash: Option<String>,
    /// Signing gateway request, if any.
    pub signing_request_id: Option<String>,
    /// Optional memo.
    pub memo: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl PaymentTransaction {
    /// Record a new payment transaction.
    pub fn new(params: PaymentTransactionParams) -> Self {
        Self {
            tx_id: params.tx_id,
            session_id: params.session_id,
            payer: params.payer,
            payee: params.payee,
            amount: params.amount,
            kind: params.kind,
            status: params.status,
            tx_hash: params.tx_hash,
            signing_request_id: params.signing_request_id,
            memo: params.memo,
            created_at: params.created_at,
        }
    }
}

/// The booking workflow aggregate: one booking, its session, its escrow
/// and every ledger transaction recorded along the way.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Workflow {
    /// Booking identifier, `booking_<uuid>`.
    pub booking_id: String,
    /// Session identifier, `session_<uuid>`.
    pub session_id: String,
    /// Current step in the state machine.
    pub current_step: WorkflowStep,
    /// The booking as submitted.
    pub booking: BookingRequest,
    /// Scheduled session, set once the booking validates.
    pub session: Option<Session>,
    /// Escrow contract, set for escrow-paid bookings.
    pub escrow: Option<EscrowContract>,
    /// Append-only transaction history.
    pub transactions: Vec<PaymentTransaction>,
    /// Error recorded on cancellation or transient failure.
    pub error: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Workflow {
    /// Create a new workflow at the `Booking` step.
    pub fn new(
        booking_id: String,
        session_id: String,
        booking: BookingRequest,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            booking_id,
            session_id,
            current_step: WorkflowStep::Booking,
            booking,
            session: None,
            escrow: None,
            transactions: Vec::new(),
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Transition to a new step.
    pub fn transition_to(&mut self, next: WorkflowStep, now: DateTime<Utc>) -> Result<(), EscrowError> {
        if !self.current_step.can_transition_to(next) {
            return Err(EscrowError::InvalidTransition {
                from: format!("{:?}", self.current_step),
                to: format!("{:?}", next),
            });
        }
        self.current_step = next;
        self.updated_at = now;
        Ok(())
    }

    /// Append a transaction to the history. History is append-only;
    /// existing entries are never replaced.
    pub fn record_transaction(&mut self, tx: PaymentTransaction) {
        self.transactions.push(tx);
    }

    /// Record an error and cancel the workflow if it is not already in
    /// a terminal step.
    pub fn fail(&mut self, message: impl Into<String>, now: DateTime<Utc>) {
        self.error = Some(message.into());
        if !self.current_step.is_terminal() {
            self.current_step = WorkflowStep::Cancelled;
        }
        self.updated_at = now;
    }

    /// The escrow contract if one exists and is still live on the ledger.
    pub fn active_escrow(&self) -> Option<&EscrowContract> {
        self.escrow.as_ref().filter(|e| !e.status.is_terminal())
    }

    /// A copy safe for status queries: the fulfillment capability is
    /// stripped so it can only travel through the finalize path.
    pub fn snapshot(&self) -> Workflow {
        let mut copy = self.clone();
        if let Some(escrow) = copy.escrow.as_mut() {
            escrow.fulfillment = None;
        }
        copy
    }
}

/// Outcome of a workflow operation. Operations report failure through
/// this shape instead of returning an error.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowResult {
    /// Whether the operation succeeded.
    pub success: bool,
    /// The workflow after the operation, if one exists.
    pub workflow: Option<Workflow>,
    /// Error message when `success` is false.
    pub error: Option<String>,
}

impl WorkflowResult {
    /// A successful outcome.
    pub fn ok(workflow: Workflow) -> Self {
        Self {
            success: true,
            workflow: Some(workflow),
            error: None,
        }
    }

    /// A failed outcome, with the workflow attached when one was found.
    pub fn failed(workflow: Option<Workflow>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            workflow,
            error: Some(error.into()),
        }
    }
}
