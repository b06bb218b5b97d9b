//! # Transaction Builder
//!
//! Pure construction of ledger-native transaction payloads. Builders
//! validate addresses and amounts, convert amounts to minor units and
//! hex-encode memo fields. They never touch the network and never sign.
//!
//! The escrow-finish builder carries the caller's fulfillment verbatim.
//! Checking that it actually satisfies the condition is the ledger's
//! job at submission time, not the builder's.

use crate::domain::{
    is_valid_address, parse_amount, to_minor_units, EscrowError, PaymentKind, PaymentRequest,
    Result,
};
use serde::{Deserialize, Serialize};

/// Memo type label for free-text notes.
const MEMO_TYPE_NOTE: &str = "memo";
/// Memo type label for the booking correlation ID.
const MEMO_TYPE_BOOKING: &str = "booking_id";

/// An opaque memo attached to a ledger transaction. Both fields are
/// uppercase hex encodings of UTF-8 bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxMemo {
    /// Hex-encoded memo type label.
    pub memo_type: String,
    /// Hex-encoded memo payload.
    pub memo_data: String,
}

impl TxMemo {
    /// Encode a memo from plain text.
    pub fn new(memo_type: &str, data: &str) -> Self {
        Self {
            memo_type: hex::encode_upper(memo_type.as_bytes()),
            memo_data: hex::encode_upper(data.as_bytes()),
        }
    }

    /// Decode the payload back to text, if it is valid hex over UTF-8.
    pub fn data_utf8(&self) -> Option<String> {
        let bytes = hex::decode(&self.memo_data).ok()?;
        String::from_utf8(bytes).ok()
    }
}

/// An escrow-creation transaction: lock funds under a condition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowCreateTx {
    /// Funding address (the payer).
    pub account: String,
    /// Receiving address once the condition is met.
    pub destination: String,
    /// Locked amount in minor units.
    pub amount_minor: u64,
    /// Release condition hash, uppercase hex.
    pub condition: String,
    /// Attached memos.
    pub memos: Vec<TxMemo>,
}

/// An escrow-finish transaction: release locked funds by presenting
/// the fulfillment.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowFinishTx {
    /// Address submitting the finish. May differ from the owner.
    pub account: String,
    /// Address that funded the escrow.
    pub owner: String,
    /// Ledger sequence identifying the escrow.
    pub offer_sequence: u32,
    /// The condition being satisfied.
    pub condition: String,
    /// The fulfillment, carried verbatim.
    pub fulfillment: String,
}

impl std::fmt::Debug for EscrowFinishTx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the fulfillment
        f.debug_struct("EscrowFinishTx")
            .field("account", &self.account)
            .field("owner", &self.owner)
            .field("offer_sequence", &self.offer_sequence)
            .field("condition", &self.condition)
            .field("fulfillment", &"***")
            .finish()
    }
}

/// An escrow-cancel transaction: return locked funds to the owner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowCancelTx {
    /// Address submitting the cancel.
    pub account: String,
    /// Address that funded the escrow.
    pub owner: String,
    /// Ledger sequence identifying the escrow.
    pub offer_sequence: u32,
}

/// A plain ledger payment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentTx {
    /// Paying address.
    pub account: String,
    /// Receiving address.
    pub destination: String,
    /// Amount in minor units.
    pub amount_minor: u64,
    /// Attached memos.
    pub memos: Vec<TxMemo>,
}

/// Any transaction the ledger accepts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tx_type", rename_all = "snake_case")]
pub enum LedgerTx {
    /// Lock funds under a condition.
    EscrowCreate(EscrowCreateTx),
    /// Release locked funds.
    EscrowFinish(EscrowFinishTx),
    /// Return locked funds to the owner.
    EscrowCancel(EscrowCancelTx),
    /// Plain payment.
    Payment(PaymentTx),
}

impl LedgerTx {
    /// The payment kind recorded for this transaction.
    pub fn kind(&self) -> PaymentKind {
        match self {
            LedgerTx::EscrowCreate(_) => PaymentKind::EscrowCreate,
            LedgerTx::EscrowFinish(_) => PaymentKind::EscrowFinish,
            LedgerTx::EscrowCancel(_) => PaymentKind::EscrowCancel,
            LedgerTx::Payment(_) => PaymentKind::Payment,
        }
    }

    /// Short label for logs and signing instructions.
    pub fn label(&self) -> &'static str {
        match self {
            LedgerTx::EscrowCreate(_) => "escrow_create",
            LedgerTx::EscrowFinish(_) => "escrow_finish",
            LedgerTx::EscrowCancel(_) => "escrow_cancel",
            LedgerTx::Payment(_) => "payment",
        }
    }
}

/// Parameters for building an escrow-creation transaction.
#[derive(Clone, Debug)]
pub struct EscrowCreateParams {
    /// Funding address.
    pub owner: String,
    /// Receiving address.
    pub destination: String,
    /// Amount as a decimal string.
    pub amount: String,
    /// Release condition hash, uppercase hex.
    pub condition: String,
    /// Optional free-text memo.
    pub memo: Option<String>,
    /// Optional booking correlation ID, attached as a memo.
    pub booking_id: Option<String>,
}

/// Parameters for building an escrow-finish transaction.
#[derive(Clone, Debug)]
pub struct EscrowFinishParams {
    /// Address submitting the finish.
    pub finisher: String,
    /// Address that funded the escrow.
    pub owner: String,
    /// Ledger sequence identifying the escrow.
    pub offer_sequence: u32,
    /// The condition being satisfied.
    pub condition: String,
    /// The fulfillment, passed through untouched.
    pub fulfillment: String,
}

fn check_address(field: &'static str, value: &str) -> Result<()> {
    if !is_valid_address(value) {
        return Err(EscrowError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

fn standard_memos(memo: Option<&str>, booking_id: Option<&str>) -> Vec<TxMemo> {
    let mut memos = Vec::new();
    if let Some(text) = memo {
        memos.push(TxMemo::new(MEMO_TYPE_NOTE, text));
    }
    if let Some(id) = booking_id {
        memos.push(TxMemo::new(MEMO_TYPE_BOOKING, id));
    }
    memos
}

/// Build an escrow-creation transaction.
pub fn build_escrow_create(params: EscrowCreateParams) -> Result<EscrowCreateTx> {
    check_address("owner", &params.owner)?;
    check_address("destination", &params.destination)?;
    let amount_minor = to_minor_units(parse_amount(&params.amount)?)?;
    let memos = standard_memos(params.memo.as_deref(), params.booking_id.as_deref());
    Ok(EscrowCreateTx {
        account: params.owner,
        destination: params.destination,
        amount_minor,
        condition: params.condition,
        memos,
    })
}

/// Build an escrow-finish transaction.
///
/// The fulfillment is never dropped, truncated or re-encoded, and its
/// relationship to the condition is not checked here.
pub fn build_escrow_finish(params: EscrowFinishParams) -> Result<EscrowFinishTx> {
    check_address("finisher", &params.finisher)?;
    check_address("owner", &params.owner)?;
    Ok(EscrowFinishTx {
        account: params.finisher,
        owner: params.owner,
        offer_sequence: params.offer_sequence,
        condition: params.condition,
        fulfillment: params.fulfillment,
    })
}

/// Build an escrow-cancel transaction.
pub fn build_escrow_cancel(canceller: &str, owner: &str, offer_sequence: u32) -> Result<EscrowCancelTx> {
    check_address("canceller", canceller)?;
    check_address("owner", owner)?;
    Ok(EscrowCancelTx {
        account: canceller.to_string(),
        owner: owner.to_string(),
        offer_sequence,
    })
}

/// Build a plain payment transaction.
pub fn build_payment(sender: &str, request: &PaymentRequest) -> Result<PaymentTx> {
    check_address("sender", sender)?;
    check_address("destination", &request.destination)?;
    let amount_minor = to_minor_units(parse_amount(&request.amount)?)?;
    let memos = standard_memos(request.memo.as_deref(), None);
    Ok(PaymentTx {
        account: sender.to_string(),
        destination: request.destination.clone(),
        amount_minor,
        memos,
    })
}
