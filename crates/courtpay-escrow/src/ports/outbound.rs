//! # Outbound Ports
//!
//! Traits for external dependencies: the settlement ledger, the signing
//! gateway, the submission strategy and workflow storage.

use crate::algorithms::LedgerTx;
use crate::domain::{EscrowError, Result, Workflow, WorkflowStep};
use async_trait::async_trait;

/// Result of submitting a transaction straight to the ledger.
#[derive(Clone, Debug)]
pub struct SubmitResult {
    /// Ledger transaction hash.
    pub tx_hash: String,
    /// Whether the ledger has validated the transaction.
    pub validated: bool,
    /// Sequence assigned to a newly created escrow.
    pub offer_sequence: Option<u32>,
}

/// An object held on the ledger under an account.
#[derive(Clone, Debug)]
pub struct LedgerObject {
    /// Object kind, `"escrow"` for escrow contracts.
    pub object_type: String,
    /// Funding account.
    pub owner: String,
    /// Receiving account.
    pub destination: String,
    /// Locked amount in minor units.
    pub amount_minor: u64,
    /// Release condition, when the object carries one.
    pub condition: Option<String>,
    /// Ledger sequence identifying the object.
    pub sequence: u32,
}

/// Settlement ledger client - outbound port.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Submit a transaction.
    async fn submit(&self, tx: &LedgerTx) -> Result<SubmitResult>;

    /// List objects of one kind held under an account.
    async fn query_account_objects(
        &self,
        account: &str,
        object_type: &str,
    ) -> Result<Vec<LedgerObject>>;
}

/// A signing request created at the gateway, ready to present to
/// the signer's wallet.
#[derive(Clone, Debug)]
pub struct SigningPayload {
    /// Gateway-assigned request ID.
    pub uuid: String,
    /// QR code the signer scans.
    pub qr_image_url: String,
    /// Deep link opening the signer's wallet app.
    pub deeplink_url: String,
}

/// Resolution state of a signing request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayloadResult {
    /// Signer approved and signed.
    pub signed: bool,
    /// Signer explicitly declined.
    pub rejected: bool,
    /// Request expired at the gateway.
    pub expired: bool,
    /// Transaction hash, present once signed and submitted.
    pub tx_hash: Option<String>,
}

impl PayloadResult {
    /// Still awaiting the signer.
    pub fn pending() -> Self {
        Self {
            signed: false,
            rejected: false,
            expired: false,
            tx_hash: None,
        }
    }

    /// Signed, with the resulting transaction hash.
    pub fn signed_with(tx_hash: impl Into<String>) -> Self {
        Self {
            signed: true,
            rejected: false,
            expired: false,
            tx_hash: Some(tx_hash.into()),
        }
    }

    /// Declined by the signer.
    pub fn rejected_by_signer() -> Self {
        Self {
            signed: false,
            rejected: true,
            expired: false,
            tx_hash: None,
        }
    }

    /// Expired before the signer acted.
    pub fn expired_unresolved() -> Self {
        Self {
            signed: false,
            rejected: false,
            expired: true,
            tx_hash: None,
        }
    }

    /// Whether any terminal outcome has been reached.
    pub fn resolved(&self) -> bool {
        self.signed || self.rejected || self.expired
    }
}

/// Signing gateway - outbound port.
#[async_trait]
pub trait SigningGateway: Send + Sync {
    /// Create a signing request for a transaction.
    async fn create_payload(&self, tx: &LedgerTx, instruction: &str) -> Result<SigningPayload>;

    /// Fetch the current resolution state of a request.
    async fn get_payload_result(&self, uuid: &str) -> Result<PayloadResult>;
}

/// Outcome of getting a transaction onto the ledger, whichever
/// strategy did it.
#[derive(Clone, Debug)]
pub struct SubmitOutcome {
    /// Ledger transaction hash.
    pub tx_hash: String,
    /// Whether ledger validation has been observed.
    pub validated: bool,
    /// Sequence assigned to a newly created escrow.
    pub offer_sequence: Option<u32>,
    /// Signing request that produced the signature, if one was used.
    pub signing_request_id: Option<String>,
}

/// Transaction submission strategy - outbound port.
///
/// The orchestrator holds exactly one submitter and never knows which
/// strategy is behind it. Direct ledger submission and the interactive
/// signing flow are both implementations of this trait.
#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    /// Get a transaction signed and onto the ledger.
    async fn submit(&self, tx: &LedgerTx) -> Result<SubmitOutcome>;
}

/// Workflow storage - outbound port.
///
/// The in-memory implementation backs the reference deployment; a
/// durable store implements the same trait. `compare_and_swap` is the
/// write primitive for step changes so a distributed store can detect
/// lost updates.
#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    /// Fetch a workflow by booking ID.
    async fn get(&self, booking_id: &str) -> Option<Workflow>;

    /// Insert or replace a workflow.
    async fn put(&self, workflow: Workflow);

    /// Replace a workflow only if its stored step still matches
    /// `expected_step`. Returns false without writing otherwise.
    async fn compare_and_swap(
        &self,
        booking_id: &str,
        expected_step: WorkflowStep,
        workflow: Workflow,
    ) -> bool;

    /// All stored workflows.
    async fn list(&self) -> Vec<Workflow>;

    /// Number of stored workflows.
    async fn len(&self) -> usize;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Scripted resolution for one signing request.
#[derive(Clone, Debug)]
pub struct ScriptedResolution {
    /// Pending polls to report before the result applies.
    pub after_polls: u32,
    /// Final resolution.
    pub result: PayloadResult,
}

struct PendingScript {
    remaining: u32,
    result: PayloadResult,
    tx: LedgerTx,
    broadcast: bool,
}

/// Mock signing gateway with scripted resolutions.
///
/// Each `create_payload` consumes the next scripted resolution; with an
/// empty script the request resolves as signed on the first poll. With
/// a ledger attached, signed transactions are broadcast to it and the
/// ledger's hash is reported, as the real gateway does.
#[derive(Default)]
pub struct MockSigningGateway {
    counter: AtomicU64,
    unavailable: AtomicBool,
    script: Mutex<VecDeque<ScriptedResolution>>,
    pending: Mutex<HashMap<String, PendingScript>>,
    ledger: Mutex<Option<Arc<dyn LedgerClient>>>,
    polls: AtomicU64,
}

impl MockSigningGateway {
    /// Fresh gateway with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a scripted resolution for the next created request.
    pub fn script_next(&self, resolution: ScriptedResolution) {
        self.script.lock().push_back(resolution);
    }

    /// Next request resolves as signed after `after_polls` pending polls.
    pub fn script_signed_after(&self, after_polls: u32, tx_hash: &str) {
        self.script_next(ScriptedResolution {
            after_polls,
            result: PayloadResult::signed_with(tx_hash),
        });
    }

    /// Next request is declined by the signer.
    pub fn script_rejected(&self) {
        self.script_next(ScriptedResolution {
            after_polls: 0,
            result: PayloadResult::rejected_by_signer(),
        });
    }

    /// Next request expires at the gateway.
    pub fn script_expired(&self) {
        self.script_next(ScriptedResolution {
            after_polls: 0,
            result: PayloadResult::expired_unresolved(),
        });
    }

    /// Next request never resolves, forcing the caller's timeout.
    pub fn script_never_resolves(&self) {
        self.script_next(ScriptedResolution {
            after_polls: u32::MAX,
            result: PayloadResult::pending(),
        });
    }

    /// Broadcast signed transactions to this ledger.
    pub fn attach_ledger(&self, ledger: Arc<dyn LedgerClient>) {
        *self.ledger.lock() = Some(ledger);
    }

    /// Flip transport availability.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Total polls observed.
    pub fn poll_count(&self) -> u64 {
        self.polls.load(Ordering::SeqCst)
    }

    /// Total signing requests created.
    pub fn created_count(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SigningGateway for MockSigningGateway {
    async fn create_payload(&self, tx: &LedgerTx, _instruction: &str) -> Result<SigningPayload> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(EscrowError::GatewayUnavailable(
                "mock gateway offline".to_string(),
            ));
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let uuid = format!("signreq-{n}");
        let scripted = self.script.lock().pop_front().unwrap_or(ScriptedResolution {
            after_polls: 0,
            result: PayloadResult::signed_with(format!("{n:064X}")),
        });
        self.pending.lock().insert(
            uuid.clone(),
            PendingScript {
                remaining: scripted.after_polls,
                result: scripted.result,
                tx: tx.clone(),
                broadcast: false,
            },
        );
        Ok(SigningPayload {
            qr_image_url: format!("https://sign.mock/qr/{uuid}.png"),
            deeplink_url: format!("https://sign.mock/open/{uuid}"),
            uuid,
        })
    }

    async fn get_payload_result(&self, uuid: &str) -> Result<PayloadResult> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(EscrowError::GatewayUnavailable(
                "mock gateway offline".to_string(),
            ));
        }
        self.polls.fetch_add(1, Ordering::SeqCst);
        let (result, tx, already_broadcast) = {
            let mut pending = self.pending.lock();
            let state = pending.get_mut(uuid).ok_or_else(|| {
                EscrowError::GatewayUnavailable(format!("unknown payload: {uuid}"))
            })?;
            if state.remaining > 0 {
                state.remaining -= 1;
                return Ok(PayloadResult::pending());
            }
            (state.result.clone(), state.tx.clone(), state.broadcast)
        };

        let attached = self.ledger.lock().clone();
        if let (true, false, Some(ledger)) = (result.signed, already_broadcast, attached) {
            let submitted = ledger.submit(&tx).await?;
            let resolved = PayloadResult::signed_with(submitted.tx_hash);
            let mut pending = self.pending.lock();
            if let Some(state) = pending.get_mut(uuid) {
                state.broadcast = true;
                state.result = resolved.clone();
            }
            return Ok(resolved);
        }
        Ok(result)
    }
}
