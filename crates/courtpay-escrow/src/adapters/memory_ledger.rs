//! In-Memory Ledger Adapter
//!
//! Implements the `LedgerClient` port against process memory. Escrows
//! are held under (owner, sequence), conditions are enforced at finish
//! time the way the real ledger enforces them, and every submission
//! validates instantly.
//!
//! This backs tests and the reference deployment mode; a networked
//! ledger client implements the same port.

use crate::algorithms::{verify_fulfillment, LedgerTx};
use crate::domain::{EscrowError, Result};
use crate::ports::outbound::{LedgerClient, LedgerObject, SubmitResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use tracing::{debug, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EscrowEntryState {
    Held,
    Finished,
    Cancelled,
}

#[derive(Clone, Debug)]
struct EscrowEntry {
    owner: String,
    destination: String,
    amount_minor: u64,
    condition: String,
    sequence: u32,
    state: EscrowEntryState,
}

/// In-memory settlement ledger.
pub struct InMemoryLedger {
    /// Held escrows: (owner, sequence) -> entry.
    escrows: RwLock<HashMap<(String, u32), EscrowEntry>>,
    next_sequence: AtomicU32,
    tx_counter: AtomicU64,
    fail_submissions: AtomicBool,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self {
            escrows: RwLock::new(HashMap::new()),
            next_sequence: AtomicU32::new(1),
            tx_counter: AtomicU64::new(0),
            fail_submissions: AtomicBool::new(false),
        }
    }

    /// Make every following submission fail, for testing.
    pub fn set_fail_submissions(&self, fail: bool) {
        self.fail_submissions.store(fail, Ordering::SeqCst);
    }

    /// Number of escrows ever created.
    pub fn escrow_count(&self) -> usize {
        self.escrows.read().len()
    }

    /// Whether an escrow is currently held (not finished or cancelled).
    pub fn is_held(&self, owner: &str, sequence: u32) -> bool {
        self.escrows
            .read()
            .get(&(owner.to_string(), sequence))
            .map(|e| e.state == EscrowEntryState::Held)
            .unwrap_or(false)
    }

    fn make_tx_hash(&self, tx: &LedgerTx) -> String {
        let nonce = self.tx_counter.fetch_add(1, Ordering::SeqCst);
        let mut hasher = Sha256::new();
        // Serialization of our own types cannot fail.
        if let Ok(bytes) = serde_json::to_vec(tx) {
            hasher.update(&bytes);
        }
        hasher.update(nonce.to_le_bytes());
        hex::encode_upper(hasher.finalize())
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn submit(&self, tx: &LedgerTx) -> Result<SubmitResult> {
        if self.fail_submissions.load(Ordering::SeqCst) {
            return Err(EscrowError::Submission(
                "simulated ledger failure".to_string(),
            ));
        }
        let tx_hash = self.make_tx_hash(tx);

        match tx {
            LedgerTx::EscrowCreate(create) => {
                let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
                let entry = EscrowEntry {
                    owner: create.account.clone(),
                    destination: create.destination.clone(),
                    amount_minor: create.amount_minor,
                    condition: create.condition.clone(),
                    sequence,
                    state: EscrowEntryState::Held,
                };
                self.escrows
                    .write()
                    .insert((create.account.clone(), sequence), entry);
                info!(
                    sequence,
                    owner = %create.account,
                    amount_minor = create.amount_minor,
                    "Escrow created on ledger"
                );
                Ok(SubmitResult {
                    tx_hash,
                    validated: true,
                    offer_sequence: Some(sequence),
                })
            }
            LedgerTx::EscrowFinish(finish) => {
                let mut escrows = self.escrows.write();
                let entry = escrows
                    .get_mut(&(finish.owner.clone(), finish.offer_sequence))
                    .ok_or_else(|| {
                        EscrowError::Submission(format!(
                            "no escrow for owner {} at sequence {}",
                            finish.owner, finish.offer_sequence
                        ))
                    })?;
                if entry.state != EscrowEntryState::Held {
                    return Err(EscrowError::Submission(format!(
                        "escrow at sequence {} already resolved",
                        finish.offer_sequence
                    )));
                }
                if entry.condition != finish.condition {
                    return Err(EscrowError::Submission(
                        "condition does not match the held escrow".to_string(),
                    ));
                }
                // The ledger, not the builder, judges the fulfillment.
                if !verify_fulfillment(&finish.fulfillment, &entry.condition) {
                    return Err(EscrowError::Submission(
                        "fulfillment does not satisfy the escrow condition".to_string(),
                    ));
                }
                entry.state = EscrowEntryState::Finished;
                debug!(
                    sequence = finish.offer_sequence,
                    owner = %finish.owner,
                    "Escrow finished, funds released"
                );
                Ok(SubmitResult {
                    tx_hash,
                    validated: true,
                    offer_sequence: None,
                })
            }
            LedgerTx::EscrowCancel(cancel) => {
                let mut escrows = self.escrows.write();
                let entry = escrows
                    .get_mut(&(cancel.owner.clone(), cancel.offer_sequence))
                    .ok_or_else(|| {
                        EscrowError::Submission(format!(
                            "no escrow for owner {} at sequence {}",
                            cancel.owner, cancel.offer_sequence
                        ))
                    })?;
                if entry.state != EscrowEntryState::Held {
                    return Err(EscrowError::Submission(format!(
                        "escrow at sequence {} already resolved",
                        cancel.offer_sequence
                    )));
                }
                entry.state = EscrowEntryState::Cancelled;
                debug!(
                    sequence = cancel.offer_sequence,
                    owner = %cancel.owner,
                    "Escrow cancelled, funds returned"
                );
                Ok(SubmitResult {
                    tx_hash,
                    validated: true,
                    offer_sequence: None,
                })
            }
            LedgerTx::Payment(payment) => {
                debug!(
                    destination = %payment.destination,
                    amount_minor = payment.amount_minor,
                    "Payment settled"
                );
                Ok(SubmitResult {
                    tx_hash,
                    validated: true,
                    offer_sequence: None,
                })
            }
        }
    }

    async fn query_account_objects(
        &self,
        account: &str,
        object_type: &str,
    ) -> Result<Vec<LedgerObject>> {
        if object_type != "escrow" {
            return Ok(Vec::new());
        }
        let escrows = self.escrows.read();
        Ok(escrows
            .values()
            .filter(|e| e.owner == account && e.state == EscrowEntryState::Held)
            .map(|e| LedgerObject {
                object_type: "escrow".to_string(),
                owner: e.owner.clone(),
                destination: e.destination.clone(),
                amount_minor: e.amount_minor,
                condition: Some(e.condition.clone()),
                sequence: e.sequence,
            })
            .collect())
    }
}
