//! Transaction Submitters
//!
//! Two implementations of the `TransactionSubmitter` port. The direct
//! submitter hands transactions straight to the ledger client and is
//! what test and back-office deployments run. The gateway submitter
//! routes every transaction through the interactive signing flow and
//! only resolves once the wallet holder has acted.
//!
//! The orchestrator is constructed with one of them and contains no
//! branching on deployment mode.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::algorithms::LedgerTx;
use crate::domain::{EscrowError, Result};
use crate::ports::outbound::{LedgerClient, SubmitOutcome, TransactionSubmitter};
use crate::signing::SigningClient;

/// Instruction text shown in the signer's wallet app.
pub fn instruction_for(tx: &LedgerTx) -> &'static str {
    match tx {
        LedgerTx::EscrowCreate(_) => "Approve the escrow deposit for your coaching session",
        LedgerTx::EscrowFinish(_) => "Approve the release of the escrowed session payment",
        LedgerTx::EscrowCancel(_) => "Approve the escrow cancellation and refund",
        LedgerTx::Payment(_) => "Approve the payment for your coaching session",
    }
}

/// Submits transactions straight to the ledger client, no human in the
/// loop.
pub struct DirectLedgerSubmitter {
    ledger: Arc<dyn LedgerClient>,
}

impl DirectLedgerSubmitter {
    /// New submitter over a ledger client.
    pub fn new(ledger: Arc<dyn LedgerClient>) -> Self {
        Self { ledger }
    }
}

#[async_trait]
impl TransactionSubmitter for DirectLedgerSubmitter {
    async fn submit(&self, tx: &LedgerTx) -> Result<SubmitOutcome> {
        let result = self.ledger.submit(tx).await?;
        debug!(kind = tx.label(), tx_hash = %result.tx_hash, "Transaction submitted directly");
        Ok(SubmitOutcome {
            tx_hash: result.tx_hash,
            validated: result.validated,
            offer_sequence: result.offer_sequence,
            signing_request_id: None,
        })
    }
}

/// Routes transactions through the signing gateway and waits for the
/// wallet holder to resolve each one.
///
/// The gateway broadcasts signed transactions itself, so the ledger
/// client here is only used to recover the sequence of a freshly
/// created escrow. Ledger validation is not observed on this path;
/// outcomes always report `validated: false`.
pub struct GatewaySubmitter {
    signing: Arc<SigningClient>,
    ledger: Arc<dyn LedgerClient>,
}

impl GatewaySubmitter {
    /// New submitter over a signing client and a ledger client.
    pub fn new(signing: Arc<SigningClient>, ledger: Arc<dyn LedgerClient>) -> Self {
        Self { signing, ledger }
    }

    /// Look up the ledger-assigned sequence of a just-created escrow.
    ///
    /// The gateway reports only the transaction hash, so the sequence
    /// is recovered by scanning the owner's escrow objects for the
    /// matching condition. Conditions are unique per contract.
    async fn recover_escrow_sequence(&self, owner: &str, condition: &str) -> Result<u32> {
        let objects = self.ledger.query_account_objects(owner, "escrow").await?;
        objects
            .into_iter()
            .find(|object| object.condition.as_deref() == Some(condition))
            .map(|object| object.sequence)
            .ok_or_else(|| {
                EscrowError::Submission("created escrow not found on ledger".to_string())
            })
    }
}

#[async_trait]
impl TransactionSubmitter for GatewaySubmitter {
    async fn submit(&self, tx: &LedgerTx) -> Result<SubmitOutcome> {
        let request = self
            .signing
            .create_signing_request(tx, instruction_for(tx))
            .await?;
        let tx_hash = self.signing.wait_for_resolution(&request.request_id).await?;

        let offer_sequence = match tx {
            LedgerTx::EscrowCreate(create) => Some(
                self.recover_escrow_sequence(&create.account, &create.condition)
                    .await?,
            ),
            _ => None,
        };

        info!(
            kind = tx.label(),
            request_id = %request.request_id,
            "Gateway-signed transaction resolved"
        );
        Ok(SubmitOutcome {
            tx_hash,
            validated: false,
            offer_sequence,
            signing_request_id: Some(request.request_id),
        })
    }
}
