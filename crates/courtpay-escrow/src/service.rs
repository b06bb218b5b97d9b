//! Booking Workflow Orchestrator
//!
//! Owns the booking lifecycle state machine and sequences validation,
//! escrow funding, the signing flow and finalization over the injected
//! ports. Operations are serialized per booking ID; different bookings
//! proceed in parallel.
//!
//! Failure policy: validation and builder errors cancel the workflow
//! with the message recorded. Transient external failures (gateway
//! unreachable, signature timeout) leave the workflow at its last
//! successful step so the caller can retry or cancel explicitly.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::algorithms::{
    build_escrow_cancel, build_escrow_create, build_escrow_finish, build_payment,
    generate_condition_triple, EscrowCreateParams, EscrowFinishParams, LedgerTx,
};
use crate::config::OrchestratorConfig;
use crate::domain::{
    validate_booking, validate_escrow_request, BookingRequest, EscrowContract,
    EscrowContractParams, EscrowError, EscrowStatus, Fulfillment, PaymentKind, PaymentRequest,
    PaymentStatus, PaymentTransaction, PaymentTransactionParams, PaymentType, Result, Session,
    Workflow, WorkflowResult, WorkflowStep,
};
use crate::ports::inbound::BookingWorkflowApi;
use crate::ports::outbound::{SubmitOutcome, TransactionSubmitter, WorkflowRepository};

/// Operation counters.
#[derive(Debug, Default)]
pub struct OrchestratorStats {
    /// Workflows started.
    pub started: AtomicU64,
    /// Workflows finalized to completion.
    pub completed: AtomicU64,
    /// Workflows refunded through cancellation.
    pub refunded: AtomicU64,
    /// Workflows cancelled on failure.
    pub cancelled: AtomicU64,
}

/// The booking workflow orchestrator.
///
/// Implements the `BookingWorkflowApi` port over an injected submitter
/// and repository. Holds no deployment-mode branching; the submitter
/// decides whether transactions go straight to the ledger or through
/// the interactive signing flow.
pub struct EscrowOrchestrator {
    config: OrchestratorConfig,
    submitter: Arc<dyn TransactionSubmitter>,
    repository: Arc<dyn WorkflowRepository>,
    /// Per-booking operation locks.
    locks: DashMap<String, Arc<Mutex<()>>>,
    stats: Arc<OrchestratorStats>,
}

impl EscrowOrchestrator {
    /// Create an orchestrator after validating the configuration.
    pub fn new(
        config: OrchestratorConfig,
        submitter: Arc<dyn TransactionSubmitter>,
        repository: Arc<dyn WorkflowRepository>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            submitter,
            repository,
            locks: DashMap::new(),
            stats: Arc::new(OrchestratorStats::default()),
        })
    }

    /// Operation counters.
    pub fn stats(&self) -> Arc<OrchestratorStats> {
        Arc::clone(&self.stats)
    }

    fn lock_for(&self, booking_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(booking_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn derive_status(outcome: &SubmitOutcome) -> PaymentStatus {
        if outcome.validated {
            PaymentStatus::Confirmed
        } else if outcome.signing_request_id.is_some() {
            PaymentStatus::PendingSignature
        } else {
            PaymentStatus::Pending
        }
    }

    /// Fund an escrow-paid booking: validate the request, generate a
    /// condition triple, submit the escrow creation and store the
    /// resulting contract with its release capability.
    async fn fund_with_escrow(
        &self,
        workflow: &mut Workflow,
        payer: &str,
        payee: &str,
    ) -> Result<()> {
        let request = PaymentRequest {
            destination: payee.to_string(),
            amount: workflow.booking.amount.clone(),
            memo: workflow.booking.memo.clone(),
        };
        let failures = validate_escrow_request(&request, self.config.escrow.max_amount_major);
        if !failures.is_empty() {
            return Err(EscrowError::Validation(failures));
        }

        let triple = generate_condition_triple();
        let create = build_escrow_create(EscrowCreateParams {
            owner: payer.to_string(),
            destination: payee.to_string(),
            amount: workflow.booking.amount.clone(),
            condition: triple.condition.clone(),
            memo: workflow.booking.memo.clone(),
            booking_id: Some(workflow.booking_id.clone()),
        })?;
        let amount_minor = create.amount_minor;
        let tx = LedgerTx::EscrowCreate(create);

        let outcome = self.submitter.submit(&tx).await?;
        let offer_sequence = outcome.offer_sequence.ok_or_else(|| {
            EscrowError::Submission("ledger did not assign an escrow sequence".to_string())
        })?;

        let now = Utc::now();
        workflow.escrow = Some(EscrowContract::new(EscrowContractParams {
            booking_id: workflow.booking_id.clone(),
            purpose: workflow.booking.memo.clone(),
            owner: payer.to_string(),
            destination: payee.to_string(),
            amount: workflow.booking.amount.clone(),
            amount_minor,
            condition: triple.condition.clone(),
            fulfillment: Some(triple.fulfillment.clone()),
            offer_sequence,
            created_at: now,
            expires_at: now + Duration::hours(self.config.escrow.release_window_hours as i64),
        }));
        workflow.record_transaction(PaymentTransaction::new(PaymentTransactionParams {
            tx_id: format!("tx_{}", Uuid::new_v4()),
            session_id: workflow.session_id.clone(),
            payer: payer.to_string(),
            payee: payee.to_string(),
            amount: workflow.booking.amount.clone(),
            kind: tx.kind(),
            status: Self::derive_status(&outcome),
            tx_hash: Some(outcome.tx_hash),
            signing_request_id: outcome.signing_request_id,
            memo: workflow.booking.memo.clone(),
            created_at: now,
        }));
        workflow.transition_to(WorkflowStep::EscrowPending, now)?;
        info!(
            booking_id = %workflow.booking_id,
            offer_sequence,
            amount_minor,
            "Escrow contract stored"
        );
        Ok(())
    }

    /// Fund a direct-paid booking with a plain payment.
    async fn fund_with_payment(
        &self,
        workflow: &mut Workflow,
        payer: &str,
        payee: &str,
    ) -> Result<()> {
        let request = PaymentRequest {
            destination: payee.to_string(),
            amount: workflow.booking.amount.clone(),
            memo: workflow.booking.memo.clone(),
        };
        let tx = LedgerTx::Payment(build_payment(payer, &request)?);

        let outcome = self.submitter.submit(&tx).await?;
        let now = Utc::now();
        workflow.record_transaction(PaymentTransaction::new(PaymentTransactionParams {
            tx_id: format!("tx_{}", Uuid::new_v4()),
            session_id: workflow.session_id.clone(),
            payer: payer.to_string(),
            payee: payee.to_string(),
            amount: workflow.booking.amount.clone(),
            kind: tx.kind(),
            status: Self::derive_status(&outcome),
            tx_hash: Some(outcome.tx_hash),
            signing_request_id: outcome.signing_request_id,
            memo: workflow.booking.memo.clone(),
            created_at: now,
        }));
        info!(booking_id = %workflow.booking_id, "Direct payment submitted");
        Ok(())
    }

    /// Apply the failure policy for a failed step: retryable errors
    /// leave the workflow where it stands, everything else cancels.
    async fn step_failed(&self, mut workflow: Workflow, err: EscrowError) -> WorkflowResult {
        if !err.is_retryable() {
            return self.cancel_with(workflow, err).await;
        }
        let message = err.to_string();
        warn!(
            booking_id = %workflow.booking_id,
            step = ?workflow.current_step,
            error = %message,
            "Step failed, workflow left in place for retry"
        );
        workflow.error = Some(message.clone());
        workflow.updated_at = Utc::now();
        self.repository.put(workflow.clone()).await;
        WorkflowResult::failed(Some(workflow.snapshot()), message)
    }

    /// Cancel the workflow, recording the error, and persist it.
    async fn cancel_with(&self, mut workflow: Workflow, err: EscrowError) -> WorkflowResult {
        let message = err.to_string();
        warn!(booking_id = %workflow.booking_id, error = %message, "Workflow cancelled");
        workflow.fail(message.clone(), Utc::now());
        self.repository.put(workflow.clone()).await;
        self.stats.cancelled.fetch_add(1, Ordering::Relaxed);
        WorkflowResult::failed(Some(workflow.snapshot()), message)
    }

    async fn cancel_escrow_booking(
        &self,
        mut workflow: Workflow,
        escrow: EscrowContract,
        reason: &str,
    ) -> WorkflowResult {
        let tx = match build_escrow_cancel(&escrow.owner, &escrow.owner, escrow.offer_sequence) {
            Ok(cancel) => LedgerTx::EscrowCancel(cancel),
            Err(err) => return self.cancel_with(workflow, err).await,
        };
        let outcome = match self.submitter.submit(&tx).await {
            Ok(outcome) => outcome,
            Err(err) => return self.step_failed(workflow, err).await,
        };

        let now = Utc::now();
        workflow.record_transaction(PaymentTransaction::new(PaymentTransactionParams {
            tx_id: format!("tx_{}", Uuid::new_v4()),
            session_id: workflow.session_id.clone(),
            payer: escrow.owner.clone(),
            payee: escrow.owner.clone(),
            amount: escrow.amount.clone(),
            kind: tx.kind(),
            status: Self::derive_status(&outcome),
            tx_hash: Some(outcome.tx_hash),
            signing_request_id: outcome.signing_request_id,
            memo: Some(reason.to_string()),
            created_at: now,
        }));
        let escrow_done = match workflow.escrow.as_mut() {
            Some(contract) => contract.transition_to(EscrowStatus::Cancelled),
            None => Ok(()),
        };
        if let Err(err) = escrow_done {
            return self.cancel_with(workflow, err).await;
        }
        if let Err(err) = workflow.transition_to(WorkflowStep::Refunded, now) {
            return self.cancel_with(workflow, err).await;
        }
        self.repository.put(workflow.clone()).await;
        self.stats.refunded.fetch_add(1, Ordering::Relaxed);
        info!(booking_id = %workflow.booking_id, reason, "Escrow cancelled, booking refunded");
        WorkflowResult::ok(workflow.snapshot())
    }

    async fn cancel_direct_booking(&self, mut workflow: Workflow, reason: &str) -> WorkflowResult {
        let now = Utc::now();
        let settled = workflow
            .transactions
            .iter()
            .find(|tx| tx.kind == PaymentKind::Payment)
            .cloned();
        match settled {
            Some(payment) => {
                // Compensating transfer back to the payer, settled out
                // of band.
                workflow.record_transaction(PaymentTransaction::new(PaymentTransactionParams {
                    tx_id: format!("tx_{}", Uuid::new_v4()),
                    session_id: workflow.session_id.clone(),
                    payer: payment.payee.clone(),
                    payee: payment.payer.clone(),
                    amount: payment.amount.clone(),
                    kind: PaymentKind::Refund,
                    status: PaymentStatus::Pending,
                    tx_hash: None,
                    signing_request_id: None,
                    memo: Some(reason.to_string()),
                    created_at: now,
                }));
                if let Err(err) = workflow.transition_to(WorkflowStep::Refunded, now) {
                    return self.cancel_with(workflow, err).await;
                }
                self.repository.put(workflow.clone()).await;
                self.stats.refunded.fetch_add(1, Ordering::Relaxed);
                info!(booking_id = %workflow.booking_id, reason, "Booking cancelled, refund recorded");
                WorkflowResult::ok(workflow.snapshot())
            }
            None => {
                // Nothing has settled, so there is nothing to refund.
                workflow.fail(reason, now);
                self.repository.put(workflow.clone()).await;
                self.stats.cancelled.fetch_add(1, Ordering::Relaxed);
                info!(booking_id = %workflow.booking_id, reason, "Booking cancelled before settlement");
                WorkflowResult::ok(workflow.snapshot())
            }
        }
    }
}

#[async_trait]
impl BookingWorkflowApi for EscrowOrchestrator {
    async fn start_booking_workflow(
        &self,
        booking: BookingRequest,
        payer: &str,
        payee: &str,
    ) -> WorkflowResult {
        let booking_id = format!("booking_{}", Uuid::new_v4());
        let session_id = format!("session_{}", Uuid::new_v4());
        let lock = self.lock_for(&booking_id);
        let _guard = lock.lock().await;
        self.stats.started.fetch_add(1, Ordering::Relaxed);

        let now = Utc::now();
        let mut workflow = Workflow::new(booking_id, session_id, booking, now);

        let failures = validate_booking(&workflow.booking);
        if !failures.is_empty() {
            return self
                .cancel_with(workflow, EscrowError::Validation(failures))
                .await;
        }

        workflow.session = Some(Session {
            session_id: workflow.session_id.clone(),
            coach_id: workflow.booking.coach_id.clone(),
            scheduled_at: workflow.booking.session_start,
            duration_minutes: workflow.booking.duration_minutes,
            court: workflow.booking.court.clone(),
            created_at: now,
        });
        if let Err(err) = workflow.transition_to(WorkflowStep::EscrowCreation, Utc::now()) {
            return self.cancel_with(workflow, err).await;
        }

        let funded = match workflow.booking.payment_type {
            PaymentType::Escrow => self.fund_with_escrow(&mut workflow, payer, payee).await,
            PaymentType::Direct => self.fund_with_payment(&mut workflow, payer, payee).await,
        };
        if let Err(err) = funded {
            return self.step_failed(workflow, err).await;
        }

        if let Err(err) = workflow.transition_to(WorkflowStep::SessionScheduled, Utc::now()) {
            return self.cancel_with(workflow, err).await;
        }
        self.repository.put(workflow.clone()).await;
        info!(
            booking_id = %workflow.booking_id,
            payment = ?workflow.booking.payment_type,
            "Booking workflow ready"
        );
        // The one result that carries the fulfillment capability.
        WorkflowResult::ok(workflow)
    }

    async fn finalize_session_escrow(&self, booking_id: &str, fulfillment: &str) -> WorkflowResult {
        let lock = self.lock_for(booking_id);
        let _guard = lock.lock().await;

        let Some(mut workflow) = self.repository.get(booking_id).await else {
            return WorkflowResult::failed(None, EscrowError::WorkflowNotFound.to_string());
        };
        let Some(escrow) = workflow.active_escrow().cloned() else {
            return WorkflowResult::failed(
                Some(workflow.snapshot()),
                EscrowError::NoEscrowContract.to_string(),
            );
        };
        let prev_step = workflow.current_step;
        if let Err(err) = workflow.transition_to(WorkflowStep::EscrowFinalization, Utc::now()) {
            return WorkflowResult::failed(Some(workflow.snapshot()), err.to_string());
        }

        // The payee presents the fulfillment to claim the funds.
        let tx = match build_escrow_finish(EscrowFinishParams {
            finisher: escrow.destination.clone(),
            owner: escrow.owner.clone(),
            offer_sequence: escrow.offer_sequence,
            condition: escrow.condition.clone(),
            fulfillment: fulfillment.to_string(),
        }) {
            Ok(finish) => LedgerTx::EscrowFinish(finish),
            Err(err) => return self.cancel_with(workflow, err).await,
        };

        let outcome = match self.submitter.submit(&tx).await {
            Ok(outcome) => outcome,
            Err(err) if err.is_retryable() => {
                // The escrow is still live on the ledger; step back so
                // the caller can retry or cancel.
                let message = err.to_string();
                warn!(
                    booking_id = %workflow.booking_id,
                    error = %message,
                    "Finalize failed, workflow restored for retry"
                );
                if workflow.transition_to(prev_step, Utc::now()).is_err() {
                    workflow.current_step = prev_step;
                }
                workflow.error = Some(message.clone());
                self.repository.put(workflow.clone()).await;
                return WorkflowResult::failed(Some(workflow.snapshot()), message);
            }
            Err(err) => return self.cancel_with(workflow, err).await,
        };

        let now = Utc::now();
        workflow.record_transaction(PaymentTransaction::new(PaymentTransactionParams {
            tx_id: format!("tx_{}", Uuid::new_v4()),
            session_id: workflow.session_id.clone(),
            payer: escrow.owner.clone(),
            payee: escrow.destination.clone(),
            amount: escrow.amount.clone(),
            kind: tx.kind(),
            status: Self::derive_status(&outcome),
            tx_hash: Some(outcome.tx_hash),
            signing_request_id: outcome.signing_request_id,
            memo: None,
            created_at: now,
        }));
        let escrow_done = match workflow.escrow.as_mut() {
            Some(contract) => {
                let transitioned = contract.transition_to(EscrowStatus::Completed);
                if transitioned.is_ok() {
                    contract.fulfillment = Some(Fulfillment::new(fulfillment));
                }
                transitioned
            }
            None => Ok(()),
        };
        if let Err(err) = escrow_done {
            return self.cancel_with(workflow, err).await;
        }
        if let Err(err) = workflow.transition_to(WorkflowStep::Completed, now) {
            return self.cancel_with(workflow, err).await;
        }
        workflow.error = None;

        if !self
            .repository
            .compare_and_swap(booking_id, prev_step, workflow.clone())
            .await
        {
            let err = EscrowError::Conflict(booking_id.to_string());
            warn!(booking_id, "Finalize lost a concurrent update");
            return WorkflowResult::failed(Some(workflow.snapshot()), err.to_string());
        }
        self.stats.completed.fetch_add(1, Ordering::Relaxed);
        info!(
            booking_id = %workflow.booking_id,
            tx_count = workflow.transactions.len(),
            "Escrow finalized, booking complete"
        );
        WorkflowResult::ok(workflow.snapshot())
    }

    async fn cancel_booking(&self, booking_id: &str, reason: &str) -> WorkflowResult {
        let lock = self.lock_for(booking_id);
        let _guard = lock.lock().await;

        let Some(workflow) = self.repository.get(booking_id).await else {
            return WorkflowResult::failed(None, EscrowError::WorkflowNotFound.to_string());
        };
        if workflow.current_step.is_terminal() {
            let err = EscrowError::InvalidTransition {
                from: format!("{:?}", workflow.current_step),
                to: format!("{:?}", WorkflowStep::Refunded),
            };
            return WorkflowResult::failed(Some(workflow.snapshot()), err.to_string());
        }

        match workflow.active_escrow().cloned() {
            Some(escrow) => self.cancel_escrow_booking(workflow, escrow, reason).await,
            None => self.cancel_direct_booking(workflow, reason).await,
        }
    }

    async fn get_workflow_status(&self, booking_id: &str) -> Option<Workflow> {
        self.repository.get(booking_id).await.map(|wf| wf.snapshot())
    }

    async fn get_all_workflows(&self) -> Vec<Workflow> {
        self.repository
            .list()
            .await
            .into_iter()
            .map(|wf| wf.snapshot())
            .collect()
    }
}
