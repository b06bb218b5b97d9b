//! # Booking Flow Integration Tests
//!
//! Full booking lifecycles over the direct ledger submitter, the
//! reference deployment wiring: orchestrator -> submitter -> in-memory
//! ledger, workflows stored in the in-memory repository.
//!
//! ## Flows Tested
//!
//! 1. **Escrow lifecycle**: book -> fund escrow -> finalize -> funds released
//! 2. **Direct lifecycle**: book -> pay -> cancel -> compensating refund
//! 3. **Failure handling**: validation rejects, ledger outages, bad capabilities

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use courtpay_escrow::{
        BookingRequest, BookingWorkflowApi, DirectLedgerSubmitter, EscrowOrchestrator,
        EscrowStatus, InMemoryLedger, InMemoryWorkflowRepository, OrchestratorConfig, PaymentKind,
        PaymentStatus, PaymentType, Workflow, WorkflowStep,
    };

    const PAYER: &str = "rN7n7otQDd6FczFgLdSqtcsAUxDkw6fzRH";
    const PAYEE: &str = "rPT1Sjq2YGrBMTttX4GZHjKu9dyfzbpAYe";

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    /// Booking request for a one-hour session two days out.
    fn booking(payment_type: PaymentType) -> BookingRequest {
        BookingRequest {
            coach_id: "coach_serena".to_string(),
            session_start: Utc::now() + Duration::days(2),
            duration_minutes: 60,
            court: "court-4".to_string(),
            amount: "30.0".to_string(),
            payment_type,
            memo: Some("tennis lesson".to_string()),
        }
    }

    /// Orchestrator wired for direct ledger submission.
    fn harness() -> (EscrowOrchestrator, Arc<InMemoryLedger>) {
        crate::init_tracing();
        let ledger = Arc::new(InMemoryLedger::new());
        let submitter = Arc::new(DirectLedgerSubmitter::new(ledger.clone()));
        let repository = Arc::new(InMemoryWorkflowRepository::new());
        let orchestrator =
            EscrowOrchestrator::new(OrchestratorConfig::default(), submitter, repository)
                .expect("default config must validate");
        (orchestrator, ledger)
    }

    /// Pull the fulfillment capability out of a freshly started workflow.
    fn capability_of(workflow: &Workflow) -> String {
        workflow
            .escrow
            .as_ref()
            .expect("escrow contract expected")
            .fulfillment
            .as_ref()
            .expect("start result must carry the capability")
            .as_str()
            .to_string()
    }

    // =============================================================================
    // ESCROW LIFECYCLE
    // =============================================================================

    /// The full happy path: book with escrow, then finalize after the
    /// session and watch the funds leave the ledger.
    #[tokio::test]
    async fn test_escrow_booking_full_lifecycle() {
        let (orchestrator, ledger) = harness();

        // Book and fund.
        let started = orchestrator
            .start_booking_workflow(booking(PaymentType::Escrow), PAYER, PAYEE)
            .await;
        assert!(started.success, "start failed: {:?}", started.error);
        let workflow = started.workflow.unwrap();

        assert!(workflow.booking_id.starts_with("booking_"));
        assert!(workflow.session_id.starts_with("session_"));
        assert_eq!(workflow.current_step, WorkflowStep::SessionScheduled);

        let escrow = workflow.escrow.as_ref().unwrap();
        assert_eq!(escrow.amount, "30.0");
        assert_eq!(escrow.status, EscrowStatus::Created);
        assert!(ledger.is_held(PAYER, escrow.offer_sequence));

        assert_eq!(workflow.transactions.len(), 1);
        assert_eq!(workflow.transactions[0].kind, PaymentKind::EscrowCreate);
        assert_eq!(workflow.transactions[0].status, PaymentStatus::Confirmed);

        // Session happens, then the payee claims the funds.
        let capability = capability_of(&workflow);
        let finalized = orchestrator
            .finalize_session_escrow(&workflow.booking_id, &capability)
            .await;
        assert!(finalized.success, "finalize failed: {:?}", finalized.error);
        let done = finalized.workflow.unwrap();

        assert_eq!(done.current_step, WorkflowStep::Completed);
        assert_eq!(done.transactions.len(), 2);
        assert_eq!(done.transactions[1].kind, PaymentKind::EscrowFinish);
        assert_eq!(done.transactions[1].status, PaymentStatus::Confirmed);
        assert_eq!(done.escrow.as_ref().unwrap().status, EscrowStatus::Completed);
        assert!(done.error.is_none());

        // Funds are no longer held.
        assert!(!ledger.is_held(PAYER, escrow.offer_sequence));
    }

    /// Escrow expiry tracks the configured release window.
    #[tokio::test]
    async fn test_escrow_expiry_follows_release_window() {
        let (orchestrator, _) = harness();
        let started = orchestrator
            .start_booking_workflow(booking(PaymentType::Escrow), PAYER, PAYEE)
            .await;
        let workflow = started.workflow.unwrap();
        let escrow = workflow.escrow.as_ref().unwrap();

        // Default policy holds the escrow claimable for 24 hours.
        assert_eq!(escrow.expires_at - escrow.created_at, Duration::hours(24));
    }

    /// Cancelling a funded booking returns the escrowed funds.
    #[tokio::test]
    async fn test_cancel_escrow_booking_returns_funds() {
        let (orchestrator, ledger) = harness();
        let started = orchestrator
            .start_booking_workflow(booking(PaymentType::Escrow), PAYER, PAYEE)
            .await;
        let booking_id = started.workflow.unwrap().booking_id;

        let cancelled = orchestrator
            .cancel_booking(&booking_id, "coach unavailable")
            .await;
        assert!(cancelled.success);
        let workflow = cancelled.workflow.unwrap();

        assert_eq!(workflow.current_step, WorkflowStep::Refunded);
        assert_eq!(workflow.transactions.len(), 2);
        let cancel_tx = &workflow.transactions[1];
        assert_eq!(cancel_tx.kind, PaymentKind::EscrowCancel);
        assert_eq!(cancel_tx.memo.as_deref(), Some("coach unavailable"));
        assert_eq!(
            workflow.escrow.as_ref().unwrap().status,
            EscrowStatus::Cancelled
        );
        assert!(!ledger.is_held(PAYER, 1));
    }

    /// A wrong capability must not release anything; the workflow is
    /// cancelled and the escrow stays on the ledger.
    #[tokio::test]
    async fn test_finalize_requires_exact_capability() {
        let (orchestrator, ledger) = harness();
        let started = orchestrator
            .start_booking_workflow(booking(PaymentType::Escrow), PAYER, PAYEE)
            .await;
        let booking_id = started.workflow.unwrap().booking_id;

        let result = orchestrator
            .finalize_session_escrow(&booking_id, &"00".repeat(32))
            .await;
        assert!(!result.success);
        assert_eq!(
            result.workflow.unwrap().current_step,
            WorkflowStep::Cancelled
        );
        assert!(ledger.is_held(PAYER, 1), "funds must stay locked");
    }

    // =============================================================================
    // DIRECT PAYMENT LIFECYCLE
    // =============================================================================

    /// Direct payments settle immediately and refund by a compensating
    /// transfer on cancellation.
    #[tokio::test]
    async fn test_direct_booking_full_lifecycle() {
        let (orchestrator, ledger) = harness();

        let started = orchestrator
            .start_booking_workflow(booking(PaymentType::Direct), PAYER, PAYEE)
            .await;
        assert!(started.success);
        let workflow = started.workflow.unwrap();

        assert_eq!(workflow.current_step, WorkflowStep::SessionScheduled);
        assert!(workflow.escrow.is_none());
        assert_eq!(workflow.transactions.len(), 1);
        assert_eq!(workflow.transactions[0].kind, PaymentKind::Payment);
        assert_eq!(ledger.escrow_count(), 0);

        let cancelled = orchestrator.cancel_booking(&workflow.booking_id, "rain").await;
        assert!(cancelled.success);
        let refunded = cancelled.workflow.unwrap();

        assert_eq!(refunded.current_step, WorkflowStep::Refunded);
        assert_eq!(refunded.transactions.len(), 2);
        let refund = &refunded.transactions[1];
        assert_eq!(refund.kind, PaymentKind::Refund);
        // Refund flows the opposite way.
        assert_eq!(refund.payer, PAYEE);
        assert_eq!(refund.payee, PAYER);
        assert_eq!(refund.amount, "30.0");
    }

    // =============================================================================
    // FAILURE HANDLING
    // =============================================================================

    /// Validation collects every failure and cancels before any money
    /// moves.
    #[tokio::test]
    async fn test_validation_failure_cancels_before_settlement() {
        let (orchestrator, ledger) = harness();
        let mut request = booking(PaymentType::Escrow);
        request.coach_id = String::new();
        request.amount = "free".to_string();

        let result = orchestrator
            .start_booking_workflow(request, PAYER, PAYEE)
            .await;
        assert!(!result.success);
        let message = result.error.as_deref().unwrap();
        assert!(message.contains("Coach ID is required"));
        assert!(message.contains("Amount must be a positive decimal number"));

        let workflow = result.workflow.unwrap();
        assert_eq!(workflow.current_step, WorkflowStep::Cancelled);
        assert!(workflow.transactions.is_empty());
        assert_eq!(ledger.escrow_count(), 0);

        // The failed workflow remains queryable for the client.
        let stored = orchestrator
            .get_workflow_status(&workflow.booking_id)
            .await
            .unwrap();
        assert_eq!(stored.error, workflow.error);
    }

    /// Unknown booking IDs come back with the exact not-found message
    /// and no workflow attached.
    #[tokio::test]
    async fn test_finalize_unknown_booking_exact_error() {
        let (orchestrator, _) = harness();
        let result = orchestrator
            .finalize_session_escrow("booking_does_not_exist", &"AA".repeat(32))
            .await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Workflow not found"));
        assert!(result.workflow.is_none());
    }

    /// A ledger outage at funding time cancels the booking outright.
    #[tokio::test]
    async fn test_ledger_outage_cancels_booking() {
        let (orchestrator, ledger) = harness();
        ledger.set_fail_submissions(true);

        let result = orchestrator
            .start_booking_workflow(booking(PaymentType::Escrow), PAYER, PAYEE)
            .await;
        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().contains("Ledger submission failed"));
        let workflow = result.workflow.unwrap();
        assert_eq!(workflow.current_step, WorkflowStep::Cancelled);
        assert!(workflow.transactions.is_empty());
    }

    // =============================================================================
    // CAPABILITY CUSTODY
    // =============================================================================

    /// The fulfillment is handed out exactly once, in the start result.
    /// Every read path strips it.
    #[tokio::test]
    async fn test_status_reads_never_leak_capability() {
        let (orchestrator, _) = harness();
        let started = orchestrator
            .start_booking_workflow(booking(PaymentType::Escrow), PAYER, PAYEE)
            .await;
        let workflow = started.workflow.unwrap();
        assert!(workflow.escrow.as_ref().unwrap().fulfillment.is_some());

        let status = orchestrator
            .get_workflow_status(&workflow.booking_id)
            .await
            .unwrap();
        assert!(status.escrow.as_ref().unwrap().fulfillment.is_none());

        let all = orchestrator.get_all_workflows().await;
        assert_eq!(all.len(), 1);
        assert!(all[0].escrow.as_ref().unwrap().fulfillment.is_none());
    }
}
