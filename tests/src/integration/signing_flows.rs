//! # Interactive Signing Flow Tests
//!
//! Booking lifecycles over the gateway submitter: every transaction
//! goes through a signing request at the (mock) gateway, the signer's
//! wallet signs and broadcasts, and the orchestrator recovers the
//! escrow sequence from the ledger afterwards.
//!
//! ## Flows Tested
//!
//! 1. **Signed funding**: payload created, signed, sequence recovered
//! 2. **Signer says no**: rejection cancels the booking
//! 3. **Signer silent**: timeout leaves the workflow retryable
//! 4. **Gateway down**: finalize steps back and succeeds on retry

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use courtpay_escrow::{
        BookingRequest, BookingWorkflowApi, EscrowOrchestrator, EscrowStatus, GatewaySubmitter,
        InMemoryLedger, InMemoryWorkflowRepository, MockSigningGateway, OrchestratorConfig,
        PaymentStatus, PaymentType, SigningClient, WorkflowStep,
    };

    const PAYER: &str = "rN7n7otQDd6FczFgLdSqtcsAUxDkw6fzRH";
    const PAYEE: &str = "rPT1Sjq2YGrBMTttX4GZHjKu9dyfzbpAYe";

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn booking() -> BookingRequest {
        BookingRequest {
            coach_id: "coach_rafael".to_string(),
            session_start: Utc::now() + Duration::days(1),
            duration_minutes: 90,
            court: "clay-1".to_string(),
            amount: "45.0".to_string(),
            payment_type: PaymentType::Escrow,
            memo: None,
        }
    }

    /// Orchestrator wired through the signing gateway, with the mock
    /// gateway broadcasting signed transactions to the ledger.
    fn harness() -> (
        EscrowOrchestrator,
        Arc<MockSigningGateway>,
        Arc<InMemoryLedger>,
    ) {
        crate::init_tracing();
        let ledger = Arc::new(InMemoryLedger::new());
        let gateway = Arc::new(MockSigningGateway::new());
        gateway.attach_ledger(ledger.clone());

        let mut config = OrchestratorConfig::default();
        config.signing.poll_interval_secs = 1;
        config.signing.resolution_timeout_secs = 2;

        let signing = Arc::new(SigningClient::new(gateway.clone(), &config.signing));
        let submitter = Arc::new(GatewaySubmitter::new(signing, ledger.clone()));
        let repository = Arc::new(InMemoryWorkflowRepository::new());
        let orchestrator = EscrowOrchestrator::new(config, submitter, repository)
            .expect("config must validate");
        (orchestrator, gateway, ledger)
    }

    // =============================================================================
    // SIGNED FUNDING
    // =============================================================================

    /// A gateway-signed escrow records a pending-signature transaction
    /// and recovers the escrow sequence from the ledger.
    #[tokio::test]
    async fn test_gateway_booking_records_pending_signature() {
        let (orchestrator, gateway, ledger) = harness();

        let started = orchestrator
            .start_booking_workflow(booking(), PAYER, PAYEE)
            .await;
        assert!(started.success, "start failed: {:?}", started.error);
        let workflow = started.workflow.unwrap();

        let tx = &workflow.transactions[0];
        assert_eq!(tx.status, PaymentStatus::PendingSignature);
        assert_eq!(tx.signing_request_id.as_deref(), Some("signreq-1"));
        // The hash comes from the ledger the wallet broadcast to.
        assert_eq!(tx.tx_hash.as_deref().map(str::len), Some(64));

        let escrow = workflow.escrow.as_ref().unwrap();
        assert_eq!(escrow.offer_sequence, 1);
        assert!(ledger.is_held(PAYER, 1));
        assert_eq!(gateway.created_count(), 1);
    }

    /// Funding and finalization each require their own signature; the
    /// escrow is released once the second one lands.
    #[tokio::test]
    async fn test_gateway_full_lifecycle_releases_funds() {
        let (orchestrator, gateway, ledger) = harness();

        let started = orchestrator
            .start_booking_workflow(booking(), PAYER, PAYEE)
            .await;
        let workflow = started.workflow.unwrap();
        let capability = workflow
            .escrow
            .as_ref()
            .unwrap()
            .fulfillment
            .as_ref()
            .unwrap()
            .as_str()
            .to_string();

        let finalized = orchestrator
            .finalize_session_escrow(&workflow.booking_id, &capability)
            .await;
        assert!(finalized.success, "finalize failed: {:?}", finalized.error);
        let done = finalized.workflow.unwrap();

        assert_eq!(done.current_step, WorkflowStep::Completed);
        assert_eq!(done.transactions.len(), 2);
        assert_eq!(
            done.transactions[1].signing_request_id.as_deref(),
            Some("signreq-2")
        );
        // Gateway submissions report pending until ledger validation
        // is observed out of band.
        assert_eq!(done.transactions[1].status, PaymentStatus::PendingSignature);
        assert_eq!(done.escrow.as_ref().unwrap().status, EscrowStatus::Completed);
        assert!(!ledger.is_held(PAYER, 1));
        assert_eq!(gateway.created_count(), 2);
    }

    // =============================================================================
    // SIGNER DECLINES OR STALLS
    // =============================================================================

    /// The signer declining the funding request cancels the booking
    /// before anything reaches the ledger.
    #[tokio::test]
    async fn test_signer_rejection_cancels_booking() {
        let (orchestrator, gateway, ledger) = harness();
        gateway.script_rejected();

        let result = orchestrator
            .start_booking_workflow(booking(), PAYER, PAYEE)
            .await;
        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().contains("rejected"));

        let workflow = result.workflow.unwrap();
        assert_eq!(workflow.current_step, WorkflowStep::Cancelled);
        assert!(workflow.escrow.is_none());
        assert!(workflow.transactions.is_empty());
        assert_eq!(ledger.escrow_count(), 0);
    }

    /// A signer who never responds trips the resolution timeout; the
    /// workflow stays in place and can still be cancelled cleanly.
    #[tokio::test]
    async fn test_signature_timeout_leaves_workflow_for_retry() {
        let (orchestrator, gateway, ledger) = harness();
        gateway.script_never_resolves();

        let result = orchestrator
            .start_booking_workflow(booking(), PAYER, PAYEE)
            .await;
        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().contains("Timed out"));

        // Left at the funding step, not cancelled.
        let workflow = result.workflow.unwrap();
        assert_eq!(workflow.current_step, WorkflowStep::EscrowCreation);
        assert!(workflow.error.is_some());
        assert_eq!(ledger.escrow_count(), 0);

        // The stuck booking can still be closed out.
        let cancelled = orchestrator
            .cancel_booking(&workflow.booking_id, "signer never showed")
            .await;
        assert!(cancelled.success);
        assert_eq!(
            cancelled.workflow.unwrap().current_step,
            WorkflowStep::Cancelled
        );
    }

    // =============================================================================
    // GATEWAY OUTAGES
    // =============================================================================

    /// A gateway outage during finalize steps the workflow back to its
    /// last good step; once the gateway returns, finalize succeeds.
    #[tokio::test]
    async fn test_gateway_outage_keeps_finalize_retryable() {
        let (orchestrator, gateway, ledger) = harness();

        let started = orchestrator
            .start_booking_workflow(booking(), PAYER, PAYEE)
            .await;
        let workflow = started.workflow.unwrap();
        let capability = workflow
            .escrow
            .as_ref()
            .unwrap()
            .fulfillment
            .as_ref()
            .unwrap()
            .as_str()
            .to_string();

        // Gateway goes dark.
        gateway.set_unavailable(true);
        let attempt = orchestrator
            .finalize_session_escrow(&workflow.booking_id, &capability)
            .await;
        assert!(!attempt.success);
        assert!(attempt.error.as_deref().unwrap().contains("unavailable"));

        let stuck = attempt.workflow.unwrap();
        assert_eq!(stuck.current_step, WorkflowStep::SessionScheduled);
        assert!(stuck.error.is_some());
        assert!(ledger.is_held(PAYER, 1), "escrow must stay live");

        // Gateway comes back; the same call now goes through.
        gateway.set_unavailable(false);
        let retried = orchestrator
            .finalize_session_escrow(&workflow.booking_id, &capability)
            .await;
        assert!(retried.success, "retry failed: {:?}", retried.error);
        let done = retried.workflow.unwrap();
        assert_eq!(done.current_step, WorkflowStep::Completed);
        assert!(done.error.is_none());
        assert!(!ledger.is_held(PAYER, 1));
    }

    /// An expired signing request is terminal: the booking cancels.
    #[tokio::test]
    async fn test_expired_request_cancels_booking() {
        let (orchestrator, gateway, _) = harness();
        gateway.script_expired();

        let result = orchestrator
            .start_booking_workflow(booking(), PAYER, PAYEE)
            .await;
        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().contains("expired"));
        assert_eq!(
            result.workflow.unwrap().current_step,
            WorkflowStep::Cancelled
        );
    }
}
