//! # Inbound Ports
//!
//! API trait defining what the booking workflow orchestrator can do.

use crate::domain::{BookingRequest, Workflow, WorkflowResult};
use async_trait::async_trait;

/// Booking workflow API - inbound port.
///
/// Mutating operations never return an error: failures come back as a
/// `WorkflowResult` with `success == false` and the message attached.
#[async_trait]
pub trait BookingWorkflowApi: Send + Sync {
    /// Start a booking workflow: validate, schedule the session and
    /// fund the escrow (or pay directly).
    ///
    /// On success the returned workflow still carries the fulfillment
    /// capability inside its escrow contract. This is the only time it
    /// is handed out; every later read strips it.
    async fn start_booking_workflow(
        &self,
        booking: BookingRequest,
        payer: &str,
        payee: &str,
    ) -> WorkflowResult;

    /// Release the escrow after a completed session by presenting the
    /// fulfillment.
    async fn finalize_session_escrow(&self, booking_id: &str, fulfillment: &str) -> WorkflowResult;

    /// Cancel a booking, returning escrowed funds to the payer or
    /// recording a compensating refund for direct payments.
    async fn cancel_booking(&self, booking_id: &str, reason: &str) -> WorkflowResult;

    /// Look up a single workflow. The returned copy never carries the
    /// fulfillment.
    async fn get_workflow_status(&self, booking_id: &str) -> Option<Workflow>;

    /// List every known workflow, fulfillments stripped.
    async fn get_all_workflows(&self) -> Vec<Workflow>;
}
