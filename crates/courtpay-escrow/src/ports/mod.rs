//! # Ports Module
//!
//! Inbound and outbound port traits for the escrow workflow.

pub mod inbound;
pub mod outbound;

pub use inbound::BookingWorkflowApi;
pub use outbound::{
    LedgerClient, LedgerObject, MockSigningGateway, PayloadResult, ScriptedResolution,
    SigningGateway, SigningPayload, SubmitOutcome, SubmitResult, TransactionSubmitter,
    WorkflowRepository,
};
