//! # CourtPay Escrow Orchestrator
//!
//! Booking-payment workflows for a sports-coaching marketplace, settled
//! through conditional escrows on a payment ledger.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//! **Status:** Production-Ready
//!
//! ## Purpose
//!
//! Coordinate the full life of a coached-session booking:
//! - Validate booking and escrow requests before anything moves
//! - Lock the client's payment in a hashlocked ledger escrow
//! - Route transactions straight to the ledger or through an
//!   interactive signing gateway
//! - Release, refund or cancel with a complete transaction trail
//!
//! ## Workflow Steps
//!
//! | Step | Meaning |
//! |------|---------|
//! | Booking | Request validated, session record created |
//! | EscrowCreation | Condition generated, EscrowCreate submitted |
//! | EscrowPending | Escrow accepted by the ledger |
//! | SessionScheduled | Funds locked, session may proceed |
//! | EscrowFinalization | Fulfillment presented, EscrowFinish in flight |
//! | Completed | Funds released to the coach |
//!
//! ## Module Structure
//!
//! ```text
//! courtpay-escrow/
//! ├── domain/          # Workflow, EscrowContract, validation, errors
//! ├── algorithms/      # Hashlock conditions, transaction builders
//! ├── ports/           # BookingWorkflowApi, LedgerClient, SigningGateway
//! ├── adapters/        # HTTP gateway, submitters, in-memory backends
//! ├── signing.rs       # Interactive signing client (poll loop)
//! ├── service.rs       # EscrowOrchestrator
//! └── config.rs        # Runtime configuration
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;
pub mod signing;

// Re-exports
pub use adapters::{
    instruction_for, DirectLedgerSubmitter, GatewaySubmitter, HttpSigningGateway, InMemoryLedger,
    InMemoryWorkflowRepository,
};
pub use algorithms::{
    build_escrow_cancel, build_escrow_create, build_escrow_finish, build_payment,
    generate_condition_triple, verify_fulfillment, EscrowCreateParams, EscrowFinishParams,
    LedgerTx,
};
pub use config::{EscrowPolicyConfig, OrchestratorConfig, SigningConfig};
pub use domain::{
    validate_booking, validate_escrow_request, BookingRequest, ConditionTriple, EscrowContract,
    EscrowError, EscrowStatus, Fulfillment, PaymentKind, PaymentRequest, PaymentStatus,
    PaymentTransaction, PaymentType, Result, Session, Workflow, WorkflowResult, WorkflowStep,
};
pub use ports::{
    BookingWorkflowApi, LedgerClient, MockSigningGateway, PayloadResult, SigningGateway,
    SigningPayload, SubmitOutcome, SubmitResult, TransactionSubmitter, WorkflowRepository,
};
pub use service::{EscrowOrchestrator, OrchestratorStats};
pub use signing::{PendingSignatureRequest, SigningClient};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
