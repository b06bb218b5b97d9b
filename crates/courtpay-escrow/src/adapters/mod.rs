//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements outbound port traits for the settlement ledger, the
//! signing gateway, the two submission strategies and workflow storage.

mod http_gateway;
mod memory_ledger;
mod memory_repository;
mod submitters;

pub use http_gateway::HttpSigningGateway;
pub use memory_ledger::InMemoryLedger;
pub use memory_repository::InMemoryWorkflowRepository;
pub use submitters::{instruction_for, DirectLedgerSubmitter, GatewaySubmitter};
