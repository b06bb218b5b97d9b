//! Cross-module integration tests for the escrow orchestrator.

pub mod booking_flows;
pub mod signing_flows;
