//! # Algorithms Module
//!
//! Pure logic for the escrow workflow: condition generation and
//! transaction construction. Nothing here performs I/O.

pub mod hashlock;
pub mod tx_builder;

pub use hashlock::{condition_for, generate_condition_triple, generate_preimage, verify_fulfillment};
pub use tx_builder::{
    build_escrow_cancel, build_escrow_create, build_escrow_finish, build_payment, EscrowCancelTx,
    EscrowCreateParams, EscrowCreateTx, EscrowFinishParams, EscrowFinishTx, LedgerTx, PaymentTx,
    TxMemo,
};
