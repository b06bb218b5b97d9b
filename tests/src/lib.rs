//! # Courtpay Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/           # End-to-end workflow choreography
//!     ├── booking_flows.rs   # Booking lifecycle over the direct ledger
//!     ├── signing_flows.rs   # Interactive signing gateway flows
//!     └── concurrency.rs     # Parallel and conflicting operations
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p courtpay-tests
//!
//! # By category
//! cargo test -p courtpay-tests integration::
//!
//! # Benchmarks
//! cargo bench -p courtpay-tests
//! ```

#![allow(unused_variables)]
#![allow(unused_imports)]
#![allow(dead_code)]

pub mod integration;

/// Installs a tracing subscriber honoring `RUST_LOG`.
///
/// Safe to call from every test; only the first call wins.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
