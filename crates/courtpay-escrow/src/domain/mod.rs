//! # Domain Module
//!
//! Core domain types for the booking-payment escrow workflow.

pub mod condition;
pub mod entities;
pub mod errors;
pub mod validation;
pub mod value_objects;

pub use condition::{ConditionTriple, Fulfillment};
pub use entities::*;
pub use errors::*;
pub use validation::*;
pub use value_objects::*;
