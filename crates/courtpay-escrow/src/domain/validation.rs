//! # Request Validation
//!
//! Pure validation over booking and escrow requests. Validators collect
//! every failure in one pass instead of stopping at the first, so a
//! client can fix a whole form at once.

use super::entities::{BookingRequest, PaymentRequest};
use super::value_objects::{is_valid_address, parse_amount, to_minor_units, MINOR_UNITS_PER_MAJOR};

/// Validate a booking request. Returns all failure messages, empty when
/// the request is acceptable.
pub fn validate_booking(booking: &BookingRequest) -> Vec<String> {
    let mut errors = Vec::new();

    if booking.coach_id.trim().is_empty() {
        errors.push("Coach ID is required".to_string());
    }
    // Epoch zero stands in for a missing date.
    if booking.session_start.timestamp() == 0 {
        errors.push("Session date/time is required".to_string());
    }
    if booking.duration_minutes == 0 {
        errors.push("Session duration must be a positive number of minutes".to_string());
    }
    if booking.court.trim().is_empty() {
        errors.push("Court is required".to_string());
    }
    if parse_amount(&booking.amount).is_err() {
        errors.push("Amount must be a positive decimal number".to_string());
    }

    errors
}

/// Validate an escrow request against the ledger address grammar and the
/// configured amount ceiling. Runs before any ledger or gateway call.
pub fn validate_escrow_request(request: &PaymentRequest, max_amount_major: u64) -> Vec<String> {
    let mut errors = Vec::new();

    if !is_valid_address(&request.destination) {
        errors.push("Destination is not a valid ledger address".to_string());
    }
    match parse_amount(&request.amount) {
        Err(_) => errors.push("Amount must be a positive decimal number".to_string()),
        Ok(amount) => match to_minor_units(amount) {
            Err(_) => errors.push("Amount has more precision than the ledger supports".to_string()),
            Ok(minor) => {
                if minor > max_amount_major.saturating_mul(MINOR_UNITS_PER_MAJOR) {
                    errors.push("Amount exceeds the maximum escrow amount".to_string());
                }
            }
        },
    }

    errors
}
