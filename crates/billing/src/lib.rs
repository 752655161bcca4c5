//! Billing lookups for the dispensary.
//!
//! This crate answers one question for the action layer: does the patient
//! owe money on a prescription before it may be dispensed? The answer is
//! fetched from a pluggable backend, cached per prescription, and pushed to
//! subscribers as it changes.
//!
//! Responsibilities:
//! - Define the [`BillingSource`] seam a billing backend implements
//! - Cache and deduplicate in-flight lookups per prescription
//! - Publish [`BillStatus`] snapshots over watch channels
//! - Discard stale responses when a lookup is superseded or cancelled
//!
//! Error policy: a failed lookup never blocks dispensing. The resolver logs
//! a warning and publishes a non-blocking status; billing enforcement is
//! advisory, not a safety interlock.

pub mod resolver;

pub use resolver::{BillKey, BillStatus, BillStatusResolver, BillingSource};

use thiserror::Error;

/// Errors a billing backend can report.
///
/// Constructed by [`BillingSource`] implementations; the resolver treats
/// every variant the same way (log and fail open).
#[derive(Error, Debug)]
pub enum BillingError {
    /// The backend rejected the lookup or returned a malformed response.
    #[error("Billing backend error: {0}")]
    Backend(String),

    /// The backend could not be reached.
    #[error("Billing service unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for billing operations.
pub type BillingResult<T> = Result<T, BillingError>;
