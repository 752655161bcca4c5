//! FHIR wire/boundary support for the dispensary workflow.
//!
//! This crate provides **domain types** and **wire models/translation
//! helpers** for the medication resources the dispensary reasons about:
//! - medication requests (prescriptions) and their dispense-request details
//! - medication dispense events
//! - the request bundle handed to the action layer
//!
//! This crate focuses on:
//! - FHIR semantic alignment (without FHIR REST transport)
//! - serialisation/deserialisation of JSON payloads
//! - translation between domain primitives and wire structs
//!
//! Status codes outside the modeled unions are deliberately NOT an error:
//! they translate to the `Unknown` variant so that an upstream server adding
//! a code never breaks parsing. Callers decide what `Unknown` means (for the
//! action layer it means "no actions available").

pub mod medication_dispense;
pub mod medication_request;
pub mod quantity;

// Re-export public domain-level types
pub use medication_dispense::{MedicationDispense, MedicationDispenseStatus};
pub use medication_request::{
    DispenseRequest, MedicationRequest, MedicationRequestBundle, MedicationRequestStatus,
};
pub use quantity::Quantity;

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("translation error: {0}")]
    Translation(String),

    #[error("invalid UUID: {0}")]
    InvalidUuid(String),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;
