//! Decision logic for prescription actions.
//!
//! This crate owns everything between the FHIR resources and the rendered
//! buttons:
//! - the pharmacy configuration schema and its strict YAML parsing
//! - effective request status (including expiry derivation)
//! - the "most recent dispense" selection
//! - quantity-remaining accounting
//! - the action availability decision core
//! - dispense-draft initiation
//!
//! Everything here is synchronous and pure. The async billing lookup lives
//! in the `billing` crate; rendering and intent emission live in the root
//! `dispensary` crate.

pub mod availability;
pub mod config;
pub mod draft;
pub mod quantity;
pub mod session;
pub mod status;

// Re-export public domain-level types
pub use availability::ActionAvailability;
pub use config::{ActionButtonsConfig, ButtonToggle, DispenseBehaviorConfig, PharmacyConfig};
pub use draft::{initiate_medication_dispense_body, DispenseDraft};
pub use quantity::{
    compute_quantity_remaining, restricted_quantity_remaining, total_quantity_dispensed,
    total_quantity_ordered,
};
pub use session::PharmacySession;
pub use status::{
    compute_medication_request_status, compute_medication_request_status_at,
    most_recent_medication_dispense_status,
};

/// Errors returned by the decision layer.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid configuration: {0}")]
    ConfigSchema(String),
}

/// Type alias for Results that can fail with a [`CoreError`].
pub type CoreResult<T> = Result<T, CoreError>;
