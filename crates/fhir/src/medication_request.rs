//! FHIR-aligned medication request wire models and translation helpers.
//!
//! This module provides both domain-level types and wire models for
//! medication requests (prescriptions), the resource every dispensary action
//! is anchored to.
//!
//! Responsibilities:
//! - Define public domain-level types for the action and decision layers
//! - Define a strict wire model for serialisation/deserialisation
//! - Provide translation helpers between domain primitives and the wire model
//! - Validate request structure and enforce required fields
//!
//! Notes:
//! - `Expired` never appears on the wire; it is derived by the core crate
//!   from the request's validity window
//! - Unrecognized wire status codes translate to `Unknown`, never to an error

use crate::medication_dispense::MedicationDispense;
use crate::quantity::Quantity;
use crate::{FhirError, FhirResult};
use chrono::{DateTime, Utc};
use dispensary_types::NonBlankText;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Public domain-level types
// ============================================================================

/// Lifecycle status of a medication request.
///
/// Mirrors the FHIR `MedicationRequest.status` code set the dispensary
/// reasons about, plus the derived `Expired` state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MedicationRequestStatus {
    /// Request is active and may be acted on.
    Active,
    /// Request is temporarily on hold.
    OnHold,
    /// Request was cancelled before completion.
    Cancelled,
    /// Request has been fully carried out.
    Completed,
    /// Request was stopped by the prescriber.
    Stopped,
    /// Request's validity window has elapsed. Derived, never on the wire.
    Expired,
    /// Status code the dispensary does not model.
    Unknown,
}

impl MedicationRequestStatus {
    /// Convert to FHIR wire format string.
    pub fn to_wire(self) -> &'static str {
        match self {
            MedicationRequestStatus::Active => "active",
            MedicationRequestStatus::OnHold => "on-hold",
            MedicationRequestStatus::Cancelled => "cancelled",
            MedicationRequestStatus::Completed => "completed",
            MedicationRequestStatus::Stopped => "stopped",
            MedicationRequestStatus::Expired => "expired",
            MedicationRequestStatus::Unknown => "unknown",
        }
    }

    /// Parse from FHIR wire format string.
    ///
    /// Total: codes outside the modeled set (including `"expired"`, which is
    /// never a valid wire status) map to [`MedicationRequestStatus::Unknown`].
    pub fn from_wire(s: &str) -> Self {
        match s {
            "active" => MedicationRequestStatus::Active,
            "on-hold" => MedicationRequestStatus::OnHold,
            "cancelled" => MedicationRequestStatus::Cancelled,
            "completed" => MedicationRequestStatus::Completed,
            "stopped" => MedicationRequestStatus::Stopped,
            _ => MedicationRequestStatus::Unknown,
        }
    }
}

/// Domain-level carrier for a medication request.
///
/// Only includes fields the dispensary creates, reads, or reasons about.
#[derive(Clone, Debug, PartialEq)]
pub struct MedicationRequest {
    /// Unique identifier for this request (UUID).
    pub id: Uuid,

    /// Wire-level lifecycle status (pre-expiry-derivation).
    pub status: MedicationRequestStatus,

    /// The patient the medication is for (UUID).
    pub subject: Uuid,

    /// Human-readable medication name, for example `"Amoxicillin 500mg"`.
    pub medication_display: NonBlankText,

    /// When the prescriber authored the request.
    pub authored_on: DateTime<Utc>,

    /// Free-text dosage instruction, if recorded.
    pub dosage_instruction: Option<String>,

    /// Whether a substitute product may be dispensed.
    pub substitution_allowed: bool,

    /// Fulfilment details for the dispenser.
    pub dispense_request: DispenseRequest,
}

/// Fulfilment details of a medication request.
#[derive(Clone, Debug, PartialEq)]
pub struct DispenseRequest {
    /// Amount to be dispensed per fill.
    pub quantity: Option<Quantity>,

    /// Number of refills authorized beyond the first fill.
    pub number_of_repeats_allowed: u32,

    /// Start of the request's validity window, when stated. Used as the
    /// expiry anchor in preference to `authored_on`.
    pub validity_period_start: Option<DateTime<Utc>>,
}

/// A medication request together with its dispense history.
///
/// Read-only input to the action layer; never mutated by it. The dispense
/// sequence carries whatever order the resource layer returned; chronological
/// questions go through [`MedicationDispense::occurred_at`].
#[derive(Clone, Debug, PartialEq)]
pub struct MedicationRequestBundle {
    /// The prescription.
    pub request: MedicationRequest,

    /// Dispense events recorded against the prescription.
    pub dispenses: Vec<MedicationDispense>,
}

impl MedicationRequestBundle {
    /// Bundles a request with its dispense events.
    pub fn new(request: MedicationRequest, dispenses: Vec<MedicationDispense>) -> Self {
        Self { request, dispenses }
    }
}

// ============================================================================
// Public MedicationRequest operations
// ============================================================================

impl MedicationRequest {
    /// Parse a medication request from JSON text.
    ///
    /// This uses `serde_path_to_error` to surface a best-effort "path"
    /// (e.g. `dispense_request.quantity.value`) to the failing field when the
    /// JSON does not match the wire schema.
    ///
    /// # Arguments
    ///
    /// * `json_text` - JSON text expected to represent a medication request.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if:
    /// - the JSON does not represent a valid medication request,
    /// - any field has an unexpected type or unknown keys are present,
    /// - `id` is not a valid UUID,
    /// - `subject` is not a `Patient/<uuid>` reference.
    pub fn parse(json_text: &str) -> FhirResult<Self> {
        let mut deserializer = serde_json::Deserializer::from_str(json_text);

        let wire =
            match serde_path_to_error::deserialize::<_, MedicationRequestWire>(&mut deserializer) {
                Ok(parsed) => parsed,
                Err(err) => {
                    let path = err.path().to_string();
                    let source = err.into_inner();
                    let path = if path.is_empty() {
                        "<root>"
                    } else {
                        path.as_str()
                    };
                    return Err(FhirError::Translation(format!(
                        "Medication request schema mismatch at {path}: {source}"
                    )));
                }
            };

        wire_to_domain(wire)
    }

    /// Render a medication request as JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::InvalidJson`] if serialization fails.
    pub fn render(&self) -> FhirResult<String> {
        let wire = domain_to_wire(self);
        Ok(serde_json::to_string(&wire)?)
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

/// Wire representation of a medication request.
///
/// All structs use `#[serde(deny_unknown_fields)]` for strict validation.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct MedicationRequestWire {
    pub id: String,
    pub status: String,
    /// Reference string in the form `Patient/<uuid>`.
    pub subject: String,
    pub medication_display: NonBlankText,
    pub authored_on: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage_instruction: Option<String>,
    #[serde(default)]
    pub substitution_allowed: bool,
    pub dispense_request: DispenseRequestWire,
}

/// Wire representation of the dispense request details.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct DispenseRequestWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Quantity>,
    #[serde(default)]
    pub number_of_repeats_allowed: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validity_period_start: Option<DateTime<Utc>>,
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

/// Parse a `Patient/<uuid>` reference string.
fn parse_patient_reference(reference: &str) -> FhirResult<Uuid> {
    let id = reference.strip_prefix("Patient/").ok_or_else(|| {
        FhirError::InvalidInput(format!(
            "subject must be a Patient/<uuid> reference, got: {reference}"
        ))
    })?;
    Uuid::parse_str(id)
        .map_err(|_| FhirError::InvalidUuid(format!("Invalid UUID in subject: {reference}")))
}

/// Convert wire format medication request to domain types.
fn wire_to_domain(wire: MedicationRequestWire) -> FhirResult<MedicationRequest> {
    let id = Uuid::parse_str(&wire.id)
        .map_err(|_| FhirError::InvalidUuid(format!("Invalid UUID in id: {}", wire.id)))?;

    let subject = parse_patient_reference(&wire.subject)?;

    Ok(MedicationRequest {
        id,
        status: MedicationRequestStatus::from_wire(&wire.status),
        subject,
        medication_display: wire.medication_display,
        authored_on: wire.authored_on,
        dosage_instruction: wire.dosage_instruction,
        substitution_allowed: wire.substitution_allowed,
        dispense_request: DispenseRequest {
            quantity: wire.dispense_request.quantity,
            number_of_repeats_allowed: wire.dispense_request.number_of_repeats_allowed,
            validity_period_start: wire.dispense_request.validity_period_start,
        },
    })
}

/// Convert domain types to wire format medication request.
fn domain_to_wire(request: &MedicationRequest) -> MedicationRequestWire {
    MedicationRequestWire {
        id: request.id.to_string(),
        status: request.status.to_wire().to_string(),
        subject: format!("Patient/{}", request.subject),
        medication_display: request.medication_display.clone(),
        authored_on: request.authored_on,
        dosage_instruction: request.dosage_instruction.clone(),
        substitution_allowed: request.substitution_allowed,
        dispense_request: DispenseRequestWire {
            quantity: request.dispense_request.quantity.clone(),
            number_of_repeats_allowed: request.dispense_request.number_of_repeats_allowed,
            validity_period_start: request.dispense_request.validity_period_start,
        },
    }
}
