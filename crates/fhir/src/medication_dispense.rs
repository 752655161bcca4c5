//! FHIR-aligned medication dispense wire models and translation helpers.
//!
//! A medication dispense records one fulfilment event against a medication
//! request: a supply prepared, handed over, declined, or still in flight.
//! The action layer reads the history of these events to decide which
//! actions remain open on the prescription.
//!
//! Notes:
//! - Unrecognized wire status codes translate to `Unknown`, never to an error
//! - Chronology is answered by [`MedicationDispense::occurred_at`], not by
//!   list position

use crate::quantity::Quantity;
use crate::{FhirError, FhirResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Public domain-level types
// ============================================================================

/// Lifecycle status of a medication dispense event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MedicationDispenseStatus {
    /// Supply is being prepared.
    Preparation,
    /// Dispense has started but not finished.
    InProgress,
    /// Dispense is paused.
    OnHold,
    /// Supply was handed over to the patient.
    Completed,
    /// Pharmacy declined to fill the prescription.
    Declined,
    /// Status code the dispensary does not model.
    Unknown,
}

impl MedicationDispenseStatus {
    /// Convert to FHIR wire format string.
    pub fn to_wire(self) -> &'static str {
        match self {
            MedicationDispenseStatus::Preparation => "preparation",
            MedicationDispenseStatus::InProgress => "in-progress",
            MedicationDispenseStatus::OnHold => "on-hold",
            MedicationDispenseStatus::Completed => "completed",
            MedicationDispenseStatus::Declined => "declined",
            MedicationDispenseStatus::Unknown => "unknown",
        }
    }

    /// Parse from FHIR wire format string.
    ///
    /// Total: codes outside the modeled set map to
    /// [`MedicationDispenseStatus::Unknown`].
    pub fn from_wire(s: &str) -> Self {
        match s {
            "preparation" => MedicationDispenseStatus::Preparation,
            "in-progress" => MedicationDispenseStatus::InProgress,
            "on-hold" => MedicationDispenseStatus::OnHold,
            "completed" => MedicationDispenseStatus::Completed,
            "declined" => MedicationDispenseStatus::Declined,
            _ => MedicationDispenseStatus::Unknown,
        }
    }
}

/// Domain-level carrier for one dispense event.
#[derive(Clone, Debug, PartialEq)]
pub struct MedicationDispense {
    /// Unique identifier for this dispense event (UUID).
    pub id: Uuid,

    /// Lifecycle status of the event.
    pub status: MedicationDispenseStatus,

    /// Amount supplied by this event, when stated.
    pub quantity: Option<Quantity>,

    /// When preparation of the supply started.
    pub when_prepared: Option<DateTime<Utc>>,

    /// When the supply was handed over to the patient.
    pub when_handed_over: Option<DateTime<Utc>>,

    /// When the event was recorded in the system.
    pub recorded: Option<DateTime<Utc>>,
}

impl MedicationDispense {
    /// Best-known instant at which this dispense event occurred.
    ///
    /// Prefers `recorded`, then `when_handed_over`, then `when_prepared`.
    /// Returns `None` when the event carries no timestamp at all; such
    /// events sort earliest.
    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        self.recorded.or(self.when_handed_over).or(self.when_prepared)
    }

    /// Parse a medication dispense from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if:
    /// - the JSON does not represent a valid medication dispense,
    /// - any field has an unexpected type or unknown keys are present,
    /// - `id` is not a valid UUID.
    pub fn parse(json_text: &str) -> FhirResult<Self> {
        let mut deserializer = serde_json::Deserializer::from_str(json_text);

        let wire =
            match serde_path_to_error::deserialize::<_, MedicationDispenseWire>(&mut deserializer)
            {
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
                        "Medication dispense schema mismatch at {path}: {source}"
                    )));
                }
            };

        wire_to_domain(wire)
    }

    /// Render a medication dispense as JSON text.
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

/// Wire representation of a medication dispense.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct MedicationDispenseWire {
    pub id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Quantity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when_prepared: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when_handed_over: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded: Option<DateTime<Utc>>,
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

/// Convert wire format medication dispense to domain types.
fn wire_to_domain(wire: MedicationDispenseWire) -> FhirResult<MedicationDispense> {
    let id = Uuid::parse_str(&wire.id)
        .map_err(|_| FhirError::InvalidUuid(format!("Invalid UUID in id: {}", wire.id)))?;

    Ok(MedicationDispense {
        id,
        status: MedicationDispenseStatus::from_wire(&wire.status),
        quantity: wire.quantity,
        when_prepared: wire.when_prepared,
        when_handed_over: wire.when_handed_over,
        recorded: wire.recorded,
    })
}

/// Convert domain types to wire format medication dispense.
fn domain_to_wire(dispense: &MedicationDispense) -> MedicationDispenseWire {
    MedicationDispenseWire {
        id: dispense.id.to_string(),
        status: dispense.status.to_wire().to_string(),
        quantity: dispense.quantity.clone(),
        when_prepared: dispense.when_prepared,
        when_handed_over: dispense.when_handed_over,
        recorded: dispense.recorded,
    }
}
