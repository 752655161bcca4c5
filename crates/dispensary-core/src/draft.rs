//! Dispense draft initiation.
//!
//! Pressing an action opens a form pre-filled from the prescription and the
//! session. The draft is that pre-fill. It carries no status: the form
//! assigns one on submission (completed, on-hold or declined depending on
//! which form it is).

use crate::session::PharmacySession;
use dispensary_types::NonBlankText;
use fhir::{MedicationRequest, Quantity};
use uuid::Uuid;

/// Pre-populated dispense form body.
#[derive(Clone, Debug, PartialEq)]
pub struct DispenseDraft {
    /// The prescription this dispense would fulfil.
    pub authorizing_prescription: Uuid,

    /// The patient the supply is for.
    pub subject: Uuid,

    /// Medication name shown in the form header.
    pub medication_display: NonBlankText,

    /// Dosage text carried over for the dispenser's reference.
    pub dosage_instruction: Option<String>,

    /// Practitioner recorded as the performer.
    pub performer: Uuid,

    /// Display name for the performer.
    pub performer_display: NonBlankText,

    /// Where the dispense happens, when the session has a location.
    pub location: Option<Uuid>,

    /// Pre-filled amount. Populated only on the dispense path; pause and
    /// close drafts leave it empty.
    pub quantity: Option<Quantity>,

    /// Whether a substitute product is being supplied. Drafts always start
    /// as "not substituted"; the form flips it when the dispenser swaps the
    /// product.
    pub was_substituted: bool,
}

/// Build the pre-filled body an action form opens with.
///
/// Copies the medication, patient and dosage from the request and stamps
/// performer and location from the session. `populate_quantity` is true
/// only on the dispense path: pause and close record an event against the
/// prescription without moving stock.
pub fn initiate_medication_dispense_body(
    request: &MedicationRequest,
    session: &PharmacySession,
    populate_quantity: bool,
) -> DispenseDraft {
    DispenseDraft {
        authorizing_prescription: request.id,
        subject: request.subject,
        medication_display: request.medication_display.clone(),
        dosage_instruction: request.dosage_instruction.clone(),
        performer: session.practitioner_id,
        performer_display: session.practitioner_display.clone(),
        location: session.location_id,
        quantity: if populate_quantity {
            request.dispense_request.quantity.clone()
        } else {
            None
        },
        was_substituted: false,
    }
}
