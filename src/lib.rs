//! Prescription action buttons for a dispensing workflow.
//!
//! This crate is the render-model layer for the dispense / pause / close
//! actions on a medication request. It decides which buttons exist, whether
//! the dispense control is currently enabled, and what happens on press,
//! without owning any UI: pressing a button yields an [`ActionIntent`] that
//! the host forwards to its own overlay/form machinery through an
//! [`ActionDispatcher`].
//!
//! ## Layering
//!
//! - `crates/fhir`: medication request/dispense domain types and strict
//!   JSON wire models
//! - `crates/dispensary-core`: configuration schema, status and quantity
//!   computation, the availability decision core, draft initiation
//! - `crates/billing`: cached, cancellable bill-status lookups
//! - this crate: view models, press handling, intents
//!
//! Rendering is a pure projection: same inputs, same buttons. The only
//! asynchronous ingredient is the bill status, which the host obtains from
//! [`BillStatusResolver`] and passes in by value.
//!
//! ## Example Usage
//!
//! ```
//! use dispensary::{
//!     ActionButtons, ActionButtonsInput, BillStatus, MedicationRequest,
//!     MedicationRequestBundle, NonBlankText, PharmacyConfig, PharmacySession,
//!     PrescriptionAction,
//! };
//! use uuid::Uuid;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let request = MedicationRequest::parse(
//!     r#"{
//!         "id": "7f4c2e9d-4b0a-4f3a-9a2c-0e9a6b5d1c88",
//!         "status": "active",
//!         "subject": "Patient/a4f91c6d-3b2e-4c5f-9d7a-1e8b6c0a9f12",
//!         "medication_display": "Amoxicillin 500mg",
//!         "authored_on": "2025-03-10T09:15:00Z",
//!         "dispense_request": {"quantity": {"value": 21.0, "unit": "capsules"}}
//!     }"#,
//! )?;
//!
//! let patient_id = request.subject;
//! let buttons = ActionButtons::new(
//!     ActionButtonsInput {
//!         bundle: MedicationRequestBundle::new(request, Vec::new()),
//!         patient_id,
//!         encounter_id: Uuid::new_v4(),
//!     },
//!     PharmacyConfig::default(),
//!     PharmacySession {
//!         practitioner_id: Uuid::new_v4(),
//!         practitioner_display: NonBlankText::new("T. Nurse")?,
//!         location_id: None,
//!     },
//! );
//!
//! let now = "2025-03-12T00:00:00Z".parse()?;
//! let rendered = buttons.render_at(BillStatus::resolved(false), now);
//! assert_eq!(rendered.len(), 3);
//!
//! let intent = buttons.press_at(PrescriptionAction::Dispense, BillStatus::resolved(false), now);
//! assert!(intent.is_some());
//! # Ok(())
//! # }
//! ```

pub mod buttons;
pub mod intent;

pub use buttons::{
    ActionButtons, ActionButtonsInput, ButtonKind, ButtonLabel, ButtonViewModel,
    PrescriptionAction,
};
pub use intent::{
    ActionDispatcher, ActionIntent, ChannelDispatcher, DispatchError, FormMode, OverlayTitle,
};

// Re-export collaborator surfaces so hosts can depend on this crate alone.
pub use billing::{BillKey, BillStatus, BillStatusResolver, BillingError, BillingSource};
pub use dispensary_core::{
    compute_medication_request_status, compute_medication_request_status_at,
    compute_quantity_remaining, initiate_medication_dispense_body,
    most_recent_medication_dispense_status, restricted_quantity_remaining, ActionAvailability,
    ActionButtonsConfig, ButtonToggle, CoreError, CoreResult, DispenseBehaviorConfig,
    DispenseDraft, PharmacyConfig, PharmacySession,
};
pub use dispensary_types::{NonBlankText, QuantityError, QuantityValue, TextError};
pub use fhir::{
    DispenseRequest, FhirError, FhirResult, MedicationDispense, MedicationDispenseStatus,
    MedicationRequest, MedicationRequestBundle, MedicationRequestStatus, Quantity,
};
