//! Action visibility decisions.
//!
//! The decision core of the workflow: given the effective request status,
//! the most recent dispense status and the configured toggles, which of the
//! three prescription actions are offered at all. Billing never moves these
//! flags; an unpaid bill disables the dispense control without hiding it.

use crate::config::ActionButtonsConfig;
use fhir::{MedicationDispenseStatus, MedicationRequestStatus};

/// Which of the three prescription actions are offered.
///
/// A pure projection of (request status, latest dispense status, config);
/// deriving it twice from the same inputs gives the same flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionAvailability {
    /// A dispense form may be opened.
    pub dispensable: bool,
    /// A pause form may be opened.
    pub pauseable: bool,
    /// A close form may be opened.
    pub closeable: bool,
}

impl ActionAvailability {
    /// Derive availability for one prescription snapshot.
    ///
    /// Only `Active` requests offer any action. A `Declined` latest dispense
    /// withdraws all three; an `OnHold` latest dispense withdraws only the
    /// pause action (the prescription is already paused). `latest_dispense`
    /// is `None` when nothing has been dispensed yet, which counts as
    /// neither paused nor declined.
    pub fn derive(
        request_status: MedicationRequestStatus,
        latest_dispense: Option<MedicationDispenseStatus>,
        config: &ActionButtonsConfig,
    ) -> Self {
        let request_active = matches!(request_status, MedicationRequestStatus::Active);
        let declined = matches!(latest_dispense, Some(MedicationDispenseStatus::Declined));
        let paused = matches!(latest_dispense, Some(MedicationDispenseStatus::OnHold));

        Self {
            dispensable: request_active && !declined,
            pauseable: config.pause_button.enabled && request_active && !paused && !declined,
            closeable: config.close_button.enabled && request_active && !declined,
        }
    }
}
