//! Effective status computation.
//!
//! The wire carries what the prescriber system knows; the dispensary derives
//! two more facts before deciding anything: whether an active request has
//! expired, and which dispense event speaks for the prescription's current
//! state.

use chrono::{DateTime, Duration, Utc};
use fhir::{
    MedicationDispense, MedicationDispenseStatus, MedicationRequest, MedicationRequestStatus,
};

/// Effective status of a request at `now`.
///
/// `Active` requests expire once their anchor date (validity-period start,
/// else authored-on) is more than `expiration_days` days in the past; the
/// boundary instant itself is still active, and a window end past the
/// representable time range never arrives. Every other status passes
/// through unchanged, so a cancelled or completed request never flips to
/// `Expired`.
pub fn compute_medication_request_status_at(
    request: &MedicationRequest,
    expiration_days: u32,
    now: DateTime<Utc>,
) -> MedicationRequestStatus {
    match request.status {
        MedicationRequestStatus::Active => {
            let anchor = request
                .dispense_request
                .validity_period_start
                .unwrap_or(request.authored_on);
            match anchor.checked_add_signed(Duration::days(i64::from(expiration_days))) {
                Some(expires_at) if now > expires_at => MedicationRequestStatus::Expired,
                _ => MedicationRequestStatus::Active,
            }
        }
        MedicationRequestStatus::OnHold
        | MedicationRequestStatus::Cancelled
        | MedicationRequestStatus::Completed
        | MedicationRequestStatus::Stopped
        | MedicationRequestStatus::Expired
        | MedicationRequestStatus::Unknown => request.status,
    }
}

/// Effective status of a request right now.
///
/// See [`compute_medication_request_status_at`] for the rules.
pub fn compute_medication_request_status(
    request: &MedicationRequest,
    expiration_days: u32,
) -> MedicationRequestStatus {
    compute_medication_request_status_at(request, expiration_days, Utc::now())
}

/// Status of the chronologically last dispense event.
///
/// Ordering follows [`MedicationDispense::occurred_at`]: events without any
/// timestamp sort earliest, and a timestamp tie goes to the later list
/// position. Returns `None` for an empty history.
pub fn most_recent_medication_dispense_status(
    dispenses: &[MedicationDispense],
) -> Option<MedicationDispenseStatus> {
    dispenses
        .iter()
        .max_by_key(|dispense| dispense.occurred_at())
        .map(|dispense| dispense.status)
}
