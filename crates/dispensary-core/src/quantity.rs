//! Quantity accounting across a prescription's dispense history.

use crate::config::DispenseBehaviorConfig;
use dispensary_types::QuantityValue;
use fhir::{
    MedicationDispense, MedicationDispenseStatus, MedicationRequest, MedicationRequestBundle,
};

/// Total amount the prescription authorizes: the ordered quantity times the
/// initial fill plus allowed repeats.
///
/// `None` when the request carries no quantity at all, which is distinct
/// from an explicit zero.
pub fn total_quantity_ordered(request: &MedicationRequest) -> Option<QuantityValue> {
    let fills = request
        .dispense_request
        .number_of_repeats_allowed
        .saturating_add(1);
    request
        .dispense_request
        .quantity
        .as_ref()
        .map(|quantity| quantity.value.saturating_mul(fills))
}

/// Sum of quantities over completed dispense events.
///
/// In-flight, paused and declined events do not move stock, so they do not
/// count against the authorized total.
pub fn total_quantity_dispensed(dispenses: &[MedicationDispense]) -> QuantityValue {
    dispenses
        .iter()
        .filter(|dispense| matches!(dispense.status, MedicationDispenseStatus::Completed))
        .filter_map(|dispense| dispense.quantity.as_ref())
        .fold(QuantityValue::ZERO, |total, quantity| {
            total.saturating_add(quantity.value)
        })
}

/// Amount still available to dispense, floored at zero.
pub fn compute_quantity_remaining(bundle: &MedicationRequestBundle) -> QuantityValue {
    let ordered = total_quantity_ordered(&bundle.request).unwrap_or(QuantityValue::ZERO);
    ordered.saturating_sub(total_quantity_dispensed(&bundle.dispenses))
}

/// Quantity remaining, surfaced only under the restriction flag.
///
/// `None` means "no restriction configured": the caller neither displays
/// nor enforces a cap. That is distinct from a remaining value of zero.
pub fn restricted_quantity_remaining(
    bundle: &MedicationRequestBundle,
    behavior: &DispenseBehaviorConfig,
) -> Option<QuantityValue> {
    if behavior.restrict_total_quantity_dispensed {
        Some(compute_quantity_remaining(bundle))
    } else {
        None
    }
}
