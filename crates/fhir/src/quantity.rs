//! FHIR-aligned quantity model.
//!
//! A quantity pairs a validated numeric value with an optional human-readable
//! unit and an optional coded unit. Arithmetic on the value lives in
//! `dispensary_types::QuantityValue`; this module only carries the wire shape.

use dispensary_types::QuantityValue;
use serde::{Deserialize, Serialize};

/// Amount of medication, as ordered or as dispensed.
///
/// `value` is finite and non-negative by construction. `unit` is display
/// text ("capsules"); `code` is the coded form when the deployment records
/// one.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Quantity {
    pub value: QuantityValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Quantity {
    /// Quantity with a bare value and no unit.
    pub fn new(value: QuantityValue) -> Self {
        Self {
            value,
            unit: None,
            code: None,
        }
    }
}
