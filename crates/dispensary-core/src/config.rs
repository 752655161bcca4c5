//! Pharmacy configuration schema.
//!
//! The deployment-facing options the dispensary recognizes. The document is
//! YAML and parsing is strict: unknown keys are rejected with the path to
//! the offending field, so a typo never silently falls back to a default.
//! Locating and reading the document is the host application's job; this
//! module owns only the schema, the defaults, and the text entry point.
//!
//! Configuration is resolved once per session and treated as constant
//! afterwards; nothing in this workspace re-reads it.

use crate::{CoreError, CoreResult};
use serde::Deserialize;

/// Root configuration document.
///
/// Every field has a default, so an empty document is a valid configuration.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PharmacyConfig {
    /// Visibility toggles for the pause and close actions.
    pub action_buttons: ActionButtonsConfig,

    /// Dispensing workflow behavior.
    pub dispense_behavior: DispenseBehaviorConfig,

    /// Days after which an active request counts as expired.
    pub medication_request_expiration_period_in_days: u32,
}

impl Default for PharmacyConfig {
    fn default() -> Self {
        Self {
            action_buttons: ActionButtonsConfig::default(),
            dispense_behavior: DispenseBehaviorConfig::default(),
            medication_request_expiration_period_in_days: 90,
        }
    }
}

/// Per-action visibility toggles.
///
/// The dispense action has no toggle; it is always offered when the
/// decision core allows it.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ActionButtonsConfig {
    pub pause_button: ButtonToggle,
    pub close_button: ButtonToggle,
}

/// On/off switch for one action button.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ButtonToggle {
    pub enabled: bool,
}

impl Default for ButtonToggle {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Dispensing workflow behavior.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DispenseBehaviorConfig {
    /// When true, the quantity remaining on the prescription is surfaced to
    /// the dispense form and enforced as a cap.
    pub restrict_total_quantity_dispensed: bool,
}

impl PharmacyConfig {
    /// Parse a configuration document from YAML text.
    ///
    /// An empty (or whitespace-only) document yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigSchema`] with the path to the failing
    /// field when the document has unknown keys or mistyped values.
    pub fn from_yaml_str(text: &str) -> CoreResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }

        let deserializer = serde_yaml::Deserializer::from_str(text);
        match serde_path_to_error::deserialize(deserializer) {
            Ok(config) => Ok(config),
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() {
                    "<root>"
                } else {
                    path.as_str()
                };
                Err(CoreError::ConfigSchema(format!(
                    "Pharmacy config schema mismatch at {path}: {source}"
                )))
            }
        }
    }
}
