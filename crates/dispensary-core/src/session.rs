//! Dispensing session value.

use dispensary_types::NonBlankText;
use uuid::Uuid;

/// Who is dispensing and where.
///
/// Captured once from the host's auth layer and passed by reference; this
/// workspace never fetches or refreshes it. Used only to stamp provenance
/// onto dispense drafts.
#[derive(Clone, Debug, PartialEq)]
pub struct PharmacySession {
    /// Practitioner recorded as the dispense performer.
    pub practitioner_id: Uuid,

    /// Display name for the performer.
    pub practitioner_display: NonBlankText,

    /// Session location, when the host tracks one.
    pub location_id: Option<Uuid>,
}
