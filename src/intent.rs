//! Overlay intents and the dispatcher seam.
//!
//! Pressing a button never launches anything itself. It produces an
//! [`ActionIntent`] describing which form to open and with what payload;
//! the host owns the overlay machinery and consumes intents through an
//! [`ActionDispatcher`]. This keeps the decision layer free of UI side
//! effects and makes every press observable in tests.

use dispensary_core::DispenseDraft;
use dispensary_types::QuantityValue;
use fhir::MedicationRequestBundle;
use tokio::sync::mpsc;
use uuid::Uuid;

// ============================================================================
// Intents
// ============================================================================

/// Overlay title for a form intent.
///
/// Carried as a key plus default text so hosts with a translation catalog
/// can localize and bare hosts can render the default.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlayTitle {
    DispensePrescription,
    PausePrescription,
    ClosePrescription,
}

impl OverlayTitle {
    /// Translation catalog key.
    pub fn key(self) -> &'static str {
        match self {
            OverlayTitle::DispensePrescription => "dispensePrescription",
            OverlayTitle::PausePrescription => "pausePrescription",
            OverlayTitle::ClosePrescription => "closePrescription",
        }
    }

    /// Text shown when no catalog entry overrides it.
    pub fn default_text(self) -> &'static str {
        match self {
            OverlayTitle::DispensePrescription => "Dispense prescription",
            OverlayTitle::PausePrescription => "Pause prescription",
            OverlayTitle::ClosePrescription => "Close prescription",
        }
    }
}

/// How the host form opens.
///
/// Intents from this crate always open forms in [`FormMode::Enter`];
/// [`FormMode::Edit`] exists for hosts revisiting an already recorded
/// dispense through the same forms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormMode {
    Enter,
    Edit,
}

impl FormMode {
    pub fn as_str(self) -> &'static str {
        match self {
            FormMode::Enter => "enter",
            FormMode::Edit => "edit",
        }
    }
}

/// Message emitted when a visible, enabled action is pressed.
///
/// Each variant carries everything its form needs; nothing is fetched
/// later. The dispense variant additionally snapshots the bundle (the form
/// shows the dispense history) and the quantity-remaining cap when the
/// deployment restricts total quantity dispensed.
#[derive(Clone, Debug, PartialEq)]
pub enum ActionIntent {
    OpenDispenseForm {
        title: OverlayTitle,
        patient_id: Uuid,
        encounter_id: Uuid,
        draft: DispenseDraft,
        bundle: MedicationRequestBundle,
        /// `None` when the deployment does not restrict total quantity.
        quantity_remaining: Option<QuantityValue>,
        mode: FormMode,
    },
    OpenPauseForm {
        title: OverlayTitle,
        patient_id: Uuid,
        encounter_id: Uuid,
        draft: DispenseDraft,
        mode: FormMode,
    },
    OpenCloseForm {
        title: OverlayTitle,
        patient_id: Uuid,
        encounter_id: Uuid,
        draft: DispenseDraft,
        mode: FormMode,
    },
}

impl ActionIntent {
    /// Overlay title for this intent.
    pub fn title(&self) -> OverlayTitle {
        match self {
            ActionIntent::OpenDispenseForm { title, .. }
            | ActionIntent::OpenPauseForm { title, .. }
            | ActionIntent::OpenCloseForm { title, .. } => *title,
        }
    }
}

// ============================================================================
// Dispatcher seam
// ============================================================================

/// Errors crossing the dispatcher seam.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The host dropped its receiving end; the intent was discarded.
    #[error("overlay host is gone, intent dropped")]
    Closed,
}

/// Caller-owned sink for action intents.
///
/// The host application implements this (or uses [`ChannelDispatcher`]) and
/// decides what an intent means: open an overlay, push a route, record the
/// request. Dispatch is synchronous and must not block.
pub trait ActionDispatcher: Send + Sync {
    /// Deliver one intent to the host.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Closed`] when the host can no longer accept
    /// intents.
    fn dispatch(&self, intent: ActionIntent) -> Result<(), DispatchError>;
}

/// Dispatcher backed by an unbounded tokio channel.
///
/// The component side keeps the sender; the host side drains the receiver
/// from its event loop.
#[derive(Clone)]
pub struct ChannelDispatcher {
    tx: mpsc::UnboundedSender<ActionIntent>,
}

impl ChannelDispatcher {
    /// Create a dispatcher and the receiver the host drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ActionIntent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ActionDispatcher for ChannelDispatcher {
    fn dispatch(&self, intent: ActionIntent) -> Result<(), DispatchError> {
        self.tx.send(intent).map_err(|_| DispatchError::Closed)
    }
}
