//! Action button view models and press handling.
//!
//! The Rust counterpart of the action-buttons row on a prescription: one
//! component instance per medication request bundle, rendered against the
//! ambient config, session and current bill status. Visibility comes from
//! the decision core; billing only ever disables the dispense control, it
//! never hides it.

use crate::intent::{ActionDispatcher, ActionIntent, DispatchError, FormMode, OverlayTitle};
use billing::BillStatus;
use chrono::{DateTime, Utc};
use dispensary_core::{
    compute_medication_request_status_at, initiate_medication_dispense_body,
    most_recent_medication_dispense_status, restricted_quantity_remaining, ActionAvailability,
    PharmacyConfig, PharmacySession,
};
use fhir::MedicationRequestBundle;
use uuid::Uuid;

// ============================================================================
// View model types
// ============================================================================

/// The three actions a prescription row can offer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrescriptionAction {
    Dispense,
    Pause,
    Close,
}

/// Visual weight of a button, named after the host toolkit's kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonKind {
    Primary,
    Secondary,
    Danger,
}

/// Button caption, as a translation key plus default text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonLabel {
    Dispense,
    PendingBill,
    LoadingData,
    Pause,
    Close,
}

impl ButtonLabel {
    /// Translation catalog key.
    pub fn key(self) -> &'static str {
        match self {
            ButtonLabel::Dispense => "dispense",
            ButtonLabel::PendingBill => "pendingPayment",
            ButtonLabel::LoadingData => "loading",
            ButtonLabel::Pause => "pause",
            ButtonLabel::Close => "close",
        }
    }

    /// Text shown when no catalog entry overrides it.
    pub fn default_text(self) -> &'static str {
        match self {
            ButtonLabel::Dispense => "Dispense",
            ButtonLabel::PendingBill => "Pending bill",
            ButtonLabel::LoadingData => "Loading data...",
            ButtonLabel::Pause => "Pause",
            ButtonLabel::Close => "Close",
        }
    }

    /// Caption of the dispense button under the given bill status. The
    /// loading caption wins over the pending-bill caption.
    fn dispense_for(bill_status: BillStatus) -> Self {
        if bill_status.is_loading {
            ButtonLabel::LoadingData
        } else if bill_status.should_pay_bill {
            ButtonLabel::PendingBill
        } else {
            ButtonLabel::Dispense
        }
    }
}

/// One rendered button.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ButtonViewModel {
    pub action: PrescriptionAction,
    pub kind: ButtonKind,
    pub label: ButtonLabel,
    /// Whether pressing does anything right now.
    pub enabled: bool,
    /// Whether the button shows a busy indicator.
    pub loading: bool,
}

// ============================================================================
// Component
// ============================================================================

/// Per-prescription inputs, as handed over by the prescription table row.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionButtonsInput {
    /// The request and its dispense history. Never mutated here.
    pub bundle: MedicationRequestBundle,
    /// Patient the row belongs to.
    pub patient_id: Uuid,
    /// Encounter the forms record against.
    pub encounter_id: Uuid,
}

/// Action-button row for one medication request.
///
/// Holds the per-render snapshot (bundle, config, session); the bill status
/// is passed into each call because it changes while the row is on screen.
/// `render` is a pure projection and `press` has no side effect beyond the
/// returned intent, so both can be called repeatedly and out of order.
pub struct ActionButtons {
    input: ActionButtonsInput,
    config: PharmacyConfig,
    session: PharmacySession,
}

impl ActionButtons {
    /// Assemble the row from its inputs and the ambient values.
    pub fn new(
        input: ActionButtonsInput,
        config: PharmacyConfig,
        session: PharmacySession,
    ) -> Self {
        Self {
            input,
            config,
            session,
        }
    }

    /// Buttons to show right now, in dispense/pause/close order.
    pub fn render(&self, bill_status: BillStatus) -> Vec<ButtonViewModel> {
        self.render_at(bill_status, Utc::now())
    }

    /// Buttons to show at `now`, in dispense/pause/close order.
    ///
    /// Expiry derivation makes this time-dependent; taking `now` keeps the
    /// projection deterministic.
    pub fn render_at(&self, bill_status: BillStatus, now: DateTime<Utc>) -> Vec<ButtonViewModel> {
        let availability = self.availability_at(now);
        let mut buttons = Vec::new();

        if availability.dispensable {
            buttons.push(ButtonViewModel {
                action: PrescriptionAction::Dispense,
                kind: ButtonKind::Primary,
                label: ButtonLabel::dispense_for(bill_status),
                enabled: !bill_status.blocks_dispensing(),
                loading: bill_status.is_loading,
            });
        }
        if availability.pauseable {
            buttons.push(ButtonViewModel {
                action: PrescriptionAction::Pause,
                kind: ButtonKind::Secondary,
                label: ButtonLabel::Pause,
                enabled: true,
                loading: false,
            });
        }
        if availability.closeable {
            buttons.push(ButtonViewModel {
                action: PrescriptionAction::Close,
                kind: ButtonKind::Danger,
                label: ButtonLabel::Close,
                enabled: true,
                loading: false,
            });
        }

        buttons
    }

    /// Handle a press right now. See [`ActionButtons::press_at`].
    pub fn press(
        &self,
        action: PrescriptionAction,
        bill_status: BillStatus,
    ) -> Option<ActionIntent> {
        self.press_at(action, bill_status, Utc::now())
    }

    /// Handle a press at `now`.
    ///
    /// Returns `None` when the action is not visible under the current
    /// inputs, or when the dispense control is disabled by the bill status.
    /// Otherwise returns the intent the host should dispatch; nothing else
    /// happens.
    pub fn press_at(
        &self,
        action: PrescriptionAction,
        bill_status: BillStatus,
        now: DateTime<Utc>,
    ) -> Option<ActionIntent> {
        let availability = self.availability_at(now);

        match action {
            PrescriptionAction::Dispense => {
                if !availability.dispensable || bill_status.blocks_dispensing() {
                    return None;
                }
                let draft = initiate_medication_dispense_body(
                    &self.input.bundle.request,
                    &self.session,
                    true,
                );
                let quantity_remaining = restricted_quantity_remaining(
                    &self.input.bundle,
                    &self.config.dispense_behavior,
                );
                Some(ActionIntent::OpenDispenseForm {
                    title: OverlayTitle::DispensePrescription,
                    patient_id: self.input.patient_id,
                    encounter_id: self.input.encounter_id,
                    draft,
                    bundle: self.input.bundle.clone(),
                    quantity_remaining,
                    mode: FormMode::Enter,
                })
            }
            PrescriptionAction::Pause => {
                if !availability.pauseable {
                    return None;
                }
                let draft = initiate_medication_dispense_body(
                    &self.input.bundle.request,
                    &self.session,
                    false,
                );
                Some(ActionIntent::OpenPauseForm {
                    title: OverlayTitle::PausePrescription,
                    patient_id: self.input.patient_id,
                    encounter_id: self.input.encounter_id,
                    draft,
                    mode: FormMode::Enter,
                })
            }
            PrescriptionAction::Close => {
                if !availability.closeable {
                    return None;
                }
                let draft = initiate_medication_dispense_body(
                    &self.input.bundle.request,
                    &self.session,
                    false,
                );
                Some(ActionIntent::OpenCloseForm {
                    title: OverlayTitle::ClosePrescription,
                    patient_id: self.input.patient_id,
                    encounter_id: self.input.encounter_id,
                    draft,
                    mode: FormMode::Enter,
                })
            }
        }
    }

    /// Press and forward in one step.
    ///
    /// Returns `Ok(true)` when an intent was dispatched, `Ok(false)` when
    /// the press had nothing to do.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] when the dispatcher rejects the intent.
    pub fn press_and_dispatch(
        &self,
        action: PrescriptionAction,
        bill_status: BillStatus,
        dispatcher: &dyn ActionDispatcher,
    ) -> Result<bool, DispatchError> {
        match self.press(action, bill_status) {
            Some(intent) => {
                dispatcher.dispatch(intent)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn availability_at(&self, now: DateTime<Utc>) -> ActionAvailability {
        let effective_status = compute_medication_request_status_at(
            &self.input.bundle.request,
            self.config.medication_request_expiration_period_in_days,
            now,
        );
        let latest_dispense =
            most_recent_medication_dispense_status(&self.input.bundle.dispenses);
        ActionAvailability::derive(effective_status, latest_dispense, &self.config.action_buttons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::ChannelDispatcher;
    use chrono::{Duration, TimeZone};
    use dispensary_types::{NonBlankText, QuantityValue};
    use fhir::{
        DispenseRequest, MedicationDispense, MedicationDispenseStatus, MedicationRequest,
        MedicationRequestStatus, Quantity,
    };

    fn authored() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn soon_after() -> DateTime<Utc> {
        authored() + Duration::days(2)
    }

    fn quantity(value: f64) -> Quantity {
        Quantity {
            value: QuantityValue::new(value).expect("valid quantity value"),
            unit: Some("capsules".to_string()),
            code: None,
        }
    }

    fn dispense(status: MedicationDispenseStatus, offset_days: i64) -> MedicationDispense {
        MedicationDispense {
            id: Uuid::new_v4(),
            status,
            quantity: Some(quantity(21.0)),
            when_prepared: None,
            when_handed_over: None,
            recorded: Some(authored() + Duration::days(offset_days)),
        }
    }

    fn bundle(dispenses: Vec<MedicationDispense>) -> MedicationRequestBundle {
        let request = MedicationRequest {
            id: Uuid::new_v4(),
            status: MedicationRequestStatus::Active,
            subject: Uuid::new_v4(),
            medication_display: NonBlankText::new("Amoxicillin 500mg").expect("valid text"),
            authored_on: authored(),
            dosage_instruction: Some("One capsule three times daily".to_string()),
            substitution_allowed: false,
            dispense_request: DispenseRequest {
                quantity: Some(quantity(21.0)),
                number_of_repeats_allowed: 2,
                validity_period_start: None,
            },
        };
        MedicationRequestBundle::new(request, dispenses)
    }

    fn session() -> PharmacySession {
        PharmacySession {
            practitioner_id: Uuid::new_v4(),
            practitioner_display: NonBlankText::new("T. Nurse").expect("valid text"),
            location_id: Some(Uuid::new_v4()),
        }
    }

    fn component(dispenses: Vec<MedicationDispense>, config: PharmacyConfig) -> ActionButtons {
        ActionButtons::new(
            ActionButtonsInput {
                bundle: bundle(dispenses),
                patient_id: Uuid::new_v4(),
                encounter_id: Uuid::new_v4(),
            },
            config,
            session(),
        )
    }

    fn actions(buttons: &[ButtonViewModel]) -> Vec<PrescriptionAction> {
        buttons.iter().map(|button| button.action).collect()
    }

    #[test]
    fn untouched_active_request_renders_all_three_buttons() {
        let component = component(vec![], PharmacyConfig::default());
        let rendered = component.render_at(BillStatus::resolved(false), soon_after());

        assert_eq!(
            actions(&rendered),
            vec![
                PrescriptionAction::Dispense,
                PrescriptionAction::Pause,
                PrescriptionAction::Close
            ]
        );
        assert_eq!(rendered[0].kind, ButtonKind::Primary);
        assert_eq!(rendered[1].kind, ButtonKind::Secondary);
        assert_eq!(rendered[2].kind, ButtonKind::Danger);
        assert_eq!(rendered[0].label, ButtonLabel::Dispense);
        assert!(rendered.iter().all(|button| button.enabled));
        assert!(rendered.iter().all(|button| !button.loading));

        // Pure projection: rendering again changes nothing.
        let again = component.render_at(BillStatus::resolved(false), soon_after());
        assert_eq!(rendered, again);
    }

    #[test]
    fn loading_bill_disables_dispense_with_loading_caption() {
        let component = component(vec![], PharmacyConfig::default());
        let rendered = component.render_at(BillStatus::loading(), soon_after());

        let dispense = &rendered[0];
        assert_eq!(dispense.action, PrescriptionAction::Dispense);
        assert!(!dispense.enabled);
        assert!(dispense.loading);
        assert_eq!(dispense.label, ButtonLabel::LoadingData);

        // Only the dispense control is gated by billing.
        assert!(rendered[1].enabled);
        assert!(rendered[2].enabled);
    }

    #[test]
    fn pending_bill_disables_dispense_with_pending_caption() {
        let component = component(vec![], PharmacyConfig::default());
        let rendered = component.render_at(BillStatus::resolved(true), soon_after());

        let dispense = &rendered[0];
        assert!(!dispense.enabled);
        assert!(!dispense.loading);
        assert_eq!(dispense.label, ButtonLabel::PendingBill);
    }

    #[test]
    fn expired_request_renders_nothing() {
        let component = component(vec![], PharmacyConfig::default());
        let long_after = authored() + Duration::days(91);
        let rendered = component.render_at(BillStatus::resolved(false), long_after);
        assert!(rendered.is_empty());
    }

    #[test]
    fn paused_prescription_loses_the_pause_button() {
        let component = component(
            vec![dispense(MedicationDispenseStatus::OnHold, 1)],
            PharmacyConfig::default(),
        );
        let rendered = component.render_at(BillStatus::resolved(false), soon_after());
        assert_eq!(
            actions(&rendered),
            vec![PrescriptionAction::Dispense, PrescriptionAction::Close]
        );
    }

    #[test]
    fn declined_prescription_renders_nothing() {
        let component = component(
            vec![
                dispense(MedicationDispenseStatus::Completed, 0),
                dispense(MedicationDispenseStatus::Declined, 1),
            ],
            PharmacyConfig::default(),
        );
        let rendered = component.render_at(BillStatus::resolved(false), soon_after());
        assert!(rendered.is_empty());
    }

    #[test]
    fn config_toggles_remove_pause_and_close() {
        let config = PharmacyConfig::from_yaml_str(
            r#"action_buttons:
  pause_button:
    enabled: false
  close_button:
    enabled: false
"#,
        )
        .expect("parse config");
        let component = component(vec![], config);
        let rendered = component.render_at(BillStatus::resolved(false), soon_after());
        assert_eq!(actions(&rendered), vec![PrescriptionAction::Dispense]);
    }

    #[test]
    fn press_dispense_builds_the_dispense_intent() {
        let component = component(vec![], PharmacyConfig::default());
        let intent = component
            .press_at(
                PrescriptionAction::Dispense,
                BillStatus::resolved(false),
                soon_after(),
            )
            .expect("dispense is pressable");

        match intent {
            ActionIntent::OpenDispenseForm {
                title,
                patient_id,
                encounter_id,
                draft,
                bundle,
                quantity_remaining,
                mode,
            } => {
                assert_eq!(title, OverlayTitle::DispensePrescription);
                assert_eq!(patient_id, component.input.patient_id);
                assert_eq!(encounter_id, component.input.encounter_id);
                assert_eq!(bundle, component.input.bundle);
                assert_eq!(mode, FormMode::Enter);
                // Restriction off by default: no cap travels with the form.
                assert_eq!(quantity_remaining, None);
                // The dispense path pre-fills the ordered quantity.
                assert_eq!(draft.quantity, bundle.request.dispense_request.quantity);
                assert_eq!(draft.authorizing_prescription, bundle.request.id);
            }
            other => panic!("expected dispense intent, got {other:?}"),
        }
    }

    #[test]
    fn restriction_carries_quantity_remaining_into_the_intent() {
        let config = PharmacyConfig::from_yaml_str(
            r#"dispense_behavior:
  restrict_total_quantity_dispensed: true
"#,
        )
        .expect("parse config");
        let component = component(
            vec![dispense(MedicationDispenseStatus::Completed, 1)],
            config,
        );
        let intent = component
            .press_at(
                PrescriptionAction::Dispense,
                BillStatus::resolved(false),
                soon_after(),
            )
            .expect("dispense is pressable");

        match intent {
            ActionIntent::OpenDispenseForm {
                quantity_remaining, ..
            } => {
                // Ordered 21 x (1 + 2 repeats) = 63, one completed fill of 21.
                let remaining = quantity_remaining.expect("restriction surfaces a value");
                assert_eq!(remaining.get(), 42.0);
            }
            other => panic!("expected dispense intent, got {other:?}"),
        }
    }

    #[test]
    fn blocked_bill_makes_dispense_press_a_no_op() {
        let component = component(vec![], PharmacyConfig::default());
        assert!(component
            .press_at(
                PrescriptionAction::Dispense,
                BillStatus::loading(),
                soon_after()
            )
            .is_none());
        assert!(component
            .press_at(
                PrescriptionAction::Dispense,
                BillStatus::resolved(true),
                soon_after()
            )
            .is_none());

        // Pause and close ignore billing entirely.
        assert!(component
            .press_at(PrescriptionAction::Pause, BillStatus::loading(), soon_after())
            .is_some());
        assert!(component
            .press_at(PrescriptionAction::Close, BillStatus::loading(), soon_after())
            .is_some());
    }

    #[test]
    fn hidden_actions_press_to_none() {
        let paused = component(
            vec![dispense(MedicationDispenseStatus::OnHold, 1)],
            PharmacyConfig::default(),
        );
        assert!(paused
            .press_at(
                PrescriptionAction::Pause,
                BillStatus::resolved(false),
                soon_after()
            )
            .is_none());

        let expired_now = authored() + Duration::days(120);
        let fresh = component(vec![], PharmacyConfig::default());
        for action in [
            PrescriptionAction::Dispense,
            PrescriptionAction::Pause,
            PrescriptionAction::Close,
        ] {
            assert!(fresh
                .press_at(action, BillStatus::resolved(false), expired_now)
                .is_none());
        }
    }

    #[test]
    fn pause_and_close_drafts_carry_no_quantity() {
        let component = component(vec![], PharmacyConfig::default());

        let pause = component
            .press_at(
                PrescriptionAction::Pause,
                BillStatus::resolved(false),
                soon_after(),
            )
            .expect("pause is pressable");
        match pause {
            ActionIntent::OpenPauseForm { draft, mode, .. } => {
                assert!(draft.quantity.is_none());
                assert_eq!(mode, FormMode::Enter);
            }
            other => panic!("expected pause intent, got {other:?}"),
        }

        let close = component
            .press_at(
                PrescriptionAction::Close,
                BillStatus::resolved(false),
                soon_after(),
            )
            .expect("close is pressable");
        match close {
            ActionIntent::OpenCloseForm { title, draft, .. } => {
                assert_eq!(title, OverlayTitle::ClosePrescription);
                assert!(draft.quantity.is_none());
            }
            other => panic!("expected close intent, got {other:?}"),
        }
    }

    #[test]
    fn press_and_dispatch_forwards_visible_intents_only() {
        let mut component = component(vec![], PharmacyConfig::default());
        // This path goes through the wall clock; keep the request unexpired.
        component.input.bundle.request.authored_on = Utc::now();
        let (dispatcher, mut rx) = ChannelDispatcher::channel();

        let dispatched = component
            .press_and_dispatch(
                PrescriptionAction::Dispense,
                BillStatus::resolved(false),
                &dispatcher,
            )
            .expect("host alive");
        assert!(dispatched);
        assert!(rx.try_recv().is_ok());

        let blocked = component
            .press_and_dispatch(
                PrescriptionAction::Dispense,
                BillStatus::resolved(true),
                &dispatcher,
            )
            .expect("host alive");
        assert!(!blocked);
        assert!(rx.try_recv().is_err());
    }
}
