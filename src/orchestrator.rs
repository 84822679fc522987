//! View orchestration: the single owner of session state.
//!
//! `AppState` holds the current view, the medication list, the active
//! profile, the detail selection, modal visibility and notifications.
//! `Orchestrator` is the only thing that mutates it, through named
//! operations that call the remote service and fold the result back in.
//!
//! Every operation runs to completion before the next one starts. Remote
//! failures never escape: they become notifications and leave prior state
//! as it was.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::config;
use crate::forms::shape_profile;
use crate::models::{
    ActiveProfile, AddOutcome, ExtractedData, Medication, MedicationDraft, MedicationId,
    ProfileDraft, SafetyResult, View, DEFAULT_FREQUENCY,
};
use crate::notify::Notifications;
use crate::service::{ImageUpload, MedicationService, ServiceError, TranslateRequest};

pub const MSG_PROFILE_SAVED: &str = "Profile saved!";
pub const MSG_PROFILE_SAVE_FAILED: &str = "Failed to save profile";
pub const MSG_LOAD_FAILED: &str = "Failed to load medications";
pub const MSG_MED_ADDED: &str = "Medication added!";
pub const MSG_MED_BLOCKED: &str = "CRITICAL: Not added";
pub const MSG_MED_ADD_FAILED: &str = "Failed to add";
pub const MSG_NETWORK_ERROR: &str = "Network error";
pub const MSG_TRANSLATED: &str = "Translated!";
pub const MSG_TRANSLATION_FAILED: &str = "Translation failed";
pub const MSG_MARKED_TAKEN: &str = "Marked as taken";
pub const MSG_TRANSLATION_CACHED: &str = "Showing saved translation";

// ═══════════════════════════════════════════════════════════
// AppState
// ═══════════════════════════════════════════════════════════

/// Session state. Read freely; mutate only through `Orchestrator`.
#[derive(Debug)]
pub struct AppState {
    view: View,
    loading: bool,
    medications: Vec<Medication>,
    profile: Option<ActiveProfile>,
    selected_med_id: Option<MedicationId>,
    show_add_modal: bool,
    show_scan_modal: bool,
    notifications: Notifications,
}

impl AppState {
    fn new() -> Self {
        Self {
            view: View::Onboarding,
            loading: true,
            medications: Vec::new(),
            profile: None,
            selected_med_id: None,
            show_add_modal: false,
            show_scan_modal: false,
            notifications: Notifications::new(),
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    /// True until the startup profile check has finished.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn medications(&self) -> &[Medication] {
        &self.medications
    }

    pub fn profile(&self) -> Option<&ActiveProfile> {
        self.profile.as_ref()
    }

    pub fn selected_med_id(&self) -> Option<&MedicationId> {
        self.selected_med_id.as_ref()
    }

    /// The selected medication, if the selection still resolves in the list.
    pub fn selected_medication(&self) -> Option<&Medication> {
        let id = self.selected_med_id.as_ref()?;
        self.medications.iter().find(|m| &m.id == id)
    }

    pub fn is_add_modal_open(&self) -> bool {
        self.show_add_modal
    }

    pub fn is_scanner_open(&self) -> bool {
        self.show_scan_modal
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    fn medication_mut(&mut self, id: &MedicationId) -> Option<&mut Medication> {
        self.medications.iter_mut().find(|m| &m.id == id)
    }
}

// ═══════════════════════════════════════════════════════════
// Orchestrator
// ═══════════════════════════════════════════════════════════

pub struct Orchestrator<S: MedicationService> {
    service: S,
    patient_id: String,
    state: AppState,
}

impl<S: MedicationService> Orchestrator<S> {
    /// Orchestrator for the demo identity. Call [`Orchestrator::initialize`] next.
    pub fn new(service: S) -> Self {
        Self {
            service,
            patient_id: config::DEMO_PATIENT_ID.to_string(),
            state: AppState::new(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }

    /// Today's date for new drafts.
    pub fn today() -> NaiveDate {
        chrono::Local::now().date_naive()
    }

    // ── Startup & navigation ────────────────────────────────

    /// Preload the profile and pick the starting view.
    ///
    /// Fail-open: any failure counts as "no profile" and onboarding starts.
    pub fn initialize(&mut self) {
        self.state.loading = true;

        match self.service.get_profile(&self.patient_id) {
            Ok(Some(profile)) => {
                let populated = profile.is_populated();
                tracing::info!(populated, "Profile preloaded");
                self.state.profile = Some(ActiveProfile::Saved(profile));
                if populated {
                    self.show_dashboard();
                }
            }
            Ok(None) => tracing::info!("No profile on record, starting onboarding"),
            Err(e) => tracing::warn!(error = %e, "Profile check failed, starting onboarding"),
        }

        self.state.loading = false;
    }

    fn set_view(&mut self, view: View) {
        if self.state.view != view {
            tracing::info!(from = %self.state.view, to = %view, "View transition");
            self.state.view = view;
        }
    }

    /// Switch to the dashboard. Arriving there from another view reloads
    /// the medication list.
    pub fn show_dashboard(&mut self) {
        if self.state.view == View::Dashboard {
            return;
        }
        self.set_view(View::Dashboard);
        self.reload_medications();
    }

    /// Replace the in-memory list with the service's. On failure the
    /// previous list stays and the user is notified.
    pub fn reload_medications(&mut self) -> bool {
        match self.service.list_medications(&self.patient_id) {
            Ok(medications) => {
                tracing::info!(count = medications.len(), "Medication list loaded");
                self.state.medications = medications;
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Medication list load failed");
                self.state.notifications.error(MSG_LOAD_FAILED);
                false
            }
        }
    }

    /// Open the detail view for `id`.
    ///
    /// The selection is recorded even when `id` is not in the list; the view
    /// only changes when it resolves, and an unresolved selection renders
    /// nothing.
    pub fn select_medication(&mut self, id: MedicationId) -> bool {
        if self.state.view == View::Onboarding {
            tracing::debug!(%id, "Selection ignored during onboarding");
            return false;
        }

        self.state.selected_med_id = Some(id);
        if self.state.selected_medication().is_some() {
            self.set_view(View::Detail);
            true
        } else {
            tracing::warn!(id = ?self.state.selected_med_id, "Selected medication not in list");
            false
        }
    }

    /// Back from detail to the dashboard. The selection is kept.
    pub fn back_to_dashboard(&mut self) {
        if self.state.view == View::Detail {
            self.show_dashboard();
        }
    }

    // ── Onboarding ──────────────────────────────────────────

    /// Save the onboarding form and move to the dashboard.
    ///
    /// The service receives the shaped profile; the session keeps the raw
    /// form values. On failure the view does not change.
    pub fn complete_onboarding(&mut self, draft: ProfileDraft) -> bool {
        let profile = match shape_profile(&draft) {
            Ok(profile) => profile,
            Err(e) => {
                self.state.notifications.error(e.to_string());
                return false;
            }
        };

        match self.service.update_profile(&self.patient_id, &profile) {
            Ok(()) => {
                self.state.profile = Some(ActiveProfile::Submitted(draft));
                self.state.notifications.success(MSG_PROFILE_SAVED);
                self.show_dashboard();
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Profile save failed");
                let text = e
                    .server_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| MSG_PROFILE_SAVE_FAILED.to_string());
                self.state.notifications.error(text);
                false
            }
        }
    }

    // ── Add medication ──────────────────────────────────────

    pub fn open_add_modal(&mut self) {
        self.state.show_add_modal = true;
    }

    pub fn close_add_modal(&mut self) {
        self.state.show_add_modal = false;
    }

    /// Run the pre-add interaction check. A transport failure comes back as
    /// an error-tier result rather than an `Err`.
    pub fn check_safety(&self, draft: &MedicationDraft) -> SafetyResult {
        match self.service.check_safety(&self.patient_id, draft) {
            Ok(result) => {
                tracing::info!(status = %result.status, drug = %draft.drug_name, "Safety check done");
                result
            }
            Err(e) => {
                tracing::warn!(error = %e, "Safety check failed");
                SafetyResult::network_error()
            }
        }
    }

    /// Add a medication.
    ///
    /// Added: prepended to the list. Blocked or failed: list untouched. All
    /// three close the add modal. A transport failure returns `None` and
    /// leaves the modal as it was; any other service error counts as failed.
    pub fn add_medication(&mut self, draft: &MedicationDraft) -> Option<AddOutcome> {
        let outcome = match self.service.add_medication(&self.patient_id, draft) {
            Ok(outcome) => outcome,
            Err(e) if e.is_transport() => {
                tracing::error!(error = %e, "Add medication request failed");
                self.state.notifications.error(MSG_NETWORK_ERROR);
                return None;
            }
            Err(e) => AddOutcome::Failed(e.to_string()),
        };

        match &outcome {
            AddOutcome::Added(medication) => {
                tracing::info!(id = %medication.id, "Medication added");
                self.state.medications.insert(0, medication.clone());
                self.state.notifications.success(MSG_MED_ADDED);
            }
            AddOutcome::Blocked(reason) => {
                tracing::warn!(%reason, "Medication blocked by safety check");
                let text = if reason.is_empty() {
                    MSG_MED_BLOCKED.to_string()
                } else {
                    format!("{MSG_MED_BLOCKED} ({reason})")
                };
                self.state.notifications.error(text);
            }
            AddOutcome::Failed(reason) => {
                tracing::warn!(%reason, "Medication add failed");
                self.state.notifications.error(MSG_MED_ADD_FAILED);
            }
        }
        self.state.show_add_modal = false;
        Some(outcome)
    }

    // ── Scanner ─────────────────────────────────────────────

    pub fn open_scanner(&mut self) {
        self.state.show_scan_modal = true;
    }

    pub fn close_scanner(&mut self) {
        self.state.show_scan_modal = false;
    }

    /// Send an image for extraction; the body is returned uninterpreted.
    pub fn extract_from_image(&self, image: &ImageUpload) -> Result<serde_json::Value, ServiceError> {
        self.service.extract_from_image(image)
    }

    /// Route accepted scanner fields into the add flow and close the scanner.
    pub fn use_extracted_data(&mut self, data: ExtractedData) -> Option<AddOutcome> {
        self.state.show_scan_modal = false;
        let draft = draft_from_extracted(data, Self::today());
        self.add_medication(&draft)
    }

    // ── Detail view ─────────────────────────────────────────

    /// Translate a medication's instructions. Failure is notified and
    /// yields `None`.
    pub fn translate(&mut self, medication: &Medication) -> Option<String> {
        let request = TranslateRequest {
            drug_name: medication.drug_name.clone(),
            dosage: medication.dosage.clone(),
            instructions: medication.instructions.clone(),
        };

        match self.service.translate(&request) {
            Ok(Some(translation)) => {
                self.state.notifications.success(MSG_TRANSLATED);
                Some(translation)
            }
            Ok(None) => {
                tracing::warn!(id = %medication.id, "Translation response had no text");
                self.state.notifications.error(MSG_TRANSLATION_FAILED);
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Translation failed");
                self.state.notifications.error(MSG_TRANSLATION_FAILED);
                None
            }
        }
    }

    /// Translate the selected medication, caching the text on it.
    /// A medication that already carries a translation is not re-fetched.
    pub fn translate_selected(&mut self) -> Option<String> {
        let medication = self.state.selected_medication()?.clone();
        if let Some(cached) = medication.translated_instructions.clone() {
            self.state.notifications.info(MSG_TRANSLATION_CACHED);
            return Some(cached);
        }

        let translation = self.translate(&medication)?;
        if let Some(m) = self.state.medication_mut(&medication.id) {
            m.translated_instructions = Some(translation.clone());
        }
        Some(translation)
    }

    /// Mark a medication as taken in the session list.
    pub fn mark_taken(&mut self, id: &MedicationId) -> bool {
        let Some(medication) = self.state.medication_mut(id) else {
            tracing::debug!(%id, "Mark taken for unknown medication");
            return false;
        };
        if medication.taken {
            return false;
        }
        medication.taken = true;
        self.state.notifications.success(MSG_MARKED_TAKEN);
        true
    }

    // ── Notifications ───────────────────────────────────────

    pub fn dismiss_notice(&mut self, id: Uuid) -> bool {
        self.state.notifications.dismiss(id)
    }
}

/// Build an add request from scanner output. A blank frequency falls back
/// to the form default.
pub fn draft_from_extracted(data: ExtractedData, today: NaiveDate) -> MedicationDraft {
    let frequency = if data.frequency.trim().is_empty() {
        DEFAULT_FREQUENCY.to_string()
    } else {
        data.frequency
    };
    MedicationDraft {
        drug_name: data.name,
        dosage: data.dosage,
        frequency,
        start_date: today,
        instructions: data.instructions,
    }
}
