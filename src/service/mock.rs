use std::sync::{Mutex, MutexGuard};

use super::wire::{ImageUpload, TranslateRequest};
use super::{MedicationService, ServiceError};
use crate::models::{
    AddOutcome, Medication, MedicationDraft, Profile, SafetyResult, SafetyStatus,
};

/// Scripted failure for a mock operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockFailure {
    /// Service down: surfaces as `ServiceError::Connection`.
    Unreachable,
    /// Non-2xx answer with the given body.
    Status(u16, String),
}

impl MockFailure {
    fn to_error(&self) -> ServiceError {
        match self {
            Self::Unreachable => ServiceError::Connection("mock://medication-service".into()),
            Self::Status(status, body) => ServiceError::Status {
                status: *status,
                body: body.clone(),
            },
        }
    }
}

type Scripted<T> = Mutex<Result<T, MockFailure>>;

/// A call received by the mock, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    GetProfile(String),
    UpdateProfile { patient_id: String, profile: Profile },
    ListMedications(String),
    CheckSafety { patient_id: String, draft: MedicationDraft },
    AddMedication { patient_id: String, draft: MedicationDraft },
    ExtractFromImage { file_name: String, size: usize },
    Translate(TranslateRequest),
}

/// Mock medication service for testing. Returns configurable responses
/// and records every call.
pub struct MockMedicationService {
    profile: Scripted<Option<Profile>>,
    update: Scripted<()>,
    medications: Scripted<Vec<Medication>>,
    safety: Scripted<SafetyResult>,
    add: Scripted<AddOutcome>,
    extraction: Scripted<serde_json::Value>,
    translation: Scripted<Option<String>>,
    calls: Mutex<Vec<MockCall>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn reply<T: Clone>(scripted: &Scripted<T>) -> Result<T, ServiceError> {
    lock(scripted).clone().map_err(|f| f.to_error())
}

impl MockMedicationService {
    pub fn new() -> Self {
        Self {
            profile: Mutex::new(Ok(None)),
            update: Mutex::new(Ok(())),
            medications: Mutex::new(Ok(Vec::new())),
            safety: Mutex::new(Ok(SafetyResult {
                status: SafetyStatus::Safe,
                message: "No interactions found".into(),
                interactions: Vec::new(),
            })),
            add: Mutex::new(Ok(AddOutcome::Failed("not scripted".into()))),
            extraction: Mutex::new(Ok(serde_json::json!({}))),
            translation: Mutex::new(Ok(None)),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_profile(self, profile: Option<Profile>) -> Self {
        *lock(&self.profile) = Ok(profile);
        self
    }

    pub fn with_medications(self, medications: Vec<Medication>) -> Self {
        *lock(&self.medications) = Ok(medications);
        self
    }

    pub fn with_add_outcome(self, outcome: AddOutcome) -> Self {
        *lock(&self.add) = Ok(outcome);
        self
    }

    pub fn with_safety(self, result: SafetyResult) -> Self {
        *lock(&self.safety) = Ok(result);
        self
    }

    pub fn with_extraction(self, body: serde_json::Value) -> Self {
        *lock(&self.extraction) = Ok(body);
        self
    }

    pub fn with_translation(self, translation: Option<String>) -> Self {
        *lock(&self.translation) = Ok(translation);
        self
    }

    pub fn fail_profile(&self, failure: MockFailure) {
        *lock(&self.profile) = Err(failure);
    }

    pub fn fail_update(&self, failure: MockFailure) {
        *lock(&self.update) = Err(failure);
    }

    pub fn fail_medications(&self, failure: MockFailure) {
        *lock(&self.medications) = Err(failure);
    }

    pub fn fail_safety(&self, failure: MockFailure) {
        *lock(&self.safety) = Err(failure);
    }

    pub fn fail_add(&self, failure: MockFailure) {
        *lock(&self.add) = Err(failure);
    }

    pub fn fail_extraction(&self, failure: MockFailure) {
        *lock(&self.extraction) = Err(failure);
    }

    pub fn fail_translation(&self, failure: MockFailure) {
        *lock(&self.translation) = Err(failure);
    }

    pub fn set_medications(&self, medications: Vec<Medication>) {
        *lock(&self.medications) = Ok(medications);
    }

    pub fn set_add_outcome(&self, outcome: AddOutcome) {
        *lock(&self.add) = Ok(outcome);
    }

    /// Every call received so far.
    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.calls).clone()
    }

    pub fn count_calls(&self, matches: impl Fn(&MockCall) -> bool) -> usize {
        lock(&self.calls).iter().filter(|c| matches(c)).count()
    }

    fn record(&self, call: MockCall) {
        lock(&self.calls).push(call);
    }
}

impl Default for MockMedicationService {
    fn default() -> Self {
        Self::new()
    }
}

impl MedicationService for MockMedicationService {
    fn get_profile(&self, patient_id: &str) -> Result<Option<Profile>, ServiceError> {
        self.record(MockCall::GetProfile(patient_id.to_string()));
        reply(&self.profile)
    }

    fn update_profile(&self, patient_id: &str, profile: &Profile) -> Result<(), ServiceError> {
        self.record(MockCall::UpdateProfile {
            patient_id: patient_id.to_string(),
            profile: profile.clone(),
        });
        reply(&self.update)
    }

    fn list_medications(&self, patient_id: &str) -> Result<Vec<Medication>, ServiceError> {
        self.record(MockCall::ListMedications(patient_id.to_string()));
        reply(&self.medications)
    }

    fn check_safety(
        &self,
        patient_id: &str,
        draft: &MedicationDraft,
    ) -> Result<SafetyResult, ServiceError> {
        self.record(MockCall::CheckSafety {
            patient_id: patient_id.to_string(),
            draft: draft.clone(),
        });
        reply(&self.safety)
    }

    fn add_medication(
        &self,
        patient_id: &str,
        draft: &MedicationDraft,
    ) -> Result<AddOutcome, ServiceError> {
        self.record(MockCall::AddMedication {
            patient_id: patient_id.to_string(),
            draft: draft.clone(),
        });
        reply(&self.add)
    }

    fn extract_from_image(&self, image: &ImageUpload) -> Result<serde_json::Value, ServiceError> {
        self.record(MockCall::ExtractFromImage {
            file_name: image.file_name.clone(),
            size: image.bytes.len(),
        });
        reply(&self.extraction)
    }

    fn translate(&self, request: &TranslateRequest) -> Result<Option<String>, ServiceError> {
        self.record(MockCall::Translate(request.clone()));
        reply(&self.translation)
    }
}
