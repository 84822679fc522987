//! Remote medication service access.
//!
//! `MedicationService` is the single seam between the orchestrator and the
//! network. `HttpMedicationService` is the production implementation over
//! JSON-over-HTTP; `MockMedicationService` scripts responses for tests.
//!
//! Every call is one blocking round trip: no retry, no request timeout,
//! no cancellation.

pub mod http;
pub mod mock;
pub mod wire;

pub use http::*;
pub use mock::*;
pub use wire::*;

use thiserror::Error;

use crate::models::{AddOutcome, Medication, MedicationDraft, Profile, SafetyResult};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Medication service is not reachable at {0}")]
    Connection(String),

    #[error("Medication service returned error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),
}

impl ServiceError {
    /// Failure to reach the service at all, as opposed to a service answer.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::HttpClient(_))
    }

    /// Server-provided error text, when the service answered with a body.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { body, .. } => Some(body.trim()).filter(|b| !b.is_empty()),
            _ => None,
        }
    }
}

/// Operations offered by the remote medication service.
pub trait MedicationService {
    /// `GET /api/profile/get?id=<id>`. `None` when the body is empty or `null`.
    fn get_profile(&self, patient_id: &str) -> Result<Option<Profile>, ServiceError>;

    /// `POST /api/profile/update`. The response body is ignored.
    fn update_profile(&self, patient_id: &str, profile: &Profile) -> Result<(), ServiceError>;

    /// `GET /api/med/list?id=<id>`. A `null` body is the empty list.
    fn list_medications(&self, patient_id: &str) -> Result<Vec<Medication>, ServiceError>;

    /// `POST /api/med/check`. Side-effect free interaction check.
    fn check_safety(
        &self,
        patient_id: &str,
        draft: &MedicationDraft,
    ) -> Result<SafetyResult, ServiceError>;

    /// `POST /api/med/add`.
    fn add_medication(
        &self,
        patient_id: &str,
        draft: &MedicationDraft,
    ) -> Result<AddOutcome, ServiceError>;

    /// `POST /api/scanner/scan` (multipart, field `image`). Body returned verbatim.
    fn extract_from_image(&self, image: &ImageUpload) -> Result<serde_json::Value, ServiceError>;

    /// `POST /api/translator/translate`. `None` when the body has no translation.
    fn translate(&self, request: &TranslateRequest) -> Result<Option<String>, ServiceError>;
}
