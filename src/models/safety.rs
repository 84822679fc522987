use serde::{Deserialize, Serialize};

use super::enums::SafetyStatus;
use super::lenient;
use super::medication::Medication;

/// Status marker the service uses when it refuses an add outright.
pub const CRITICAL_MARKER: &str = "CRITICAL";

/// Result of a pre-add interaction check. Lives only for one modal session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SafetyResult {
    #[serde(default)]
    pub status: SafetyStatus,
    #[serde(default, deserialize_with = "lenient::string")]
    pub message: String,
    #[serde(default, deserialize_with = "lenient::strings")]
    pub interactions: Vec<String>,
}

impl SafetyResult {
    /// Result recorded when the check could not reach the service.
    pub fn network_error() -> Self {
        Self {
            status: SafetyStatus::Error,
            message: "Network error".to_string(),
            interactions: Vec::new(),
        }
    }
}

/// Raw body of `POST /api/med/add`.
///
/// The service tags the outcome by shape: a `medication` object, or a
/// `status` string with an optional `message`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddMedicationResponse {
    #[serde(default)]
    pub medication: Option<Medication>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Decoded outcome of an add-medication call.
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    /// The service stored the medication and returned it with its new id.
    Added(Medication),
    /// The interaction checker refused the medication.
    Blocked(String),
    /// Anything else: unexpected shape, service-side failure.
    Failed(String),
}

impl From<AddMedicationResponse> for AddOutcome {
    fn from(response: AddMedicationResponse) -> Self {
        if let Some(medication) = response.medication {
            return Self::Added(medication);
        }

        let message = response.message.unwrap_or_default();
        match response.status.as_deref() {
            Some(status) if status.eq_ignore_ascii_case(CRITICAL_MARKER) => Self::Blocked(message),
            Some(status) if message.is_empty() => Self::Failed(status.to_string()),
            _ => Self::Failed(message),
        }
    }
}

impl AddOutcome {
    /// Decode a raw response body. Bodies that are not the expected JSON
    /// shape are a failed outcome carrying the body text.
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<AddMedicationResponse>(body) {
            Ok(response) => response.into(),
            Err(e) => {
                tracing::debug!(error = %e, "Add-medication body is not the expected shape");
                Self::Failed(body.trim().to_string())
            }
        }
    }
}
