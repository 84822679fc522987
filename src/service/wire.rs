use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::models::{MedicationDraft, Profile};

/// Body of `POST /api/profile/update`.
#[derive(Debug, Serialize)]
pub struct UpdateProfileRequest<'a> {
    pub id: &'a str,
    pub profile: &'a Profile,
}

/// Body of `POST /api/med/add` and `POST /api/med/check`.
#[derive(Debug, Serialize)]
pub struct MedicationRequest<'a> {
    pub id: &'a str,
    pub medication: &'a MedicationDraft,
}

/// Body of `POST /api/translator/translate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslateRequest {
    pub drug_name: String,
    pub dosage: String,
    pub instructions: String,
}

/// Response of `POST /api/translator/translate`.
#[derive(Debug, Default, Deserialize)]
pub struct TranslateResponse {
    #[serde(default)]
    pub translation: Option<String>,
}

/// An image file picked or captured for label scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime_type = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            file_name,
            mime_type,
            bytes,
        }
    }

    /// Read an image from disk; the MIME type is guessed from the extension.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        Ok(Self::new(file_name, bytes))
    }
}
