use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use super::enums::{SafetyStatus, DEFAULT_FREQUENCY};
use super::lenient;

/// Placeholder shown when no next dose is known.
pub const NO_NEXT_DOSE: &str = "—";

/// Service-assigned medication identifier.
///
/// Opaque to the client. The service may send a string or a number; both are
/// kept in their textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MedicationId(String);

impl MedicationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MedicationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for MedicationId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => Self(s),
            RawId::Number(n) => Self(n.to_string()),
        })
    }
}

/// A medication as returned by the list and add endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub id: MedicationId,
    #[serde(alias = "name", default, deserialize_with = "lenient::string")]
    pub drug_name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub dosage: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub frequency: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub instructions: String,
    #[serde(default, deserialize_with = "lenient::date", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub taken: bool,
    #[serde(default)]
    pub safety_status: SafetyStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_dose: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_schedule: Option<AiSchedule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_instructions: Option<String>,
}

impl Medication {
    /// Display string for the next dose.
    ///
    /// The service's `next_dose` wins; otherwise the first slot of the
    /// generated schedule; otherwise a dash.
    pub fn next_dose_display(&self) -> &str {
        self.next_dose
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| {
                self.ai_schedule
                    .as_ref()
                    .and_then(|schedule| schedule.schedule.first())
                    .map(|slot| slot.time.as_str())
                    .filter(|s| !s.trim().is_empty())
            })
            .unwrap_or(NO_NEXT_DOSE)
    }
}

/// Decode a list body record by record. Records that do not decode as a
/// medication are logged and skipped; a `null` body is the empty list.
pub fn decode_medication_list(body: serde_json::Value) -> Vec<Medication> {
    let records = match body {
        serde_json::Value::Array(records) => records,
        serde_json::Value::Null => return Vec::new(),
        other => {
            tracing::warn!(kind = json_kind(&other), "Medication list body is not an array");
            return Vec::new();
        }
    };

    records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| {
            if !record.is_object() {
                tracing::warn!(index, kind = json_kind(&record), "Dropped medication record");
                return None;
            }
            serde_json::from_value::<Medication>(record)
                .map_err(|e| tracing::warn!(index, error = %e, "Dropped medication record"))
                .ok()
        })
        .collect()
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Dose schedule generated by the service for a medication.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AiSchedule {
    #[serde(default)]
    pub schedule: Vec<ScheduleSlot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScheduleSlot {
    #[serde(default, deserialize_with = "lenient::string")]
    pub time: String,
}

/// Fields collected by the add-medication form and sent as `medication`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationDraft {
    pub drug_name: String,
    pub dosage: String,
    pub frequency: String,
    pub start_date: NaiveDate,
    pub instructions: String,
}

impl MedicationDraft {
    /// Empty draft with the form defaults: once daily, starting `today`.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            drug_name: String::new(),
            dosage: String::new(),
            frequency: DEFAULT_FREQUENCY.to_string(),
            start_date: today,
            instructions: String::new(),
        }
    }

    /// Drug name and dosage are the only required fields.
    pub fn missing_required(&self) -> Option<&'static str> {
        if self.drug_name.trim().is_empty() {
            Some("drug_name")
        } else if self.dosage.trim().is_empty() {
            Some("dosage")
        } else {
            None
        }
    }
}
