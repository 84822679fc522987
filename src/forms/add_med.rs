use std::str::FromStr;

use chrono::NaiveDate;

use super::FormError;
use crate::models::{MedicationDraft, SafetyResult, SafetyStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddMedField {
    DrugName,
    Dosage,
    Frequency,
    StartDate,
    Instructions,
}

impl FromStr for AddMedField {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "drug_name" | "name" => Ok(Self::DrugName),
            "dosage" => Ok(Self::Dosage),
            "frequency" => Ok(Self::Frequency),
            "start_date" => Ok(Self::StartDate),
            "instructions" => Ok(Self::Instructions),
            other => Err(FormError::UnknownField(other.to_string())),
        }
    }
}

/// Where the two-step add protocol currently is.
#[derive(Debug, Clone, PartialEq)]
pub enum AddMedStep {
    /// Collecting fields.
    Form,
    /// Safety check dispatched, waiting for its result.
    Checking,
    /// Safety result on screen; the next submit adds.
    Safety(SafetyResult),
}

/// What the caller should do with the draft after a submit.
#[derive(Debug, Clone, PartialEq)]
pub enum AddMedAction {
    CheckSafety(MedicationDraft),
    Add(MedicationDraft),
}

/// Add-medication modal form with an inline safety step.
///
/// The first submit asks for a safety check; only a submit made while the
/// safety result is showing asks for the real add, with the same draft.
#[derive(Debug, Clone)]
pub struct AddMedForm {
    draft: MedicationDraft,
    step: AddMedStep,
}

impl AddMedForm {
    pub fn new(today: NaiveDate) -> Self {
        Self::from_draft(MedicationDraft::new(today))
    }

    pub fn from_draft(draft: MedicationDraft) -> Self {
        Self {
            draft,
            step: AddMedStep::Form,
        }
    }

    pub fn draft(&self) -> &MedicationDraft {
        &self.draft
    }

    pub fn step(&self) -> &AddMedStep {
        &self.step
    }

    pub fn safety_result(&self) -> Option<&SafetyResult> {
        match &self.step {
            AddMedStep::Safety(result) => Some(result),
            _ => None,
        }
    }

    /// Whether the safety check can be requested right now.
    pub fn can_check(&self) -> bool {
        self.step == AddMedStep::Form && self.draft.missing_required().is_none()
    }

    /// Edit a field. Only allowed while collecting fields, so the checked
    /// draft is the one that gets added.
    pub fn set_field(&mut self, field: AddMedField, value: &str) -> Result<(), FormError> {
        if self.step != AddMedStep::Form {
            return Err(FormError::NotEditable);
        }
        match field {
            AddMedField::DrugName => self.draft.drug_name = value.to_string(),
            AddMedField::Dosage => self.draft.dosage = value.to_string(),
            AddMedField::Frequency => self.draft.frequency = value.to_string(),
            AddMedField::Instructions => self.draft.instructions = value.to_string(),
            AddMedField::StartDate => {
                self.draft.start_date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
                    .map_err(|_| FormError::InvalidDate(value.to_string()))?;
            }
        }
        Ok(())
    }

    /// Submit the form.
    ///
    /// A danger/unknown result needs `confirmed`; an errored check refuses.
    pub fn submit(&mut self, confirmed: bool) -> Result<AddMedAction, FormError> {
        match self.step.clone() {
            AddMedStep::Form => {
                if let Some(field) = self.draft.missing_required() {
                    return Err(FormError::MissingField(field));
                }
                self.step = AddMedStep::Checking;
                Ok(AddMedAction::CheckSafety(self.draft.clone()))
            }
            AddMedStep::Checking => Err(FormError::Busy),
            AddMedStep::Safety(result) => match result.status {
                SafetyStatus::Error => Err(FormError::SafetyCheckFailed(result.message)),
                status if status.requires_confirmation() && !confirmed => {
                    Err(FormError::ConfirmationRequired(result.message))
                }
                _ => Ok(AddMedAction::Add(self.draft.clone())),
            },
        }
    }

    /// Show the result of the check dispatched by the last submit.
    pub fn record_safety(&mut self, result: SafetyResult) {
        if self.step != AddMedStep::Checking {
            tracing::debug!(step = ?self.step, "Safety result arrived outside the checking step");
        }
        self.step = AddMedStep::Safety(result);
    }

    /// Leave the safety step. The draft is untouched.
    pub fn back(&mut self) {
        self.step = AddMedStep::Form;
    }
}
