use std::fmt;

use serde::Serialize;

use crate::models::{Medication, MedicationId, SafetyStatus};

/// Local state of the detail card: whether the translation is showing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MedCardState {
    pub show_translation: bool,
}

impl MedCardState {
    /// Flip the translate toggle. Returns true when a translation should be
    /// requested, i.e. when switching from original to translated.
    pub fn toggle_translation(&mut self) -> bool {
        let fetch = !self.show_translation;
        self.show_translation = !self.show_translation;
        fetch
    }
}

/// Header label for a medication's safety tier.
pub fn card_safety_label(status: SafetyStatus) -> &'static str {
    match status {
        SafetyStatus::Safe => "Safe",
        SafetyStatus::Warning => "Check Interactions",
        _ => "Contraindication",
    }
}

/// Detail card for one medication.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MedCardView {
    pub id: MedicationId,
    pub drug_name: String,
    pub dosage: String,
    pub safety_label: &'static str,
    pub frequency: String,
    pub next_dose: String,
    /// Instructions as shown: translated when toggled on and available.
    pub instructions: String,
    pub showing_translation: bool,
    pub translate_button: &'static str,
    pub taken: bool,
    pub taken_button: &'static str,
}

impl MedCardView {
    pub fn build(medication: &Medication, state: MedCardState) -> Self {
        let translated = medication
            .translated_instructions
            .as_deref()
            .filter(|_| state.show_translation);

        Self {
            id: medication.id.clone(),
            drug_name: medication.drug_name.clone(),
            dosage: medication.dosage.clone(),
            safety_label: card_safety_label(medication.safety_status),
            frequency: medication.frequency.clone(),
            next_dose: medication.next_dose_display().to_string(),
            instructions: translated.unwrap_or(&medication.instructions).to_string(),
            showing_translation: translated.is_some(),
            translate_button: if state.show_translation { "Original" } else { "Translate" },
            taken: medication.taken,
            taken_button: if medication.taken { "Marked as Taken" } else { "Mark as Taken" },
        }
    }
}

impl fmt::Display for MedCardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}  {}", self.drug_name, self.dosage)?;
        writeln!(f, "[{}]", self.safety_label)?;
        writeln!(f, "Frequency: {}", self.frequency)?;
        writeln!(f, "Next Dose: {}", self.next_dose)?;
        writeln!(f, "Instructions ({}):", self.translate_button)?;
        writeln!(f, "  {}", self.instructions)?;
        writeln!(f, "({})", self.taken_button)
    }
}
