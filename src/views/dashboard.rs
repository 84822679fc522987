use std::fmt;

use serde::Serialize;

use crate::models::{ActiveProfile, Medication, MedicationId};

pub const EMPTY_LIST_TEXT: &str = "No medications yet. Tap the + button to add one!";

/// Fallback greeting name when no profile name is known.
const DEFAULT_GREETING_NAME: &str = "User";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardRow {
    pub id: MedicationId,
    pub drug_name: String,
    pub dosage: String,
    pub instructions: String,
    pub next_dose: String,
    pub taken: bool,
}

/// Medication dashboard: greeting, counters and the list rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub greeting_name: String,
    pub taken_today: usize,
    pub upcoming: usize,
    pub rows: Vec<DashboardRow>,
}

impl DashboardView {
    pub fn build(medications: &[Medication], profile: Option<&ActiveProfile>) -> Self {
        let taken_today = medications.iter().filter(|m| m.taken).count();
        let greeting_name = profile
            .and_then(ActiveProfile::first_name)
            .unwrap_or(DEFAULT_GREETING_NAME)
            .to_string();

        let rows = medications
            .iter()
            .map(|m| DashboardRow {
                id: m.id.clone(),
                drug_name: m.drug_name.clone(),
                dosage: m.dosage.clone(),
                instructions: m.instructions.clone(),
                next_dose: m.next_dose_display().to_string(),
                taken: m.taken,
            })
            .collect();

        Self {
            greeting_name,
            taken_today,
            upcoming: medications.len() - taken_today,
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl fmt::Display for DashboardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Hello, {}", self.greeting_name)?;
        writeln!(f, "Track your medications with ease")?;
        writeln!(f)?;
        writeln!(f, "Taken Today: {}   Upcoming: {}", self.taken_today, self.upcoming)?;
        writeln!(f)?;
        writeln!(f, "Your Medications")?;
        if self.is_empty() {
            return writeln!(f, "  {EMPTY_LIST_TEXT}");
        }
        for row in &self.rows {
            let mark = if row.taken { "x" } else { " " };
            writeln!(
                f,
                "  [{mark}] {} ({})  {} • {}  | Next dose: {}",
                row.drug_name, row.id, row.dosage, row.instructions, row.next_dose
            )?;
        }
        Ok(())
    }
}
