//! Line-oriented console front-end.
//!
//! Reads one command per line, runs it against the orchestrator and renders
//! the current screen as plain text. Form drafts, the scanner state machine
//! and popover toggles live here; everything shared lives in the
//! orchestrator.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use crate::forms::{
    AddMedAction, AddMedField, AddMedForm, AddMedStep, FormError, ProfileField, ProfileForm,
    ScanField, ScannerForm, ScannerState,
};
use crate::models::{MedicationId, ProfileDraft, View, FREQUENCY_CHOICES};
use crate::orchestrator::Orchestrator;
use crate::service::{ImageUpload, MedicationService};
use crate::views::{DashboardView, MedCardState, MedCardView, SafetyBadge};

pub const HELP_TEXT: &str = "\
Commands:
  profile <name>|<age>|<allergies>|<conditions>   save your profile
  list                                            show the dashboard
  open <id>                                       open a medication
  back                                            go back
  add <name>|<dosage>|<frequency>|<instructions>  start adding a medication
  check                                           run the safety check
  confirm [force]                                 add after the safety check
  cancel                                          close the open modal
  scan <path>                                     scan a prescription label
  edit <field> <value>                            change a form field
  use                                             add the scanned medication
  rescan                                          scan again
  taken [id]                                      mark a medication as taken
  translate                                       show translated instructions
  toggle                                          switch original/translated
  badge                                           show or hide safety details
  dismiss <n>                                     dismiss notice n
  help                                            this text
  quit                                            exit";

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("Unknown command: {0} (type 'help')")]
    UnknownCommand(String),

    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("Invalid {field}: {value}")]
    InvalidArgument { field: &'static str, value: String },

    #[error("{0}")]
    Unavailable(&'static str),

    #[error(transparent)]
    Form(#[from] FormError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ═══════════════════════════════════════════════════════════
// Commands
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Profile(ProfileDraft),
    List,
    Open(MedicationId),
    Back,
    Add {
        drug_name: String,
        dosage: String,
        frequency: String,
        instructions: String,
    },
    Check,
    Confirm { force: bool },
    Cancel,
    Scan(PathBuf),
    Edit { field: String, value: String },
    Use,
    Rescan,
    Taken(Option<MedicationId>),
    Translate,
    Toggle,
    Badge,
    Dismiss(usize),
    Help,
    Quit,
}

/// Split `a|b|c` into exactly `n` trimmed parts, padding with empty strings.
fn pipe_fields(raw: &str, n: usize) -> Vec<String> {
    let mut parts: Vec<String> = raw.splitn(n, '|').map(|p| p.trim().to_string()).collect();
    parts.resize(n, String::new());
    parts
}

fn required<'a>(rest: &'a str, name: &'static str) -> Result<&'a str, ConsoleError> {
    if rest.is_empty() {
        Err(ConsoleError::MissingArgument(name))
    } else {
        Ok(rest)
    }
}

impl FromStr for Command {
    type Err = ConsoleError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "profile" => {
                let f = pipe_fields(required(rest, "profile fields")?, 4);
                Self::Profile(ProfileDraft {
                    name: f[0].clone(),
                    age: f[1].clone(),
                    allergies: f[2].clone(),
                    conditions: f[3].clone(),
                })
            }
            "list" | "dashboard" => Self::List,
            "open" => Self::Open(MedicationId::new(required(rest, "id")?)),
            "back" => Self::Back,
            "add" => {
                let f = pipe_fields(rest, 4);
                Self::Add {
                    drug_name: f[0].clone(),
                    dosage: f[1].clone(),
                    frequency: f[2].clone(),
                    instructions: f[3].clone(),
                }
            }
            "check" => Self::Check,
            "confirm" => match rest {
                "" => Self::Confirm { force: false },
                "force" => Self::Confirm { force: true },
                other => {
                    return Err(ConsoleError::InvalidArgument {
                        field: "confirm option",
                        value: other.to_string(),
                    })
                }
            },
            "cancel" | "close" => Self::Cancel,
            "scan" => Self::Scan(PathBuf::from(required(rest, "path")?)),
            "edit" => {
                let (field, value) = required(rest, "field")?
                    .split_once(char::is_whitespace)
                    .map(|(f, v)| (f, v.trim()))
                    .unwrap_or((rest, ""));
                Self::Edit {
                    field: field.to_string(),
                    value: value.to_string(),
                }
            }
            "use" => Self::Use,
            "rescan" => Self::Rescan,
            "taken" => Self::Taken((!rest.is_empty()).then(|| MedicationId::new(rest))),
            "translate" => Self::Translate,
            "toggle" => Self::Toggle,
            "badge" => Self::Badge,
            "dismiss" => {
                let raw = required(rest, "notice number")?;
                let n = raw
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| ConsoleError::InvalidArgument {
                        field: "notice number",
                        value: raw.to_string(),
                    })?;
                Self::Dismiss(n)
            }
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(ConsoleError::UnknownCommand(other.to_string())),
        };
        Ok(command)
    }
}

// ═══════════════════════════════════════════════════════════
// Console
// ═══════════════════════════════════════════════════════════

pub struct Console<S: MedicationService> {
    orchestrator: Orchestrator<S>,
    profile_form: ProfileForm,
    add_form: Option<AddMedForm>,
    scanner: Option<ScannerForm>,
    card: MedCardState,
    badge: Option<SafetyBadge>,
}

impl<S: MedicationService> Console<S> {
    /// Wrap an orchestrator that has already been initialized.
    pub fn new(orchestrator: Orchestrator<S>) -> Self {
        Self {
            orchestrator,
            profile_form: ProfileForm::new(),
            add_form: None,
            scanner: None,
            card: MedCardState::default(),
            badge: None,
        }
    }

    pub fn orchestrator(&self) -> &Orchestrator<S> {
        &self.orchestrator
    }

    pub fn add_form(&self) -> Option<&AddMedForm> {
        self.add_form.as_ref()
    }

    pub fn scanner(&self) -> Option<&ScannerForm> {
        self.scanner.as_ref()
    }

    /// Read commands until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> Result<(), ConsoleError> {
        self.render(out)?;
        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            match line.parse::<Command>() {
                Ok(Command::Quit) => break,
                Ok(Command::Help) => writeln!(out, "{HELP_TEXT}")?,
                Ok(command) => {
                    if let Err(e) = self.execute(command) {
                        writeln!(out, "! {e}")?;
                    }
                    self.render(out)?;
                }
                Err(e) => writeln!(out, "! {e}")?,
            }
        }
        out.flush()?;
        Ok(())
    }

    /// Apply one command. User-facing failures come back as `Err`; service
    /// failures end up as notifications instead.
    pub fn execute(&mut self, command: Command) -> Result<(), ConsoleError> {
        tracing::debug!(?command, "Console command");
        match command {
            Command::Profile(draft) => self.submit_profile(draft)?,
            Command::List => {
                if self.orchestrator.state().view() == View::Detail {
                    self.leave_detail();
                } else if self.orchestrator.state().view() == View::Dashboard {
                    self.orchestrator.reload_medications();
                } else {
                    return Err(ConsoleError::Unavailable("Complete your profile first"));
                }
            }
            Command::Open(id) => {
                if self.orchestrator.select_medication(id) {
                    self.card = MedCardState::default();
                    self.badge = self
                        .orchestrator
                        .state()
                        .selected_medication()
                        .map(|m| {
                            SafetyBadge::new(m.safety_status, String::new(), Vec::new())
                                .without_details()
                        });
                }
            }
            Command::Back => {
                let reviewing = self
                    .add_form
                    .as_ref()
                    .is_some_and(|form| matches!(form.step(), AddMedStep::Safety(_)));
                if reviewing {
                    if let Some(form) = self.add_form.as_mut() {
                        form.back();
                    }
                    self.badge = None;
                } else {
                    self.leave_detail();
                }
            }
            Command::Add {
                drug_name,
                dosage,
                frequency,
                instructions,
            } => self.start_add(&drug_name, &dosage, &frequency, &instructions)?,
            Command::Check => self.run_safety_check()?,
            Command::Confirm { force } => self.confirm_add(force)?,
            Command::Cancel => self.cancel(),
            Command::Scan(path) => self.scan(&path)?,
            Command::Edit { field, value } => self.edit(&field, &value)?,
            Command::Use => self.use_scanned()?,
            Command::Rescan => self.scanner_mut()?.reset(),
            Command::Taken(id) => {
                let id = match id {
                    Some(id) => id,
                    None => self
                        .orchestrator
                        .state()
                        .selected_med_id()
                        .cloned()
                        .ok_or(ConsoleError::MissingArgument("id"))?,
                };
                self.orchestrator.mark_taken(&id);
            }
            Command::Translate => {
                self.require_detail()?;
                if !self.card.show_translation {
                    self.card.toggle_translation();
                }
                self.orchestrator.translate_selected();
            }
            Command::Toggle => {
                self.require_detail()?;
                if self.card.toggle_translation() {
                    self.orchestrator.translate_selected();
                }
            }
            Command::Badge => match self.badge.as_mut() {
                Some(badge) => badge.toggle(),
                None => return Err(ConsoleError::Unavailable("No safety badge on screen")),
            },
            Command::Dismiss(n) => {
                let id = self
                    .orchestrator
                    .state()
                    .notifications()
                    .active()
                    .get(n.saturating_sub(1))
                    .filter(|_| n > 0)
                    .map(|notice| notice.id)
                    .ok_or(ConsoleError::InvalidArgument {
                        field: "notice number",
                        value: n.to_string(),
                    })?;
                self.orchestrator.dismiss_notice(id);
            }
            Command::Help | Command::Quit => {}
        }
        self.sync_modals();
        Ok(())
    }

    // ── Command handlers ────────────────────────────────────

    fn submit_profile(&mut self, draft: ProfileDraft) -> Result<(), ConsoleError> {
        self.profile_form.set_field(ProfileField::Name, draft.name);
        self.profile_form.set_field(ProfileField::Age, draft.age);
        self.profile_form.set_field(ProfileField::Allergies, draft.allergies);
        self.profile_form.set_field(ProfileField::Conditions, draft.conditions);
        let draft = self.profile_form.submit()?;
        self.orchestrator.complete_onboarding(draft);
        Ok(())
    }

    fn leave_detail(&mut self) {
        if self.orchestrator.state().view() == View::Detail {
            self.orchestrator.back_to_dashboard();
            self.card = MedCardState::default();
            self.badge = None;
        }
    }

    fn start_add(
        &mut self,
        drug_name: &str,
        dosage: &str,
        frequency: &str,
        instructions: &str,
    ) -> Result<(), ConsoleError> {
        if self.orchestrator.state().view() == View::Onboarding {
            return Err(ConsoleError::Unavailable("Complete your profile first"));
        }

        let mut form = AddMedForm::new(Orchestrator::<S>::today());
        form.set_field(AddMedField::DrugName, drug_name)?;
        form.set_field(AddMedField::Dosage, dosage)?;
        if !frequency.is_empty() {
            form.set_field(AddMedField::Frequency, frequency)?;
        }
        form.set_field(AddMedField::Instructions, instructions)?;

        self.orchestrator.open_add_modal();
        self.add_form = Some(form);
        self.badge = None;
        Ok(())
    }

    fn add_form_mut(&mut self) -> Result<&mut AddMedForm, ConsoleError> {
        self.add_form
            .as_mut()
            .ok_or(ConsoleError::Unavailable("No medication is being added"))
    }

    fn run_safety_check(&mut self) -> Result<(), ConsoleError> {
        let action = self.add_form_mut()?.submit(false)?;
        let AddMedAction::CheckSafety(draft) = action else {
            return Err(ConsoleError::Unavailable("Safety check already done, use 'confirm'"));
        };

        let result = self.orchestrator.check_safety(&draft);
        self.badge = Some(SafetyBadge::from_result(&result));
        self.add_form_mut()?.record_safety(result);
        Ok(())
    }

    fn confirm_add(&mut self, force: bool) -> Result<(), ConsoleError> {
        let form = self.add_form_mut()?;
        if *form.step() == AddMedStep::Form {
            return Err(ConsoleError::Unavailable("Run 'check' first"));
        }
        let AddMedAction::Add(draft) = form.submit(force)? else {
            return Err(ConsoleError::Unavailable("Run 'check' first"));
        };

        if self.orchestrator.add_medication(&draft).is_some() {
            self.add_form = None;
            self.badge = None;
        }
        Ok(())
    }

    fn cancel(&mut self) {
        if self.orchestrator.state().is_scanner_open() {
            if self.scanner.as_ref().is_some_and(ScannerForm::is_processing) {
                return;
            }
            self.orchestrator.close_scanner();
        } else if self.orchestrator.state().is_add_modal_open() {
            self.orchestrator.close_add_modal();
        }
    }

    fn scan(&mut self, path: &Path) -> Result<(), ConsoleError> {
        if self.orchestrator.state().view() == View::Onboarding {
            return Err(ConsoleError::Unavailable("Complete your profile first"));
        }

        let upload = ImageUpload::from_path(path)?;
        self.orchestrator.open_scanner();
        let scanner = self.scanner.get_or_insert_with(ScannerForm::new);
        scanner.begin(&upload)?;

        let outcome = self.orchestrator.extract_from_image(&upload);
        if let Some(scanner) = self.scanner.as_mut() {
            scanner.finish(outcome);
        }
        Ok(())
    }

    fn scanner_mut(&mut self) -> Result<&mut ScannerForm, ConsoleError> {
        self.scanner
            .as_mut()
            .ok_or(ConsoleError::Unavailable("Scanner is not open"))
    }

    fn edit(&mut self, field: &str, value: &str) -> Result<(), ConsoleError> {
        if let Some(scanner) = self.scanner.as_mut() {
            if matches!(scanner.state(), ScannerState::Result { .. }) {
                return Ok(scanner.set_field(field.parse::<ScanField>()?, value)?);
            }
        }
        if let Some(form) = self.add_form.as_mut() {
            return Ok(form.set_field(field.parse::<AddMedField>()?, value)?);
        }
        if self.orchestrator.state().view() == View::Onboarding {
            self.profile_form.set_field(field.parse::<ProfileField>()?, value);
            return Ok(());
        }
        Err(ConsoleError::Unavailable("Nothing to edit"))
    }

    fn use_scanned(&mut self) -> Result<(), ConsoleError> {
        let data = self.scanner_mut()?.accept()?;
        self.orchestrator.use_extracted_data(data);
        Ok(())
    }

    fn require_detail(&self) -> Result<(), ConsoleError> {
        if self.orchestrator.state().selected_medication().is_some()
            && self.orchestrator.state().view() == View::Detail
        {
            Ok(())
        } else {
            Err(ConsoleError::Unavailable("Open a medication first"))
        }
    }

    /// Drop local form state for modals the orchestrator has closed.
    fn sync_modals(&mut self) {
        let state = self.orchestrator.state();
        if !state.is_add_modal_open() && self.add_form.take().is_some() {
            self.badge = None;
        }
        if !state.is_scanner_open() {
            self.scanner = None;
        }
    }

    // ── Rendering ───────────────────────────────────────────

    pub fn render<W: Write>(&self, out: &mut W) -> Result<(), ConsoleError> {
        let state = self.orchestrator.state();
        writeln!(out, "────────────────────────────────────────")?;

        for (i, notice) in state.notifications().active().iter().enumerate() {
            let at = notice.created_at.with_timezone(&chrono::Local);
            writeln!(
                out,
                "[{}] {} {}: {}",
                i + 1,
                at.format("%H:%M:%S"),
                notice.level,
                notice.text
            )?;
        }

        if state.is_loading() {
            writeln!(out, "Loading...")?;
            return Ok(());
        }

        match state.view() {
            View::Onboarding => self.render_onboarding(out)?,
            View::Dashboard => {
                write!(out, "{}", DashboardView::build(state.medications(), state.profile()))?
            }
            View::Detail => {
                writeln!(out, "< Back")?;
                if let Some(medication) = state.selected_medication() {
                    write!(out, "{}", MedCardView::build(medication, self.card))?;
                    if let Some(badge) = &self.badge {
                        write!(out, "{badge}")?;
                    }
                }
            }
        }

        if state.is_add_modal_open() {
            self.render_add_form(out)?;
        }
        if state.is_scanner_open() {
            self.render_scanner(out)?;
        }
        write!(out, "> ")?;
        out.flush()?;
        Ok(())
    }

    fn render_onboarding<W: Write>(&self, out: &mut W) -> Result<(), ConsoleError> {
        let draft = self.profile_form.draft();
        writeln!(out, "Welcome to MedTrack")?;
        writeln!(out, "Let's set up your profile")?;
        writeln!(out, "  Full Name:  {}", draft.name)?;
        writeln!(out, "  Age:        {}", draft.age)?;
        writeln!(out, "  Allergies:  {}", draft.allergies)?;
        writeln!(out, "  Conditions: {}", draft.conditions)?;
        writeln!(out, "Use: profile <name>|<age>|<allergies>|<conditions>")?;
        Ok(())
    }

    fn render_add_form<W: Write>(&self, out: &mut W) -> Result<(), ConsoleError> {
        let Some(form) = &self.add_form else {
            return Ok(());
        };
        let draft = form.draft();
        writeln!(out, "== Add Medication ==")?;
        writeln!(out, "  Drug Name:    {}", draft.drug_name)?;
        writeln!(out, "  Dosage:       {}", draft.dosage)?;
        writeln!(out, "  Frequency:    {}", draft.frequency)?;
        writeln!(out, "  Start Date:   {}", draft.start_date.format("%Y-%m-%d"))?;
        writeln!(out, "  Instructions: {}", draft.instructions)?;

        match form.step() {
            AddMedStep::Form => {
                writeln!(out, "  Frequencies:  {}", FREQUENCY_CHOICES.join(", "))?;
                if form.can_check() {
                    writeln!(out, "[check] Check Safety")?;
                } else {
                    writeln!(out, "(enter drug name and dosage to check safety)")?;
                }
            }
            AddMedStep::Checking => writeln!(out, "Checking...")?,
            AddMedStep::Safety(result) => {
                writeln!(out, "Safety: {}", result.message)?;
                if let Some(badge) = &self.badge {
                    write!(out, "{badge}")?;
                }
                writeln!(out, "[back] Back   [confirm] Add Medication")?;
            }
        }
        Ok(())
    }

    fn render_scanner<W: Write>(&self, out: &mut W) -> Result<(), ConsoleError> {
        writeln!(out, "== Scan Prescription ==")?;
        let Some(scanner) = &self.scanner else {
            writeln!(out, "Use: scan <path>")?;
            return Ok(());
        };

        match scanner.state() {
            ScannerState::Idle => writeln!(out, "Use: scan <path>")?,
            ScannerState::Processing { .. } => writeln!(out, "Analyzing label...")?,
            ScannerState::Result { preview, data } => {
                if let Some(preview) = preview {
                    writeln!(out, "  Image: {}x{}", preview.width, preview.height)?;
                }
                writeln!(
                    out,
                    "  {} ({}%)",
                    data.confidence_tier().label(),
                    data.confidence_percent()
                )?;
                writeln!(out, "  Name:         {}", data.name)?;
                writeln!(out, "  Dosage:       {}", data.dosage)?;
                writeln!(out, "  Frequency:    {}", data.frequency)?;
                writeln!(out, "  Instructions: {}", data.instructions)?;
                writeln!(out, "[rescan] Scan Again   [use] Use This Data")?;
            }
            ScannerState::Error { message } => {
                writeln!(out, "  {message}")?;
                writeln!(out, "[rescan] Try Again")?;
            }
        }
        Ok(())
    }
}
