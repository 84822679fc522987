use std::fmt;

use crate::models::{SafetyResult, SafetyStatus};

/// Safety badge with an expandable detail popover.
///
/// Driven entirely by the props it is built with; the only state it owns is
/// whether the popover is open.
#[derive(Debug, Clone, PartialEq)]
pub struct SafetyBadge {
    status: SafetyStatus,
    message: String,
    interactions: Vec<String>,
    show_details: bool,
    expanded: bool,
}

impl SafetyBadge {
    pub fn new(status: SafetyStatus, message: impl Into<String>, interactions: Vec<String>) -> Self {
        Self {
            status,
            message: message.into(),
            interactions,
            show_details: true,
            expanded: false,
        }
    }

    pub fn from_result(result: &SafetyResult) -> Self {
        Self::new(result.status, result.message.clone(), result.interactions.clone())
    }

    /// Disable the popover entirely.
    pub fn without_details(mut self) -> Self {
        self.show_details = false;
        self.expanded = false;
        self
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn toggle(&mut self) {
        if self.show_details {
            self.expanded = !self.expanded;
        }
    }

    pub fn label(&self) -> &'static str {
        match self.status {
            SafetyStatus::Safe => "Safe",
            SafetyStatus::Warning => "Warning",
            SafetyStatus::Danger => "Risk",
            SafetyStatus::Error | SafetyStatus::Unknown => "Unknown",
        }
    }

    pub fn headline(&self) -> &'static str {
        match self.status {
            SafetyStatus::Safe => "No Issues Detected",
            SafetyStatus::Warning => "Please Review",
            _ => "Action Required",
        }
    }

    /// Advice line shown for every non-safe status.
    pub fn advisory(&self) -> Option<&'static str> {
        match self.status {
            SafetyStatus::Safe => None,
            SafetyStatus::Warning => Some(
                "Consult your healthcare provider if you have concerns about these interactions.",
            ),
            _ => Some("Contact your doctor or pharmacist immediately before taking this medication."),
        }
    }

    pub fn interactions(&self) -> &[String] {
        &self.interactions
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for SafetyBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hint = if self.show_details { " (i)" } else { "" };
        writeln!(f, "<{}>{hint}", self.label())?;
        if !self.expanded {
            return Ok(());
        }

        writeln!(f, "  {} - AI Safety Analysis", self.headline())?;
        if !self.message.is_empty() {
            writeln!(f, "  Summary: {}", self.message)?;
        }
        if !self.interactions.is_empty() {
            writeln!(f, "  Potential Interactions ({}):", self.interactions.len())?;
            for interaction in &self.interactions {
                writeln!(f, "   ! {interaction}")?;
            }
        }
        if let Some(advice) = self.advisory() {
            writeln!(f, "  {advice}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warning_badge() -> SafetyBadge {
        SafetyBadge::new(
            SafetyStatus::Warning,
            "Monitor for stomach upset",
            vec!["ibuprofen + aspirin".into(), "ibuprofen + alcohol".into()],
        )
    }

    #[test]
    fn toggle_expands_and_collapses() {
        let mut badge = warning_badge();
        assert!(!badge.is_expanded());
        badge.toggle();
        assert!(badge.is_expanded());
        badge.toggle();
        assert!(!badge.is_expanded());
    }

    #[test]
    fn without_details_never_expands() {
        let mut badge = warning_badge().without_details();
        badge.toggle();
        assert!(!badge.is_expanded());
        assert!(!badge.to_string().contains("(i)"));
    }

    #[test]
    fn labels_per_status() {
        let label = |s| SafetyBadge::new(s, "", vec![]).label();
        assert_eq!(label(SafetyStatus::Safe), "Safe");
        assert_eq!(label(SafetyStatus::Warning), "Warning");
        assert_eq!(label(SafetyStatus::Danger), "Risk");
        assert_eq!(label(SafetyStatus::Unknown), "Unknown");
    }

    #[test]
    fn expanded_render_lists_interactions_and_advice() {
        let mut badge = warning_badge();
        badge.toggle();
        let text = badge.to_string();
        assert!(text.contains("Please Review"));
        assert!(text.contains("Potential Interactions (2)"));
        assert!(text.contains("ibuprofen + alcohol"));
        assert!(text.contains("Consult your healthcare provider"));
    }

    #[test]
    fn safe_has_no_advisory() {
        let badge = SafetyBadge::new(SafetyStatus::Safe, "", vec![]);
        assert_eq!(badge.advisory(), None);
        assert_eq!(badge.headline(), "No Issues Detected");
    }
}
