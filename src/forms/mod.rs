//! Input forms: onboarding profile, add-medication, label scanner.
//!
//! A form owns its uncommitted draft and never talks to the network. Submitting
//! hands back what the caller should do with the draft; the caller reports the
//! result (if any) and the form stays re-submittable whatever happened.

pub mod add_med;
pub mod profile_form;
pub mod scanner;

pub use add_med::*;
pub use profile_form::*;
pub use scanner::*;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{field} must be a whole number, got {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("A request is already in progress")]
    Busy,

    #[error("Fields cannot be edited in the current step")]
    NotEditable,

    #[error("CRITICAL: {0} Confirm to continue anyway.")]
    ConfirmationRequired(String),

    #[error("Safety check failed: {0}")]
    SafetyCheckFailed(String),

    #[error("No extracted data to use")]
    NothingToUse,
}
