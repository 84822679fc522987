//! Presentation view-models.
//!
//! Built from read-only snapshots of orchestrator state; they never mutate
//! what they are given. `Display` renders each one as plain text.

pub mod dashboard;
pub mod med_card;
pub mod safety_badge;

pub use dashboard::*;
pub use med_card::*;
pub use safety_badge::*;
