//! Transient, dismissible notifications (the UI's toasts).
//!
//! Every failure the orchestrator swallows ends up here so the user sees it;
//! each notice is also logged.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::NoticeLevel;

/// Oldest notices are dropped beyond this many.
const MAX_NOTICES: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub id: Uuid,
    pub level: NoticeLevel,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct Notifications {
    items: Vec<Notice>,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&mut self, text: impl Into<String>) -> Uuid {
        self.push(NoticeLevel::Success, text.into())
    }

    pub fn error(&mut self, text: impl Into<String>) -> Uuid {
        self.push(NoticeLevel::Error, text.into())
    }

    pub fn info(&mut self, text: impl Into<String>) -> Uuid {
        self.push(NoticeLevel::Info, text.into())
    }

    fn push(&mut self, level: NoticeLevel, text: String) -> Uuid {
        match level {
            NoticeLevel::Error => tracing::warn!(notice = %text, "User notified of failure"),
            _ => tracing::info!(notice = %text, level = %level, "User notified"),
        }

        let id = Uuid::new_v4();
        self.items.push(Notice {
            id,
            level,
            text,
            created_at: Utc::now(),
        });
        if self.items.len() > MAX_NOTICES {
            let excess = self.items.len() - MAX_NOTICES;
            self.items.drain(..excess);
        }
        id
    }

    /// Remove a notice. Returns false if it was already gone.
    pub fn dismiss(&mut self, id: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        self.items.len() != before
    }

    /// Active notices, oldest first.
    pub fn active(&self) -> &[Notice] {
        &self.items
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.items.last()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_dismiss() {
        let mut notes = Notifications::new();
        let first = notes.success("Profile saved!");
        let second = notes.error("Network error");
        assert_eq!(notes.active().len(), 2);
        assert_eq!(notes.latest().unwrap().level, NoticeLevel::Error);

        assert!(notes.dismiss(first));
        assert!(!notes.dismiss(first));
        assert_eq!(notes.active()[0].id, second);
    }

    #[test]
    fn oldest_notices_are_dropped() {
        let mut notes = Notifications::new();
        for i in 0..(MAX_NOTICES + 5) {
            notes.info(format!("n{i}"));
        }
        assert_eq!(notes.active().len(), MAX_NOTICES);
        assert_eq!(notes.active()[0].text, "n5");
    }
}
