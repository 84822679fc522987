use serde::{Deserialize, Serialize};

use super::lenient;

/// Patient profile as stored by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::age")]
    pub age: u32,
    #[serde(default, deserialize_with = "lenient::strings")]
    pub allergies: Vec<String>,
    #[serde(default, deserialize_with = "lenient::strings")]
    pub conditions: Vec<String>,
}

impl Profile {
    /// A profile counts as onboarded once it carries a name.
    pub fn is_populated(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

/// Raw onboarding form values, exactly as typed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProfileDraft {
    pub name: String,
    pub age: String,
    /// Comma-separated.
    pub allergies: String,
    /// Comma-separated.
    pub conditions: String,
}

/// The profile the session is currently running with.
///
/// A preloaded profile comes back from the service already shaped; a freshly
/// onboarded one is kept as the untransformed form values that were submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveProfile {
    Saved(Profile),
    Submitted(ProfileDraft),
}

impl ActiveProfile {
    pub fn name(&self) -> &str {
        match self {
            Self::Saved(profile) => &profile.name,
            Self::Submitted(draft) => &draft.name,
        }
    }

    /// First word of the name, used for greetings.
    pub fn first_name(&self) -> Option<&str> {
        self.name().split_whitespace().next()
    }
}
