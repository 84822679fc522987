use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::ModelError;

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(View {
    Onboarding => "onboarding",
    Dashboard => "dashboard",
    Detail => "detail",
});

str_enum!(NoticeLevel {
    Success => "success",
    Error => "error",
    Info => "info",
});

/// Frequencies offered by the add-medication form.
///
/// Frequency stays a free string on `Medication` because scanned labels
/// may carry anything; these are just the form's choices.
pub const FREQUENCY_CHOICES: &[&str] = &["Once daily", "Twice daily", "Thrice daily", "As needed"];

/// Default frequency for a fresh add-medication draft.
pub const DEFAULT_FREQUENCY: &str = "Once daily";

/// Qualitative safety tier produced by the remote interaction checker.
///
/// Decoding is case-insensitive and never fails: `danger` and `critical`
/// are the same tier, anything unrecognised becomes `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SafetyStatus {
    Safe,
    Warning,
    Danger,
    /// The check itself failed (transport or service error).
    Error,
    #[default]
    Unknown,
}

impl SafetyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Warning => "warning",
            Self::Danger => "danger",
            Self::Error => "error",
            Self::Unknown => "unknown",
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "safe" => Self::Safe,
            "warning" => Self::Warning,
            "danger" | "critical" => Self::Danger,
            "error" => Self::Error,
            _ => Self::Unknown,
        }
    }

    /// Whether proceeding past this tier needs an explicit confirmation.
    pub fn requires_confirmation(&self) -> bool {
        matches!(self, Self::Danger | Self::Unknown)
    }
}

impl std::fmt::Display for SafetyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SafetyStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SafetyStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Self::parse).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn view_round_trip() {
        for (variant, s) in [
            (View::Onboarding, "onboarding"),
            (View::Dashboard, "dashboard"),
            (View::Detail, "detail"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(View::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn invalid_enum_returns_error() {
        assert!(View::from_str("settings").is_err());
        assert!(NoticeLevel::from_str("").is_err());
    }

    #[test]
    fn safety_status_is_case_insensitive() {
        assert_eq!(SafetyStatus::parse("SAFE"), SafetyStatus::Safe);
        assert_eq!(SafetyStatus::parse("Warning"), SafetyStatus::Warning);
        assert_eq!(SafetyStatus::parse("CRITICAL"), SafetyStatus::Danger);
        assert_eq!(SafetyStatus::parse("danger"), SafetyStatus::Danger);
        assert_eq!(SafetyStatus::parse("ERROR"), SafetyStatus::Error);
    }

    #[test]
    fn unrecognised_safety_status_is_unknown() {
        assert_eq!(SafetyStatus::parse("pending"), SafetyStatus::Unknown);
        let status: SafetyStatus = serde_json::from_str("null").unwrap();
        assert_eq!(status, SafetyStatus::Unknown);
    }

    #[test]
    fn safety_status_serializes_lowercase() {
        let json = serde_json::to_string(&SafetyStatus::Danger).unwrap();
        assert_eq!(json, "\"danger\"");
    }

    #[test]
    fn confirmation_tiers() {
        assert!(!SafetyStatus::Safe.requires_confirmation());
        assert!(!SafetyStatus::Warning.requires_confirmation());
        assert!(SafetyStatus::Danger.requires_confirmation());
        assert!(SafetyStatus::Unknown.requires_confirmation());
    }

    #[test]
    fn default_frequency_is_a_choice() {
        assert!(FREQUENCY_CHOICES.contains(&DEFAULT_FREQUENCY));
    }
}
