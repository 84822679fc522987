use std::str::FromStr;

use super::FormError;
use crate::models::{Profile, ProfileDraft};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Name,
    Age,
    Allergies,
    Conditions,
}

impl FromStr for ProfileField {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "age" => Ok(Self::Age),
            "allergies" => Ok(Self::Allergies),
            "conditions" => Ok(Self::Conditions),
            other => Err(FormError::UnknownField(other.to_string())),
        }
    }
}

/// Onboarding form. Name and age are required; nothing else is checked.
#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    draft: ProfileDraft,
}

impl ProfileForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &ProfileDraft {
        &self.draft
    }

    pub fn set_field(&mut self, field: ProfileField, value: impl Into<String>) {
        let value = value.into();
        match field {
            ProfileField::Name => self.draft.name = value,
            ProfileField::Age => self.draft.age = value,
            ProfileField::Allergies => self.draft.allergies = value,
            ProfileField::Conditions => self.draft.conditions = value,
        }
    }

    /// Hand back the whole draft. The form keeps its values either way.
    pub fn submit(&self) -> Result<ProfileDraft, FormError> {
        if self.draft.name.trim().is_empty() {
            return Err(FormError::MissingField("name"));
        }
        if self.draft.age.trim().is_empty() {
            return Err(FormError::MissingField("age"));
        }
        Ok(self.draft.clone())
    }
}

/// Split a comma-separated input into trimmed entries, preserving order.
///
/// Blank input gives an empty list, never a list holding one empty string;
/// blank segments between commas are dropped for the same reason.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Coerce the raw onboarding strings into the shape the service stores.
pub fn shape_profile(draft: &ProfileDraft) -> Result<Profile, FormError> {
    let age_raw = draft.age.trim();
    let age = age_raw.parse::<u32>().map_err(|_| FormError::InvalidNumber {
        field: "age",
        value: draft.age.clone(),
    })?;

    Ok(Profile {
        name: draft.name.clone(),
        age,
        allergies: split_list(&draft.allergies),
        conditions: split_list(&draft.conditions),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_list_empty_is_empty() {
        assert!(split_list("").is_empty());
        assert!(split_list("   ").is_empty());
    }

    #[test]
    fn split_list_trims_and_keeps_order() {
        assert_eq!(split_list("a, b"), vec!["a", "b"]);
        assert_eq!(
            split_list("peanuts, shellfish ,latex"),
            vec!["peanuts", "shellfish", "latex"]
        );
    }

    #[test]
    fn split_list_drops_blank_segments() {
        assert_eq!(split_list("a,, b,"), vec!["a", "b"]);
    }

    #[test]
    fn shape_profile_coerces_fields() {
        let draft = ProfileDraft {
            name: "Jane Doe".into(),
            age: " 40 ".into(),
            allergies: "peanuts, shellfish".into(),
            conditions: String::new(),
        };
        let profile = shape_profile(&draft).unwrap();
        assert_eq!(profile.age, 40);
        assert_eq!(profile.allergies, vec!["peanuts", "shellfish"]);
        assert!(profile.conditions.is_empty());
        assert_eq!(profile.name, "Jane Doe");
    }

    #[test]
    fn shape_profile_rejects_non_numeric_age() {
        let draft = ProfileDraft {
            name: "Jane".into(),
            age: "forty".into(),
            ..Default::default()
        };
        assert_eq!(
            shape_profile(&draft),
            Err(FormError::InvalidNumber {
                field: "age",
                value: "forty".into()
            })
        );
    }

    #[test]
    fn submit_requires_name_and_age() {
        let mut form = ProfileForm::new();
        assert_eq!(form.submit(), Err(FormError::MissingField("name")));
        form.set_field(ProfileField::Name, "Jane");
        assert_eq!(form.submit(), Err(FormError::MissingField("age")));
        form.set_field(ProfileField::Age, "40");
        let draft = form.submit().unwrap();
        assert_eq!(draft.name, "Jane");
        // Still submittable after a submit.
        assert!(form.submit().is_ok());
    }

    #[test]
    fn field_names_parse() {
        assert_eq!("allergies".parse::<ProfileField>().unwrap(), ProfileField::Allergies);
        assert!("email".parse::<ProfileField>().is_err());
    }
}
