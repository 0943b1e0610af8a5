use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The fixed profile questions, in the order they are asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProfileField {
    #[serde(rename = "Full Name")]
    FullName,
    #[serde(rename = "Email")]
    Email,
    #[serde(rename = "Phone Number")]
    PhoneNumber,
    #[serde(rename = "Years of Experience")]
    YearsOfExperience,
    #[serde(rename = "Desired Position")]
    DesiredPosition,
    #[serde(rename = "Current Location")]
    CurrentLocation,
    #[serde(rename = "Tech Stack")]
    TechStack,
}

impl ProfileField {
    pub const ALL: [ProfileField; 7] = [
        ProfileField::FullName,
        ProfileField::Email,
        ProfileField::PhoneNumber,
        ProfileField::YearsOfExperience,
        ProfileField::DesiredPosition,
        ProfileField::CurrentLocation,
        ProfileField::TechStack,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ProfileField::FullName => "Full Name",
            ProfileField::Email => "Email",
            ProfileField::PhoneNumber => "Phone Number",
            ProfileField::YearsOfExperience => "Years of Experience",
            ProfileField::DesiredPosition => "Desired Position",
            ProfileField::CurrentLocation => "Current Location",
            ProfileField::TechStack => "Tech Stack",
        }
    }

    pub fn prompt(self) -> &'static str {
        match self {
            ProfileField::FullName => "What is your full name?",
            ProfileField::Email => "What is your email address?",
            ProfileField::PhoneNumber => "What is your phone number?",
            ProfileField::YearsOfExperience => "How many years of experience do you have?",
            ProfileField::DesiredPosition => "What is your desired position?",
            ProfileField::CurrentLocation => "Where are you currently located?",
            ProfileField::TechStack => "What is your tech stack (e.g., Python, Django, SQL)?",
        }
    }

    /// The field asked at `step` (0-based), if any.
    pub fn at(step: usize) -> Option<ProfileField> {
        Self::ALL.get(step).copied()
    }
}

/// Candidate answers to the profile questions. A field cannot be overwritten
/// once set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateProfile {
    fields: BTreeMap<ProfileField, String>,
}

impl CandidateProfile {
    pub fn get(&self, field: ProfileField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    /// Stores `value` for `field`. Returns `false` if the field was already set.
    pub fn set(&mut self, field: ProfileField, value: impl Into<String>) -> bool {
        if self.fields.contains_key(&field) {
            return false;
        }
        self.fields.insert(field, value.into());
        true
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.fields.len() == ProfileField::ALL.len()
    }

    /// `Label: value` lines in question order, for prompts.
    pub fn as_prompt_lines(&self) -> String {
        self.fields
            .iter()
            .map(|(field, value)| format!("- {}: {}", field.label(), value))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl FromIterator<(ProfileField, String)> for CandidateProfile {
    fn from_iter<I: IntoIterator<Item = (ProfileField, String)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
