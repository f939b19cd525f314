use serde::{Deserialize, Serialize};

use super::enums::{Constitution, Gender};

/// Shown to the model when the caller supplied no age.
pub const DEFAULT_AGE_LABEL: &str = "Adult";
/// Shown to the model for any missing categorical field.
pub const NOT_SPECIFIED: &str = "Not specified";

/// Patient details supplied by the caller. Read-only to the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientProfile {
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub constitution: Option<Constitution>,
}

impl PatientProfile {
    pub fn new(age: u32, gender: Gender, constitution: Constitution) -> Self {
        Self {
            age: Some(age),
            gender: Some(gender),
            constitution: Some(constitution),
        }
    }

    /// Age as prompt text; zero counts as missing.
    pub fn age_label(&self) -> String {
        match self.age {
            Some(age) if age > 0 => age.to_string(),
            _ => DEFAULT_AGE_LABEL.to_string(),
        }
    }

    pub fn gender_label(&self) -> &'static str {
        self.gender.map(|g| g.as_str()).unwrap_or(NOT_SPECIFIED)
    }

    pub fn constitution_label(&self) -> &'static str {
        self.constitution
            .map(|c| c.as_str())
            .unwrap_or(NOT_SPECIFIED)
    }
}
