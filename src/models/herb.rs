use serde::{Deserialize, Serialize};

use super::metadata::AiMetadata;

/// Sentinel common name when nothing could be identified.
pub const UNKNOWN_HERB: &str = "Unknown Herb";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HerbName {
    pub common: String,
    pub scientific: String,
    pub sanskrit: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternativeMatch {
    pub name: String,
    pub confidence: u8,
}

/// Structured identity of the herb recognized in an uploaded photograph.
///
/// `confidence` is always within 0..=100 and `name.common` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HerbIdentity {
    pub generated_id: String,
    pub name: HerbName,
    pub confidence: u8,
    /// Full model text the identity was extracted from.
    pub description: String,
    pub properties: String,
    pub alternative_matches: Vec<AlternativeMatch>,
    pub ai_metadata: Option<AiMetadata>,
}

/// Slug used as a stable id: lower-cased, whitespace runs collapsed to `-`.
pub fn slugify(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}
