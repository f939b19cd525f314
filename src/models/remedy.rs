use serde::{Deserialize, Serialize};

use super::metadata::AiMetadata;

/// One herb as used in a remedy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HerbUsage {
    pub name: String,
    pub description: String,
    pub properties: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preparation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryRemedy {
    /// Never empty.
    pub instructions: String,
    pub herbs: Vec<HerbUsage>,
    #[serde(default)]
    pub precautions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportiveCare {
    pub lifestyle: Option<String>,
    pub diet: Option<String>,
    pub yoga: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUp {
    pub duration: String,
    pub monitoring: String,
    pub next_steps: String,
}

/// Traditional-medicine guidance for one herb and one condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemedyRecommendation {
    pub primary: PrimaryRemedy,
    pub supportive: SupportiveCare,
    pub follow_up: FollowUp,
    pub ayush_compliance: bool,
    pub confidence: u8,
    pub ai_metadata: AiMetadata,
}
