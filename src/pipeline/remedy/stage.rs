use std::path::Path;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use super::prompt::{
    build_remedy_prompt, REMEDY_MAX_TOKENS, REMEDY_SYSTEM_PROMPT, REMEDY_TEMPERATURE,
};
use super::sections::{extract_sections, RemedySections};
use crate::config::{AiConfig, LanguageServiceConfig};
use crate::models::{
    AiMetadata, FollowUp, HerbIdentity, HerbUsage, PatientProfile, PrimaryRemedy,
    RemedyRecommendation, SupportiveCare,
};
use crate::pipeline::api_types::{ChatMessage, ChatRequest, ChatResponse};
use crate::pipeline::diagnostic::{dump_text, REMEDY_PROMPT_FILE, REMEDY_RESPONSE_FILE};
use crate::pipeline::outcome::StageOutcome;
use crate::pipeline::transport::{HttpResponse, RetryOutcome, RetryingTransport, TransportError};

/// Service name recorded in remedy metadata.
pub const LANGUAGE_SERVICE: &str = "perplexity";

/// Used when the identification carries no confidence of its own.
pub const DEFAULT_REMEDY_CONFIDENCE: u8 = 70;
pub const FALLBACK_REMEDY_CONFIDENCE: u8 = 50;

const DEFAULT_DURATION: &str = "2-4 weeks";
const MONITORING: &str = "Monitor symptoms and adjust as needed";
const NEXT_STEPS: &str = "Consult an Ayurvedic practitioner if symptoms persist";

const FALLBACK_LIFESTYLE: &str = "Rest adequately and maintain hydration.";
const FALLBACK_DIET: &str = "Follow a balanced diet suitable for your constitution.";
const FALLBACK_YOGA: &str = "Practice gentle yoga as appropriate for your condition.";
const FALLBACK_MONITORING: &str =
    "Monitor symptoms and seek professional advice if condition persists.";
const FALLBACK_NEXT_STEPS: &str = "Consult an Ayurvedic practitioner for personalized treatment.";

/// Why a generation attempt fell back. Never leaves this module except as
/// the `reason` of a degraded outcome.
#[derive(Error, Debug)]
enum GenerationError {
    #[error("Invalid herb identification data")]
    InvalidIdentity,

    #[error("Treatment condition is required")]
    MissingCondition,

    #[error("Remedy service call failed after {attempts} attempt(s): {source}")]
    Transport {
        attempts: u32,
        #[source]
        source: TransportError,
    },

    #[error("Invalid response from remedy generation service: {0}")]
    MalformedResponse(String),

    #[error("Failed to generate remedy content")]
    EmptyContent,
}

/// Turns an identified herb and a patient condition into remedy guidance.
pub struct RemedyGenerator {
    transport: RetryingTransport,
    service: LanguageServiceConfig,
    timeout: Duration,
    max_attempts: u32,
}

impl RemedyGenerator {
    pub fn new(transport: RetryingTransport, config: &AiConfig) -> Self {
        Self {
            transport,
            service: config.language.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            max_attempts: config.max_attempts,
        }
    }

    /// Generate a recommendation. Never fails: any problem yields the fixed
    /// fallback recommendation wrapped in `StageOutcome::Degraded`.
    pub fn generate(
        &self,
        identity: &HerbIdentity,
        profile: &PatientProfile,
        condition: &str,
    ) -> StageOutcome<RemedyRecommendation> {
        self.generate_with_dump(identity, profile, condition, None)
    }

    /// `generate`, also writing the prompt and raw service body into `dump_dir`.
    pub fn generate_with_dump(
        &self,
        identity: &HerbIdentity,
        profile: &PatientProfile,
        condition: &str,
        dump_dir: Option<&Path>,
    ) -> StageOutcome<RemedyRecommendation> {
        let _span = tracing::info_span!(
            "generate_remedy",
            model = %self.service.model,
            herb = %identity.name.common,
            condition_len = condition.len(),
        )
        .entered();

        match self.try_generate(identity, profile, condition, dump_dir) {
            Ok(recommendation) => {
                tracing::info!(
                    instructions_len = recommendation.primary.instructions.len(),
                    confidence = recommendation.confidence,
                    "Remedy generated"
                );
                StageOutcome::Completed(recommendation)
            }
            Err(e) => {
                let reason = e.to_string();
                tracing::warn!(error = %reason, "Remedy generation failed, using fallback");
                StageOutcome::degraded(
                    fallback_recommendation(identity, condition, &self.service.model, &reason),
                    reason,
                )
            }
        }
    }

    fn try_generate(
        &self,
        identity: &HerbIdentity,
        profile: &PatientProfile,
        condition: &str,
        dump_dir: Option<&Path>,
    ) -> Result<RemedyRecommendation, GenerationError> {
        if identity.name.common.trim().is_empty() {
            return Err(GenerationError::InvalidIdentity);
        }
        if condition.trim().is_empty() {
            return Err(GenerationError::MissingCondition);
        }

        let prompt = build_remedy_prompt(identity, profile, condition);
        if let Some(dir) = dump_dir {
            dump_text(dir, REMEDY_PROMPT_FILE, &prompt);
        }
        let request = ChatRequest {
            model: self.service.model.clone(),
            messages: vec![
                ChatMessage::system(REMEDY_SYSTEM_PROMPT),
                ChatMessage::user(&prompt),
            ],
            max_tokens: REMEDY_MAX_TOKENS,
            temperature: REMEDY_TEMPERATURE,
        };
        let payload = serde_json::to_value(&request)
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

        let response = self.call(&payload)?;
        if let Some(dir) = dump_dir {
            dump_text(dir, REMEDY_RESPONSE_FILE, &response.body);
        }
        let parsed: ChatResponse = response
            .json()
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;
        let text = parsed.first_content().ok_or(GenerationError::EmptyContent)?;

        Ok(assemble_recommendation(
            text,
            identity,
            extract_sections(text),
            AiMetadata::new(&self.service.model, LANGUAGE_SERVICE, parsed.token_usage()),
        ))
    }

    fn call(&self, payload: &Value) -> Result<HttpResponse, GenerationError> {
        let bearer = format!("Bearer {}", self.service.api_key);
        let headers = [("Authorization", bearer.as_str())];
        let outcome = self.transport.call(
            &self.service.endpoint,
            payload,
            &headers,
            self.timeout,
            self.max_attempts,
        );
        tracing::debug!(
            attempts = outcome.attempts(),
            backoff_ms = outcome.backoff().as_millis() as u64,
            "Remedy service call finished"
        );
        match outcome {
            RetryOutcome::Success { response, .. } => Ok(response),
            RetryOutcome::Failed {
                error, attempts, ..
            } => Err(GenerationError::Transport {
                attempts,
                source: error,
            }),
        }
    }
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn assemble_recommendation(
    text: &str,
    identity: &HerbIdentity,
    sections: RemedySections,
    ai_metadata: AiMetadata,
) -> RemedyRecommendation {
    let confidence = match identity.confidence {
        0 => DEFAULT_REMEDY_CONFIDENCE,
        c => c.min(100),
    };
    let duration = if sections.timeline.is_empty() {
        DEFAULT_DURATION.to_string()
    } else {
        sections.timeline
    };

    RemedyRecommendation {
        primary: PrimaryRemedy {
            instructions: text.to_string(),
            herbs: vec![HerbUsage {
                name: identity.name.common.clone(),
                description: identity.description.clone(),
                properties: identity.properties.clone(),
                preparation: non_empty(sections.preparation),
                dosage: non_empty(sections.dosage),
            }],
            precautions: non_empty(sections.precautions).into_iter().collect(),
        },
        supportive: SupportiveCare {
            lifestyle: None,
            diet: non_empty(sections.dietary),
            yoga: None,
        },
        follow_up: FollowUp {
            duration,
            monitoring: MONITORING.to_string(),
            next_steps: NEXT_STEPS.to_string(),
        },
        ayush_compliance: true,
        confidence,
        ai_metadata,
    }
}

/// Safe recommendation returned whenever generation cannot complete.
pub fn fallback_recommendation(
    identity: &HerbIdentity,
    condition: &str,
    model: &str,
    reason: &str,
) -> RemedyRecommendation {
    let condition = match condition.trim() {
        "" => "your condition",
        c => c,
    };
    let herb = match identity.name.common.trim() {
        "" => "Herb",
        h => h,
    };
    let or_default = |value: &str, default: &str| {
        if value.trim().is_empty() {
            default.to_string()
        } else {
            value.to_string()
        }
    };

    RemedyRecommendation {
        primary: PrimaryRemedy {
            instructions: format!(
                "We're sorry, but we couldn't generate a specific remedy at this time. \
                 For {condition}, consider consulting with an Ayurvedic practitioner \
                 for personalized advice on using {herb}."
            ),
            herbs: vec![HerbUsage {
                name: herb.to_string(),
                description: or_default(&identity.description, "No description available"),
                properties: or_default(&identity.properties, "Properties not available"),
                preparation: None,
                dosage: None,
            }],
            precautions: Vec::new(),
        },
        supportive: SupportiveCare {
            lifestyle: Some(FALLBACK_LIFESTYLE.to_string()),
            diet: Some(FALLBACK_DIET.to_string()),
            yoga: Some(FALLBACK_YOGA.to_string()),
        },
        follow_up: FollowUp {
            duration: DEFAULT_DURATION.to_string(),
            monitoring: FALLBACK_MONITORING.to_string(),
            next_steps: FALLBACK_NEXT_STEPS.to_string(),
        },
        ayush_compliance: true,
        confidence: FALLBACK_REMEDY_CONFIDENCE,
        ai_metadata: AiMetadata::degraded(model, LANGUAGE_SERVICE, reason),
    }
}
