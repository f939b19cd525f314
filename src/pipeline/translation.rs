use std::time::Duration;

use thiserror::Error;

use crate::config::{AiConfig, LanguageServiceConfig, DEFAULT_LANGUAGE};
use crate::pipeline::api_types::{ChatMessage, ChatRequest, ChatResponse};
use crate::pipeline::transport::{RetryingTransport, TransportError};

pub const TRANSLATION_SYSTEM_PROMPT: &str = "You are an expert translator specializing in \
medical and Ayurvedic texts. Provide accurate translations that maintain the technical and \
cultural nuances of the original text.";

pub const TRANSLATION_MAX_TOKENS: u32 = 800;
pub const TRANSLATION_TEMPERATURE: f32 = 0.1;

/// Supported target languages: code, English name, native name.
const LANGUAGES: &[(&str, &str, &str)] = &[
    ("en", "English", "English"),
    ("hi", "Hindi", "हिंदी"),
    ("ta", "Tamil", "தமிழ்"),
    ("te", "Telugu", "తెలుగు"),
    ("bn", "Bengali", "বাংলা"),
    ("mr", "Marathi", "मराठी"),
    ("kn", "Kannada", "ಕನ್ನಡ"),
    ("ml", "Malayalam", "മലയാളം"),
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslationError {
    #[error("Failed to translate to {language}: {source}")]
    Transport {
        language: String,
        #[source]
        source: TransportError,
    },

    #[error("Failed to translate to {language}: {reason}")]
    MalformedResponse { language: String, reason: String },
}

/// English name for a language code. Unknown codes are returned unchanged.
pub fn language_display_name(code: &str) -> &str {
    LANGUAGES
        .iter()
        .find(|(c, _, _)| *c == code)
        .map(|(_, name, _)| *name)
        .unwrap_or(code)
}

pub fn is_supported_language(code: &str) -> bool {
    LANGUAGES.iter().any(|(c, _, _)| *c == code)
}

pub fn supported_languages() -> impl Iterator<Item = &'static str> {
    LANGUAGES.iter().map(|(c, _, _)| *c)
}

/// Name used inside the prompt, with the native script when known:
/// `Hindi (हिंदी)`.
fn prompt_language_name(code: &str) -> String {
    match LANGUAGES.iter().find(|(c, _, _)| *c == code) {
        Some((_, name, native)) if name != native => format!("{name} ({native})"),
        Some((_, name, _)) => name.to_string(),
        None => code.to_string(),
    }
}

pub fn build_translation_prompt(text: &str, language: &str) -> String {
    let target = prompt_language_name(language);
    format!(
        "Translate the following Ayurvedic remedy text into {target}.
Keep all the medical terms accurate and maintain the cultural context of Ayurveda.
Make sure the translation is clear and easy to understand for native speakers.

Original text:
{text}

Translated text in {target}:"
    )
}

/// Translates remedy text with the language service.
pub struct Translator {
    transport: RetryingTransport,
    service: LanguageServiceConfig,
    timeout: Duration,
    max_attempts: u32,
}

impl Translator {
    pub fn new(transport: RetryingTransport, config: &AiConfig) -> Self {
        Self {
            transport,
            service: config.language.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            max_attempts: config.max_attempts,
        }
    }

    /// Translate `text` into `language`.
    ///
    /// The default language returns the input unchanged without a network
    /// call. Otherwise fails only when the service cannot be reached or its
    /// answer carries no text.
    pub fn translate(&self, text: &str, language: &str) -> Result<String, TranslationError> {
        if language == DEFAULT_LANGUAGE {
            return Ok(text.to_string());
        }

        let _span = tracing::info_span!(
            "translate_remedy",
            language,
            language_name = language_display_name(language),
            text_len = text.len(),
        )
        .entered();

        let malformed = |reason: String| TranslationError::MalformedResponse {
            language: language.to_string(),
            reason,
        };

        let request = ChatRequest {
            model: self.service.model.clone(),
            messages: vec![
                ChatMessage::system(TRANSLATION_SYSTEM_PROMPT),
                ChatMessage::user(&build_translation_prompt(text, language)),
            ],
            max_tokens: TRANSLATION_MAX_TOKENS,
            temperature: TRANSLATION_TEMPERATURE,
        };
        let payload = serde_json::to_value(&request).map_err(|e| malformed(e.to_string()))?;
        let bearer = format!("Bearer {}", self.service.api_key);

        let response = self
            .transport
            .call(
                &self.service.endpoint,
                &payload,
                &[("Authorization", bearer.as_str())],
                self.timeout,
                self.max_attempts,
            )
            .into_result()
            .map_err(|source| TranslationError::Transport {
                language: language.to_string(),
                source,
            })?;

        let parsed: ChatResponse = response.json().map_err(|e| malformed(e.to_string()))?;
        let translated = parsed
            .first_content()
            .ok_or_else(|| malformed("No translated text received".into()))?;

        tracing::info!(translated_len = translated.len(), "Translation completed");
        Ok(translated.to_string())
    }
}
