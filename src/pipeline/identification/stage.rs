use std::path::Path;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use super::extractor::extract_identity;
use super::prompt::{IDENTIFICATION_MAX_TOKENS, IDENTIFICATION_PROMPT, IDENTIFICATION_TEMPERATURE};
use super::IdentificationError;
use crate::config::{AiConfig, VisionServiceConfig};
use crate::models::{slugify, AiMetadata, HerbIdentity, HerbName, PatientProfile, UNKNOWN_HERB};
use crate::pipeline::api_types::{
    GeminiContent, GeminiGenerationConfig, GeminiInlineData, GeminiPart, GeminiRequest,
    GeminiResponse,
};
use crate::pipeline::diagnostic::{dump_text, IDENTIFICATION_RESPONSE_FILE};
use crate::pipeline::transport::{RetryOutcome, RetryingTransport};

/// Service name recorded in identification metadata.
pub const VISION_SERVICE: &str = "gemini";

/// Confidence of the identity substituted when the vision call fails.
pub const FALLBACK_IDENTITY_CONFIDENCE: u8 = 50;

const DEFAULT_MEDIA_TYPE: &str = "image/jpeg";

/// Recognizes the herb in an uploaded photograph using the vision service.
pub struct HerbIdentifier {
    transport: RetryingTransport,
    service: VisionServiceConfig,
    timeout: Duration,
    max_attempts: u32,
}

impl HerbIdentifier {
    pub fn new(transport: RetryingTransport, config: &AiConfig) -> Self {
        Self {
            transport,
            service: config.vision.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            max_attempts: config.max_attempts,
        }
    }

    pub fn model(&self) -> &str {
        &self.service.model
    }

    /// Identify the herb shown in `image_path`.
    ///
    /// An unreadable image is reported as `ImageRead`; transport failures and
    /// responses without text are returned as errors for the caller to
    /// degrade. `condition` and `profile` only annotate the logs.
    pub fn identify(
        &self,
        image_path: &Path,
        condition: &str,
        profile: &PatientProfile,
    ) -> Result<HerbIdentity, IdentificationError> {
        self.identify_with_dump(image_path, condition, profile, None)
    }

    /// `identify`, also writing the raw service body into `dump_dir`.
    pub fn identify_with_dump(
        &self,
        image_path: &Path,
        condition: &str,
        profile: &PatientProfile,
        dump_dir: Option<&Path>,
    ) -> Result<HerbIdentity, IdentificationError> {
        let _span = tracing::info_span!(
            "identify_herb",
            model = %self.service.model,
            condition_len = condition.len(),
            constitution = profile.constitution_label(),
        )
        .entered();

        let bytes = std::fs::read(image_path).map_err(|source| IdentificationError::ImageRead {
            path: image_path.display().to_string(),
            source,
        })?;
        let media_type = media_type_for(image_path);
        tracing::debug!(
            media_type = %media_type,
            image_bytes = bytes.len(),
            "Image loaded for identification"
        );

        let request = build_request(&BASE64.encode(&bytes), &media_type);
        let payload = serde_json::to_value(&request)
            .map_err(|e| IdentificationError::MalformedResponse(e.to_string()))?;
        let headers = [("x-goog-api-key", self.service.api_key.as_str())];

        let response = match self.transport.call(
            &self.service.endpoint,
            &payload,
            &headers,
            self.timeout,
            self.max_attempts,
        ) {
            RetryOutcome::Success { response, .. } => response,
            RetryOutcome::Failed {
                error, attempts, ..
            } => {
                return Err(IdentificationError::Transport {
                    attempts,
                    source: error,
                })
            }
        };

        if let Some(dir) = dump_dir {
            dump_text(dir, IDENTIFICATION_RESPONSE_FILE, &response.body);
        }

        let parsed: GeminiResponse = response
            .json()
            .map_err(|e| IdentificationError::MalformedResponse(e.to_string()))?;
        let text = parsed.first_text().ok_or_else(|| {
            IdentificationError::MalformedResponse("No response text received from vision model".into())
        })?;

        let mut identity = extract_identity(text);
        identity.ai_metadata = Some(AiMetadata::new(
            &self.service.model,
            VISION_SERVICE,
            parsed.token_usage(),
        ));

        tracing::info!(
            herb = %identity.name.common,
            confidence = identity.confidence,
            response_len = text.len(),
            "Herb identified"
        );
        Ok(identity)
    }
}

fn build_request(image_base64: &str, media_type: &str) -> GeminiRequest {
    GeminiRequest {
        contents: vec![GeminiContent {
            parts: vec![
                GeminiPart::InlineData {
                    inline_data: GeminiInlineData {
                        mime_type: media_type.to_string(),
                        data: image_base64.to_string(),
                    },
                },
                GeminiPart::Text {
                    text: IDENTIFICATION_PROMPT.to_string(),
                },
            ],
        }],
        generation_config: Some(GeminiGenerationConfig {
            temperature: IDENTIFICATION_TEMPERATURE,
            max_output_tokens: IDENTIFICATION_MAX_TOKENS,
        }),
    }
}

/// Media type for an image path, guessed from its extension.
///
/// `.jpg` maps to `image/jpeg`. Unknown or missing extensions default to
/// JPEG, the format phone cameras upload.
pub fn media_type_for(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        None | Some("") => DEFAULT_MEDIA_TYPE.to_string(),
        Some("jpg") | Some("jpeg") => DEFAULT_MEDIA_TYPE.to_string(),
        Some(ext) => mime_guess::from_ext(ext)
            .first()
            .filter(|m| m.type_() == mime_guess::mime::IMAGE)
            .map(|m| m.essence_str().to_string())
            .unwrap_or_else(|| format!("image/{ext}")),
    }
}

/// Identity used when the vision service could not be reached or answered
/// without usable text. Keeps generation going with an honest low score.
pub fn fallback_identity(model: &str, reason: &str) -> HerbIdentity {
    HerbIdentity {
        generated_id: slugify(UNKNOWN_HERB),
        name: HerbName {
            common: UNKNOWN_HERB.to_string(),
            scientific: String::new(),
            sanskrit: String::new(),
        },
        confidence: FALLBACK_IDENTITY_CONFIDENCE,
        description: String::new(),
        properties: String::new(),
        alternative_matches: Vec::new(),
        ai_metadata: Some(AiMetadata::degraded(model, VISION_SERVICE, reason)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;

    use crate::models::TokenUsage;
    use crate::pipeline::transport::{
        HttpResponse, MockTransport, RecordingSleeper, TransportError,
    };

    fn gemini_body(text: &str) -> serde_json::Value {
        json!({
            "candidates": [{"content": {"parts": [{"text": text}]}}],
            "usageMetadata": {"promptTokenCount": 258, "candidatesTokenCount": 61}
        })
    }

    fn identifier(mock: Arc<MockTransport>) -> HerbIdentifier {
        let transport =
            RetryingTransport::new(mock).with_sleeper(Arc::new(RecordingSleeper::new()));
        HerbIdentifier::new(transport, &AiConfig::new("gem-key", "pplx-key"))
    }

    const JPEG_MAGIC: [u8; 4] = [0xFF, 0xD8, 0xFF, 0xE0];

    fn write_image(dir: &tempfile::TempDir, name: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, JPEG_MAGIC).unwrap();
        path
    }

    #[test]
    fn identifies_from_labeled_response() {
        let dir = tempfile::tempdir().unwrap();
        let image = write_image(&dir, "leaf.jpg");
        let mock = Arc::new(MockTransport::ok_json(&gemini_body(
            "HERB NAME: Tulsi\nSCIENTIFIC NAME: Ocimum tenuiflorum\nCONFIDENCE: 88",
        )));

        let identity = identifier(mock.clone())
            .identify(&image, "cough", &PatientProfile::default())
            .unwrap();

        assert_eq!(identity.name.common, "Tulsi");
        assert_eq!(identity.name.scientific, "Ocimum tenuiflorum");
        assert_eq!(identity.confidence, 88);
        let meta = identity.ai_metadata.unwrap();
        assert_eq!(meta.service, "gemini");
        assert_eq!(meta.tokens, TokenUsage { input: 258, output: 61 });
        assert_eq!(mock.call_count(), 1);
    }

    #[test]
    fn request_carries_image_prompt_and_key_header() {
        let dir = tempfile::tempdir().unwrap();
        let image = write_image(&dir, "root.JPG");
        let mock = Arc::new(MockTransport::ok_json(&gemini_body("HERB NAME: Ginger")));

        identifier(mock.clone())
            .identify(&image, "nausea", &PatientProfile::default())
            .unwrap();

        let request = &mock.requests()[0];
        let parts = &request.payload["contents"][0]["parts"];
        assert_eq!(parts[0]["inline_data"]["mime_type"], "image/jpeg");
        assert_eq!(parts[0]["inline_data"]["data"], BASE64.encode(JPEG_MAGIC));
        assert!(parts[1]["text"].as_str().unwrap().contains("HERB NAME:"));
        assert!(request
            .headers
            .contains(&("x-goog-api-key".to_string(), "gem-key".to_string())));
        assert_eq!(request.timeout, Duration::from_secs(30));
        assert!(!request.endpoint.contains("gem-key"));
    }

    #[test]
    fn dump_holds_raw_service_body() {
        let dir = tempfile::tempdir().unwrap();
        let dump = tempfile::tempdir().unwrap();
        let image = write_image(&dir, "leaf.jpg");
        let body = gemini_body("I think this is Neem.");
        let mock = Arc::new(MockTransport::ok_json(&body));

        identifier(mock)
            .identify_with_dump(&image, "cough", &PatientProfile::default(), Some(dump.path()))
            .unwrap();

        let written =
            std::fs::read_to_string(dump.path().join(IDENTIFICATION_RESPONSE_FILE)).unwrap();
        assert_eq!(written, body.to_string());
    }

    #[test]
    fn missing_image_is_image_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockTransport::new(vec![]));

        let err = identifier(mock.clone())
            .identify(&dir.path().join("gone.png"), "cough", &PatientProfile::default())
            .unwrap_err();

        assert!(matches!(err, IdentificationError::ImageRead { .. }));
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn exhausted_retries_surface_transport_error() {
        let dir = tempfile::tempdir().unwrap();
        let image = write_image(&dir, "leaf.png");
        let mock = Arc::new(MockTransport::failing_status(503, 3));

        let err = identifier(mock.clone())
            .identify(&image, "cough", &PatientProfile::default())
            .unwrap_err();

        match err {
            IdentificationError::Transport { attempts, source } => {
                assert_eq!(attempts, 3);
                assert_eq!(source.status(), Some(503));
            }
            other => panic!("expected transport error, got {other:?}"),
        }
        assert_eq!(mock.call_count(), 3);
    }

    #[test]
    fn response_without_text_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let image = write_image(&dir, "leaf.webp");
        let mock = Arc::new(MockTransport::new(vec![Ok(HttpResponse::ok(
            json!({"candidates": []}).to_string(),
        ))]));

        let err = identifier(mock)
            .identify(&image, "cough", &PatientProfile::default())
            .unwrap_err();
        assert!(matches!(err, IdentificationError::MalformedResponse(_)));
    }

    #[test]
    fn non_json_body_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let image = write_image(&dir, "leaf.jpg");
        let mock = Arc::new(MockTransport::new(vec![Ok(HttpResponse::ok("<html>"))]));

        let err = identifier(mock)
            .identify(&image, "cough", &PatientProfile::default())
            .unwrap_err();
        assert!(matches!(err, IdentificationError::MalformedResponse(_)));
    }

    #[test]
    fn fatal_status_is_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        let image = write_image(&dir, "leaf.jpg");
        let mock = Arc::new(MockTransport::new(vec![Err(TransportError::Status {
            status: 403,
            body: "API key invalid".into(),
        })]));

        let err = identifier(mock.clone())
            .identify(&image, "cough", &PatientProfile::default())
            .unwrap_err();
        assert!(matches!(err, IdentificationError::Transport { attempts: 1, .. }));
        assert_eq!(mock.call_count(), 1);
    }

    #[test]
    fn media_types_from_extension() {
        assert_eq!(media_type_for(Path::new("a.jpg")), "image/jpeg");
        assert_eq!(media_type_for(Path::new("a.JPEG")), "image/jpeg");
        assert_eq!(media_type_for(Path::new("a.png")), "image/png");
        assert_eq!(media_type_for(Path::new("a.webp")), "image/webp");
        assert_eq!(media_type_for(Path::new("upload")), "image/jpeg");
    }

    #[test]
    fn fallback_identity_is_marked_degraded() {
        let identity = fallback_identity("gemini-1.5-flash", "HTTP 503");
        assert_eq!(identity.name.common, "Unknown Herb");
        assert_eq!(identity.generated_id, "unknown-herb");
        assert_eq!(identity.confidence, 50);
        let meta = identity.ai_metadata.unwrap();
        assert!(meta.is_degraded());
        assert_eq!(meta.error.as_deref(), Some("HTTP 503"));
    }
}
