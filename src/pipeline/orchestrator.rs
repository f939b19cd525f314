use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::diagnostic::{
    dump_base_from_env, dump_dir_in, dump_json, dump_text, FINAL_RESULT_FILE, IDENTITY_FILE,
    REMEDY_FILE, REQUEST_FILE, TRANSLATION_FILE,
};
use super::identification::{fallback_identity, HerbIdentifier, IdentificationError};
use super::outcome::StageOutcome;
use super::remedy::RemedyGenerator;
use super::translation::{TranslationError, Translator};
use super::transport::{ReqwestTransport, RetryingTransport};
use crate::config::{AiConfig, DEFAULT_LANGUAGE};
use crate::models::{HerbIdentity, PatientProfile, RemedyRecommendation};

// ──────────────────────────────────────────────
// Request / output
// ──────────────────────────────────────────────

/// One remedy request: an uploaded photo plus what the patient wants treated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemedyRequest {
    pub image_path: PathBuf,
    pub condition: String,
    #[serde(default)]
    pub profile: PatientProfile,
    /// Target language code; `None` or `"en"` skips translation.
    #[serde(default)]
    pub language: Option<String>,
    /// Delete the image once the run ends, whatever the outcome.
    #[serde(default = "default_remove_upload")]
    pub remove_upload: bool,
}

fn default_remove_upload() -> bool {
    true
}

impl RemedyRequest {
    pub fn new(image_path: impl Into<PathBuf>, condition: &str) -> Self {
        Self {
            image_path: image_path.into(),
            condition: condition.to_string(),
            profile: PatientProfile::default(),
            language: None,
            remove_upload: true,
        }
    }

    pub fn with_profile(mut self, profile: PatientProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_language(mut self, language: &str) -> Self {
        self.language = Some(language.to_string());
        self
    }

    /// Leave the image in place after the run (local files, not uploads).
    pub fn keep_upload(mut self) -> Self {
        self.remove_upload = false;
        self
    }

    fn translation_target(&self) -> Option<&str> {
        self.language
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty() && *l != DEFAULT_LANGUAGE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Identifying,
    Generating,
    Translating,
    Completed,
    Aborted,
}

impl PipelineState {
    /// Legal transitions: `Idle → Identifying → Generating → (Translating) →
    /// Completed`, or `Identifying → Aborted`.
    pub fn can_advance_to(self, next: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (Idle, Identifying)
                | (Identifying, Generating)
                | (Identifying, Aborted)
                | (Generating, Translating)
                | (Generating, Completed)
                | (Translating, Completed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Completed | PipelineState::Aborted)
    }
}

/// Translation result inside a pipeline run. A failure is reported here and
/// leaves the English remedy intact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TranslationOutcome {
    Translated { language: String, text: String },
    Failed { language: String, error: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub state: PipelineState,
    pub identity: StageOutcome<HerbIdentity>,
    pub remedy: StageOutcome<RemedyRecommendation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<TranslationOutcome>,
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Could not read image {path}: {source}")]
    ImageRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Pipeline run interrupted: {0}")]
    Interrupted(String),
}

/// What `00-request.json` records: the condition by length only.
#[derive(Serialize)]
struct RequestSummary<'a> {
    image_path: &'a Path,
    condition_len: usize,
    profile: &'a PatientProfile,
    language: Option<&'a str>,
    remove_upload: bool,
}

impl<'a> From<&'a RemedyRequest> for RequestSummary<'a> {
    fn from(request: &'a RemedyRequest) -> Self {
        Self {
            image_path: &request.image_path,
            condition_len: request.condition.len(),
            profile: &request.profile,
            language: request.language.as_deref(),
            remove_upload: request.remove_upload,
        }
    }
}

// ──────────────────────────────────────────────
// Upload cleanup
// ──────────────────────────────────────────────

/// Remove a transient upload. A missing file is not an error, so repeated
/// calls are harmless. Failures are logged, never returned.
pub fn cleanup_upload(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "Upload removed"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(
            path = %path.display(),
            error = %e,
            "Failed to remove upload"
        ),
    }
}

/// Removes the upload when dropped, so every exit path releases it.
struct UploadCleanup<'a> {
    path: Option<&'a Path>,
}

impl Drop for UploadCleanup<'_> {
    fn drop(&mut self) {
        if let Some(path) = self.path {
            cleanup_upload(path);
        }
    }
}

// ──────────────────────────────────────────────
// RemedyPipeline
// ──────────────────────────────────────────────

/// Runs identification, generation and optional translation for one request.
///
/// Holds no per-run state; a single instance serves concurrent runs.
pub struct RemedyPipeline {
    identifier: HerbIdentifier,
    generator: RemedyGenerator,
    translator: Translator,
    dump_base: Option<PathBuf>,
}

impl RemedyPipeline {
    pub fn new(config: &AiConfig, transport: RetryingTransport) -> Self {
        Self {
            identifier: HerbIdentifier::new(transport.clone(), config),
            generator: RemedyGenerator::new(transport.clone(), config),
            translator: Translator::new(transport, config),
            dump_base: dump_base_from_env(),
        }
    }

    /// Write diagnostic dumps under `base` instead of `$HERBHEAL_DUMP_DIR`.
    pub fn with_dump_dir(mut self, base: impl Into<PathBuf>) -> Self {
        self.dump_base = Some(base.into());
        self
    }

    /// Pipeline over real HTTP with the default retry policy. Safe to build
    /// and drop inside an async runtime; the HTTP client is created on the
    /// first blocking call.
    pub fn from_config(config: &AiConfig) -> Self {
        Self::new(config, RetryingTransport::new(Arc::new(ReqwestTransport::new())))
    }

    /// Run one request to a terminal state.
    ///
    /// Only an unreadable image is an error; every model failure degrades the
    /// affected stage instead.
    pub fn run(&self, request: &RemedyRequest) -> Result<PipelineOutput, PipelineError> {
        let run_id = Uuid::new_v4();
        let _span = tracing::info_span!("remedy_pipeline", run_id = %run_id).entered();
        let _cleanup = UploadCleanup {
            path: request.remove_upload.then_some(request.image_path.as_path()),
        };
        let dump_dir = self
            .dump_base
            .as_deref()
            .and_then(|base| dump_dir_in(base, &run_id));
        if let Some(dir) = &dump_dir {
            dump_json(dir, REQUEST_FILE, &RequestSummary::from(request));
        }

        let mut state = PipelineState::Idle;
        advance(&mut state, PipelineState::Identifying);

        let identity = match self.identifier.identify_with_dump(
            &request.image_path,
            &request.condition,
            &request.profile,
            dump_dir.as_deref(),
        ) {
            Ok(identity) => StageOutcome::Completed(identity),
            Err(IdentificationError::ImageRead { path, source }) => {
                advance(&mut state, PipelineState::Aborted);
                tracing::error!(path = %path, error = %source, "Image unreadable, run aborted");
                return Err(PipelineError::ImageRead { path, source });
            }
            Err(e) => {
                let reason = e.to_string();
                tracing::warn!(error = %reason, "Identification failed, using fallback identity");
                StageOutcome::degraded(fallback_identity(self.identifier.model(), &reason), reason)
            }
        };
        if let Some(dir) = &dump_dir {
            dump_json(dir, IDENTITY_FILE, &identity);
        }

        advance(&mut state, PipelineState::Generating);
        let remedy = self.generator.generate_with_dump(
            identity.value(),
            &request.profile,
            &request.condition,
            dump_dir.as_deref(),
        );
        if let Some(dir) = &dump_dir {
            dump_json(dir, REMEDY_FILE, &remedy);
        }

        let translation = request.translation_target().map(|language| {
            advance(&mut state, PipelineState::Translating);
            let outcome = match self
                .translator
                .translate(&remedy.value().primary.instructions, language)
            {
                Ok(text) => TranslationOutcome::Translated {
                    language: language.to_string(),
                    text,
                },
                Err(e) => {
                    tracing::warn!(language, error = %e, "Translation failed, keeping original text");
                    TranslationOutcome::Failed {
                        language: language.to_string(),
                        error: e.to_string(),
                    }
                }
            };
            if let (Some(dir), TranslationOutcome::Translated { text, .. }) = (&dump_dir, &outcome) {
                dump_text(dir, TRANSLATION_FILE, text);
            }
            outcome
        });

        advance(&mut state, PipelineState::Completed);
        let output = PipelineOutput {
            run_id,
            generated_at: Utc::now(),
            state,
            identity,
            remedy,
            translation,
        };
        if let Some(dir) = &dump_dir {
            dump_json(dir, FINAL_RESULT_FILE, &output);
        }

        tracing::info!(
            herb = %output.identity.value().name.common,
            identity_degraded = output.identity.is_degraded(),
            remedy_degraded = output.remedy.is_degraded(),
            translated = matches!(output.translation, Some(TranslationOutcome::Translated { .. })),
            "Remedy pipeline completed"
        );
        Ok(output)
    }

    /// `run` for async callers: the blocking work moves to tokio's blocking
    /// pool.
    pub async fn run_async(
        self: Arc<Self>,
        request: RemedyRequest,
    ) -> Result<PipelineOutput, PipelineError> {
        tokio::task::spawn_blocking(move || self.run(&request))
            .await
            .map_err(|e| PipelineError::Interrupted(e.to_string()))?
    }

    /// Standalone translation of already generated remedy text.
    pub fn translate(&self, text: &str, language: &str) -> Result<String, TranslationError> {
        self.translator.translate(text, language)
    }
}

fn advance(state: &mut PipelineState, next: PipelineState) {
    if !state.can_advance_to(next) {
        tracing::error!(from = ?state, to = ?next, "Illegal pipeline transition");
    }
    tracing::debug!(from = ?state, to = ?next, "Pipeline state");
    *state = next;
}
