//! Pipeline diagnostic dump: writes prompts and raw model answers to disk.
//!
//! **Activation**: disabled unless `HERBHEAL_DUMP_DIR` is set. Image bytes
//! are never written, and the condition text only by length.
//!
//! **Output structure**:
//! ```text
//! {dump_dir}/{run_id}/
//!   00-request.json                   request summary
//!   01-identification-response.json   raw vision service body
//!   01-identity.json                  identity stage outcome
//!   02-remedy-prompt.txt
//!   02-remedy-response.json           raw language service body
//!   02-remedy.json                    remedy stage outcome
//!   03-translation.txt                translated text
//!   04-final-result.json
//! ```

use std::path::{Path, PathBuf};

use uuid::Uuid;

pub const DUMP_DIR_VAR: &str = "HERBHEAL_DUMP_DIR";

pub const REQUEST_FILE: &str = "00-request.json";
pub const IDENTIFICATION_RESPONSE_FILE: &str = "01-identification-response.json";
pub const IDENTITY_FILE: &str = "01-identity.json";
pub const REMEDY_PROMPT_FILE: &str = "02-remedy-prompt.txt";
pub const REMEDY_RESPONSE_FILE: &str = "02-remedy-response.json";
pub const REMEDY_FILE: &str = "02-remedy.json";
pub const TRANSLATION_FILE: &str = "03-translation.txt";
pub const FINAL_RESULT_FILE: &str = "04-final-result.json";

/// Base dump directory from `HERBHEAL_DUMP_DIR`, or `None` when unset or empty.
pub fn dump_base_from_env() -> Option<PathBuf> {
    std::env::var_os(DUMP_DIR_VAR)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Creates and returns `{base}/{run_id}`.
///
/// Returns `None` (with a warning) if creation fails; never blocks the
/// pipeline.
pub fn dump_dir_in(base: &Path, run_id: &Uuid) -> Option<PathBuf> {
    let dir = base.join(run_id.to_string());
    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing::warn!(
            path = %dir.display(),
            error = %e,
            "Diagnostic dump: failed to create directory"
        );
        return None;
    }
    Some(dir)
}

/// Write any serializable value as pretty JSON. Never panics.
pub fn dump_json<T: serde::Serialize>(dir: &Path, filename: &str, value: &T) {
    let path = dir.join(filename);
    match serde_json::to_string_pretty(value) {
        Ok(json) => write_artifact(&path, json.as_bytes()),
        Err(e) => tracing::warn!(
            path = %path.display(),
            error = %e,
            "Diagnostic dump: failed to serialize JSON"
        ),
    }
}

/// Write a prompt or raw model response. Never panics.
pub fn dump_text(dir: &Path, filename: &str, text: &str) {
    write_artifact(&dir.join(filename), text.as_bytes());
}

fn write_artifact(path: &Path, data: &[u8]) {
    match std::fs::write(path, data) {
        Ok(()) => tracing::debug!(
            path = %path.display(),
            size = data.len(),
            "Diagnostic dump: artifact written"
        ),
        Err(e) => tracing::warn!(
            path = %path.display(),
            error = %e,
            "Diagnostic dump: failed to write artifact"
        ),
    }
}
