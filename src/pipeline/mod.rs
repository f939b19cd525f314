pub mod api_types;
pub mod diagnostic; // Prompt/response dump, enabled by HERBHEAL_DUMP_DIR
pub mod identification;
pub mod orchestrator;
pub mod outcome;
pub mod remedy;
pub mod translation;
pub mod transport;

pub use orchestrator::{
    cleanup_upload, PipelineError, PipelineOutput, PipelineState, RemedyPipeline, RemedyRequest,
    TranslationOutcome,
};
pub use outcome::StageOutcome;
