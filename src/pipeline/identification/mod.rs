pub mod extractor;
pub mod prompt;
pub mod sanitize;
pub mod stage;

pub use extractor::*;
pub use prompt::*;
pub use sanitize::*;
pub use stage::*;

use thiserror::Error;

use super::transport::TransportError;

#[derive(Error, Debug)]
pub enum IdentificationError {
    /// No identification attempt is possible; the orchestrator aborts.
    #[error("Could not read image {path}: {source}")]
    ImageRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Vision service call failed after {attempts} attempt(s): {source}")]
    Transport {
        attempts: u32,
        #[source]
        source: TransportError,
    },

    #[error("Malformed vision response: {0}")]
    MalformedResponse(String),
}
