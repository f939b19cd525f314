//! Remedy generation: language-model prompt, section extraction from the
//! free-text answer, and the fallback used when generation cannot complete.

pub mod prompt;
pub mod sections;
pub mod stage;

pub use prompt::*;
pub use sections::*;
pub use stage::*;
