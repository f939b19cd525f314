pub mod enums;
pub mod herb;
pub mod metadata;
pub mod profile;
pub mod remedy;

pub use enums::*;
pub use herb::*;
pub use metadata::*;
pub use profile::*;
pub use remedy::*;
