//! Project Serializer
//!
//! Versioned JSON project files:
//! - `serializer`: deterministic save, load with validation, fingerprint
//! - `migration`: step-wise upgrade of older format versions

pub mod migration;
pub mod serializer;

pub use migration::CURRENT_FORMAT_VERSION;
pub use serializer::{fingerprint, from_json, load, save, to_json};
