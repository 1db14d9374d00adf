//! Engine settings.
//!
//! # Data Flow
//! ```text
//! settings file (TOML)
//!     → loader.rs (read & deserialize)
//!     → validation.rs (semantic checks)
//!     → EngineConfig (validated, immutable)
//!     → ParserSettings to the parser, LoggingConfig to the subscriber
//! ```
//!
//! # Design Decisions
//! - These settings tune the engine; they are not the directive language
//! - All fields have defaults to allow minimal files
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::{AmbiguityPolicy, EngineConfig, LogFormat, LoggingConfig, ParserSettings};
