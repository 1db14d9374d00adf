//! Settings validation.
//!
//! # Responsibilities
//! - Validate value ranges (depth limits)
//! - Reject unknown log levels
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EngineConfig → Result<(), Vec<ValidationError>>
//! - Runs before settings are accepted

use thiserror::Error;

use crate::config::schema::EngineConfig;

const MAX_INCLUDE_DEPTH: usize = 128;
const MAX_BLOCK_DEPTH: usize = 1024;
const LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// A single semantic problem in the settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("parser.{field} must be between 1 and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: usize,
        max: usize,
    },

    #[error("logging.level \"{0}\" is not one of error, warn, info, debug, trace")]
    UnknownLevel(String),
}

pub fn validate_config(config: &EngineConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let limits = [
        ("max_include_depth", config.parser.max_include_depth, MAX_INCLUDE_DEPTH),
        ("max_block_depth", config.parser.max_block_depth, MAX_BLOCK_DEPTH),
    ];
    for (field, value, max) in limits {
        if value == 0 || value > max {
            errors.push(ValidationError::OutOfRange { field, value, max });
        }
    }

    let level = config.logging.level.to_ascii_lowercase();
    if !LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLevel(config.logging.level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
