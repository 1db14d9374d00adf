//! Engine settings schema.
//!
//! All types derive Serde traits for deserialization from the settings file.

use serde::{Deserialize, Serialize};

/// Root settings document.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Parser limits and lookup policy.
    pub parser: ParserSettings,

    /// Log output settings.
    pub logging: LoggingConfig,
}

/// How to resolve a directive declared by several modules for one context.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum AmbiguityPolicy {
    /// Fail with `AmbiguousDirective`.
    #[default]
    Error,
    /// Use the module registered first.
    FirstRegistered,
}

/// Parser settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ParserSettings {
    /// Maximum nesting of `include` directives.
    pub max_include_depth: usize,

    /// Maximum nesting of blocks.
    pub max_block_depth: usize,

    pub ambiguity: AmbiguityPolicy,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            max_include_depth: 16,
            max_block_depth: 64,
            ambiguity: AmbiguityPolicy::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level filter for this crate (`error`, `warn`, `info`, `debug`, `trace`).
    pub level: String,

    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}
