//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Parser / Registry produce:
//!     → ConfLogger (leveled diagnostics with file/line)
//!     → TracingLogger forwards to `tracing` events
//!
//! Consumers:
//!     → tracing-subscriber fmt layer (pretty or JSON), set up by the binary
//! ```
//!
//! # Design Decisions
//! - The parser never picks an output destination; it only calls the logger
//! - Subscriber setup lives with the binary, the library just emits events

pub mod logging;

pub use logging::{init_logging, ConfLogger, TracingLogger};
