//! Module registry.
//!
//! # Data Flow
//! ```text
//! startup:
//!     RegistryBuilder::register(module) × N
//!     → finalize(): validate command tables, assign indices, run init hooks
//!     → Registry (immutable, shared by reference)
//!
//! parse:
//!     Parser asks Registry for commands legal in (context, module type)
//!     Parser asks Registry to create records when a block opens
//! ```
//!
//! # Design Decisions
//! - Append-then-freeze: registration and lookup are different types
//! - The built-in `include` directive lives in a `CONF` module that is
//!   always registered first
//! - Lookup order is registration order

mod registry;

use std::fmt;

use crate::command::{Command, Contexts};
use crate::conf::{AnyConf, ConfigTree};

pub use registry::{ModuleEntry, Registry, RegistryBuilder};

/// Four-character module type tag, e.g. `CORE`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleType(u32);

impl ModuleType {
    pub const CORE: ModuleType = ModuleType::from_tag(*b"CORE");
    /// Modules whose commands are legal in every context.
    pub const CONF: ModuleType = ModuleType::from_tag(*b"CONF");

    pub const fn from_tag(tag: [u8; 4]) -> Self {
        Self(u32::from_le_bytes(tag))
    }

    pub fn tag(&self) -> [u8; 4] {
        self.0.to_le_bytes()
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.tag()))
    }
}

impl fmt::Debug for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModuleType({})", self)
    }
}

/// Stable identity assigned at finalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId {
    /// Position in the whole registry.
    pub index: usize,
    /// Position among modules of the same type.
    pub ctx_index: usize,
    pub module_type: ModuleType,
}

/// A pluggable unit contributing directives and configuration records.
pub trait Module: Send + Sync {
    fn name(&self) -> &'static str;

    fn module_type(&self) -> ModuleType;

    /// The command table. Called once, at registration.
    fn commands(&self) -> Vec<Command> {
        Vec::new()
    }

    /// A fresh, all-unset record for a context of type `context`, or `None`
    /// if the module keeps no configuration there.
    fn create_conf(&self, _context: Contexts) -> Option<Box<dyn AnyConf>> {
        None
    }

    /// Runs once when the registry is finalized.
    fn init(&self) -> Result<(), String> {
        Ok(())
    }

    /// Runs once per worker/process context, after a successful parse.
    fn init_context(&self, _tree: &ConfigTree) -> Result<(), String> {
        Ok(())
    }
}

/// Hosts the built-in `include` directive.
pub(crate) struct ConfModule;

impl Module for ConfModule {
    fn name(&self) -> &'static str {
        "conf"
    }

    fn module_type(&self) -> ModuleType {
        ModuleType::CONF
    }

    fn commands(&self) -> Vec<Command> {
        vec![Command::include()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_type_tag() {
        assert_eq!(ModuleType::CORE.to_string(), "CORE");
        assert_eq!(ModuleType::from_tag(*b"HTTP").tag(), *b"HTTP");
        assert_ne!(ModuleType::CORE, ModuleType::CONF);
    }
}
