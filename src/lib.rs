//! Directive-based configuration engine.
//!
//! Modules register command tables; the parser tokenizes a configuration
//! source, dispatches every directive to the module that declared it for
//! the current context, and hands back a merged [`ConfigTree`].

// Parsing pipeline
pub mod command;
pub mod conf;
pub mod module;
pub mod parser;
pub mod slot;
pub mod source;
pub mod tokenizer;

// Cross-cutting concerns
pub mod config;
pub mod error;
pub mod observability;

// Reference modules
pub mod modules;

pub use command::{ArgShape, Args, BlockSpec, BlockStrategy, Command, Contexts, PostValidator, Setter};
pub use conf::{ConfigTree, ContextNode, ModuleConf, Setting};
pub use config::schema::EngineConfig;
pub use error::{ConfError, ConfResult, ErrorKind, Location, SetError};
pub use module::{Module, ModuleType, Registry, RegistryBuilder};
pub use parser::Parser;
pub use source::{FileReader, FsReader, MemoryReader};
