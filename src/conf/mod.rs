//! Configuration records and the inheritance merge resolver.
//!
//! # Data Flow
//! ```text
//! block opens  → Module::create_conf(context) → all-unset record per module
//! directives   → setters write Setting<T> fields of the current record
//! root sealed  → resolve(): top-down, each record merges against the
//!                nearest enclosing record of the same module
//!              → ConfigTree (read-only, shareable)
//! ```
//!
//! # Design Decisions
//! - `Setting<T>` is an explicit tri-state instead of an in-band sentinel
//! - Merge runs once every ancestor is sealed, so an outer directive that
//!   follows a nested block is still inherited by it
//! - Defaults apply only when no ancestor supplied a value

mod record;
mod setting;
mod tree;

pub use record::{merge_records, AnyConf, ModuleConf};
pub use setting::Setting;
pub use tree::{ConfigTree, ContextNode, Record};
