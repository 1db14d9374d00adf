//! Reference modules.
//!
//! # Responsibilities
//! - `core`: process-wide settings in the main context
//! - `http`: the `http { server { location { } } }` hierarchy
//!
//! Used by the CLI and the tests; an embedding application registers its
//! own modules next to or instead of these.

pub mod core;
pub mod http;

use crate::error::ConfResult;
use crate::module::Registry;

pub use self::core::{CoreConf, CoreModule};
pub use self::http::{HttpConf, HttpCoreModule, HttpModule, Listen, TypesBlock};

/// A finalized registry with every reference module.
pub fn registry() -> ConfResult<Registry> {
    let mut builder = Registry::builder();
    builder
        .register(CoreModule)?
        .register(HttpModule)?
        .register(HttpCoreModule)?;
    builder.finalize()
}
