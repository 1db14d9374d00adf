//! Command tables.
//!
//! # Data Flow
//! ```text
//! Module::commands()
//!     → Command { name, shape, contexts, setter, post, block }
//!     → validated once at registry finalization
//!     → parser matches statement name + current context
//!     → setter writes the module's record, post-validator checks it
//!     → block spec (if any) opens a child context
//! ```
//!
//! # Design Decisions
//! - Setters target record fields through typed accessors, never offsets
//! - One generic setter serves every field of the same value type
//! - A block directive may replace generic dispatch for its body with a
//!   `BlockStrategy`

pub mod flags;

use std::fmt;
use std::sync::Arc;

use crate::conf::AnyConf;
use crate::error::{Location, SetError};
use crate::module::ModuleType;
use crate::slot::SlotValue;
use crate::tokenizer::{Statement, Token};

pub use flags::{ArgShape, Contexts};

/// Arguments of one directive as seen by a setter.
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    name: &'a str,
    values: &'a [Token],
    location: &'a Location,
    tag: usize,
}

impl<'a> Args<'a> {
    pub fn new(name: &'a str, values: &'a [Token], location: &'a Location, tag: usize) -> Self {
        Self {
            name,
            values,
            location,
            tag,
        }
    }

    /// Directive name.
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Number of arguments after the name.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Argument `i` (0 = first after the name).
    pub fn get(&self, i: usize) -> Option<&'a str> {
        self.values.get(i).map(|t| t.value.as_str())
    }

    /// Argument `i`, or an error naming the directive.
    pub fn require(&self, i: usize) -> Result<&'a str, SetError> {
        self.get(i)
            .ok_or_else(|| SetError::invalid(self.name, format!("missing argument {}", i + 1)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a str> + 'a {
        self.values.iter().map(|t| t.value.as_str())
    }

    pub fn tokens(&self) -> &'a [Token] {
        self.values
    }

    pub fn location(&self) -> &'a Location {
        self.location
    }

    /// The command's opaque tag.
    pub fn tag(&self) -> usize {
        self.tag
    }
}

/// Converts directive arguments into a value stored on a module record.
pub trait Setter: Send + Sync {
    fn set(&self, args: &Args<'_>, conf: &mut dyn AnyConf) -> Result<SlotValue, SetError>;
}

impl<F> Setter for F
where
    F: Fn(&Args<'_>, &mut dyn AnyConf) -> Result<SlotValue, SetError> + Send + Sync,
{
    fn set(&self, args: &Args<'_>, conf: &mut dyn AnyConf) -> Result<SlotValue, SetError> {
        self(args, conf)
    }
}

/// Checks a value after its setter stored it.
pub trait PostValidator: Send + Sync {
    fn check(&self, value: &SlotValue) -> Result<(), SetError>;
}

impl<F> PostValidator for F
where
    F: Fn(&SlotValue) -> Result<(), SetError> + Send + Sync,
{
    fn check(&self, value: &SlotValue) -> Result<(), SetError> {
        self(value)
    }
}

/// Parses the body of a block in place of command-table dispatch.
///
/// Every statement inside the block is handed over together with the
/// record of the module that owns the block directive, taken from the
/// enclosing context.
pub trait BlockStrategy: Send + Sync {
    fn statement(&self, statement: &Statement, conf: &mut dyn AnyConf) -> Result<(), SetError>;
}

/// What a block directive opens.
#[derive(Clone)]
pub struct BlockSpec {
    /// Context type inside the block.
    pub context: Contexts,
    /// Module type whose commands are legal inside the block.
    pub module_type: ModuleType,
    /// Custom body parser; `None` means generic dispatch.
    pub strategy: Option<Arc<dyn BlockStrategy>>,
}

impl BlockSpec {
    pub fn new(context: Contexts, module_type: ModuleType) -> Self {
        Self {
            context,
            module_type,
            strategy: None,
        }
    }

    pub fn with_strategy(mut self, strategy: impl BlockStrategy + 'static) -> Self {
        self.strategy = Some(Arc::new(strategy));
        self
    }
}

impl fmt::Debug for BlockSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockSpec")
            .field("context", &self.context)
            .field("module_type", &self.module_type)
            .field("strategy", &self.strategy.is_some())
            .finish()
    }
}

pub(crate) enum Handler {
    None,
    Slot(Box<dyn Setter>),
    Include,
}

/// One directive descriptor in a module's command table.
pub struct Command {
    name: &'static str,
    shape: ArgShape,
    contexts: Contexts,
    tag: usize,
    pub(crate) handler: Handler,
    post: Option<Box<dyn PostValidator>>,
    block: Option<BlockSpec>,
}

impl Command {
    pub fn new(name: &'static str, shape: ArgShape, contexts: Contexts) -> Self {
        Self {
            name,
            shape,
            contexts,
            tag: 0,
            handler: Handler::None,
            post: None,
            block: None,
        }
    }

    /// A block directive with no arguments.
    pub fn block(name: &'static str, contexts: Contexts, spec: BlockSpec) -> Self {
        Self::new(name, ArgShape::NOARGS | ArgShape::BLOCK, contexts).with_block(spec)
    }

    /// The built-in `include` directive.
    pub(crate) fn include() -> Self {
        let mut cmd = Self::new("include", ArgShape::TAKE1, Contexts::ANY);
        cmd.handler = Handler::Include;
        cmd
    }

    pub fn with_setter(mut self, setter: impl Setter + 'static) -> Self {
        self.handler = Handler::Slot(Box::new(setter));
        self
    }

    pub fn with_post(mut self, post: impl PostValidator + 'static) -> Self {
        self.post = Some(Box::new(post));
        self
    }

    pub fn with_block(mut self, spec: BlockSpec) -> Self {
        self.shape |= ArgShape::BLOCK;
        self.block = Some(spec);
        self
    }

    pub fn with_tag(mut self, tag: usize) -> Self {
        self.tag = tag;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn shape(&self) -> ArgShape {
        self.shape
    }

    pub fn contexts(&self) -> Contexts {
        self.contexts
    }

    pub fn tag(&self) -> usize {
        self.tag
    }

    pub fn block_spec(&self) -> Option<&BlockSpec> {
        self.block.as_ref()
    }

    pub(crate) fn post(&self) -> Option<&dyn PostValidator> {
        self.post.as_deref()
    }

    /// Returns true if the directive is legal in `context`.
    pub fn allowed_in(&self, context: Contexts) -> bool {
        self.contexts.intersects(context)
    }

    /// Check the descriptor before it enters a finalized registry.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() || self.name.chars().any(|c| c.is_whitespace()) {
            return Err("name must be a non-empty token".to_string());
        }
        if self.contexts.is_empty() {
            return Err("no contexts declared".to_string());
        }
        self.shape.validate()?;
        match (self.shape.contains(ArgShape::BLOCK), &self.block) {
            (true, None) => return Err("BLOCK shape without a block spec".to_string()),
            (false, Some(_)) => return Err("block spec without BLOCK shape".to_string()),
            _ => {}
        }
        if let Some(spec) = &self.block {
            if spec.context.bits().count_ones() != 1 {
                return Err("block context must be a single context type".to_string());
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .field("contexts", &self.contexts)
            .field("tag", &self.tag)
            .field("block", &self.block)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVER: Contexts = Contexts::from_bits_retain(1 << 3);

    #[test]
    fn test_block_constructor_sets_shape() {
        let cmd = Command::block("server", Contexts::MAIN, BlockSpec::new(SERVER, ModuleType::CORE));
        assert!(cmd.shape().contains(ArgShape::BLOCK));
        assert!(cmd.shape().accepts(0));
        assert!(cmd.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_descriptors() {
        assert!(Command::new("", ArgShape::TAKE1, Contexts::MAIN).validate().is_err());
        assert!(Command::new("a b", ArgShape::TAKE1, Contexts::MAIN).validate().is_err());
        assert!(Command::new("x", ArgShape::TAKE1, Contexts::empty()).validate().is_err());
        assert!(Command::new("x", ArgShape::TAKE1 | ArgShape::BLOCK, Contexts::MAIN)
            .validate()
            .is_err());

        let multi = BlockSpec::new(SERVER | Contexts::MAIN, ModuleType::CORE);
        assert!(Command::block("x", Contexts::MAIN, multi).validate().is_err());
    }

    #[test]
    fn test_allowed_in() {
        let cmd = Command::new("listen", ArgShape::TAKE1, SERVER);
        assert!(cmd.allowed_in(SERVER));
        assert!(!cmd.allowed_in(Contexts::MAIN));
        assert!(Command::include().allowed_in(SERVER));
    }
}
